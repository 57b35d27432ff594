//! Book instance (a physical copy posted for swap) and its enumerations

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// SwapStatus
// ---------------------------------------------------------------------------

/// Availability of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    Available,
    Swapped,
}

impl SwapStatus {
    pub fn code(&self) -> &'static str {
        match self {
            SwapStatus::Available => "a",
            SwapStatus::Swapped => "s",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "a" => Some(SwapStatus::Available),
            "s" => Some(SwapStatus::Swapped),
            _ => None,
        }
    }
}

impl std::fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SwapStatus::Available => "Available",
            SwapStatus::Swapped => "Swapped",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// BookCondition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookCondition {
    LikeNew,
    VeryGood,
    Good,
    Acceptable,
}

impl BookCondition {
    pub fn code(&self) -> &'static str {
        match self {
            BookCondition::LikeNew => "l",
            BookCondition::VeryGood => "v",
            BookCondition::Good => "g",
            BookCondition::Acceptable => "a",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "l" => Some(BookCondition::LikeNew),
            "v" => Some(BookCondition::VeryGood),
            "g" => Some(BookCondition::Good),
            "a" => Some(BookCondition::Acceptable),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookCondition::LikeNew => "Like New",
            BookCondition::VeryGood => "Very Good",
            BookCondition::Good => "Good",
            BookCondition::Acceptable => "Acceptable",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// BookType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookType {
    Hardcover,
    Paperback,
}

impl BookType {
    pub fn code(&self) -> &'static str {
        match self {
            BookType::Hardcover => "h",
            BookType::Paperback => "p",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "h" => Some(BookType::Hardcover),
            "p" => Some(BookType::Paperback),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookType::Hardcover => "Hardcover",
            BookType::Paperback => "Paperback",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// BookInstance
// ---------------------------------------------------------------------------

/// Internal row structure for database queries (single-char codes as strings)
#[derive(Debug, Clone, FromRow)]
pub struct BookInstanceRow {
    id: Uuid,
    book_id: i32,
    book_title: String,
    imprint: String,
    date_posted: NaiveDate,
    user_id: Option<i32>,
    username: Option<String>,
    status: Option<String>,
    condition: Option<String>,
    book_type: Option<String>,
}

impl From<BookInstanceRow> for BookInstance {
    fn from(row: BookInstanceRow) -> Self {
        let today = Utc::now().date_naive();
        BookInstance {
            days_since_posted: posted_before(Some(row.date_posted), today),
            id: row.id,
            book_id: row.book_id,
            book_title: row.book_title,
            imprint: row.imprint,
            date_posted: row.date_posted,
            user_id: row.user_id,
            username: row.username,
            status: row.status.as_deref().and_then(SwapStatus::from_code),
            condition: row.condition.as_deref().and_then(BookCondition::from_code),
            book_type: row.book_type.as_deref().and_then(BookType::from_code),
        }
    }
}

/// True when a posting date is set and `today` is strictly after it
pub fn posted_before(date_posted: Option<NaiveDate>, today: NaiveDate) -> bool {
    date_posted.map(|d| today > d).unwrap_or(false)
}

/// A specific copy of a book available for swap
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookInstance {
    /// Unique ID for this copy across the whole library
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub imprint: String,
    pub date_posted: NaiveDate,
    /// Owner of the copy
    pub user_id: Option<i32>,
    pub username: Option<String>,
    pub status: Option<SwapStatus>,
    pub condition: Option<BookCondition>,
    #[serde(rename = "type")]
    pub book_type: Option<BookType>,
    /// Whether the copy was posted before today
    pub days_since_posted: bool,
}

impl BookInstance {
    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.user_id == Some(user_id)
    }
}

impl std::fmt::Display for BookInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.book_title)
    }
}

/// Instance list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookInstanceQuery {
    pub status: Option<SwapStatus>,
    pub book_id: Option<i32>,
}

/// Create or replace a book instance (staff)
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookInstanceInput {
    pub book_id: i32,
    pub imprint: String,
    /// Defaults to today
    pub date_posted: Option<NaiveDate>,
    pub user_id: Option<i32>,
    pub status: Option<SwapStatus>,
    pub condition: Option<BookCondition>,
    #[serde(rename = "type")]
    pub book_type: Option<BookType>,
}

/// Validated values ready to be written
#[derive(Debug, Clone)]
pub struct NewBookInstance {
    pub book_id: i32,
    pub imprint: String,
    pub date_posted: NaiveDate,
    pub user_id: Option<i32>,
    pub status: Option<SwapStatus>,
    pub condition: Option<BookCondition>,
    pub book_type: Option<BookType>,
}

/// Maximum imprint length
pub const IMPRINT_MAX_LEN: usize = 200;

pub fn validate_imprint(imprint: &str) -> Result<String, AppError> {
    let imprint = imprint.trim();
    if imprint.is_empty() {
        return Err(AppError::Validation("imprint: This field is required".to_string()));
    }
    if imprint.chars().count() > IMPRINT_MAX_LEN {
        return Err(AppError::Validation(format!(
            "imprint: Ensure this value has at most {} characters",
            IMPRINT_MAX_LEN
        )));
    }
    Ok(imprint.to_string())
}

impl BookInstanceInput {
    pub fn into_new(self, today: NaiveDate) -> Result<NewBookInstance, AppError> {
        Ok(NewBookInstance {
            imprint: validate_imprint(&self.imprint)?,
            book_id: self.book_id,
            date_posted: self.date_posted.unwrap_or(today),
            user_id: self.user_id,
            status: self.status,
            condition: self.condition,
            book_type: self.book_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_posted_before() {
        let today = date(2024, 3, 10);
        assert!(posted_before(Some(date(2024, 3, 9)), today));
        assert!(!posted_before(Some(today), today));
        assert!(!posted_before(Some(date(2024, 3, 11)), today));
        assert!(!posted_before(None, today));
    }

    #[test]
    fn test_codes() {
        assert_eq!(SwapStatus::from_code("s"), Some(SwapStatus::Swapped));
        assert_eq!(BookCondition::Acceptable.code(), "a");
        assert_eq!(BookType::from_code("p"), Some(BookType::Paperback));
        // Legacy default outside the choice sets
        assert_eq!(SwapStatus::from_code("m"), None);
        assert_eq!(BookCondition::from_code("m"), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(BookCondition::LikeNew.to_string(), "Like New");
        assert_eq!(SwapStatus::Available.to_string(), "Available");
    }

    #[test]
    fn test_row_conversion() {
        let id = Uuid::new_v4();
        let row = BookInstanceRow {
            id,
            book_id: 3,
            book_title: "Dune".to_string(),
            imprint: "Ace, 1990".to_string(),
            date_posted: date(2020, 1, 1),
            user_id: Some(4),
            username: Some("paul".to_string()),
            status: Some("a".to_string()),
            condition: Some("v".to_string()),
            book_type: None,
        };
        let instance = BookInstance::from(row);
        assert_eq!(instance.status, Some(SwapStatus::Available));
        assert_eq!(instance.condition, Some(BookCondition::VeryGood));
        assert_eq!(instance.book_type, None);
        assert!(instance.days_since_posted);
        assert!(instance.is_owned_by(4));
        assert_eq!(instance.to_string(), format!("{} (Dune)", id));
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_value(BookType::Hardcover).unwrap();
        assert_eq!(json, "hardcover");
        let status: SwapStatus = serde_json::from_str("\"swapped\"").unwrap();
        assert_eq!(status, SwapStatus::Swapped);
    }

    #[test]
    fn test_input_defaults_date_and_trims() {
        let input = BookInstanceInput {
            book_id: 1,
            imprint: "  Gollancz  ".to_string(),
            date_posted: None,
            user_id: None,
            status: None,
            condition: None,
            book_type: None,
        };
        let new = input.into_new(date(2024, 5, 1)).unwrap();
        assert_eq!(new.imprint, "Gollancz");
        assert_eq!(new.date_posted, date(2024, 5, 1));
    }

    #[test]
    fn test_blank_imprint_rejected() {
        assert!(validate_imprint("   ").is_err());
        assert!(validate_imprint(&"x".repeat(201)).is_err());
    }
}
