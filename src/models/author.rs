//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::book::BookShort;

/// Full author model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
}

impl Author {
    pub fn absolute_url(&self) -> String {
        format!("/catalog/author/{}", self.id)
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.last_name, self.first_name)
    }
}

/// Author page with their books
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetails {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    /// "Last, First"
    pub display_name: String,
    pub url: String,
    pub books: Vec<BookShort>,
}

impl AuthorDetails {
    pub fn new(author: Author, books: Vec<BookShort>) -> Self {
        Self {
            display_name: author.to_string(),
            url: author.absolute_url(),
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
            date_of_birth: author.date_of_birth,
            books,
        }
    }
}

/// Create or replace an author
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AuthorInput {
    #[validate(length(min = 1, max = 100, message = "First name must be between 1 and 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be between 1 and 100 characters"))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
}

/// Author list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AuthorQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> Author {
        Author {
            id: 7,
            first_name: "Ursula".to_string(),
            last_name: "Le Guin".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1929, 10, 21),
        }
    }

    #[test]
    fn test_display_is_last_then_first() {
        assert_eq!(author().to_string(), "Le Guin, Ursula");
    }

    #[test]
    fn test_details_carry_url() {
        let details = AuthorDetails::new(author(), Vec::new());
        assert_eq!(details.url, "/catalog/author/7");
        assert_eq!(details.display_name, "Le Guin, Ursula");
    }

    #[test]
    fn test_input_rejects_long_names() {
        let input = AuthorInput {
            first_name: "a".repeat(101),
            last_name: "b".to_string(),
            date_of_birth: None,
        };
        assert!(input.validate().is_err());
    }
}
