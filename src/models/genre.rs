//! Genre model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::BookShort;

/// Book genre (e.g. Science Fiction)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

impl Genre {
    pub fn absolute_url(&self) -> String {
        format!("/catalog/genre/{}", self.id)
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Genre page with the books filed under it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenreDetails {
    pub id: i32,
    pub name: String,
    pub url: String,
    pub books: Vec<BookShort>,
}

/// Create or replace a genre
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenreInput {
    /// Genre name (e.g. Science Fiction)
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,
}
