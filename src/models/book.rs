//! Book model (the abstract title, not a physical copy)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{author::Author, book_instance::BookInstance, genre::Genre};

/// Number of genres shown by [`display_genre`]
const DISPLAYED_GENRES: usize = 3;

/// Book row from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    pub summary: String,
}

impl Book {
    pub fn absolute_url(&self) -> String {
        book_url(self.id)
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

pub fn book_url(id: i32) -> String {
    format!("/catalog/book/{}", id)
}

/// Comma separated names of the first genres of a book
pub fn display_genre(genres: &[Genre]) -> String {
    genres
        .iter()
        .take(DISPLAYED_GENRES)
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Internal row structure for list queries (author name joined)
#[derive(Debug, Clone, FromRow)]
pub struct BookShortRow {
    id: i32,
    title: String,
    author_id: Option<i32>,
    author_name: Option<String>,
}

impl From<BookShortRow> for BookShort {
    fn from(row: BookShortRow) -> Self {
        BookShort {
            url: book_url(row.id),
            id: row.id,
            title: row.title,
            author_id: row.author_id,
            author_name: row.author_name,
        }
    }
}

/// Short book representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    /// "Last, First" of the author, if any
    pub author_name: Option<String>,
    pub url: String,
}

/// Book page: author, genres and the copies posted for swap
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub author: Option<Author>,
    pub genres: Vec<Genre>,
    pub display_genre: String,
    pub url: String,
    pub instances: Vec<BookInstance>,
}

impl BookDetails {
    pub fn new(
        book: Book,
        author: Option<Author>,
        genres: Vec<Genre>,
        instances: Vec<BookInstance>,
    ) -> Self {
        Self {
            display_genre: display_genre(&genres),
            url: book.absolute_url(),
            id: book.id,
            title: book.title,
            summary: book.summary,
            author,
            genres,
            instances,
        }
    }
}

/// Book list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive title search
    pub title: Option<String>,
    pub author_id: Option<i32>,
    pub genre_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create or replace a book
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    /// Brief description of the book
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters"))]
    #[serde(default)]
    pub summary: String,
    pub author_id: Option<i32>,
    /// Genres for this book; replaces the existing set
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(id: i32, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_display_genre_keeps_first_three() {
        let genres = vec![
            genre(1, "Fantasy"),
            genre(2, "Science Fiction"),
            genre(3, "Horror"),
            genre(4, "Romance"),
        ];
        assert_eq!(display_genre(&genres), "Fantasy, Science Fiction, Horror");
        assert_eq!(display_genre(&genres[..1]), "Fantasy");
        assert_eq!(display_genre(&[]), "");
    }

    #[test]
    fn test_details_from_book() {
        let book = Book {
            id: 12,
            title: "The Dispossessed".to_string(),
            author_id: None,
            summary: String::new(),
        };
        let details = BookDetails::new(book, None, vec![genre(1, "Science Fiction")], Vec::new());
        assert_eq!(details.url, "/catalog/book/12");
        assert_eq!(details.display_genre, "Science Fiction");
    }

    #[test]
    fn test_summary_length_is_capped() {
        let input = BookInput {
            title: "Title".to_string(),
            summary: "x".repeat(1001),
            author_id: None,
            genre_ids: Vec::new(),
        };
        assert!(input.validate().is_err());
    }
}
