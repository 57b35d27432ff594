//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookInput, BookQuery, BookShort, BookShortRow},
};

use super::page_bounds;

/// Select list shared by every `BookShort` query
const BOOK_SHORT_COLUMNS: &str = r#"
    b.id, b.title, b.author_id,
    CASE WHEN a.id IS NULL THEN NULL ELSE a.last_name || ', ' || a.first_name END AS author_name
"#;

/// Escape LIKE wildcards so user input matches literally, using backslash as the escape
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT id, title, author_id, summary FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Search books with pagination, ordered case-insensitively by title
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<BookShort>, i64)> {
        let (_, per_page, offset) = page_bounds(query.page, query.per_page);
        let title = query
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| format!("%{}%", escape_like(&t.to_lowercase())));

        let filter = r#"
            ($1::text IS NULL OR LOWER(b.title) LIKE $1 ESCAPE '\')
            AND ($2::int IS NULL OR b.author_id = $2)
            AND ($3::int IS NULL OR EXISTS (
                SELECT 1 FROM book_genres bg WHERE bg.book_id = b.id AND bg.genre_id = $3
            ))
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM books b WHERE {}", filter))
            .bind(&title)
            .bind(query.author_id)
            .bind(query.genre_id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT {}
            FROM books b
            LEFT JOIN authors a ON a.id = b.author_id
            WHERE {}
            ORDER BY LOWER(b.title), b.id
            LIMIT $4 OFFSET $5
            "#,
            BOOK_SHORT_COLUMNS, filter
        );

        let rows = sqlx::query_as::<_, BookShortRow>(&sql)
            .bind(&title)
            .bind(query.author_id)
            .bind(query.genre_id)
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(BookShort::from).collect(), total))
    }

    /// All books of an author
    pub async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookShort>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM books b
            LEFT JOIN authors a ON a.id = b.author_id
            WHERE b.author_id = $1
            ORDER BY LOWER(b.title), b.id
            "#,
            BOOK_SHORT_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookShortRow>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(BookShort::from).collect())
    }

    /// All books filed under a genre
    pub async fn list_by_genre(&self, genre_id: i32) -> AppResult<Vec<BookShort>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM books b
            JOIN book_genres bg ON bg.book_id = b.id
            LEFT JOIN authors a ON a.id = b.author_id
            WHERE bg.genre_id = $1
            ORDER BY LOWER(b.title), b.id
            "#,
            BOOK_SHORT_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookShortRow>(&sql)
            .bind(genre_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(BookShort::from).collect())
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Create a book and its genre links in one transaction
    pub async fn create(&self, data: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author_id, summary)
            VALUES ($1, $2, $3)
            RETURNING id, title, author_id, summary
            "#,
        )
        .bind(data.title.trim())
        .bind(data.author_id)
        .bind(&data.summary)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_constraint(e, "Unknown author"))?;

        Self::replace_genres(&mut tx, book.id, &data.genre_ids).await?;

        tx.commit().await?;
        Ok(book)
    }

    /// Replace every field of a book, genre set included
    pub async fn update(&self, id: i32, data: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET title = $1, author_id = $2, summary = $3
            WHERE id = $4
            RETURNING id, title, author_id, summary
            "#,
        )
        .bind(data.title.trim())
        .bind(data.author_id)
        .bind(&data.summary)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::from_constraint(e, "Unknown author"))?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

        Self::replace_genres(&mut tx, id, &data.genre_ids).await?;

        tx.commit().await?;
        Ok(book)
    }

    async fn replace_genres(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        book_id: i32,
        genre_ids: &[i32],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut **tx)
            .await?;

        if !genre_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO book_genres (book_id, genre_id)
                SELECT $1, UNNEST($2::int[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(book_id)
            .bind(genre_ids)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::from_constraint(e, "Unknown genre"))?;
        }
        Ok(())
    }

    /// Delete a book. Refused while copies of it still exist.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::from_constraint(e, format!("Book {} still has copies posted for swap", id))
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("dune"), "dune");
    }
}
