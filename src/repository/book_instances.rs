//! Book instances repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{
        BookInstance, BookInstanceQuery, BookInstanceRow, NewBookInstance, SwapStatus,
    },
};

/// Select list and joins shared by every instance query
const INSTANCE_SELECT: &str = r#"
    SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint, bi.date_posted,
           bi.user_id, u.username, bi.status, bi.condition, bi.book_type
    FROM book_instances bi
    JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.user_id
"#;

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        let sql = format!("{} WHERE bi.id = $1", INSTANCE_SELECT);
        sqlx::query_as::<_, BookInstanceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(BookInstance::from)
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// List instances ordered by posting date
    pub async fn list(&self, query: &BookInstanceQuery) -> AppResult<Vec<BookInstance>> {
        let sql = format!(
            r#"
            {}
            WHERE ($1::text IS NULL OR bi.status = $1)
              AND ($2::int IS NULL OR bi.book_id = $2)
            ORDER BY bi.date_posted, bi.id
            "#,
            INSTANCE_SELECT
        );
        let rows = sqlx::query_as::<_, BookInstanceRow>(&sql)
            .bind(query.status.map(|s| s.code()))
            .bind(query.book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(BookInstance::from).collect())
    }

    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        self.list(&BookInstanceQuery {
            status: None,
            book_id: Some(book_id),
        })
        .await
    }

    /// Copies owned by a user
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<BookInstance>> {
        let sql = format!(
            "{} WHERE bi.user_id = $1 ORDER BY bi.date_posted, bi.id",
            INSTANCE_SELECT
        );
        let rows = sqlx::query_as::<_, BookInstanceRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(BookInstance::from).collect())
    }

    pub async fn create(&self, data: &NewBookInstance) -> AppResult<BookInstance> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO book_instances
                (id, book_id, imprint, date_posted, user_id, status, condition, book_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(data.book_id)
        .bind(&data.imprint)
        .bind(data.date_posted)
        .bind(data.user_id)
        .bind(data.status.map(|s| s.code()))
        .bind(data.condition.map(|c| c.code()))
        .bind(data.book_type.map(|t| t.code()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_constraint(e, "Unknown book or user"))?;

        self.get_by_id(id).await
    }

    pub async fn update(&self, id: Uuid, data: &NewBookInstance) -> AppResult<BookInstance> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances
            SET book_id = $1, imprint = $2, date_posted = $3, user_id = $4,
                status = $5, condition = $6, book_type = $7
            WHERE id = $8
            "#,
        )
        .bind(data.book_id)
        .bind(&data.imprint)
        .bind(data.date_posted)
        .bind(data.user_id)
        .bind(data.status.map(|s| s.code()))
        .bind(data.condition.map(|c| c.code()))
        .bind(data.book_type.map(|t| t.code()))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_constraint(e, "Unknown book or user"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_by_status(&self, status: SwapStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status.code())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
