//! Swap listings: copies a user posts from their own shelf

use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{
        validate_imprint, BookCondition, BookInstance, BookInstanceQuery, BookType, NewBookInstance,
        SwapStatus,
    },
    repository::Repository,
};

/// Post a copy for swap
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListing {
    pub book_id: i32,
    pub imprint: String,
    pub condition: Option<BookCondition>,
    #[serde(rename = "type")]
    pub book_type: Option<BookType>,
}

/// Change one of your listings
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateListing {
    pub imprint: Option<String>,
    pub condition: Option<BookCondition>,
    #[serde(rename = "type")]
    pub book_type: Option<BookType>,
    pub status: Option<SwapStatus>,
}

impl UpdateListing {
    /// Merge the changes into the current listing
    pub fn apply(self, current: &BookInstance) -> AppResult<NewBookInstance> {
        let imprint = match self.imprint {
            Some(ref imprint) => validate_imprint(imprint)?,
            None => current.imprint.clone(),
        };
        Ok(NewBookInstance {
            book_id: current.book_id,
            imprint,
            date_posted: current.date_posted,
            user_id: current.user_id,
            status: self.status.or(current.status),
            condition: self.condition.or(current.condition),
            book_type: self.book_type.or(current.book_type),
        })
    }
}

#[derive(Clone)]
pub struct StoreService {
    repository: Repository,
}

impl StoreService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Every copy currently available for swap
    pub async fn available(&self) -> AppResult<Vec<BookInstance>> {
        self.repository
            .book_instances
            .list(&BookInstanceQuery {
                status: Some(SwapStatus::Available),
                book_id: None,
            })
            .await
    }

    pub async fn my_listings(&self, user_id: i32) -> AppResult<Vec<BookInstance>> {
        self.repository.book_instances.list_for_user(user_id).await
    }

    pub async fn create_listing(&self, user_id: i32, data: CreateListing) -> AppResult<BookInstance> {
        if !self.repository.books.exists(data.book_id).await? {
            return Err(AppError::Validation(format!("book_id: Book {} does not exist", data.book_id)));
        }
        let listing = NewBookInstance {
            book_id: data.book_id,
            imprint: validate_imprint(&data.imprint)?,
            date_posted: Utc::now().date_naive(),
            user_id: Some(user_id),
            status: Some(SwapStatus::Available),
            condition: data.condition,
            book_type: data.book_type,
        };
        let instance = self.repository.book_instances.create(&listing).await?;
        tracing::info!(user_id, instance_id = %instance.id, "Listing posted");
        Ok(instance)
    }

    pub async fn update_listing(&self, user_id: i32, id: Uuid, data: UpdateListing) -> AppResult<BookInstance> {
        let current = self.owned_listing(user_id, id).await?;
        let changes = data.apply(&current)?;
        self.repository.book_instances.update(id, &changes).await
    }

    pub async fn delete_listing(&self, user_id: i32, id: Uuid) -> AppResult<()> {
        self.owned_listing(user_id, id).await?;
        self.repository.book_instances.delete(id).await?;
        tracing::info!(user_id, instance_id = %id, "Listing removed");
        Ok(())
    }

    async fn owned_listing(&self, user_id: i32, id: Uuid) -> AppResult<BookInstance> {
        let instance = self.repository.book_instances.get_by_id(id).await?;
        if !instance.is_owned_by(user_id) {
            return Err(AppError::Authorization("This listing belongs to another user".to_string()));
        }
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn listing() -> BookInstance {
        BookInstance {
            id: Uuid::new_v4(),
            book_id: 2,
            book_title: "Dune".to_string(),
            imprint: "Ace".to_string(),
            date_posted: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            user_id: Some(5),
            username: Some("paul".to_string()),
            status: Some(SwapStatus::Available),
            condition: Some(BookCondition::Good),
            book_type: None,
            days_since_posted: true,
        }
    }

    #[test]
    fn test_update_keeps_unset_fields() {
        let current = listing();
        let update = UpdateListing {
            imprint: None,
            condition: None,
            book_type: Some(BookType::Paperback),
            status: Some(SwapStatus::Swapped),
        };
        let merged = update.apply(&current).unwrap();
        assert_eq!(merged.imprint, "Ace");
        assert_eq!(merged.condition, Some(BookCondition::Good));
        assert_eq!(merged.book_type, Some(BookType::Paperback));
        assert_eq!(merged.status, Some(SwapStatus::Swapped));
        assert_eq!(merged.user_id, Some(5));
        assert_eq!(merged.date_posted, current.date_posted);
    }

    #[test]
    fn test_update_rejects_blank_imprint() {
        let update = UpdateListing {
            imprint: Some(" ".to_string()),
            condition: None,
            book_type: None,
            status: None,
        };
        assert!(update.apply(&listing()).is_err());
    }
}
