//! Catalog browsing and administration service

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorDetails, AuthorInput, AuthorQuery},
        book::{Book, BookDetails, BookInput, BookQuery, BookShort},
        book_instance::{BookInstance, BookInstanceInput, BookInstanceQuery, SwapStatus},
        genre::{Genre, GenreDetails, GenreInput},
        language::{Language, LanguageInput},
    },
    repository::Repository,
};

/// Counts shown on the catalog home page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogSummary {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn summary(&self) -> AppResult<CatalogSummary> {
        Ok(CatalogSummary {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.book_instances.count().await?,
            num_instances_available: self
                .repository
                .book_instances
                .count_by_status(SwapStatus::Available)
                .await?,
            num_authors: self.repository.authors.count().await?,
            num_genres: self.repository.genres.count().await?,
        })
    }

    // =========================================================================
    // Books
    // =========================================================================

    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<BookShort>, i64)> {
        self.repository.books.search(query).await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        self.book_details(book).await
    }

    async fn book_details(&self, book: Book) -> AppResult<BookDetails> {
        let author = match book.author_id {
            Some(author_id) => Some(self.repository.authors.get_by_id(author_id).await?),
            None => None,
        };
        let genres = self.repository.genres.list_for_book(book.id).await?;
        let instances = self.repository.book_instances.list_for_book(book.id).await?;
        Ok(BookDetails::new(book, author, genres, instances))
    }

    pub async fn create_book(&self, data: BookInput) -> AppResult<BookDetails> {
        self.check_book_input(&data).await?;
        let book = self.repository.books.create(&data).await?;
        tracing::info!(book_id = book.id, "Book created");
        self.book_details(book).await
    }

    pub async fn update_book(&self, id: i32, data: BookInput) -> AppResult<BookDetails> {
        self.check_book_input(&data).await?;
        let book = self.repository.books.update(id, &data).await?;
        self.book_details(book).await
    }

    async fn check_book_input(&self, data: &BookInput) -> AppResult<()> {
        data.validate()?;
        if let Some(author_id) = data.author_id {
            if !self.repository.authors.exists(author_id).await? {
                return Err(AppError::Validation(format!("author_id: Author {} does not exist", author_id)));
            }
        }
        let mut genre_ids = data.genre_ids.clone();
        genre_ids.sort_unstable();
        genre_ids.dedup();
        if self.repository.genres.count_existing(&genre_ids).await? != genre_ids.len() as i64 {
            return Err(AppError::Validation("genre_ids: Unknown genre".to_string()));
        }
        Ok(())
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    // =========================================================================
    // Authors
    // =========================================================================

    pub async fn list_authors(&self, query: &AuthorQuery) -> AppResult<(Vec<Author>, i64)> {
        self.repository.authors.list(query).await
    }

    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok(AuthorDetails::new(author, books))
    }

    pub async fn create_author(&self, data: AuthorInput) -> AppResult<Author> {
        data.validate()?;
        self.repository.authors.create(&data).await
    }

    pub async fn update_author(&self, id: i32, data: AuthorInput) -> AppResult<Author> {
        data.validate()?;
        self.repository.authors.update(id, &data).await
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await
    }

    // =========================================================================
    // Genres
    // =========================================================================

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<GenreDetails> {
        let genre = self.repository.genres.get_by_id(id).await?;
        let books = self.repository.books.list_by_genre(id).await?;
        Ok(GenreDetails {
            url: genre.absolute_url(),
            id: genre.id,
            name: genre.name,
            books,
        })
    }

    pub async fn create_genre(&self, data: GenreInput) -> AppResult<Genre> {
        data.validate()?;
        self.repository.genres.create(data.name.trim()).await
    }

    pub async fn update_genre(&self, id: i32, data: GenreInput) -> AppResult<Genre> {
        data.validate()?;
        self.repository.genres.update(id, data.name.trim()).await
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        self.repository.genres.delete(id).await
    }

    // =========================================================================
    // Languages
    // =========================================================================

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.repository.languages.list().await
    }

    pub async fn get_language(&self, id: i32) -> AppResult<Language> {
        self.repository.languages.get_by_id(id).await
    }

    pub async fn create_language(&self, data: LanguageInput) -> AppResult<Language> {
        data.validate()?;
        self.repository.languages.create(data.name.trim()).await
    }

    pub async fn update_language(&self, id: i32, data: LanguageInput) -> AppResult<Language> {
        data.validate()?;
        self.repository.languages.update(id, data.name.trim()).await
    }

    pub async fn delete_language(&self, id: i32) -> AppResult<()> {
        self.repository.languages.delete(id).await
    }

    // =========================================================================
    // Book instances
    // =========================================================================

    pub async fn list_instances(&self, query: &BookInstanceQuery) -> AppResult<Vec<BookInstance>> {
        self.repository.book_instances.list(query).await
    }

    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.repository.book_instances.get_by_id(id).await
    }

    pub async fn create_instance(&self, data: BookInstanceInput) -> AppResult<BookInstance> {
        let data = data.into_new(Utc::now().date_naive())?;
        if !self.repository.books.exists(data.book_id).await? {
            return Err(AppError::Validation(format!("book_id: Book {} does not exist", data.book_id)));
        }
        let instance = self.repository.book_instances.create(&data).await?;
        tracing::info!(instance_id = %instance.id, book_id = instance.book_id, "Book instance created");
        Ok(instance)
    }

    pub async fn update_instance(&self, id: Uuid, data: BookInstanceInput) -> AppResult<BookInstance> {
        let existing = self.repository.book_instances.get_by_id(id).await?;
        // Keeps the original posting date unless one is given
        let data = data.into_new(existing.date_posted)?;
        if !self.repository.books.exists(data.book_id).await? {
            return Err(AppError::Validation(format!("book_id: Book {} does not exist", data.book_id)));
        }
        self.repository.book_instances.update(id, &data).await
    }

    pub async fn delete_instance(&self, id: Uuid) -> AppResult<()> {
        self.repository.book_instances.delete(id).await
    }
}
