//! Public catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        author::{AuthorDetails, AuthorQuery},
        book::{BookDetails, BookQuery},
        book_instance::{BookInstance, BookInstanceQuery},
        genre::{Genre, GenreDetails},
        language::Language,
    },
    repository::page_bounds,
    services::catalog::CatalogSummary,
    AppState,
};

use super::{AuthorPage, BookPage, PaginatedResponse};

/// Catalog home page counts
#[utoipa::path(
    get,
    path = "/catalog/",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog summary", body = CatalogSummary)
    )
)]
pub async fn index(State(state): State<AppState>) -> AppResult<Json<CatalogSummary>> {
    let summary = state.services.catalog.summary().await?;
    Ok(Json(summary))
}

/// List books with search and pagination
#[utoipa::path(
    get,
    path = "/catalog/books/",
    tag = "catalog",
    params(BookQuery),
    responses(
        (status = 200, description = "List of books", body = BookPage)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<BookPage>> {
    let (books, total) = state.services.catalog.search_books(&query).await?;
    let (page, per_page, _) = page_bounds(query.page, query.per_page);

    Ok(Json(PaginatedResponse {
        items: books,
        total,
        page,
        per_page,
    }))
}

/// Get book details with author, genres and copies
#[utoipa::path(
    get,
    path = "/catalog/book/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<BookDetails>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// List authors
#[utoipa::path(
    get,
    path = "/catalog/authors/",
    tag = "catalog",
    params(AuthorQuery),
    responses(
        (status = 200, description = "List of authors", body = AuthorPage)
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<AuthorQuery>,
) -> AppResult<Json<AuthorPage>> {
    let (authors, total) = state.services.catalog.list_authors(&query).await?;
    let (page, per_page, _) = page_bounds(query.page, query.per_page);

    Ok(Json(PaginatedResponse {
        items: authors,
        total,
        page,
        per_page,
    }))
}

/// Get an author and their books
#[utoipa::path(
    get,
    path = "/catalog/author/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = AuthorDetails),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<AuthorDetails>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

#[utoipa::path(
    get,
    path = "/catalog/genres/",
    tag = "catalog",
    responses(
        (status = 200, description = "All genres", body = Vec<Genre>)
    )
)]
pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    let genres = state.services.catalog.list_genres().await?;
    Ok(Json(genres))
}

/// Get a genre and the books filed under it
#[utoipa::path(
    get,
    path = "/catalog/genre/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Genre ID")
    ),
    responses(
        (status = 200, description = "Genre details", body = GenreDetails),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn get_genre(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<GenreDetails>> {
    let genre = state.services.catalog.get_genre(id).await?;
    Ok(Json(genre))
}

#[utoipa::path(
    get,
    path = "/catalog/languages/",
    tag = "catalog",
    responses(
        (status = 200, description = "All languages", body = Vec<Language>)
    )
)]
pub async fn list_languages(State(state): State<AppState>) -> AppResult<Json<Vec<Language>>> {
    let languages = state.services.catalog.list_languages().await?;
    Ok(Json(languages))
}

#[utoipa::path(
    get,
    path = "/catalog/language/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Language ID")
    ),
    responses(
        (status = 200, description = "Language", body = Language),
        (status = 404, description = "Language not found")
    )
)]
pub async fn get_language(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Language>> {
    let language = state.services.catalog.get_language(id).await?;
    Ok(Json(language))
}

/// List book copies, optionally filtered by swap status
#[utoipa::path(
    get,
    path = "/catalog/bookinstances/",
    tag = "catalog",
    params(BookInstanceQuery),
    responses(
        (status = 200, description = "Book copies ordered by posting date", body = Vec<BookInstance>)
    )
)]
pub async fn list_instances(
    State(state): State<AppState>,
    Query(query): Query<BookInstanceQuery>,
) -> AppResult<Json<Vec<BookInstance>>> {
    let instances = state.services.catalog.list_instances(&query).await?;
    Ok(Json(instances))
}

#[utoipa::path(
    get,
    path = "/catalog/bookinstance/{id}",
    tag = "catalog",
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Book copy", body = BookInstance),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn get_instance(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<BookInstance>> {
    let instance = state.services.catalog.get_instance(id).await?;
    Ok(Json(instance))
}
