//! Staff-only catalog administration

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        author::{Author, AuthorInput},
        book::{BookDetails, BookInput},
        book_instance::{BookInstance, BookInstanceInput},
        genre::{Genre, GenreInput},
        language::{Language, LanguageInput},
    },
    AppState,
};

use super::AuthenticatedUser;

// =============================================================================
// Genres
// =============================================================================

#[utoipa::path(
    post,
    path = "/admin/genres",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = GenreInput,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<GenreInput>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    claims.require_staff()?;
    let genre = state.services.catalog.create_genre(data).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

#[utoipa::path(
    put,
    path = "/admin/genres/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    request_body = GenreInput,
    responses(
        (status = 200, description = "Genre updated", body = Genre),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn update_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<GenreInput>,
) -> AppResult<Json<Genre>> {
    claims.require_staff()?;
    let genre = state.services.catalog.update_genre(id, data).await?;
    Ok(Json(genre))
}

#[utoipa::path(
    delete,
    path = "/admin/genres/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn delete_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    state.services.catalog.delete_genre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Languages
// =============================================================================

#[utoipa::path(
    post,
    path = "/admin/languages",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = LanguageInput,
    responses(
        (status = 201, description = "Language created", body = Language),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_language(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<LanguageInput>,
) -> AppResult<(StatusCode, Json<Language>)> {
    claims.require_staff()?;
    let language = state.services.catalog.create_language(data).await?;
    Ok((StatusCode::CREATED, Json(language)))
}

#[utoipa::path(
    put,
    path = "/admin/languages/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Language ID")),
    request_body = LanguageInput,
    responses(
        (status = 200, description = "Language updated", body = Language),
        (status = 404, description = "Language not found")
    )
)]
pub async fn update_language(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<LanguageInput>,
) -> AppResult<Json<Language>> {
    claims.require_staff()?;
    let language = state.services.catalog.update_language(id, data).await?;
    Ok(Json(language))
}

#[utoipa::path(
    delete,
    path = "/admin/languages/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Language ID")),
    responses(
        (status = 204, description = "Language deleted"),
        (status = 404, description = "Language not found")
    )
)]
pub async fn delete_language(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    state.services.catalog.delete_language(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Authors
// =============================================================================

#[utoipa::path(
    post,
    path = "/admin/authors",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = AuthorInput,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<AuthorInput>,
) -> AppResult<(StatusCode, Json<Author>)> {
    claims.require_staff()?;
    let author = state.services.catalog.create_author(data).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

#[utoipa::path(
    put,
    path = "/admin/authors/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = AuthorInput,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<AuthorInput>,
) -> AppResult<Json<Author>> {
    claims.require_staff()?;
    let author = state.services.catalog.update_author(id, data).await?;
    Ok(Json(author))
}

/// Delete an author; their books are kept without an author
#[utoipa::path(
    delete,
    path = "/admin/authors/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    state.services.catalog.delete_author(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Books
// =============================================================================

#[utoipa::path(
    post,
    path = "/admin/books",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = BookInput,
    responses(
        (status = 201, description = "Book created", body = BookDetails),
        (status = 400, description = "Invalid input or unknown author/genre")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<BookInput>,
) -> AppResult<(StatusCode, Json<BookDetails>)> {
    claims.require_staff()?;
    let book = state.services.catalog.create_book(data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Replace a book, including its genre set
#[utoipa::path(
    put,
    path = "/admin/books/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book updated", body = BookDetails),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<BookInput>,
) -> AppResult<Json<BookDetails>> {
    claims.require_staff()?;
    let book = state.services.catalog.update_book(id, data).await?;
    Ok(Json(book))
}

#[utoipa::path(
    delete,
    path = "/admin/books/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Copies of the book still exist")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Book instances
// =============================================================================

#[utoipa::path(
    post,
    path = "/admin/bookinstances",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = BookInstanceInput,
    responses(
        (status = 201, description = "Book instance created", body = BookInstance),
        (status = 400, description = "Invalid input or unknown book")
    )
)]
pub async fn create_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<BookInstanceInput>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    claims.require_staff()?;
    let instance = state.services.catalog.create_instance(data).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

#[utoipa::path(
    put,
    path = "/admin/bookinstances/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = BookInstanceInput,
    responses(
        (status = 200, description = "Book instance updated", body = BookInstance),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn update_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<BookInstanceInput>,
) -> AppResult<Json<BookInstance>> {
    claims.require_staff()?;
    let instance = state.services.catalog.update_instance(id, data).await?;
    Ok(Json(instance))
}

#[utoipa::path(
    delete,
    path = "/admin/bookinstances/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 204, description = "Book instance deleted"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn delete_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    state.services.catalog.delete_instance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
