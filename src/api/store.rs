//! Swap listing endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book_instance::BookInstance,
    services::store::{CreateListing, UpdateListing},
    AppState,
};

use super::AuthenticatedUser;

/// Copies anyone can ask for
#[utoipa::path(
    get,
    path = "/store/",
    tag = "store",
    responses(
        (status = 200, description = "Available listings", body = Vec<BookInstance>)
    )
)]
pub async fn available_listings(State(state): State<AppState>) -> AppResult<Json<Vec<BookInstance>>> {
    let listings = state.services.store.available().await?;
    Ok(Json(listings))
}

#[utoipa::path(
    get,
    path = "/store/mine/",
    tag = "store",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Listings of the logged in user", body = Vec<BookInstance>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_listings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BookInstance>>> {
    let listings = state.services.store.my_listings(claims.user_id).await?;
    Ok(Json(listings))
}

#[utoipa::path(
    post,
    path = "/store/listings/",
    tag = "store",
    security(("bearer_auth" = [])),
    request_body = CreateListing,
    responses(
        (status = 201, description = "Listing posted", body = BookInstance),
        (status = 400, description = "Invalid input or unknown book"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_listing(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateListing>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    let listing = state.services.store.create_listing(claims.user_id, data).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

#[utoipa::path(
    put,
    path = "/store/listings/{id}",
    tag = "store",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body = UpdateListing,
    responses(
        (status = 200, description = "Listing updated", body = BookInstance),
        (status = 403, description = "Listing belongs to another user"),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn update_listing(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateListing>,
) -> AppResult<Json<BookInstance>> {
    let listing = state.services.store.update_listing(claims.user_id, id, data).await?;
    Ok(Json(listing))
}

#[utoipa::path(
    delete,
    path = "/store/listings/{id}",
    tag = "store",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 204, description = "Listing removed"),
        (status = 403, description = "Listing belongs to another user"),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn delete_listing(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.store.delete_listing(claims.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
