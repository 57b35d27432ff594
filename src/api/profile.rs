//! Profile of the logged in user

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::user::{ProfileResponse, UpdateProfile},
    AppState,
};

use super::AuthenticatedUser;

pub const PROFILE_UPDATED_MESSAGE: &str = "Your profile is updated successfully";

/// Profile after a successful change
#[derive(Serialize, ToSchema)]
pub struct ProfileUpdateResponse {
    pub message: String,
    #[serde(flatten)]
    pub profile: ProfileResponse,
}

impl From<ProfileResponse> for ProfileUpdateResponse {
    fn from(profile: ProfileResponse) -> Self {
        Self {
            message: PROFILE_UPDATED_MESSAGE.to_string(),
            profile,
        }
    }
}

#[utoipa::path(
    get,
    path = "/accounts/profile/",
    tag = "accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user and profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ProfileResponse>> {
    let profile = state.services.accounts.get_profile(claims.user_id).await?;
    Ok(Json(profile))
}

/// Update account fields and bio
#[utoipa::path(
    put,
    path = "/accounts/profile/",
    tag = "accounts",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = ProfileUpdateResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already in use")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<UpdateProfile>,
) -> AppResult<Json<ProfileUpdateResponse>> {
    let profile = state.services.accounts.update_profile(claims.user_id, form).await?;
    Ok(Json(profile.into()))
}

/// Upload an avatar image in the `avatar` multipart field
#[utoipa::path(
    post,
    path = "/accounts/profile/avatar/",
    tag = "accounts",
    security(("bearer_auth" = [])),
    request_body(content_type = "multipart/form-data", description = "Image in the `avatar` field"),
    responses(
        (status = 200, description = "Avatar stored", body = ProfileUpdateResponse),
        (status = 400, description = "Missing, empty, oversized or non-image file")
    )
)]
pub async fn upload_avatar(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    mut multipart: Multipart,
) -> AppResult<Json<ProfileUpdateResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("avatar") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let profile = state
            .services
            .accounts
            .set_avatar(claims.user_id, &content_type, &data)
            .await?;
        return Ok(Json(profile.into()));
    }

    Err(AppError::Validation("avatar: No file was submitted".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{Profile, User};
    use chrono::Utc;

    #[test]
    fn test_update_response_carries_message_and_profile() {
        let user = User {
            id: 7,
            username: "reader".to_string(),
            email: "reader@example.com".to_string(),
            password: "hash".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff: false,
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
        };
        let profile = Profile {
            user_id: 7,
            bio: "Poetry".to_string(),
            avatar: Some("avatars/7.png".to_string()),
        };

        let body = ProfileUpdateResponse::from(ProfileResponse::new(user, profile));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["message"], "Your profile is updated successfully");
        assert_eq!(json["bio"], "Poetry");
        assert_eq!(json["avatar_url"], "/media/avatars/7.png");
        assert_eq!(json["user"]["username"], "reader");
        assert!(json["user"].get("password").is_none());
    }
}
