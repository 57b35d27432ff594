//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{accounts, admin, catalog, health, profile, store};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Book Swap API",
        version = "1.0.0",
        description = "Library catalog and book swapping REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Catalog
        catalog::index,
        catalog::list_books,
        catalog::get_book,
        catalog::list_authors,
        catalog::get_author,
        catalog::list_genres,
        catalog::get_genre,
        catalog::list_languages,
        catalog::get_language,
        catalog::list_instances,
        catalog::get_instance,
        // Accounts
        accounts::register,
        accounts::login,
        accounts::logout,
        accounts::password_reset,
        accounts::password_reset_confirm,
        accounts::password_change,
        accounts::password_change_done,
        profile::get_profile,
        profile::update_profile,
        profile::upload_avatar,
        // Store
        store::available_listings,
        store::my_listings,
        store::create_listing,
        store::update_listing,
        store::delete_listing,
        // Admin
        admin::create_genre,
        admin::update_genre,
        admin::delete_genre,
        admin::create_language,
        admin::update_language,
        admin::delete_language,
        admin::create_author,
        admin::update_author,
        admin::delete_author,
        admin::create_book,
        admin::update_book,
        admin::delete_book,
        admin::create_instance,
        admin::update_instance,
        admin::delete_instance,
    ),
    components(
        schemas(
            // Catalog
            crate::services::catalog::CatalogSummary,
            crate::models::genre::Genre,
            crate::models::genre::GenreDetails,
            crate::models::genre::GenreInput,
            crate::models::language::Language,
            crate::models::language::LanguageInput,
            crate::models::author::Author,
            crate::models::author::AuthorDetails,
            crate::models::author::AuthorInput,
            crate::models::book::BookShort,
            crate::models::book::BookDetails,
            crate::models::book::BookInput,
            crate::models::book_instance::BookInstance,
            crate::models::book_instance::BookInstanceInput,
            crate::models::book_instance::SwapStatus,
            crate::models::book_instance::BookCondition,
            crate::models::book_instance::BookType,
            crate::api::BookPage,
            crate::api::AuthorPage,
            // Accounts
            crate::models::user::User,
            crate::models::user::ProfileResponse,
            crate::api::profile::ProfileUpdateResponse,
            crate::models::user::RegisterRequest,
            crate::models::user::LoginRequest,
            crate::models::user::PasswordResetRequest,
            crate::models::user::PasswordResetConfirm,
            crate::models::user::PasswordChangeRequest,
            crate::models::user::UpdateProfile,
            accounts::RegisterResponse,
            accounts::LoginResponse,
            // Store
            crate::services::store::CreateListing,
            crate::services::store::UpdateListing,
            // Common
            crate::api::MessageResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Public catalog browsing"),
        (name = "accounts", description = "Registration, login, passwords and profile"),
        (name = "store", description = "Swap listings"),
        (name = "admin", description = "Staff catalog administration")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_area() {
        let doc = ApiDoc::openapi();
        for path in [
            "/catalog/",
            "/catalog/book/{id}",
            "/accounts/login/",
            "/accounts/password-change/",
            "/accounts/profile/avatar/",
            "/store/",
            "/store/listings/{id}",
            "/admin/books/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
