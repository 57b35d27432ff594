//! Route table of the whole application

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::AppState;

use super::{accounts, admin, catalog, health, openapi, profile, store};

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Room for the multipart framing around the image
    let avatar_limit = state.config.media.max_avatar_bytes + 64 * 1024;
    let media_root = state.config.media.root.clone();

    // Section indexes carry a trailing slash, which `nest` would not register
    let catalog_routes = Router::new()
        .route("/books/", get(catalog::list_books))
        .route("/book/:id", get(catalog::get_book))
        .route("/authors/", get(catalog::list_authors))
        .route("/author/:id", get(catalog::get_author))
        .route("/genres/", get(catalog::list_genres))
        .route("/genre/:id", get(catalog::get_genre))
        .route("/languages/", get(catalog::list_languages))
        .route("/language/:id", get(catalog::get_language))
        .route("/bookinstances/", get(catalog::list_instances))
        .route("/bookinstance/:id", get(catalog::get_instance));

    let account_routes = Router::new()
        .route("/register/", post(accounts::register))
        .route("/login/", post(accounts::login))
        .route("/logout/", post(accounts::logout))
        .route("/password-reset/", post(accounts::password_reset))
        .route("/password-reset/confirm/", post(accounts::password_reset_confirm))
        .route("/password-change/", post(accounts::password_change))
        .route("/password_change/done/", get(accounts::password_change_done))
        .route(
            "/profile/",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route(
            "/profile/avatar/",
            post(profile::upload_avatar).layer(DefaultBodyLimit::max(avatar_limit)),
        );

    let store_routes = Router::new()
        .route("/mine/", get(store::my_listings))
        .route("/listings/", post(store::create_listing))
        .route(
            "/listings/:id",
            put(store::update_listing).delete(store::delete_listing),
        );

    let admin_routes = Router::new()
        .route("/genres", post(admin::create_genre))
        .route("/genres/:id", put(admin::update_genre).delete(admin::delete_genre))
        .route("/languages", post(admin::create_language))
        .route(
            "/languages/:id",
            put(admin::update_language).delete(admin::delete_language),
        )
        .route("/authors", post(admin::create_author))
        .route("/authors/:id", put(admin::update_author).delete(admin::delete_author))
        .route("/books", post(admin::create_book))
        .route("/books/:id", put(admin::update_book).delete(admin::delete_book))
        .route("/bookinstances", post(admin::create_instance))
        .route(
            "/bookinstances/:id",
            put(admin::update_instance).delete(admin::delete_instance),
        );

    let app = Router::new()
        .route("/", get(super::root_redirect))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/catalog/", get(catalog::index))
        .route("/store/", get(store::available_listings))
        .nest("/catalog", catalog_routes)
        .nest("/accounts", account_routes)
        .nest("/store", store_routes)
        .nest("/admin", admin_routes)
        .with_state(state);

    app.nest_service("/media", ServeDir::new(media_root))
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
