//! API handlers for the Biblioteca REST endpoints

pub mod authors;
pub mod books;
pub mod health;
pub mod openapi;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowHeaders, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::CorsConfig,
    error::{AppError, AppResult},
    AppState,
};

/// CORS policy for the single frontend origin
pub fn cors_layer(config: &CorsConfig) -> AppResult<CorsLayer> {
    let origin = config.allowed_origin.parse::<HeaderValue>().map_err(|_| {
        AppError::Internal(format!("Invalid CORS origin '{}'", config.allowed_origin))
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        // Wildcard headers are not allowed together with credentials
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> AppResult<Router> {
    let cors = cors_layer(&state.config.cors)?;
    let upload_limit = state.config.storage.max_upload_bytes;

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/books", get(books::list_books))
        .route("/books", post(books::create_book))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id", put(books::update_book))
        .route("/books/:id", delete(books::delete_book))
        .route(
            "/books/:id/upload-pdf",
            post(books::upload_pdf).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/books/files/:filename", get(books::download_file))
        // Authors
        .route("/authors", get(authors::list_authors))
        .route("/authors", post(authors::create_author))
        .route("/authors/:id", get(authors::get_author))
        .route("/authors/:id", put(authors::update_author))
        .route("/authors/:id", delete(authors::delete_author))
        .with_state(state);

    Ok(Router::new()
        .merge(api)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}
