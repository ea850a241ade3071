use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Screens that need a valid session but no particular role. The gate has already
/// verified the token; handlers read it back through the `AuthUser` extractor to forward
/// it upstream.
///
/// `/profile` is deliberately absent from the path table, so it is governed by the
/// configured unmatched policy.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Article Editor ---
        // GET/POST /create
        .route("/create", get(handlers::create_form).post(handlers::create_article))
        // POST /create/upload
        // Multipart image upload used by both the create and edit forms.
        .route("/create/upload", post(handlers::upload_image))
        // GET/POST /edit/{id}
        .route(
            "/edit/{id}",
            get(handlers::edit_form).post(handlers::update_article),
        )
        // --- Category Management ---
        // GET/POST /categories
        .route(
            "/categories",
            get(handlers::categories_page).post(handlers::create_category),
        )
        // POST /categories/{id}
        // Rename; answers with the stored category.
        .route("/categories/{id}", post(handlers::update_category))
        // POST /categories/{id}/delete
        .route("/categories/{id}/delete", post(handlers::delete_category))
        // --- Account ---
        // GET /profile
        .route("/profile", get(handlers::profile))
}
