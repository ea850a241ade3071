use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Screens anyone may open. A visitor with a valid session is still redirected away from
/// `/`, `/login` and `/register` by the gate before these handlers run.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Landing page with the latest articles.
        .route("/", get(handlers::landing))
        // GET/POST /login
        // Login form descriptor, and the credential exchange that writes the session cookies.
        .route("/login", get(handlers::login_form).post(handlers::login))
        // GET/POST /register
        .route("/register", get(handlers::register_form).post(handlers::register))
        // GET /articles?search=...&category=...&page=...
        // Article browsing; falls back to seed content when the API is down.
        .route("/articles", get(handlers::article_list))
        // GET /articles/{id}
        // Article detail with related articles from the same category.
        .route("/articles/{id}", get(handlers::article_detail))
}
