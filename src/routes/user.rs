use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// User Router Module
///
/// Nested under `/user`. Reachable only with a User role claim; admins are sent home.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        // GET /user/articles
        // Reader article grid, nine per page.
        .route("/articles", get(handlers::user_articles))
        // GET /user/profile
        .route("/profile", get(handlers::profile))
}
