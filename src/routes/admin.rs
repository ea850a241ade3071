use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// Nested under `/admin`. The gate only lets sessions whose signed role claim is Admin
/// through; destructive handlers check the role again.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/articles
        // Article management table, ten per page.
        .route("/articles", get(handlers::admin_articles))
        // POST /admin/articles/{id}/delete
        .route("/articles/{id}/delete", post(handlers::delete_article))
        // GET /admin/profile
        .route("/profile", get(handlers::profile))
}
