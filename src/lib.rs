use std::sync::Arc;

use axum::{
    Router,
    extract::{FromRef, OriginalUri, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod api;
pub mod auth;
pub mod config;
pub mod fallback;
pub mod gate;
pub mod handlers;
pub mod listing;
pub mod models;
pub mod session;

// Page routers, one per access-gate class.
pub mod routes;
use routes::{admin, authenticated, public, user};

// --- Public Re-exports ---

pub use api::{BlogApi, BlogApiState, HttpBlogApi};
pub use auth::{JwtVerifier, TokenVerifier, VerifierState};
pub use config::AppConfig;
pub use gate::{Decision, PathTable};

use gate::evaluate;
use session::{Session, SessionCookies, append_set_cookies, clearing_cookies};

/// ApiDoc
///
/// OpenAPI description of the page routes, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::landing, handlers::login_form, handlers::register_form, handlers::login,
        handlers::register, handlers::logout, handlers::article_list, handlers::article_detail,
        handlers::create_form, handlers::create_article, handlers::upload_image,
        handlers::edit_form, handlers::update_article, handlers::categories_page,
        handlers::create_category, handlers::update_category, handlers::delete_category,
        handlers::profile, handlers::admin_articles, handlers::delete_article,
        handlers::user_articles
    ),
    components(
        schemas(
            models::Article, models::ArticleAuthor, models::Category, models::CategoryOption,
            models::Profile, models::LoginRequest, models::RegisterRequest, models::ArticleForm,
            models::CategoryForm, models::UploadResponse, models::FieldError, models::DataSource,
            models::Pagination, models::ArticleListPage, models::ArticleDetailPage,
            models::CategoryListPage, models::ArticleFormPage, models::LandingPage,
            models::AuthFormPage, session::Role,
        )
    ),
    tags(
        (name = "journal-portal", description = "Blog portal page routes")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of services and configuration, cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Upstream blog REST API.
    pub api: BlogApiState,
    /// Session token verifier used by the access gate.
    pub verifier: VerifierState,
    /// Path classification consulted by the access gate.
    pub gate: Arc<PathTable>,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state, deriving the path table from the configured unmatched policy.
    pub fn new(api: BlogApiState, verifier: VerifierState, config: AppConfig) -> Self {
        let gate = Arc::new(PathTable::new(config.unmatched_policy));
        Self {
            api,
            verifier,
            gate,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for BlogApiState {
    fn from_ref(app_state: &AppState) -> BlogApiState {
        app_state.api.clone()
    }
}

impl FromRef<AppState> for VerifierState {
    fn from_ref(app_state: &AppState) -> VerifierState {
        app_state.verifier.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// access_gate
///
/// Middleware in front of every page route. It resolves the session (one token
/// verification), asks `gate::evaluate` for a decision and either forwards the request
/// with the `Session` in its extensions or answers with a 303 redirect. Only an invalid
/// token makes the redirect expire the session cookies.
pub async fn access_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let cookies = SessionCookies::from_headers(request.headers());
    let session =
        Session::resolve(cookies, state.verifier.as_ref(), state.config.trust_role_cookie).await;

    match evaluate(&state.gate, &path, session.state, session.role) {
        Decision::Continue => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Decision::Redirect(redirect) => {
            tracing::info!(
                path = %path,
                to = redirect.to,
                reason = redirect.reason.as_str(),
                cleared = redirect.clear_session,
                "access gate redirect"
            );
            let mut response = Redirect::to(redirect.to).into_response();
            if redirect.clear_session {
                append_set_cookies(response.headers_mut(), clearing_cookies());
            }
            response
        }
    }
}

/// create_router
///
/// Assembles the page routers behind the access gate, the ungated utility routes, and the
/// observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // Every page route, gated as a whole.
    let pages = Router::new()
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .nest("/admin", admin::admin_routes())
        .nest("/user", user::user_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), access_gate));

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // GET /health
        // Load balancer probe.
        .route("/health", get(|| async { "ok" }))
        // POST /logout
        // Outside the gate so a broken session can always be cleared.
        .route("/logout", post(handlers::logout))
        .merge(pages)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for every request carrying method, path and the generated `x-request-id`. Only
/// the path is recorded so query strings with search terms stay out of the logs.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
    )
}
