use journal_portal::{
    AppState,
    api::{BlogApiState, HttpBlogApi},
    auth::{JwtVerifier, VerifierState},
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initializes logging, wires the upstream API client and token
/// verifier into the shared state, and serves the portal.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast in production)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise verbose defaults for this crate.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "journal_portal=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Portal starting in {:?} mode", config.env);
    tracing::info!(policy = ?config.unmatched_policy, "Unlisted gated paths follow this policy");
    if config.trust_role_cookie {
        tracing::warn!(
            "TRUST_ROLE_COOKIE is enabled: the unsigned role cookie is used when a token has no \
             role claim, so any client can claim a role. Bind the role into the signed token instead."
        );
    }

    // 3. Collaborators
    let api = HttpBlogApi::new(&config.api_base_url)
        .expect("FATAL: Failed to build the upstream HTTP client.");
    let api = Arc::new(api) as BlogApiState;
    let verifier = Arc::new(JwtVerifier::new(config.jwt_secret.clone())) as VerifierState;
    tracing::info!(upstream = %config.api_base_url, "Upstream API client ready");

    // 4. Router and server
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(api, verifier, config));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the listen address. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
