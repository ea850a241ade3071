use std::env;

use crate::gate::UnmatchedPolicy;

/// AppConfig
///
/// Holds the portal's entire configuration state. It is loaded once at startup and is
/// immutable afterwards; handlers and the access gate pull it from the application state
/// via FromRef.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which variables are mandatory.
    pub env: Env,
    // Shared HS256 secret used to verify session tokens issued by the upstream API.
    pub jwt_secret: String,
    // Base URL of the upstream blog REST API (e.g. https://api.example.com).
    pub api_base_url: String,
    // Address the HTTP server binds to.
    pub bind_addr: String,
    // Decision for gated paths that match no entry of the path table.
    pub unmatched_policy: UnmatchedPolicy,
    // Legacy mode: consult the unsigned `role` cookie when the token carries no role claim.
    pub trust_role_cookie: bool,
    // Sets the Secure flag on session cookies.
    pub cookie_secure: bool,
    // Lifetime of the session cookies written at login.
    pub session_max_age_secs: i64,
}

/// Env
///
/// Defines the runtime context: a forgiving local setup with fallbacks, or a production
/// setup that refuses to start with incomplete configuration.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";
const LOCAL_API_BASE_URL: &str = "http://localhost:4000";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
// One year, matching the max-age the login form has always written.
const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 365;

impl Default for AppConfig {
    /// default
    ///
    /// Provides a non-panicking AppConfig primarily used for test setup, so tests can build
    /// state without touching environment variables.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            api_base_url: LOCAL_API_BASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            unmatched_policy: UnmatchedPolicy::Allow,
            trust_role_cookie: false,
            cookie_secure: false,
            session_max_age_secs: DEFAULT_SESSION_MAX_AGE_SECS,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables.
    ///
    /// # Panics
    /// Panics in Production when `JWT_SECRET`, `API_BASE_URL` or `GATE_UNMATCHED_POLICY`
    /// is missing, and in any environment when `GATE_UNMATCHED_POLICY` holds an unknown value.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let trust_role_cookie = flag("TRUST_ROLE_COOKIE", false);
        let session_max_age_secs = env::var("SESSION_MAX_AGE_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_SESSION_MAX_AGE_SECS);
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                api_base_url: env::var("API_BASE_URL")
                    .unwrap_or_else(|_| LOCAL_API_BASE_URL.to_string()),
                bind_addr,
                unmatched_policy: env::var("GATE_UNMATCHED_POLICY")
                    .map(|value| parse_policy(&value))
                    .unwrap_or(UnmatchedPolicy::Allow),
                trust_role_cookie,
                cookie_secure: flag("COOKIE_SECURE", false),
                session_max_age_secs,
            },
            Env::Production => Self {
                env: Env::Production,
                jwt_secret: env::var("JWT_SECRET")
                    .expect("FATAL: JWT_SECRET must be set in production."),
                api_base_url: env::var("API_BASE_URL")
                    .expect("FATAL: API_BASE_URL must be set in production."),
                bind_addr,
                // Production must state what happens to routes missing from the path table.
                unmatched_policy: parse_policy(
                    &env::var("GATE_UNMATCHED_POLICY")
                        .expect("FATAL: GATE_UNMATCHED_POLICY (allow|deny) must be set in production."),
                ),
                trust_role_cookie,
                cookie_secure: flag("COOKIE_SECURE", true),
                session_max_age_secs,
            },
        }
    }
}

fn parse_policy(value: &str) -> UnmatchedPolicy {
    match value.trim().to_ascii_lowercase().as_str() {
        "allow" => UnmatchedPolicy::Allow,
        "deny" => UnmatchedPolicy::Deny,
        other => panic!("FATAL: GATE_UNMATCHED_POLICY must be 'allow' or 'deny', got '{other}'."),
    }
}

fn flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) => matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}
