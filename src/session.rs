use axum::http::{HeaderMap, HeaderValue, header};
use cookie::{Cookie, SameSite, time::Duration};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    auth::{Claims, TokenVerifier},
    config::AppConfig,
    gate::TokenState,
};

pub const TOKEN_COOKIE: &str = "token";
pub const ROLE_COOKIE: &str = "role";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Role
///
/// The two account roles the upstream API hands out. Parsing is case-insensitive
/// because the API spells them `Admin`/`User` while older cookies carry `admin`/`user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }
}

/// SessionCookies
///
/// The raw session cookies exactly as the browser sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionCookies {
    pub token: Option<String>,
    pub role: Option<String>,
}

impl SessionCookies {
    /// Reads every `Cookie` header of the request. Unparseable pairs are skipped and empty
    /// values count as absent.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = SessionCookies::default();

        let pairs = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|raw| Cookie::split_parse(raw.to_owned()))
            .filter_map(Result::ok);

        for pair in pairs {
            let value = pair.value().trim();
            if value.is_empty() {
                continue;
            }
            match pair.name() {
                TOKEN_COOKIE => cookies.token = Some(value.to_string()),
                ROLE_COOKIE => cookies.role = Some(value.to_string()),
                _ => {}
            }
        }

        cookies
    }
}

/// Session
///
/// The explicit session object handed to the access gate and, through request extensions,
/// to the page handlers. Built once per request by `Session::resolve`.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: Option<String>,
    pub state: TokenState,
    pub claims: Option<Claims>,
    pub role: Option<Role>,
}

impl Session {
    /// resolve
    ///
    /// Performs the request's only token verification and settles the role. The role comes
    /// from the verified claims; the unsigned `role` cookie is consulted only when
    /// `trust_role_cookie` is set and the token carries no role claim.
    pub async fn resolve(
        cookies: SessionCookies,
        verifier: &dyn TokenVerifier,
        trust_role_cookie: bool,
    ) -> Self {
        let Some(token) = cookies.token else {
            return Session {
                token: None,
                state: TokenState::Absent,
                claims: None,
                role: None,
            };
        };

        match verifier.verify(&token).await {
            Ok(claims) => {
                let claimed = claims.role();
                let role = match claimed {
                    Some(role) => {
                        if let Some(cookie_role) = cookies.role.as_deref().and_then(Role::parse) {
                            if cookie_role != role {
                                tracing::debug!(
                                    claimed = role.as_str(),
                                    cookie = cookie_role.as_str(),
                                    "role cookie disagrees with token claim; using claim"
                                );
                            }
                        }
                        Some(role)
                    }
                    None if trust_role_cookie => cookies.role.as_deref().and_then(Role::parse),
                    None => None,
                };

                Session {
                    token: Some(token),
                    state: TokenState::Valid,
                    claims: Some(claims),
                    role,
                }
            }
            Err(error) => {
                tracing::debug!(%error, "session token rejected");
                Session {
                    token: Some(token),
                    state: TokenState::Invalid,
                    claims: None,
                    role: None,
                }
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == TokenState::Valid
    }
}

/// CookieSettings
///
/// The attributes every session cookie written by the portal shares.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age_secs: i64,
    /// Write the legacy `role` cookie next to the token.
    pub write_role: bool,
}

impl From<&AppConfig> for CookieSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            secure: config.cookie_secure,
            max_age_secs: config.session_max_age_secs,
            write_role: config.trust_role_cookie,
        }
    }
}

/// Cookies written after a successful login.
pub fn login_cookies(
    settings: &CookieSettings,
    token: &str,
    role: &str,
    refresh_token: Option<&str>,
) -> Vec<Cookie<'static>> {
    let mut cookies = vec![session_cookie(settings, TOKEN_COOKIE, token, true)];
    if settings.write_role {
        cookies.push(session_cookie(settings, ROLE_COOKIE, role, false));
    }
    if let Some(refresh) = refresh_token {
        cookies.push(session_cookie(settings, REFRESH_COOKIE, refresh, true));
    }
    cookies
}

/// Expired copies of every session cookie. Sent on logout and when the gate finds an
/// invalid token.
pub fn clearing_cookies() -> Vec<Cookie<'static>> {
    [TOKEN_COOKIE, ROLE_COOKIE, REFRESH_COOKIE]
        .into_iter()
        .map(|name| {
            let mut cookie = Cookie::build((name, "")).path("/").build();
            cookie.make_removal();
            cookie
        })
        .collect()
}

/// Appends one `Set-Cookie` header per cookie.
pub fn append_set_cookies(headers: &mut HeaderMap, cookies: Vec<Cookie<'static>>) {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(_) => tracing::warn!(name = cookie.name(), "cookie value is not a valid header"),
        }
    }
}

fn session_cookie(
    settings: &CookieSettings,
    name: &'static str,
    value: &str,
    http_only: bool,
) -> Cookie<'static> {
    Cookie::build((name, value.to_string()))
        .path("/")
        .http_only(http_only)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(settings.max_age_secs))
        .build()
}
