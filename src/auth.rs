use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::AppConfig,
    session::{Role, Session, SessionCookies},
};

/// Claims
///
/// The payload of a session token issued by the upstream API. Only `exp` is mandatory;
/// `role` is the signed role binding the access gate trusts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the account identifier, when the issuer includes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Expiration Time (exp): seconds since the epoch after which the token is rejected.
    pub exp: usize,
    /// Issued At (iat).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,
    /// Role claim, `Admin` or `User` in any case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Claims {
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::parse)
    }
}

/// VerifyError
///
/// Every way a token can fail verification. The gate treats all of them alike (the
/// session is invalid) but they are kept apart for logging.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("no verification secret is configured")]
    MissingSecret,
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token has expired")]
    Expired,
}

/// TokenVerifier
///
/// The signature/expiry check the access gate composes with its path table. Kept behind
/// a trait so tests and alternative issuers can plug in their own.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError>;
}

/// VerifierState
///
/// The shared verifier handle stored in the application state.
pub type VerifierState = Arc<dyn TokenVerifier>;

/// JwtVerifier
///
/// HS256 verification against the shared secret, with expiry always enforced.
#[derive(Clone)]
pub struct JwtVerifier {
    secret: String,
}

impl JwtVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        if self.secret.is_empty() {
            return Err(VerifyError::MissingSecret);
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // No clock tolerance: a token is unusable from its `exp` second onward.
        validation.leeway = 0;

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(VerifyError::Expired),
                ErrorKind::InvalidSignature => Err(VerifyError::BadSignature),
                _ => Err(VerifyError::Malformed),
            },
        }
    }
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated page request, carrying the raw token so
/// handlers can forward it to the upstream API as a Bearer credential.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub token: String,
    pub subject: Option<String>,
    pub role: Option<Role>,
}

impl AuthUser {
    fn from_session(session: &Session) -> Option<Self> {
        if !session.is_authenticated() {
            return None;
        }
        Some(AuthUser {
            token: session.token.clone()?,
            subject: session.claims.as_ref().and_then(|claims| claims.sub.clone()),
            role: session.role,
        })
    }
}

/// AuthUser Extractor Implementation
///
/// Behind the access gate the session is already resolved and sits in the request
/// extensions, so no second verification happens. Outside the gate the token is read from
/// the `token` cookie or an `Authorization: Bearer` header and verified here.
///
/// Rejection: StatusCode::UNAUTHORIZED (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    VerifierState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return AuthUser::from_session(session).ok_or(StatusCode::UNAUTHORIZED);
        }

        let verifier = VerifierState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let mut cookies = SessionCookies::from_headers(&parts.headers);
        if cookies.token.is_none() {
            cookies.token = parts
                .headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::to_string);
        }
        if cookies.token.is_none() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let session = Session::resolve(cookies, verifier.as_ref(), config.trust_role_cookie).await;
        AuthUser::from_session(&session).ok_or(StatusCode::UNAUTHORIZED)
    }
}
