use serde::Serialize;

use crate::session::Role;

/// Where an already-authenticated visitor is sent from the guest-only screens.
pub const ARTICLES_PATH: &str = "/articles";
/// Where unauthenticated or expired sessions are sent.
pub const LOGIN_PATH: &str = "/login";
/// Where role mismatches are sent.
pub const HOME_PATH: &str = "/";

// Screens a signed-in visitor should never land on.
const GUEST_ONLY: &[&str] = &["/", "/login", "/register"];

const PUBLIC: &[&str] = &["/", "/login", "/register", "/articles"];
const AUTHENTICATED_ANY: &[&str] = &["/edit", "/create", "/categories"];
const ADMIN_ONLY: &[&str] = &["/admin"];
const USER_ONLY: &[&str] = &["/user"];

/// PathClass
///
/// The partition a request path falls into. `Unlisted` covers gated paths that no
/// table entry claims; their fate is decided by the configured `UnmatchedPolicy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PathClass {
    Public,
    AuthenticatedAny,
    AdminOnly,
    UserOnly,
    Unlisted,
}

/// UnmatchedPolicy
///
/// Explicit default for authenticated requests to paths outside the path table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedPolicy {
    Allow,
    Deny,
}

/// TokenState
///
/// Outcome of the single verification performed for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No `token` cookie was sent.
    Absent,
    /// Signature checked and not expired.
    Valid,
    /// Present but malformed, badly signed, expired, or unverifiable (no secret).
    Invalid,
}

/// DenyReason
///
/// Why the gate redirected. Only `InvalidSignatureOrExpiry` clears the session cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DenyReason {
    AlreadyAuthenticated,
    MissingToken,
    InvalidSignatureOrExpiry,
    InsufficientRole,
    UnlistedPath,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::AlreadyAuthenticated => "already_authenticated",
            DenyReason::MissingToken => "missing_token",
            DenyReason::InvalidSignatureOrExpiry => "invalid_signature_or_expiry",
            DenyReason::InsufficientRole => "insufficient_role",
            DenyReason::UnlistedPath => "unlisted_path",
        }
    }
}

/// Redirect
///
/// A terminal gate decision: send the browser to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub to: &'static str,
    pub reason: DenyReason,
    /// When set, the response must also expire the `token` and `role` cookies.
    pub clear_session: bool,
}

/// Decision
///
/// The complete output of the gate for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Redirect(Redirect),
}

impl Decision {
    fn redirect(to: &'static str, reason: DenyReason) -> Self {
        Decision::Redirect(Redirect {
            to,
            reason,
            clear_session: reason == DenyReason::InvalidSignatureOrExpiry,
        })
    }

    pub fn is_continue(&self) -> bool {
        matches!(self, Decision::Continue)
    }
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    prefix: &'static str,
    class: PathClass,
}

/// PathTable
///
/// Static classification of URL path prefixes, plus the policy for paths that match none.
#[derive(Debug, Clone)]
pub struct PathTable {
    rules: Vec<Rule>,
    unmatched: UnmatchedPolicy,
}

impl PathTable {
    /// Builds the portal's route table.
    pub fn new(unmatched: UnmatchedPolicy) -> Self {
        let groups: [(&[&'static str], PathClass); 4] = [
            (PUBLIC, PathClass::Public),
            (AUTHENTICATED_ANY, PathClass::AuthenticatedAny),
            (ADMIN_ONLY, PathClass::AdminOnly),
            (USER_ONLY, PathClass::UserOnly),
        ];

        let rules = groups
            .iter()
            .flat_map(|(prefixes, class)| {
                prefixes.iter().map(move |prefix| Rule {
                    prefix: *prefix,
                    class: *class,
                })
            })
            .collect();

        Self { rules, unmatched }
    }

    pub fn unmatched_policy(&self) -> UnmatchedPolicy {
        self.unmatched
    }

    /// classify
    ///
    /// `Public` entries are consulted first. Among the remaining entries the longest
    /// matching prefix wins. The root entry `/` only matches the root itself.
    pub fn classify(&self, path: &str) -> PathClass {
        let path = normalize(path);

        let public = self
            .rules
            .iter()
            .any(|rule| rule.class == PathClass::Public && prefix_matches(rule.prefix, path));
        if public {
            return PathClass::Public;
        }

        self.rules
            .iter()
            .filter(|rule| rule.class != PathClass::Public && prefix_matches(rule.prefix, path))
            .max_by_key(|rule| rule.prefix.len())
            .map(|rule| rule.class)
            .unwrap_or(PathClass::Unlisted)
    }

    /// True for the landing, login and register screens (exact match).
    pub fn is_guest_only(&self, path: &str) -> bool {
        GUEST_ONLY.contains(&normalize(path))
    }
}

/// evaluate
///
/// Decides allow vs. redirect for one navigation request. Pure: the result depends only
/// on the arguments. The steps run in a fixed order and the order is part of the contract:
///
/// 1. valid token on a guest-only screen → `/articles`
/// 2. public path → continue
/// 3. no token → `/login`
/// 4. invalid token → `/login`, clearing the session
/// 5. authenticated-any path → continue
/// 6. `/admin` requires the Admin role, else `/`
/// 7. `/user` requires the User role, else `/`
/// 8. anything else follows the unmatched policy
pub fn evaluate(
    table: &PathTable,
    path: &str,
    token: TokenState,
    role: Option<Role>,
) -> Decision {
    if token == TokenState::Valid && table.is_guest_only(path) {
        return Decision::redirect(ARTICLES_PATH, DenyReason::AlreadyAuthenticated);
    }

    let class = table.classify(path);
    if class == PathClass::Public {
        return Decision::Continue;
    }

    match token {
        TokenState::Absent => return Decision::redirect(LOGIN_PATH, DenyReason::MissingToken),
        TokenState::Invalid => {
            return Decision::redirect(LOGIN_PATH, DenyReason::InvalidSignatureOrExpiry);
        }
        TokenState::Valid => {}
    }

    match class {
        PathClass::Public | PathClass::AuthenticatedAny => Decision::Continue,
        PathClass::AdminOnly => require_role(role, Role::Admin),
        PathClass::UserOnly => require_role(role, Role::User),
        PathClass::Unlisted => match table.unmatched {
            UnmatchedPolicy::Allow => Decision::Continue,
            UnmatchedPolicy::Deny => Decision::redirect(HOME_PATH, DenyReason::UnlistedPath),
        },
    }
}

fn require_role(actual: Option<Role>, required: Role) -> Decision {
    if actual == Some(required) {
        Decision::Continue
    } else {
        Decision::redirect(HOME_PATH, DenyReason::InsufficientRole)
    }
}

// Ignores one trailing slash so `/login/` is treated like `/login`.
fn normalize(path: &str) -> &str {
    if path.is_empty() {
        return "/";
    }
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    }
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return path == "/";
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
