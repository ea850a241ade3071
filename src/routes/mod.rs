/// Router Module Index
///
/// Page routes grouped by the access-gate class their paths fall into. Every router
/// here is mounted behind the `access_gate` layer; the grouping documents which rule of
/// the path table governs each route.

/// Routes open to everyone: landing, login, register, article browsing.
pub mod public;

/// Routes that need any valid session: article editor, categories, profile.
pub mod authenticated;

/// Routes under `/admin`, restricted to the Admin role.
pub mod admin;

/// Routes under `/user`, restricted to the User role.
pub mod user;
