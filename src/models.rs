use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::session::Role;

// --- Upstream Resources (as served by the blog REST API) ---

/// Category
///
/// A category record as returned by `GET /categories` and embedded in articles.
/// Identifiers are kept as strings because the API occasionally sends an empty id.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// ArticleAuthor
///
/// The minimal author record embedded in an article.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct ArticleAuthor {
    pub id: String,
    pub username: String,
}

/// Article
///
/// An article record as returned by `GET /articles` and `GET /articles/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Article {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub category_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ArticleAuthor>,
}

impl Article {
    pub fn category_name(&self) -> &str {
        self.category.as_ref().map(|c| c.name.as_str()).unwrap_or("")
    }

    pub fn category_ref_id(&self) -> &str {
        match &self.category {
            Some(category) => category.id.as_str(),
            None => self.category_id.as_str(),
        }
    }
}

/// ArticlePage
///
/// Envelope of the paged article listing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArticlePage {
    #[serde(default)]
    pub data: Vec<Article>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Profile
///
/// The account summary served by `GET /auth/profile`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Profile {
    #[serde(default)]
    pub id: String,
    pub username: String,
    pub role: String,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Credentials posted to `/login`. Forwarded verbatim to `/auth/login`; never logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// LoginResponse
///
/// What `/auth/login` hands back: the signed session token and the account role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// RegisterRequest
///
/// New account details posted to `/register`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// ArticleForm
///
/// The create/edit form as submitted by the UI.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ArticleForm {
    pub title: String,
    pub content: String,
    pub category_id: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// ArticlePayload
///
/// The cleaned article body sent to `POST /articles` and `PUT /articles/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePayload {
    pub title: String,
    pub content: String,
    pub category_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub image_url: Option<String>,
}

/// CategoryForm
///
/// Body for creating or renaming a category.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct CategoryForm {
    pub name: String,
}

/// UploadResponse
///
/// Result of the image upload action. `fallback` is set when the upstream upload failed
/// and the default thumbnail was substituted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UploadResponse {
    pub image_url: String,
    pub fallback: bool,
}

// --- Page Models (Output Schemas) ---

/// DataSource
///
/// Whether a page was filled from the live API or from the built-in seed data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DataSource {
    Live,
    Fallback,
}

/// CategoryOption
///
/// One entry of a category select box.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
}

/// Pagination
///
/// Page arithmetic for list screens.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

/// ArticleListPage
///
/// Page model for `/articles`, `/user/articles` and `/admin/articles`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ArticleListPage {
    pub articles: Vec<Article>,
    pub categories: Vec<CategoryOption>,
    pub pagination: Pagination,
    pub search: Option<String>,
    pub category: Option<String>,
    pub source: DataSource,
}

/// ArticleDetailPage
///
/// Page model for `/articles/{id}`: the article and up to three from the same category.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ArticleDetailPage {
    pub article: Article,
    pub related: Vec<Article>,
}

/// CategoryListPage
///
/// Page model for `/categories`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CategoryListPage {
    pub categories: Vec<Category>,
    pub pagination: Pagination,
    pub search: Option<String>,
    pub source: DataSource,
}

/// ArticleFormPage
///
/// Page model for `/create` and `/edit/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ArticleFormPage {
    pub article: Option<Article>,
    pub categories: Vec<CategoryOption>,
    pub source: DataSource,
}

/// LandingPage
///
/// Page model for `/`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LandingPage {
    pub title: String,
    pub latest: Vec<Article>,
    pub source: DataSource,
}

/// AuthFormPage
///
/// Descriptor for the login and register screens.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthFormPage {
    pub action: String,
    pub fields: Vec<String>,
    pub min_length: usize,
}

// --- Form Validation ---

/// FieldError
///
/// One rejected form field, returned with 422 so the UI can show it next to the input.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

pub const MIN_CREDENTIAL_LEN: usize = 6;
pub const MIN_CATEGORY_NAME_LEN: usize = 2;

impl LoginRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        validate_credentials(&self.username, &self.password)
    }
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        validate_credentials(&self.username, &self.password)
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    if username.trim().chars().count() < MIN_CREDENTIAL_LEN {
        errors.push(FieldError::new("username", "Username must be at least 6 characters"));
    }
    if password.chars().count() < MIN_CREDENTIAL_LEN {
        errors.push(FieldError::new("password", "Password must be at least 6 characters"));
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(())
}

impl ArticleForm {
    /// Checks the form and produces the body sent upstream: trimmed text, quote and brace
    /// characters stripped from the category id.
    pub fn into_payload(self, user_id: Option<String>) -> Result<ArticlePayload, Vec<FieldError>> {
        let title = self.title.trim().to_string();
        let content = self.content.trim().to_string();
        let category_id: String = self
            .category_id
            .chars()
            .filter(|c| !matches!(c, '\'' | '"' | '{' | '}'))
            .collect::<String>()
            .trim()
            .to_string();
        let image_url = self
            .image_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let mut errors = Vec::new();
        if title.is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        }
        if content.is_empty() {
            errors.push(FieldError::new("content", "Content is required"));
        }
        if category_id.is_empty() {
            errors.push(FieldError::new("categoryId", "Category is required"));
        }
        if let Some(url) = &image_url {
            let acceptable =
                url.starts_with("http://") || url.starts_with("https://") || url.starts_with('/');
            if !acceptable {
                errors.push(FieldError::new("imageUrl", "Invalid URL"));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ArticlePayload {
            title,
            content,
            category_id,
            user_id,
            image_url,
        })
    }
}

impl CategoryForm {
    /// Returns the trimmed form, or the reason it was rejected.
    pub fn validated(self) -> Result<CategoryForm, Vec<FieldError>> {
        let name = self.name.trim().to_string();
        if name.chars().count() < MIN_CATEGORY_NAME_LEN {
            return Err(vec![FieldError::new(
                "name",
                "Category name must be at least 2 characters",
            )]);
        }
        Ok(CategoryForm { name })
    }
}
