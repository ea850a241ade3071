use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::{Client, RequestBuilder, Url, multipart};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::models::{
    Article, ArticlePage, ArticlePayload, Category, CategoryForm, LoginRequest, LoginResponse,
    Profile, RegisterRequest,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// ApiError
///
/// Failures talking to the upstream blog API.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
    #[error("not a usable resource id: {0:?}")]
    InvalidId(String),
}

impl From<ApiError> for StatusCode {
    /// Upstream statuses pass through; anything that never produced a usable answer is a
    /// bad gateway.
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Status { status, .. } => {
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::InvalidId(_) => StatusCode::BAD_REQUEST,
            ApiError::Transport(_) | ApiError::Decode(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// ListParams
///
/// Query parameters understood by the upstream list endpoints.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<String>,
}

/// ImageUpload
///
/// A file received from the article form, ready to be forwarded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// BlogApi
///
/// Contract for every call the portal makes to the upstream REST API. Handlers only see
/// this trait, so tests swap in an in-memory implementation.
#[async_trait]
pub trait BlogApi: Send + Sync {
    // --- Auth ---
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;
    async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError>;
    async fn profile(&self, token: &str) -> Result<Profile, ApiError>;

    // --- Articles ---
    async fn list_articles(&self, params: &ListParams) -> Result<ArticlePage, ApiError>;
    async fn get_article(&self, id: &str) -> Result<Article, ApiError>;
    async fn create_article(&self, token: &str, payload: &ArticlePayload) -> Result<(), ApiError>;
    async fn update_article(
        &self,
        token: &str,
        id: &str,
        payload: &ArticlePayload,
    ) -> Result<(), ApiError>;
    async fn delete_article(&self, token: &str, id: &str) -> Result<(), ApiError>;

    // --- Categories ---
    /// Returned raw: the API answers either `{ data: [...] }` or a bare array, and the
    /// items are sometimes plain strings.
    async fn list_categories(
        &self,
        params: &ListParams,
        token: Option<&str>,
    ) -> Result<serde_json::Value, ApiError>;
    async fn create_category(&self, token: &str, form: &CategoryForm) -> Result<(), ApiError>;
    async fn update_category(
        &self,
        token: &str,
        id: &str,
        form: &CategoryForm,
    ) -> Result<Category, ApiError>;
    async fn delete_category(&self, token: &str, id: &str) -> Result<(), ApiError>;

    // --- Media ---
    /// Returns the public URL of the stored image.
    async fn upload_image(&self, token: &str, upload: ImageUpload) -> Result<String, ApiError>;
}

/// BlogApiState
///
/// The shared handle stored in the application state.
pub type BlogApiState = Arc<dyn BlogApi>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedImage {
    image_url: Option<String>,
    url: Option<String>,
}

/// HttpBlogApi
///
/// `BlogApi` over HTTP with reqwest. Every request is bounded by a fixed timeout.
#[derive(Clone)]
pub struct HttpBlogApi {
    client: Client,
    base_url: Url,
}

impl HttpBlogApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Transport(format!("invalid base URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Transport(format!("base URL {base_url} cannot carry a path")));
        }

        Ok(Self { client, base_url })
    }

    /// Appends `segments` to the base URL's path. Each segment is percent-encoded on its
    /// own, so an id can never introduce `/` or dot segments into the upstream path.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if let Some(bad) = segments
            .iter()
            .find(|segment| segment.is_empty() || **segment == "." || **segment == "..")
        {
            return Err(ApiError::InvalidId((*bad).to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = checked(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_discarding(&self, request: RequestBuilder) -> Result<(), ApiError> {
        checked(request).await.map(|_| ())
    }
}

// Sends the request and turns non-2xx answers into `ApiError::Status`, keeping the API's
// `message` field when it sent one.
async fn checked(request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

fn with_token(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

#[async_trait]
impl BlogApi for HttpBlogApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.send(self.client.post(self.url(&["auth", "login"])?).json(request))
            .await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.send_discarding(self.client.post(self.url(&["auth", "register"])?).json(request))
            .await
    }

    async fn profile(&self, token: &str) -> Result<Profile, ApiError> {
        self.send(self.client.get(self.url(&["auth", "profile"])?).bearer_auth(token))
            .await
    }

    async fn list_articles(&self, params: &ListParams) -> Result<ArticlePage, ApiError> {
        self.send(self.client.get(self.url(&["articles"])?).query(params))
            .await
    }

    async fn get_article(&self, id: &str) -> Result<Article, ApiError> {
        self.send(self.client.get(self.url(&["articles", id])?))
            .await
    }

    async fn create_article(&self, token: &str, payload: &ArticlePayload) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url(&["articles"])?)
            .bearer_auth(token)
            .json(payload);
        self.send_discarding(request).await
    }

    async fn update_article(
        &self,
        token: &str,
        id: &str,
        payload: &ArticlePayload,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .put(self.url(&["articles", id])?)
            .bearer_auth(token)
            .json(payload);
        self.send_discarding(request).await
    }

    async fn delete_article(&self, token: &str, id: &str) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.url(&["articles", id])?)
            .bearer_auth(token);
        self.send_discarding(request).await
    }

    async fn list_categories(
        &self,
        params: &ListParams,
        token: Option<&str>,
    ) -> Result<serde_json::Value, ApiError> {
        let request = with_token(self.client.get(self.url(&["categories"])?).query(params), token);
        self.send(request).await
    }

    async fn create_category(&self, token: &str, form: &CategoryForm) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url(&["categories"])?)
            .bearer_auth(token)
            .json(form);
        self.send_discarding(request).await
    }

    async fn update_category(
        &self,
        token: &str,
        id: &str,
        form: &CategoryForm,
    ) -> Result<Category, ApiError> {
        let request = self
            .client
            .put(self.url(&["categories", id])?)
            .bearer_auth(token)
            .json(form);
        self.send(request).await
    }

    async fn delete_category(&self, token: &str, id: &str) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.url(&["categories", id])?)
            .bearer_auth(token);
        self.send_discarding(request).await
    }

    async fn upload_image(&self, token: &str, upload: ImageUpload) -> Result<String, ApiError> {
        let part = multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let form = multipart::Form::new().part("image", part);

        let request = self
            .client
            .post(self.url(&["upload"])?)
            .bearer_auth(token)
            .multipart(form);
        let uploaded: UploadedImage = self.send(request).await?;

        uploaded
            .image_url
            .or(uploaded.url)
            .ok_or_else(|| ApiError::Decode("upload response carried no image URL".to_string()))
    }
}
