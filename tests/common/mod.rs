#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, header},
};
use journal_portal::{
    AppConfig, AppState,
    api::{ApiError, BlogApi, ImageUpload, ListParams},
    auth::{Claims, JwtVerifier},
    gate::UnmatchedPolicy,
    models::{
        Article, ArticlePage, ArticlePayload, Category, CategoryForm, LoginRequest,
        LoginResponse, Profile, RegisterRequest,
    },
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{
    sync::{Arc, Mutex},
    time::SystemTime,
};

// --- Mock Upstream API ---

/// In-memory stand-in for the blog REST API. `offline` makes every call fail at the
/// transport level, which is what triggers the seed-data fallbacks.
#[derive(Clone, Default)]
pub struct MockBlogApi {
    pub offline: bool,
    pub upload_fails: bool,
    pub articles: Vec<Article>,
    pub total: Option<u64>,
    pub categories: serde_json::Value,
    pub login_response: Option<LoginResponse>,
    pub profile: Option<Profile>,
    pub list_calls: Arc<Mutex<Vec<ListParams>>>,
    pub writes: Arc<Mutex<Vec<String>>>,
}

impl MockBlogApi {
    fn offline_error() -> ApiError {
        ApiError::Transport("mock upstream offline".to_string())
    }

    fn check(&self) -> Result<(), ApiError> {
        if self.offline {
            Err(Self::offline_error())
        } else {
            Ok(())
        }
    }

    fn record(&self, entry: String) {
        self.writes.lock().unwrap().push(entry);
    }

    pub fn recorded_writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn recorded_lists(&self) -> Vec<ListParams> {
        self.list_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlogApi for MockBlogApi {
    async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.check()?;
        self.login_response.clone().ok_or(ApiError::Status {
            status: 401,
            message: "Invalid credentials".to_string(),
        })
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.check()?;
        self.record(format!("register {}", request.username));
        Ok(())
    }

    async fn profile(&self, _token: &str) -> Result<Profile, ApiError> {
        self.check()?;
        self.profile.clone().ok_or(ApiError::Status {
            status: 401,
            message: "Unauthorized".to_string(),
        })
    }

    async fn list_articles(&self, params: &ListParams) -> Result<ArticlePage, ApiError> {
        self.list_calls.lock().unwrap().push(params.clone());
        self.check()?;
        Ok(ArticlePage {
            data: self.articles.clone(),
            total: self.total,
            page: params.page,
            limit: params.limit,
        })
    }

    async fn get_article(&self, id: &str) -> Result<Article, ApiError> {
        self.check()?;
        self.articles
            .iter()
            .find(|article| article.id == id)
            .cloned()
            .ok_or(ApiError::Status {
                status: 404,
                message: "Article not found".to_string(),
            })
    }

    async fn create_article(&self, _token: &str, payload: &ArticlePayload) -> Result<(), ApiError> {
        self.check()?;
        self.record(format!("create_article {}", payload.title));
        Ok(())
    }

    async fn update_article(
        &self,
        _token: &str,
        id: &str,
        payload: &ArticlePayload,
    ) -> Result<(), ApiError> {
        self.check()?;
        self.record(format!("update_article {} {}", id, payload.title));
        Ok(())
    }

    async fn delete_article(&self, _token: &str, id: &str) -> Result<(), ApiError> {
        self.check()?;
        self.record(format!("delete_article {}", id));
        Ok(())
    }

    async fn list_categories(
        &self,
        _params: &ListParams,
        _token: Option<&str>,
    ) -> Result<serde_json::Value, ApiError> {
        self.check()?;
        Ok(self.categories.clone())
    }

    async fn create_category(&self, _token: &str, form: &CategoryForm) -> Result<(), ApiError> {
        self.check()?;
        self.record(format!("create_category {}", form.name));
        Ok(())
    }

    async fn update_category(
        &self,
        _token: &str,
        id: &str,
        form: &CategoryForm,
    ) -> Result<Category, ApiError> {
        self.check()?;
        self.record(format!("update_category {} {}", id, form.name));
        Ok(Category {
            id: id.to_string(),
            name: form.name.clone(),
            ..Category::default()
        })
    }

    async fn delete_category(&self, _token: &str, id: &str) -> Result<(), ApiError> {
        self.check()?;
        self.record(format!("delete_category {}", id));
        Ok(())
    }

    async fn upload_image(&self, _token: &str, upload: ImageUpload) -> Result<String, ApiError> {
        self.check()?;
        if self.upload_fails {
            return Err(ApiError::Status {
                status: 500,
                message: "storage unavailable".to_string(),
            });
        }
        Ok(format!("https://cdn.example.test/{}", upload.file_name))
    }
}

// --- Tokens ---

pub fn secret() -> String {
    AppConfig::default().jwt_secret
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Signs a token with the given secret. `exp_offset` is relative to now, in seconds.
pub fn mint_with(secret: &str, role: Option<&str>, exp_offset: i64) -> String {
    let now = now();
    let claims = Claims {
        sub: Some("user-1".to_string()),
        exp: (now + exp_offset) as usize,
        iat: Some(now as usize),
        role: role.map(str::to_string),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn valid_token(role: Option<&str>) -> String {
    mint_with(&secret(), role, 3600)
}

pub fn expired_token(role: Option<&str>) -> String {
    mint_with(&secret(), role, -3600)
}

/// Expired half a minute ago: inside the usual clock-skew allowance, still expired.
pub fn recently_expired_token(role: Option<&str>) -> String {
    mint_with(&secret(), role, -30)
}

pub fn forged_token(role: Option<&str>) -> String {
    mint_with("some-other-secret", role, 3600)
}

// --- State & Requests ---

pub fn config_with(policy: UnmatchedPolicy, trust_role_cookie: bool) -> AppConfig {
    AppConfig {
        unmatched_policy: policy,
        trust_role_cookie,
        ..AppConfig::default()
    }
}

pub fn state_with(api: MockBlogApi, config: AppConfig) -> AppState {
    let verifier = Arc::new(JwtVerifier::new(config.jwt_secret.clone()));
    AppState::new(Arc::new(api), verifier, config)
}

pub fn default_state(api: MockBlogApi) -> AppState {
    state_with(api, config_with(UnmatchedPolicy::Allow, false))
}

pub fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(path: &str, cookie: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn token_cookie(token: &str) -> String {
    format!("token={}", token)
}

pub fn sample_article(id: &str, category_id: &str, title: &str) -> Article {
    Article {
        id: id.to_string(),
        user_id: "author-1".to_string(),
        category_id: category_id.to_string(),
        title: title.to_string(),
        content: format!("<p>{} body</p>", title),
        image_url: None,
        created_at: None,
        updated_at: None,
        category: Some(Category {
            id: category_id.to_string(),
            name: format!("Category {}", category_id),
            ..Category::default()
        }),
        user: None,
    }
}
