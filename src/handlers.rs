use crate::{
    AppState,
    api::{ImageUpload, ListParams},
    auth::AuthUser,
    fallback,
    gate::{ARTICLES_PATH, HOME_PATH, LOGIN_PATH},
    listing::{self, ADMIN_PAGE_SIZE, ListQuery, USER_PAGE_SIZE},
    models::{
        ArticleDetailPage, ArticleForm, ArticleFormPage, ArticleListPage, AuthFormPage, Category,
        CategoryForm, CategoryListPage, DataSource, FieldError, LandingPage, LoginRequest,
        MIN_CREDENTIAL_LEN, Profile, RegisterRequest, UploadResponse,
    },
    session::{CookieSettings, Role, Session, append_set_cookies, clearing_cookies, login_cookies},
};
use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

const SITE_TITLE: &str = "The Journal";
const LANDING_SIZE: u32 = 3;
const DEFAULT_THUMBNAIL: &str = "/default-thumbnail.jpg";
const CATEGORIES_PATH: &str = "/categories";
const ADMIN_ARTICLES_PATH: &str = "/admin/articles";

fn rejected(errors: Vec<FieldError>) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
}

// --- Public Pages ---

/// landing
///
/// [Public Route] The three most recent articles. Signed-in visitors never get here: the
/// gate sends them to `/articles`.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Landing page", body = LandingPage))
)]
pub async fn landing(State(state): State<AppState>) -> Json<LandingPage> {
    let params = ListParams {
        page: Some(1),
        limit: Some(LANDING_SIZE),
        ..ListParams::default()
    };

    let (latest, source) = match state.api.list_articles(&params).await {
        Ok(page) => (page.data, DataSource::Live),
        Err(error) => {
            tracing::warn!(%error, "landing fetch failed; using seed articles");
            let mut seed = fallback::seed_articles();
            seed.truncate(LANDING_SIZE as usize);
            (seed, DataSource::Fallback)
        }
    };

    Json(LandingPage {
        title: SITE_TITLE.to_string(),
        latest,
        source,
    })
}

/// login_form
///
/// [Public Route] Describes the login form.
#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login form", body = AuthFormPage))
)]
pub async fn login_form() -> Json<AuthFormPage> {
    Json(AuthFormPage {
        action: LOGIN_PATH.to_string(),
        fields: vec!["username".to_string(), "password".to_string()],
        min_length: MIN_CREDENTIAL_LEN,
    })
}

/// register_form
///
/// [Public Route] Describes the registration form.
#[utoipa::path(
    get,
    path = "/register",
    responses((status = 200, description = "Register form", body = AuthFormPage))
)]
pub async fn register_form() -> Json<AuthFormPage> {
    Json(AuthFormPage {
        action: "/register".to_string(),
        fields: vec![
            "username".to_string(),
            "password".to_string(),
            "role".to_string(),
        ],
        min_length: MIN_CREDENTIAL_LEN,
    })
}

/// login
///
/// [Public Route] Exchanges credentials for a session at `/auth/login`, writes the session
/// cookies and sends the browser to `/articles`.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 303, description = "Logged in, redirect to /articles"),
        (status = 422, description = "Invalid form", body = [FieldError]),
        (status = 401, description = "Rejected by the API")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, StatusCode> {
    if let Err(errors) = payload.validate() {
        return Ok(rejected(errors));
    }

    let session = state.api.login(&payload).await.map_err(|error| {
        tracing::info!(%error, "login rejected upstream");
        StatusCode::from(error)
    })?;

    // The gate reads the role from the signed claims, so a token without one can never
    // reach the role-restricted areas.
    match state.verifier.verify(&session.token).await {
        Ok(claims) if claims.role().is_none() && !state.config.trust_role_cookie => {
            tracing::warn!("issued token carries no role claim; /admin and /user will be unreachable");
        }
        Ok(_) => {}
        Err(error) => tracing::warn!(%error, "issued token does not verify with the configured secret"),
    }

    let settings = CookieSettings::from(&state.config);
    let mut response = Redirect::to(ARTICLES_PATH).into_response();
    append_set_cookies(
        response.headers_mut(),
        login_cookies(
            &settings,
            &session.token,
            &session.role,
            session.refresh_token.as_deref(),
        ),
    );
    Ok(response)
}

/// register
///
/// [Public Route] Creates an account at `/auth/register`, then sends the browser to `/login`.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 303, description = "Registered, redirect to /login"),
        (status = 422, description = "Invalid form", body = [FieldError])
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, StatusCode> {
    if let Err(errors) = payload.validate() {
        return Ok(rejected(errors));
    }

    state.api.register(&payload).await.map_err(|error| {
        tracing::info!(%error, "registration rejected upstream");
        StatusCode::from(error)
    })?;

    Ok(Redirect::to(LOGIN_PATH).into_response())
}

/// logout
///
/// Expires every session cookie and returns to the landing page. Not gated, so a stale
/// or broken session can always be dropped.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Logged out, redirect to /"))
)]
pub async fn logout() -> Response {
    let mut response = Redirect::to(HOME_PATH).into_response();
    append_set_cookies(response.headers_mut(), clearing_cookies());
    response
}

/// article_list
///
/// [Public Route] Article cards with search, category filter and pagination. Admins get
/// the management page size (ten), everyone else nine.
#[utoipa::path(
    get,
    path = "/articles",
    params(ListQuery),
    responses((status = 200, description = "Article list", body = ArticleListPage))
)]
pub async fn article_list(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
    Query(query): Query<ListQuery>,
) -> Json<ArticleListPage> {
    let is_admin = session.is_some_and(|Extension(session)| session.role == Some(Role::Admin));
    let limit = if is_admin { ADMIN_PAGE_SIZE } else { USER_PAGE_SIZE };
    Json(listing::load_article_list(state.api.as_ref(), &query, limit).await)
}

/// article_detail
///
/// [Public Route] One article and up to three related ones.
#[utoipa::path(
    get,
    path = "/articles/{id}",
    params(("id" = String, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = ArticleDetailPage),
        (status = 404, description = "Not Found")
    )
)]
pub async fn article_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArticleDetailPage>, StatusCode> {
    match listing::load_article_detail(state.api.as_ref(), &id).await {
        Ok(page) => Ok(Json(page)),
        Err(error) => {
            tracing::debug!(%error, article = %id, "article unavailable");
            Err(StatusCode::NOT_FOUND)
        }
    }
}

// --- Authenticated Pages ---

/// create_form
///
/// [Authenticated Route] Category options for a new article.
#[utoipa::path(
    get,
    path = "/create",
    responses((status = 200, description = "Article form", body = ArticleFormPage))
)]
pub async fn create_form(user: AuthUser, State(state): State<AppState>) -> Json<ArticleFormPage> {
    Json(listing::load_article_form(state.api.as_ref(), None, &user.token).await)
}

/// create_article
///
/// [Authenticated Route] Submits a new article, then returns to `/articles`.
#[utoipa::path(
    post,
    path = "/create",
    request_body = ArticleForm,
    responses(
        (status = 303, description = "Created, redirect to /articles"),
        (status = 422, description = "Invalid form", body = [FieldError])
    )
)]
pub async fn create_article(
    user: AuthUser,
    State(state): State<AppState>,
    Json(form): Json<ArticleForm>,
) -> Result<Response, StatusCode> {
    let payload = match form.into_payload(user.subject.clone()) {
        Ok(payload) => payload,
        Err(errors) => return Ok(rejected(errors)),
    };

    state.api.create_article(&user.token, &payload).await?;
    tracing::info!(title = %payload.title, "article created");
    Ok(Redirect::to(ARTICLES_PATH).into_response())
}

/// upload_image
///
/// [Authenticated Route] Forwards the form's `image` (or `file`) part to `/upload`. When
/// the upload fails the default thumbnail is returned so the form can still be saved.
#[utoipa::path(
    post,
    path = "/create/upload",
    responses(
        (status = 200, description = "Stored image URL", body = UploadResponse),
        (status = 400, description = "No image part")
    )
)]
pub async fn upload_image(
    user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, StatusCode> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        if !matches!(field.name(), Some("image") | Some("file")) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.bin").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        upload = Some(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or(StatusCode::BAD_REQUEST)?;

    match state.api.upload_image(&user.token, upload).await {
        Ok(image_url) => Ok(Json(UploadResponse {
            image_url,
            fallback: false,
        })),
        Err(error) => {
            tracing::warn!(%error, "image upload failed; substituting default thumbnail");
            Ok(Json(UploadResponse {
                image_url: DEFAULT_THUMBNAIL.to_string(),
                fallback: true,
            }))
        }
    }
}

/// edit_form
///
/// [Authenticated Route] The article being edited plus category options.
#[utoipa::path(
    get,
    path = "/edit/{id}",
    params(("id" = String, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article form", body = ArticleFormPage),
        (status = 404, description = "Not Found")
    )
)]
pub async fn edit_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArticleFormPage>, StatusCode> {
    let page = listing::load_article_form(state.api.as_ref(), Some(&id), &user.token).await;
    if page.article.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(page))
}

/// update_article
///
/// [Authenticated Route] Saves an edited article, then returns to `/articles`.
#[utoipa::path(
    post,
    path = "/edit/{id}",
    params(("id" = String, Path, description = "Article ID")),
    request_body = ArticleForm,
    responses(
        (status = 303, description = "Updated, redirect to /articles"),
        (status = 422, description = "Invalid form", body = [FieldError])
    )
)]
pub async fn update_article(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<ArticleForm>,
) -> Result<Response, StatusCode> {
    let payload = match form.into_payload(user.subject.clone()) {
        Ok(payload) => payload,
        Err(errors) => return Ok(rejected(errors)),
    };

    state.api.update_article(&user.token, &id, &payload).await?;
    tracing::info!(article = %id, "article updated");
    Ok(Redirect::to(ARTICLES_PATH).into_response())
}

/// categories_page
///
/// [Authenticated Route] The category management table.
#[utoipa::path(
    get,
    path = "/categories",
    params(ListQuery),
    responses((status = 200, description = "Category list", body = CategoryListPage))
)]
pub async fn categories_page(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<CategoryListPage> {
    Json(listing::load_category_page(state.api.as_ref(), &query, Some(&user.token)).await)
}

/// create_category
///
/// [Authenticated Route] Adds a category, then returns to `/categories`.
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CategoryForm,
    responses(
        (status = 303, description = "Created, redirect to /categories"),
        (status = 422, description = "Invalid form", body = [FieldError])
    )
)]
pub async fn create_category(
    user: AuthUser,
    State(state): State<AppState>,
    Json(form): Json<CategoryForm>,
) -> Result<Response, StatusCode> {
    let form = match form.validated() {
        Ok(form) => form,
        Err(errors) => return Ok(rejected(errors)),
    };

    state.api.create_category(&user.token, &form).await?;
    Ok(Redirect::to(CATEGORIES_PATH).into_response())
}

/// update_category
///
/// [Authenticated Route] Renames a category and returns the stored record.
#[utoipa::path(
    post,
    path = "/categories/{id}",
    params(("id" = String, Path, description = "Category ID")),
    request_body = CategoryForm,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 422, description = "Invalid form", body = [FieldError])
    )
)]
pub async fn update_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<CategoryForm>,
) -> Result<Response, StatusCode> {
    let form = match form.validated() {
        Ok(form) => form,
        Err(errors) => return Ok(rejected(errors)),
    };

    let category = state.api.update_category(&user.token, &id, &form).await?;
    Ok(Json(category).into_response())
}

/// delete_category
///
/// [Authenticated Route] Removes a category, then returns to `/categories`.
#[utoipa::path(
    post,
    path = "/categories/{id}/delete",
    params(("id" = String, Path, description = "Category ID")),
    responses((status = 303, description = "Deleted, redirect to /categories"))
)]
pub async fn delete_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, StatusCode> {
    state.api.delete_category(&user.token, &id).await?;
    tracing::info!(category = %id, "category deleted");
    Ok(Redirect::to(CATEGORIES_PATH))
}

/// profile
///
/// [Authenticated Route] The signed-in account as reported by `/auth/profile`. Served at
/// `/profile`, `/admin/profile` and `/user/profile`.
#[utoipa::path(
    get,
    path = "/profile",
    responses((status = 200, description = "Profile", body = Profile))
)]
pub async fn profile(user: AuthUser, State(state): State<AppState>) -> Result<Json<Profile>, StatusCode> {
    let profile = state.api.profile(&user.token).await?;
    Ok(Json(profile))
}

// --- Role Areas ---

/// admin_articles
///
/// [Admin Route] The article management table (ten per page).
#[utoipa::path(
    get,
    path = "/admin/articles",
    params(ListQuery),
    responses((status = 200, description = "Article list", body = ArticleListPage))
)]
pub async fn admin_articles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ArticleListPage> {
    Json(listing::load_article_list(state.api.as_ref(), &query, ADMIN_PAGE_SIZE).await)
}

/// delete_article
///
/// [Admin Route] Removes an article, then returns to `/admin/articles`.
///
/// *Authorization*: re-checks the Admin role even though the gate already did.
#[utoipa::path(
    post,
    path = "/admin/articles/{id}/delete",
    params(("id" = String, Path, description = "Article ID")),
    responses(
        (status = 303, description = "Deleted, redirect to /admin/articles"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn delete_article(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, StatusCode> {
    if user.role != Some(Role::Admin) {
        return Err(StatusCode::FORBIDDEN);
    }

    state.api.delete_article(&user.token, &id).await?;
    tracing::info!(article = %id, "article deleted");
    Ok(Redirect::to(ADMIN_ARTICLES_PATH))
}

/// user_articles
///
/// [User Route] The reader's article grid (nine per page).
#[utoipa::path(
    get,
    path = "/user/articles",
    params(ListQuery),
    responses((status = 200, description = "Article list", body = ArticleListPage))
)]
pub async fn user_articles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ArticleListPage> {
    Json(listing::load_article_list(state.api.as_ref(), &query, USER_PAGE_SIZE).await)
}
