use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    api::{ApiError, BlogApi, ListParams},
    fallback,
    models::{
        Article, ArticleDetailPage, ArticleFormPage, ArticleListPage, Category, CategoryListPage,
        CategoryOption, DataSource, Pagination,
    },
};

pub const ARTICLE_SEARCH_FIELDS: &str = "title,content,category.name";
pub const CATEGORY_SEARCH_FIELDS: &str = "name";
pub const USER_PAGE_SIZE: u32 = 9;
pub const ADMIN_PAGE_SIZE: u32 = 10;
pub const CATEGORY_PAGE_SIZE: u32 = 10;

const RELATED_FETCH_LIMIT: u32 = 4;
const RELATED_MAX: usize = 3;
const UNNAMED_CATEGORY: &str = "Unnamed Category";

/// ListQuery
///
/// The query string of a list screen, exactly as the browser sent it.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Free-text search term.
    pub search: Option<String>,
    /// Category id filter; `all` means no filter.
    pub category: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
}

/// NormalizedQuery
///
/// A `ListQuery` with blanks removed and the page clamped to at least 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: u32,
}

impl ListQuery {
    pub fn normalize(&self) -> NormalizedQuery {
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string);
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && !id.eq_ignore_ascii_case("all"))
            .map(str::to_string);

        NormalizedQuery {
            search,
            category,
            page: self.page.unwrap_or(1).max(1),
        }
    }
}

/// paginate
///
/// `total_pages = ceil(total / limit)`; a zero limit yields zero pages.
pub fn paginate(page: u32, limit: u32, total: u64) -> Pagination {
    let total_pages = if limit == 0 {
        0
    } else {
        u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
    };

    Pagination {
        page,
        limit,
        total,
        total_pages,
        has_previous: page > 1,
        has_next: page < total_pages,
    }
}

/// Case-insensitive match of `term` against title, content and category name.
pub fn matches_search(article: &Article, term: &str) -> bool {
    let term = term.to_lowercase();
    article.title.to_lowercase().contains(&term)
        || article.content.to_lowercase().contains(&term)
        || article.category_name().to_lowercase().contains(&term)
}

/// category_options
///
/// Normalizes a raw `/categories` payload into select options. The list is taken from a
/// `data` field when present, otherwise from the payload itself. Non-blank string items
/// become `{id: s, name: s}`; object items need a non-empty id and get a default name. Returns
/// `None` when there is no array to read.
pub fn category_options(raw: &serde_json::Value) -> Option<Vec<CategoryOption>> {
    let items = raw.get("data").unwrap_or(raw).as_array()?;

    let options = items
        .iter()
        .filter_map(|item| match item {
            serde_json::Value::String(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some(CategoryOption {
                    id: name.to_string(),
                    name: name.to_string(),
                })
            }
            serde_json::Value::Object(fields) => {
                let id = scalar_text(fields.get("id"));
                if id.is_empty() {
                    return None;
                }
                let name = match scalar_text(fields.get("name")) {
                    name if name.is_empty() => UNNAMED_CATEGORY.to_string(),
                    name => name,
                };
                Some(CategoryOption { id, name })
            }
            _ => None,
        })
        .collect();

    Some(options)
}

// Renders a JSON scalar as trimmed text; missing, null and structured values are empty.
fn scalar_text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// related_articles
///
/// Keeps articles of the same category, never the article itself, at most three.
pub fn related_articles(current_id: &str, category_id: &str, candidates: Vec<Article>) -> Vec<Article> {
    candidates
        .into_iter()
        .filter(|article| article.id != current_id && article.category_ref_id() == category_id)
        .take(RELATED_MAX)
        .collect()
}

pub fn seed_options() -> Vec<CategoryOption> {
    fallback::seed_categories()
        .into_iter()
        .map(|category| CategoryOption {
            id: category.id,
            name: category.name,
        })
        .collect()
}

/// Category options for list filters, falling back to the seed categories.
pub async fn load_category_options(api: &dyn BlogApi, token: Option<&str>) -> Vec<CategoryOption> {
    match api.list_categories(&ListParams::default(), token).await {
        Ok(raw) => category_options(&raw).unwrap_or_else(seed_options),
        Err(error) => {
            tracing::warn!(%error, "category fetch failed; using seed categories");
            seed_options()
        }
    }
}

/// load_article_list
///
/// Fetches one page of articles plus the category filter options. When a search term is
/// present the fetched page is re-filtered locally. An upstream failure yields the seed
/// articles with `DataSource::Fallback`.
pub async fn load_article_list(api: &dyn BlogApi, query: &ListQuery, limit: u32) -> ArticleListPage {
    let query = query.normalize();
    let params = ListParams {
        search: query.search.clone(),
        category: query.category.clone(),
        page: Some(query.page),
        limit: Some(limit),
        search_fields: Some(ARTICLE_SEARCH_FIELDS.to_string()),
        ..ListParams::default()
    };

    let (articles, total, source) = match api.list_articles(&params).await {
        Ok(page) => {
            let total = page.total.unwrap_or(page.data.len() as u64);
            let articles = match &query.search {
                Some(term) => page
                    .data
                    .into_iter()
                    .filter(|article| matches_search(article, term))
                    .collect(),
                None => page.data,
            };
            (articles, total, DataSource::Live)
        }
        Err(error) => {
            tracing::warn!(%error, "article fetch failed; using seed articles");
            let seed = fallback::seed_articles();
            let total = seed.len() as u64;
            (seed, total, DataSource::Fallback)
        }
    };

    let categories = load_category_options(api, None).await;

    ArticleListPage {
        articles,
        categories,
        pagination: paginate(query.page, limit, total),
        search: query.search,
        category: query.category,
        source,
    }
}

/// load_category_page
///
/// One page of the category management table, falling back to the seed categories.
pub async fn load_category_page(
    api: &dyn BlogApi,
    query: &ListQuery,
    token: Option<&str>,
) -> CategoryListPage {
    let query = query.normalize();
    let params = ListParams {
        search: query.search.clone(),
        page: Some(query.page),
        limit: Some(CATEGORY_PAGE_SIZE),
        search_fields: Some(CATEGORY_SEARCH_FIELDS.to_string()),
        ..ListParams::default()
    };

    let live = match api.list_categories(&params, token).await {
        Ok(raw) => {
            let total = raw.get("totalData").and_then(|value| value.as_u64());
            let items = raw.get("data").unwrap_or(&raw).clone();
            match serde_json::from_value::<Vec<Category>>(items) {
                Ok(categories) => {
                    let total = total.unwrap_or(categories.len() as u64);
                    Some((categories, total))
                }
                Err(error) => {
                    tracing::warn!(%error, "category page was not a list of categories");
                    None
                }
            }
        }
        Err(error) => {
            tracing::warn!(%error, "category page fetch failed");
            None
        }
    };

    let (categories, total, source) = match live {
        Some((categories, total)) => (categories, total, DataSource::Live),
        None => {
            let seed = fallback::seed_categories();
            let total = seed.len() as u64;
            (seed, total, DataSource::Fallback)
        }
    };

    CategoryListPage {
        categories,
        pagination: paginate(query.page, CATEGORY_PAGE_SIZE, total),
        search: query.search,
        source,
    }
}

/// load_article_detail
///
/// The article itself must load; related articles are best effort.
pub async fn load_article_detail(api: &dyn BlogApi, id: &str) -> Result<ArticleDetailPage, ApiError> {
    let article = api.get_article(id).await?;
    let category_id = article.category_ref_id().to_string();

    let params = ListParams {
        category_id: Some(category_id.clone()),
        limit: Some(RELATED_FETCH_LIMIT),
        ..ListParams::default()
    };
    let related = match api.list_articles(&params).await {
        Ok(page) => related_articles(&article.id, &category_id, page.data),
        Err(error) => {
            tracing::warn!(%error, article = %article.id, "related article fetch failed");
            Vec::new()
        }
    };

    Ok(ArticleDetailPage { article, related })
}

/// load_article_form
///
/// Data for the create (no id) and edit (with id) forms. Category options keep only
/// entries with both an id and a name. Either fetch failing switches the page to seed
/// data; an edit of an id unknown to both sources leaves `article` empty.
pub async fn load_article_form(api: &dyn BlogApi, id: Option<&str>, token: &str) -> ArticleFormPage {
    let mut source = DataSource::Live;

    let categories = match api.list_categories(&ListParams::default(), Some(token)).await {
        Ok(raw) => category_options(&raw)
            .unwrap_or_default()
            .into_iter()
            .filter(|option| !option.id.is_empty() && !option.name.is_empty())
            .collect(),
        Err(error) => {
            tracing::warn!(%error, "form categories fetch failed; using seed categories");
            source = DataSource::Fallback;
            seed_options()
        }
    };

    let article = match id {
        None => None,
        Some(id) => match api.get_article(id).await {
            Ok(article) => Some(article),
            Err(error) => {
                tracing::warn!(%error, article = %id, "article fetch failed; trying seed articles");
                source = DataSource::Fallback;
                fallback::seed_article(id)
            }
        },
    };

    ArticleFormPage {
        article,
        categories,
        source,
    }
}
