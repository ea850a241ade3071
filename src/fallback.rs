//! Built-in seed content shown when the upstream API cannot be reached, so list screens
//! still render something meaningful.

use chrono::{TimeZone, Utc};

use crate::models::{Article, ArticleAuthor, Category};

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Option<chrono::DateTime<Utc>> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single()
}

pub fn seed_categories() -> Vec<Category> {
    vec![
        Category {
            id: "3b77acb5-7d99-4eb9-8a56-f6838c4b40a7".to_string(),
            user_id: Some("9f34e74e-1cf9-47d9-aa04-56c7ba1e3e8b".to_string()),
            name: "Hiking".to_string(),
            created_at: at(2025, 5, 25, 17, 35),
            updated_at: at(2025, 5, 25, 17, 35),
        },
        Category {
            id: "3b8c4851-f989-43bd-8d0b-3db2e739e6cc".to_string(),
            user_id: Some("55b0a361-45d1-476e-bdfd-fad0e86315e5".to_string()),
            name: "UFC".to_string(),
            created_at: at(2025, 5, 24, 23, 49),
            updated_at: at(2025, 5, 27, 18, 54),
        },
        Category {
            id: "687dcbaa-34d0-4ef3-ae97-be2db1f4e6fd".to_string(),
            user_id: Some("55b0a361-45d1-476e-bdfd-fad0e86315e5".to_string()),
            name: "Technology".to_string(),
            created_at: at(2025, 5, 14, 14, 11),
            updated_at: at(2025, 5, 27, 15, 3),
        },
    ]
}

pub fn seed_articles() -> Vec<Article> {
    let categories = seed_categories();
    let category = |index: usize| categories.get(index).cloned();

    vec![
        Article {
            id: "4624f0b8-abfc-456f-827e-ce648458d556".to_string(),
            user_id: "8ef487e5-1b79-492b-b940-dad44d4ae2aa".to_string(),
            category_id: "687dcbaa-34d0-4ef3-ae97-be2db1f4e6fd".to_string(),
            title: "Streaming culture and the rise of live sports commentary".to_string(),
            content: "<p>Live streamers have become a second broadcast channel for major sporting events.</p>"
                .to_string(),
            image_url: Some("/default-thumbnail.jpg".to_string()),
            created_at: at(2025, 5, 28, 13, 22),
            updated_at: at(2025, 5, 28, 13, 30),
            category: category(2),
            user: Some(ArticleAuthor {
                id: "8ef487e5-1b79-492b-b940-dad44d4ae2aa".to_string(),
                username: "sayaadmin".to_string(),
            }),
        },
        Article {
            id: "5c2c9234-e00d-47f6-b301-17bc6a052af1".to_string(),
            user_id: "d80e40ed-9236-49d8-b4b8-d6f1ffaae868".to_string(),
            category_id: "3b8c4851-f989-43bd-8d0b-3db2e739e6cc".to_string(),
            title: "What a title fight week looks like from the inside".to_string(),
            content: "<p>Weigh-ins, media days and the long wait before the walkout.</p>".to_string(),
            image_url: Some("/default-thumbnail.jpg".to_string()),
            created_at: at(2025, 5, 11, 5, 20),
            updated_at: at(2025, 5, 12, 3, 44),
            category: category(1),
            user: Some(ArticleAuthor {
                id: "d80e40ed-9236-49d8-b4b8-d6f1ffaae868".to_string(),
                username: "writer01".to_string(),
            }),
        },
        Article {
            id: "9a1d3e55-2f0b-4c6e-9a57-1f3c2b7d8e90".to_string(),
            user_id: "d80e40ed-9236-49d8-b4b8-d6f1ffaae868".to_string(),
            category_id: "3b77acb5-7d99-4eb9-8a56-f6838c4b40a7".to_string(),
            title: "Packing light for a three-day ridge hike".to_string(),
            content: "<p>Every gram counts once the trail starts climbing.</p>".to_string(),
            image_url: Some("/default-thumbnail.jpg".to_string()),
            created_at: at(2025, 5, 26, 9, 0),
            updated_at: at(2025, 5, 26, 9, 0),
            category: category(0),
            user: Some(ArticleAuthor {
                id: "d80e40ed-9236-49d8-b4b8-d6f1ffaae868".to_string(),
                username: "writer01".to_string(),
            }),
        },
    ]
}

pub fn seed_article(id: &str) -> Option<Article> {
    seed_articles().into_iter().find(|article| article.id == id)
}
