use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub product_count: u64,
    pub created_at: i64,
}

impl CategoryResponse {
    pub fn new(c: Category, product_count: u64) -> Self {
        CategoryResponse {
            id: c.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: c.name,
            slug: c.slug,
            description: c.description,
            image: c.image,
            product_count,
            created_at: c.created_at,
        }
    }
}
