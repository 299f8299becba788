use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::product::ProductResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub product_id: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddFavoriteRequest {
    pub product_id: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FavoriteResponse {
    pub id: String,
    pub product_id: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductResponse>,
}

impl FavoriteResponse {
    pub fn new(f: Favorite, product: Option<ProductResponse>) -> Self {
        FavoriteResponse {
            id: f.id.map(|id| id.to_hex()).unwrap_or_default(),
            product_id: f.product_id,
            created_at: f.created_at,
            product,
        }
    }
}
