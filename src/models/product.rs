use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Produto do catálogo (armazenado no MongoDB)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Preço unitário (> 0)
    pub price: f64,

    /// Slug da categoria
    pub category: String,

    /// URLs das imagens (Cloudinary)
    #[serde(default)]
    pub images: Vec<String>,

    /// Tamanhos disponíveis; vazio = produto sem variação de tamanho
    #[serde(default)]
    pub sizes: Vec<String>,

    /// Cores disponíveis; vazio = produto sem variação de cor
    #[serde(default)]
    pub colors: Vec<String>,

    /// Unidades em estoque
    #[serde(default)]
    pub stock: i64,

    #[serde(default)]
    pub featured: bool,

    pub created_at: i64,

    pub updated_at: i64,
}

impl Product {
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }

    pub fn main_image(&self) -> Option<String> {
        self.images.first().cloned()
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub stock: Option<i64>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

/// Query string de GET /api/products
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub featured: Option<bool>,
    pub sort: Option<ProductSort>,
    pub page: Option<u64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub stock: i64,
    pub in_stock: bool,
    pub featured: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            id: p.id_hex(),
            in_stock: p.in_stock(),
            name: p.name,
            description: p.description,
            price: p.price,
            category: p.category,
            images: p.images,
            sizes: p.sizes,
            colors: p.colors,
            stock: p.stock,
            featured: p.featured,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<ProductResponse>,
    pub total: u64,
    pub page: u64,
    pub pages: u64,
}
