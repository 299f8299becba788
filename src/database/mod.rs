use mongodb::{Client, Collection, Database};
use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use std::error::Error;

pub const USERS: &str = "users";
pub const PRODUCTS: &str = "products";
pub const CATEGORIES: &str = "categories";
pub const CARTS: &str = "carts";
pub const FAVORITES: &str = "favorites";
pub const ORDERS: &str = "orders";
pub const RESET_TOKENS: &str = "reset_tokens";

/// E11000: violação de índice único
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == 11000
    )
}

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

/// Nome do banco = último segmento do path da URI (sem query string)
pub fn database_name_from_uri(uri: &str) -> &str {
    let without_scheme = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);
    without_scheme
        .split_once('/')
        .map(|(_, path)| path.split('?').next().unwrap_or(""))
        .filter(|name| !name.is_empty())
        .unwrap_or("storefront")
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(database_name_from_uri(uri));

        // Test connection
        db.run_command(doc! { "ping": 1 }).await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    async fn create_index(
        &self,
        collection: &str,
        keys: Document,
        unique: bool,
    ) -> Result<(), Box<dyn Error>> {
        let label = format!("{}({})", collection, keys.keys().cloned().collect::<Vec<_>>().join(", "));
        let options = IndexOptions::builder().unique(unique).build();
        let index = IndexModel::builder().keys(keys).options(options).build();

        match self.collection::<Document>(collection).create_index(index).await {
            Ok(_) => log::info!("   ✅ Index created: {}{}", label, if unique { " [unique]" } else { "" }),
            Err(e) => log::debug!("   ℹ️  Index already exists: {} - {}", label, e),
        }
        Ok(())
    }

    /// Creates the indexes every collection relies on, including the
    /// uniqueness constraints of the data model
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        self.create_index(USERS, doc! { "email": 1 }, true).await?;
        self.create_index(USERS, doc! { "user_id": 1 }, true).await?;

        self.create_index(PRODUCTS, doc! { "category": 1 }, false).await?;
        self.create_index(PRODUCTS, doc! { "created_at": -1 }, false).await?;
        self.create_index(PRODUCTS, doc! { "name": "text", "description": "text" }, false).await?;

        self.create_index(CATEGORIES, doc! { "slug": 1 }, true).await?;

        self.create_index(CARTS, doc! { "user_id": 1 }, true).await?;

        self.create_index(FAVORITES, doc! { "user_id": 1, "product_id": 1 }, true).await?;

        self.create_index(ORDERS, doc! { "user_id": 1, "created_at": -1 }, false).await?;
        self.create_index(ORDERS, doc! { "status": 1 }, false).await?;

        self.create_index(RESET_TOKENS, doc! { "token": 1 }, true).await?;
        self.create_index(RESET_TOKENS, doc! { "expires_at": 1 }, false).await?;

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub async fn ping(&self) -> bool {
        self.db.run_command(doc! { "ping": 1 }).await.is_ok()
    }
}

/// Helpers para testes que precisam de um MongoDB real
#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::models::Product;

    pub async fn connect() -> MongoDB {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/storefront_test".to_string());
        MongoDB::new(&uri).await.expect("MongoDB must be running for ignored tests")
    }

    pub fn unique_user() -> String {
        format!("test-user-{}", uuid::Uuid::new_v4())
    }

    /// Insere um produto direto na collection, sem exigir categoria
    pub async fn insert_product(db: &MongoDB, name: &str, price: f64, stock: i64) -> Product {
        let mut product = Product {
            id: None,
            name: format!("{} {}", name, uuid::Uuid::new_v4().simple()),
            description: String::new(),
            price,
            category: "test".into(),
            images: vec![],
            sizes: vec![],
            colors: vec![],
            stock,
            featured: false,
            created_at: 0,
            updated_at: 0,
        };
        let result = db.collection::<Product>(PRODUCTS).insert_one(&product).await.unwrap();
        product.id = result.inserted_id.as_object_id();
        product
    }

    pub async fn stock_of(db: &MongoDB, product: &Product) -> i64 {
        db.collection::<Product>(PRODUCTS)
            .find_one(doc! { "_id": product.id.unwrap() })
            .await
            .unwrap()
            .map(|p| p.stock)
            .unwrap_or(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_name_from_uri() {
        assert_eq!(database_name_from_uri("mongodb://localhost:27017/shop"), "shop");
        assert_eq!(
            database_name_from_uri("mongodb+srv://u:p@cluster.example.net/shop?retryWrites=true"),
            "shop"
        );
        assert_eq!(database_name_from_uri("mongodb://localhost:27017"), "storefront");
        assert_eq!(database_name_from_uri("mongodb://localhost:27017/?w=majority"), "storefront");
    }

    #[actix_rt::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/storefront_test".to_string());
        let db = MongoDB::new(&uri).await;
        assert!(db.is_ok());
    }
}
