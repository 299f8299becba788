use crate::{
    database::{is_duplicate_key, MongoDB, CATEGORIES, PRODUCTS},
    models::{Category, CategoryResponse, CreateCategoryRequest},
    utils::{
        error::AppError,
        validation::{parse_object_id, require_non_empty, slugify},
    },
};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};

pub async fn list_categories(db: &MongoDB) -> Result<Vec<CategoryResponse>, AppError> {
    let categories: Vec<Category> = db
        .collection::<Category>(CATEGORIES)
        .find(doc! {})
        .sort(doc! { "name": 1 })
        .await?
        .try_collect()
        .await?;

    let products = db.collection::<Document>(PRODUCTS);
    let mut out = Vec::with_capacity(categories.len());

    for category in categories {
        let count = products.count_documents(doc! { "category": &category.slug }).await?;
        out.push(CategoryResponse::new(category, count));
    }

    Ok(out)
}

pub fn new_category(request: &CreateCategoryRequest, now: i64) -> Result<Category, AppError> {
    let name = require_non_empty("Name", &request.name)?;
    let slug = slugify(&name);
    if slug.is_empty() {
        return Err(AppError::Validation("Name must contain letters or digits".into()));
    }

    Ok(Category {
        id: None,
        name,
        slug,
        description: request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from),
        image: request
            .image
            .as_deref()
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .map(String::from),
        created_at: now,
    })
}

pub async fn create_category(db: &MongoDB, request: &CreateCategoryRequest) -> Result<Category, AppError> {
    let mut category = new_category(request, chrono::Utc::now().timestamp())?;

    let result = db
        .collection::<Category>(CATEGORIES)
        .insert_one(&category)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Conflict(format!("Category '{}' already exists", category.slug))
            } else {
                AppError::Database(e)
            }
        })?;

    category.id = result.inserted_id.as_object_id();
    log::info!("✅ Category created: {}", category.slug);
    Ok(category)
}

pub async fn delete_category(db: &MongoDB, category_id: &str) -> Result<(), AppError> {
    let id = parse_object_id(category_id, "category")?;
    let collection = db.collection::<Category>(CATEGORIES);

    let category = collection
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;

    let in_use = db
        .collection::<Document>(PRODUCTS)
        .count_documents(doc! { "category": &category.slug })
        .await?;

    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "Category '{}' still has {} products",
            category.slug, in_use
        )));
    }

    collection.delete_one(doc! { "_id": id }).await?;
    log::info!("🗑️ Category deleted: {}", category.slug);
    Ok(())
}
