// ==================== ORDERS / CHECKOUT ====================
// Checkout transforma o carrinho em um snapshot imutável. O estoque é
// reservado produto a produto com update condicional (stock >= quantidade);
// se qualquer linha falhar, as reservas já feitas são devolvidas.

use crate::{
    config::Config,
    database::{MongoDB, ORDERS, PRODUCTS},
    models::{
        compute_totals, CartItem, CreateOrderRequest, Order, OrderItem, OrderStatus, Product,
    },
    services::{auth_service::Claims, cart_service},
    utils::{error::AppError, validation::parse_object_id},
};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ReturnDocument;

pub const DEFAULT_PAYMENT_METHOD: &str = "cash_on_delivery";

/// Linha com id corrompido recebe o mesmo tratamento de produto removido
pub fn line_product_id(line: &CartItem) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(&line.product_id)
        .map_err(|_| AppError::Conflict(format!("{} is no longer available", line.name)))
}

/// Decrements stock for one cart line, only if enough units are left.
/// Returns the product as it is after the decrement.
async fn reserve_line(db: &MongoDB, line: &CartItem) -> Result<(ObjectId, Product), AppError> {
    let id = line_product_id(line)?;
    let products = db.collection::<Product>(PRODUCTS);

    let reserved = products
        .find_one_and_update(
            doc! { "_id": id, "stock": { "$gte": line.quantity } },
            doc! { "$inc": { "stock": -line.quantity } },
        )
        .return_document(ReturnDocument::After)
        .await?;

    match reserved {
        Some(product) => Ok((id, product)),
        None => match products.find_one(doc! { "_id": id }).await? {
            Some(product) => Err(AppError::Conflict(format!(
                "Not enough stock for {} (available: {}, requested: {})",
                product.name,
                product.stock.max(0),
                line.quantity
            ))),
            None => Err(AppError::Conflict(format!("{} is no longer available", line.name))),
        },
    }
}

/// Devolve unidades ao estoque; falhas são logadas e não interrompem o resto
async fn restore_stock(db: &MongoDB, lines: &[(ObjectId, i64)]) {
    let products = db.collection::<Document>(PRODUCTS);
    for (id, quantity) in lines {
        if let Err(e) = products
            .update_one(doc! { "_id": id }, doc! { "$inc": { "stock": quantity } })
            .await
        {
            log::error!("❌ Failed to restore {} units of {}: {}", quantity, id.to_hex(), e);
        }
    }
}

fn order_lines(order: &Order) -> Vec<(ObjectId, i64)> {
    order
        .items
        .iter()
        .filter_map(|item| {
            ObjectId::parse_str(&item.product_id)
                .ok()
                .map(|id| (id, item.quantity))
        })
        .collect()
}

pub fn snapshot_item(line: &CartItem, product: &Product) -> OrderItem {
    OrderItem {
        product_id: line.product_id.clone(),
        name: product.name.clone(),
        price: product.price,
        image: line.image.clone().or_else(|| product.main_image()),
        size: line.size.clone(),
        color: line.color.clone(),
        quantity: line.quantity,
    }
}

pub async fn create_order(
    db: &MongoDB,
    config: &Config,
    user_id: &str,
    request: &CreateOrderRequest,
) -> Result<Order, AppError> {
    let shipping = request.shipping.validated()?;
    let payment_method = request
        .payment_method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_PAYMENT_METHOD)
        .to_string();

    let cart = cart_service::get_cart(db, user_id).await?;
    if cart.items.is_empty() {
        return Err(AppError::Validation("Cart is empty".into()));
    }

    let mut reserved: Vec<(ObjectId, i64)> = Vec::with_capacity(cart.items.len());
    let mut items: Vec<OrderItem> = Vec::with_capacity(cart.items.len());

    for line in &cart.items {
        match reserve_line(db, line).await {
            Ok((id, product)) => {
                reserved.push((id, line.quantity));
                items.push(snapshot_item(line, &product));
            }
            Err(e) => {
                log::warn!("⚠️ Checkout aborted for user {}: {}", user_id, e);
                restore_stock(db, &reserved).await;
                return Err(e);
            }
        }
    }

    let totals = compute_totals(&items, config.free_shipping_threshold, config.shipping_flat_rate);
    let now = chrono::Utc::now().timestamp();

    let mut order = Order {
        id: None,
        user_id: user_id.to_string(),
        items,
        shipping,
        payment_method,
        subtotal: totals.subtotal,
        shipping_cost: totals.shipping_cost,
        total: totals.total,
        status: OrderStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    match db.collection::<Order>(ORDERS).insert_one(&order).await {
        Ok(result) => order.id = result.inserted_id.as_object_id(),
        Err(e) => {
            restore_stock(db, &reserved).await;
            return Err(AppError::Database(e));
        }
    }

    cart_service::clear_cart(db, user_id).await?;

    log::info!(
        "✅ Order {} created for user {} ({} items, total {:.2})",
        order.id.map(|id| id.to_hex()).unwrap_or_default(),
        user_id,
        order.items.len(),
        order.total
    );

    Ok(order)
}

pub async fn list_user_orders(db: &MongoDB, user_id: &str) -> Result<Vec<Order>, AppError> {
    Ok(db
        .collection::<Order>(ORDERS)
        .find(doc! { "user_id": user_id })
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?)
}

pub async fn list_all_orders(db: &MongoDB, status: Option<OrderStatus>) -> Result<Vec<Order>, AppError> {
    let filter = match status {
        Some(status) => doc! { "status": status.as_str() },
        None => doc! {},
    };

    Ok(db
        .collection::<Order>(ORDERS)
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?)
}

/// Owners see their orders, admins see all; everyone else gets 404
pub async fn get_order(db: &MongoDB, claims: &Claims, order_id: &str) -> Result<Order, AppError> {
    let id = parse_object_id(order_id, "order")?;

    let order = db
        .collection::<Order>(ORDERS)
        .find_one(doc! { "_id": id })
        .await?
        .filter(|o| o.user_id == claims.sub || claims.is_admin())
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    Ok(order)
}

pub fn check_transition(from: OrderStatus, next: OrderStatus) -> Result<(), AppError> {
    if from.is_terminal() {
        return Err(AppError::Validation(format!(
            "Order is already {} and can no longer change status",
            from
        )));
    }
    if !from.can_transition_to(next) {
        return Err(AppError::Validation(format!(
            "Cannot change order status from {} to {}",
            from, next
        )));
    }
    Ok(())
}

/// Moves an order to `next` if the transition is legal, guarding against a
/// concurrent change with the current status in the filter.
async fn transition(
    db: &MongoDB,
    order: &Order,
    next: OrderStatus,
) -> Result<Order, AppError> {
    check_transition(order.status, next)?;

    let id = order.id.ok_or_else(|| AppError::Internal("Order without _id".into()))?;
    let now = chrono::Utc::now().timestamp();

    let result = db
        .collection::<Order>(ORDERS)
        .update_one(
            doc! { "_id": id, "status": order.status.as_str() },
            doc! { "$set": { "status": next.as_str(), "updated_at": now } },
        )
        .await?;

    if result.modified_count == 0 {
        return Err(AppError::Conflict("Order was modified by another request".into()));
    }

    if next == OrderStatus::Cancelled {
        restore_stock(db, &order_lines(order)).await;
    }

    log::info!("📦 Order {} status: {} -> {}", id.to_hex(), order.status, next);

    Ok(Order { status: next, updated_at: now, ..order.clone() })
}

pub async fn cancel_order(db: &MongoDB, user_id: &str, order_id: &str) -> Result<Order, AppError> {
    let id = parse_object_id(order_id, "order")?;

    let order = db
        .collection::<Order>(ORDERS)
        .find_one(doc! { "_id": id, "user_id": user_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    if order.status != OrderStatus::Pending {
        return Err(AppError::Validation(format!(
            "Only pending orders can be cancelled (current status: {})",
            order.status
        )));
    }

    transition(db, &order, OrderStatus::Cancelled).await
}

pub async fn update_status(db: &MongoDB, order_id: &str, next: OrderStatus) -> Result<Order, AppError> {
    let id = parse_object_id(order_id, "order")?;

    let order = db
        .collection::<Order>(ORDERS)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    transition(db, &order, next).await
}
