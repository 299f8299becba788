use crate::{
    database::{MongoDB, ORDERS, PRODUCTS, USERS},
    models::{Order, OrderStatus, Product, ProductResponse, User, UserInfo},
    utils::{error::AppError, validation::round_cents},
};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use serde::Serialize;
use std::collections::BTreeMap;

pub const LOW_STOCK_THRESHOLD: i64 = 5;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StoreStats {
    pub users: u64,
    pub products: u64,
    pub orders: u64,
    pub orders_by_status: BTreeMap<String, u64>,
    pub revenue: f64,
    pub low_stock: Vec<ProductResponse>,
}

pub async fn list_users(db: &MongoDB) -> Result<Vec<UserInfo>, AppError> {
    let users: Vec<User> = db
        .collection::<User>(USERS)
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .await?
        .try_collect()
        .await?;

    Ok(users.into_iter().map(UserInfo::from).collect())
}

/// Pedidos cancelados não entram na receita
pub fn summarize_orders(orders: &[Order]) -> (BTreeMap<String, u64>, f64) {
    let mut by_status: BTreeMap<String, u64> = OrderStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    let mut revenue = 0.0;

    for order in orders {
        *by_status.entry(order.status.as_str().to_string()).or_insert(0) += 1;
        if order.status != OrderStatus::Cancelled {
            revenue += order.total;
        }
    }

    (by_status, round_cents(revenue))
}

pub async fn store_stats(db: &MongoDB) -> Result<StoreStats, AppError> {
    let users = db.collection::<Document>(USERS).count_documents(doc! {}).await?;
    let products = db.collection::<Document>(PRODUCTS).count_documents(doc! {}).await?;

    let orders: Vec<Order> = db
        .collection::<Order>(ORDERS)
        .find(doc! {})
        .await?
        .try_collect()
        .await?;
    let (orders_by_status, revenue) = summarize_orders(&orders);

    let low_stock: Vec<Product> = db
        .collection::<Product>(PRODUCTS)
        .find(doc! { "stock": { "$lte": LOW_STOCK_THRESHOLD } })
        .sort(doc! { "stock": 1 })
        .limit(20)
        .await?
        .try_collect()
        .await?;

    Ok(StoreStats {
        users,
        products,
        orders: orders.len() as u64,
        orders_by_status,
        revenue,
        low_stock: low_stock.into_iter().map(ProductResponse::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShippingAddress;

    fn order(status: OrderStatus, total: f64) -> Order {
        Order {
            id: None,
            user_id: "u".into(),
            items: vec![],
            shipping: ShippingAddress {
                full_name: "A".into(),
                address: "B".into(),
                city: "C".into(),
                postal_code: "D".into(),
                country: "E".into(),
                phone: "F".into(),
            },
            payment_method: "cash_on_delivery".into(),
            subtotal: total,
            shipping_cost: 0.0,
            total,
            status,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_revenue_excludes_cancelled_orders() {
        let orders = vec![
            order(OrderStatus::Pending, 10.10),
            order(OrderStatus::Delivered, 20.20),
            order(OrderStatus::Cancelled, 99.0),
        ];
        let (by_status, revenue) = summarize_orders(&orders);

        assert_eq!(revenue, 30.3);
        assert_eq!(by_status["pending"], 1);
        assert_eq!(by_status["delivered"], 1);
        assert_eq!(by_status["cancelled"], 1);
        assert_eq!(by_status["shipped"], 0);
    }
}
