use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::{error::AppError, validation::{require_non_empty, round_cents}};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// pending -> processing -> shipped -> delivered;
    /// pending|processing -> cancelled
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Processing, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| AppError::Validation(format!("Invalid order status: {}", s)))
    }
}

/// Snapshot of a cart line at checkout time
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub image: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Todos os campos são obrigatórios; retorna a versão com trim
    pub fn validated(&self) -> Result<ShippingAddress, AppError> {
        Ok(ShippingAddress {
            full_name: require_non_empty("Full name", &self.full_name)?,
            address: require_non_empty("Address", &self.address)?,
            city: require_non_empty("City", &self.city)?,
            postal_code: require_non_empty("Postal code", &self.postal_code)?,
            country: require_non_empty("Country", &self.country)?,
            phone: require_non_empty("Phone", &self.phone)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub shipping: ShippingAddress,
    pub payment_method: String,
    pub subtotal: f64,
    pub shipping_cost: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub shipping_cost: f64,
    pub total: f64,
}

/// Frete grátis a partir de `free_shipping_threshold`, senão taxa fixa
pub fn compute_totals(items: &[OrderItem], free_shipping_threshold: f64, flat_rate: f64) -> OrderTotals {
    let subtotal = round_cents(items.iter().map(|i| i.price * i.quantity as f64).sum());
    let shipping_cost = if items.is_empty() || subtotal >= free_shipping_threshold {
        0.0
    } else {
        round_cents(flat_rate)
    };

    OrderTotals {
        subtotal,
        shipping_cost,
        total: round_cents(subtotal + shipping_cost),
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateOrderRequest {
    pub shipping: ShippingAddress,
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub shipping: ShippingAddress,
    pub payment_method: String,
    pub subtotal: f64,
    pub shipping_cost: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        OrderResponse {
            id: o.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: o.user_id,
            items: o.items,
            shipping: o.shipping,
            payment_method: o.payment_method,
            subtotal: o.subtotal,
            shipping_cost: o.shipping_cost,
            total: o.total,
            status: o.status,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: f64, quantity: i64) -> OrderItem {
        OrderItem {
            product_id: "p".into(),
            name: "P".into(),
            price,
            image: None,
            size: None,
            color: None,
            quantity,
        }
    }

    #[test]
    fn test_status_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Cancelled));

        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Processing));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for from in OrderStatus::ALL.into_iter().filter(OrderStatus::is_terminal) {
            for to in OrderStatus::ALL {
                assert!(!from.can_transition_to(to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("lost".parse::<OrderStatus>().is_err());
        assert_eq!(serde_json::to_value(OrderStatus::Cancelled).unwrap(), "cancelled");
    }

    #[test]
    fn test_totals_below_threshold_pay_shipping() {
        let totals = compute_totals(&[line(19.99, 2), line(5.5, 1)], 100.0, 10.0);
        assert_eq!(totals.subtotal, 45.48);
        assert_eq!(totals.shipping_cost, 10.0);
        assert_eq!(totals.total, 55.48);
    }

    #[test]
    fn test_totals_free_shipping_at_threshold() {
        let totals = compute_totals(&[line(50.0, 2)], 100.0, 10.0);
        assert_eq!(totals.shipping_cost, 0.0);
        assert_eq!(totals.total, 100.0);
    }

    #[test]
    fn test_shipping_address_validation() {
        let address = ShippingAddress {
            full_name: " Ana Souza ".into(),
            address: "Rua A, 10".into(),
            city: "Recife".into(),
            postal_code: "50000-000".into(),
            country: "BR".into(),
            phone: "+55 81 99999-0000".into(),
        };
        assert_eq!(address.validated().unwrap().full_name, "Ana Souza");

        let missing_city = ShippingAddress { city: "  ".into(), ..address };
        let err = missing_city.validated().unwrap_err();
        assert_eq!(err.to_string(), "City is required");
    }
}
