use serde::{Deserialize, Serialize};

use crate::utils::validation::round_cents;

/// Linha do carrinho: uma variante (produto + tamanho + cor) com quantidade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub image: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i64,
}

impl CartItem {
    /// Size and color compare case-insensitively, like variant resolution on add
    pub fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id
            && same_option(self.size.as_deref(), key.size.as_deref())
            && same_option(self.color.as_deref(), key.color.as_deref())
    }

    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// Identity of a cart line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineKey {
    pub product_id: String,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl LineKey {
    pub fn new(product_id: &str, size: Option<&str>, color: Option<&str>) -> Self {
        LineKey {
            product_id: product_id.trim().to_string(),
            size: normalize_option(size),
            color: normalize_option(color),
        }
    }
}

fn same_option(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    }
}

/// "" e "  " contam como "sem variação"
fn normalize_option(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

/// Carrinho do usuário (um documento por usuário na collection `carts`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub updated_at: i64,
}

/// Result of reconciling a requested line quantity against live stock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdjustment {
    pub quantity: i64,
    pub clamped: bool,
}

impl StockAdjustment {
    pub fn warning(&self) -> Option<String> {
        self.clamped
            .then(|| format!("Only {} items available in stock", self.quantity))
    }
}

pub fn clamp_to_stock(requested: i64, stock: i64) -> StockAdjustment {
    let available = stock.max(0);
    if requested > available {
        StockAdjustment { quantity: available, clamped: true }
    } else {
        StockAdjustment { quantity: requested, clamped: false }
    }
}

impl Cart {
    pub fn empty(user_id: &str) -> Self {
        Cart {
            user_id: user_id.to_string(),
            items: Vec::new(),
            updated_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn position(&self, key: &LineKey) -> Option<usize> {
        self.items.iter().position(|item| item.matches(key))
    }

    /// Adds `item.quantity` units of a variant. An existing line with the same
    /// (product_id, size, color) is incremented, otherwise the item is pushed
    /// as a new line. The resulting line quantity never exceeds `stock`.
    /// Callers reject stock <= 0 before merging.
    pub fn add_item(&mut self, item: CartItem, stock: i64) -> StockAdjustment {
        let key = LineKey {
            product_id: item.product_id.clone(),
            size: item.size.clone(),
            color: item.color.clone(),
        };

        let adjustment = match self.position(&key) {
            Some(idx) => {
                let line = &mut self.items[idx];
                let adjustment = clamp_to_stock(line.quantity.saturating_add(item.quantity), stock);
                line.quantity = adjustment.quantity;
                // Preço/nome/imagem acompanham o catálogo atual
                line.price = item.price;
                line.name = item.name;
                line.image = item.image;
                adjustment
            }
            None => {
                let adjustment = clamp_to_stock(item.quantity, stock);
                self.items.push(CartItem { quantity: adjustment.quantity, ..item });
                adjustment
            }
        };

        self.items.retain(|line| line.quantity > 0);
        adjustment
    }

    /// Sets the quantity of an existing line. Zero removes it.
    /// Returns None when the line does not exist.
    pub fn set_quantity(&mut self, key: &LineKey, quantity: i64, stock: i64) -> Option<StockAdjustment> {
        let idx = self.position(key)?;

        if quantity <= 0 {
            self.items.remove(idx);
            return Some(StockAdjustment { quantity: 0, clamped: false });
        }

        let adjustment = clamp_to_stock(quantity, stock);
        if adjustment.quantity == 0 {
            self.items.remove(idx);
        } else {
            self.items[idx].quantity = adjustment.quantity;
        }
        Some(adjustment)
    }

    pub fn remove_item(&mut self, key: &LineKey) -> bool {
        match self.position(key) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn total_items(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn subtotal(&self) -> f64 {
        round_cents(self.items.iter().map(CartItem::line_total).sum())
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddToCartRequest {
    pub product_id: String,
    pub size: Option<String>,
    pub color: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateCartItemRequest {
    pub product_id: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RemoveCartItemRequest {
    pub product_id: String,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub total_items: i64,
    pub subtotal: f64,
    pub updated_at: i64,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        CartResponse {
            total_items: cart.total_items(),
            subtotal: cart.subtotal(),
            updated_at: cart.updated_at,
            items: cart.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: &str, size: Option<&str>, color: Option<&str>, quantity: i64) -> CartItem {
        CartItem {
            product_id: product_id.into(),
            name: format!("Product {}", product_id),
            price: 25.0,
            image: None,
            size: size.map(String::from),
            color: color.map(String::from),
            quantity,
        }
    }

    #[test]
    fn test_new_product_creates_line() {
        let mut cart = Cart::empty("u1");
        let adj = cart.add_item(item("p1", Some("M"), Some("red"), 2), 10);

        assert_eq!(adj, StockAdjustment { quantity: 2, clamped: false });
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
    }

    #[test]
    fn test_same_variant_increments_quantity() {
        let mut cart = Cart::empty("u1");
        cart.add_item(item("p1", Some("M"), Some("red"), 2), 10);
        let adj = cart.add_item(item("p1", Some("M"), Some("red"), 3), 10);

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
        assert!(!adj.clamped);
    }

    #[test]
    fn test_different_size_or_color_is_a_new_line() {
        let mut cart = Cart::empty("u1");
        cart.add_item(item("p1", Some("M"), Some("red"), 1), 10);
        cart.add_item(item("p1", Some("L"), Some("red"), 1), 10);
        cart.add_item(item("p1", Some("M"), Some("blue"), 1), 10);
        cart.add_item(item("p1", None, None, 1), 10);

        assert_eq!(cart.items.len(), 4);
        assert_eq!(cart.total_items(), 4);
    }

    #[test]
    fn test_merge_is_clamped_to_stock() {
        let mut cart = Cart::empty("u1");
        cart.add_item(item("p1", None, None, 3), 4);
        let adj = cart.add_item(item("p1", None, None, 3), 4);

        assert_eq!(adj, StockAdjustment { quantity: 4, clamped: true });
        assert_eq!(cart.items[0].quantity, 4);
        assert_eq!(adj.warning().unwrap(), "Only 4 items available in stock");
    }

    #[test]
    fn test_merge_refreshes_price_from_catalog() {
        let mut cart = Cart::empty("u1");
        cart.add_item(item("p1", None, None, 1), 10);
        let mut repriced = item("p1", None, None, 1);
        repriced.price = 30.0;
        cart.add_item(repriced, 10);

        assert_eq!(cart.items[0].price, 30.0);
        assert_eq!(cart.subtotal(), 60.0);
    }

    #[test]
    fn test_set_quantity_clamps_and_removes() {
        let mut cart = Cart::empty("u1");
        cart.add_item(item("p1", Some("S"), None, 1), 10);
        let key = LineKey::new("p1", Some("S"), None);

        let adj = cart.set_quantity(&key, 50, 7).unwrap();
        assert!(adj.clamped);
        assert_eq!(cart.items[0].quantity, 7);

        let adj = cart.set_quantity(&key, 0, 7).unwrap();
        assert_eq!(adj.quantity, 0);
        assert!(cart.items.is_empty());
    }

    #[test]
    fn test_huge_merge_is_clamped_without_overflow() {
        let mut cart = Cart::empty("u1");
        cart.add_item(item("p1", None, None, 1), 10);
        let adj = cart.add_item(item("p1", None, None, i64::MAX), 10);

        assert_eq!(adj, StockAdjustment { quantity: 10, clamped: true });
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 10);
    }

    #[test]
    fn test_line_lookup_ignores_option_case() {
        let mut cart = Cart::empty("u1");
        cart.add_item(item("p1", Some("M"), Some("Red"), 1), 10);

        let key = LineKey::new("p1", Some("m"), Some("red"));
        assert_eq!(cart.set_quantity(&key, 3, 10).unwrap().quantity, 3);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.items[0].size.as_deref(), Some("M"));

        cart.add_item(item("p1", Some("m"), Some("RED"), 1), 10);
        assert_eq!(cart.items.len(), 1);
        assert!(cart.remove_item(&key));
        assert!(cart.items.is_empty());
    }

    #[test]
    fn test_set_quantity_unknown_line() {
        let mut cart = Cart::empty("u1");
        cart.add_item(item("p1", Some("S"), None, 1), 10);
        assert!(cart.set_quantity(&LineKey::new("p1", Some("M"), None), 2, 10).is_none());
    }

    #[test]
    fn test_set_quantity_with_stock_gone_drops_line() {
        let mut cart = Cart::empty("u1");
        cart.add_item(item("p1", None, None, 2), 10);
        let adj = cart.set_quantity(&LineKey::new("p1", None, None), 2, 0).unwrap();

        assert!(adj.clamped);
        assert!(cart.items.is_empty());
    }

    #[test]
    fn test_line_key_treats_blank_as_none() {
        let key = LineKey::new(" p1 ", Some("  "), Some(""));
        assert_eq!(key, LineKey::new("p1", None, None));
    }

    #[test]
    fn test_remove_item_and_subtotal() {
        let mut cart = Cart::empty("u1");
        cart.add_item(item("p1", None, None, 2), 10);
        cart.add_item(item("p2", None, None, 1), 10);
        assert_eq!(cart.subtotal(), 75.0);

        assert!(cart.remove_item(&LineKey::new("p1", None, None)));
        assert!(!cart.remove_item(&LineKey::new("p1", None, None)));
        assert_eq!(cart.total_items(), 1);
        assert_eq!(cart.subtotal(), 25.0);
    }

    #[test]
    fn test_add_to_cart_request_defaults_quantity() {
        let req: AddToCartRequest = serde_json::from_value(serde_json::json!({
            "product_id": "p1"
        }))
        .unwrap();
        assert_eq!(req.quantity, 1);
    }
}
