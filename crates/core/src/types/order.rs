//! Purchase orders reported back to the recommendation service.

use serde::{Deserialize, Serialize};

/// An order the host app reports after checkout so the service can
/// grow the user's owned-product history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Client-assigned order identifier.
    pub external_order_id: String,
    /// Purchased items.
    pub items: Vec<OrderItem>,
    /// External user id, stamped by the SDK before submission.
    pub external_user_id: Option<String>,
    /// Store region, stamped by the SDK when the region lookup
    /// succeeds.
    pub region: Option<String>,
}

impl Order {
    /// Build an order for the given items; user id and region are
    /// stamped by the SDK at submission time.
    #[must_use]
    pub fn new(external_order_id: impl Into<String>, items: Vec<OrderItem>) -> Self {
        Self {
            external_order_id: external_order_id.into(),
            items,
            external_user_id: None,
            region: None,
        }
    }
}

/// A single purchased item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Client-assigned product identifier.
    pub external_product_id: String,
    /// Purchased size label.
    pub size: Option<String>,
    /// Unit price in the store currency, as reported by checkout.
    pub unit_price: Option<f64>,
    pub currency: Option<String>,
    pub quantity: u32,
    /// Product page URL, when the host app has one.
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_is_unstamped() {
        let order = Order::new(
            "order-1",
            vec![OrderItem {
                external_product_id: "sku-1".to_string(),
                size: Some("M".to_string()),
                unit_price: Some(35.0),
                currency: Some("USD".to_string()),
                quantity: 1,
                url: None,
            }],
        );
        assert!(order.external_user_id.is_none());
        assert!(order.region.is_none());
        assert_eq!(order.items.len(), 1);
    }
}
