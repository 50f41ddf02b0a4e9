//! Order endpoints.
//!
//! Placing an order does not clear the cart: the engine owns its snapshot,
//! and the caller clears it once the order has been confirmed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sandpiper_core::{OrderId, OrderStatus, PaymentStatus, ProductId, VariantId};

use crate::cart::LineItem;

use super::{ApiClient, ApiError};

/// Shipping destination submitted with an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// One order line, as submitted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
}

/// Order submission payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub items: Vec<OrderItemInput>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderInput {
    /// Build an order from the current cart contents.
    #[must_use]
    pub fn from_cart(
        items: &[LineItem],
        shipping_address: ShippingAddress,
        payment_method: impl Into<String>,
    ) -> Self {
        Self {
            items: items
                .iter()
                .map(|item| OrderItemInput {
                    product_id: item.product_id.clone(),
                    variant_id: item.variant_id.clone(),
                    quantity: item.quantity,
                })
                .collect(),
            shipping_address,
            payment_method: payment_method.into(),
            notes: None,
        }
    }
}

/// A placed order, as reported by the orders endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ApiClient {
    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects the
    /// order.
    #[instrument(skip(self, input), fields(lines = input.items.len()))]
    pub async fn place_order(&self, input: &OrderInput) -> Result<Order, ApiError> {
        self.post("/orders", input).await
    }

    /// Fetch the authenticated user's order history.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get("/orders").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::ProductSnapshot;
    use sandpiper_core::Price;

    fn dec(value: &str) -> Decimal {
        value.parse().expect("decimal literal")
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ada Lovelace".to_string(),
            phone: "5550100".to_string(),
            address_line1: "1 Analytical Way".to_string(),
            address_line2: None,
            city: "London".to_string(),
            state: "LDN".to_string(),
            postal_code: "E1 6AN".to_string(),
            country: "GB".to_string(),
        }
    }

    #[test]
    fn test_from_cart_maps_identity_and_quantity() {
        let items = vec![LineItem {
            product_id: ProductId::new("p1"),
            variant_id: Some(VariantId::new("v2")),
            product: ProductSnapshot {
                id: ProductId::new("p1"),
                name: "Lamp".to_string(),
                price: Price::usd(dec("10")),
                image: None,
                stock: 4,
            },
            quantity: 3,
        }];

        let input = OrderInput::from_cart(&items, address(), "card");

        assert_eq!(input.items.len(), 1);
        assert_eq!(input.items[0].product_id, ProductId::new("p1"));
        assert_eq!(input.items[0].variant_id, Some(VariantId::new("v2")));
        assert_eq!(input.items[0].quantity, 3);
        assert_eq!(input.payment_method, "card");
    }

    #[test]
    fn test_order_input_serializes_camel_case() {
        let input = OrderInput::from_cart(&[], address(), "cod");
        let value = serde_json::to_value(&input).expect("serialize");
        assert!(value.get("shippingAddress").is_some());
        assert!(value.get("paymentMethod").is_some());
        assert!(value.get("notes").is_none());
    }
}
