use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::delivery::DeliveryQuote;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

pub fn subtotal(items: &[CartItem]) -> f64 {
    items.iter().map(CartItem::line_total).sum()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseGroupQuote {
    pub warehouse_id: Uuid,
    pub item_count: usize,
    pub subtotal: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<DeliveryQuote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<GroupError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixedCartQuote {
    pub groups: BTreeMap<Uuid, WarehouseGroupQuote>,
    pub cart_total: f64,
    /// Sum over groups that quoted successfully.
    pub total_delivery_charge: f64,
    pub quoted_groups: usize,
    pub errored_groups: usize,
    pub has_errors: bool,
}

#[cfg(test)]
mod tests {
    use super::{subtotal, CartItem};

    #[test]
    fn subtotal_sums_line_totals() {
        let items = vec![
            CartItem {
                product_id: "rice-5kg".to_string(),
                quantity: 2,
                unit_price: 120.0,
            },
            CartItem {
                product_id: "ghee-1l".to_string(),
                quantity: 1,
                unit_price: 55.5,
            },
        ];

        assert!((subtotal(&items) - 295.5).abs() < 1e-9);
        assert_eq!(subtotal(&[]), 0.0);
    }
}
