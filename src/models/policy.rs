use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::warehouse::WarehouseKind;

/// Pricing knobs for one warehouse kind. Amounts are in the store currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChargePolicy {
    pub free_delivery_min_amount: f64,
    pub base_charge: f64,
    pub min_charge: f64,
    pub max_charge: f64,
    pub per_km_charge: f64,
    #[serde(default)]
    pub cod_surcharge: Option<f64>,
}

impl Default for ChargePolicy {
    fn default() -> Self {
        Self {
            free_delivery_min_amount: 500.0,
            base_charge: 20.0,
            min_charge: 10.0,
            max_charge: 100.0,
            per_km_charge: 5.0,
            cod_surcharge: None,
        }
    }
}

impl ChargePolicy {
    /// Checked on write. Charge calculation assumes a policy that passed this.
    pub fn validate(&self) -> Result<(), AppError> {
        let amounts = [
            ("free_delivery_min_amount", self.free_delivery_min_amount),
            ("base_charge", self.base_charge),
            ("min_charge", self.min_charge),
            ("max_charge", self.max_charge),
            ("per_km_charge", self.per_km_charge),
            ("cod_surcharge", self.cod_surcharge.unwrap_or(0.0)),
        ];

        for (field, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::InvalidPolicy(format!(
                    "{field} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.min_charge > self.max_charge {
            return Err(AppError::InvalidPolicy(format!(
                "min_charge {} exceeds max_charge {}",
                self.min_charge, self.max_charge
            )));
        }

        if self.base_charge < self.min_charge {
            return Err(AppError::InvalidPolicy(format!(
                "base_charge {} is below min_charge {}",
                self.base_charge, self.min_charge
            )));
        }

        Ok(())
    }
}

/// The single active policy record for a warehouse kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryPolicy {
    pub id: Uuid,
    pub kind: WarehouseKind,
    #[serde(flatten)]
    pub charge: ChargePolicy,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}
