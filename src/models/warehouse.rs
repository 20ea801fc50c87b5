use std::collections::BTreeSet;

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::policy::ChargePolicy;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Custom warehouses serve an explicit postal-code list on a schedule; global
/// ones are 24x7 fallbacks for any postal code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseKind {
    Custom,
    Global,
}

impl WarehouseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarehouseKind::Custom => "custom",
            WarehouseKind::Global => "global",
        }
    }
}

/// Daily window as zero-padded 24-hour "HH:MM" strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperatingHours {
    pub start: String,
    pub end: String,
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            start: "00:00".to_string(),
            end: "23:59".to_string(),
        }
    }
}

impl OperatingHours {
    pub fn validate(&self) -> Result<(), AppError> {
        for value in [&self.start, &self.end] {
            if !is_valid_hhmm(value) {
                return Err(AppError::InvalidWarehouse(format!(
                    "operating hour {value:?} is not a zero-padded HH:MM time"
                )));
            }
        }

        if self.start > self.end {
            return Err(AppError::InvalidWarehouse(format!(
                "operating hours start {} is after end {}",
                self.start, self.end
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default = "enabled")]
    pub is_delivery_enabled: bool,
    #[serde(default)]
    pub disabled_message: Option<String>,
    #[serde(default)]
    pub is_24x7: bool,
    #[serde(default)]
    pub service_postal_codes: BTreeSet<String>,
    /// Empty means every day.
    #[serde(default)]
    pub operating_days: Vec<Weekday>,
    #[serde(default)]
    pub operating_hours: OperatingHours,
    pub max_delivery_radius_km: f64,
    #[serde(default)]
    pub free_delivery_radius_km: f64,
    /// Overrides the active policy for this warehouse's kind.
    #[serde(default)]
    pub charge_policy: Option<ChargePolicy>,
    pub updated_at: DateTime<Utc>,
}

fn enabled() -> bool {
    true
}

impl Warehouse {
    pub fn kind(&self) -> WarehouseKind {
        if self.is_24x7 {
            WarehouseKind::Global
        } else {
            WarehouseKind::Custom
        }
    }

    /// Global warehouses serve every postal code. Custom ones fail closed: an
    /// empty service list serves nothing.
    pub fn serves_postal_code(&self, postal_code: &str) -> bool {
        self.is_24x7 || self.service_postal_codes.contains(postal_code)
    }

    pub fn is_routable(&self) -> bool {
        self.is_delivery_enabled && self.location.is_some()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidWarehouse("name cannot be empty".to_string()));
        }

        if let Some(location) = &self.location {
            if !location.is_valid() {
                return Err(AppError::InvalidCoordinates(format!(
                    "warehouse location ({}, {}) is out of range",
                    location.lat, location.lng
                )));
            }
        }

        for radius in [self.max_delivery_radius_km, self.free_delivery_radius_km] {
            if !radius.is_finite() || radius < 0.0 {
                return Err(AppError::InvalidWarehouse(format!(
                    "delivery radius {radius} must be a non-negative number"
                )));
            }
        }

        for code in &self.service_postal_codes {
            validate_postal_code(code)?;
        }

        self.operating_hours.validate()?;

        if let Some(policy) = &self.charge_policy {
            policy.validate()?;
        }

        Ok(())
    }
}

pub fn validate_postal_code(code: &str) -> Result<(), AppError> {
    if code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AppError::InvalidPostalCode(format!(
            "{code:?} is not a 6-digit postal code"
        )))
    }
}

fn is_valid_hhmm(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }

    let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
    if !digits.iter().all(u8::is_ascii_digit) {
        return false;
    }

    let hour = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
    let minute = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
    hour < 24 && minute < 60
}
