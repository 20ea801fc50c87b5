use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Prepaid,
    Cod,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMethod {
    Routed,
    HaversineFallback,
}

impl DistanceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMethod::Routed => "routed",
            DistanceMethod::HaversineFallback => "haversine_fallback",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceResult {
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub method: DistanceMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_route: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EligibilityReason {
    #[serde(rename = "disabled")]
    Disabled,
    #[serde(rename = "open_24x7")]
    Open24x7,
    #[serde(rename = "closed_today")]
    ClosedToday,
    #[serde(rename = "before_opening")]
    BeforeOpening,
    #[serde(rename = "after_closing")]
    AfterClosing,
    #[serde(rename = "open_now")]
    OpenNow,
}

/// Whether a warehouse is taking orders at a given instant, and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EligibilityResult {
    pub is_delivering: bool,
    pub reason: EligibilityReason,
    pub human_message: String,
    pub short_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_open_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_open_time: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FreeDeliveryReason {
    OrderValue,
    WithinFreeRadius,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChargeBreakdown {
    pub delivery_charge: f64,
    pub is_free_delivery: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_reason: Option<FreeDeliveryReason>,
    pub base_charge: f64,
    pub chargeable_km: f64,
    pub distance_charge: f64,
    /// Base plus distance charge after min/max clamping, before any surcharge.
    pub clamped_charge: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cod_surcharge: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentTier {
    Explicit,
    Cart,
    Auto,
}

impl FulfillmentTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentTier::Explicit => "explicit",
            FulfillmentTier::Cart => "cart",
            FulfillmentTier::Auto => "auto",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryQuote {
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub tier: FulfillmentTier,
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub method: DistanceMethod,
    pub charge: f64,
    pub is_free_delivery: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cod_surcharge: Option<f64>,
    pub is_delivering: bool,
    pub availability: EligibilityResult,
    pub breakdown: ChargeBreakdown,
    pub message: String,
}
