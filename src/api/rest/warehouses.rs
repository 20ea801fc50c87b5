use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc, Weekday};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::parse_timezone;
use crate::engine::schedule::is_currently_open;
use crate::error::AppError;
use crate::models::delivery::EligibilityResult;
use crate::models::policy::ChargePolicy;
use crate::models::warehouse::{GeoPoint, OperatingHours, Warehouse};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/warehouses", get(list_warehouses).post(create_warehouse))
        .route("/warehouses/:id", get(get_warehouse).put(replace_warehouse))
        .route("/warehouses/:id/availability", get(warehouse_availability))
}

#[derive(Deserialize)]
pub struct WarehouseRequest {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default = "default_enabled")]
    pub is_delivery_enabled: bool,
    #[serde(default)]
    pub disabled_message: Option<String>,
    #[serde(default)]
    pub is_24x7: bool,
    #[serde(default)]
    pub service_postal_codes: BTreeSet<String>,
    #[serde(default)]
    pub operating_days: Vec<Weekday>,
    #[serde(default)]
    pub operating_hours: OperatingHours,
    pub max_delivery_radius_km: f64,
    #[serde(default)]
    pub free_delivery_radius_km: f64,
    #[serde(default)]
    pub charge_policy: Option<ChargePolicy>,
}

fn default_enabled() -> bool {
    true
}

impl WarehouseRequest {
    fn into_warehouse(self, id: Uuid) -> Result<Warehouse, AppError> {
        let warehouse = Warehouse {
            id,
            name: self.name.trim().to_string(),
            address: self.address,
            location: self.location,
            is_delivery_enabled: self.is_delivery_enabled,
            disabled_message: self.disabled_message,
            is_24x7: self.is_24x7,
            service_postal_codes: self
                .service_postal_codes
                .into_iter()
                .map(|code| code.trim().to_string())
                .collect(),
            operating_days: self.operating_days,
            operating_hours: self.operating_hours,
            max_delivery_radius_km: self.max_delivery_radius_km,
            free_delivery_radius_km: self.free_delivery_radius_km,
            charge_policy: self.charge_policy,
            updated_at: Utc::now(),
        };

        warehouse.validate()?;
        Ok(warehouse)
    }
}

async fn create_warehouse(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WarehouseRequest>,
) -> Result<Json<Warehouse>, AppError> {
    let warehouse = payload.into_warehouse(Uuid::new_v4())?;

    state.warehouses.insert(warehouse.id, warehouse.clone());
    Ok(Json(warehouse))
}

async fn replace_warehouse(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WarehouseRequest>,
) -> Result<Json<Warehouse>, AppError> {
    if !state.warehouses.contains_key(&id) {
        return Err(AppError::WarehouseNotFound(id));
    }

    let warehouse = payload.into_warehouse(id)?;
    state.warehouses.insert(id, warehouse.clone());
    Ok(Json(warehouse))
}

async fn list_warehouses(State(state): State<Arc<AppState>>) -> Json<Vec<Warehouse>> {
    Json(state.warehouse_snapshot())
}

async fn get_warehouse(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Warehouse>, AppError> {
    Ok(Json(state.warehouse(id)?))
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub timezone: Option<String>,
    pub at: Option<DateTime<Utc>>,
}

async fn warehouse_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<EligibilityResult>, AppError> {
    let warehouse = state.warehouse(id)?;
    let timezone = match query.timezone.as_deref() {
        Some(name) => parse_timezone(name)?,
        None => state.timezone,
    };
    let now = query.at.unwrap_or_else(Utc::now);

    Ok(Json(is_currently_open(&warehouse, now, timezone)))
}
