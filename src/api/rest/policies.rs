use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use tracing::info;

use crate::error::AppError;
use crate::models::policy::{ChargePolicy, DeliveryPolicy};
use crate::models::warehouse::WarehouseKind;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/delivery-policies/:kind",
        get(get_active_policy).put(upsert_active_policy),
    )
}

async fn get_active_policy(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<WarehouseKind>,
) -> Result<Json<DeliveryPolicy>, AppError> {
    let policy = state
        .policies
        .get(&kind)
        .filter(|entry| entry.is_active)
        .ok_or_else(|| AppError::NotFound(format!("no active {} delivery policy", kind.as_str())))?;

    Ok(Json(policy.value().clone()))
}

async fn upsert_active_policy(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<WarehouseKind>,
    Json(payload): Json<ChargePolicy>,
) -> Result<Json<DeliveryPolicy>, AppError> {
    let policy = state.upsert_policy(kind, payload)?;

    info!(kind = kind.as_str(), policy_id = %policy.id, "delivery policy updated");
    Ok(Json(policy))
}
