use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;

use crate::engine::aggregator::{quote_mixed_cart, MixedCartRequest};
use crate::engine::eligibility::{check_postal_code, PostalCoverage};
use crate::engine::selector::{select_warehouse, QuoteRequest};
use crate::error::AppError;
use crate::models::cart::MixedCartQuote;
use crate::models::delivery::DeliveryQuote;
use crate::models::warehouse::validate_postal_code;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/delivery/quote", post(quote_delivery))
        .route("/delivery/quote/mixed", post(quote_mixed))
        .route("/delivery/postal-codes/:code", get(postal_code_coverage))
}

async fn quote_delivery(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QuoteRequest>,
) -> Result<Json<DeliveryQuote>, AppError> {
    let quote = select_warehouse(&state, &payload, Utc::now()).await?;
    Ok(Json(quote))
}

async fn quote_mixed(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MixedCartRequest>,
) -> Result<Json<MixedCartQuote>, AppError> {
    let quote = quote_mixed_cart(state, payload, Utc::now()).await?;
    Ok(Json(quote))
}

async fn postal_code_coverage(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<PostalCoverage>, AppError> {
    validate_postal_code(&code)?;

    let warehouses = state.warehouse_snapshot();
    Ok(Json(check_postal_code(
        &warehouses,
        &code,
        Utc::now(),
        state.timezone,
    )))
}
