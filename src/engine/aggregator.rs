use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::engine::charge::round2;
use crate::engine::selector::{build_quote, resolve_explicit, Destination};
use crate::error::AppError;
use crate::models::cart::{subtotal, CartItem, GroupError, MixedCartQuote, WarehouseGroupQuote};
use crate::models::delivery::{DeliveryQuote, FulfillmentTier, PaymentMethod};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct MixedCartRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub groups: BTreeMap<Uuid, Vec<CartItem>>,
}

fn validate_items(warehouse_id: Uuid, items: &[CartItem]) -> Result<(), AppError> {
    for item in items {
        if item.quantity == 0 {
            return Err(AppError::BadRequest(format!(
                "item {} for warehouse {warehouse_id} has zero quantity",
                item.product_id
            )));
        }
        if !item.unit_price.is_finite() || item.unit_price < 0.0 {
            return Err(AppError::BadRequest(format!(
                "item {} for warehouse {warehouse_id} has invalid unit_price {}",
                item.product_id, item.unit_price
            )));
        }
    }
    Ok(())
}

async fn quote_group(
    state: Arc<AppState>,
    warehouse_id: Uuid,
    destination: Destination,
    group_total: f64,
    payment_method: PaymentMethod,
    now: DateTime<Utc>,
) -> Result<DeliveryQuote, AppError> {
    let warehouse = state.warehouse(warehouse_id)?;
    let (warehouse, distance) = resolve_explicit(&state.distance, warehouse, &destination).await?;
    state.metrics.record_distance(distance.method.as_str());

    let quote = build_quote(
        &state,
        &warehouse,
        &distance,
        FulfillmentTier::Cart,
        group_total,
        payment_method,
        now,
    );
    if !quote.is_delivering {
        return Err(AppError::WarehouseNotDelivering {
            warehouse_id,
            reason: quote.availability.human_message,
        });
    }

    Ok(quote)
}

/// Quotes each warehouse group on its own task. A group that fails to resolve
/// or whose warehouse is not delivering right now is reported in its slot,
/// left out of the delivery total, and never affects its siblings.
pub async fn quote_mixed_cart(
    state: Arc<AppState>,
    request: MixedCartRequest,
    now: DateTime<Utc>,
) -> Result<MixedCartQuote, AppError> {
    let destination = Destination::parse(request.lat, request.lng, request.postal_code.as_deref())?;
    if request.groups.is_empty() {
        return Err(AppError::MissingRequiredFields("groups".to_string()));
    }
    for (warehouse_id, items) in &request.groups {
        validate_items(*warehouse_id, items)?;
    }

    let start = Instant::now();
    let totals: Vec<(Uuid, usize, f64)> = request
        .groups
        .iter()
        .map(|(id, items)| (*id, items.len(), subtotal(items)))
        .collect();

    let handles = totals.iter().map(|(warehouse_id, _, group_total)| {
        tokio::spawn(quote_group(
            state.clone(),
            *warehouse_id,
            destination.clone(),
            *group_total,
            request.payment_method,
            now,
        ))
    });
    let outcomes = join_all(handles).await;

    let mut groups = BTreeMap::new();
    let mut total_delivery_charge = 0.0;
    let mut errored_groups = 0;

    for ((warehouse_id, item_count, group_total), outcome) in totals.into_iter().zip(outcomes) {
        let result = match outcome {
            Ok(result) => result.map_err(|err| GroupError {
                code: err.code().to_string(),
                message: err.to_string(),
            }),
            Err(join_err) => Err(GroupError {
                code: "INTERNAL_ERROR".to_string(),
                message: format!("quote task failed: {join_err}"),
            }),
        };

        let (quote, group_error) = match result {
            Ok(quote) => {
                total_delivery_charge += quote.charge;
                (Some(quote), None)
            }
            Err(group_error) => {
                errored_groups += 1;
                state.metrics.mixed_cart_group_errors_total.inc();
                error!(
                    warehouse_id = %warehouse_id,
                    code = %group_error.code,
                    error = %group_error.message,
                    "warehouse group could not be quoted"
                );
                (None, Some(group_error))
            }
        };

        groups.insert(
            warehouse_id,
            WarehouseGroupQuote {
                warehouse_id,
                item_count,
                subtotal: round2(group_total),
                quote,
                error: group_error,
            },
        );
    }

    let quoted_groups = groups.len() - errored_groups;
    let has_errors = errored_groups > 0;
    let outcome = if has_errors { "partial" } else { "success" };
    state
        .metrics
        .record_quote("mixed", outcome, start.elapsed().as_secs_f64());

    info!(
        groups = groups.len(),
        quoted_groups,
        errored_groups,
        total_delivery_charge,
        "mixed cart quoted"
    );

    Ok(MixedCartQuote {
        cart_total: round2(groups.values().map(|g| g.subtotal).sum()),
        groups,
        total_delivery_charge: round2(total_delivery_charge),
        quoted_groups,
        errored_groups,
        has_errors,
    })
}
