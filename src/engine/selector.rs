//! Picks the warehouse that fulfils a delivery and prices it.
//!
//! Resolution runs in three tiers: an explicitly requested warehouse, then
//! the warehouses the cart already references, then every warehouse that
//! serves the postal code. Each tier applies the same postal-code and radius
//! rules.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::charge::{compute_charge, round2};
use crate::engine::eligibility::find_candidates;
use crate::engine::schedule::is_currently_open;
use crate::error::AppError;
use crate::geo::distance::DistanceProvider;
use crate::models::delivery::{
    ChargeBreakdown, DeliveryQuote, DistanceResult, EligibilityResult, FreeDeliveryReason,
    FulfillmentTier, PaymentMethod,
};
use crate::models::policy::ChargePolicy;
use crate::models::warehouse::{validate_postal_code, GeoPoint, Warehouse};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub warehouse_id: Option<Uuid>,
    #[serde(default)]
    pub cart_warehouse_ids: Vec<Uuid>,
    pub cart_total: Option<f64>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Where the order is going, after input validation.
#[derive(Debug, Clone)]
pub struct Destination {
    pub location: GeoPoint,
    pub postal_code: Option<String>,
}

impl Destination {
    pub fn parse(
        lat: Option<f64>,
        lng: Option<f64>,
        postal_code: Option<&str>,
    ) -> Result<Self, AppError> {
        let (lat, lng) = match (lat, lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            (None, None) => return Err(AppError::MissingRequiredFields("lat, lng".to_string())),
            (None, _) => return Err(AppError::MissingRequiredFields("lat".to_string())),
            (_, None) => return Err(AppError::MissingRequiredFields("lng".to_string())),
        };

        let location = GeoPoint::new(lat, lng);
        if !location.is_valid() {
            return Err(AppError::InvalidCoordinates(format!(
                "({lat}, {lng}) is not a valid latitude/longitude"
            )));
        }

        let postal_code = postal_code
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(|code| validate_postal_code(code).map(|_| code.to_string()))
            .transpose()?;

        Ok(Self {
            location,
            postal_code,
        })
    }

    fn postal_code(&self) -> Option<&str> {
        self.postal_code.as_deref()
    }
}

fn check_radius(warehouse: &Warehouse, distance: &DistanceResult) -> Result<(), AppError> {
    if distance.distance_km > warehouse.max_delivery_radius_km {
        return Err(AppError::DeliveryRadiusExceeded {
            warehouse_id: warehouse.id,
            distance_km: distance.distance_km,
            max_radius_km: warehouse.max_delivery_radius_km,
        });
    }
    Ok(())
}

/// A named warehouse: must exist, have a location, serve the postal code (if
/// one was given) and be within its own radius.
pub async fn resolve_explicit(
    provider: &DistanceProvider,
    warehouse: Warehouse,
    destination: &Destination,
) -> Result<(Warehouse, DistanceResult), AppError> {
    let location = warehouse.location.ok_or_else(|| {
        AppError::DistanceCalculationFailed(format!("warehouse {} has no location", warehouse.id))
    })?;

    if let Some(code) = destination.postal_code() {
        if !warehouse.serves_postal_code(code) {
            return Err(AppError::PincodeNotSupported {
                warehouse_id: warehouse.id,
                postal_code: code.to_string(),
            });
        }
    }

    let distance = provider.route(location, destination.location).await?;
    check_radius(&warehouse, &distance)?;

    Ok((warehouse, distance))
}

/// Nearest eligible warehouse among those the cart references, in cart order.
pub async fn resolve_cart_scoped(
    provider: &DistanceProvider,
    warehouses: &[Warehouse],
    cart_warehouse_ids: &[Uuid],
    destination: &Destination,
) -> Result<(Warehouse, DistanceResult), AppError> {
    let mut scoped: Vec<Warehouse> = Vec::new();
    for id in cart_warehouse_ids {
        if scoped.iter().any(|w| w.id == *id) {
            continue;
        }
        match warehouses.iter().find(|w| w.id == *id) {
            Some(warehouse) => scoped.push(warehouse.clone()),
            None => warn!(warehouse_id = %id, "cart references unknown warehouse"),
        }
    }

    let referenced = scoped.len();
    // Without a postal code there is nothing to match against, so every
    // routable cart warehouse stays eligible, as in the explicit tier.
    let candidates: Vec<Warehouse> = match destination.postal_code() {
        Some(code) => find_candidates(&scoped, Some(code)).into_selected(),
        None => scoped.into_iter().filter(Warehouse::is_routable).collect(),
    };
    if candidates.is_empty() {
        return Err(AppError::NoCartWarehouseAvailable(format!(
            "none of the {referenced} cart warehouses can deliver to {}",
            destination.postal_code().unwrap_or("this location")
        )));
    }

    let nearest = provider.find_nearest(destination.location, &candidates).await?;
    check_radius(&nearest.warehouse, &nearest.distance)?;

    Ok((nearest.warehouse, nearest.distance))
}

/// Nearest warehouse across the whole network, with local custom warehouses
/// taking precedence over global ones.
pub async fn resolve_auto(
    provider: &DistanceProvider,
    warehouses: &[Warehouse],
    destination: &Destination,
) -> Result<(Warehouse, DistanceResult), AppError> {
    let candidates = find_candidates(warehouses, destination.postal_code()).into_selected();
    if candidates.is_empty() {
        return Err(AppError::NoWarehouseAvailable(format!(
            "no warehouse delivers to {}",
            destination.postal_code().unwrap_or("this location")
        )));
    }

    let nearest = provider.find_nearest(destination.location, &candidates).await?;
    if nearest.distance.distance_km > nearest.warehouse.max_delivery_radius_km {
        return Err(AppError::NoWarehouseAvailable(format!(
            "nearest warehouse {} is {:.2} km away, beyond its {:.2} km delivery radius",
            nearest.warehouse.id,
            nearest.distance.distance_km,
            nearest.warehouse.max_delivery_radius_km
        )));
    }

    Ok((nearest.warehouse, nearest.distance))
}

fn quote_message(
    availability: &EligibilityResult,
    breakdown: &ChargeBreakdown,
    distance_km: f64,
    policy: &ChargePolicy,
    free_delivery_radius_km: f64,
) -> String {
    if !availability.is_delivering {
        return availability.human_message.clone();
    }

    match breakdown.free_reason {
        Some(FreeDeliveryReason::OrderValue) => format!(
            "Free delivery on orders of {:.2} or more",
            policy.free_delivery_min_amount
        ),
        Some(FreeDeliveryReason::WithinFreeRadius) => {
            format!("Free delivery within {free_delivery_radius_km:.1} km")
        }
        None => match breakdown.cod_surcharge {
            Some(fee) => format!(
                "Delivery charge {:.2} for {distance_km:.2} km, including {fee:.2} cash-on-delivery fee",
                breakdown.delivery_charge
            ),
            None => format!(
                "Delivery charge {:.2} for {distance_km:.2} km",
                breakdown.delivery_charge
            ),
        },
    }
}

/// Prices a resolved warehouse and attaches its current availability.
pub fn build_quote(
    state: &AppState,
    warehouse: &Warehouse,
    distance: &DistanceResult,
    tier: FulfillmentTier,
    cart_total: f64,
    payment_method: PaymentMethod,
    now: DateTime<Utc>,
) -> DeliveryQuote {
    let policy = state.effective_policy(warehouse);
    let breakdown = compute_charge(
        distance.distance_km,
        cart_total,
        payment_method,
        warehouse.free_delivery_radius_km,
        &policy,
    );
    let availability = is_currently_open(warehouse, now, state.timezone);
    let distance_km = round2(distance.distance_km);
    let message = quote_message(
        &availability,
        &breakdown,
        distance_km,
        &policy,
        warehouse.free_delivery_radius_km,
    );

    DeliveryQuote {
        warehouse_id: warehouse.id,
        warehouse_name: warehouse.name.clone(),
        tier,
        distance_km,
        duration_minutes: round2(distance.duration_minutes),
        method: distance.method,
        charge: breakdown.delivery_charge,
        is_free_delivery: breakdown.is_free_delivery,
        cod_surcharge: breakdown.cod_surcharge,
        is_delivering: availability.is_delivering,
        availability,
        breakdown,
        message,
    }
}

fn validate_cart_total(cart_total: Option<f64>) -> Result<f64, AppError> {
    let total = cart_total.ok_or_else(|| AppError::MissingRequiredFields("cart_total".to_string()))?;
    if !total.is_finite() || total < 0.0 {
        return Err(AppError::BadRequest(format!(
            "cart_total must be a non-negative number, got {total}"
        )));
    }
    Ok(total)
}

pub async fn select_warehouse(
    state: &AppState,
    request: &QuoteRequest,
    now: DateTime<Utc>,
) -> Result<DeliveryQuote, AppError> {
    let destination = Destination::parse(request.lat, request.lng, request.postal_code.as_deref())?;
    let cart_total = validate_cart_total(request.cart_total)?;

    let tier = if request.warehouse_id.is_some() {
        FulfillmentTier::Explicit
    } else if !request.cart_warehouse_ids.is_empty() {
        FulfillmentTier::Cart
    } else {
        FulfillmentTier::Auto
    };

    let start = Instant::now();
    let resolved = match request.warehouse_id {
        Some(id) => match state.warehouse(id) {
            Ok(warehouse) => resolve_explicit(&state.distance, warehouse, &destination).await,
            Err(err) => Err(err),
        },
        None if !request.cart_warehouse_ids.is_empty() => {
            let warehouses = state.warehouse_snapshot();
            resolve_cart_scoped(
                &state.distance,
                &warehouses,
                &request.cart_warehouse_ids,
                &destination,
            )
            .await
        }
        None => {
            let warehouses = state.warehouse_snapshot();
            resolve_auto(&state.distance, &warehouses, &destination).await
        }
    };
    let elapsed = start.elapsed().as_secs_f64();

    let (warehouse, distance) = match resolved {
        Ok(resolved) => resolved,
        Err(err) => {
            if matches!(err, AppError::DistanceCalculationFailed(_)) {
                state.metrics.record_distance("failed");
            }
            state.metrics.record_quote(tier.as_str(), err.code(), elapsed);
            warn!(tier = tier.as_str(), code = err.code(), error = %err, "delivery quote rejected");
            return Err(err);
        }
    };

    state.metrics.record_distance(distance.method.as_str());
    let quote = build_quote(
        state,
        &warehouse,
        &distance,
        tier,
        cart_total,
        request.payment_method,
        now,
    );
    state.metrics.record_quote(tier.as_str(), "success", elapsed);

    info!(
        warehouse_id = %quote.warehouse_id,
        tier = tier.as_str(),
        distance_km = quote.distance_km,
        method = quote.method.as_str(),
        charge = quote.charge,
        is_delivering = quote.is_delivering,
        "delivery quoted"
    );

    Ok(quote)
}
