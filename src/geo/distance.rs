//! Distance lookups with a deterministic fallback.
//!
//! Every lookup first asks the routing backend, bounded by a timeout. Any
//! routing failure degrades to a haversine estimate at a constant urban speed,
//! so callers only see an error when the coordinates themselves are unusable.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::error::AppError;
use crate::geo::routing::{RouteLeg, RoutingError, RoutingService};
use crate::geo::{estimate_minutes, haversine_km};
use crate::models::delivery::{DistanceMethod, DistanceResult};
use crate::models::warehouse::{GeoPoint, Warehouse};

pub const DEFAULT_FALLBACK_SPEED_KMH: f64 = 30.0;
pub const DEFAULT_ROUTING_TIMEOUT: Duration = Duration::from_secs(15);

impl From<RouteLeg> for DistanceResult {
    fn from(leg: RouteLeg) -> Self {
        DistanceResult {
            distance_km: leg.distance_m / 1000.0,
            duration_minutes: leg.duration_s / 60.0,
            method: DistanceMethod::Routed,
            raw_route: leg.raw,
        }
    }
}

pub fn haversine_estimate(
    origin: GeoPoint,
    destination: GeoPoint,
    speed_kmh: f64,
) -> Result<DistanceResult, AppError> {
    if !origin.is_valid() || !destination.is_valid() {
        return Err(AppError::DistanceCalculationFailed(format!(
            "cannot estimate distance between ({}, {}) and ({}, {})",
            origin.lat, origin.lng, destination.lat, destination.lng
        )));
    }

    let distance_km = haversine_km(&origin, &destination);
    Ok(DistanceResult {
        distance_km,
        duration_minutes: estimate_minutes(distance_km, speed_kmh),
        method: DistanceMethod::HaversineFallback,
        raw_route: None,
    })
}

/// Turns a routing outcome into a distance, degrading to haversine on any
/// routing error or unusable leg.
pub trait OrHaversine {
    fn or_haversine(
        self,
        origin: GeoPoint,
        destination: GeoPoint,
        speed_kmh: f64,
    ) -> Result<DistanceResult, AppError>;
}

impl OrHaversine for Result<RouteLeg, RoutingError> {
    fn or_haversine(
        self,
        origin: GeoPoint,
        destination: GeoPoint,
        speed_kmh: f64,
    ) -> Result<DistanceResult, AppError> {
        match self {
            Ok(leg) if leg.is_valid() => Ok(leg.into()),
            Ok(leg) => {
                warn!(
                    distance_m = leg.distance_m,
                    duration_s = leg.duration_s,
                    "routing returned an unusable leg; using haversine estimate"
                );
                haversine_estimate(origin, destination, speed_kmh)
            }
            Err(err) => {
                warn!(error = %err, "routing unavailable; using haversine estimate");
                haversine_estimate(origin, destination, speed_kmh)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct NearestWarehouse {
    pub warehouse: Warehouse,
    pub distance: DistanceResult,
}

#[derive(Clone)]
pub struct DistanceProvider {
    service: Arc<dyn RoutingService>,
    timeout: Duration,
    fallback_speed_kmh: f64,
}

impl DistanceProvider {
    pub fn new(service: Arc<dyn RoutingService>, timeout: Duration, fallback_speed_kmh: f64) -> Self {
        Self {
            service,
            timeout,
            fallback_speed_kmh,
        }
    }

    pub async fn route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<DistanceResult, AppError> {
        let routed = match tokio::time::timeout(self.timeout, self.service.route(origin, destination)).await {
            Ok(result) => result,
            Err(_) => Err(RoutingError::Timeout(self.timeout)),
        };

        routed.or_haversine(origin, destination, self.fallback_speed_kmh)
    }

    /// One result per origin, in input order, each measured towards the shared
    /// destination. A failed batch call falls back per origin rather than
    /// failing the whole matrix.
    pub async fn matrix(
        &self,
        origins: &[GeoPoint],
        destination: GeoPoint,
    ) -> Vec<Result<DistanceResult, AppError>> {
        if origins.is_empty() {
            return Vec::new();
        }

        let table = match tokio::time::timeout(self.timeout, self.service.table(origins, destination)).await {
            Ok(result) => result,
            Err(_) => Err(RoutingError::Timeout(self.timeout)),
        };

        match table {
            Ok(legs) if legs.len() == origins.len() => legs
                .into_iter()
                .zip(origins)
                .map(|(leg, origin)| {
                    leg.ok_or(RoutingError::Unroutable).or_haversine(
                        *origin,
                        destination,
                        self.fallback_speed_kmh,
                    )
                })
                .collect(),
            Ok(legs) => {
                warn!(
                    expected = origins.len(),
                    received = legs.len(),
                    "routing table size mismatch; using haversine estimates"
                );
                self.fallback_all(origins, destination)
            }
            Err(err) => {
                warn!(error = %err, "routing table unavailable; using haversine estimates");
                self.fallback_all(origins, destination)
            }
        }
    }

    fn fallback_all(
        &self,
        origins: &[GeoPoint],
        destination: GeoPoint,
    ) -> Vec<Result<DistanceResult, AppError>> {
        origins
            .iter()
            .map(|origin| haversine_estimate(*origin, destination, self.fallback_speed_kmh))
            .collect()
    }

    /// Nearest warehouse by delivery distance (warehouse to customer), the
    /// same direction `route` is called with for a single warehouse.
    /// Warehouses without a location are skipped; ties keep the earlier
    /// candidate.
    pub async fn find_nearest(
        &self,
        customer: GeoPoint,
        warehouses: &[Warehouse],
    ) -> Result<NearestWarehouse, AppError> {
        let located: Vec<(&Warehouse, GeoPoint)> = warehouses
            .iter()
            .filter_map(|warehouse| warehouse.location.map(|location| (warehouse, location)))
            .collect();

        if located.is_empty() {
            return Err(AppError::DistanceCalculationFailed(
                "no candidate warehouse has a location".to_string(),
            ));
        }

        let origins: Vec<GeoPoint> = located.iter().map(|(_, location)| *location).collect();
        let distances = self.matrix(&origins, customer).await;

        let mut best: Option<(&Warehouse, DistanceResult)> = None;
        let mut last_error = None;
        for ((warehouse, _), result) in located.into_iter().zip(distances) {
            match result {
                Ok(distance) => {
                    let closer = best
                        .as_ref()
                        .is_none_or(|(_, current)| distance.distance_km < current.distance_km);
                    if closer {
                        best = Some((warehouse, distance));
                    }
                }
                Err(err) => {
                    warn!(warehouse_id = %warehouse.id, error = %err, "skipping warehouse without distance");
                    last_error = Some(err);
                }
            }
        }

        match best {
            Some((warehouse, distance)) => Ok(NearestWarehouse {
                warehouse: warehouse.clone(),
                distance,
            }),
            None => Err(last_error.unwrap_or_else(|| {
                AppError::DistanceCalculationFailed("no distance could be computed".to_string())
            })),
        }
    }
}
