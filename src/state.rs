use chrono::Utc;
use chrono_tz::Tz;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::distance::DistanceProvider;
use crate::models::policy::{ChargePolicy, DeliveryPolicy};
use crate::models::warehouse::{Warehouse, WarehouseKind};
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub warehouses: DashMap<Uuid, Warehouse>,
    pub policies: DashMap<WarehouseKind, DeliveryPolicy>,
    pub distance: DistanceProvider,
    pub timezone: Tz,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(distance: DistanceProvider, timezone: Tz) -> Self {
        Self {
            warehouses: DashMap::new(),
            policies: DashMap::new(),
            distance,
            timezone,
            metrics: Metrics::new(),
        }
    }

    /// Point-in-time copy ordered by name then id, so candidate order (and
    /// therefore tie-breaking) does not depend on map iteration order.
    pub fn warehouse_snapshot(&self) -> Vec<Warehouse> {
        let mut warehouses: Vec<Warehouse> = self
            .warehouses
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        warehouses.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        warehouses
    }

    pub fn warehouse(&self, id: Uuid) -> Result<Warehouse, AppError> {
        self.warehouses
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(AppError::WarehouseNotFound(id))
    }

    /// Warehouse override, else the active policy for its kind, else defaults.
    pub fn effective_policy(&self, warehouse: &Warehouse) -> ChargePolicy {
        if let Some(policy) = &warehouse.charge_policy {
            return policy.clone();
        }

        self.policies
            .get(&warehouse.kind())
            .filter(|entry| entry.is_active)
            .map(|entry| entry.charge.clone())
            .unwrap_or_default()
    }

    /// Replaces the active policy for `kind` in place; there is never more
    /// than one record per kind.
    pub fn upsert_policy(
        &self,
        kind: WarehouseKind,
        charge: ChargePolicy,
    ) -> Result<DeliveryPolicy, AppError> {
        charge.validate()?;

        let mut entry = self.policies.entry(kind).or_insert_with(|| DeliveryPolicy {
            id: Uuid::new_v4(),
            kind,
            charge: charge.clone(),
            is_active: true,
            updated_at: Utc::now(),
        });
        entry.charge = charge;
        entry.is_active = true;
        entry.updated_at = Utc::now();

        Ok(entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use chrono_tz::Asia::Kolkata;
    use uuid::Uuid;

    use super::AppState;
    use crate::geo::distance::tests::unreachable_provider;
    use crate::models::policy::ChargePolicy;
    use crate::models::warehouse::{OperatingHours, Warehouse, WarehouseKind};

    fn warehouse(is_24x7: bool, charge_policy: Option<ChargePolicy>) -> Warehouse {
        Warehouse {
            id: Uuid::new_v4(),
            name: "Whitefield".to_string(),
            address: String::new(),
            location: None,
            is_delivery_enabled: true,
            disabled_message: None,
            is_24x7,
            service_postal_codes: Default::default(),
            operating_days: Vec::new(),
            operating_hours: OperatingHours::default(),
            max_delivery_radius_km: 10.0,
            free_delivery_radius_km: 0.0,
            charge_policy,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn upsert_keeps_a_single_active_record() {
        let state = AppState::new(unreachable_provider(), Kolkata);

        let first = state
            .upsert_policy(WarehouseKind::Global, ChargePolicy::default())
            .unwrap();
        let second = state
            .upsert_policy(
                WarehouseKind::Global,
                ChargePolicy {
                    base_charge: 30.0,
                    ..ChargePolicy::default()
                },
            )
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(state.policies.len(), 1);
        assert_eq!(second.charge.base_charge, 30.0);
    }

    #[test]
    fn upsert_rejects_invalid_policy() {
        let state = AppState::new(unreachable_provider(), Kolkata);
        let invalid = ChargePolicy {
            min_charge: 200.0,
            base_charge: 200.0,
            max_charge: 100.0,
            ..ChargePolicy::default()
        };

        assert!(state.upsert_policy(WarehouseKind::Custom, invalid).is_err());
        assert!(state.policies.is_empty());
    }

    #[test]
    fn effective_policy_prefers_override_then_kind_then_default() {
        let state = AppState::new(unreachable_provider(), Kolkata);
        let custom_policy = ChargePolicy {
            base_charge: 25.0,
            ..ChargePolicy::default()
        };
        state
            .upsert_policy(WarehouseKind::Custom, custom_policy.clone())
            .unwrap();

        let override_policy = ChargePolicy {
            base_charge: 40.0,
            ..ChargePolicy::default()
        };

        assert_eq!(
            state.effective_policy(&warehouse(false, Some(override_policy.clone()))),
            override_policy
        );
        assert_eq!(state.effective_policy(&warehouse(false, None)), custom_policy);
        assert_eq!(
            state.effective_policy(&warehouse(true, None)),
            ChargePolicy::default()
        );
    }
}
