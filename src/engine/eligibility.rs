use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use uuid::Uuid;

use crate::engine::schedule::is_currently_open;
use crate::models::delivery::EligibilityResult;
use crate::models::warehouse::{GeoPoint, Warehouse, WarehouseKind};

/// Warehouses that may serve a postal code, split by kind.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    pub custom: Vec<Warehouse>,
    pub global: Vec<Warehouse>,
}

impl Candidates {
    /// Local custom warehouses win outright; globals are only a fallback.
    pub fn into_selected(self) -> Vec<Warehouse> {
        if self.custom.is_empty() {
            self.global
        } else {
            self.custom
        }
    }

    pub fn is_empty(&self) -> bool {
        self.custom.is_empty() && self.global.is_empty()
    }
}

/// Without a postal code no custom warehouse can be matched, so only globals
/// remain.
pub fn find_candidates(warehouses: &[Warehouse], postal_code: Option<&str>) -> Candidates {
    let mut candidates = Candidates::default();

    for warehouse in warehouses.iter().filter(|w| w.is_routable()) {
        if warehouse.is_24x7 {
            candidates.global.push(warehouse.clone());
        } else if postal_code.is_some_and(|code| warehouse.service_postal_codes.contains(code)) {
            candidates.custom.push(warehouse.clone());
        }
    }

    candidates
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CoverageMode {
    Custom,
    CustomDisabled,
    Global,
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarehouseSummary {
    pub id: Uuid,
    pub name: String,
    pub kind: WarehouseKind,
    pub location: Option<GeoPoint>,
}

impl From<&Warehouse> for WarehouseSummary {
    fn from(warehouse: &Warehouse) -> Self {
        Self {
            id: warehouse.id,
            name: warehouse.name.clone(),
            kind: warehouse.kind(),
            location: warehouse.location,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostalCoverage {
    pub postal_code: String,
    pub mode: CoverageMode,
    pub is_serviceable: bool,
    pub matched_warehouse: Option<WarehouseSummary>,
    pub availability: Option<EligibilityResult>,
    pub custom_count: usize,
    pub global_count: usize,
}

/// `custom-disabled` means custom warehouses list the code but none can take
/// orders; delivery then depends on a global fallback existing.
pub fn check_postal_code(
    warehouses: &[Warehouse],
    postal_code: &str,
    now: DateTime<Utc>,
    timezone: Tz,
) -> PostalCoverage {
    let candidates = find_candidates(warehouses, Some(postal_code));
    let custom_count = candidates.custom.len();
    let global_count = candidates.global.len();

    let mapped_custom = warehouses
        .iter()
        .find(|w| !w.is_24x7 && w.service_postal_codes.contains(postal_code));

    let (mode, matched) = if let Some(first) = candidates.custom.first() {
        (CoverageMode::Custom, Some(first))
    } else if let Some(disabled) = mapped_custom {
        (CoverageMode::CustomDisabled, Some(disabled))
    } else if let Some(first) = candidates.global.first() {
        (CoverageMode::Global, Some(first))
    } else {
        (CoverageMode::None, None)
    };

    PostalCoverage {
        postal_code: postal_code.to_string(),
        mode,
        is_serviceable: !candidates.is_empty(),
        matched_warehouse: matched.map(WarehouseSummary::from),
        availability: matched.map(|w| is_currently_open(w, now, timezone)),
        custom_count,
        global_count,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use chrono_tz::Asia::Kolkata;
    use uuid::Uuid;

    use super::{check_postal_code, find_candidates, CoverageMode};
    use crate::models::warehouse::{GeoPoint, OperatingHours, Warehouse};

    fn warehouse(seed: u128, is_24x7: bool, codes: &[&str]) -> Warehouse {
        Warehouse {
            id: Uuid::from_u128(seed),
            name: format!("wh-{seed}"),
            address: String::new(),
            location: Some(GeoPoint::new(12.97, 77.59)),
            is_delivery_enabled: true,
            disabled_message: None,
            is_24x7,
            service_postal_codes: codes.iter().map(|c| c.to_string()).collect(),
            operating_days: Vec::new(),
            operating_hours: OperatingHours::default(),
            max_delivery_radius_km: 10.0,
            free_delivery_radius_km: 2.0,
            charge_policy: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn custom_matches_only_its_postal_codes() {
        let warehouses = vec![warehouse(1, false, &["560001"])];

        let hit = find_candidates(&warehouses, Some("560001"));
        assert_eq!(hit.custom.len(), 1);

        let miss = find_candidates(&warehouses, Some("560002"));
        assert!(miss.custom.is_empty());
    }

    #[test]
    fn globals_match_any_postal_code() {
        let warehouses = vec![warehouse(1, false, &["560001"]), warehouse(2, true, &[])];

        let candidates = find_candidates(&warehouses, Some("110001"));
        assert!(candidates.custom.is_empty());
        assert_eq!(candidates.global.len(), 1);
        assert_eq!(candidates.into_selected()[0].id, Uuid::from_u128(2));
    }

    #[test]
    fn local_custom_warehouse_shadows_globals() {
        let warehouses = vec![
            warehouse(1, true, &[]),
            warehouse(2, false, &["560001"]),
            warehouse(3, true, &[]),
        ];

        let selected = find_candidates(&warehouses, Some("560001")).into_selected();

        assert_eq!(selected.len(), 1);
        assert!(selected.iter().all(|w| !w.is_24x7));
    }

    #[test]
    fn disabled_and_unlocated_warehouses_are_excluded() {
        let mut disabled = warehouse(1, false, &["560001"]);
        disabled.is_delivery_enabled = false;
        let mut unlocated = warehouse(2, true, &[]);
        unlocated.location = None;

        let candidates = find_candidates(&[disabled, unlocated], Some("560001"));

        assert!(candidates.is_empty());
    }

    #[test]
    fn no_postal_code_yields_only_globals() {
        let warehouses = vec![warehouse(1, false, &["560001"]), warehouse(2, true, &[])];

        let candidates = find_candidates(&warehouses, None);

        assert!(candidates.custom.is_empty());
        assert_eq!(candidates.global.len(), 1);
    }

    #[test]
    fn coverage_modes() {
        let now = Utc::now();
        let mut disabled = warehouse(1, false, &["560001"]);
        disabled.is_delivery_enabled = false;
        let warehouses = vec![disabled, warehouse(2, false, &["560002"]), warehouse(3, true, &[])];

        let custom = check_postal_code(&warehouses, "560002", now, Kolkata);
        assert_eq!(custom.mode, CoverageMode::Custom);
        assert_eq!(custom.matched_warehouse.unwrap().id, Uuid::from_u128(2));
        assert_eq!(custom.custom_count, 1);
        assert_eq!(custom.global_count, 1);

        let custom_disabled = check_postal_code(&warehouses, "560001", now, Kolkata);
        assert_eq!(custom_disabled.mode, CoverageMode::CustomDisabled);
        assert!(custom_disabled.is_serviceable);
        assert!(!custom_disabled.availability.unwrap().is_delivering);

        let global = check_postal_code(&warehouses, "400001", now, Kolkata);
        assert_eq!(global.mode, CoverageMode::Global);
        assert_eq!(global.matched_warehouse.unwrap().id, Uuid::from_u128(3));

        let none = check_postal_code(&warehouses[..2], "400001", now, Kolkata);
        assert_eq!(none.mode, CoverageMode::None);
        assert!(!none.is_serviceable);
        assert!(none.matched_warehouse.is_none());
    }
}
