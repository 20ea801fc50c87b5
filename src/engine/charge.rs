use crate::models::delivery::{ChargeBreakdown, FreeDeliveryReason, PaymentMethod};
use crate::models::policy::ChargePolicy;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Prices one delivery. Assumes `policy` already passed
/// [`ChargePolicy::validate`].
pub fn compute_charge(
    distance_km: f64,
    cart_total: f64,
    payment_method: PaymentMethod,
    free_delivery_radius_km: f64,
    policy: &ChargePolicy,
) -> ChargeBreakdown {
    let free_reason = if cart_total >= policy.free_delivery_min_amount {
        Some(FreeDeliveryReason::OrderValue)
    } else if distance_km <= free_delivery_radius_km {
        Some(FreeDeliveryReason::WithinFreeRadius)
    } else {
        None
    };

    if free_reason.is_some() {
        return ChargeBreakdown {
            delivery_charge: 0.0,
            is_free_delivery: true,
            free_reason,
            base_charge: 0.0,
            chargeable_km: 0.0,
            distance_charge: 0.0,
            clamped_charge: 0.0,
            cod_surcharge: None,
        };
    }

    let chargeable_km = (distance_km - free_delivery_radius_km).max(0.0);
    let distance_charge = policy.per_km_charge * chargeable_km;
    let raw = policy.base_charge + distance_charge;
    // Not f64::clamp: a bad policy must not panic here.
    let clamped_charge = raw.max(policy.min_charge).min(policy.max_charge);

    let cod_surcharge = match payment_method {
        PaymentMethod::Cod => policy.cod_surcharge.filter(|fee| *fee > 0.0),
        PaymentMethod::Prepaid => None,
    };

    ChargeBreakdown {
        delivery_charge: round2(clamped_charge + cod_surcharge.unwrap_or(0.0)),
        is_free_delivery: false,
        free_reason: None,
        base_charge: policy.base_charge,
        chargeable_km: round2(chargeable_km),
        distance_charge: round2(distance_charge),
        clamped_charge: round2(clamped_charge),
        cod_surcharge,
    }
}

#[cfg(test)]
mod tests {
    use super::compute_charge;
    use crate::models::delivery::{FreeDeliveryReason, PaymentMethod};
    use crate::models::policy::ChargePolicy;

    fn policy() -> ChargePolicy {
        ChargePolicy {
            free_delivery_min_amount: 500.0,
            base_charge: 20.0,
            min_charge: 10.0,
            max_charge: 100.0,
            per_km_charge: 5.0,
            cod_surcharge: Some(15.0),
        }
    }

    #[test]
    fn charges_base_plus_distance_beyond_free_radius() {
        let breakdown = compute_charge(8.0, 400.0, PaymentMethod::Prepaid, 3.0, &policy());

        assert!(!breakdown.is_free_delivery);
        assert_eq!(breakdown.chargeable_km, 5.0);
        assert_eq!(breakdown.distance_charge, 25.0);
        assert_eq!(breakdown.delivery_charge, 45.0);
    }

    #[test]
    fn order_value_unlocks_free_delivery_at_any_distance() {
        for distance in [0.5, 8.0, 40.0] {
            let breakdown = compute_charge(distance, 600.0, PaymentMethod::Cod, 3.0, &policy());
            assert!(breakdown.is_free_delivery);
            assert_eq!(breakdown.free_reason, Some(FreeDeliveryReason::OrderValue));
            assert_eq!(breakdown.delivery_charge, 0.0);
        }

        let at_threshold = compute_charge(8.0, 500.0, PaymentMethod::Prepaid, 3.0, &policy());
        assert!(at_threshold.is_free_delivery);
    }

    #[test]
    fn inside_free_radius_is_free() {
        let breakdown = compute_charge(3.0, 100.0, PaymentMethod::Prepaid, 3.0, &policy());

        assert!(breakdown.is_free_delivery);
        assert_eq!(breakdown.free_reason, Some(FreeDeliveryReason::WithinFreeRadius));
    }

    #[test]
    fn clamps_to_max_and_adds_cod_after() {
        let far = compute_charge(60.0, 100.0, PaymentMethod::Prepaid, 3.0, &policy());
        assert_eq!(far.delivery_charge, 100.0);

        let far_cod = compute_charge(60.0, 100.0, PaymentMethod::Cod, 3.0, &policy());
        assert_eq!(far_cod.clamped_charge, 100.0);
        assert_eq!(far_cod.cod_surcharge, Some(15.0));
        assert_eq!(far_cod.delivery_charge, 115.0);
    }

    #[test]
    fn clamps_up_to_min() {
        let cheap = ChargePolicy {
            base_charge: 10.0,
            min_charge: 10.0,
            per_km_charge: 0.0,
            ..policy()
        };
        let breakdown = compute_charge(4.0, 100.0, PaymentMethod::Prepaid, 3.0, &cheap);

        assert_eq!(breakdown.delivery_charge, 10.0);
    }

    #[test]
    fn non_decreasing_in_distance_and_bounded() {
        let policy = policy();
        let mut previous = 0.0;
        let mut distance = 3.01;
        while distance < 50.0 {
            for method in [PaymentMethod::Prepaid, PaymentMethod::Cod] {
                let breakdown = compute_charge(distance, 100.0, method, 3.0, &policy);
                assert!(breakdown.delivery_charge >= policy.min_charge);
                assert!(breakdown.delivery_charge <= policy.max_charge + 15.0);
            }

            let charge =
                compute_charge(distance, 100.0, PaymentMethod::Prepaid, 3.0, &policy).delivery_charge;
            assert!(charge >= previous);
            previous = charge;
            distance += 0.37;
        }
    }

    #[test]
    fn cod_without_configured_surcharge_adds_nothing() {
        let no_cod = ChargePolicy {
            cod_surcharge: None,
            ..policy()
        };
        let breakdown = compute_charge(8.0, 400.0, PaymentMethod::Cod, 3.0, &no_cod);

        assert_eq!(breakdown.cod_surcharge, None);
        assert_eq!(breakdown.delivery_charge, 45.0);
    }
}
