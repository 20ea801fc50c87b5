pub mod distance;
pub mod routing;

use crate::models::warehouse::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Travel time in minutes at a constant speed.
pub fn estimate_minutes(distance_km: f64, speed_kmh: f64) -> f64 {
    if speed_kmh <= 0.0 {
        return 0.0;
    }
    distance_km / speed_kmh * 60.0
}

#[cfg(test)]
mod tests {
    use super::{estimate_minutes, haversine_km};
    use crate::models::warehouse::GeoPoint;

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 12.9716,
            lng: 77.5946,
        };
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let points = [
            GeoPoint::new(12.9716, 77.5946),
            GeoPoint::new(28.6139, 77.2090),
            GeoPoint::new(-33.8688, 151.2093),
            GeoPoint::new(51.5074, -0.1278),
        ];

        for a in &points {
            for b in &points {
                let forward = haversine_km(a, b);
                let backward = haversine_km(b, a);
                assert!((forward - backward).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = GeoPoint {
            lat: 51.5074,
            lng: -0.1278,
        };
        let paris = GeoPoint {
            lat: 48.8566,
            lng: 2.3522,
        };
        let distance = haversine_km(&london, &paris);
        assert!((distance - 343.0).abs() < 5.0);
    }

    #[test]
    fn five_km_due_north() {
        let origin = GeoPoint::new(12.9716, 77.5946);
        let north = GeoPoint::new(12.9716 + 0.044966, 77.5946);
        let distance = haversine_km(&origin, &north);
        assert!((distance - 5.0).abs() < 0.01);
    }

    #[test]
    fn thirty_kmh_covers_fifteen_km_in_half_an_hour() {
        assert!((estimate_minutes(15.0, 30.0) - 30.0).abs() < 1e-9);
        assert_eq!(estimate_minutes(15.0, 0.0), 0.0);
    }
}
