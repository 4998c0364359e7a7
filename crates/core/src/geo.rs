//! Great-circle distance for radius filters.

use rolapet_db::entities::GeoPoint;
use serde::Deserialize;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points, in kilometers.
#[must_use]
pub fn distance_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = (to.lat - from.lat).to_radians();
    let dlng = (to.lng - from.lng).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// A circle on the map.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Radius {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl Radius {
    /// Whether `point` lies inside the circle, border included.
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        distance_km(self.center, point) <= self.radius_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOGOTA: GeoPoint = GeoPoint {
        lat: 4.6097,
        lng: -74.0817,
    };

    #[test]
    fn test_zero_distance() {
        assert!(distance_km(BOGOTA, BOGOTA).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance() {
        let medellin = GeoPoint {
            lat: 6.2442,
            lng: -75.5812,
        };
        let d = distance_km(BOGOTA, medellin);
        assert!((d - 245.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn test_radius_contains() {
        let usaquen = GeoPoint {
            lat: 4.7010,
            lng: -74.0304,
        };
        let near = Radius {
            center: BOGOTA,
            radius_km: 15.0,
        };
        let tight = Radius {
            center: BOGOTA,
            radius_km: 5.0,
        };

        assert!(near.contains(usaquen));
        assert!(!tight.contains(usaquen));
    }
}
