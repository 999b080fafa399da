//! Great-circle geometry and built-in city centers

/// Earth radius used for great-circle distances, in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate pair in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Map center used when neither the map surface nor the city gives one
pub const STOCKHOLM_CENTER: LatLon = LatLon::new(59.334, 18.063);

/// Built-in playable cities and their map centers
pub const CITY_CENTERS: [(&str, LatLon); 3] = [
    ("stockholm", STOCKHOLM_CENTER),
    ("goteborg", LatLon::new(57.707, 11.967)),
    ("malmo", LatLon::new(55.605, 13.003)),
];

/// Look up the center for a built-in city key
pub fn city_center(city: &str) -> Option<LatLon> {
    let key = city.trim().to_ascii_lowercase();
    CITY_CENTERS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, center)| *center)
}

/// Haversine great-circle distance between two points, in kilometers
pub fn haversine_km(a: LatLon, b: LatLon) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Initial bearing from `from` towards `to`, in degrees 0..360
///
/// Used to orient the guess marker's arrow icon at reveal.
pub fn bearing_deg(from: LatLon, to: LatLon) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlon = (to.lon - from.lon).to_radians();
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_have_zero_distance() {
        let p = LatLon::new(59.334, 18.063);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn distance_is_monotonic_with_angular_separation() {
        let origin = LatLon::new(59.0, 18.0);
        let near = LatLon::new(59.01, 18.0);
        let mid = LatLon::new(59.1, 18.0);
        let far = LatLon::new(60.0, 18.0);
        let d_near = haversine_km(origin, near);
        let d_mid = haversine_km(origin, mid);
        let d_far = haversine_km(origin, far);
        assert!(d_near < d_mid);
        assert!(d_mid < d_far);
    }

    #[test]
    fn stockholm_to_gothenburg_is_roughly_400km() {
        let stockholm = city_center("stockholm").unwrap();
        let gothenburg = city_center("goteborg").unwrap();
        let d = haversine_km(stockholm, gothenburg);
        assert!((390.0..420.0).contains(&d), "got {d}");
    }

    #[test]
    fn bearing_points_north_and_east() {
        let origin = LatLon::new(59.0, 18.0);
        let north = bearing_deg(origin, LatLon::new(60.0, 18.0));
        let east = bearing_deg(origin, LatLon::new(59.0, 19.0));
        assert!(north.abs() < 1.0 || (north - 360.0).abs() < 1.0);
        assert!((east - 90.0).abs() < 2.0);
    }

    #[test]
    fn city_lookup_is_case_insensitive() {
        assert!(city_center("Stockholm").is_some());
        assert!(city_center("MALMO").is_some());
        assert!(city_center("berlin").is_none());
    }
}
