//! Great-circle distance for the saved-search geo clause.

/// Calculate distance between two coordinates in kilometers
///
/// Uses Haversine formula for accuracy on Earth's surface
///
/// # Arguments
/// * `lat1`, `lng1` - First coordinate
/// * `lat2`, `lng2` - Second coordinate
///
/// # Returns
/// Distance in kilometers
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_distance() {
        // Minneapolis to St. Paul (≈16 km)
        let distance = distance_km(44.98, -93.27, 44.95, -93.09);
        assert!(distance > 15.0 && distance < 17.0);
    }

    #[test]
    fn test_same_point_is_zero() {
        let distance = distance_km(44.98, -93.27, 44.98, -93.27);
        assert!(distance < 1e-9);
    }

    #[test]
    fn test_symmetry() {
        let d1 = distance_km(51.5, -0.12, 48.85, 2.35);
        let d2 = distance_km(48.85, 2.35, 51.5, -0.12);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // One degree of latitude is ~111.2 km everywhere on the sphere
        let distance = distance_km(10.0, 20.0, 11.0, 20.0);
        assert!((distance - 111.19).abs() < 0.1);
    }
}
