use serde::{Deserialize, Serialize};

/// A geographical coordinate: latitude first (index 0), longitude second (index 1),
/// both in decimal degrees.
///
/// ```
/// use dfw_weather::LatLon;
///
/// let dfw = LatLon(32.9, -97.0333);
/// assert_eq!(dfw.0, 32.9);
/// assert_eq!(dfw.1, -97.0333);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(self) -> f64 {
        self.0
    }

    pub fn longitude(self) -> f64 {
        self.1
    }

    pub(crate) fn as_haversine(self) -> haversine::Location {
        haversine::Location {
            latitude: self.0,
            longitude: self.1,
        }
    }

    /// Great-circle distance in metres.
    pub fn distance_m(self, other: LatLon) -> f64 {
        haversine::distance(
            self.as_haversine(),
            other.as_haversine(),
            haversine::Units::Kilometers,
        ) * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = LatLon(32.9, -97.0333);
        assert!(p.distance_m(p).abs() < 1e-6);
    }

    #[test]
    fn test_one_degree_of_latitude_is_about_111_km() {
        let a = LatLon(32.0, -97.0);
        let b = LatLon(33.0, -97.0);
        let d = a.distance_m(b);
        assert!((d - 111_195.0).abs() < 500.0, "got {d}");
    }
}
