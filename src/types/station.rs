//! Meteostat weather station metadata as published in the bulk station list,
//! plus the `rstar` glue that lets stations live in an R-tree.

use chrono::NaiveDate;
use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single weather station from the Meteostat station list.
///
/// Field names follow the camelCase keys of `stations/lite.json.gz`. Keys the
/// crate has no use for (model and normals inventory) are ignored on decode.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// Meteostat station identifier, e.g. "72259" for Dallas/Fort Worth Airport.
    pub id: String,
    /// ISO country code, e.g. "US".
    pub country: String,
    /// Region code (state, province), if known.
    pub region: Option<String>,
    /// IANA timezone name, if known.
    pub timezone: Option<String>,
    /// Station names keyed by language code.
    pub name: HashMap<String, String>,
    pub identifiers: Identifiers,
    pub location: Location,
    pub inventory: Inventory,
}

impl Station {
    /// English name if present, otherwise any name, otherwise the id.
    pub fn display_name(&self) -> &str {
        self.name
            .get("en")
            .or_else(|| self.name.values().next())
            .map(String::as_str)
            .unwrap_or(&self.id)
    }
}

/// Reported data availability per frequency. Gaps inside a span are possible.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Inventory {
    pub hourly: DateSpan,
    pub daily: DateSpan,
    pub monthly: YearSpan,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DateSpan {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct YearSpan {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Identifiers {
    pub national: Option<String>,
    pub wmo: Option<String>,
    pub icao: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above sea level.
    pub elevation: Option<i32>,
}

impl RTreeObject for Station {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.latitude, self.location.longitude])
    }
}

impl PointDistance for Station {
    /// Squared planar distance in degree space, `[lat, lon]` order.
    ///
    /// Only used to order the R-tree walk; real distances are haversine.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.location.latitude - point[0];
        let dy = self.location.longitude - point[1];
        dx * dx + dy * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DFW_JSON: &str = r#"{
        "id": "72259",
        "country": "US",
        "region": "TX",
        "timezone": "America/Chicago",
        "name": {"en": "Dallas / Fort Worth Airport", "de": "Dallas / Fort Worth Flughafen"},
        "identifiers": {"national": null, "wmo": "72259", "icao": "KDFW"},
        "location": {"latitude": 32.9, "longitude": -97.0333, "elevation": 171},
        "inventory": {
            "model": {"start": "2005-01-01", "end": "2024-05-01"},
            "hourly": {"start": "1941-01-01", "end": "2024-04-29"},
            "daily": {"start": "1941-01-01", "end": "2024-04-29"},
            "monthly": {"start": 1941, "end": 2023},
            "normals": {"start": 1991, "end": 2020}
        }
    }"#;

    #[test]
    fn test_decode_station_ignores_unused_inventory_keys() -> Result<(), serde_json::Error> {
        let station: Station = serde_json::from_str(DFW_JSON)?;
        assert_eq!(station.id, "72259");
        assert_eq!(station.identifiers.icao.as_deref(), Some("KDFW"));
        assert_eq!(station.location.elevation, Some(171));
        assert_eq!(
            station.inventory.hourly.start,
            NaiveDate::from_ymd_opt(1941, 1, 1)
        );
        assert_eq!(station.inventory.monthly.end, Some(2023));
        assert_eq!(station.display_name(), "Dallas / Fort Worth Airport");
        Ok(())
    }

    #[test]
    fn test_display_name_falls_back_to_id() -> Result<(), serde_json::Error> {
        let mut station: Station = serde_json::from_str(DFW_JSON)?;
        station.name.clear();
        assert_eq!(station.display_name(), "72259");
        Ok(())
    }

    #[test]
    fn test_distance_2_is_planar_squared() -> Result<(), serde_json::Error> {
        let station: Station = serde_json::from_str(DFW_JSON)?;
        let d2 = station.distance_2(&[32.9 + 3.0, -97.0333 + 4.0]);
        assert!((d2 - 25.0).abs() < 1e-9);
        Ok(())
    }
}
