//! Fixed invocation parameters: the search region, the local station, and the
//! upstream endpoints. Everything here has a DFW default and can be overridden
//! at construction time.

use crate::types::lat_lon::LatLon;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Meteostat bulk data host.
pub const METEOSTAT_BULK_URL: &str = "https://bulk.meteostat.net/v2";

/// NOAA NCEI data access service.
pub const NCEI_DATA_URL: &str = "https://www.ncei.noaa.gov/access/services/data/v1";

/// Centre of the DFW / southern Oklahoma search area.
pub const DFW_CENTER: LatLon = LatLon(32.9, -97.0333);

/// Radius around [`DFW_CENTER`] covering the metro area and southern Oklahoma.
pub const DFW_RADIUS_METERS: f64 = 196_126.868_894_258;

/// Dallas/Fort Worth International Airport.
pub const DALLAS_STATION_ID: &str = "72259";

/// Upstream files younger than this are served from the local cache.
pub const DEFAULT_MAX_CACHE_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// The region a regional fetch covers, plus the station used in single-station mode.
///
/// Deserializable so a caller can keep the region in a JSON file:
///
/// ```
/// use dfw_weather::{LatLon, RegionConfig};
///
/// let region: RegionConfig = serde_json::from_str(
///     r#"{"center": [29.98, -95.36], "radius_m": 50000.0, "local_station": "72243"}"#,
/// ).unwrap();
/// assert_eq!(region.center, LatLon(29.98, -95.36));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub center: LatLon,
    pub radius_m: f64,
    pub local_station: String,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            center: DFW_CENTER,
            radius_m: DFW_RADIUS_METERS,
            local_station: DALLAS_STATION_ID.to_string(),
        }
    }
}
