use serde::{Deserialize, Serialize};
use std::fmt;

/// Which stations an observation fetch covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StationMode {
    /// Only the region's local station, for single-city prediction input.
    SingleStation,
    /// Every station within the region's radius, for a warehouse load.
    #[default]
    RegionalStations,
}

impl StationMode {
    /// The locality flag that selects single-station mode.
    pub const DALLAS_FLAG: &'static str = "Dallas";

    /// Maps the legacy optional locality flag onto a mode.
    ///
    /// Any non-empty flag selects [`StationMode::SingleStation`], not just
    /// [`Self::DALLAS_FLAG`]; an absent or empty flag selects
    /// [`StationMode::RegionalStations`].
    ///
    /// ```
    /// use dfw_weather::StationMode;
    ///
    /// assert_eq!(StationMode::from_locality_flag(Some("Dallas")), StationMode::SingleStation);
    /// assert_eq!(StationMode::from_locality_flag(None), StationMode::RegionalStations);
    /// ```
    pub fn from_locality_flag(flag: Option<&str>) -> Self {
        match flag {
            Some(value) if !value.is_empty() => StationMode::SingleStation,
            _ => StationMode::RegionalStations,
        }
    }
}

impl fmt::Display for StationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationMode::SingleStation => write!(f, "single-station"),
            StationMode::RegionalStations => write!(f, "regional-stations"),
        }
    }
}
