use crate::types::station::Station;
use polars::prelude::*;

/// A station together with its distance to the search centre.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStation {
    pub station: Station,
    pub distance_m: f64,
}

/// Result of a radius search, closest station first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationTable {
    entries: Vec<NearbyStation>,
}

impl StationTable {
    pub(crate) fn new(entries: Vec<NearbyStation>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NearbyStation> {
        self.entries.iter()
    }

    pub fn get(&self, id: &str) -> Option<&NearbyStation> {
        self.entries.iter().find(|entry| entry.station.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Station identifiers in distance order.
    pub fn ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.station.id.clone())
            .collect()
    }

    /// Flattens the table into a `DataFrame` keyed by the `id` column, one row
    /// per station, in distance order. `distance` is in metres.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let stations = || self.entries.iter().map(|entry| &entry.station);

        df!(
            "id" => stations().map(|s| s.id.clone()).collect::<Vec<_>>(),
            "name" => stations().map(|s| s.display_name().to_string()).collect::<Vec<_>>(),
            "country" => stations().map(|s| s.country.clone()).collect::<Vec<_>>(),
            "region" => stations().map(|s| s.region.clone()).collect::<Vec<_>>(),
            "wmo" => stations().map(|s| s.identifiers.wmo.clone()).collect::<Vec<_>>(),
            "icao" => stations().map(|s| s.identifiers.icao.clone()).collect::<Vec<_>>(),
            "latitude" => stations().map(|s| s.location.latitude).collect::<Vec<_>>(),
            "longitude" => stations().map(|s| s.location.longitude).collect::<Vec<_>>(),
            "elevation" => stations().map(|s| s.location.elevation).collect::<Vec<_>>(),
            "timezone" => stations().map(|s| s.timezone.clone()).collect::<Vec<_>>(),
            "hourly_start" => stations().map(|s| s.inventory.hourly.start).collect::<Vec<_>>(),
            "hourly_end" => stations().map(|s| s.inventory.hourly.end).collect::<Vec<_>>(),
            "daily_start" => stations().map(|s| s.inventory.daily.start).collect::<Vec<_>>(),
            "daily_end" => stations().map(|s| s.inventory.daily.end).collect::<Vec<_>>(),
            "monthly_start" => stations().map(|s| s.inventory.monthly.start).collect::<Vec<_>>(),
            "monthly_end" => stations().map(|s| s.inventory.monthly.end).collect::<Vec<_>>(),
            "distance" => self.entries.iter().map(|e| e.distance_m).collect::<Vec<_>>(),
        )
    }
}

impl IntoIterator for StationTable {
    type Item = NearbyStation;
    type IntoIter = std::vec::IntoIter<NearbyStation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
