mod climate_api;
mod config;
mod error;
mod observation_fetcher;
mod stations;
mod types;
mod utils;
mod weather_data;

#[cfg(test)]
mod test_support;

pub use error::WeatherError;
pub use observation_fetcher::StationObservationFetcher;

pub use climate_api::{ClimateApiError, ClimateApiRequester, DEFAULT_NCEI_STATION};

pub use config::{
    RegionConfig, DALLAS_STATION_ID, DEFAULT_MAX_CACHE_AGE, DFW_CENTER, DFW_RADIUS_METERS,
    METEOSTAT_BULK_URL, NCEI_DATA_URL,
};

pub use types::lat_lon::LatLon;
pub use types::period::{parse_iso_datetime, ObservationPeriod};
pub use types::station::*;
pub use types::station_mode::StationMode;

pub use stations::directory::StationDirectory;
pub use stations::error::StationDirectoryError;
pub use stations::table::{NearbyStation, StationTable};

pub use weather_data::data_loader::HourlyDataLoader;
pub use weather_data::error::WeatherDataError;
pub use weather_data::schema::{observation_columns, MEASUREMENT_COLUMNS};

pub use utils::get_cache_dir;
