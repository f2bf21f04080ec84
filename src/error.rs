use crate::climate_api::ClimateApiError;
use crate::stations::error::StationDirectoryError;
use crate::weather_data::error::WeatherDataError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(transparent)]
    WeatherData(#[from] WeatherDataError),

    #[error(transparent)]
    StationDirectory(#[from] StationDirectoryError),

    #[error(transparent)]
    ClimateApi(#[from] ClimateApiError),

    #[error("'{input}' is not an ISO-8601 date or date-time")]
    DateParse { input: String },

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}
