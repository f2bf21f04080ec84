//! Raw requests against the NOAA NCEI data access service (`global-hourly` dataset).

use crate::config::NCEI_DATA_URL;
use crate::types::period::parse_iso_datetime;
use bon::bon;
use chrono::NaiveDateTime;
use log::{info, warn};
use reqwest::Client;
use thiserror::Error;
use url::Url;

/// Dallas Love Field in the NCEI station numbering (USAF + WBAN).
pub const DEFAULT_NCEI_STATION: &str = "72258013960";

const NCEI_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Error)]
pub enum ClimateApiError {
    #[error("'{input}' is not an ISO-8601 date or date-time")]
    DateParse { input: String },

    #[error("start date {start} is after end date {end}")]
    InvertedRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("at least one station is required")]
    NoStations,

    #[error("Failed to build NCEI request URL")]
    Url(#[from] url::ParseError),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),
}

/// A single `global-hourly` request for a date range and a set of stations.
#[derive(Debug, Clone)]
pub struct ClimateApiRequester {
    url: Url,
    client: Client,
}

#[bon]
impl ClimateApiRequester {
    /// Builds the request URL. Both dates are required and `start_date` must
    /// not be after `end_date`; `stations` defaults to [`DEFAULT_NCEI_STATION`].
    ///
    /// ```
    /// use dfw_weather::ClimateApiRequester;
    ///
    /// let request = ClimateApiRequester::builder()
    ///     .start_date("2022-11-01T00:00:00")
    ///     .end_date("2022-11-02")
    ///     .build()?;
    /// assert_eq!(
    ///     request.url().as_str(),
    ///     "https://www.ncei.noaa.gov/access/services/data/v1?dataset=global-hourly\
    ///      &startDate=2022-11-01T00%3A00%3A00&endDate=2022-11-02T00%3A00%3A00\
    ///      &stations=72258013960&units=standard&format=json"
    /// );
    /// # Ok::<(), dfw_weather::ClimateApiError>(())
    /// ```
    #[builder]
    pub fn new(
        start_date: &str,
        end_date: &str,
        stations: Option<Vec<String>>,
        base_url: Option<&str>,
    ) -> Result<Self, ClimateApiError> {
        let parse = |input: &str| {
            parse_iso_datetime(input).ok_or_else(|| ClimateApiError::DateParse {
                input: input.to_string(),
            })
        };
        let start = parse(start_date)?;
        let end = parse(end_date)?;
        if start > end {
            return Err(ClimateApiError::InvertedRange { start, end });
        }

        let stations = stations.unwrap_or_else(|| vec![DEFAULT_NCEI_STATION.to_string()]);
        if stations.is_empty() {
            return Err(ClimateApiError::NoStations);
        }

        let mut url = Url::parse(base_url.unwrap_or(NCEI_DATA_URL))?;
        url.query_pairs_mut()
            .append_pair("dataset", "global-hourly")
            .append_pair("startDate", &start.format(NCEI_DATE_FORMAT).to_string())
            .append_pair("endDate", &end.format(NCEI_DATE_FORMAT).to_string())
            .append_pair("stations", &stations.join(","))
            .append_pair("units", "standard")
            .append_pair("format", "json");

        Ok(Self {
            url,
            client: Client::new(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Sends the request and returns the body as-is. A non-success status is
    /// logged, not turned into an error.
    pub async fn fetch_raw(&self) -> Result<String, ClimateApiError> {
        info!("Requesting {}", self.url);
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| ClimateApiError::NetworkRequest(self.url.to_string(), e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("NCEI responded with {} for {}", status, self.url);
        }

        response
            .text()
            .await
            .map_err(|e| ClimateApiError::NetworkRequest(self.url.to_string(), e))
    }

    /// Fetches the response and writes it to stdout.
    pub async fn print_response(&self) -> Result<(), ClimateApiError> {
        let body = self.fetch_raw().await?;
        println!("{}", body);
        Ok(())
    }
}
