//! Hourly observations for the DFW region, either for the local station only
//! or for every station inside the search radius.

use crate::config::{RegionConfig, DEFAULT_MAX_CACHE_AGE, METEOSTAT_BULK_URL};
use crate::error::WeatherError;
use crate::stations::directory::StationDirectory;
use crate::stations::table::StationTable;
use crate::types::period::ObservationPeriod;
use crate::types::station_mode::StationMode;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use crate::weather_data::data_loader::HourlyDataLoader;
use crate::weather_data::schema::{observation_schema, time_dtype};
use bon::bon;
use log::{debug, info};
use polars::prelude::*;
use std::path::PathBuf;
use std::time::Duration;

/// Fetches hourly station observations for a fixed period.
///
/// # Examples
///
/// ```no_run
/// # use dfw_weather::{StationMode, StationObservationFetcher, WeatherError};
/// # async fn run() -> Result<(), WeatherError> {
/// let fetcher = StationObservationFetcher::builder()
///     .start("2022-01-01")
///     .end("2022-01-02")
///     .mode(StationMode::SingleStation)
///     .build()?;
/// let observations = fetcher.fetch_observations().await?;
/// println!("{}", observations.head(Some(5)));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StationObservationFetcher {
    period: ObservationPeriod,
    mode: StationMode,
    region: RegionConfig,
    bulk_url: String,
    cache_dir: PathBuf,
    max_cache_age: Duration,
}

#[bon]
impl StationObservationFetcher {
    /// Validates both dates and resolves the cache directory. No network access happens here.
    ///
    /// # Errors
    ///
    /// [`WeatherError::DateParse`] if `start` or `end` is not ISO-8601,
    /// [`WeatherError::CacheDirResolution`] if no `cache_dir` is given and the
    /// platform cache directory cannot be determined.
    #[builder]
    pub fn new(
        start: &str,
        end: &str,
        mode: Option<StationMode>,
        region: Option<RegionConfig>,
        bulk_url: Option<&str>,
        cache_dir: Option<PathBuf>,
        max_cache_age: Option<Duration>,
    ) -> Result<Self, WeatherError> {
        let period = ObservationPeriod::parse(start, end)?;
        let cache_dir = match cache_dir {
            Some(dir) => dir,
            None => get_cache_dir().map_err(WeatherError::CacheDirResolution)?,
        };

        Ok(Self {
            period,
            mode: mode.unwrap_or_default(),
            region: region.unwrap_or_default(),
            bulk_url: bulk_url.unwrap_or(METEOSTAT_BULK_URL).to_string(),
            cache_dir,
            max_cache_age: max_cache_age.unwrap_or(DEFAULT_MAX_CACHE_AGE),
        })
    }

    pub fn period(&self) -> ObservationPeriod {
        self.period
    }

    pub fn mode(&self) -> StationMode {
        self.mode
    }

    pub fn region(&self) -> &RegionConfig {
        &self.region
    }

    /// Every station within the region's radius of its centre, closest first.
    pub async fn list_stations(&self) -> Result<StationTable, WeatherError> {
        self.prepare_cache_dir().await?;
        let directory =
            StationDirectory::load(&self.cache_dir, &self.bulk_url, self.max_cache_age).await?;
        Ok(directory.nearby(self.region.center, self.region.radius_m))
    }

    /// Hourly observations with `start <= time < end` for the stations the mode selects.
    ///
    /// Stations are loaded one after another, in distance order for a regional
    /// fetch. A station without an hourly file contributes no rows.
    pub async fn fetch_observations(&self) -> Result<DataFrame, WeatherError> {
        let stations = match self.mode {
            StationMode::SingleStation => vec![self.region.local_station.clone()],
            StationMode::RegionalStations => self.list_stations().await?.ids(),
        };
        info!(
            "Fetching hourly observations for {} station(s) in {} mode",
            stations.len(),
            self.mode
        );

        self.prepare_cache_dir().await?;
        let loader = HourlyDataLoader::new(&self.cache_dir, &self.bulk_url, self.max_cache_age);

        let mut frames = Vec::with_capacity(stations.len());
        for station in &stations {
            match loader.get_frame(station).await? {
                Some(frame) => frames.push(frame),
                None => debug!("Skipping station {} without hourly data", station),
            }
        }

        if frames.is_empty() {
            return Ok(DataFrame::empty_with_schema(&observation_schema()));
        }

        let observations = concat(frames, UnionArgs::default())?
            .filter(self.period_filter())
            .collect()?;
        info!("Fetched {} observation rows", observations.height());
        Ok(observations)
    }

    fn period_filter(&self) -> Expr {
        let bound = |at: chrono::NaiveDateTime| {
            lit(at.and_utc().timestamp_millis()).cast(time_dtype())
        };
        col("time")
            .gt_eq(bound(self.period.start))
            .and(col("time").lt(bound(self.period.end)))
    }

    async fn prepare_cache_dir(&self) -> Result<(), WeatherError> {
        ensure_cache_dir_exists(&self.cache_dir)
            .await
            .map_err(|e| WeatherError::CacheDirCreation(self.cache_dir.clone(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DALLAS_STATION_ID;
    use crate::test_support::{gzip, hourly_csv, station, stations_json};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn station_ids(df: &DataFrame) -> PolarsResult<BTreeSet<String>> {
        Ok(df
            .column("station")?
            .as_materialized_series()
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect())
    }

    async fn mock_hourly(server: &mut mockito::ServerGuard, id: &str) -> mockito::Mock {
        let body = gzip(hourly_csv(day(2021, 12, 31), day(2022, 1, 2)).as_bytes()).await;
        server
            .mock("GET", format!("/hourly/{id}.csv.gz").as_str())
            .with_body(body)
            .create_async()
            .await
    }

    async fn mock_station_list(server: &mut mockito::ServerGuard) -> mockito::Mock {
        let stations = vec![
            station("72259", 32.9, -97.0333),
            station("72258", 32.85, -96.85),
            station("72249", 32.8333, -97.3),
            station("72357", 35.3833, -97.6),
            station("72243", 29.98, -95.36),
        ];
        let body = gzip(stations_json(&stations).as_bytes()).await;
        server
            .mock("GET", "/stations/lite.json.gz")
            .with_body(body)
            .create_async()
            .await
    }

    fn fetcher(
        server: &mockito::ServerGuard,
        cache: &tempfile::TempDir,
        mode: StationMode,
        start: &str,
        end: &str,
    ) -> Result<StationObservationFetcher, WeatherError> {
        StationObservationFetcher::builder()
            .start(start)
            .end(end)
            .mode(mode)
            .bulk_url(&server.url())
            .cache_dir(cache.path().join("cache"))
            .build()
    }

    #[tokio::test]
    async fn test_single_station_returns_one_day() -> Result<(), Box<dyn std::error::Error>> {
        let cache = tempfile::tempdir()?;
        let mut server = mockito::Server::new_async().await;
        let _hourly = mock_hourly(&mut server, DALLAS_STATION_ID).await;

        let fetcher = fetcher(&server, &cache, StationMode::SingleStation, "2022-01-01", "2022-01-02")?;
        let df = fetcher.fetch_observations().await?;

        assert_eq!(df.height(), 24);
        assert_eq!(station_ids(&df)?, BTreeSet::from([DALLAS_STATION_ID.to_string()]));

        let millis = df
            .column("time")?
            .as_materialized_series()
            .cast(&DataType::Int64)?;
        let millis = millis.i64()?;
        let start = fetcher.period().start.and_utc().timestamp_millis();
        let end = fetcher.period().end.and_utc().timestamp_millis();
        assert_eq!(millis.min(), Some(start));
        assert_eq!(millis.max(), Some(end - 3_600_000));
        Ok(())
    }

    #[tokio::test]
    async fn test_regional_stations_are_listed_stations() -> Result<(), Box<dyn std::error::Error>> {
        let cache = tempfile::tempdir()?;
        let mut server = mockito::Server::new_async().await;
        let _stations = mock_station_list(&mut server).await;
        let _dfw = mock_hourly(&mut server, "72259").await;
        let _love = mock_hourly(&mut server, "72258").await;
        let missing = server
            .mock("GET", "/hourly/72249.csv.gz")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let fetcher = fetcher(&server, &cache, StationMode::RegionalStations, "2022-01-01", "2022-01-02")?;
        let listed = fetcher.list_stations().await?;
        assert_eq!(listed.ids(), vec!["72259", "72258", "72249"]);

        let df = fetcher.fetch_observations().await?;
        let fetched = station_ids(&df)?;
        assert_eq!(fetched.len(), 2);
        assert!(fetched.iter().all(|id| listed.contains(id)));
        assert_eq!(df.height(), 48);
        missing.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_list_stations_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
        let cache = tempfile::tempdir()?;
        let mut server = mockito::Server::new_async().await;
        let _stations = mock_station_list(&mut server).await;

        let fetcher = fetcher(&server, &cache, StationMode::RegionalStations, "2022-01-01", "2022-01-02")?;
        let first = fetcher.list_stations().await?;
        let second = fetcher.list_stations().await?;
        assert_eq!(first, second);
        assert_eq!(first.to_dataframe()?.height(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_date_fails_before_network() -> Result<(), Box<dyn std::error::Error>> {
        let cache = tempfile::tempdir()?;
        let mut server = mockito::Server::new_async().await;
        let untouched = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = fetcher(&server, &cache, StationMode::SingleStation, "not-a-date", "2022-01-02")
            .unwrap_err();
        match err {
            WeatherError::DateParse { input } => assert_eq!(input, "not-a-date"),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(fetcher(&server, &cache, StationMode::SingleStation, "2022-01-01", "tomorrow").is_err());
        untouched.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_inverted_range_is_empty() -> Result<(), Box<dyn std::error::Error>> {
        let cache = tempfile::tempdir()?;
        let mut server = mockito::Server::new_async().await;
        let _hourly = mock_hourly(&mut server, DALLAS_STATION_ID).await;

        let fetcher = fetcher(&server, &cache, StationMode::SingleStation, "2022-01-02", "2022-01-01")?;
        let df = fetcher.fetch_observations().await?;
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), observation_schema().len());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_local_station_gives_empty_frame() -> Result<(), Box<dyn std::error::Error>> {
        let cache = tempfile::tempdir()?;
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("GET", "/hourly/72259.csv.gz")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = fetcher(&server, &cache, StationMode::SingleStation, "2022-01-01", "2022-01-02")?;
        let df = fetcher.fetch_observations().await?;
        assert_eq!(df.shape(), (0, observation_schema().len()));
        Ok(())
    }

    #[tokio::test]
    async fn test_custom_region_local_station() -> Result<(), Box<dyn std::error::Error>> {
        let cache = tempfile::tempdir()?;
        let mut server = mockito::Server::new_async().await;
        let _hourly = mock_hourly(&mut server, "72243").await;

        let region = RegionConfig {
            local_station: "72243".to_string(),
            ..RegionConfig::default()
        };
        let fetcher = StationObservationFetcher::builder()
            .start("2022-01-01T06:00:00")
            .end("2022-01-01T12:00:00")
            .mode(StationMode::SingleStation)
            .region(region)
            .bulk_url(&server.url())
            .cache_dir(cache.path().to_path_buf())
            .build()?;
        let df = fetcher.fetch_observations().await?;
        assert_eq!(df.height(), 6);
        assert_eq!(station_ids(&df)?, BTreeSet::from(["72243".to_string()]));
        Ok(())
    }

    #[tokio::test]
    #[ignore = "hits the live Meteostat bulk service"]
    async fn test_live_single_station_day() -> Result<(), WeatherError> {
        let fetcher = StationObservationFetcher::builder()
            .start("2022-01-01")
            .end("2022-01-02")
            .mode(StationMode::SingleStation)
            .build()?;
        let df = fetcher.fetch_observations().await?;
        assert_eq!(df.height(), 24);
        Ok(())
    }

    #[tokio::test]
    #[ignore = "hits the live Meteostat bulk service"]
    async fn test_live_regional_day() -> Result<(), WeatherError> {
        let fetcher = StationObservationFetcher::builder()
            .start("2022-01-01")
            .end("2022-01-02")
            .build()?;
        let listed = fetcher.list_stations().await?;
        let df = fetcher.fetch_observations().await?;
        let ids = df.column("station")?.as_materialized_series().unique()?;
        assert!(ids.len() > 1);
        for id in ids.str()?.into_iter().flatten() {
            assert!(listed.contains(id));
        }
        Ok(())
    }
}
