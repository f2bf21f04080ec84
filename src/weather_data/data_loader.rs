use crate::utils::is_cache_fresh;
use crate::weather_data::error::WeatherDataError;
use crate::weather_data::schema::{normalise_hourly, raw_hourly_schema, RAW_COLUMN_COUNT};
use async_compression::tokio::bufread::GzipDecoder;
use futures_util::TryStreamExt;
use log::{info, warn};
use polars::prelude::*;
use reqwest::{Client, StatusCode};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;
use tokio::{fs, task};
use tokio_util::io::StreamReader;

const CACHE_FILE_PREFIX: &str = "hourly-";

/// Downloads, normalises and caches Meteostat hourly bulk files, one station at a time.
pub struct HourlyDataLoader {
    cache_dir: PathBuf,
    bulk_url: String,
    max_age: Duration,
    download_client: Client,
}

impl HourlyDataLoader {
    pub fn new(cache_dir: &Path, bulk_url: &str, max_age: Duration) -> HourlyDataLoader {
        HourlyDataLoader {
            cache_dir: cache_dir.to_path_buf(),
            bulk_url: bulk_url.trim_end_matches('/').to_string(),
            max_age,
            download_client: Client::new(),
        }
    }

    pub fn cache_path(&self, station: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}{}.parquet", CACHE_FILE_PREFIX, station))
    }

    /// Returns the full hourly record of `station` as observation rows.
    ///
    /// `Ok(None)` means Meteostat has no hourly file for the station (HTTP 404);
    /// such stations contribute nothing to a multi-station fetch.
    pub async fn get_frame(&self, station: &str) -> Result<Option<LazyFrame>, WeatherDataError> {
        let parquet_path = self.cache_path(station);

        let fresh = is_cache_fresh(&parquet_path, self.max_age)
            .await
            .map_err(|e| WeatherDataError::CacheMetadataRead(parquet_path.clone(), e))?;

        if fresh && Self::cache_is_readable(&parquet_path).await {
            info!("Cache hit for hourly data of station {} at {:?}", station, parquet_path);
        } else {
            info!("Cache miss for hourly data of station {}, downloading", station);
            let Some(raw_bytes) = self.download(station).await? else {
                return Ok(None);
            };
            let df = Self::csv_to_dataframe(raw_bytes, station).await?;

            fs::create_dir_all(&self.cache_dir)
                .await
                .map_err(|e| WeatherDataError::CacheDirCreation(self.cache_dir.clone(), e))?;

            Self::cache_dataframe(df, &self.cache_dir, &parquet_path).await?;
            info!("Cached hourly data for station {} to {:?}", station, parquet_path);
        }

        LazyFrame::scan_parquet(&parquet_path, Default::default())
            .map(Some)
            .map_err(|e| WeatherDataError::ParquetScan(parquet_path.clone(), e))
    }

    /// Downloads and decompresses the hourly file for a station. `None` on 404.
    async fn download(&self, station: &str) -> Result<Option<Vec<u8>>, WeatherDataError> {
        let url = format!("{}/hourly/{}.csv.gz", self.bulk_url, station);
        info!("Downloading data from {}", url);

        let response = self
            .download_client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherDataError::NetworkRequest(url.clone(), e))?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!("No hourly data for station {} ({} returned 404)", station, url);
            return Ok(None);
        }

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(match e.status() {
                    Some(status) => WeatherDataError::HttpStatus {
                        url,
                        status,
                        source: e,
                    },
                    None => WeatherDataError::NetworkRequest(url, e),
                });
            }
        };

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let stream_reader = StreamReader::new(stream);
        let mut decoder = GzipDecoder::new(stream_reader);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .await
            .map_err(WeatherDataError::DownloadIo)?;
        info!(
            "Downloaded and decompressed {} bytes for station {}",
            decompressed.len(),
            station
        );
        Ok(Some(decompressed))
    }

    /// Parses raw header-less CSV bytes into observation rows on a blocking task.
    async fn csv_to_dataframe(bytes: Vec<u8>, station: &str) -> Result<DataFrame, WeatherDataError> {
        let station_owned = station.to_string();

        task::spawn_blocking(move || {
            // The schema reader would null-pad short rows.
            if let Some(found) = mismatched_field_count(&bytes) {
                warn!(
                    "CSV column count ({}) does not match schema length ({}) for station {}",
                    found, RAW_COLUMN_COUNT, station_owned
                );
                return Err(WeatherDataError::SchemaMismatch {
                    station: station_owned,
                    expected: RAW_COLUMN_COUNT,
                    found,
                });
            }

            let io_err = |source| WeatherDataError::CsvReadIo {
                station: station_owned.clone(),
                source,
            };
            let mut temp_file = NamedTempFile::new().map_err(io_err)?;
            temp_file.write_all(&bytes).map_err(io_err)?;
            temp_file.flush().map_err(io_err)?;

            let polars_err = |source| WeatherDataError::CsvReadPolars {
                station: station_owned.clone(),
                source,
            };
            let df = CsvReadOptions::default()
                .with_has_header(false)
                .with_schema(Some(Arc::new(raw_hourly_schema())))
                .try_into_reader_with_file_path(Some(temp_file.path().to_path_buf()))
                .map_err(polars_err)?
                .finish()
                .map_err(polars_err)?;

            normalise_hourly(df.lazy(), &station_owned)
                .collect()
                .map_err(|source| WeatherDataError::Normalise {
                    station: station_owned.clone(),
                    source,
                })
        })
        .await?
    }

    /// Writes a DataFrame to a Snappy parquet file on a blocking task.
    ///
    /// Written to a temporary file in `cache_dir` and renamed into place.
    async fn cache_dataframe(
        mut df: DataFrame,
        cache_dir: &Path,
        path: &Path,
    ) -> Result<(), WeatherDataError> {
        let dir = cache_dir.to_path_buf();
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || {
            let mut temp_file = NamedTempFile::new_in(&dir)
                .map_err(|e| WeatherDataError::ParquetWriteIo(path_buf.clone(), e))?;
            ParquetWriter::new(temp_file.as_file_mut())
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|e| WeatherDataError::ParquetWritePolars(path_buf.clone(), e))?;
            temp_file
                .persist(&path_buf)
                .map_err(|e| WeatherDataError::ParquetWriteIo(path_buf, e.error))?;
            Ok::<(), WeatherDataError>(())
        })
        .await??;
        Ok(())
    }

    /// Whether the parquet footer of a cache file can be read.
    async fn cache_is_readable(path: &Path) -> bool {
        let path_buf = path.to_path_buf();
        let readable = task::spawn_blocking(move || {
            let file = std::fs::File::open(&path_buf).map_err(PolarsError::from)?;
            ParquetReader::new(file).schema().map(|_| ())
        })
        .await;
        match readable {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("Discarding unreadable cache file {:?}: {}", path, e);
                false
            }
            Err(e) => {
                warn!("Could not check cache file {:?}: {}", path, e);
                false
            }
        }
    }
}

/// Field count of the first non-empty row that does not have [`RAW_COLUMN_COUNT`] fields.
fn mismatched_field_count(csv: &[u8]) -> Option<usize> {
    csv.split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(|line| line.iter().filter(|&&b| b == b',').count() + 1)
        .find(|&fields| fields != RAW_COLUMN_COUNT)
}
