use crate::stations::error::StationDirectoryError;
use crate::stations::table::{NearbyStation, StationTable};
use crate::types::lat_lon::LatLon;
use crate::types::station::Station;
use crate::utils::is_cache_fresh;
use async_compression::tokio::bufread::GzipDecoder;
use bincode::config::{Configuration, Fixint, LittleEndian};
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use reqwest::Client;
use rstar::{PointDistance, RTree};
use std::cmp::Ordering;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, BufReader};
use tokio_util::io::StreamReader;

const STATIONS_PATH: &str = "stations/lite.json.gz";
const BINCODE_CACHE_FILE_NAME: &str = "stations_lite.bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

// Lower bounds on the length of one degree, so the degree-space search box
// never cuts off a station that is inside the haversine radius.
const MIN_KM_PER_LAT_DEGREE: f64 = 110.0;
const MIN_KM_PER_LON_DEGREE_AT_EQUATOR: f64 = 111.0;

/// The Meteostat station list, spatially indexed for radius searches.
#[derive(Debug, Clone)]
pub struct StationDirectory {
    rtree: RTree<Station>,
}

impl StationDirectory {
    /// Loads the station list from the bincode cache in `cache_dir`, or
    /// downloads it from `{bulk_url}/stations/lite.json.gz` when the cache is
    /// missing, older than `max_age` or cannot be decoded.
    pub async fn load(
        cache_dir: &Path,
        bulk_url: &str,
        max_age: Duration,
    ) -> Result<Self, StationDirectoryError> {
        let cache_file = cache_dir.join(BINCODE_CACHE_FILE_NAME);

        let fresh = is_cache_fresh(&cache_file, max_age)
            .await
            .map_err(|e| StationDirectoryError::CacheMetadataRead(cache_file.clone(), e))?;

        let cached = if fresh {
            let path_clone = cache_file.clone();
            match tokio::task::spawn_blocking(move || Self::get_cached_stations(&path_clone)).await? {
                Ok(stations) => Some(stations),
                Err(e) => {
                    warn!("Discarding unreadable station cache: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let stations = match cached {
            Some(stations) => stations,
            None => {
                let url = format!("{}/{}", bulk_url.trim_end_matches('/'), STATIONS_PATH);
                info!("Station cache missing, stale or unreadable, fetching {}", url);
                let stations = Self::fetch_stations(&url).await?;
                Self::cache_stations(stations.clone(), cache_dir, &cache_file).await?;
                stations
            }
        };

        Ok(Self::from_stations(stations))
    }

    pub fn from_stations(stations: Vec<Station>) -> Self {
        Self {
            rtree: RTree::bulk_load(stations),
        }
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    /// All stations whose great-circle distance to `center` is at most
    /// `radius_m` metres, closest first.
    pub fn nearby(&self, center: LatLon, radius_m: f64) -> StationTable {
        if radius_m < 0.0 || radius_m.is_nan() {
            return StationTable::default();
        }
        let query_point = [center.latitude(), center.longitude()];
        let bound_2 = Self::degree_bound(center, radius_m / 1000.0).powi(2);

        let mut entries: Vec<NearbyStation> = self
            .rtree
            .nearest_neighbor_iter(&query_point)
            .take_while(|station| station.distance_2(&query_point) <= bound_2)
            .filter_map(|station| {
                let station_location =
                    LatLon(station.location.latitude, station.location.longitude);
                let distance_m = center.distance_m(station_location);
                (distance_m <= radius_m).then(|| NearbyStation {
                    station: station.to_owned(),
                    distance_m,
                })
            })
            .collect();

        entries.sort_by(|a, b| {
            a.distance_m
                .partial_cmp(&b.distance_m)
                .unwrap_or(Ordering::Equal)
        });
        debug!(
            "Found {} stations within {:.0} m of {:?}",
            entries.len(),
            radius_m,
            center
        );
        StationTable::new(entries)
    }

    /// Planar distance in degrees that no station within `radius_km` can exceed.
    fn degree_bound(center: LatLon, radius_km: f64) -> f64 {
        let lat_deg = radius_km / MIN_KM_PER_LAT_DEGREE;
        let worst_lat = (center.latitude().abs() + lat_deg).min(90.0);
        let cos = worst_lat.to_radians().cos();
        let lon_deg = if cos <= f64::EPSILON {
            360.0
        } else {
            (radius_km / (MIN_KM_PER_LON_DEGREE_AT_EQUATOR * cos)).min(360.0)
        };
        (lat_deg * lat_deg + lon_deg * lon_deg).sqrt()
    }

    fn get_cached_stations(cache_path: &Path) -> Result<Vec<Station>, StationDirectoryError> {
        let bytes = std::fs::read(cache_path)
            .map_err(|e| StationDirectoryError::CacheRead(cache_path.to_path_buf(), e))?;
        let (decoded_stations, _) =
            bincode::serde::decode_from_slice::<Vec<Station>, _>(&bytes, BINCODE_CONFIG).map_err(
                |e| StationDirectoryError::CacheDecode(cache_path.to_path_buf(), Box::from(e)),
            )?;
        Ok(decoded_stations)
    }

    async fn fetch_stations(url: &str) -> Result<Vec<Station>, StationDirectoryError> {
        let client = Client::new();
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| StationDirectoryError::NetworkRequest(url.to_string(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match e.status() {
                    Some(status) => StationDirectoryError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    },
                    None => StationDirectoryError::NetworkRequest(url.to_string(), e),
                });
            }
        };
        let stream = response.bytes_stream().map_err(io::Error::other);
        let stream_reader = StreamReader::new(stream);
        let gzip_decoder = GzipDecoder::new(BufReader::new(stream_reader));
        let mut decoder_reader = BufReader::new(gzip_decoder);
        let mut decompressed_json = Vec::new();
        decoder_reader.read_to_end(&mut decompressed_json).await?;

        let parse_start = Instant::now();
        let stations = tokio::task::spawn_blocking(move || {
            serde_json::from_slice::<Vec<Station>>(&decompressed_json)
                .map_err(StationDirectoryError::from)
        })
        .await??;
        info!(
            "Parsed {} stations from JSON in {:?}",
            stations.len(),
            parse_start.elapsed()
        );
        Ok(stations)
    }

    /// Written to a temporary file in `cache_dir` and renamed into place.
    async fn cache_stations(
        stations: Vec<Station>,
        cache_dir: &Path,
        cache_path: &Path,
    ) -> Result<(), StationDirectoryError> {
        let cache_start = Instant::now();
        let dir = cache_dir.to_path_buf();
        let path = cache_path.to_path_buf();
        let written = tokio::task::spawn_blocking(move || {
            let bincode_data = bincode::serde::encode_to_vec(stations, BINCODE_CONFIG)
                .map_err(|e| StationDirectoryError::CacheEncode(Box::new(e)))?;
            let write_err = |e| StationDirectoryError::CacheWrite(path.clone(), e);
            let mut temp_file = NamedTempFile::new_in(&dir).map_err(write_err)?;
            temp_file.write_all(&bincode_data).map_err(write_err)?;
            temp_file
                .persist(&path)
                .map_err(|e| StationDirectoryError::CacheWrite(path.clone(), e.error))?;
            Ok::<usize, StationDirectoryError>(bincode_data.len())
        })
        .await??;
        info!(
            "Wrote station cache ({} bytes) to {} in {:?}",
            written,
            cache_path.display(),
            cache_start.elapsed()
        );
        Ok(())
    }
}
