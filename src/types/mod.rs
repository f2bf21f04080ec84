pub mod lat_lon;
pub mod period;
pub mod station;
pub mod station_mode;
