//! Hourly observations for the Dallas/Fort Worth airport station only, as
//! input for a single-city prediction model.

use dfw_weather::{StationMode, StationObservationFetcher, WeatherError};
use std::env;

#[tokio::main]
async fn main() -> Result<(), WeatherError> {
    env_logger::init();

    // Locality flag, "Dallas" unless given; an empty argument means a regional fetch.
    let flag = env::args()
        .nth(1)
        .unwrap_or_else(|| StationMode::DALLAS_FLAG.to_string());
    let mode = StationMode::from_locality_flag(Some(&flag));

    let observations = StationObservationFetcher::builder()
        .start("2022-01-01")
        .end("2022-01-08")
        .mode(mode)
        .build()?
        .fetch_observations()
        .await?;

    println!("{} mode, {} rows", mode, observations.height());
    println!("{}", observations.tail(Some(24)));
    Ok(())
}
