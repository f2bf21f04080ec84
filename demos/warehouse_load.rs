//! Pulls one day of hourly observations for every station in the DFW region
//! and writes them to a CSV file ready for a warehouse load.
//!
//! cargo run --example warehouse_load -- 2022-01-01 2022-01-02 observations.csv

use dfw_weather::StationObservationFetcher;
use polars::prelude::{CsvWriter, SerWriter};
use std::env;
use std::error::Error;
use std::fs::File;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    configure_polars_display();

    let args: Vec<String> = env::args().skip(1).collect();
    let start = args.first().map(String::as_str).unwrap_or("2022-01-01");
    let end = args.get(1).map(String::as_str).unwrap_or("2022-01-02");
    let output = args.get(2).map(String::as_str).unwrap_or("observations.csv");

    let fetcher = StationObservationFetcher::builder()
        .start(start)
        .end(end)
        .build()?;

    let stations = fetcher.list_stations().await?;
    println!("{}", stations.to_dataframe()?);

    let mut observations = fetcher.fetch_observations().await?;
    println!("{}", observations);

    let file = File::create(output)?;
    CsvWriter::new(file).finish(&mut observations)?;
    println!("Wrote {} rows to {}", observations.height(), output);
    Ok(())
}

fn configure_polars_display() {
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
