//! Prints the raw NCEI `global-hourly` JSON for Dallas Love Field.

use dfw_weather::{ClimateApiError, ClimateApiRequester};

#[tokio::main]
async fn main() -> Result<(), ClimateApiError> {
    env_logger::init();

    let request = ClimateApiRequester::builder()
        .start_date("2022-11-01T00:00:00")
        .end_date("2022-11-02T00:00:00")
        .build()?;
    eprintln!("GET {}", request.url());
    request.print_response().await
}
