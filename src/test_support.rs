//! Fixtures shared by the unit tests.

use crate::types::station::{DateSpan, Identifiers, Inventory, Location, Station, YearSpan};
use async_compression::tokio::write::GzipEncoder;
use chrono::NaiveDate;
use std::collections::HashMap;
use tokio::io::AsyncWriteExt;

pub(crate) fn station(id: &str, latitude: f64, longitude: f64) -> Station {
    let span = DateSpan {
        start: NaiveDate::from_ymd_opt(2000, 1, 1),
        end: NaiveDate::from_ymd_opt(2024, 12, 31),
    };
    Station {
        id: id.to_string(),
        country: "US".to_string(),
        region: Some("TX".to_string()),
        timezone: Some("America/Chicago".to_string()),
        name: HashMap::from([("en".to_string(), format!("Station {id}"))]),
        identifiers: Identifiers {
            national: None,
            wmo: Some(id.to_string()),
            icao: None,
        },
        location: Location {
            latitude,
            longitude,
            elevation: Some(150),
        },
        inventory: Inventory {
            hourly: span.clone(),
            daily: span,
            monthly: YearSpan {
                start: Some(2000),
                end: Some(2024),
            },
        },
    }
}

pub(crate) fn stations_json(stations: &[Station]) -> String {
    serde_json::to_string(stations).expect("stations serialize")
}

pub(crate) async fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzipEncoder::new(Vec::new());
    encoder.write_all(bytes).await.expect("gzip write");
    encoder.shutdown().await.expect("gzip finish");
    encoder.into_inner()
}

/// Meteostat-style hourly CSV rows (no header) for every hour from
/// `first_day` 00:00 through `last_day` 23:00.
pub(crate) fn hourly_csv(first_day: NaiveDate, last_day: NaiveDate) -> String {
    let mut csv = String::new();
    let mut day = first_day;
    while day <= last_day {
        for hour in 0..24 {
            csv.push_str(&format!(
                "{},{},{:.1},3.1,64,0.0,,170,11.2,,1021.3,,2\n",
                day.format("%Y-%m-%d"),
                hour,
                5.0 + hour as f64 / 2.0
            ));
        }
        day = day.succ_opt().expect("date in range");
    }
    csv
}
