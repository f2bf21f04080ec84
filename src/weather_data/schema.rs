//! Column layout of Meteostat hourly bulk files and of the observation tables
//! this crate hands out.

use polars::prelude::*;

/// Measurement columns, in file order, after `date` and `hour`.
pub const MEASUREMENT_COLUMNS: [&str; 11] = [
    "temp", "dwpt", "rhum", "prcp", "snow", "wdir", "wspd", "wpgt", "pres", "tsun", "coco",
];

/// Number of columns in a raw hourly CSV row.
pub const RAW_COLUMN_COUNT: usize = MEASUREMENT_COLUMNS.len() + 2;

/// Schema used to read the header-less hourly CSV.
///
/// Every measurement is read as Float64 so that stations whose files leave a
/// column entirely empty still concatenate with the rest.
pub fn raw_hourly_schema() -> Schema {
    let mut fields = vec![
        Field::new("date".into(), DataType::String),
        Field::new("hour".into(), DataType::Int64),
    ];
    fields.extend(
        MEASUREMENT_COLUMNS
            .iter()
            .map(|name| Field::new((*name).into(), DataType::Float64)),
    );
    Schema::from_iter(fields)
}

/// `station`, `time`, then the measurements.
pub fn observation_columns() -> Vec<&'static str> {
    let mut columns = vec!["station", "time"];
    columns.extend(MEASUREMENT_COLUMNS);
    columns
}

pub fn time_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, None)
}

/// Schema of the observation tables, used for empty results.
pub fn observation_schema() -> Schema {
    let mut fields = vec![
        Field::new("station".into(), DataType::String),
        Field::new("time".into(), time_dtype()),
    ];
    fields.extend(
        MEASUREMENT_COLUMNS
            .iter()
            .map(|name| Field::new((*name).into(), DataType::Float64)),
    );
    Schema::from_iter(fields)
}

/// Turns a raw hourly frame into observation rows for `station`: adds the
/// station id, folds `date` and `hour` into a single `time` column.
pub fn normalise_hourly(frame: LazyFrame, station: &str) -> LazyFrame {
    const MS_PER_DAY: i64 = 86_400_000;
    const MS_PER_HOUR: i64 = 3_600_000;

    let date = col("date").str().to_date(StrptimeOptions {
        format: Some("%Y-%m-%d".into()),
        ..Default::default()
    });
    let time = (date.cast(DataType::Int64) * lit(MS_PER_DAY)
        + col("hour").cast(DataType::Int64) * lit(MS_PER_HOUR))
    .cast(time_dtype());

    frame
        .with_columns([lit(station).alias("station"), time.alias("time")])
        .select(
            observation_columns()
                .into_iter()
                .map(col)
                .collect::<Vec<_>>(),
        )
}
