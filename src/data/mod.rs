// src/data/mod.rs
use serde::{de, Deserialize, Deserializer, Serialize};
use std::io::Read;
use thiserror::Error;
use tracing::{debug, instrument};

/// Columns the loader needs; anything else in the file is ignored.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Year",
    "Month",
    "Vehicle_Type",
    "Automobile_Sales",
    "Advertising_Expenditure",
    "unemployment_rate",
    "Recession",
];

#[derive(Debug, Error)]
pub enum DataError {
    #[error("CSV header error: {0}")]
    Header(#[source] csv::Error),

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("CSV parse error at record {record}: {source}")]
    Record {
        record: usize,
        #[source]
        source: csv::Error,
    },

    #[error("dataset contains no records")]
    Empty,
}

/// One row of the historical automobile sales table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Vehicle_Type")]
    pub vehicle_type: String,
    #[serde(rename = "Automobile_Sales")]
    pub automobile_sales: f64,
    #[serde(rename = "Advertising_Expenditure")]
    pub advertising_expenditure: f64,
    #[serde(rename = "unemployment_rate")]
    pub unemployment_rate: f64,
    #[serde(rename = "Recession", deserialize_with = "deserialize_flag")]
    pub recession: bool,
}

/// Accepts `0`/`1`, `0.0`/`1.0` and `true`/`false`; any non-zero number is true.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| de::Error::custom(format!("invalid recession flag {:?}", raw)))
}

fn parse_flag(raw: &str) -> Option<bool> {
    let s = raw.trim();
    match s.to_ascii_lowercase().as_str() {
        "true" => return Some(true),
        "false" => return Some(false),
        _ => {}
    }
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v != 0.0)
}

/// Read-only, in-memory sales table.
#[derive(Debug, Clone, Default)]
pub struct SalesTable {
    records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn from_csv_str(text: &str) -> Result<Self, DataError> {
        Self::from_reader(text.as_bytes())
    }

    /// Parse a headed CSV. The first bad row aborts the load.
    #[instrument(level = "debug", skip(reader))]
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = rdr.headers().map_err(DataError::Header)?.clone();
        for col in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == *col) {
                return Err(DataError::MissingColumn(col.to_string()));
            }
        }

        let mut records = Vec::new();
        for (idx, result) in rdr.deserialize::<SalesRecord>().enumerate() {
            let record = result.map_err(|source| DataError::Record {
                record: idx + 1,
                source,
            })?;
            records.push(record);
        }

        if records.is_empty() {
            return Err(DataError::Empty);
        }
        debug!(rows = records.len(), "parsed sales table");
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn recession_rows(&self) -> Vec<&SalesRecord> {
        self.records.iter().filter(|r| r.recession).collect()
    }

    pub fn year_rows(&self, year: i32) -> Vec<&SalesRecord> {
        self.records.iter().filter(|r| r.year == year).collect()
    }

    /// Sorted, de-duplicated years present in the table.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}
