//! Property directory.
//!
//! The dataset is loaded once at startup into an ordered list and queried by
//! street address. Lookup is a first-match scan in file order, not a ranking:
//! the first record whose words are (nearly) all contained in the query wins.

use crate::logging::OperationTimer;
use crate::metrics;
use crate::models::PropertyRecord;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Number of comma-separated fields in a dataset row
pub const FIELD_COUNT: usize = 10;

/// How dataset rows are split into fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Quoted fields may contain commas, doubled quotes and newlines
    #[default]
    Rfc4180,
    /// Split each line on every comma, then trim surrounding quotes.
    /// A quoted field containing a comma is split in two.
    Naive,
}

impl FromStr for ParseMode {
    type Err = crate::error::DoorknockError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "rfc4180" => Ok(Self::Rfc4180),
            "naive" => Ok(Self::Naive),
            other => Err(crate::error::DoorknockError::InvalidConfig(format!("unknown dataset parser: {other}"))),
        }
    }
}

/// Dataset parsing options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Row splitter
    pub mode: ParseMode,
    /// Substituted for numeric fields that do not parse
    pub numeric_default: i64,
}

/// Ordered, immutable list of property records
#[derive(Debug, Clone, Default)]
pub struct PropertyDirectory {
    records: Vec<PropertyRecord>,
}

impl PropertyDirectory {
    /// Load the dataset at `path`.
    ///
    /// A missing or unreadable file falls back to the embedded sample rows.
    /// Malformed rows are skipped without error.
    pub fn load(path: &Path, options: ParseOptions) -> Self {
        let timer = OperationTimer::new("load_property_directory");
        let directory = match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_csv_str(&contents, options),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "Property dataset not found, using sample records");
                Self::sample()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read property dataset, using sample records");
                Self::sample()
            }
        };
        timer.finish();
        info!("Loaded {} property records", directory.len());
        directory
    }

    /// Parse dataset text: a header line followed by one property per row
    #[must_use]
    pub fn from_csv_str(contents: &str, options: ParseOptions) -> Self {
        let rows = match options.mode {
            ParseMode::Naive => naive_rows(contents),
            ParseMode::Rfc4180 => rfc4180_rows(contents),
        };

        let records = rows
            .iter()
            .filter_map(|fields| build_record(fields, options.numeric_default))
            .collect();
        Self { records }
    }

    /// Build a directory from records already in memory
    #[must_use]
    pub fn from_records(records: Vec<PropertyRecord>) -> Self {
        Self { records }
    }

    /// The five records used when no dataset ships with the app
    #[must_use]
    pub fn sample() -> Self {
        Self::from_csv_str(SAMPLE_DATASET, ParseOptions::default())
    }

    /// Records in file order
    #[must_use]
    pub fn records(&self) -> &[PropertyRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find the property at `query`.
    ///
    /// A case-insensitive exact match wins outright. Otherwise the first
    /// record (in file order) for which all but at most one of its address
    /// words contains, or is contained in, some word of the query is returned.
    #[must_use]
    pub fn find_property(&self, query: &str) -> Option<&PropertyRecord> {
        let query = query.to_lowercase();
        let found = self
            .records
            .iter()
            .find(|record| record.address.to_lowercase() == query)
            .or_else(|| {
                let query_words: Vec<&str> = query.split_whitespace().collect();
                self.records
                    .iter()
                    .find(|record| words_match(&record.address.to_lowercase(), &query_words))
            });

        debug!(query = %query, found = found.is_some(), "Property lookup");
        metrics::record_property_lookup(found.is_some());
        found
    }
}

fn words_match(address: &str, query_words: &[&str]) -> bool {
    let address_words: Vec<&str> = address.split_whitespace().collect();
    let matching = address_words
        .iter()
        .filter(|word| query_words.iter().any(|q| word.contains(q) || q.contains(*word)))
        .count();
    matching >= address_words.len().saturating_sub(1).max(1)
}

fn naive_rows(contents: &str) -> Vec<Vec<String>> {
    contents
        .lines()
        .skip(1)
        .map(|line| line.split(',').map(|field| field.trim_matches('"').to_string()).collect())
        .collect()
}

fn rfc4180_rows(contents: &str) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => rows.push(record.iter().map(str::to_string).collect()),
            Err(e) => debug!(error = %e, "Skipping unreadable dataset row"),
        }
    }
    rows
}

fn build_record(fields: &[String], numeric_default: i64) -> Option<PropertyRecord> {
    if fields.len() < FIELD_COUNT {
        return None;
    }

    let text = |i: usize| fields[i].trim().trim_matches('"').trim().to_string();
    let int = |i: usize| fields[i].trim().trim_matches('"').trim().parse::<i64>().unwrap_or(numeric_default);

    let address = text(0);
    let owner_name = text(1);
    if address.is_empty() || owner_name.is_empty() {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let bathrooms = fields[3]
        .trim()
        .trim_matches('"')
        .trim()
        .parse::<f64>()
        .unwrap_or(numeric_default as f64);

    Some(PropertyRecord {
        address,
        owner_name,
        bedrooms: int(2),
        bathrooms,
        year_built: int(4),
        square_feet: int(5),
        lot_size: text(6),
        years_owned: int(7),
        sale_price: int(8),
        sale_date: text(9),
    })
}

const SAMPLE_DATASET: &str = "\
Address,Owner Name,Bedrooms,Bathrooms,Year Built,Square Feet,Lot Size,Years Owned,Sale Price,Sale Date
123 Main St,John Smith,3,2,1995,1850,0.25 acres,8,285000,2016-05-14
456 Oak Ave,Maria Garcia,4,2.5,2004,2400,0.33 acres,12,342000,2012-08-30
789 Pine Rd,Robert Johnson,2,1,1978,1100,0.15 acres,21,98000,2003-03-11
321 Elm St,Linda Williams,5,3.5,2015,3600,0.5 acres,4,565000,2020-11-02
654 Maple Dr,David Brown,3,2,1988,1720,0.2 acres,15,189000,2009-06-19
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_has_five_records() {
        let directory = PropertyDirectory::sample();
        assert_eq!(directory.len(), 5);
        assert_eq!(directory.records()[0].address, "123 Main St");
        assert!((directory.records()[1].bathrooms - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_words_match_threshold() {
        assert!(words_match("123 main st", &["123", "main", "street"]));
        assert!(words_match("123 main st", &["123", "main"]));
        assert!(!words_match("123 main st", &["123"]));
        assert!(!words_match("main", &["oak"]));
        assert!(!words_match("123 main st", &[]));
    }

    #[test]
    fn test_parse_mode_from_str() {
        assert_eq!("naive".parse::<ParseMode>().unwrap(), ParseMode::Naive);
        assert!("tsv".parse::<ParseMode>().is_err());
    }
}
