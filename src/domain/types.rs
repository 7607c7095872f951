//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during derivation and querying
//! - exported to JSON/CSV
//! - reloaded later for comparisons across data drops

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Coarse vehicle-category grouping.
///
/// Raw Vahan category labels are free-form ("TWO WHEELER (NT)", "LMV", ...), so the
/// bucket is derived heuristically at load time via [`Bucket::from_label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
pub enum Bucket {
    #[serde(rename = "2W")]
    #[value(name = "2w")]
    TwoWheeler,
    #[serde(rename = "3W")]
    #[value(name = "3w")]
    ThreeWheeler,
    #[serde(rename = "4W")]
    #[value(name = "4w")]
    FourWheeler,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::TwoWheeler, Bucket::ThreeWheeler, Bucket::FourWheeler];

    /// Human-readable label for terminal output and CSV columns.
    pub fn display_name(self) -> &'static str {
        match self {
            Bucket::TwoWheeler => "2W",
            Bucket::ThreeWheeler => "3W",
            Bucket::FourWheeler => "4W",
        }
    }

    /// Map a raw category label onto a bucket.
    ///
    /// Rules (case-insensitive, after trimming):
    /// - `2W` / labels starting with `TWO WHEELER` -> 2W
    /// - `3W` / labels starting with `THREE WHEELER` -> 3W
    /// - `4W` / LMV / MMV / HMV / `LIGHT ...` / `MEDIUM ...` / `HEAVY ...` -> 4W
    ///
    /// Anything else is unrecognized and handled as a row-level error upstream.
    pub fn from_label(label: &str) -> Option<Bucket> {
        let label = label.trim().to_ascii_uppercase();
        if label == "2W" || label.starts_with("TWO WHEELER") {
            return Some(Bucket::TwoWheeler);
        }
        if label == "3W" || label.starts_with("THREE WHEELER") {
            return Some(Bucket::ThreeWheeler);
        }
        if label == "4W"
            || label.starts_with("LMV")
            || label.starts_with("MMV")
            || label.starts_with("HMV")
            || label.starts_with("LIGHT")
            || label.starts_with("MEDIUM")
            || label.starts_with("HEAVY")
        {
            return Some(Bucket::FourWheeler);
        }
        None
    }
}

/// One annual observation per (year, bucket).
///
/// `yoy_pct` is optional because the source file may omit the growth column; the
/// annual series is never re-derived here (the category file is annual-only, so a
/// quarter-over-quarter figure is not computable from it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryYearRecord {
    pub year: i32,
    pub bucket: Bucket,
    pub registrations: u64,
    pub yoy_pct: Option<f64>,
}

/// One quarterly observation per (manufacturer, quarter).
///
/// `quarter` is normalized to the first day of the calendar quarter; ordering by
/// quarter within a manufacturer is significant for derivative computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerQuarterRecord {
    pub manufacturer: String,
    pub quarter: NaiveDate,
    pub registrations: u64,
}

/// A quarterly observation enriched with growth rates.
///
/// `qoq_pct` compares against the immediately preceding quarter for the same
/// manufacturer; `yoy_pct` against the record exactly 4 quarters prior. Both are 0
/// when the reference period is absent or had zero registrations, so downstream
/// consumers never see NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerGrowthRecord {
    pub manufacturer: String,
    pub quarter: NaiveDate,
    pub registrations: u64,
    pub qoq_pct: f64,
    pub yoy_pct: f64,
}

/// Common accessors shared by the two quarterly record shapes, so filters and
/// aggregations work over either table.
pub trait QuarterKeyed {
    fn manufacturer(&self) -> &str;
    fn quarter(&self) -> NaiveDate;
    fn registrations(&self) -> u64;
}

impl QuarterKeyed for ManufacturerQuarterRecord {
    fn manufacturer(&self) -> &str {
        &self.manufacturer
    }
    fn quarter(&self) -> NaiveDate {
        self.quarter
    }
    fn registrations(&self) -> u64 {
        self.registrations
    }
}

impl QuarterKeyed for ManufacturerGrowthRecord {
    fn manufacturer(&self) -> &str {
        &self.manufacturer
    }
    fn quarter(&self) -> NaiveDate {
        self.quarter
    }
    fn registrations(&self) -> u64 {
        self.registrations
    }
}

/// The manufacturer growth input, resolved once at load time.
///
/// `Raw` means the source file only carried registrations and the growth columns
/// must be derived; `Enriched` means the file already had `qoq_pct`/`yoy_pct`.
/// Queries never re-check column presence.
#[derive(Debug, Clone)]
pub enum GrowthSource {
    Raw(Vec<ManufacturerQuarterRecord>),
    Enriched(Vec<ManufacturerGrowthRecord>),
}

/// The category detail file verbatim: arbitrary columns, not used in derivation.
#[derive(Debug, Clone, Default)]
pub struct DetailTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DetailTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A user-selected view over the loaded tables.
///
/// Empty selection vectors are pass-throughs (everything matches); `None` bounds are
/// unbounded. This mirrors the dashboard filter widgets: manufacturer multi-select,
/// quarter range, bucket multi-select.
#[derive(Debug, Clone, Default)]
pub struct ViewFilter {
    pub manufacturers: Vec<String>,
    pub start_quarter: Option<NaiveDate>,
    pub end_quarter: Option<NaiveDate>,
    pub buckets: Vec<Bucket>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_from_label_heuristics() {
        assert_eq!(Bucket::from_label("TWO WHEELER (NT)"), Some(Bucket::TwoWheeler));
        assert_eq!(Bucket::from_label("three wheeler (t)"), Some(Bucket::ThreeWheeler));
        assert_eq!(Bucket::from_label("LMV"), Some(Bucket::FourWheeler));
        assert_eq!(Bucket::from_label(" HMV "), Some(Bucket::FourWheeler));
        assert_eq!(Bucket::from_label("Heavy Goods Vehicle"), Some(Bucket::FourWheeler));
        assert_eq!(Bucket::from_label("2w"), Some(Bucket::TwoWheeler));
        assert_eq!(Bucket::from_label("TRACTOR"), None);
    }
}
