//! The immutable loaded snapshot.
//!
//! All four tables are read and derived exactly once per load; every query takes
//! `&Snapshot` and allocates its own output, so the loaded state is never mutated
//! in place. `reload()` produces a brand-new snapshot from the same paths.

use std::path::{Path, PathBuf};

use crate::domain::{
    CategoryYearRecord, DetailTable, GrowthSource, ManufacturerGrowthRecord,
    ManufacturerQuarterRecord,
};
use crate::error::AppError;
use crate::io::ingest::{self, IngestReport};
use crate::metrics::growth::ensure_growth_columns;

pub const CATEGORY_GROWTH_FILE: &str = "category_year_bucketed_growth.csv";
pub const CATEGORY_DETAIL_FILE: &str = "category_year_detail.csv";
pub const MANUFACTURER_QUARTERLY_FILE: &str = "manufacturer_quarterly.csv";
pub const MANUFACTURER_GROWTH_FILE: &str = "manufacturer_quarterly_growth.csv";

/// Locations of the four source files.
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub category_growth: PathBuf,
    pub category_detail: PathBuf,
    pub manufacturer_quarterly: PathBuf,
    pub manufacturer_growth: PathBuf,
}

impl SourcePaths {
    /// Standard file names inside a data directory.
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            category_growth: dir.join(CATEGORY_GROWTH_FILE),
            category_detail: dir.join(CATEGORY_DETAIL_FILE),
            manufacturer_quarterly: dir.join(MANUFACTURER_QUARTERLY_FILE),
            manufacturer_growth: dir.join(MANUFACTURER_GROWTH_FILE),
        }
    }

    /// Resolve the data directory from `VAHAN_DATA_DIR` (via `.env` if present),
    /// falling back to the current directory.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let dir = std::env::var("VAHAN_DATA_DIR").unwrap_or_else(|_| ".".to_string());
        Self::from_dir(Path::new(&dir))
    }
}

/// Per-table ingest diagnostics kept alongside the loaded tables.
#[derive(Debug, Clone, Default)]
pub struct IngestReports {
    pub category_growth: IngestReport,
    pub category_detail: IngestReport,
    pub manufacturer_quarterly: IngestReport,
    pub manufacturer_growth: IngestReport,
}

impl IngestReports {
    pub fn total_row_errors(&self) -> usize {
        self.category_growth.row_errors.len()
            + self.category_detail.row_errors.len()
            + self.manufacturer_quarterly.row_errors.len()
            + self.manufacturer_growth.row_errors.len()
    }
}

/// A fully loaded and derived copy of all input tables at a point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub category_growth: Vec<CategoryYearRecord>,
    pub category_detail: DetailTable,
    pub manufacturer_quarterly: Vec<ManufacturerQuarterRecord>,
    pub manufacturer_growth: Vec<ManufacturerGrowthRecord>,
    /// Whether the growth file already carried its growth columns.
    pub growth_was_enriched: bool,
    pub reports: IngestReports,
    paths: SourcePaths,
}

impl Snapshot {
    /// Read all four sources and derive missing growth columns.
    pub fn load(paths: SourcePaths) -> Result<Self, AppError> {
        let (category_growth, category_growth_report) =
            ingest::read_category_growth(&paths.category_growth)?;
        let (category_detail, category_detail_report) =
            ingest::read_category_detail(&paths.category_detail)?;
        let (manufacturer_quarterly, manufacturer_quarterly_report) =
            ingest::read_manufacturer_quarterly(&paths.manufacturer_quarterly)?;
        let (growth_source, manufacturer_growth_report) =
            ingest::read_growth_source(&paths.manufacturer_growth)?;

        let growth_was_enriched = matches!(growth_source, GrowthSource::Enriched(_));
        let manufacturer_growth = ensure_growth_columns(growth_source);

        Ok(Self {
            category_growth,
            category_detail,
            manufacturer_quarterly,
            manufacturer_growth,
            growth_was_enriched,
            reports: IngestReports {
                category_growth: category_growth_report,
                category_detail: category_detail_report,
                manufacturer_quarterly: manufacturer_quarterly_report,
                manufacturer_growth: manufacturer_growth_report,
            },
            paths,
        })
    }

    /// Re-read the same sources into a fresh snapshot; `self` is left untouched.
    pub fn reload(&self) -> Result<Self, AppError> {
        Self::load(self.paths.clone())
    }

    pub fn paths(&self) -> &SourcePaths {
        &self.paths
    }

    /// Distinct manufacturers in the quarterly table, sorted.
    pub fn manufacturers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .manufacturer_quarterly
            .iter()
            .map(|r| r.manufacturer.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixture_dir(name: &str, growth_csv: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vahan-metrics-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(CATEGORY_GROWTH_FILE),
            "year,bucket,registrations,yoy_pct\n2022,2W,900,\n2023,2W,1000,11.11\n2023,LMV,500,-5.0\n",
        )
        .unwrap();
        fs::write(
            dir.join(CATEGORY_DETAIL_FILE),
            "year,category,registrations\n2023,TWO WHEELER (NT),1000\n",
        )
        .unwrap();
        fs::write(
            dir.join(MANUFACTURER_QUARTERLY_FILE),
            "Manufacturer,Quarter,Quarterly_Sales\nAcme,2023-Q1,100\nAcme,2023-Q2,110\nZenith,2023-Q1,50\n",
        )
        .unwrap();
        fs::write(dir.join(MANUFACTURER_GROWTH_FILE), growth_csv).unwrap();
        dir
    }

    #[test]
    fn load_derives_growth_from_a_raw_file() {
        let dir = write_fixture_dir(
            "raw",
            "Manufacturer,Quarter,Quarterly_Sales\nAcme,2023-Q1,100\nAcme,2023-Q2,110\n",
        );

        let snapshot = Snapshot::load(SourcePaths::from_dir(&dir)).unwrap();
        assert!(!snapshot.growth_was_enriched);
        assert_eq!(snapshot.manufacturer_growth.len(), 2);
        assert!((snapshot.manufacturer_growth[1].qoq_pct - 10.0).abs() < 1e-9);

        assert_eq!(snapshot.category_growth.len(), 3);
        assert_eq!(snapshot.category_detail.row_count(), 1);
        assert_eq!(snapshot.manufacturers(), vec!["Acme".to_string(), "Zenith".to_string()]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_passes_an_enriched_file_through() {
        let dir = write_fixture_dir(
            "enriched",
            "Manufacturer,Quarter,Quarterly_Sales,qoq_pct,yoy_pct\nAcme,2023-Q1,100,2.5,7.0\n",
        );

        let snapshot = Snapshot::load(SourcePaths::from_dir(&dir)).unwrap();
        assert!(snapshot.growth_was_enriched);
        assert!((snapshot.manufacturer_growth[0].qoq_pct - 2.5).abs() < 1e-12);
        assert!((snapshot.manufacturer_growth[0].yoy_pct - 7.0).abs() < 1e-12);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_fails_on_a_missing_file() {
        let dir = std::env::temp_dir().join(format!("vahan-metrics-{}-missing", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let err = Snapshot::load(SourcePaths::from_dir(&dir)).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn reload_produces_a_fresh_snapshot() {
        let dir = write_fixture_dir(
            "reload",
            "Manufacturer,Quarter,Quarterly_Sales\nAcme,2023-Q1,100\n",
        );

        let snapshot = Snapshot::load(SourcePaths::from_dir(&dir)).unwrap();
        fs::write(
            dir.join(MANUFACTURER_QUARTERLY_FILE),
            "Manufacturer,Quarter,Quarterly_Sales\nAcme,2023-Q1,100\nAcme,2023-Q2,120\n",
        )
        .unwrap();

        let reloaded = snapshot.reload().unwrap();
        assert_eq!(snapshot.manufacturer_quarterly.len(), 1);
        assert_eq!(reloaded.manufacturer_quarterly.len(), 2);

        fs::remove_dir_all(&dir).ok();
    }
}
