//! Synthetic demo dataset generation.
//!
//! Produces the four source CSVs for a fictional market so the tool can run
//! without a real Vahan export. Generation is deterministic for a given seed.
//!
//! The growth file is written *without* `qoq_pct`/`yoy_pct` columns on purpose:
//! a freshly generated dataset exercises the raw derivation path end to end.

use std::fs;
use std::io::Write;
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::snapshot::{
    CATEGORY_DETAIL_FILE, CATEGORY_GROWTH_FILE, MANUFACTURER_GROWTH_FILE,
    MANUFACTURER_QUARTERLY_FILE,
};
use crate::domain::{Bucket, CategoryYearRecord, ManufacturerQuarterRecord};
use crate::error::AppError;
use crate::metrics::growth::pct_change;

/// Fictional manufacturer pool; `SampleConfig::manufacturers` picks a prefix of it.
const MANUFACTURERS: [&str; 16] = [
    "Apex Motors",
    "Bharat Wheels",
    "Cityride",
    "Deccan Auto",
    "Everglide",
    "Falcon Two Wheelers",
    "Garuda Mobility",
    "Himalay Motors",
    "Indus EV",
    "Jyoti Autos",
    "Kaveri Motors",
    "Lotus Rides",
    "Meridian Auto",
    "Nimbus Scooters",
    "Orchid Vehicles",
    "Pinnacle Motors",
];

/// Raw category labels per bucket, as a real Vahan detail export would carry them.
const DETAIL_LABELS: [(Bucket, &[&str]); 3] = [
    (Bucket::TwoWheeler, &["TWO WHEELER (NT)", "TWO WHEELER (T)"]),
    (Bucket::ThreeWheeler, &["THREE WHEELER (T)"]),
    (Bucket::FourWheeler, &["LMV", "HMV"]),
];

/// Quarterly seasonality multipliers, Q1..Q4 (festive-season lift late in the year).
const SEASONALITY: [f64; 4] = [0.95, 1.0, 1.05, 1.15];

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub manufacturers: usize,
    pub quarters: usize,
    pub start_year: i32,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            manufacturers: 8,
            quarters: 12,
            start_year: 2021,
            seed: 42,
        }
    }
}

/// A generated dataset, mirroring the four source files.
#[derive(Debug, Clone)]
pub struct SampleDataset {
    pub category_growth: Vec<CategoryYearRecord>,
    /// (year, raw label, registrations) rows for the detail file.
    pub category_detail: Vec<(i32, String, u64)>,
    pub manufacturer_quarterly: Vec<ManufacturerQuarterRecord>,
}

/// Generate a synthetic dataset.
pub fn generate_dataset(config: &SampleConfig) -> Result<SampleDataset, AppError> {
    if config.manufacturers == 0 || config.manufacturers > MANUFACTURERS.len() {
        return Err(AppError::load(format!(
            "Manufacturer count must be between 1 and {}.",
            MANUFACTURERS.len()
        )));
    }
    if config.quarters == 0 || config.quarters > 80 {
        return Err(AppError::load("Quarter count must be between 1 and 80."));
    }
    if !(2000..=2100).contains(&config.start_year) {
        return Err(AppError::load("Start year must be between 2000 and 2100."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0_f64, 0.05_f64)
        .map_err(|e| AppError::internal(format!("Noise distribution error: {e}")))?;

    let mut quarterly = Vec::with_capacity(config.manufacturers * config.quarters);
    for name in &MANUFACTURERS[..config.manufacturers] {
        let base = rng.gen_range(5_000.0..200_000.0_f64);
        let trend = rng.gen_range(-0.03..0.05_f64);

        let mut level = base;
        for i in 0..config.quarters {
            let year = config.start_year + (i / 4) as i32;
            let q = (i % 4) as u32 + 1;
            let season = SEASONALITY[(q - 1) as usize];
            let wobble = noise.sample(&mut rng).exp();
            let registrations = (level * season * wobble).round().max(0.0) as u64;

            quarterly.push(ManufacturerQuarterRecord {
                manufacturer: name.to_string(),
                quarter: chrono::NaiveDate::from_ymd_opt(year, (q - 1) * 3 + 1, 1)
                    .ok_or_else(|| AppError::internal("Quarter date out of range."))?,
                registrations,
            });

            level *= 1.0 + trend;
        }
    }
    quarterly.sort_by(|a, b| {
        (a.manufacturer.as_str(), a.quarter).cmp(&(b.manufacturer.as_str(), b.quarter))
    });

    let years: Vec<i32> = {
        let last_year = config.start_year + ((config.quarters - 1) / 4) as i32;
        (config.start_year..=last_year).collect()
    };

    let mut category_growth = Vec::new();
    let mut category_detail = Vec::new();
    for &(bucket, labels) in &DETAIL_LABELS {
        let mut level: f64 = match bucket {
            Bucket::TwoWheeler => rng.gen_range(1_000_000.0..5_000_000.0),
            Bucket::ThreeWheeler => rng.gen_range(50_000.0..200_000.0),
            Bucket::FourWheeler => rng.gen_range(500_000.0..2_000_000.0),
        };
        let mut prev: Option<u64> = None;

        for &year in &years {
            let growth = rng.gen_range(-0.08..0.18_f64);
            let registrations = level.round().max(0.0) as u64;
            let yoy_pct = prev.map(|p| pct_change(registrations, Some(p)));

            category_growth.push(CategoryYearRecord {
                year,
                bucket,
                registrations,
                yoy_pct,
            });

            // Split the bucket total across its raw labels for the detail file.
            let mut remaining = registrations;
            for (j, label) in labels.iter().enumerate() {
                let share = if j + 1 == labels.len() {
                    remaining
                } else {
                    let frac = rng.gen_range(0.3..0.7);
                    (remaining as f64 * frac).round() as u64
                };
                category_detail.push((year, label.to_string(), share));
                remaining = remaining.saturating_sub(share);
            }

            prev = Some(registrations);
            level *= 1.0 + growth;
        }
    }
    category_growth.sort_by(|a, b| (a.year, a.bucket).cmp(&(b.year, b.bucket)));

    Ok(SampleDataset {
        category_growth,
        category_detail,
        manufacturer_quarterly: quarterly,
    })
}

/// Write a generated dataset as the four source CSVs.
///
/// Column names match a real export (`Manufacturer`, `Quarter`, `Quarterly_Sales`)
/// so the canonical-schema renaming in ingest is exercised too.
pub fn write_dataset(dir: &Path, dataset: &SampleDataset) -> Result<(), AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::load(format!("Failed to create '{}': {e}", dir.display())))?;

    let mut file = create(dir, CATEGORY_GROWTH_FILE)?;
    writeln!(file, "year,bucket,registrations,yoy_pct").map_err(|e| write_error(dir, e))?;
    for r in &dataset.category_growth {
        let yoy = r.yoy_pct.map(|v| format!("{v:.2}")).unwrap_or_default();
        writeln!(
            file,
            "{},{},{},{}",
            r.year,
            r.bucket.display_name(),
            r.registrations,
            yoy
        )
        .map_err(|e| write_error(dir, e))?;
    }

    let mut file = create(dir, CATEGORY_DETAIL_FILE)?;
    writeln!(file, "year,category,registrations").map_err(|e| write_error(dir, e))?;
    for (year, label, registrations) in &dataset.category_detail {
        writeln!(file, "{year},{label},{registrations}").map_err(|e| write_error(dir, e))?;
    }

    for name in [MANUFACTURER_QUARTERLY_FILE, MANUFACTURER_GROWTH_FILE] {
        let mut file = create(dir, name)?;
        writeln!(file, "Manufacturer,Quarter,Quarterly_Sales").map_err(|e| write_error(dir, e))?;
        for r in &dataset.manufacturer_quarterly {
            writeln!(file, "{},{},{}", r.manufacturer, r.quarter, r.registrations)
                .map_err(|e| write_error(dir, e))?;
        }
    }

    Ok(())
}

fn create(dir: &Path, name: &str) -> Result<fs::File, AppError> {
    let path = dir.join(name);
    fs::File::create(&path)
        .map_err(|e| AppError::load(format!("Failed to create '{}': {e}", path.display())))
}

fn write_error(dir: &Path, e: std::io::Error) -> AppError {
    AppError::load(format!("Failed to write sample CSV in '{}': {e}", dir.display()))
}
