//! Growth-rate derivation for the manufacturer quarterly series.
//!
//! This is the one piece of non-trivial derivation in the crate: group by
//! manufacturer, sort each series by quarter ascending, then compute
//! quarter-over-quarter and year-over-year percentage change per record.
//!
//! Undefined ratios (no prior record, or a prior period with zero registrations)
//! resolve to 0 rather than NaN or an error, so downstream consumers stay total.
//! Growth is only ever computed against same-manufacturer history.

use crate::domain::{GrowthSource, ManufacturerGrowthRecord, ManufacturerQuarterRecord};

/// The year-over-year comparison looks exactly this many quarters back.
const YOY_LAG: usize = 4;

/// Resolve a growth input into the enriched table.
///
/// Pre-enriched files pass through untouched (ingest already sorted and deduped
/// them); raw files get both growth columns derived.
pub fn ensure_growth_columns(source: GrowthSource) -> Vec<ManufacturerGrowthRecord> {
    match source {
        GrowthSource::Enriched(records) => records,
        GrowthSource::Raw(records) => derive_growth(records),
    }
}

/// Derive `qoq_pct`/`yoy_pct` for a raw quarterly series.
///
/// Output ordering is deterministic: manufacturer ascending, quarter ascending.
pub fn derive_growth(mut records: Vec<ManufacturerQuarterRecord>) -> Vec<ManufacturerGrowthRecord> {
    records.sort_by(|a, b| {
        (a.manufacturer.as_str(), a.quarter).cmp(&(b.manufacturer.as_str(), b.quarter))
    });

    let mut out = Vec::with_capacity(records.len());
    let mut start = 0;
    while start < records.len() {
        let manufacturer = records[start].manufacturer.as_str();
        let mut end = start + 1;
        while end < records.len() && records[end].manufacturer == manufacturer {
            end += 1;
        }

        let series = &records[start..end];
        for (i, rec) in series.iter().enumerate() {
            let prev = i.checked_sub(1).map(|j| series[j].registrations);
            let prev_year = i.checked_sub(YOY_LAG).map(|j| series[j].registrations);
            out.push(ManufacturerGrowthRecord {
                manufacturer: rec.manufacturer.clone(),
                quarter: rec.quarter,
                registrations: rec.registrations,
                qoq_pct: pct_change(rec.registrations, prev),
                yoy_pct: pct_change(rec.registrations, prev_year),
            });
        }

        start = end;
    }

    out
}

/// Percentage change against a reference period; 0 when the reference is absent
/// or zero.
pub fn pct_change(current: u64, previous: Option<u64>) -> f64 {
    match previous {
        Some(prev) if prev > 0 => (current as f64 - prev as f64) / prev as f64 * 100.0,
        _ => 0.0,
    }
}
