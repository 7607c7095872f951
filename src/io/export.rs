//! Export derived results.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts: a flat CSV of the enriched growth table, and a JSON document of the
//! computed summary for machine consumers.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::ManufacturerGrowthRecord;
use crate::error::AppError;
use crate::report::{Insights, Kpis};

/// Write the enriched manufacturer growth table to a CSV file.
pub fn write_growth_csv(path: &Path, records: &[ManufacturerGrowthRecord]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::load(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "manufacturer,quarter,registrations,qoq_pct,yoy_pct")
        .map_err(|e| AppError::load(format!("Failed to write export CSV header: {e}")))?;

    for r in records {
        writeln!(
            file,
            "{},{},{},{:.2},{:.2}",
            r.manufacturer, r.quarter, r.registrations, r.qoq_pct, r.yoy_pct
        )
        .map_err(|e| AppError::load(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// The machine-readable form of a summary run.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryDocument {
    pub kpis: Kpis,
    pub insights: Insights,
}

/// Write a summary document as pretty JSON.
pub fn write_summary_json<W: Write>(writer: W, document: &SummaryDocument) -> Result<(), AppError> {
    serde_json::to_writer_pretty(writer, document)
        .map_err(|e| AppError::internal(format!("Failed to serialize summary JSON: {e}")))
}
