//! CSV ingest and normalization.
//!
//! This module turns the four dashboard source files into clean, typed tables that
//! are safe to derive and query.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (fixed parse formats, stable output ordering)
//! - **Separation of concerns**: no growth derivation here

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;

use crate::domain::{
    Bucket, CategoryYearRecord, DetailTable, GrowthSource, ManufacturerGrowthRecord,
    ManufacturerQuarterRecord, QuarterKeyed,
};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub key: Option<String>,
    pub message: String,
}

/// Per-table ingest diagnostics.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: Vec<RowError>,
}

/// Read the annual category growth table.
///
/// Required columns: `year`, `bucket`, `registrations`. `yoy_pct` is optional and
/// kept as-is when present (the annual series is not re-derived).
pub fn read_category_growth(path: &Path) -> Result<(Vec<CategoryYearRecord>, IngestReport), AppError> {
    let mut reader = open_reader(path)?;
    let header_map = header_map_for(&mut reader, path)?;

    for col in ["year", "bucket", "registrations"] {
        if !header_map.contains_key(col) {
            return Err(AppError::load(format!(
                "'{}': missing required column `{col}`",
                path.display()
            )));
        }
    }

    let mut records = Vec::new();
    let mut report = IngestReport::default();
    let mut seen: HashSet<(i32, Bucket)> = HashSet::new();

    for_each_record(&mut reader, &mut report, |line, record, report| {
        match parse_category_row(record, &header_map) {
            Ok(rec) => {
                if seen.insert((rec.year, rec.bucket)) {
                    records.push(rec);
                } else {
                    report.row_errors.push(RowError {
                        line,
                        key: Some(format!("{} {}", rec.year, rec.bucket.display_name())),
                        message: "Duplicate (year, bucket) row.".to_string(),
                    });
                }
            }
            Err(message) => report.row_errors.push(RowError {
                line,
                key: None,
                message,
            }),
        }
    });

    ensure_not_all_rejected(path, &report)?;
    records.sort_by(|a, b| (a.year, a.bucket).cmp(&(b.year, b.bucket)));
    report.rows_used = records.len();
    Ok((records, report))
}

/// Read the annual category detail table verbatim.
///
/// The file has arbitrary columns and takes no part in derivation, so the only
/// fatal condition is an unreadable file.
pub fn read_category_detail(path: &Path) -> Result<(DetailTable, IngestReport), AppError> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|e| AppError::load(format!("'{}': failed to read CSV headers: {e}", path.display())))?
        .iter()
        .map(|h| normalize_header_name(h))
        .collect();

    let mut table = DetailTable {
        headers,
        rows: Vec::new(),
    };
    let mut report = IngestReport::default();

    for_each_record(&mut reader, &mut report, |_, record, _| {
        table.rows.push(record.iter().map(str::to_string).collect());
    });

    report.rows_used = table.rows.len();
    Ok((table, report))
}

/// Read the manufacturer quarterly table onto the canonical
/// `{manufacturer, quarter, registrations}` schema.
pub fn read_manufacturer_quarterly(
    path: &Path,
) -> Result<(Vec<ManufacturerQuarterRecord>, IngestReport), AppError> {
    let mut reader = open_reader(path)?;
    let header_map = header_map_for(&mut reader, path)?;
    let columns = resolve_quarterly_columns(path, &header_map)?;

    let mut records = Vec::new();
    let mut report = IngestReport::default();
    let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();

    for_each_record(&mut reader, &mut report, |line, record, report| {
        match parse_quarterly_row(record, &columns) {
            Ok(rec) => push_deduped(rec, &mut records, &mut seen, line, report),
            Err(message) => report.row_errors.push(RowError {
                line,
                key: None,
                message,
            }),
        }
    });

    ensure_not_all_rejected(path, &report)?;
    sort_quarterly(&mut records);
    report.rows_used = records.len();
    Ok((records, report))
}

/// Read the manufacturer growth table, resolving raw-vs-enriched exactly once.
///
/// When both `qoq_pct` and `yoy_pct` columns are present the file is pre-enriched
/// and passes through; otherwise the registrations series is returned raw for
/// derivation. A partial pair (only one of the two columns) counts as raw.
pub fn read_growth_source(path: &Path) -> Result<(GrowthSource, IngestReport), AppError> {
    let mut reader = open_reader(path)?;
    let header_map = header_map_for(&mut reader, path)?;
    let columns = resolve_quarterly_columns(path, &header_map)?;

    let enriched = header_map.contains_key("qoq_pct") && header_map.contains_key("yoy_pct");
    let mut report = IngestReport::default();

    if enriched {
        let qoq_idx = header_map["qoq_pct"];
        let yoy_idx = header_map["yoy_pct"];
        let mut records: Vec<ManufacturerGrowthRecord> = Vec::new();
        let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();

        for_each_record(&mut reader, &mut report, |line, record, report| {
            match parse_quarterly_row(record, &columns) {
                Ok(rec) => {
                    // Blank or malformed growth cells collapse to 0, matching the
                    // zero-fill policy of the derivation path.
                    let qoq_pct = parse_opt_f64(record.get(qoq_idx)).unwrap_or(0.0);
                    let yoy_pct = parse_opt_f64(record.get(yoy_idx)).unwrap_or(0.0);
                    let rec = ManufacturerGrowthRecord {
                        manufacturer: rec.manufacturer,
                        quarter: rec.quarter,
                        registrations: rec.registrations,
                        qoq_pct,
                        yoy_pct,
                    };
                    push_deduped(rec, &mut records, &mut seen, line, report);
                }
                Err(message) => report.row_errors.push(RowError {
                    line,
                    key: None,
                    message,
                }),
            }
        });

        ensure_not_all_rejected(path, &report)?;
        records.sort_by(|a, b| {
            (a.manufacturer.as_str(), a.quarter).cmp(&(b.manufacturer.as_str(), b.quarter))
        });
        report.rows_used = records.len();
        return Ok((GrowthSource::Enriched(records), report));
    }

    let mut records: Vec<ManufacturerQuarterRecord> = Vec::new();
    let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();

    for_each_record(&mut reader, &mut report, |line, record, report| {
        match parse_quarterly_row(record, &columns) {
            Ok(rec) => push_deduped(rec, &mut records, &mut seen, line, report),
            Err(message) => report.row_errors.push(RowError {
                line,
                key: None,
                message,
            }),
        }
    });

    ensure_not_all_rejected(path, &report)?;
    sort_quarterly(&mut records);
    report.rows_used = records.len();
    Ok((GrowthSource::Raw(records), report))
}

/// Canonical column indices for the two manufacturer tables.
#[derive(Debug, Clone, Copy)]
struct QuarterlyColumns {
    manufacturer: usize,
    quarter: usize,
    registrations: usize,
}

fn resolve_quarterly_columns(
    path: &Path,
    header_map: &HashMap<String, usize>,
) -> Result<QuarterlyColumns, AppError> {
    let manufacturer = resolve_alias(header_map, &["manufacturer", "maker"]).ok_or_else(|| {
        AppError::load(format!(
            "'{}': missing required column `manufacturer` (or `maker`)",
            path.display()
        ))
    })?;
    let quarter = resolve_alias(header_map, &["quarter"]).ok_or_else(|| {
        AppError::load(format!("'{}': missing required column `quarter`", path.display()))
    })?;
    let registrations = resolve_alias(header_map, &["quarterly_sales", "registrations"]).ok_or_else(|| {
        AppError::load(format!(
            "'{}': missing required column `quarterly_sales` (or `registrations`)",
            path.display()
        ))
    })?;

    Ok(QuarterlyColumns {
        manufacturer,
        quarter,
        registrations,
    })
}

fn resolve_alias(header_map: &HashMap<String, usize>, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| header_map.get(*name).copied())
}

fn parse_category_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<CategoryYearRecord, String> {
    let year = get_required(record, header_map, "year")?
        .parse::<i32>()
        .map_err(|_| "Invalid `year` value.".to_string())?;
    let bucket_label = get_required(record, header_map, "bucket")?;
    let bucket = Bucket::from_label(bucket_label)
        .ok_or_else(|| format!("Unrecognized bucket label '{bucket_label}'."))?;
    let registrations = parse_count(get_required(record, header_map, "registrations")?)?;
    let yoy_pct = header_map
        .get("yoy_pct")
        .and_then(|idx| parse_opt_f64(record.get(*idx)));

    Ok(CategoryYearRecord {
        year,
        bucket,
        registrations,
        yoy_pct,
    })
}

fn parse_quarterly_row(
    record: &StringRecord,
    columns: &QuarterlyColumns,
) -> Result<ManufacturerQuarterRecord, String> {
    let manufacturer = record
        .get(columns.manufacturer)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Missing `manufacturer` value.".to_string())?
        .to_string();
    let quarter_label = record
        .get(columns.quarter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Missing `quarter` value.".to_string())?;
    let quarter = parse_quarter(quarter_label)?;
    let registrations = record
        .get(columns.registrations)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Missing `registrations` value.".to_string())
        .and_then(parse_count)?;

    Ok(ManufacturerQuarterRecord {
        manufacturer,
        quarter,
        registrations,
    })
}

/// Parse a quarter label into its calendar quarter-start date.
///
/// Accepts label forms (`2023-Q2`, `2023Q2`, `Q2-2023`, `Q2 2023`) and plain dates
/// (`YYYY-MM-DD`, `YYYY/MM/DD`, `DD-MM-YYYY`, `DD/MM/YYYY`); dates are snapped to the
/// start of their quarter.
pub fn parse_quarter(s: &str) -> Result<NaiveDate, String> {
    if let Some(date) = parse_quarter_label(s) {
        return Ok(date);
    }

    const FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s.trim(), fmt) {
            return Ok(quarter_start(d));
        }
    }

    Err(format!(
        "Invalid quarter '{s}'. Expected YYYY-MM-DD, DD/MM/YYYY, or a label like 2023-Q2."
    ))
}

fn parse_quarter_label(s: &str) -> Option<NaiveDate> {
    let s = s.trim().to_ascii_uppercase();
    let (year, q): (i32, u32) = if let Some(rest) = s.strip_prefix('Q') {
        // Q2-2023 / Q2 2023
        let (qn, yr) = rest.split_once(['-', ' '])?;
        (yr.trim().parse().ok()?, qn.trim().parse().ok()?)
    } else {
        // 2023-Q2 / 2023Q2
        let idx = s.find('Q')?;
        let year = s[..idx].trim().trim_end_matches('-').parse().ok()?;
        let q = s[idx + 1..].trim().parse().ok()?;
        (year, q)
    };

    if !(1..=4).contains(&q) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, (q - 1) * 3 + 1, 1)
}

/// First day of the calendar quarter containing `d`.
pub fn quarter_start(d: NaiveDate) -> NaiveDate {
    let month = (d.month0() / 3) * 3 + 1;
    NaiveDate::from_ymd_opt(d.year(), month, 1).unwrap_or(d)
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::load(format!("Failed to open CSV '{}': {e}", path.display())))?;
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn header_map_for(
    reader: &mut csv::Reader<File>,
    path: &Path,
) -> Result<HashMap<String, usize>, AppError> {
    let headers = reader
        .headers()
        .map_err(|e| AppError::load(format!("'{}': failed to read CSV headers: {e}", path.display())))?
        .clone();
    Ok(build_header_map(&headers))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

/// Drive the record loop, collecting CSV-level parse failures as row errors.
fn for_each_record<F>(reader: &mut csv::Reader<File>, report: &mut IngestReport, mut handle: F)
where
    F: FnMut(usize, &StringRecord, &mut IngestReport),
{
    for (idx, result) in reader.records().enumerate() {
        // +2 because records() starts after the header row and CSV line numbers
        // are 1-based.
        let line = idx + 2;
        report.rows_read += 1;

        match result {
            Ok(record) => handle(line, &record, report),
            Err(e) => report.row_errors.push(RowError {
                line,
                key: None,
                message: format!("CSV parse error: {e}"),
            }),
        }
    }
}

/// A file where every single row was rejected is malformed input, not an empty
/// dataset; abort rather than silently producing an empty table.
fn ensure_not_all_rejected(path: &Path, report: &IngestReport) -> Result<(), AppError> {
    if report.rows_read > 0 && report.row_errors.len() == report.rows_read {
        return Err(AppError::no_data(format!(
            "'{}': no valid rows remain after validation ({} rejected).",
            path.display(),
            report.row_errors.len()
        )));
    }
    Ok(())
}

fn push_deduped<R: QuarterKeyed>(
    rec: R,
    records: &mut Vec<R>,
    seen: &mut HashSet<(String, NaiveDate)>,
    line: usize,
    report: &mut IngestReport,
) {
    if seen.insert((rec.manufacturer().to_string(), rec.quarter())) {
        records.push(rec);
    } else {
        report.row_errors.push(RowError {
            line,
            key: Some(format!("{} @ {}", rec.manufacturer(), rec.quarter())),
            message: "Duplicate (manufacturer, quarter) row.".to_string(),
        });
    }
}

fn sort_quarterly(records: &mut [ManufacturerQuarterRecord]) {
    records.sort_by(|a, b| {
        (a.manufacturer.as_str(), a.quarter).cmp(&(b.manufacturer.as_str(), b.quarter))
    });
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_count(s: &str) -> Result<u64, String> {
    s.trim()
        .parse::<u64>()
        .map_err(|_| format!("Invalid registration count '{s}' (expected a non-negative integer)."))
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn quarter_labels_parse_to_quarter_starts() {
        assert_eq!(parse_quarter("2023-Q2").unwrap(), ymd(2023, 4, 1));
        assert_eq!(parse_quarter("2023Q4").unwrap(), ymd(2023, 10, 1));
        assert_eq!(parse_quarter("Q1-2021").unwrap(), ymd(2021, 1, 1));
        assert_eq!(parse_quarter("q3 2022").unwrap(), ymd(2022, 7, 1));
    }

    #[test]
    fn quarter_dates_snap_to_quarter_starts() {
        assert_eq!(parse_quarter("2023-05-15").unwrap(), ymd(2023, 4, 1));
        assert_eq!(parse_quarter("2023/01/01").unwrap(), ymd(2023, 1, 1));
        assert_eq!(parse_quarter("31-12-2022").unwrap(), ymd(2022, 10, 1));
    }

    #[test]
    fn quarter_rejects_garbage() {
        assert!(parse_quarter("2023-Q5").is_err());
        assert!(parse_quarter("last quarter").is_err());
        assert!(parse_quarter("").is_err());
    }

    #[test]
    fn header_names_are_normalized() {
        assert_eq!(normalize_header_name("\u{feff}Manufacturer"), "manufacturer");
        assert_eq!(normalize_header_name("  Quarterly_Sales "), "quarterly_sales");
    }

    #[test]
    fn quarterly_row_parses_canonical_fields() {
        let record = StringRecord::from(vec!["Acme Motors", "2023-Q1", "1200"]);
        let columns = QuarterlyColumns {
            manufacturer: 0,
            quarter: 1,
            registrations: 2,
        };
        let rec = parse_quarterly_row(&record, &columns).unwrap();
        assert_eq!(rec.manufacturer, "Acme Motors");
        assert_eq!(rec.quarter, ymd(2023, 1, 1));
        assert_eq!(rec.registrations, 1200);
    }

    #[test]
    fn quarterly_row_rejects_negative_counts() {
        let record = StringRecord::from(vec!["Acme Motors", "2023-Q1", "-5"]);
        let columns = QuarterlyColumns {
            manufacturer: 0,
            quarter: 1,
            registrations: 2,
        };
        assert!(parse_quarterly_row(&record, &columns).is_err());
    }

    #[test]
    fn category_row_uses_bucket_heuristic() {
        let headers = StringRecord::from(vec!["year", "bucket", "registrations", "yoy_pct"]);
        let header_map = build_header_map(&headers);
        let record = StringRecord::from(vec!["2023", "TWO WHEELER (NT)", "5000", "12.5"]);
        let rec = parse_category_row(&record, &header_map).unwrap();
        assert_eq!(rec.year, 2023);
        assert_eq!(rec.bucket, Bucket::TwoWheeler);
        assert_eq!(rec.registrations, 5000);
        assert!((rec.yoy_pct.unwrap() - 12.5).abs() < 1e-12);
    }

    #[test]
    fn category_row_yoy_is_optional() {
        let headers = StringRecord::from(vec!["year", "bucket", "registrations"]);
        let header_map = build_header_map(&headers);
        let record = StringRecord::from(vec!["2023", "LMV", "800"]);
        let rec = parse_category_row(&record, &header_map).unwrap();
        assert_eq!(rec.bucket, Bucket::FourWheeler);
        assert!(rec.yoy_pct.is_none());
    }
}
