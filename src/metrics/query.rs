//! Aggregate queries over the loaded tables.
//!
//! Every function here is a total, pure function over in-memory records: when the
//! underlying data is insufficient (empty selection, single period, zero
//! denominator) the result is `None` or an empty collection, never an error.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{Bucket, CategoryYearRecord, QuarterKeyed};

/// Ranking direction for [`top_ranked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Inclusive quarter-range filter plus manufacturer set-membership filter.
///
/// An empty manufacturer selection is a pass-through (everything matches), so a
/// cleared multi-select shows the whole market rather than nothing. Manufacturer
/// matching is case-insensitive.
pub fn filter_by_manufacturer_and_range<R: QuarterKeyed + Clone>(
    records: &[R],
    manufacturers: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<R> {
    records
        .iter()
        .filter(|r| {
            if let Some(start) = start {
                if r.quarter() < start {
                    return false;
                }
            }
            if let Some(end) = end {
                if r.quarter() > end {
                    return false;
                }
            }
            manufacturers.is_empty()
                || manufacturers
                    .iter()
                    .any(|m| m.trim().eq_ignore_ascii_case(r.manufacturer().trim()))
        })
        .cloned()
        .collect()
}

/// Bucket set-membership filter with the same empty-selection pass-through.
pub fn filter_by_buckets(records: &[CategoryYearRecord], buckets: &[Bucket]) -> Vec<CategoryYearRecord> {
    records
        .iter()
        .filter(|r| buckets.is_empty() || buckets.contains(&r.bucket))
        .cloned()
        .collect()
}

/// Sum of registrations over a subset.
pub fn total_registrations<R: QuarterKeyed>(records: &[R]) -> u64 {
    records.iter().map(QuarterKeyed::registrations).sum()
}

/// Registrations summed per quarter, ascending by quarter.
pub fn totals_by_quarter<R: QuarterKeyed>(records: &[R]) -> Vec<(NaiveDate, u64)> {
    let mut totals: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for r in records {
        *totals.entry(r.quarter()).or_insert(0) += r.registrations();
    }
    totals.into_iter().collect()
}

/// Percentage change between the last two per-quarter totals of a subset.
///
/// `None` when fewer than two quarters exist or the prior quarter's total is zero.
pub fn latest_period_delta<R: QuarterKeyed>(records: &[R]) -> Option<f64> {
    let totals = totals_by_quarter(records);
    let [.., (_, prev), (_, last)] = totals.as_slice() else {
        return None;
    };
    if *prev == 0 {
        return None;
    }
    Some((*last as f64 - *prev as f64) / *prev as f64 * 100.0)
}

/// Most recent quarter present in a subset.
pub fn latest_quarter<R: QuarterKeyed>(records: &[R]) -> Option<NaiveDate> {
    records.iter().map(QuarterKeyed::quarter).max()
}

/// Sort by an extracted key and take the first `n`.
///
/// One operation serves both "top gainer" (descending) and "top decliner"
/// (ascending); non-finite keys are ranked as equal, matching a stable sort.
pub fn top_ranked<T: Clone>(
    records: &[T],
    key: impl Fn(&T) -> f64,
    direction: SortDirection,
    n: usize,
) -> Vec<T> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        let ord = key(a).partial_cmp(&key(b)).unwrap_or(std::cmp::Ordering::Equal);
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    sorted.truncate(n);
    sorted
}

/// Latest year present in the category table (across all buckets).
pub fn latest_year(records: &[CategoryYearRecord]) -> Option<i32> {
    records.iter().map(|r| r.year).max()
}

/// Mean YoY over the latest year, restricted to the selected buckets.
///
/// The latest year is taken over the whole table before the bucket restriction,
/// matching how the dashboard's headline metric behaves. Records without a
/// `yoy_pct` value do not contribute; `None` when nothing contributes.
pub fn latest_category_yoy(records: &[CategoryYearRecord], buckets: &[Bucket]) -> Option<f64> {
    let year = latest_year(records)?;
    let values: Vec<f64> = filter_by_buckets(records, buckets)
        .iter()
        .filter(|r| r.year == year)
        .filter_map(|r| r.yoy_pct)
        .collect();
    mean(&values)
}

/// Registrations summed per (year, bucket) over the selected buckets, ascending.
pub fn category_totals_by_year(
    records: &[CategoryYearRecord],
    buckets: &[Bucket],
) -> Vec<(i32, Bucket, u64)> {
    let mut totals: BTreeMap<(i32, Bucket), u64> = BTreeMap::new();
    for r in filter_by_buckets(records, buckets) {
        *totals.entry((r.year, r.bucket)).or_insert(0) += r.registrations;
    }
    totals
        .into_iter()
        .map(|((year, bucket), total)| (year, bucket, total))
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ManufacturerQuarterRecord;

    fn quarter(year: i32, q: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, (q - 1) * 3 + 1, 1).unwrap()
    }

    fn rec(manufacturer: &str, year: i32, q: u32, registrations: u64) -> ManufacturerQuarterRecord {
        ManufacturerQuarterRecord {
            manufacturer: manufacturer.to_string(),
            quarter: quarter(year, q),
            registrations,
        }
    }

    fn cat(year: i32, bucket: Bucket, registrations: u64, yoy_pct: Option<f64>) -> CategoryYearRecord {
        CategoryYearRecord {
            year,
            bucket,
            registrations,
            yoy_pct,
        }
    }

    #[test]
    fn empty_manufacturer_selection_is_pass_through() {
        let records = vec![rec("Acme", 2023, 1, 10), rec("Zenith", 2023, 1, 20)];
        let out = filter_by_manufacturer_and_range(&records, &[], None, None);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn manufacturer_filter_is_case_insensitive() {
        let records = vec![rec("Acme", 2023, 1, 10), rec("Zenith", 2023, 1, 20)];
        let out = filter_by_manufacturer_and_range(&records, &["acme".to_string()], None, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].manufacturer, "Acme");
    }

    #[test]
    fn quarter_range_is_inclusive() {
        let records = vec![
            rec("Acme", 2023, 1, 1),
            rec("Acme", 2023, 2, 2),
            rec("Acme", 2023, 3, 3),
        ];
        let out = filter_by_manufacturer_and_range(
            &records,
            &[],
            Some(quarter(2023, 1)),
            Some(quarter(2023, 2)),
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out.last().unwrap().registrations, 2);
    }

    #[test]
    fn totals_are_additive_over_disjoint_partitions() {
        let records = vec![
            rec("Acme", 2023, 1, 10),
            rec("Acme", 2023, 2, 20),
            rec("Zenith", 2023, 1, 30),
        ];
        let acme = filter_by_manufacturer_and_range(&records, &["Acme".to_string()], None, None);
        let zenith = filter_by_manufacturer_and_range(&records, &["Zenith".to_string()], None, None);

        assert_eq!(
            total_registrations(&acme) + total_registrations(&zenith),
            total_registrations(&records)
        );
    }

    #[test]
    fn latest_period_delta_needs_two_periods() {
        let records = vec![rec("Acme", 2023, 1, 10), rec("Zenith", 2023, 1, 20)];
        assert_eq!(latest_period_delta(&records), None);
        assert_eq!(latest_period_delta::<ManufacturerQuarterRecord>(&[]), None);
    }

    #[test]
    fn latest_period_delta_sums_across_manufacturers() {
        let records = vec![
            rec("Acme", 2023, 1, 60),
            rec("Zenith", 2023, 1, 40),
            rec("Acme", 2023, 2, 70),
            rec("Zenith", 2023, 2, 40),
        ];
        // (110 - 100) / 100
        let delta = latest_period_delta(&records).unwrap();
        assert!((delta - 10.0).abs() < 1e-9);
    }

    #[test]
    fn latest_period_delta_guards_zero_denominator() {
        let records = vec![rec("Acme", 2023, 1, 0), rec("Acme", 2023, 2, 50)];
        assert_eq!(latest_period_delta(&records), None);
    }

    #[test]
    fn top_ranked_serves_both_directions() {
        let records = vec![
            rec("Acme", 2023, 1, 10),
            rec("Zenith", 2023, 1, 30),
            rec("Majestic", 2023, 1, 20),
        ];
        let top = top_ranked(&records, |r| r.registrations as f64, SortDirection::Descending, 2);
        assert_eq!(top[0].manufacturer, "Zenith");
        assert_eq!(top[1].manufacturer, "Majestic");

        let bottom = top_ranked(&records, |r| r.registrations as f64, SortDirection::Ascending, 1);
        assert_eq!(bottom[0].manufacturer, "Acme");
    }

    #[test]
    fn latest_category_yoy_matches_dashboard_scenarios() {
        let records = vec![
            cat(2022, Bucket::TwoWheeler, 900, Some(3.0)),
            cat(2023, Bucket::TwoWheeler, 1000, Some(10.0)),
            cat(2023, Bucket::ThreeWheeler, 100, Some(20.0)),
            cat(2023, Bucket::FourWheeler, 500, Some(-5.0)),
        ];

        let all = latest_category_yoy(&records, &[]).unwrap();
        assert!((all - 25.0 / 3.0).abs() < 1e-9);

        let two_three =
            latest_category_yoy(&records, &[Bucket::TwoWheeler, Bucket::ThreeWheeler]).unwrap();
        assert!((two_three - 15.0).abs() < 1e-9);
    }

    #[test]
    fn latest_category_yoy_absent_cases() {
        assert_eq!(latest_category_yoy(&[], &[]), None);

        // Latest year present but none of its records carry a yoy value.
        let records = vec![
            cat(2022, Bucket::TwoWheeler, 900, Some(3.0)),
            cat(2023, Bucket::TwoWheeler, 1000, None),
        ];
        assert_eq!(latest_category_yoy(&records, &[]), None);

        // Bucket restriction empties the latest year.
        let records = vec![cat(2023, Bucket::TwoWheeler, 1000, Some(10.0))];
        assert_eq!(latest_category_yoy(&records, &[Bucket::FourWheeler]), None);
    }

    #[test]
    fn category_totals_group_by_year_and_bucket() {
        let records = vec![
            cat(2022, Bucket::TwoWheeler, 900, None),
            cat(2023, Bucket::TwoWheeler, 1000, None),
            cat(2023, Bucket::FourWheeler, 500, None),
        ];
        let totals = category_totals_by_year(&records, &[Bucket::TwoWheeler]);
        assert_eq!(totals, vec![
            (2022, Bucket::TwoWheeler, 900),
            (2023, Bucket::TwoWheeler, 1000),
        ]);
    }
}
