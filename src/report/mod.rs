//! Reporting utilities: KPI and insight computation plus formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the derivation/query code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{
    Bucket, CategoryYearRecord, ManufacturerGrowthRecord, ManufacturerQuarterRecord,
};
use crate::metrics::query::{
    self, SortDirection, latest_category_yoy, latest_period_delta, total_registrations,
};

pub mod format;

/// The dashboard's headline metrics over a filtered view.
#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub total_registrations: u64,
    pub latest_qoq_pct: Option<f64>,
    pub latest_category_yoy_pct: Option<f64>,
    pub latest_quarter: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManufacturerHighlight {
    pub manufacturer: String,
    pub yoy_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryHighlight {
    pub bucket: Bucket,
    pub year: i32,
    pub yoy_pct: f64,
}

/// Binary market signal: the latest aggregate QoQ either contracted or it didn't.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarketSignal {
    Contracting { qoq_pct: f64 },
    Stable,
}

/// Key findings over a filtered view.
#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub top_gainer: Option<ManufacturerHighlight>,
    pub top_decliner: Option<ManufacturerHighlight>,
    pub best_category: Option<CategoryHighlight>,
    pub market_signal: MarketSignal,
}

/// Compute the headline metrics for a filtered view.
pub fn compute_kpis(
    quarterly: &[ManufacturerQuarterRecord],
    category: &[CategoryYearRecord],
    buckets: &[Bucket],
) -> Kpis {
    Kpis {
        total_registrations: total_registrations(quarterly),
        latest_qoq_pct: latest_period_delta(quarterly),
        latest_category_yoy_pct: latest_category_yoy(category, buckets),
        latest_quarter: query::latest_quarter(quarterly),
    }
}

/// Compute the insight block for a filtered view.
///
/// Manufacturer highlights rank the growth table at its latest quarter; top gainer
/// and top decliner are the same ranking run in opposite directions.
pub fn compute_insights(
    growth: &[ManufacturerGrowthRecord],
    category: &[CategoryYearRecord],
    buckets: &[Bucket],
    latest_qoq_pct: Option<f64>,
) -> Insights {
    let at_latest: Vec<ManufacturerGrowthRecord> = match query::latest_quarter(growth) {
        Some(latest) => growth.iter().filter(|r| r.quarter == latest).cloned().collect(),
        None => Vec::new(),
    };

    let top_gainer = rank_one(&at_latest, SortDirection::Descending);
    let top_decliner = rank_one(&at_latest, SortDirection::Ascending);

    let best_category = query::latest_year(category).and_then(|year| {
        let candidates: Vec<CategoryYearRecord> = query::filter_by_buckets(category, buckets)
            .into_iter()
            .filter(|r| r.year == year && r.yoy_pct.is_some())
            .collect();
        query::top_ranked(
            &candidates,
            |r| r.yoy_pct.unwrap_or(f64::NEG_INFINITY),
            SortDirection::Descending,
            1,
        )
        .into_iter()
        .next()
        .map(|r| CategoryHighlight {
            bucket: r.bucket,
            year: r.year,
            yoy_pct: r.yoy_pct.unwrap_or(0.0),
        })
    });

    let market_signal = match latest_qoq_pct {
        Some(qoq_pct) if qoq_pct < 0.0 => MarketSignal::Contracting { qoq_pct },
        _ => MarketSignal::Stable,
    };

    Insights {
        top_gainer,
        top_decliner,
        best_category,
        market_signal,
    }
}

fn rank_one(
    records: &[ManufacturerGrowthRecord],
    direction: SortDirection,
) -> Option<ManufacturerHighlight> {
    query::top_ranked(records, |r| r.yoy_pct, direction, 1)
        .into_iter()
        .next()
        .map(|r| ManufacturerHighlight {
            manufacturer: r.manufacturer,
            yoy_pct: r.yoy_pct,
        })
}
