//! Formatted terminal output for the KPI, growth, and category views.

use crate::data::snapshot::Snapshot;
use crate::domain::{Bucket, CategoryYearRecord, ManufacturerGrowthRecord};
use crate::metrics::query;
use crate::report::{Insights, Kpis, MarketSignal};

/// Format the headline summary: dataset shape, KPI block, insights.
pub fn format_summary(snapshot: &Snapshot, kpis: &Kpis, insights: &Insights) -> String {
    let mut out = String::new();

    out.push_str("=== vahan - Vehicle Registrations (Investor View) ===\n");
    out.push_str(&format!(
        "Tables: category={} detail={} quarterly={} growth={}{}\n",
        snapshot.category_growth.len(),
        snapshot.category_detail.row_count(),
        snapshot.manufacturer_quarterly.len(),
        snapshot.manufacturer_growth.len(),
        if snapshot.growth_was_enriched {
            " (pre-enriched)"
        } else {
            " (derived)"
        },
    ));

    let row_errors = snapshot.reports.total_row_errors();
    if row_errors > 0 {
        out.push_str(&format!("Rows skipped during load: {row_errors}\n"));
    }

    out.push('\n');
    out.push_str(&format!(
        "Total registrations (filtered): {}\n",
        group_digits(kpis.total_registrations)
    ));
    out.push_str(&format!("QoQ (total, latest):            {}\n", fmt_pct(kpis.latest_qoq_pct)));
    out.push_str(&format!(
        "YoY (category, avg latest yr):  {}\n",
        fmt_pct(kpis.latest_category_yoy_pct)
    ));
    if let Some(latest) = kpis.latest_quarter {
        out.push_str(&format!("Latest quarter in view:         {latest}\n"));
    }

    out.push('\n');
    out.push_str(&format_insights(insights));
    out
}

/// Format the insight block.
pub fn format_insights(insights: &Insights) -> String {
    let mut out = String::new();
    out.push_str("Key findings:\n");

    match &insights.top_gainer {
        Some(h) => out.push_str(&format!(
            "- Top growing manufacturer (YoY): {} ({:+.2}%)\n",
            h.manufacturer, h.yoy_pct
        )),
        None => out.push_str("- Top growing manufacturer (YoY): -\n"),
    }
    match &insights.top_decliner {
        Some(h) => out.push_str(&format!(
            "- Weakest manufacturer (YoY):     {} ({:+.2}%)\n",
            h.manufacturer, h.yoy_pct
        )),
        None => out.push_str("- Weakest manufacturer (YoY):     -\n"),
    }
    match &insights.best_category {
        Some(c) => out.push_str(&format!(
            "- Best category (YoY):            {} ({:+.2}% in {})\n",
            c.bucket.display_name(),
            c.yoy_pct,
            c.year
        )),
        None => out.push_str("- Best category (YoY):            -\n"),
    }
    match insights.market_signal {
        MarketSignal::Contracting { qoq_pct } => out.push_str(&format!(
            "- Risk signal: overall market declined by {qoq_pct:.2}% in the latest quarter.\n"
        )),
        MarketSignal::Stable => out.push_str(
            "- Market signal: overall registrations are stable or growing in the latest quarter.\n",
        ),
    }

    out
}

/// Format the latest-quarter growth table, top `n` by registrations.
pub fn format_growth_table(records: &[ManufacturerGrowthRecord], n: usize) -> String {
    let mut out = String::new();

    let Some(latest) = query::latest_quarter(records) else {
        out.push_str("No quarterly growth data in the current view.\n");
        return out;
    };

    let at_latest: Vec<ManufacturerGrowthRecord> = records
        .iter()
        .filter(|r| r.quarter == latest)
        .cloned()
        .collect();
    let rows = query::top_ranked(
        &at_latest,
        |r| r.registrations as f64,
        query::SortDirection::Descending,
        n,
    );

    out.push_str(&format!("Manufacturer % change (QoQ & YoY) - quarter of {latest}:\n"));
    out.push_str(&format!(
        "{:<28} {:>14} {:>10} {:>10}\n",
        "manufacturer", "registrations", "qoq", "yoy"
    ));
    out.push_str(&format!("{:-<28} {:-<14} {:-<10} {:-<10}\n", "", "", "", ""));
    for r in &rows {
        out.push_str(&format!(
            "{:<28} {:>14} {:>9.2}% {:>9.2}%\n",
            truncate(&r.manufacturer, 28),
            group_digits(r.registrations),
            r.qoq_pct,
            r.yoy_pct,
        ));
    }

    out
}

/// Format category totals per year/bucket plus the latest-year YoY block.
pub fn format_category_tables(records: &[CategoryYearRecord], buckets: &[Bucket]) -> String {
    let mut out = String::new();

    let totals = query::category_totals_by_year(records, buckets);
    if totals.is_empty() {
        out.push_str("No category data in the current view.\n");
        return out;
    }

    out.push_str("Category totals by year:\n");
    out.push_str(&format!("{:<6} {:<6} {:>14}\n", "year", "bucket", "registrations"));
    out.push_str(&format!("{:-<6} {:-<6} {:-<14}\n", "", "", ""));
    for (year, bucket, total) in &totals {
        out.push_str(&format!(
            "{:<6} {:<6} {:>14}\n",
            year,
            bucket.display_name(),
            group_digits(*total)
        ));
    }

    if let Some(year) = query::latest_year(records) {
        out.push('\n');
        out.push_str(&format!("Category YoY ({year}):\n"));
        for r in query::filter_by_buckets(records, buckets) {
            if r.year != year {
                continue;
            }
            out.push_str(&format!(
                "{:<6} {}\n",
                r.bucket.display_name(),
                fmt_pct(r.yoy_pct)
            ));
        }
    }

    out
}

/// `-` for absent values, two decimals otherwise.
pub fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}%"),
        None => "-".to_string(),
    }
}

/// Thousands-separated integer rendering (`1234567` -> `1,234,567`).
pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ManufacturerHighlight;

    #[test]
    fn group_digits_inserts_separators() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1_000), "1,000");
        assert_eq!(group_digits(1_234_567), "1,234,567");
    }

    #[test]
    fn fmt_pct_renders_absent_as_dash() {
        assert_eq!(fmt_pct(None), "-");
        assert_eq!(fmt_pct(Some(8.333)), "8.33%");
    }

    #[test]
    fn insights_block_mentions_the_leaders() {
        let insights = Insights {
            top_gainer: Some(ManufacturerHighlight {
                manufacturer: "Acme".to_string(),
                yoy_pct: 12.0,
            }),
            top_decliner: None,
            best_category: None,
            market_signal: MarketSignal::Contracting { qoq_pct: -3.2 },
        };

        let text = format_insights(&insights);
        assert!(text.contains("Acme"));
        assert!(text.contains("+12.00%"));
        assert!(text.contains("declined by -3.20%"));
    }

    #[test]
    fn growth_table_is_empty_safe() {
        let text = format_growth_table(&[], 10);
        assert!(text.contains("No quarterly growth data"));
    }
}
