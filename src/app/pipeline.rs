//! Shared query-pass logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! filter -> KPIs -> insights
//!
//! Each user selection triggers a full recomputation pass over the immutable
//! snapshot; nothing in the snapshot is ever mutated.

use crate::data::snapshot::Snapshot;
use crate::domain::{
    CategoryYearRecord, ManufacturerGrowthRecord, ManufacturerQuarterRecord, ViewFilter,
};
use crate::metrics::query::{filter_by_buckets, filter_by_manufacturer_and_range};
use crate::report::{self, Insights, Kpis};

/// All computed outputs of a single query pass.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub quarterly_view: Vec<ManufacturerQuarterRecord>,
    pub growth_view: Vec<ManufacturerGrowthRecord>,
    pub category_view: Vec<CategoryYearRecord>,
    pub kpis: Kpis,
    pub insights: Insights,
}

/// Execute one full recomputation pass for a filter selection.
pub fn run_view(snapshot: &Snapshot, filter: &ViewFilter) -> RunOutput {
    let quarterly_view = filter_by_manufacturer_and_range(
        &snapshot.manufacturer_quarterly,
        &filter.manufacturers,
        filter.start_quarter,
        filter.end_quarter,
    );
    let growth_view = filter_by_manufacturer_and_range(
        &snapshot.manufacturer_growth,
        &filter.manufacturers,
        filter.start_quarter,
        filter.end_quarter,
    );
    let category_view = filter_by_buckets(&snapshot.category_growth, &filter.buckets);

    let kpis = report::compute_kpis(&quarterly_view, &snapshot.category_growth, &filter.buckets);
    let insights = report::compute_insights(
        &growth_view,
        &snapshot.category_growth,
        &filter.buckets,
        kpis.latest_qoq_pct,
    );

    RunOutput {
        quarterly_view,
        growth_view,
        category_view,
        kpis,
        insights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::{SampleConfig, generate_dataset, write_dataset};
    use crate::data::snapshot::SourcePaths;
    use std::fs;
    use std::path::PathBuf;

    fn sample_snapshot(name: &str) -> (Snapshot, PathBuf) {
        let dir = std::env::temp_dir().join(format!("vahan-pipeline-{}-{name}", std::process::id()));
        let dataset = generate_dataset(&SampleConfig {
            manufacturers: 4,
            quarters: 8,
            start_year: 2022,
            seed: 11,
        })
        .unwrap();
        write_dataset(&dir, &dataset).unwrap();
        (Snapshot::load(SourcePaths::from_dir(&dir)).unwrap(), dir)
    }

    #[test]
    fn unfiltered_pass_covers_every_record() {
        let (snapshot, dir) = sample_snapshot("all");
        let run = run_view(&snapshot, &ViewFilter::default());

        assert_eq!(run.quarterly_view.len(), snapshot.manufacturer_quarterly.len());
        assert_eq!(run.growth_view.len(), snapshot.manufacturer_growth.len());
        assert!(run.kpis.total_registrations > 0);
        // 8 quarters means at least two periods, so the delta is computable.
        assert!(run.kpis.latest_qoq_pct.is_some());
        assert!(run.insights.top_gainer.is_some());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn manufacturer_selection_narrows_the_view() {
        let (snapshot, dir) = sample_snapshot("narrow");
        let one = snapshot.manufacturers()[0].clone();
        let run = run_view(
            &snapshot,
            &ViewFilter {
                manufacturers: vec![one.clone()],
                ..ViewFilter::default()
            },
        );

        assert!(!run.quarterly_view.is_empty());
        assert!(run.quarterly_view.iter().all(|r| r.manufacturer == one));
        assert_eq!(run.insights.top_gainer.as_ref().unwrap().manufacturer, one);

        fs::remove_dir_all(&dir).ok();
    }
}
