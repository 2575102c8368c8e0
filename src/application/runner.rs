// ============================================================
// Layer 2 — Benchmark Point Runner
// ============================================================
// Shared by every use case: owns the detector and the other
// collaborators for one run and turns (test set, window, output
// path) into a results file.
//
//   output exists?  → skip, no inference at all
//   otherwise       → aggregate → log summary → save
//
// The existence check is advisory. Two processes racing on the
// same output path may both compute it; the later rename wins.

use anyhow::Result;
use std::path::Path;

use crate::application::config::AggregationStrategy;
use crate::data::files::ClassList;
use crate::data::labeled_set::LabeledImageSet;
use crate::domain::result::ResultSummary;
use crate::domain::traits::{Detector, RegionGrouper, RegionMatcher};
use crate::infra::{checkpoint::CheckpointStore, results::ResultStore};
use crate::ml::aggregator::{AggregationSettings, Aggregator};
use crate::ml::window::CheckpointWindow;

pub struct BenchmarkRunner<D, G, M> {
    detector:    D,
    grouper:     G,
    matcher:     M,
    checkpoints: CheckpointStore,
    classes:     ClassList,
    settings:    AggregationSettings,
    strategy:    AggregationStrategy,
}

impl<D, G, M> BenchmarkRunner<D, G, M>
where
    D: Detector,
    G: RegionGrouper,
    M: RegionMatcher,
{
    pub fn new(
        detector:    D,
        grouper:     G,
        matcher:     M,
        checkpoints: CheckpointStore,
        classes:     ClassList,
        settings:    AggregationSettings,
        strategy:    AggregationStrategy,
    ) -> Self {
        Self { detector, grouper, matcher, checkpoints, classes, settings, strategy }
    }

    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    pub fn classes(&self) -> &ClassList {
        &self.classes
    }

    #[cfg(test)]
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Benchmark `set` over `window` into `out` unless `out` exists.
    /// Returns true when the point was computed.
    pub fn run_point(
        &mut self,
        set:    &LabeledImageSet,
        prefix: &str,
        window: &CheckpointWindow,
        out:    &Path,
    ) -> Result<bool> {
        if out.exists() {
            tracing::debug!("'{}' exists, skipping", out.display());
            return Ok(false);
        }

        if set.is_empty() {
            tracing::warn!("Empty test set for '{}'", out.display());
        }

        let mut aggregator = Aggregator::new(
            &mut self.detector,
            &self.grouper,
            &self.matcher,
            &self.checkpoints,
            &self.classes,
            self.settings,
        );

        let summary = match self.strategy {
            AggregationStrategy::Region => {
                let rows = aggregator.region_based(set, prefix, window)?;
                ResultStore::save(&rows, out)?;
                ResultSummary::from_rows(&rows)
            }
            AggregationStrategy::Legacy => {
                let rows = aggregator.legacy(set, prefix, window)?;
                ResultStore::save(&rows, out)?;
                ResultSummary::from_legacy_rows(&rows)
            }
        };

        tracing::info!(
            "{}: {} rows, {}/{} hits (acc {:.3}), mean conf {:.3}",
            out.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
            summary.rows,
            summary.hits,
            summary.scored,
            summary.accuracy(),
            summary.mean_conf
        );
        Ok(true)
    }
}
