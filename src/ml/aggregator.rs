// ============================================================
// Layer 5 — Cross-Checkpoint Confidence Aggregator
// ============================================================
// Turns one (test set, checkpoint window) pair into result rows.
//
// Region-based strategy:
//   for each checkpoint in the window
//       reload weights, detect on every image, keep all boxes
//   for each image
//       group boxes into regions (mean / std confidences)
//       1 region  → its class if it is a ground truth, else the
//                   only ground truth, else unresolved
//       N regions → RegionMatcher
//       every matched ground truth is consumed; the rest become
//       missed rows (detected = "", conf = 0)
//
// Legacy per-class strategy (single-object models):
//   per image, per predicted class, collect class confidences
//   over the window; mean = sum / number of checkpoints, so a
//   class missed by some checkpoints is pulled towards zero.
//   Highest mean wins, first seen on ties.
//
// The detector is borrowed mutably for the whole call and its
// weights are replaced in place between checkpoints.

use anyhow::{bail, Result};
use std::{collections::BTreeMap, path::Path};

use crate::data::files::ClassList;
use crate::data::labeled_set::LabeledImageSet;
use crate::domain::detection::{AggregatedRegion, ClassId, RawDetection};
use crate::domain::result::{is_hit, LegacyResultRow, ResultRow};
use crate::domain::traits::{
    DetectionThresholds, Detector, RegionGrouper, RegionMatch, RegionMatcher,
};
use crate::infra::checkpoint::CheckpointStore;
use crate::ml::window::CheckpointWindow;

/// Thresholds used while aggregating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationSettings {
    pub thresholds: DetectionThresholds,
    /// IoU for merging boxes from different checkpoints into a region
    pub iou_thresh: f32,
}

pub struct Aggregator<'a, D, G, M> {
    detector:    &'a mut D,
    grouper:     &'a G,
    matcher:     &'a M,
    checkpoints: &'a CheckpointStore,
    classes:     &'a ClassList,
    settings:    AggregationSettings,
}

impl<'a, D, G, M> Aggregator<'a, D, G, M>
where
    D: Detector,
    G: RegionGrouper,
    M: RegionMatcher,
{
    pub fn new(
        detector:    &'a mut D,
        grouper:     &'a G,
        matcher:     &'a M,
        checkpoints: &'a CheckpointStore,
        classes:     &'a ClassList,
        settings:    AggregationSettings,
    ) -> Self {
        Self { detector, grouper, matcher, checkpoints, classes, settings }
    }

    /// Region-based aggregation, rows sorted by file.
    pub fn region_based(
        &mut self,
        set:    &LabeledImageSet,
        prefix: &str,
        window: &CheckpointWindow,
    ) -> Result<Vec<ResultRow>> {
        let detections = self.collect_detections(set, prefix, window)?;
        let mut rows   = Vec::new();

        for (image, found) in set.paths().iter().zip(detections) {
            let mut remaining = set.ground_truths(image)?;

            if !found.is_empty() {
                let regions = self.grouper.group(&found, window.size, self.settings.iou_thresh);
                tracing::debug!(
                    "'{}': {} detections → {} regions (support {:?})",
                    image,
                    found.len(),
                    regions.len(),
                    regions.iter().map(|r| r.support).collect::<Vec<_>>()
                );
                let pairs   = if regions.len() == 1 {
                    vec![RegionMatch { truth: resolve_single(&regions[0], &remaining), region: 0 }]
                } else {
                    self.matcher.match_regions(&remaining, &regions)
                };

                for pair in pairs {
                    let Some(region) = regions.get(pair.region) else {
                        continue;
                    };
                    let actual = pair.truth.map(|c| self.classes.label(c)).unwrap_or_default();
                    rows.push(ResultRow::new(
                        image.as_str(),
                        actual,
                        self.classes.label(region.class_id),
                        region.score() as f64,
                        region.score_std() as f64,
                    ));

                    if let Some(truth) = pair.truth {
                        if let Some(pos) = remaining.iter().position(|&gt| gt == truth) {
                            remaining.remove(pos);
                        }
                    }
                }
            }

            for truth in remaining {
                rows.push(ResultRow::missed(image.as_str(), self.classes.label(truth)));
            }
        }

        rows.sort_by(|a, b| a.file.cmp(&b.file));
        Ok(rows)
    }

    /// Per-class accumulation, one row per image in set order.
    pub fn legacy(
        &mut self,
        set:    &LabeledImageSet,
        prefix: &str,
        window: &CheckpointWindow,
    ) -> Result<Vec<LegacyResultRow>> {
        let detections  = self.collect_detections(set, prefix, window)?;
        let checkpoints = window.len() as f64;
        let mut rows    = Vec::with_capacity(set.len());

        for (image, found) in set.paths().iter().zip(detections) {
            let actual = set
                .ground_truths(image)?
                .first()
                .map(|&c| self.classes.label(c))
                .unwrap_or_default();

            let per_class = accumulate_by_class(&found);

            let mut best: Option<(ClassId, f64)> = None;
            for (class, confs) in &per_class {
                let mean = confs.iter().map(|&c| c as f64).sum::<f64>() / checkpoints;
                if best.map_or(true, |(_, b)| mean > b) {
                    best = Some((*class, mean));
                }
            }

            let (detected, conf) = match best {
                Some((class, mean)) => (self.classes.label(class), mean),
                None => (String::new(), 0.0),
            };
            let confs = per_class
                .into_iter()
                .map(|(class, confs)| (self.classes.label(class), confs))
                .collect::<BTreeMap<_, _>>();

            rows.push(LegacyResultRow {
                file: image.clone(),
                confs,
                hit: is_hit(&actual, &detected),
                actual,
                detected,
                conf,
            });
        }
        Ok(rows)
    }

    /// Detections for every image, concatenated over the window.
    /// Index i belongs to `set.paths()[i]`.
    fn collect_detections(
        &mut self,
        set:    &LabeledImageSet,
        prefix: &str,
        window: &CheckpointWindow,
    ) -> Result<Vec<Vec<RawDetection>>> {
        debug_assert!(!window.is_empty(), "checkpoint window must not be empty");
        if window.is_empty() {
            bail!("Empty checkpoint window for prefix '{}'", prefix);
        }

        if !window.is_single() {
            tracing::info!("Benchmarking on epochs {:?}", window.epochs);
        }

        let mut per_image: Vec<Vec<RawDetection>> = vec![Vec::new(); set.len()];
        for (n, &epoch) in window.epochs.iter().enumerate() {
            let checkpoint = self.checkpoints.resolve(prefix, epoch)?;
            if !window.is_single() {
                tracing::debug!(
                    "Checkpoint {}/{}: '{}'",
                    n + 1,
                    window.len(),
                    checkpoint.display()
                );
            }
            self.detector.load_checkpoint(&checkpoint)?;

            for (i, image) in set.paths().iter().enumerate() {
                let found = self
                    .detector
                    .detect(Path::new(image), epoch, &self.settings.thresholds)?;
                per_image[i].extend(found);
            }
        }
        Ok(per_image)
    }
}

/// Ground truth for an image that produced exactly one region.
fn resolve_single(region: &AggregatedRegion, ground_truths: &[ClassId]) -> Option<ClassId> {
    if ground_truths.contains(&region.class_id) {
        Some(region.class_id)
    } else if ground_truths.len() == 1 {
        Some(ground_truths[0])
    } else {
        None
    }
}

/// Class confidences keyed by predicted class, in first-seen order.
fn accumulate_by_class(detections: &[RawDetection]) -> Vec<(ClassId, Vec<f32>)> {
    let mut per_class: Vec<(ClassId, Vec<f32>)> = Vec::new();
    for det in detections {
        match per_class.iter_mut().find(|(class, _)| *class == det.class_id) {
            Some((_, confs)) => confs.push(det.class_conf),
            None => per_class.push((det.class_id, vec![det.class_conf])),
        }
    }
    per_class
}
