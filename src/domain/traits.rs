// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The benchmarking core talks to its collaborators only through
// these traits:
//
//   Detector       — model inference over one image, with an
//                    explicit weight-reload step per checkpoint
//   RegionGrouper  — clusters one image's detections from every
//                    checkpoint in a window into stable regions
//   RegionMatcher  — pairs regions with ground-truth classes
//   TabularRow     — a row the result store can write
//
// Implementations:
//   - BurnDetector       (ml::detector)
//   - IouRegionGrouper   (ml::grouping)
//   - GreedyClassMatcher (ml::grouping)
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use std::path::Path;

use crate::domain::detection::{AggregatedRegion, ClassId, RawDetection};

/// Thresholds applied by the detector before anything is returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionThresholds {
    /// Minimum objectness for a box to survive
    pub obj_thresh: f32,
    /// IoU above which overlapping same-class boxes are suppressed
    pub nms_thresh: f32,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self { obj_thresh: 0.5, nms_thresh: 0.4 }
    }
}

// ─── Detector ─────────────────────────────────────────────────────────────────
/// An owned model handle.
///
/// `load_checkpoint` swaps the weights in place; the network is
/// built once and reused for every checkpoint in a window. Taking
/// `&mut self` everywhere means one handle can never serve two
/// aggregations at the same time.
pub trait Detector {
    /// Replace the current weights with the ones stored at `checkpoint`.
    fn load_checkpoint(&mut self, checkpoint: &Path) -> Result<()>;

    /// Run inference on one image. `epoch` is stamped on every detection.
    fn detect(
        &mut self,
        image:      &Path,
        epoch:      u32,
        thresholds: &DetectionThresholds,
    ) -> Result<Vec<RawDetection>>;
}

// ─── RegionGrouper ────────────────────────────────────────────────────────────
pub trait RegionGrouper {
    /// Group same-image detections gathered over a window of
    /// `window_size` checkpoints. Every returned region has
    /// non-negative std values.
    fn group(
        &self,
        detections:  &[RawDetection],
        window_size: usize,
        iou_thresh:  f32,
    ) -> Vec<AggregatedRegion>;
}

// ─── RegionMatcher ────────────────────────────────────────────────────────────
/// A region paired with the ground truth it was assigned to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionMatch {
    pub truth:  Option<ClassId>,
    /// Index into the region slice handed to the matcher
    pub region: usize,
}

pub trait RegionMatcher {
    /// Assign regions to ground-truth classes. Each ground truth is
    /// used at most once; regions may be left unresolved.
    fn match_regions(
        &self,
        ground_truths: &[ClassId],
        regions:       &[AggregatedRegion],
    ) -> Vec<RegionMatch>;
}

// ─── TabularRow ───────────────────────────────────────────────────────────────
/// A row with a fixed column order.
pub trait TabularRow {
    const COLUMNS: &'static [&'static str];

    /// Image path the row belongs to.
    fn file(&self) -> &str;

    /// Field values in `COLUMNS` order.
    fn fields(&self) -> Vec<String>;
}
