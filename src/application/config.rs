// ============================================================
// Layer 2 — Benchmark Configuration
// ============================================================
// Every setting a benchmark run depends on. Serialisable so a
// copy can be written next to the results it produced
// (bench_config.json in each series folder).
//
// Reference: Rust Book §5 (Structs)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::domain::traits::DetectionThresholds;
use crate::ml::aggregator::AggregationSettings;
use crate::ml::window::{CheckpointWindow, WindowStrategy};

/// File name of the saved configuration inside an output folder.
pub const CONFIG_FILE: &str = "bench_config.json";

/// How checkpoints are combined for one benchmark point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BenchMode {
    /// The checkpoint at the target epoch only
    Single,
    /// `avg_window` epochs spread over [1, epoch]
    Average,
    /// The N epochs ending at the target epoch
    Rolling(usize),
}

impl BenchMode {
    /// Window for a point ending at `epoch`.
    pub fn window(&self, epoch: u32, avg_window: usize) -> CheckpointWindow {
        match *self {
            BenchMode::Single     => CheckpointWindow::single(epoch),
            BenchMode::Average    => CheckpointWindow::select(1, epoch, avg_window, WindowStrategy::Fixed),
            BenchMode::Rolling(n) => CheckpointWindow::select(1, epoch, n, WindowStrategy::Rolling),
        }
    }

    /// Suffix appended to the series folder name.
    pub fn folder_suffix(&self) -> &'static str {
        match self {
            BenchMode::Single     => "",
            BenchMode::Average    => "-avg",
            BenchMode::Rolling(_) => "-roll-avg",
        }
    }
}

/// Which aggregation strategy produces the result rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AggregationStrategy {
    /// Region grouping and ground-truth matching
    #[default]
    Region,
    /// Per-class confidence accumulation (single-object models)
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub output_dir:     String,
    pub checkpoint_dir: String,
    pub class_list:     String,
    /// Substring marking images drawn from a sampling batch
    pub sample_marker:  String,
    pub conf_thres:     f32,
    pub nms_thres:      f32,
    /// IoU for merging boxes across checkpoints into one region
    pub iou_thres:      f32,
    /// Window size of the fixed-average series mode
    pub avg_window:     usize,
    /// Window size of the batch-set benchmark without `--roll`
    pub conf_check_num: usize,
    /// Batch sets smaller than this are incomplete
    pub sampling_batch: usize,
    pub img_size:       usize,
    pub grid:           usize,
    pub strategy:       AggregationStrategy,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            output_dir:     "output".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            class_list:     "config/classes.names".to_string(),
            sample_marker:  "sample".to_string(),
            conf_thres:     0.5,
            nms_thres:      0.4,
            iou_thres:      0.5,
            avg_window:     5,
            conf_check_num: 5,
            sampling_batch: 10,
            img_size:       416,
            grid:           13,
            strategy:       AggregationStrategy::Region,
        }
    }
}

impl BenchConfig {
    pub fn settings(&self) -> AggregationSettings {
        AggregationSettings {
            thresholds: DetectionThresholds {
                obj_thresh: self.conf_thres,
                nms_thresh: self.nms_thres,
            },
            iou_thresh: self.iou_thres,
        }
    }
}

/// What `bench_config.json` records about the points in a series folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub mode:   BenchMode,
    pub config: BenchConfig,
}

impl SeriesRecord {
    pub fn new(mode: BenchMode, config: BenchConfig) -> Self {
        Self { mode, config }
    }

    /// Write this record as pretty JSON into `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Config saved to '{}'", path.display());
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid config in '{}'", path.display()))
    }

    /// Save into `dir` unless a record is already there. Returns false,
    /// leaving the existing record untouched, when that record differs
    /// from this one or cannot be read.
    pub fn claim(&self, dir: &Path) -> Result<bool> {
        if !dir.join(CONFIG_FILE).exists() {
            self.save(dir)?;
            return Ok(true);
        }
        match Self::load(dir) {
            Ok(previous) if previous == *self => Ok(true),
            Ok(previous) => {
                tracing::warn!(
                    "'{}' holds points produced with different settings ({:?}, now {:?}); \
                     existing points are kept and '{}' is left unchanged",
                    dir.display(),
                    previous.mode,
                    self.mode,
                    CONFIG_FILE
                );
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("{e:#}; existing record is left unchanged");
                Ok(false)
            }
        }
    }
}
