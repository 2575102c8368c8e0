// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `series`, `batch` and
// `batch-test`, plus the flags they share.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f32, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::batch_use_case::DEFAULT_TEST_ROLL;
use crate::application::config::{AggregationStrategy, BenchConfig, BenchMode};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Benchmark every iteration and epoch step of a prefix
    Series(SeriesArgs),

    /// Benchmark each sampled batch set before it was trained on
    Batch(BatchArgs),

    /// Benchmark earlier iterations on the newest, held-out batch sets
    BatchTest(BatchTestArgs),
}

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Iteration prefix of the checkpoints and sample sets
    #[arg(long)]
    pub prefix: String,

    /// Directory holding test sets, sample sets and results
    #[arg(long, default_value = "output")]
    pub output_dir: String,

    /// Directory holding `.mpk.gz` checkpoints
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Newline-delimited class names, one per class id
    #[arg(long, default_value = "config/classes.names")]
    pub class_list: String,

    /// Substring marking images that came from a sampling batch
    #[arg(long, default_value = "sample")]
    pub sample_marker: String,

    /// Minimum objectness for a detection to survive
    #[arg(long, default_value_t = 0.5)]
    pub conf_thres: f32,

    /// IoU above which same-class boxes are suppressed
    #[arg(long, default_value_t = 0.4)]
    pub nms_thres: f32,

    /// IoU for merging boxes from different checkpoints
    #[arg(long, default_value_t = 0.5)]
    pub iou_thres: f32,

    /// Batch sets with fewer images are incomplete
    #[arg(long, default_value_t = 10)]
    pub sampling_batch: usize,

    /// Square model input size in pixels
    #[arg(long, default_value_t = 416)]
    pub img_size: usize,

    /// Detection grid cells per side
    #[arg(long, default_value_t = 13)]
    pub grid: usize,

    /// Use per-class confidence accumulation instead of region matching
    #[arg(long)]
    pub legacy: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// One checkpoint per point
    Single,
    /// Fixed window spread over [1, epoch]
    Avg,
    /// Rolling window ending at the epoch
    Roll,
}

#[derive(Args, Debug)]
pub struct SeriesArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, value_enum, default_value_t = ModeArg::Single)]
    pub mode: ModeArg,

    /// Rolling window size (mode roll)
    #[arg(long, default_value_t = 5)]
    pub roll: usize,

    /// Fixed window size (mode avg)
    #[arg(long, default_value_t = 5)]
    pub avg_window: usize,

    /// Epoch step within an iteration
    #[arg(long, default_value_t = 2)]
    pub delta: u32,
}

impl SeriesArgs {
    pub fn bench_mode(&self) -> BenchMode {
        match self.mode {
            ModeArg::Single => BenchMode::Single,
            ModeArg::Avg    => BenchMode::Average,
            ModeArg::Roll   => BenchMode::Rolling(self.roll),
        }
    }
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Rolling window size; without it a fixed window is used
    #[arg(long)]
    pub roll: Option<usize>,

    /// Fixed window size when --roll is absent
    #[arg(long, default_value_t = 5)]
    pub conf_check_num: usize,
}

#[derive(Args, Debug)]
pub struct BatchTestArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Full batch sets to hold out besides incomplete ones
    #[arg(long, default_value_t = 0)]
    pub reserve_batches: usize,

    /// Rolling window size
    #[arg(long, default_value_t = DEFAULT_TEST_ROLL)]
    pub roll: usize,
}

/// Convert the shared CLI flags into the application-layer config.
/// The application layer never sees clap types.
impl From<CommonArgs> for BenchConfig {
    fn from(a: CommonArgs) -> Self {
        BenchConfig {
            output_dir:     a.output_dir,
            checkpoint_dir: a.checkpoint_dir,
            class_list:     a.class_list,
            sample_marker:  a.sample_marker,
            conf_thres:     a.conf_thres,
            nms_thres:      a.nms_thres,
            iou_thres:      a.iou_thres,
            sampling_batch: a.sampling_batch,
            img_size:       a.img_size,
            grid:           a.grid,
            strategy:       if a.legacy { AggregationStrategy::Legacy } else { AggregationStrategy::Region },
            ..BenchConfig::default()
        }
    }
}

impl From<&SeriesArgs> for BenchConfig {
    fn from(a: &SeriesArgs) -> Self {
        BenchConfig { avg_window: a.avg_window, ..a.common.clone().into() }
    }
}

impl From<&BatchArgs> for BenchConfig {
    fn from(a: &BatchArgs) -> Self {
        BenchConfig { conf_check_num: a.conf_check_num, ..a.common.clone().into() }
    }
}

impl From<&BatchTestArgs> for BenchConfig {
    fn from(a: &BatchTestArgs) -> Self {
        a.common.clone().into()
    }
}
