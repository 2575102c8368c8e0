// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments,
// builds the Burn detector and hands everything to Layer 2.
//
// Three commands are supported:
//   1. `series`     — sweep iterations × epochs × test sets
//   2. `batch`      — benchmark each batch set before training
//   3. `batch-test` — benchmark on held-out newest batch sets
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{bail, Result};
use clap::Parser;
use commands::{BatchArgs, BatchTestArgs, Commands, SeriesArgs};

use crate::application::{
    batch_use_case::BatchBenchmarkUseCase,
    config::BenchConfig,
    runner::BenchmarkRunner,
    series_use_case::{SeriesBenchmarkUseCase, SweepReport},
};
use crate::data::files::ClassList;
use crate::infra::checkpoint::CheckpointStore;
use crate::ml::{
    detector::{BurnDetector, InferBackend},
    grouping::{GreedyClassMatcher, IouRegionGrouper},
    model::DetectorNetConfig,
};

type CliRunner = BenchmarkRunner<BurnDetector<InferBackend>, IouRegionGrouper, GreedyClassMatcher>;

#[derive(Parser, Debug)]
#[command(
    name = "checkpoint-bench",
    version = "0.1.0",
    about = "Benchmark object-detection checkpoints across retraining iterations."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. Only routes, never computes.
    pub fn run(self) -> Result<()> {
        let report = match self.command {
            Commands::Series(args)    => run_series(args)?,
            Commands::Batch(args)     => run_batch(args)?,
            Commands::BatchTest(args) => run_batch_test(args)?,
        };
        println!(
            "Done: {} benchmark points computed, {} already present.",
            report.computed, report.skipped
        );
        Ok(())
    }
}

fn run_series(args: SeriesArgs) -> Result<SweepReport> {
    let config = BenchConfig::from(&args);
    let runner = build_runner(&config)?;
    SeriesBenchmarkUseCase::new(config, runner, args.common.prefix.clone(), args.bench_mode(), args.delta)
        .execute()
}

fn run_batch(args: BatchArgs) -> Result<SweepReport> {
    let config = BenchConfig::from(&args);
    let runner = build_runner(&config)?;
    BatchBenchmarkUseCase::new(config, runner, args.common.prefix.clone())
        .execute_batch_sets(args.roll)
}

fn run_batch_test(args: BatchTestArgs) -> Result<SweepReport> {
    let config = BenchConfig::from(&args);
    let runner = build_runner(&config)?;
    BatchBenchmarkUseCase::new(config, runner, args.common.prefix.clone())
        .execute_held_out(args.reserve_batches, args.roll)
}

/// One detector for the whole run; checkpoints are swapped into it.
fn build_runner(config: &BenchConfig) -> Result<CliRunner> {
    let classes = ClassList::load(&config.class_list)?;
    if classes.is_empty() {
        bail!("Class list '{}' is empty", config.class_list);
    }
    tracing::info!("{} classes from '{}'", classes.len(), config.class_list);

    let device   = burn::backend::wgpu::WgpuDevice::default();
    let net      = DetectorNetConfig::new(classes.len()).with_grid(config.grid);
    let detector = BurnDetector::<InferBackend>::new(net, config.img_size, device);

    Ok(BenchmarkRunner::new(
        detector,
        IouRegionGrouper,
        GreedyClassMatcher,
        CheckpointStore::new(&config.checkpoint_dir),
        classes,
        config.settings(),
        config.strategy,
    ))
}
