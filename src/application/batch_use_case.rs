// ============================================================
// Layer 2 — BatchBenchmarkUseCase
// ============================================================
// Two benchmarks over the `sample{N}.txt` batch sets that the
// sampler writes into the output directory.
//
// Batch sets (`batch`):
//   batch set i is benchmarked with the checkpoints trained up to
//   split i, i.e. how well the model knew the batch before
//   training on it.
//     {out}/{prefix}{i}_benchmark_{avg|roll}_1_{end}.csv
//   Stops at the first incomplete batch (fewer images than
//   sampling_batch).
//
// Held-out test (`batch-test`):
//   the newest batch sets are pooled into one test set; every
//   split whose training never saw them is benchmarked on it.
//     {out}/{prefix}{i}_avg_benchmark_test_{end}.csv
//
//   newest → oldest:
//     incomplete set          → pooled
//     full set, reserve > 0   → pooled, reserve -= 1
//     full set, reserve == 0  → kept for training
//
// Existing files are skipped in both modes.

use anyhow::Result;
use std::path::PathBuf;

use crate::application::config::BenchConfig;
use crate::application::runner::BenchmarkRunner;
use crate::application::series_use_case::SweepReport;
use crate::data::{
    epoch_splits::{batch_set_files, derive_epoch_splits_with_final},
    files::read_lines,
    labeled_set::LabeledImageSet,
};
use crate::domain::traits::{Detector, RegionGrouper, RegionMatcher};
use crate::infra::checkpoint::INIT_PREFIX;
use crate::ml::window::{CheckpointWindow, WindowStrategy};

/// Default rolling window of the held-out test benchmark.
pub const DEFAULT_TEST_ROLL: usize = 10;

pub struct BatchBenchmarkUseCase<D, G, M> {
    config: BenchConfig,
    runner: BenchmarkRunner<D, G, M>,
    prefix: String,
}

impl<D, G, M> BatchBenchmarkUseCase<D, G, M>
where
    D: Detector,
    G: RegionGrouper,
    M: RegionMatcher,
{
    pub fn new(config: BenchConfig, runner: BenchmarkRunner<D, G, M>, prefix: impl Into<String>) -> Self {
        Self { config, runner, prefix: prefix.into() }
    }

    #[cfg(test)]
    pub fn runner(&self) -> &BenchmarkRunner<D, G, M> {
        &self.runner
    }

    /// Benchmark each full batch set against the checkpoints that
    /// preceded it. `roll` selects a rolling window of that size;
    /// otherwise `conf_check_num` epochs are spread over [1, end].
    pub fn execute_batch_sets(&mut self, roll: Option<usize>) -> Result<SweepReport> {
        let out_dir    = PathBuf::from(&self.config.output_dir);
        let prefix     = self.prefix.clone();
        let batch_sets = batch_set_files(&out_dir)?;

        let mut splits = derive_epoch_splits_with_final(&out_dir, &prefix, self.runner.checkpoints())?;
        if prefix == INIT_PREFIX {
            splits = splits.repeat(batch_sets.len());
        }

        let (size, strategy, tag) = match roll {
            Some(n) => (n, WindowStrategy::Rolling, "roll"),
            None    => (self.config.conf_check_num, WindowStrategy::Fixed, "avg"),
        };

        let mut report = SweepReport::default();
        for (i, file) in batch_sets.iter().enumerate() {
            let set = LabeledImageSet::from_list_file(file, self.runner.classes().len())?;
            if set.len() < self.config.sampling_batch {
                tracing::info!(
                    "'{}' holds {} images (< {}); stopping",
                    file.display(),
                    set.len(),
                    self.config.sampling_batch
                );
                break;
            }
            let Some(&end) = splits.get(i) else {
                tracing::warn!("No epoch split for batch set {}; stopping", i);
                break;
            };

            let out    = out_dir.join(format!("{prefix}{i}_benchmark_{tag}_1_{end}.csv"));
            let window = CheckpointWindow::select(1, end, size, strategy);
            if self.runner.run_point(&set, &prefix, &window, &out)? {
                report.computed += 1;
            } else {
                report.skipped += 1;
            }
        }
        Ok(report)
    }

    /// Benchmark every split that never trained on the pooled newest
    /// batch sets, using a rolling window of `roll` epochs.
    pub fn execute_held_out(&mut self, reserve_batches: usize, roll: usize) -> Result<SweepReport> {
        let out_dir    = PathBuf::from(&self.config.output_dir);
        let prefix     = self.prefix.clone();
        let batch_sets = batch_set_files(&out_dir)?;
        let mut splits = derive_epoch_splits_with_final(&out_dir, &prefix, self.runner.checkpoints())?;

        let mut pooled  = Vec::new();
        let mut removed = 0;
        let mut reserve = reserve_batches;
        for file in batch_sets.iter().rev() {
            let images     = read_lines(file)?;
            let incomplete = images.len() < self.config.sampling_batch;
            if incomplete || reserve > 0 {
                pooled.extend(images);
                removed += 1;
                if !incomplete {
                    reserve -= 1;
                }
            }
        }

        if prefix != INIT_PREFIX && removed > 0 {
            splits.truncate(splits.len().saturating_sub(removed));
        }
        let test_set = LabeledImageSet::new(pooled, self.runner.classes().len());
        tracing::info!(
            "Held-out test set: {} images from {} batch sets; splits {:?}",
            test_set.len(),
            removed,
            splits
        );

        let mut report = SweepReport::default();
        for (i, &end) in splits.iter().enumerate() {
            let out    = out_dir.join(format!("{prefix}{i}_avg_benchmark_test_{end}.csv"));
            let window = CheckpointWindow::select(1, end, roll, WindowStrategy::Rolling);
            if self.runner.run_point(&test_set, &prefix, &window, &out)? {
                report.computed += 1;
            } else {
                report.skipped += 1;
            }
        }
        Ok(report)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::files::ClassList;
    use crate::infra::checkpoint::CheckpointStore;
    use crate::ml::grouping::{GreedyClassMatcher, IouRegionGrouper};
    use crate::ml::testing::{write_labeled_image, ScriptedDetector};
    use std::{fs, path::Path};

    type Batch = BatchBenchmarkUseCase<ScriptedDetector, IouRegionGrouper, GreedyClassMatcher>;

    /// Batch sets of 2, 2 and 1 images; "al" splits at 3 and 6,
    /// newest checkpoint at epoch 9.
    fn fixture(root: &Path) -> BenchConfig {
        let out  = root.join("output");
        let ckpt = root.join("checkpoints");
        fs::create_dir_all(&out).unwrap();
        fs::create_dir_all(&ckpt).unwrap();

        let imgs: Vec<String> = (0..5)
            .map(|n| write_labeled_image(root, &format!("img{n}.jpg"), &[n % 2]))
            .collect();
        fs::write(out.join("sample1.txt"), format!("{}\n{}\n", imgs[0], imgs[1])).unwrap();
        fs::write(out.join("sample2.txt"), format!("{}\n{}\n", imgs[2], imgs[3])).unwrap();
        fs::write(out.join("sample3.txt"), format!("{}\n", imgs[4])).unwrap();
        fs::write(out.join("al0_sample_3.txt"), "").unwrap();
        fs::write(out.join("al1_sample_6.txt"), "").unwrap();
        fs::write(ckpt.join("al2_ckpt_9.mpk.gz"), b"").unwrap();

        BenchConfig {
            output_dir:     out.to_string_lossy().to_string(),
            checkpoint_dir: ckpt.to_string_lossy().to_string(),
            sampling_batch: 2,
            conf_check_num: 3,
            ..Default::default()
        }
    }

    fn batch(config: &BenchConfig, prefix: &str) -> Batch {
        let runner = BenchmarkRunner::new(
            ScriptedDetector::default(),
            IouRegionGrouper,
            GreedyClassMatcher,
            CheckpointStore::new(&config.checkpoint_dir),
            ClassList::new(vec!["cat".into(), "dog".into()]),
            config.settings(),
            config.strategy,
        );
        BatchBenchmarkUseCase::new(config.clone(), runner, prefix)
    }

    #[test]
    fn test_batch_sets_stop_at_incomplete_batch() {
        let dir    = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());
        let out    = PathBuf::from(&config.output_dir);

        let mut b  = batch(&config, "al");
        let report = b.execute_batch_sets(None).unwrap();

        assert_eq!(report.computed, 2);
        assert!(out.join("al0_benchmark_avg_1_3.csv").exists());
        assert!(out.join("al1_benchmark_avg_1_6.csv").exists());
        assert!(!out.join("al2_benchmark_avg_1_9.csv").exists());
        // Windows [1,2,3] and [1,4,6] ([1, 3.5, 6] rounded), 2 images each
        assert_eq!(b.runner().detector().detect_calls, 12);
    }

    #[test]
    fn test_batch_sets_roll_file_names() {
        let dir    = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());
        let out    = PathBuf::from(&config.output_dir);

        let mut b = batch(&config, "al");
        b.execute_batch_sets(Some(2)).unwrap();
        assert!(out.join("al0_benchmark_roll_1_3.csv").exists());
        assert!(out.join("al1_benchmark_roll_1_6.csv").exists());
    }

    #[test]
    fn test_init_prefix_repeats_splits() {
        let dir    = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());
        let out    = PathBuf::from(&config.output_dir);
        fs::write(out.join("init_sample_4.txt"), "").unwrap();
        fs::write(PathBuf::from(&config.checkpoint_dir).join("init_ckpt_4.mpk.gz"), b"").unwrap();

        let mut b = batch(&config, "init");
        b.execute_batch_sets(Some(1)).unwrap();
        // splits [4, 4] repeated for three batch sets; set 3 is incomplete
        assert!(out.join("init0_benchmark_roll_1_4.csv").exists());
        assert!(out.join("init1_benchmark_roll_1_4.csv").exists());
    }

    #[test]
    fn test_held_out_pools_newest_sets() {
        let dir    = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());
        let out    = PathBuf::from(&config.output_dir);

        // sample3 is incomplete, sample2 is reserved → splits [3, 6, 9] lose two
        let mut b  = batch(&config, "al");
        let report = b.execute_held_out(1, DEFAULT_TEST_ROLL).unwrap();

        assert_eq!(report.computed, 1);
        assert!(out.join("al0_avg_benchmark_test_3.csv").exists());
        // rolling window [1, 2, 3] over the 3 pooled images
        assert_eq!(b.runner().detector().detect_calls, 9);

        let text = fs::read_to_string(out.join("al0_avg_benchmark_test_3.csv")).unwrap();
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_held_out_without_reserve_keeps_full_sets() {
        let dir    = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());
        let out    = PathBuf::from(&config.output_dir);

        let mut b  = batch(&config, "al");
        let report = b.execute_held_out(0, 2).unwrap();

        // only the incomplete sample3 is pooled → splits [3, 6]
        assert_eq!(report.computed, 2);
        assert!(out.join("al1_avg_benchmark_test_6.csv").exists());
        assert!(!out.join("al2_avg_benchmark_test_9.csv").exists());
    }
}
