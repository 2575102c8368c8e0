// ============================================================
// Layer 2 — SeriesBenchmarkUseCase
// ============================================================
// Sweeps a prefix's whole training history:
//
//   Step 1: Derive iteration splits         (Layer 4 - data)
//   Step 2: Build the standing test sets     (Layer 4 - data)
//   Step 3: Append the newest checkpoint's epoch
//   Step 4: Create the series folder, record mode and config
//           (an existing, differing record is kept and warned about)
//   Step 5: For each iteration i, each epoch in
//           [split[i-1], split[i]] stepping by delta,
//           each live test set → one results file
//
// Skipped points:
//   - iteration 0 for any prefix other than "init"
//   - epoch 0
//   - the iteration's start epoch for every standing set; only
//     cur_iter{i} is benchmarked at the split point
//   - any point whose results file already exists
//
// The last rule makes the sweep resumable: re-running after an
// interruption only computes what is missing.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{bail, Context, Result};
use std::{fs, path::PathBuf};

use crate::application::config::{BenchConfig, BenchMode, SeriesRecord};
use crate::application::runner::BenchmarkRunner;
use crate::data::{
    compositions::TestSetCompositions,
    epoch_splits::{derive_epoch_splits, derive_epoch_splits_with_final},
};
use crate::domain::traits::{Detector, RegionGrouper, RegionMatcher};
use crate::infra::checkpoint::INIT_PREFIX;

/// Points computed and skipped by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub computed: usize,
    pub skipped:  usize,
}

pub struct SeriesBenchmarkUseCase<D, G, M> {
    config: BenchConfig,
    runner: BenchmarkRunner<D, G, M>,
    prefix: String,
    mode:   BenchMode,
    delta:  u32,
}

impl<D, G, M> SeriesBenchmarkUseCase<D, G, M>
where
    D: Detector,
    G: RegionGrouper,
    M: RegionMatcher,
{
    pub fn new(
        config: BenchConfig,
        runner: BenchmarkRunner<D, G, M>,
        prefix: impl Into<String>,
        mode:   BenchMode,
        delta:  u32,
    ) -> Self {
        Self { config, runner, prefix: prefix.into(), mode, delta }
    }

    #[cfg(test)]
    pub fn runner(&self) -> &BenchmarkRunner<D, G, M> {
        &self.runner
    }

    /// `{output_dir}/{prefix}-series[-avg|-roll-avg]`
    pub fn series_folder(&self) -> PathBuf {
        PathBuf::from(&self.config.output_dir)
            .join(format!("{}-series{}", self.prefix, self.mode.folder_suffix()))
    }

    pub fn execute(&mut self) -> Result<SweepReport> {
        if self.delta == 0 {
            bail!("Epoch step must be at least 1");
        }
        let out_dir = PathBuf::from(&self.config.output_dir);
        let prefix  = self.prefix.clone();

        // ── Steps 1–3: splits and test sets ──────────────────────────────────
        let completed = derive_epoch_splits(&out_dir, &prefix)?;
        let mut sets  = TestSetCompositions::build(
            &out_dir,
            self.runner.classes().len(),
            &prefix,
            &self.config.sample_marker,
            completed.len(),
        )?;
        let splits = derive_epoch_splits_with_final(&out_dir, &prefix, self.runner.checkpoints())?;
        tracing::info!("Series '{}': iteration splits {:?}", prefix, splits);

        // ── Step 4: output folder ────────────────────────────────────────────
        let folder = self.series_folder();
        fs::create_dir_all(&folder)
            .with_context(|| format!("Cannot create '{}'", folder.display()))?;
        SeriesRecord::new(self.mode, self.config.clone()).claim(&folder)?;

        // ── Step 5: sweep ────────────────────────────────────────────────────
        let mut report = SweepReport::default();
        for (i, &split) in splits.iter().enumerate() {
            if i == 0 && prefix != INIT_PREFIX {
                continue;
            }
            sets.begin_iteration(i)?;

            let start = if i == 0 { 0 } else { splits[i - 1] };
            tracing::info!("Iteration {}: epochs {}..={} step {}", i, start, split, self.delta);
            tracing::debug!("Live test sets: {:?}", sets.names());

            for epoch in (start..=split).step_by(self.delta as usize) {
                for (name, set) in sets.iter() {
                    if epoch == 0 || (epoch == start && !name.is_transient()) {
                        continue;
                    }
                    let out    = folder.join(format!("{name}_{epoch}.csv"));
                    let window = self.mode.window(epoch, self.config.avg_window);
                    if self.runner.run_point(set, &prefix, &window, &out)? {
                        report.computed += 1;
                    } else {
                        report.skipped += 1;
                    }
                }
            }

            sets.end_iteration(i);
        }

        tracing::info!(
            "Series '{}' done: {} computed, {} already present",
            prefix,
            report.computed,
            report.skipped
        );
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
    use std::path::Path;

    type Series = SeriesBenchmarkUseCase<ScriptedDetector, IouRegionGrouper, GreedyClassMatcher>;

    /// Output dir with one finished iteration (split at epoch 2) and
    /// checkpoints up to epoch 4.
    fn fixture(root: &Path) -> BenchConfig {
        let out  = root.join("output");
        let ckpt = root.join("checkpoints");
        fs::create_dir_all(&out).unwrap();
        fs::create_dir_all(&ckpt).unwrap();

        let seen   = write_labeled_image(root, "seen.jpg", &[0]);
        let picked = write_labeled_image(root, "sample_picked.jpg", &[1]);
        fs::write(out.join("init_test.txt"), format!("{seen}\n")).unwrap();
        fs::write(out.join("al0_test.txt"), format!("{picked}\n# comment\n{seen}\n")).unwrap();
        fs::write(out.join("al0_sample_2.txt"), format!("{picked}\n")).unwrap();
        fs::write(ckpt.join("al1_ckpt_4.mpk.gz"), b"").unwrap();

        BenchConfig {
            output_dir:     out.to_string_lossy().to_string(),
            checkpoint_dir: ckpt.to_string_lossy().to_string(),
            sample_marker:  "sample_picked".to_string(),
            ..Default::default()
        }
    }

    fn series(config: &BenchConfig, prefix: &str, mode: BenchMode) -> Series {
        let runner = BenchmarkRunner::new(
            ScriptedDetector::default(),
            IouRegionGrouper,
            GreedyClassMatcher,
            CheckpointStore::new(&config.checkpoint_dir),
            ClassList::new(vec!["cat".into(), "dog".into()]),
            config.settings(),
            config.strategy,
        );
        SeriesBenchmarkUseCase::new(config.clone(), runner, prefix, mode, 2)
    }

    fn csv_names(folder: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(folder)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|n| n.ends_with(".csv"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_sweep_writes_expected_points() {
        let dir    = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());

        let mut s  = series(&config, "al", BenchMode::Single);
        let report = s.execute().unwrap();

        let folder = s.series_folder();
        assert!(folder.ends_with("al-series"));
        assert!(folder.join("bench_config.json").exists());
        assert_eq!(
            csv_names(&folder),
            [
                "all_4.csv",
                "all_iter_4.csv",
                "cur_iter1_2.csv",
                "cur_iter1_4.csv",
                "init_4.csv",
                "sample_4.csv",
            ]
        );
        assert_eq!(report, SweepReport { computed: 6, skipped: 0 });
    }

    #[test]
    fn test_second_run_performs_no_inference() {
        let dir    = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());

        let mut first = series(&config, "al", BenchMode::Rolling(3));
        first.execute().unwrap();
        assert!(first.runner().detector().detect_calls > 0);

        let mut second = series(&config, "al", BenchMode::Rolling(3));
        let report     = second.execute().unwrap();
        assert_eq!(second.runner().detector().detect_calls, 0);
        assert_eq!(report.computed, 0);
        assert_eq!(report.skipped, 6);
    }

    #[test]
    fn test_changed_roll_size_keeps_original_record() {
        let dir    = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());

        let mut first = series(&config, "al", BenchMode::Rolling(3));
        first.execute().unwrap();
        let folder = first.series_folder();
        let record = SeriesRecord::load(&folder).unwrap();
        assert_eq!(record.mode, BenchMode::Rolling(3));

        let mut second = series(&config, "al", BenchMode::Rolling(10));
        assert_eq!(second.series_folder(), folder);
        second.execute().unwrap();
        assert_eq!(SeriesRecord::load(&folder).unwrap(), record);
        assert!(!SeriesRecord::new(BenchMode::Rolling(10), config).claim(&folder).unwrap());
    }

    #[test]
    fn test_rolling_folder_name() {
        let dir    = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());
        assert!(series(&config, "al", BenchMode::Rolling(3)).series_folder().ends_with("al-series-roll-avg"));
        assert!(series(&config, "al", BenchMode::Average).series_folder().ends_with("al-series-avg"));
    }

    #[test]
    fn test_no_splits_means_nothing_to_do() {
        let dir    = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());

        // "zz" has no sample sets and no checkpoints
        let mut s  = series(&config, "zz", BenchMode::Single);
        let report = s.execute().unwrap();
        assert_eq!(report, SweepReport::default());
        assert_eq!(s.runner().detector().detect_calls, 0);
    }

    #[test]
    fn test_zero_delta_is_rejected() {
        let dir    = tempfile::tempdir().unwrap();
        let config = fixture(dir.path());
        let mut s  = series(&config, "al", BenchMode::Single);
        s.delta    = 0;
        assert!(s.execute().is_err());
    }
}
