// ============================================================
// Layer 4 — Test Set Compositions
// ============================================================
// Builds the named image sets a sweep benchmarks against:
//
//   init       ← {out}/init_test.txt
//   all_iter   ← {out}/{prefix}0_test.txt ∪ {prefix}1_test.txt ∪ …
//   sample     ← all_iter images whose path contains the marker
//   all        ← sample ∪ init
//   cur_iter{i} ← {out}/{prefix}{i-1}_test.txt, only while
//                 iteration i is being benchmarked
//
// The transient set is added by `begin_iteration` and dropped by
// `end_iteration`, so it never shows up in a later iteration.

use anyhow::Result;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::data::files::read_lines;
use crate::data::labeled_set::LabeledImageSet;
use crate::domain::test_set::TestSetName;

pub struct TestSetCompositions {
    sets:            BTreeMap<TestSetName, LabeledImageSet>,
    iteration_files: Vec<PathBuf>,
    num_classes:     usize,
}

impl TestSetCompositions {
    /// Build the four standing sets for `iterations` completed iterations.
    /// Missing per-iteration test files are skipped with a warning;
    /// a missing `init_test.txt` is an error.
    pub fn build(
        output_dir:    &Path,
        num_classes:   usize,
        prefix:        &str,
        sample_marker: &str,
        iterations:    usize,
    ) -> Result<Self> {
        let init = LabeledImageSet::from_list_file(output_dir.join("init_test.txt"), num_classes)?;

        let iteration_files: Vec<PathBuf> = (0..iterations)
            .map(|i| output_dir.join(format!("{prefix}{i}_test.txt")))
            .collect();

        let mut iter_images = Vec::new();
        for file in &iteration_files {
            if !file.exists() {
                tracing::warn!("Iteration test set '{}' not found, skipping", file.display());
                continue;
            }
            iter_images.extend(read_lines(file)?);
        }
        let all_iter = LabeledImageSet::new(iter_images, num_classes);
        let sample   = all_iter.filter(|p| p.contains(sample_marker));
        let mut all  = sample.clone();
        all.extend(&init);

        tracing::info!(
            "Test sets: init={} all_iter={} sample={} all={}",
            init.len(),
            all_iter.len(),
            sample.len(),
            all.len()
        );

        let sets = TestSetName::STANDING
            .into_iter()
            .zip([init, all_iter, sample, all])
            .collect();

        Ok(Self { sets, iteration_files, num_classes })
    }

    /// Add `cur_iter{i}` for iteration i > 0. Returns false when there is
    /// no transient set for this iteration.
    pub fn begin_iteration(&mut self, iteration: usize) -> Result<bool> {
        if iteration == 0 {
            return Ok(false);
        }
        let Some(file) = self.iteration_files.get(iteration - 1) else {
            return Ok(false);
        };
        if !file.exists() {
            tracing::warn!("No test set for iteration {} at '{}'", iteration, file.display());
            return Ok(false);
        }
        let set = LabeledImageSet::from_list_file(file, self.num_classes)?;
        self.sets.insert(TestSetName::CurIter(iteration), set);
        Ok(true)
    }

    /// Drop `cur_iter{i}`.
    pub fn end_iteration(&mut self, iteration: usize) {
        self.sets.remove(&TestSetName::CurIter(iteration));
    }

    /// Live sets in benchmarking order: standing first, then transient.
    pub fn iter(&self) -> impl Iterator<Item = (TestSetName, &LabeledImageSet)> {
        self.sets.iter().map(|(name, set)| (*name, set))
    }

    pub fn names(&self) -> Vec<TestSetName> {
        self.sets.keys().copied().collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path();
        fs::write(out.join("init_test.txt"), "seen/a.jpg\nseen/b.jpg\n").unwrap();
        fs::write(out.join("al0_test.txt"), "batch/c.jpg\nseen/d.jpg\n").unwrap();
        fs::write(out.join("al1_test.txt"), "batch/e.jpg\nseen/a.jpg\n").unwrap();
        dir
    }

    fn get(c: &TestSetCompositions, name: TestSetName) -> Option<&LabeledImageSet> {
        c.iter().find(|(n, _)| *n == name).map(|(_, set)| set)
    }

    #[test]
    fn test_standing_sets() {
        let dir = fixture();
        let c   = TestSetCompositions::build(dir.path(), 2, "al", "batch", 2).unwrap();

        assert_eq!(get(&c, TestSetName::Init).unwrap().paths(), ["seen/a.jpg", "seen/b.jpg"]);
        assert_eq!(
            get(&c, TestSetName::AllIter).unwrap().paths(),
            ["batch/c.jpg", "seen/d.jpg", "batch/e.jpg", "seen/a.jpg"]
        );
        assert_eq!(get(&c, TestSetName::Sample).unwrap().paths(), ["batch/c.jpg", "batch/e.jpg"]);
        assert_eq!(
            get(&c, TestSetName::All).unwrap().paths(),
            ["batch/c.jpg", "batch/e.jpg", "seen/a.jpg", "seen/b.jpg"]
        );
        assert_eq!(c.names(), TestSetName::STANDING.to_vec());
    }

    #[test]
    fn test_transient_set_lifecycle() {
        let dir   = fixture();
        let mut c = TestSetCompositions::build(dir.path(), 2, "al", "batch", 2).unwrap();

        assert!(!c.begin_iteration(0).unwrap());
        assert!(c.begin_iteration(2).unwrap());
        assert_eq!(
            get(&c, TestSetName::CurIter(2)).unwrap().paths(),
            ["batch/e.jpg", "seen/a.jpg"]
        );
        assert_eq!(c.names().last(), Some(&TestSetName::CurIter(2)));

        c.end_iteration(2);
        assert!(get(&c, TestSetName::CurIter(2)).is_none());
        assert_eq!(c.names().len(), 4);
    }

    #[test]
    fn test_missing_iteration_file_is_skipped() {
        let dir = fixture();
        let c   = TestSetCompositions::build(dir.path(), 2, "al", "batch", 3).unwrap();
        assert_eq!(get(&c, TestSetName::AllIter).unwrap().len(), 4);
    }

    #[test]
    fn test_missing_init_set_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TestSetCompositions::build(dir.path(), 2, "al", "batch", 0).is_err());
    }
}
