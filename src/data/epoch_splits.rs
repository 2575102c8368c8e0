// ============================================================
// Layer 4 — Epoch Split Deriver
// ============================================================
// Each retraining iteration ends by writing a sample set named
// `{prefix}…sample…_{epoch}.txt` into the output directory, where
// `epoch` is the last epoch trained in that iteration. Reading
// those names back gives the iteration boundaries:
//
//   al0_sample_5.txt, al1_sample_15.txt, al2_sample_40.txt
//       → [5, 15, 40]
//
// Optionally the newest checkpoint's epoch is appended so the
// iteration still in progress is covered too.
//
// No matching files is not an error: it means no iteration has
// finished yet, and the result is an empty list.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::data::files::{list_matching, parse_sample_index, sort_by_epoch};
use crate::infra::checkpoint::CheckpointStore;

/// Sample-set files for `prefix`, ordered by embedded epoch.
pub fn sample_set_files(output_dir: &Path, prefix: &str) -> Result<Vec<(u32, PathBuf)>> {
    let files = list_matching(output_dir, |name| {
        name.strip_prefix(prefix)
            .map(|rest| rest.contains("sample") && name.ends_with(".txt"))
            .unwrap_or(false)
    })?;
    Ok(sort_by_epoch(files))
}

/// Ascending iteration-boundary epochs for `prefix`.
pub fn derive_epoch_splits(output_dir: &Path, prefix: &str) -> Result<Vec<u32>> {
    let splits: Vec<u32> = sample_set_files(output_dir, prefix)?
        .into_iter()
        .map(|(epoch, _)| epoch)
        .collect();
    tracing::debug!("Epoch splits for '{}': {:?}", prefix, splits);
    Ok(splits)
}

/// Like `derive_epoch_splits`, with the newest checkpoint's epoch appended
/// when one exists.
pub fn derive_epoch_splits_with_final(
    output_dir:  &Path,
    prefix:      &str,
    checkpoints: &CheckpointStore,
) -> Result<Vec<u32>> {
    let mut splits = derive_epoch_splits(output_dir, prefix)?;
    match checkpoints.latest_epoch(prefix)? {
        Some(last) => splits.push(last),
        None => tracing::warn!(
            "No checkpoints for '{}' in '{}'",
            prefix,
            checkpoints.dir().display()
        ),
    }
    Ok(splits)
}

/// `sample{N}.txt` batch sets in the output directory, ordered by N.
pub fn batch_set_files(output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<(u32, PathBuf)> = list_matching(output_dir, |name| {
        name.starts_with("sample") && name.ends_with(".txt")
    })?
    .into_iter()
    .filter_map(|p| parse_sample_index(&p).map(|n| (n, p)))
    .collect();
    files.sort_by_key(|(n, _)| *n);
    Ok(files.into_iter().map(|(_, p)| p).collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_splits_sorted_by_epoch_not_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["al2_sample_40.txt", "al0_sample_5.txt", "al1_sample_15.txt", "al_test.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        assert_eq!(derive_epoch_splits(dir.path(), "al").unwrap(), vec![5, 15, 40]);
    }

    #[test]
    fn test_no_sample_sets_means_no_splits() {
        let dir = tempfile::tempdir().unwrap();
        assert!(derive_epoch_splits(dir.path(), "al").unwrap().is_empty());
        assert!(derive_epoch_splits(&dir.path().join("missing"), "al").unwrap().is_empty());
    }

    #[test]
    fn test_final_epoch_appended() {
        let out  = tempfile::tempdir().unwrap();
        let ckpt = tempfile::tempdir().unwrap();
        fs::write(out.path().join("al0_sample_5.txt"), "").unwrap();
        fs::write(ckpt.path().join("al0_ckpt_5.mpk.gz"), "").unwrap();
        fs::write(ckpt.path().join("al1_ckpt_12.mpk.gz"), "").unwrap();

        let store = CheckpointStore::new(ckpt.path());
        assert_eq!(
            derive_epoch_splits_with_final(out.path(), "al", &store).unwrap(),
            vec![5, 12]
        );
    }

    #[test]
    fn test_batch_sets_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["sample10.txt", "sample2.txt", "sample1.txt", "al0_sample_4.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let names: Vec<String> = batch_set_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["sample1.txt", "sample2.txt", "sample10.txt"]);
    }
}
