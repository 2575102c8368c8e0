// ============================================================
// Layer 6 — Checkpoint Resolution
// ============================================================
// Finds the checkpoint to load for (prefix, epoch).
//
// Checkpoints are Burn CompactRecorder records (.mpk.gz) named
//
//   checkpoints/
//     init_ckpt_1.mpk.gz       ← shared base model, epoch 1
//     init_ckpt_2.mpk.gz
//     al0_ckpt_14.mpk.gz       ← prefix "al", iteration 0, epoch 14
//     al1_ckpt_27.mpk.gz
//
// A prefix starts training from the shared "init" model, so early
// epochs have no prefix-specific file. Those resolve to
// `init_ckpt_{epoch}` instead; that fallback is not an error.
//
// Paths returned here carry no extension: the recorder appends
// `.mpk.gz` itself when loading.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::data::files::{list_matching, sort_by_epoch};

/// File extension written by `CompactRecorder`.
pub const CHECKPOINT_EXT: &str = "mpk.gz";

/// Prefix of the shared base model.
pub const INIT_PREFIX: &str = "init";

/// Read-only view of the checkpoint directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Extension-less path for `prefix` at `epoch`, falling back to
    /// `init_ckpt_{epoch}` when no prefix-specific file exists.
    pub fn resolve(&self, prefix: &str, epoch: u32) -> Result<PathBuf> {
        let suffix  = format!("_ckpt_{epoch}.{CHECKPOINT_EXT}");
        let matches = list_matching(&self.dir, |name| {
            name.starts_with(prefix) && name.ends_with(&suffix)
        })?;

        match matches.first() {
            Some(file) => Ok(strip_extension(file)),
            None => {
                let fallback = self.dir.join(format!("{INIT_PREFIX}_ckpt_{epoch}"));
                if !record_file(&fallback).exists() {
                    tracing::warn!("No checkpoint for epoch {} in '{}'", epoch, self.dir.display());
                }
                tracing::debug!(
                    "No '{}' checkpoint for epoch {}; using '{}'",
                    prefix,
                    epoch,
                    fallback.display()
                );
                Ok(fallback)
            }
        }
    }

    /// Epoch of the newest checkpoint whose name starts with `prefix`.
    pub fn latest_epoch(&self, prefix: &str) -> Result<Option<u32>> {
        let ext   = format!(".{CHECKPOINT_EXT}");
        let files = list_matching(&self.dir, |name| name.starts_with(prefix) && name.ends_with(&ext))?;
        Ok(sort_by_epoch(files).last().map(|(epoch, _)| *epoch))
    }
}

/// On-disk file for an extension-less checkpoint path.
pub fn record_file(base: &Path) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(CHECKPOINT_EXT);
    PathBuf::from(name)
}

fn strip_extension(file: &Path) -> PathBuf {
    let text = file.to_string_lossy();
    let ext  = format!(".{CHECKPOINT_EXT}");
    PathBuf::from(text.strip_suffix(&ext).unwrap_or(&text).to_string())
}
