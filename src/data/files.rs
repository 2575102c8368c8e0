// ============================================================
// Layer 4 — Line Files and Naming Conventions
// ============================================================
// Everything on disk this tool reads is either a newline-delimited
// list (test sets, sample sets, class names) or a darknet label
// file next to an image. Checkpoints and sample sets carry their
// epoch as the last `_`-separated token of the file name:
//
//   init_ckpt_12.mpk.gz        → epoch 12
//   al0_sample_30.txt          → epoch 30
//   sample4.txt                → batch 4 (no epoch)
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::detection::ClassId;

/// Read a newline-delimited list, trimming each line and dropping
/// blank lines and any line containing a `#`.
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    Ok(text
        .lines()
        .filter(|line| !line.is_empty() && !line.contains('#'))
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Class names, indexed by class id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassList {
    names: Vec<String>,
}

impl ClassList {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let names = read_lines(path)?;
        tracing::debug!("Loaded {} class names", names.len());
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, id: ClassId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Label for a class id; ids outside the list render as the number.
    pub fn label(&self, id: ClassId) -> String {
        self.name(id).map(str::to_string).unwrap_or_else(|| id.to_string())
    }
}

/// `.../images/x.jpg` → `.../labels/x.txt`
pub fn label_path(image: &str) -> PathBuf {
    PathBuf::from(image.replace("images", "labels")).with_extension("txt")
}

/// Parse the trailing epoch from a file name; `None` when the last
/// `_` token does not start with digits.
pub fn parse_epoch(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    let last = name.rsplit('_').next()?;
    let digits = last.split('.').next()?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parse N from `sample{N}.txt`.
pub fn parse_sample_index(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    let tail = name.rsplit("sample").next()?;
    tail.strip_suffix(".txt")?.parse().ok()
}

/// Files directly inside `dir` whose name satisfies `keep`, sorted by
/// name. A missing directory yields an empty list.
pub fn list_matching(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        tracing::warn!("Directory '{}' does not exist, nothing to list", dir.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
    {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|name| keep(name))
            .unwrap_or(false);
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Keep only files with a parseable epoch, ordered by it (stable).
pub fn sort_by_epoch(files: Vec<PathBuf>) -> Vec<(u32, PathBuf)> {
    let mut with_epoch: Vec<(u32, PathBuf)> = files
        .into_iter()
        .filter_map(|p| parse_epoch(&p).map(|e| (e, p)))
        .collect();
    with_epoch.sort_by_key(|(epoch, _)| *epoch);
    with_epoch
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_lines_strips_blanks_and_comments() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        fs::write(&path, "a.jpg\n\n# header\n  b.jpg  \nc.jpg # note\n").unwrap();
        assert_eq!(read_lines(&path).unwrap(), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_read_lines_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_lines(dir.path().join("nope.txt")).is_err());
    }

    #[test]
    fn test_label_path() {
        assert_eq!(
            label_path("data/images/frame_01.jpg"),
            PathBuf::from("data/labels/frame_01.txt")
        );
    }

    #[test]
    fn test_parse_epoch() {
        assert_eq!(parse_epoch(Path::new("out/al_sample_15.txt")), Some(15));
        assert_eq!(parse_epoch(Path::new("ck/init_ckpt_7.mpk.gz")), Some(7));
        assert_eq!(parse_epoch(Path::new("out/init_test.txt")), None);
        assert_eq!(parse_epoch(Path::new("out/sample3.txt")), None);
    }

    #[test]
    fn test_parse_sample_index() {
        assert_eq!(parse_sample_index(Path::new("out/sample12.txt")), Some(12));
        assert_eq!(parse_sample_index(Path::new("out/notes.txt")), None);
    }

    #[test]
    fn test_sort_by_epoch_ignores_unparseable() {
        let files = vec![
            PathBuf::from("p_sample_40.txt"),
            PathBuf::from("p_sample_5.txt"),
            PathBuf::from("p_sample_x.txt"),
            PathBuf::from("p_sample_15.txt"),
        ];
        let epochs: Vec<u32> = sort_by_epoch(files).into_iter().map(|(e, _)| e).collect();
        assert_eq!(epochs, vec![5, 15, 40]);
    }

    #[test]
    fn test_class_list_label_falls_back_to_id() {
        let classes = ClassList::new(vec!["cat".into(), "dog".into()]);
        assert_eq!(classes.label(1), "dog");
        assert_eq!(classes.label(7), "7");
    }
}
