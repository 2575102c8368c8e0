// ============================================================
// Layer 4 — Labelled Image Set
// ============================================================
// An ordered, de-duplicated list of image paths plus the number
// of classes in the run. Ground truths are read lazily from the
// darknet label file next to each image: one object per line,
// class id first.
//
//   data/images/a.jpg  →  data/labels/a.txt
//                          "2 0.51 0.40 0.10 0.12"
//                          "0 0.20 0.33 0.05 0.08"
//
// Reference: Rust Book §8 (Collections)

use anyhow::{Context, Result};
use std::{collections::HashSet, fs, path::Path};

use crate::data::files::{label_path, read_lines};
use crate::domain::detection::ClassId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledImageSet {
    paths:       Vec<String>,
    num_classes: usize,
}

impl LabeledImageSet {
    /// Build from paths, keeping the first occurrence of each.
    pub fn new(paths: impl IntoIterator<Item = String>, num_classes: usize) -> Self {
        let mut set = Self { paths: Vec::new(), num_classes };
        set.push_unique(paths);
        set
    }

    /// Load a newline-delimited list of image paths.
    pub fn from_list_file(path: impl AsRef<Path>, num_classes: usize) -> Result<Self> {
        let paths = read_lines(path)?;
        Ok(Self::new(paths, num_classes))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Union with `other`, appending its images not already present.
    pub fn extend(&mut self, other: &LabeledImageSet) {
        self.push_unique(other.paths.iter().cloned());
    }

    /// Images whose path satisfies `keep`, in the same order.
    pub fn filter(&self, keep: impl Fn(&str) -> bool) -> Self {
        Self {
            paths:       self.paths.iter().filter(|p| keep(p)).cloned().collect(),
            num_classes: self.num_classes,
        }
    }

    /// Distinct class ids labelled in `image`, in file order.
    ///
    /// An image without a label file has no ground truth. Ids outside
    /// `0..num_classes` are skipped with a warning.
    pub fn ground_truths(&self, image: &str) -> Result<Vec<ClassId>> {
        let path = label_path(image);
        if !path.exists() {
            tracing::debug!("No label file for '{}'", image);
            return Ok(Vec::new());
        }

        let text = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read label file '{}'", path.display()))?;

        let mut classes = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let token = line.split_whitespace().next().unwrap_or_default();
            let id: ClassId = token.parse().with_context(|| {
                format!("Bad class id '{}' in '{}'", token, path.display())
            })?;
            if id >= self.num_classes {
                tracing::warn!(
                    "Skipping class {} in '{}' ({} classes configured)",
                    id,
                    path.display(),
                    self.num_classes
                );
                continue;
            }
            if !classes.contains(&id) {
                classes.push(id);
            }
        }
        Ok(classes)
    }

    fn push_unique(&mut self, paths: impl IntoIterator<Item = String>) {
        let mut seen: HashSet<String> = self.paths.iter().cloned().collect();
        for path in paths {
            if seen.insert(path.clone()) {
                self.paths.push(path);
            }
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn set(paths: &[&str]) -> LabeledImageSet {
        LabeledImageSet::new(paths.iter().map(|p| p.to_string()), 3)
    }

    #[test]
    fn test_new_deduplicates_preserving_order() {
        let s = set(&["b.jpg", "a.jpg", "b.jpg"]);
        assert_eq!(s.paths(), ["b.jpg", "a.jpg"]);
    }

    #[test]
    fn test_extend_is_union() {
        let mut s = set(&["a.jpg", "b.jpg"]);
        s.extend(&set(&["b.jpg", "c.jpg"]));
        assert_eq!(s.paths(), ["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_filter_keeps_order() {
        let s = set(&["x/sample/1.jpg", "x/seen/2.jpg", "x/sample/3.jpg"]);
        let f = s.filter(|p| p.contains("sample"));
        assert_eq!(f.paths(), ["x/sample/1.jpg", "x/sample/3.jpg"]);
        assert_eq!(f.num_classes, 3);
    }

    #[test]
    fn test_ground_truths_from_label_file() {
        let dir    = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        let labels = dir.path().join("labels");
        fs::create_dir_all(&images).unwrap();
        fs::create_dir_all(&labels).unwrap();
        fs::write(labels.join("a.txt"), "2 0.5 0.5 0.1 0.1\n0 0.2 0.2 0.1 0.1\n2 0.7 0.7 0.1 0.1\n9 0.1 0.1 0.1 0.1\n").unwrap();

        let image = images.join("a.jpg").to_string_lossy().to_string();
        let s     = LabeledImageSet::new(vec![image.clone()], 3);
        assert_eq!(s.ground_truths(&image).unwrap(), vec![2, 0]);
    }

    #[test]
    fn test_missing_label_file_means_no_ground_truth() {
        let s = set(&["nowhere/images/a.jpg"]);
        assert!(s.ground_truths("nowhere/images/a.jpg").unwrap().is_empty());
    }
}
