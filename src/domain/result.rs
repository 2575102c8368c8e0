// ============================================================
// Layer 3 — Benchmark Result Rows
// ============================================================
// One row per (image, matched region) or (image, missed ground
// truth). Rows are created once during aggregation and never
// mutated afterwards.
//
// `actual` is empty when the ground truth for a region could not
// be resolved; `detected` is empty when nothing was detected for
// a ground truth. Empty-actual rows are excluded from accuracy.

use serde::{Deserialize, Serialize};

use crate::domain::traits::TabularRow;

/// Labels agree only when there is a real ground truth to agree with.
pub fn is_hit(actual: &str, detected: &str) -> bool {
    !actual.is_empty() && actual == detected
}

/// Region-based benchmark row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub file:     String,
    pub actual:   String,
    pub detected: String,
    pub conf:     f64,
    pub conf_std: f64,
    pub hit:      bool,
}

impl ResultRow {
    pub fn new(
        file:     impl Into<String>,
        actual:   impl Into<String>,
        detected: impl Into<String>,
        conf:     f64,
        conf_std: f64,
    ) -> Self {
        let actual   = actual.into();
        let detected = detected.into();
        let hit      = is_hit(&actual, &detected);
        Self { file: file.into(), actual, detected, conf, conf_std, hit }
    }

    /// Row for a ground truth no region was matched to.
    pub fn missed(file: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            file:     file.into(),
            actual:   actual.into(),
            detected: String::new(),
            conf:     0.0,
            conf_std: 0.0,
            hit:      false,
        }
    }
}

impl TabularRow for ResultRow {
    const COLUMNS: &'static [&'static str] =
        &["file", "actual", "detected", "conf", "conf_std", "hit"];

    fn file(&self) -> &str {
        &self.file
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.file.clone(),
            self.actual.clone(),
            self.detected.clone(),
            format!("{:.6}", self.conf),
            format!("{:.6}", self.conf_std),
            self.hit.to_string(),
        ]
    }
}

/// Row produced by the per-class accumulation strategy.
/// `confs` keeps every recorded class confidence, keyed by class label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyResultRow {
    pub file:     String,
    pub confs:    std::collections::BTreeMap<String, Vec<f32>>,
    pub actual:   String,
    pub detected: String,
    pub conf:     f64,
    pub hit:      bool,
}

impl TabularRow for LegacyResultRow {
    const COLUMNS: &'static [&'static str] =
        &["file", "confs", "actual", "detected", "conf", "hit"];

    fn file(&self) -> &str {
        &self.file
    }

    fn fields(&self) -> Vec<String> {
        let confs = serde_json::to_string(&self.confs).unwrap_or_default();
        vec![
            self.file.clone(),
            confs,
            self.actual.clone(),
            self.detected.clone(),
            format!("{:.6}", self.conf),
            self.hit.to_string(),
        ]
    }
}

/// Aggregate view over a results table, logged after each benchmark point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResultSummary {
    pub rows:      usize,
    /// Rows with a non-empty ground truth
    pub scored:    usize,
    pub hits:      usize,
    pub mean_conf: f64,
}

impl ResultSummary {
    pub fn from_rows(rows: &[ResultRow]) -> Self {
        let scored = rows.iter().filter(|r| !r.actual.is_empty()).count();
        let hits   = rows.iter().filter(|r| r.hit).count();
        let mean_conf = if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|r| r.conf).sum::<f64>() / rows.len() as f64
        };
        Self { rows: rows.len(), scored, hits, mean_conf }
    }

    /// Summary of a legacy table; `mean_conf` is the mean winning class mean.
    pub fn from_legacy_rows(rows: &[LegacyResultRow]) -> Self {
        let scored = rows.iter().filter(|r| !r.actual.is_empty()).count();
        let hits   = rows.iter().filter(|r| r.hit).count();
        let mean_conf = if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|r| r.conf).sum::<f64>() / rows.len() as f64
        };
        Self { rows: rows.len(), scored, hits, mean_conf }
    }

    /// Hits over scored rows; 0 when nothing could be scored.
    pub fn accuracy(&self) -> f64 {
        if self.scored == 0 {
            0.0
        } else {
            self.hits as f64 / self.scored as f64
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_labels_are_not_a_hit() {
        assert!(!is_hit("", ""));
        assert!(!is_hit("cat", ""));
        assert!(is_hit("cat", "cat"));
    }

    #[test]
    fn test_new_row_computes_hit() {
        let row = ResultRow::new("a.jpg", "dog", "dog", 0.5, 0.0);
        assert!(row.hit);
        let row = ResultRow::new("a.jpg", "", "dog", 0.5, 0.0);
        assert!(!row.hit);
    }

    #[test]
    fn test_summary_excludes_unresolved_rows_from_accuracy() {
        let rows = vec![
            ResultRow::new("a.jpg", "dog", "dog", 0.9, 0.0),
            ResultRow::new("b.jpg", "", "cat", 0.5, 0.0),
            ResultRow::missed("c.jpg", "cat"),
        ];
        let summary = ResultSummary::from_rows(&rows);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.scored, 2);
        assert_eq!(summary.hits, 1);
        assert!((summary.accuracy() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_legacy_fields_serialise_confidences() {
        let mut confs = std::collections::BTreeMap::new();
        confs.insert("dog".to_string(), vec![0.5_f32]);
        let row = LegacyResultRow {
            file: "a.jpg".into(),
            confs,
            actual: "dog".into(),
            detected: "dog".into(),
            conf: 0.5,
            hit: true,
        };
        let fields = row.fields();
        assert_eq!(fields.len(), LegacyResultRow::COLUMNS.len());
        assert_eq!(fields[1], r#"{"dog":[0.5]}"#);
        assert_eq!(row.file(), fields[0]);
    }

    #[test]
    fn test_row_file_is_first_field() {
        let row = ResultRow::missed("img/b.jpg", "cat");
        assert_eq!(row.file(), "img/b.jpg");
        assert_eq!(row.fields()[0], row.file());
    }
}
