// ============================================================
// Layer 4 — Data Layer
// ============================================================
// Everything read from the output directory before a single
// checkpoint is loaded:
//
//   files         → line lists, class names, label paths,
//                   epoch / batch numbers in file names
//   labeled_set   → image path sets with lazy ground truths
//   epoch_splits  → iteration boundary epochs per prefix
//   compositions  → the named test sets of a sweep
//
// Reference: Rust Book §8 (Collections)
//            Rust Book §12 (I/O and File Handling)

/// Line-list reader and file naming conventions
pub mod files;

/// Ordered, de-duplicated image sets
pub mod labeled_set;

/// Iteration boundary epochs derived from sample-set names
pub mod epoch_splits;

/// Standing and transient test sets for a sweep
pub mod compositions;
