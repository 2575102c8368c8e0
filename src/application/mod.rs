// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to produce result
// files for one kind of benchmark run.
//
// Rules for this layer:
//   - No model or box math here (that's Layer 5)
//   - No argument parsing or printing (that's Layer 1)
//   - File naming and sweep order live here; reading and
//     writing files is delegated to Layers 4 and 6
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Settings shared by every run
pub mod config;

// One benchmark point: skip-if-present, aggregate, save
pub mod runner;

// Full history sweep over iterations × epochs × test sets
pub mod series_use_case;

// Batch-set and held-out batch test benchmarks
pub mod batch_use_case;
