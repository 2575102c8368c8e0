// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-system concerns shared by the use cases:
//
//   checkpoint.rs — resolves (prefix, epoch) to a CompactRecorder
//                   file, with the shared "init" fallback
//
//   results.rs    — writes one benchmark table as CSV, atomically
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Checkpoint lookup by prefix and epoch
pub mod checkpoint;

/// CSV result tables
pub mod results;
