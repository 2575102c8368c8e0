// ============================================================
// Layer 5 — ML / Benchmarking Layer (Burn)
// ============================================================
// Everything that touches model outputs lives here. Burn itself
// is confined to model.rs and detector.rs; the rest works on
// plain RawDetection values and is testable without a GPU.
//
//   window.rs     — which checkpoint epochs form one benchmark
//                   point (fixed spread or rolling)
//
//   grouping.rs   — clusters one image's detections from every
//                   checkpoint into regions with mean / std
//                   confidences, and pairs regions with ground
//                   truths
//
//   aggregator.rs — runs a window over a test set and produces
//                   result rows (region-based or legacy
//                   per-class strategy)
//
//   model.rs      — the grid detector network
//
//   detector.rs   — image loading, forward pass, box decoding,
//                   per-class NMS, checkpoint reload
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Records and Checkpointing)

/// Checkpoint window selection
pub mod window;

/// Region grouping and ground-truth matching
pub mod grouping;

/// Cross-checkpoint confidence aggregation
pub mod aggregator;

/// Grid detector architecture
pub mod model;

/// Burn-backed Detector implementation
pub mod detector;

#[cfg(test)]
pub(crate) mod testing;
