// ============================================================
// Layer 5 — Checkpoint Window Selector
// ============================================================
// Picks which checkpoint epochs are combined into one benchmark
// point.
//
//   Fixed   — N epochs spread evenly over [start, end]
//             start=1 end=20 N=5 → [1, 6, 11, 15, 20]
//   Rolling — the N epochs ending at `end`
//             end=20 N=5 → [16, 17, 18, 19, 20]
//
// N = 1 always yields [end], the single-checkpoint benchmark.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowStrategy {
    Fixed,
    Rolling,
}

/// Selected epochs plus the requested window size.
///
/// `epochs` can be shorter than `size` when a fixed range is too
/// narrow to hold N distinct epochs, or a rolling window runs into
/// epoch 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointWindow {
    pub epochs: Vec<u32>,
    pub size:   usize,
}

impl CheckpointWindow {
    pub fn select(start: u32, end: u32, size: usize, strategy: WindowStrategy) -> Self {
        let epochs = match strategy {
            _ if size <= 1 => vec![end],
            WindowStrategy::Fixed   => fixed_epochs(start, end, size),
            WindowStrategy::Rolling => rolling_epochs(end, size),
        };
        Self { epochs, size: size.max(1) }
    }

    /// A window of exactly one checkpoint.
    pub fn single(epoch: u32) -> Self {
        Self { epochs: vec![epoch], size: 1 }
    }

    /// Single-checkpoint windows are benchmarked without progress output.
    pub fn is_single(&self) -> bool {
        self.size == 1
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }
}

fn fixed_epochs(start: u32, end: u32, size: usize) -> Vec<u32> {
    let (start, end) = (start as f64, end as f64);
    let step = (end - start) / (size - 1) as f64;

    let mut epochs: Vec<u32> = (0..size)
        .map(|i| (start + step * i as f64).round() as u32)
        .collect();
    epochs.sort_unstable();
    epochs.dedup();
    epochs
}

fn rolling_epochs(end: u32, size: usize) -> Vec<u32> {
    let first = (end as i64 - size as i64 + 1).max(1) as u32;
    (first..=end).collect()
}
