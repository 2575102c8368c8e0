// ============================================================
// Layer 3 — Test Set Names
// ============================================================
// The roles a labelled image set can play during a sweep.
// Four standing sets live for the whole sweep; `CurIter(i)` is
// added only while iteration i is being benchmarked.
//
// Variant order is the benchmarking order within one epoch, so a
// BTreeMap keyed by this enum iterates standing sets first.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestSetName {
    /// First-iteration test images
    Init,
    /// Union of every per-iteration test file
    AllIter,
    /// `AllIter` restricted to images from the sampling batch
    Sample,
    /// `Sample` ∪ `Init`
    All,
    /// One iteration's own test file (transient)
    CurIter(usize),
}

impl TestSetName {
    pub const STANDING: [TestSetName; 4] = [
        TestSetName::Init,
        TestSetName::AllIter,
        TestSetName::Sample,
        TestSetName::All,
    ];

    pub fn is_transient(&self) -> bool {
        matches!(self, TestSetName::CurIter(_))
    }
}

impl fmt::Display for TestSetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestSetName::Init       => write!(f, "init"),
            TestSetName::AllIter    => write!(f, "all_iter"),
            TestSetName::Sample     => write!(f, "sample"),
            TestSetName::All        => write!(f, "all"),
            TestSetName::CurIter(i) => write!(f, "cur_iter{i}"),
        }
    }
}
