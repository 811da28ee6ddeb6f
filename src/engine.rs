//! One-shot compaction run: decode, compact under both policies, checksum
//!
//! Each policy runs on its own copy of the decoded layout, so the two
//! results never alias or interfere.

use crate::compactor::extent::WholeFileCompactor;
use crate::compactor::single::SingleBlockCompactor;
use crate::compactor::Compactor;
use crate::error::Result;
use crate::layout::Layout;
use serde::Serialize;
use tracing::info;

/// Outcome of evaluating both compaction policies on one disk map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefragReport {
    /// Total blocks in the decoded layout
    pub total_blocks: usize,
    /// Free blocks in the decoded layout
    pub free_blocks: usize,
    /// Distinct files in the decoded layout
    pub file_count: usize,
    /// Checksum after single-block compaction
    pub single_block_checksum: u64,
    /// Checksum after whole-file compaction
    pub whole_file_checksum: u64,
}

/// Decode a disk map and evaluate both compaction policies on it.
///
/// Fails only on malformed input; both compactions are total over any
/// decoded layout.
pub fn run(disk_map: &str) -> Result<DefragReport> {
    let layout = Layout::parse(disk_map)?;
    info!(
        blocks = layout.len(),
        files = layout.file_count(),
        free = layout.free_blocks(),
        "decoded disk map"
    );

    let single = SingleBlockCompactor::new();
    let whole = WholeFileCompactor::new();

    let single_block_checksum = compact_and_checksum(&single, &layout);
    let whole_file_checksum = compact_and_checksum(&whole, &layout);

    Ok(DefragReport {
        total_blocks: layout.len(),
        free_blocks: layout.free_blocks(),
        file_count: layout.file_count(),
        single_block_checksum,
        whole_file_checksum,
    })
}

fn compact_and_checksum(compactor: &dyn Compactor, layout: &Layout) -> u64 {
    let compacted = compactor.compact(layout);
    let checksum = compacted.checksum();
    info!(policy = compactor.name(), checksum, "compaction evaluated");
    checksum
}
