//! Single-block compaction: pack every occupied block to the front
//!
//! A stable filter of occupied blocks followed by free-block padding to the
//! original length. Order-preserving and allocation-stable: no block changes
//! owner, only position.

use crate::compactor::Compactor;
use crate::layout::{Block, Layout};
use tracing::debug;

/// Greedy per-block compactor
///
/// All occupied blocks end up first, in their original relative order, with
/// all free space consolidated at the end. Applying it twice yields the same
/// layout as applying it once.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleBlockCompactor;

impl SingleBlockCompactor {
    pub fn new() -> Self {
        SingleBlockCompactor
    }
}

impl Compactor for SingleBlockCompactor {
    fn name(&self) -> &'static str {
        "single-block"
    }

    fn compact(&self, layout: &Layout) -> Layout {
        let total = layout.len();

        let mut blocks: Vec<Block> = layout
            .blocks()
            .iter()
            .copied()
            .filter(|b| !b.is_free())
            .collect();

        let moved = total - blocks.len();
        blocks.resize(total, Block::Free);

        debug!(total, free = moved, "single-block compaction complete");
        Layout::from_blocks(blocks)
    }
}
