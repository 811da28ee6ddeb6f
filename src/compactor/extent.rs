//! Extent-aware compaction: relocate whole files into earlier free extents
//!
//! Free extents are tracked in a B-tree keyed by start position, so the
//! leftmost-fit scan walks them in ascending order and each successful move
//! costs logarithmic registry maintenance.

use crate::compactor::Compactor;
use crate::error::{DefragError, Result};
use crate::layout::{Block, Layout};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// A contiguous run of blocks with uniform occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    /// First block position of the run
    pub start: usize,
    /// Number of contiguous blocks
    pub length: usize,
}

impl Extent {
    pub fn new(start: usize, length: usize) -> Self {
        Extent { start, length }
    }

    /// One past the last position of the run
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Check if this extent overlaps another
    pub fn overlaps(&self, other: &Extent) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// Per-pass extent view of a layout
///
/// Maps each file id to its single contiguous extent and keeps free extents
/// sorted by start position. Built once from the initial layout, mutated as
/// moves succeed, and discarded when the pass completes.
#[derive(Debug, Clone)]
pub struct ExtentRegistry {
    /// File extents indexed by file id; a zero-length entry means the id
    /// owns no blocks
    files: Vec<Extent>,

    /// Free extents indexed by start position
    /// BTreeMap keeps them sorted for the leftmost-fit scan
    free: BTreeMap<usize, Extent>,
}

impl ExtentRegistry {
    /// Scan a layout into maximal file and free extents.
    ///
    /// Fails with `ExtentInconsistency` if any file id occupies more than
    /// one maximal run, since the whole-file policy is only defined for
    /// unfragmented files.
    pub fn from_layout(layout: &Layout) -> Result<ExtentRegistry> {
        let mut files = vec![Extent::new(0, 0); layout.file_count()];
        let mut free = BTreeMap::new();

        let blocks = layout.blocks();
        let mut start = 0;
        while start < blocks.len() {
            let block = blocks[start];
            let mut end = start;
            while end < blocks.len() && blocks[end] == block {
                end += 1;
            }

            match block {
                Block::File(id) => {
                    if files[id].length != 0 {
                        return Err(DefragError::ExtentInconsistency(format!(
                            "file {} occupies multiple extents (at {} and {})",
                            id, files[id].start, start
                        )));
                    }
                    files[id] = Extent::new(start, end - start);
                }
                Block::Free => {
                    free.insert(start, Extent::new(start, end - start));
                }
            }
            start = end;
        }

        Ok(ExtentRegistry { files, free })
    }

    /// Extent currently owned by a file id
    pub fn file_extent(&self, file_id: usize) -> Option<Extent> {
        self.files.get(file_id).copied()
    }

    /// Number of free extents currently tracked
    pub fn free_extent_count(&self) -> usize {
        self.free.len()
    }

    /// Find the leftmost free extent that fits a file of `length` blocks
    /// and sits strictly before `before`. Files only ever move left.
    fn find_destination(&self, length: usize, before: usize) -> Option<Extent> {
        self.free
            .values()
            .take_while(|extent| extent.start < before)
            .find(|extent| extent.length >= length)
            .copied()
    }

    /// Consume `length` blocks from the front of a free extent.
    ///
    /// The leftover suffix, if any, goes back into the map under its new
    /// start key. The caller's vacated span is deliberately not re-inserted:
    /// the pass settles each file once and never reuses space freed behind
    /// already-processed files.
    fn consume(&mut self, extent: Extent, length: usize) {
        self.free.remove(&extent.start);

        let remaining = extent.length - length;
        if remaining > 0 {
            let remaining_start = extent.start + length;
            self.free
                .insert(remaining_start, Extent::new(remaining_start, remaining));
        }
    }

    /// Check that file and free extents tile `[0, total)` with no overlap.
    ///
    /// Only meaningful for a registry freshly built from a layout; a
    /// mid-pass registry intentionally under-counts free space. Violations
    /// indicate a compactor defect, not a runtime condition.
    pub fn verify(&self, total: usize) -> Result<()> {
        let mut extents: Vec<Extent> = self
            .files
            .iter()
            .filter(|e| e.length > 0)
            .chain(self.free.values())
            .copied()
            .collect();
        extents.sort_by_key(|e| e.start);

        let mut cursor = 0;
        for extent in &extents {
            if extent.start < cursor {
                return Err(DefragError::ExtentInconsistency(format!(
                    "extent at {} overlaps previous extent ending at {}",
                    extent.start, cursor
                )));
            }
            if extent.start > cursor {
                return Err(DefragError::ExtentInconsistency(format!(
                    "gap in coverage at [{}, {})",
                    cursor, extent.start
                )));
            }
            cursor = extent.end();
        }

        if cursor != total {
            return Err(DefragError::ExtentInconsistency(format!(
                "extents cover [0, {}) but layout has {} blocks",
                cursor, total
            )));
        }
        Ok(())
    }
}

/// Whole-file compactor
///
/// Processes file ids in descending order, exactly once each, moving every
/// file into the leftmost free extent that fits and lies before its current
/// position. A single settling pass: space vacated during the pass is never
/// offered to lower-numbered files.
#[derive(Debug, Default, Clone, Copy)]
pub struct WholeFileCompactor;

impl WholeFileCompactor {
    pub fn new() -> Self {
        WholeFileCompactor
    }

    fn relocate(blocks: &mut [Block], file_id: usize, from: Extent, to_start: usize) {
        for block in &mut blocks[to_start..to_start + from.length] {
            *block = Block::File(file_id);
        }
        for block in &mut blocks[from.start..from.end()] {
            *block = Block::Free;
        }
    }
}

impl Compactor for WholeFileCompactor {
    fn name(&self) -> &'static str {
        "whole-file"
    }

    fn compact(&self, layout: &Layout) -> Layout {
        let mut result = layout.clone();
        let mut registry = match ExtentRegistry::from_layout(layout) {
            Ok(registry) => registry,
            // A file split across extents cannot occur in a decoded layout;
            // leave such input untouched rather than half-move it.
            Err(_) => return result,
        };

        let mut moved = 0usize;
        for file_id in (0..registry.files.len()).rev() {
            let extent = registry.files[file_id];
            if extent.length == 0 {
                continue;
            }

            let Some(dest) = registry.find_destination(extent.length, extent.start) else {
                trace!(file_id, "no eligible free extent, file stays");
                continue;
            };

            Self::relocate(result.blocks_mut(), file_id, extent, dest.start);
            registry.consume(dest, extent.length);
            registry.files[file_id] = Extent::new(dest.start, extent.length);
            moved += 1;
            trace!(file_id, from = extent.start, to = dest.start, "moved file");
        }

        debug!(
            files = registry.files.len(),
            moved, "whole-file compaction complete"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_end_and_overlap() {
        let a = Extent::new(10, 5); // 10..15
        let b = Extent::new(14, 3); // 14..17
        let c = Extent::new(15, 2); // 15..17

        assert_eq!(a.end(), 15);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_registry_from_layout() {
        let layout = Layout::parse("12345").unwrap();
        let registry = ExtentRegistry::from_layout(&layout).unwrap();

        assert_eq!(registry.file_extent(0), Some(Extent::new(0, 1)));
        assert_eq!(registry.file_extent(1), Some(Extent::new(3, 3)));
        assert_eq!(registry.file_extent(2), Some(Extent::new(10, 5)));
        assert_eq!(registry.free_extent_count(), 2);
        registry.verify(layout.len()).unwrap();
    }

    #[test]
    fn test_registry_rejects_split_file() {
        let layout = Layout::from_blocks(vec![
            Block::File(0),
            Block::Free,
            Block::File(0),
        ]);
        let err = ExtentRegistry::from_layout(&layout).unwrap_err();
        assert!(matches!(err, DefragError::ExtentInconsistency(_)));
    }

    #[test]
    fn test_find_destination_is_leftmost_and_left_only() {
        let layout = Layout::parse("12243").unwrap();
        // [0,_,_,1,1,_,_,_,_,2,2,2]
        let registry = ExtentRegistry::from_layout(&layout).unwrap();

        // File 2 (len 3, start 9): first free extent (1..3) is too small,
        // second (5..9) fits.
        assert_eq!(registry.find_destination(3, 9), Some(Extent::new(5, 4)));
        // File 1 (len 2, start 3): extent at 1 fits and is leftmost.
        assert_eq!(registry.find_destination(2, 3), Some(Extent::new(1, 2)));
        // Nothing fits to the left of position 1.
        assert_eq!(registry.find_destination(1, 1), None);
    }

    #[test]
    fn test_consume_reinserts_leftover() {
        let layout = Layout::parse("12345").unwrap();
        let mut registry = ExtentRegistry::from_layout(&layout).unwrap();

        let dest = registry.find_destination(1, 10).unwrap();
        assert_eq!(dest, Extent::new(1, 2));

        registry.consume(dest, 1);
        // Leftover suffix [2, 3) re-inserted under its new start.
        assert_eq!(registry.find_destination(1, 10), Some(Extent::new(2, 1)));
    }

    #[test]
    fn test_compact_canonical_example() {
        let layout = Layout::parse("2333133121414131402").unwrap();
        let compacted = WholeFileCompactor::new().compact(&layout);
        assert_eq!(compacted.checksum(), 2858);
    }

    #[test]
    fn test_no_eligible_extent_leaves_file_in_place() {
        // One file, free space only after it: nothing moves.
        let layout = Layout::parse("19").unwrap();
        let compacted = WholeFileCompactor::new().compact(&layout);
        assert_eq!(compacted, layout);
    }

    #[test]
    fn test_single_settling_pass() {
        // [0,0,_,_,1,1,1,_,2,2,3,3,3]
        let layout = Layout::parse("2231203").unwrap();
        assert_eq!(layout.len(), 13);
        let compacted = WholeFileCompactor::new().compact(&layout);

        // File 3 finds no fit, file 2 takes the gap at 2, file 1 and file 0
        // stay. The span file 2 vacates at [8, 10) is left as free space and
        // never re-enters the pass's free list.
        let expected = Layout::from_blocks(vec![
            Block::File(0),
            Block::File(0),
            Block::File(2),
            Block::File(2),
            Block::File(1),
            Block::File(1),
            Block::File(1),
            Block::Free,
            Block::Free,
            Block::Free,
            Block::File(3),
            Block::File(3),
            Block::File(3),
        ]);
        assert_eq!(compacted, expected);
    }

    #[test]
    fn test_result_tiles_layout_exactly() {
        let layout = Layout::parse("2333133121414131402").unwrap();
        let compacted = WholeFileCompactor::new().compact(&layout);

        let registry = ExtentRegistry::from_layout(&compacted).unwrap();
        registry.verify(compacted.len()).unwrap();
    }

    #[test]
    fn test_files_never_move_right() {
        let layout = Layout::parse("2333133121414131402").unwrap();
        let before = ExtentRegistry::from_layout(&layout).unwrap();
        let compacted = WholeFileCompactor::new().compact(&layout);
        let after = ExtentRegistry::from_layout(&compacted).unwrap();

        for id in 0..layout.file_count() {
            assert!(after.file_extent(id).unwrap().start <= before.file_extent(id).unwrap().start);
        }
    }
}
