//! Block layout: the in-memory image of the simulated disk
//!
//! A layout is a fixed-length sequence of blocks, each either free or owned
//! by a numbered file. It is produced once from a run-length-encoded disk
//! map and then rewritten in place by the compactors; its length never
//! changes after decoding.

use crate::error::{DefragError, Result};
use serde::{Deserialize, Serialize};

/// One block of the simulated disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    /// Block owned by the file with this id
    File(usize),
    /// Unoccupied block
    Free,
}

impl Block {
    pub fn is_free(&self) -> bool {
        matches!(self, Block::Free)
    }

    /// File id if occupied, `None` if free
    pub fn file_id(&self) -> Option<usize> {
        match self {
            Block::File(id) => Some(*id),
            Block::Free => None,
        }
    }
}

/// Fixed-length block sequence decoded from a disk map
///
/// All compaction operations are permutations/rewrites of this sequence;
/// none of them resize it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    blocks: Vec<Block>,
}

impl Layout {
    /// Decode a run-length-encoded disk map into an explicit block sequence.
    ///
    /// The map alternates "file length" and "free length" digits; the final
    /// free length may be absent and is treated as 0. File ids are assigned
    /// sequentially from 0, the counter advancing only after a file run of
    /// positive length has been emitted. Trailing ASCII whitespace (e.g. a
    /// final newline from a file read) is tolerated; any other non-digit
    /// byte or an empty map is rejected.
    pub fn parse(disk_map: &str) -> Result<Layout> {
        let trimmed = disk_map.trim_end();
        if trimmed.is_empty() {
            return Err(DefragError::EmptyMap);
        }

        let mut lengths = Vec::with_capacity(trimmed.len());
        for (offset, byte) in trimmed.bytes().enumerate() {
            if !byte.is_ascii_digit() {
                return Err(DefragError::InvalidDigit { offset, byte });
            }
            lengths.push((byte - b'0') as usize);
        }

        let mut blocks = Vec::with_capacity(lengths.iter().sum());
        let mut file_id = 0;

        for pair in lengths.chunks(2) {
            let file_len = pair[0];
            let free_len = if pair.len() == 2 { pair[1] } else { 0 };

            blocks.extend(std::iter::repeat(Block::File(file_id)).take(file_len));
            blocks.extend(std::iter::repeat(Block::Free).take(free_len));

            if file_len > 0 {
                file_id += 1;
            }
        }

        Ok(Layout { blocks })
    }

    /// Build a layout directly from a block sequence (used by compactors)
    pub(crate) fn from_blocks(blocks: Vec<Block>) -> Layout {
        Layout { blocks }
    }

    /// Total number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Borrow the raw block sequence
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// Number of free blocks
    pub fn free_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_free()).count()
    }

    /// Number of occupied blocks
    pub fn occupied_blocks(&self) -> usize {
        self.blocks.len() - self.free_blocks()
    }

    /// Number of distinct files present
    pub fn file_count(&self) -> usize {
        self.blocks
            .iter()
            .filter_map(|b| b.file_id())
            .max()
            .map_or(0, |max_id| max_id + 1)
    }

    /// Left-to-right sequence of file ids over occupied positions
    pub fn file_ids(&self) -> Vec<usize> {
        self.blocks.iter().filter_map(|b| b.file_id()).collect()
    }

    /// Position-weighted checksum: Σ position × file_id over occupied blocks
    ///
    /// Free blocks contribute 0; the all-free layout checksums to 0.
    pub fn checksum(&self) -> u64 {
        self.blocks
            .iter()
            .enumerate()
            .filter_map(|(pos, block)| block.file_id().map(|id| pos as u64 * id as u64))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_digit() {
        // Minimum viable input: one file, no free space
        let layout = Layout::parse("3").unwrap();
        assert_eq!(layout.blocks(), &[Block::File(0); 3]);
    }

    #[test]
    fn test_parse_worked_example() {
        let layout = Layout::parse("12345").unwrap();
        let expected = [
            Block::File(0),
            Block::Free,
            Block::Free,
            Block::File(1),
            Block::File(1),
            Block::File(1),
            Block::Free,
            Block::Free,
            Block::Free,
            Block::Free,
            Block::File(2),
            Block::File(2),
            Block::File(2),
            Block::File(2),
            Block::File(2),
        ];
        assert_eq!(layout.blocks(), &expected);
        assert_eq!(layout.len(), 15);
        assert_eq!(layout.file_count(), 3);
        assert_eq!(layout.free_blocks(), 6);
    }

    #[test]
    fn test_parse_empty_is_rejected() {
        assert_eq!(Layout::parse(""), Err(DefragError::EmptyMap));
        assert_eq!(Layout::parse("\n"), Err(DefragError::EmptyMap));
    }

    #[test]
    fn test_parse_non_digit_is_rejected() {
        let err = Layout::parse("12a45").unwrap_err();
        assert_eq!(
            err,
            DefragError::InvalidDigit {
                offset: 2,
                byte: b'a'
            }
        );
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_parse_trailing_newline_tolerated() {
        let with_newline = Layout::parse("12345\n").unwrap();
        let without = Layout::parse("12345").unwrap();
        assert_eq!(with_newline, without);
    }

    #[test]
    fn test_zero_length_file_consumes_no_id() {
        // "103" = file of 1 block, no gap, zero-length file; the zero-length
        // token emits nothing and the next positive run would reuse id 1.
        let layout = Layout::parse("1030").unwrap();
        assert_eq!(layout.blocks(), &[Block::File(0), Block::File(1), Block::File(1), Block::File(1)]);
        assert_eq!(layout.file_count(), 2);
    }

    #[test]
    fn test_checksum_all_free() {
        let layout = Layout::parse("09").unwrap();
        assert_eq!(layout.len(), 9);
        assert_eq!(layout.occupied_blocks(), 0);
        assert_eq!(layout.checksum(), 0);
    }

    #[test]
    fn test_checksum_worked_example() {
        // Compacted form of "12345": [0,1,1,1,2,2,2,2,2,_,...]
        let layout = Layout::from_blocks(vec![
            Block::File(0),
            Block::File(1),
            Block::File(1),
            Block::File(1),
            Block::File(2),
            Block::File(2),
            Block::File(2),
            Block::File(2),
            Block::File(2),
            Block::Free,
            Block::Free,
            Block::Free,
            Block::Free,
            Block::Free,
            Block::Free,
        ]);
        assert_eq!(layout.checksum(), 60);
    }
}
