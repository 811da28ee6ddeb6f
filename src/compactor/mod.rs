//! Compaction strategies for a block layout
//!
//! Two policies are provided:
//! - Single-block settling: every occupied block slides to the front
//! - Extent-aware: whole files relocate into earlier free extents

pub mod extent;
pub mod single;

use crate::layout::Layout;

/// Compaction policy trait
///
/// Each call takes a shared borrow of the initial layout and produces an
/// independent output layout, so two policies run on the same input never
/// share working state.
pub trait Compactor {
    /// Short policy name for logs and reports
    fn name(&self) -> &'static str;

    /// Produce a compacted copy of the layout
    fn compact(&self, layout: &Layout) -> Layout;
}
