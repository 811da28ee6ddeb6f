//! Block-Storage Compaction Engine
//!
//! A deterministic, single-threaded defragmentation engine over a simulated
//! disk of fixed-size blocks. A run-length-encoded disk map is decoded into
//! an explicit block layout, compacted under two independent policies, and
//! verified with a position-weighted checksum.
//!
//! ## Components
//!
//! - [`error`] - Error types for decode and invariant failures
//! - [`layout`] - Block layout, run-length decoder, and checksum
//! - [`compactor`] - Compaction policies:
//!   - [`compactor::single`] - Single-block settling (pack blocks to front)
//!   - [`compactor::extent`] - Extent-aware whole-file relocation
//! - [`engine`] - One-shot run producing both checksums
//!
//! ## Example Usage
//!
//! ```rust
//! use defrag_rs::compactor::{Compactor, single::SingleBlockCompactor};
//! use defrag_rs::Layout;
//!
//! // Decode a disk map: file lengths alternating with free lengths
//! let layout = Layout::parse("12345").unwrap();
//! assert_eq!(layout.len(), 15);
//!
//! // Pack every occupied block to the front
//! let compacted = SingleBlockCompactor::new().compact(&layout);
//! assert_eq!(compacted.checksum(), 60);
//!
//! // Or evaluate both policies at once
//! let report = defrag_rs::run("12345").unwrap();
//! assert_eq!(report.single_block_checksum, 60);
//! ```

pub mod compactor;
pub mod engine;
pub mod error;
pub mod layout;

// Re-export commonly used types
pub use compactor::extent::{Extent, ExtentRegistry, WholeFileCompactor};
pub use compactor::single::SingleBlockCompactor;
pub use compactor::Compactor;
pub use engine::{run, DefragReport};
pub use error::{DefragError, Result};
pub use layout::{Block, Layout};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
