//! Source position tracking and line provenance for splice.
//!
//! This crate records where rewritten output came from: while a renderer writes
//! text through a [`LineMapBuilder`], every node that survived rewriting reports
//! the input line it started on. The resulting [`LineMap`] answers "which input
//! line produced output line N?", and a [`SourceMapStore`] keeps the latest map
//! for each rewritten output.

mod builder;
mod line_index;
mod map;
mod span;
mod store;

pub use builder::{LineMapBuilder, Segment, SegmentId};
pub use line_index::{LineCol, LineIndex};
pub use map::LineMap;
pub use span::{ByteOffset, Location, Span};
pub use store::SourceMapStore;
