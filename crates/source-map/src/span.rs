//! Byte spans and line/column locations for source positions.

use crate::LineCol;
use text_size::{TextRange, TextSize};

/// A byte offset into a source string.
pub type ByteOffset = TextSize;

/// A half-open byte range `[start, end)` into a source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// The start byte offset (inclusive).
    pub start: ByteOffset,
    /// The end byte offset (exclusive).
    pub end: ByteOffset,
}

impl Span {
    /// Creates a new span from start and end byte offsets.
    #[inline]
    pub fn new(start: impl Into<ByteOffset>, end: impl Into<ByteOffset>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Creates an empty span at the given offset.
    #[inline]
    pub fn empty(offset: impl Into<ByteOffset>) -> Self {
        let offset = offset.into();
        Self::new(offset, offset)
    }

    /// Creates a span from `usize` offsets as produced by string searches and lexers.
    #[inline]
    pub fn from_usize(start: usize, end: usize) -> Self {
        Self::new(TextSize::from(start as u32), TextSize::from(end as u32))
    }

    /// Returns the length of this span in bytes.
    #[inline]
    pub fn len(&self) -> TextSize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if this span contains the given offset.
    #[inline]
    pub fn contains(&self, offset: ByteOffset) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns a span covering both this span and another.
    #[inline]
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns the text this span covers in `source`, if the span lies within it.
    pub fn text(self, source: &str) -> Option<&str> {
        source.get(u32::from(self.start) as usize..u32::from(self.end) as usize)
    }
}

impl From<TextRange> for Span {
    fn from(range: TextRange) -> Self {
        Self::new(range.start(), range.end())
    }
}

impl From<Span> for TextRange {
    fn from(span: Span) -> Self {
        TextRange::new(span.start, span.end)
    }
}

/// Where a node came from in its original source.
///
/// Carries both the byte span (used to copy unaltered text) and the
/// line/column bounds (used for provenance). Lines and columns are 0-indexed;
/// use [`Location::start_line`] for the 1-indexed line reported to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    /// Byte range in the original source.
    pub span: Span,
    /// Position of the first byte.
    pub start: LineCol,
    /// Position just past the last byte.
    pub end: LineCol,
}

impl Location {
    /// Creates a location from its parts.
    #[inline]
    pub fn new(span: Span, start: LineCol, end: LineCol) -> Self {
        Self { span, start, end }
    }

    /// The 1-indexed line this location starts on.
    #[inline]
    pub fn start_line(&self) -> u32 {
        self.start.line + 1
    }

    /// The 1-indexed line this location ends on.
    #[inline]
    pub fn end_line(&self) -> u32 {
        self.end.line + 1
    }

    /// Returns a location covering both this location and another.
    pub fn cover(self, other: Location) -> Location {
        let start = if other.span.start < self.span.start {
            other.start
        } else {
            self.start
        };
        let end = if other.span.end > self.span.end {
            other.end
        } else {
            self.end
        };
        Location {
            span: self.span.cover(other.span),
            start,
            end,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start.line + 1, self.start.col + 1)
    }
}
