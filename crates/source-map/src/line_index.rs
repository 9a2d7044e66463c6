//! Line index for converting byte offsets into line/column positions.

use crate::{ByteOffset, Location, Span};
use text_size::TextSize;

/// A line and column position (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed column (byte offset within the line).
    pub col: u32,
}

impl LineCol {
    /// Creates a new line/column position.
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Byte offsets of every line start in a text, for O(log n) position lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// `line_starts[i]` is the offset where line `i` begins.
    line_starts: Vec<ByteOffset>,
    len: ByteOffset,
}

impl LineIndex {
    /// Creates a new line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        line_starts.extend(
            text.match_indices('\n')
                .map(|(offset, _)| TextSize::from((offset + 1) as u32)),
        );

        Self {
            line_starts,
            len: TextSize::from(text.len() as u32),
        }
    }

    /// Returns the number of lines in the text, counting a final line without
    /// a newline but not the empty remainder after a trailing newline.
    pub fn line_count(&self) -> usize {
        match self.line_starts.last() {
            Some(&last) if last == self.len && self.line_starts.len() > 1 => {
                self.line_starts.len() - 1
            }
            _ => self.line_starts.len(),
        }
    }

    /// Converts a byte offset to a line/column position.
    ///
    /// Returns `None` if the offset lies past the end of the text.
    pub fn line_col(&self, offset: ByteOffset) -> Option<LineCol> {
        if offset > self.len {
            return None;
        }

        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied()?;

        Some(LineCol {
            line: line as u32,
            col: u32::from(offset - line_start),
        })
    }

    /// Resolves a byte span into a [`Location`].
    pub fn location(&self, span: Span) -> Option<Location> {
        Some(Location::new(
            span,
            self.line_col(span.start)?,
            self.line_col(span.end)?,
        ))
    }

    /// Returns the byte offset where a line starts.
    pub fn line_start(&self, line: u32) -> Option<ByteOffset> {
        self.line_starts.get(line as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let index = LineIndex::new("hello world");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.line_col(TextSize::from(5)), Some(LineCol::new(0, 5)));
    }

    #[test]
    fn test_multiple_lines() {
        let index = LineIndex::new("class Foo\n  bar\nend\n");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_col(TextSize::from(12)), Some(LineCol::new(1, 2)));
        assert_eq!(index.line_col(TextSize::from(16)), Some(LineCol::new(2, 0)));
        assert_eq!(index.line_col(TextSize::from(99)), None);
    }

    #[test]
    fn test_location_of_span() {
        let index = LineIndex::new("a\nclass Foo\nend");
        let location = index.location(Span::from_usize(2, 15)).unwrap();
        assert_eq!(location.start, LineCol::new(1, 0));
        assert_eq!(location.end, LineCol::new(2, 3));
        assert_eq!(location.start_line(), 2);
    }

    #[test]
    fn test_line_start() {
        let index = LineIndex::new("hello\nworld\n");
        assert_eq!(index.line_start(1), Some(TextSize::from(6)));
        assert_eq!(index.line_start(3), None);
    }
}
