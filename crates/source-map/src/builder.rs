//! Line map builder that tracks provenance while output text is written.
//!
//! A renderer writes all of its output through a [`LineMapBuilder`]. Every node
//! that still knows where it came from opens a segment before it writes and
//! closes it afterwards; nodes copied unchanged from the input are written in
//! one go with [`LineMapBuilder::push_verbatim`].

use crate::LineMap;

/// The output lines covered by one rendered node and the input line it came from.
///
/// All line numbers are 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// First output line the node's text occupies.
    pub output_start: u32,
    /// Last output line the node's text occupies.
    pub output_end: u32,
    /// The node's original starting line.
    pub original_line: u32,
    /// Whether the text was copied unchanged from the input, so that its lines
    /// correspond one-to-one with the original lines.
    pub verbatim: bool,
}

/// Handle for a segment opened with [`LineMapBuilder::enter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "an opened segment must be closed with `exit`"]
pub struct SegmentId(usize);

/// Accumulates output text and the segments needed to build a [`LineMap`].
#[derive(Debug, Default)]
pub struct LineMapBuilder {
    output: String,
    /// Segments in document (pre-)order.
    segments: Vec<Segment>,
    /// Line the next character will be written to.
    current_line: u32,
    /// Line holding the most recently written character.
    last_line: u32,
}

impl LineMapBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the text written so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Returns the 0-indexed line the next character will be written to.
    #[inline]
    pub fn current_line(&self) -> u32 {
        self.current_line
    }

    /// Returns the byte column the next character will be written to.
    pub fn current_column(&self) -> usize {
        let line_start = self.output.rfind('\n').map_or(0, |newline| newline + 1);
        self.output.len() - line_start
    }

    /// Returns true if the output currently ends with a newline (or is empty).
    pub fn at_line_start(&self) -> bool {
        self.output.is_empty() || self.output.ends_with('\n')
    }

    /// Appends generated text with no provenance of its own.
    pub fn push_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let newlines = text.matches('\n').count() as u32;
        let trailing = u32::from(text.ends_with('\n'));
        self.last_line = self.current_line + newlines - trailing;
        self.current_line += newlines;
        self.output.push_str(text);
    }

    /// Opens a segment for a node that originally started on `original_line`.
    pub fn enter(&mut self, original_line: u32) -> SegmentId {
        self.segments.push(Segment {
            output_start: self.current_line,
            output_end: self.current_line,
            original_line,
            verbatim: false,
        });
        SegmentId(self.segments.len() - 1)
    }

    /// Closes a segment opened with [`enter`](Self::enter).
    pub fn exit(&mut self, id: SegmentId) {
        let last_line = self.last_line;
        if let Some(segment) = self.segments.get_mut(id.0) {
            segment.output_end = segment.output_start.max(last_line);
        }
    }

    /// Appends text copied unchanged from the input, starting at `original_line`.
    pub fn push_verbatim(&mut self, original_line: u32, text: &str) {
        let output_start = self.current_line;
        self.push_str(text);
        self.segments.push(Segment {
            output_start,
            output_end: output_start.max(self.last_line),
            original_line,
            verbatim: true,
        });
    }

    /// Returns the segments recorded so far.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Finishes rendering, returning the output text and its line map.
    pub fn finish(self) -> (String, LineMap) {
        let line_count = count_lines(&self.output);
        let map = LineMap::from_segments(&self.segments, line_count);
        (self.output, map)
    }
}

/// Number of lines in `text`, not counting the empty remainder after a final newline.
fn count_lines(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let newlines = text.matches('\n').count();
    if text.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}
