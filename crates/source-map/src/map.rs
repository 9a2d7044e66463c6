//! Output-line to input-line mapping for one rewritten document.

use crate::Segment;

/// Maps each line of a rewritten document back to the input line it derives from.
///
/// Line numbers on both sides of the public API are 1-indexed. A line built
/// entirely from synthesized code has no mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineMap {
    /// `lines[i]` is the 0-indexed input line of output line `i`.
    lines: Vec<Option<u32>>,
}

impl LineMap {
    /// Creates an empty line map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map for an output of `line_count` lines from rendered segments.
    ///
    /// `segments` must be in document order. For each output line:
    /// - the first segment that begins on it decides its mapping (a verbatim
    ///   segment begins on every line it covers, shifted line by line);
    /// - otherwise the innermost non-verbatim segment spanning it decides;
    /// - otherwise it stays unmapped.
    pub fn from_segments(segments: &[Segment], line_count: usize) -> Self {
        let mut starts: Vec<Option<u32>> = vec![None; line_count];
        let mut spans: Vec<Option<u32>> = vec![None; line_count];

        for segment in segments {
            let first = segment.output_start as usize;
            let last = segment.output_end as usize;
            if segment.verbatim {
                for (offset, line) in (first..=last).enumerate() {
                    if let Some(slot) = starts.get_mut(line) {
                        slot.get_or_insert(segment.original_line + offset as u32);
                    }
                }
            } else {
                if let Some(slot) = starts.get_mut(first) {
                    slot.get_or_insert(segment.original_line);
                }
                for line in first + 1..=last {
                    if let Some(slot) = spans.get_mut(line) {
                        *slot = Some(segment.original_line);
                    }
                }
            }
        }

        let lines = starts
            .into_iter()
            .zip(spans)
            .map(|(start, span)| start.or(span))
            .collect();
        Self { lines }
    }

    /// Returns the 1-indexed input line for a 1-indexed output line.
    ///
    /// Returns `None` for synthesized lines and for lines outside the output.
    pub fn line(&self, output_line: u32) -> Option<u32> {
        let index = output_line.checked_sub(1)? as usize;
        self.lines.get(index).copied().flatten().map(|line| line + 1)
    }

    /// Returns the number of output lines covered by this map.
    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the output had no lines.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterates `(output_line, input_line)` pairs, 1-indexed, in output order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Option<u32>)> + '_ {
        self.lines
            .iter()
            .enumerate()
            .map(|(index, line)| (index as u32 + 1, line.map(|line| line + 1)))
    }
}
