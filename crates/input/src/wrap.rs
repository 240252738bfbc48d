//! Word wrapping of the input buffer into visual lines.
//!
//! Offsets are char indices into the buffer. Paragraphs are separated by `\n`;
//! the newline itself belongs to no segment.

/// One visual line: the char range `start..end` of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    /// The paragraph continues on the next visual line (soft wrap).
    pub wrapped: bool,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Largest column a cursor may take on this line.
    ///
    /// On a soft-wrapped line the position after the last char belongs to the
    /// next line.
    pub fn max_col(&self) -> usize {
        if self.wrapped {
            self.len().saturating_sub(1)
        } else {
            self.len()
        }
    }
}

/// Split `chars` into visual lines of at most `width` chars.
///
/// A paragraph longer than `width` breaks after the last space that fits, or
/// hard at `width` when there is none. Always returns at least one segment.
pub fn wrap_segments(chars: &[char], width: usize) -> Vec<Segment> {
    let width = width.max(1);
    let mut segments = Vec::new();
    let mut para_start = 0;

    loop {
        let para_end = chars[para_start..]
            .iter()
            .position(|&c| c == '\n')
            .map_or(chars.len(), |i| para_start + i);

        let mut pos = para_start;
        while para_end - pos > width {
            let window = &chars[pos..pos + width];
            let split = match window.iter().rposition(|&c| c == ' ') {
                Some(i) => pos + i + 1,
                None => pos + width,
            };
            segments.push(Segment {
                start: pos,
                end: split,
                wrapped: true,
            });
            pos = split;
        }
        segments.push(Segment {
            start: pos,
            end: para_end,
            wrapped: false,
        });

        if para_end == chars.len() {
            break;
        }
        para_start = para_end + 1;
    }
    segments
}

/// Visual line and column of `offset`.
///
/// Offsets past the buffer clamp to its end.
pub fn locate(segments: &[Segment], offset: usize) -> (usize, usize) {
    for (line, seg) in segments.iter().enumerate() {
        if offset >= seg.start && offset - seg.start <= seg.max_col() {
            return (line, offset - seg.start);
        }
    }
    match segments.last() {
        Some(seg) => (segments.len() - 1, seg.len()),
        None => (0, 0),
    }
}

/// Buffer offset of `(line, col)`, clamping both to valid values.
pub fn offset_of(segments: &[Segment], line: usize, col: usize) -> usize {
    match segments.get(line).or(segments.last()) {
        Some(seg) => seg.start + col.min(seg.max_col()),
        None => 0,
    }
}
