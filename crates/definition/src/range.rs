// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Range mapping
//!
//! libpg_query reports byte offsets; editors want line/column positions where the column
//! counts UTF-16 code units. [`LineIndex`] precomputes line starts so a file with many
//! statements is scanned once.

use lsp_types::{Position, Range};

/// Line start table for one text
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,

    /// Byte offset of the first character of each line (always starts with 0)
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(i, _)| i + 1),
        );

        Self { text, line_starts }
    }

    /// Convert a byte offset to a position
    ///
    /// Offsets past the end clamp to the end of the text. Offsets inside a multi-byte
    /// character resolve to the start of that character.
    pub fn position(&self, offset: usize) -> Position {
        let offset = floor_char_boundary(self.text, offset);

        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_point) => insert_point - 1,
        };
        let line_start = self.line_starts[line];

        let character: usize = self.text[line_start..offset]
            .chars()
            .map(char::len_utf16)
            .sum();

        Position::new(line as u32, character as u32)
    }

    /// Convert a half-open byte interval to a range
    ///
    /// An inverted interval collapses to a point at `start`.
    pub fn range(&self, start: usize, end: usize) -> Range {
        let start_position = self.position(start);
        let end_position = if end <= start {
            start_position
        } else {
            self.position(end)
        };

        Range::new(start_position, end_position)
    }
}

/// Convert a half-open byte interval of `text` to an editor range
pub fn range_from_offsets(text: &str, start: usize, end: usize) -> Range {
    LineIndex::new(text).range(start, end)
}

fn floor_char_boundary(text: &str, offset: usize) -> usize {
    if offset >= text.len() {
        return text.len();
    }

    let mut offset = offset;
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
