// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Cursor words
//!
//! Finds the raw token under the cursor and the per-document opt-out marker.
//!
//! A token is the maximal run of `[A-Za-z0-9_$."%-]` around the cursor. It deliberately
//! keeps quotes, dots, `%` and `$` so that `public."users_20240101"`, `users%ROWTYPE` and
//! `"users_$$` reach the sanitizer intact.

/// Comment text that disables definition lookups for a document
pub const DISABLE_MARKER: &str = "pgsql-lsp:disable";

/// Token found under the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorWord {
    pub text: String,

    /// Start column, UTF-16 code units
    pub start: u32,

    /// End column (exclusive), UTF-16 code units
    pub end: u32,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | '"' | '%' | '-')
}

/// Token touching `character` (a UTF-16 column) on `line`
///
/// The character right at the cursor is preferred; a cursor placed just after a token
/// still selects it. Returns `None` when neither neighbour is a word character.
pub fn word_at_position(line: &str, character: u32) -> Option<CursorWord> {
    let chars: Vec<char> = line.chars().collect();

    // UTF-16 start column of each char, plus the line end
    let mut columns = Vec::with_capacity(chars.len() + 1);
    let mut column = 0u32;
    for c in &chars {
        columns.push(column);
        column += c.len_utf16() as u32;
    }
    columns.push(column);

    let cursor = columns
        .partition_point(|&start| start < character)
        .min(chars.len());

    let anchor = if chars.get(cursor).copied().is_some_and(is_word_char) {
        cursor
    } else if cursor > 0 && is_word_char(chars[cursor - 1]) {
        cursor - 1
    } else {
        return None;
    };

    let start = chars[..anchor]
        .iter()
        .rposition(|&c| !is_word_char(c))
        .map_or(0, |i| i + 1);
    let end = chars[anchor..]
        .iter()
        .position(|&c| !is_word_char(c))
        .map_or(chars.len(), |i| anchor + i);

    Some(CursorWord {
        text: chars[start..end].iter().collect(),
        start: columns[start],
        end: columns[end],
    })
}

/// Whether the document opts out via a leading marker comment
///
/// Only comments before the first statement count: `-- pgsql-lsp:disable` or
/// `/* pgsql-lsp:disable */`.
pub fn is_disabled(text: &str) -> bool {
    let mut rest = text;

    loop {
        rest = rest.trim_start();

        if let Some(comment) = rest.strip_prefix("--") {
            let (body, tail) = comment.split_once('\n').unwrap_or((comment, ""));
            if body.trim() == DISABLE_MARKER {
                return true;
            }
            rest = tail;
        } else if let Some(comment) = rest.strip_prefix("/*") {
            let Some((body, tail)) = comment.split_once("*/") else {
                return false;
            };
            if body.trim() == DISABLE_MARKER {
                return true;
            }
            rest = tail;
        } else {
            return false;
        }
    }
}
