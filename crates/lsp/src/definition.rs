// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Go-to-Definition
//!
//! Jumps from a name used anywhere in an open document to the statement that declares it
//! in the workspace's definition files.
//!
//! ## Example
//!
//! ```sql
//! -- schema/tables/users.pgsql
//! CREATE TABLE users (id integer);
//!
//! -- functions/archive.pgsql
//! INSERT INTO public."users_20240101" SELECT * FROM users;
//! ```
//!
//! Invoking go-to-definition on `public."users_20240101"` or `users` lands on the
//! `CREATE TABLE users` statement.

use pgsql_lsp_definition::{DefinitionIndex, resolve};
use tower_lsp::lsp_types::{LocationLink, Position, Range};
use tracing::debug;

use crate::document::Document;
use crate::word::{is_disabled, word_at_position};

/// Find the definitions of the token under `position`
///
/// Each returned link carries the token's range as its origin so the client can
/// underline what was resolved. Returns `None` for disabled documents, positions outside
/// the text, positions not on a token, and unknown names.
pub fn find_definition(
    index: &DefinitionIndex,
    document: &Document,
    position: Position,
) -> Option<Vec<LocationLink>> {
    if is_disabled(&document.get_content()) {
        debug!("Definition disabled for {}", document.uri());
        return None;
    }

    let line = document.get_line(position.line as usize)?;
    let word = word_at_position(&line, position.character)?;
    let origin = Range::new(
        Position::new(position.line, word.start),
        Position::new(position.line, word.end),
    );

    let links = resolve(index, &word.text)?;

    Some(
        links
            .into_iter()
            .map(|link| LocationLink {
                origin_selection_range: Some(origin),
                ..link
            })
            .collect(),
    )
}
