// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Resolution
//!
//! Maps the raw token under the cursor to stored definitions. The generic key is tried
//! first; the specific (partition) key is derived from the raw token, not from the generic
//! result, and is only consulted when the generic key misses.

use lsp_types::LocationLink;
use tracing::debug;

use crate::index::DefinitionIndex;
use crate::sanitize::{sanitize_generic, sanitize_specific};

/// Resolve a raw cursor token to its definition links
///
/// Returns `None` when neither sanitized form is indexed.
pub fn resolve(index: &DefinitionIndex, raw_token: &str) -> Option<Vec<LocationLink>> {
    let generic = sanitize_generic(raw_token);
    if let Some(links) = index.lookup(&generic) {
        debug!(
            "Resolved {:?} via generic key {:?}: {} links",
            raw_token,
            generic,
            links.len()
        );
        return Some(links);
    }

    let specific = sanitize_specific(raw_token);
    let links = index.lookup(&specific);

    debug!(
        "Resolved {:?} via specific key {:?} (generic {:?} missed): {}",
        raw_token,
        specific,
        generic,
        links.as_ref().map_or(0, Vec::len)
    );

    links
}
