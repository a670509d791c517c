// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Custom assertions for definition links

use lsp_types::{LocationLink, Position, Range, Url};

/// Shorthand for a range on `(line, character)` pairs
pub fn range(start: (u32, u32), end: (u32, u32)) -> Range {
    Range::new(Position::new(start.0, start.1), Position::new(end.0, end.1))
}

/// Assertions over definition results
pub struct LinkAssertions;

impl LinkAssertions {
    /// Assert that the result holds exactly one link and return it
    pub fn assert_single(links: Option<Vec<LocationLink>>) -> LocationLink {
        let links = links.unwrap_or_else(|| panic!("Expected one definition link, got none"));
        assert_eq!(
            links.len(),
            1,
            "Expected exactly one definition link, got {}: {:?}",
            links.len(),
            links
        );
        links.into_iter().next().unwrap_or_else(|| unreachable!())
    }

    /// Assert target file and both ranges of a link
    pub fn assert_link(link: &LocationLink, uri: &Url, target: Range, selection: Range) {
        assert_eq!(&link.target_uri, uri, "Definition points at the wrong file");
        assert_eq!(link.target_range, target, "Target range mismatch for {}", uri);
        assert_eq!(
            link.target_selection_range, selection,
            "Selection range mismatch for {}",
            uri
        );
    }

    /// Assert that the selection range lies within the target range
    pub fn assert_selection_within_target(link: &LocationLink) {
        let target = link.target_range;
        let selection = link.target_selection_range;

        assert!(
            target.start <= selection.start && selection.end <= target.end,
            "Selection {:?} is not contained in target {:?}",
            selection,
            target
        );
    }

    /// Assert that the result has no links at all
    pub fn assert_none(links: Option<Vec<LocationLink>>) {
        assert!(links.is_none(), "Expected no definition, got {:?}", links);
    }
}
