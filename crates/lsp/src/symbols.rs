// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Document and Workspace Symbols
//!
//! Lists indexed definitions for outline views and symbol search.
//!
//! A definition in the default schema is stored under two keys (`public.users` and
//! `users`) sharing one link. Symbols are reported once per physical definition, under its
//! longest key.

use pgsql_lsp_definition::{DefinitionCandidate, DefinitionIndex};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tower_lsp::lsp_types::{Location, Range, SymbolInformation, Url};

/// Symbols declared in `uri`, in source order
pub fn document_symbols(index: &DefinitionIndex, uri: &Url) -> Vec<SymbolInformation> {
    physical_definitions(index.file_candidates(uri))
        .iter()
        .map(to_symbol_information)
        .collect()
}

/// Symbols whose key contains `query`, ignoring case
pub fn workspace_symbols(index: &DefinitionIndex, query: &str) -> Vec<SymbolInformation> {
    physical_definitions(index.search(query))
        .iter()
        .map(to_symbol_information)
        .collect()
}

/// `Range` is not `Hash` in lsp-types 0.94, so hash its fields instead
type RangeKey = (u32, u32, u32, u32);

fn range_key(range: Range) -> RangeKey {
    (
        range.start.line,
        range.start.character,
        range.end.line,
        range.end.character,
    )
}

/// Keep one candidate per link, preferring the qualified key
fn physical_definitions(candidates: Vec<DefinitionCandidate>) -> Vec<DefinitionCandidate> {
    let mut unique: Vec<DefinitionCandidate> = Vec::new();
    let mut positions: HashMap<(Url, RangeKey, RangeKey), usize> = HashMap::new();

    for candidate in candidates {
        let link = &candidate.link;
        let key = (
            link.target_uri.clone(),
            range_key(link.target_range),
            range_key(link.target_selection_range),
        );

        match positions.entry(key) {
            Entry::Occupied(entry) => {
                let existing = &mut unique[*entry.get()];
                if candidate.key.len() > existing.key.len() {
                    *existing = candidate;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(unique.len());
                unique.push(candidate);
            }
        }
    }

    unique.sort_by(|a, b| {
        (a.uri().as_str(), a.link.target_selection_range.start)
            .cmp(&(b.uri().as_str(), b.link.target_selection_range.start))
            .then_with(|| a.key.cmp(&b.key))
    });
    unique
}

#[allow(deprecated)]
fn to_symbol_information(candidate: &DefinitionCandidate) -> SymbolInformation {
    let container_name = candidate
        .key
        .rsplit_once('.')
        .map(|(schema, _)| schema.to_string());

    SymbolInformation {
        name: candidate.key.clone(),
        kind: candidate.kind.symbol_kind(),
        tags: None,
        deprecated: None,
        location: Location::new(
            candidate.uri().clone(),
            candidate.link.target_selection_range,
        ),
        container_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::extract_definitions;
    use tower_lsp::lsp_types::SymbolKind;

    fn indexed(files: &[(&str, &str)]) -> DefinitionIndex {
        let index = DefinitionIndex::new();
        for (path, text) in files {
            let uri = Url::parse(&format!("file:///work/{}", path)).unwrap();
            index.replace_file_candidates(&uri, extract_definitions(&uri, text, "public").unwrap());
        }
        index
    }

    #[test]
    fn test_document_symbols_one_per_definition() {
        let index = indexed(&[(
            "schema.pgsql",
            "CREATE TABLE users (id integer);\n\
             CREATE TABLE billing.invoices (id integer);\n\
             CREATE FUNCTION touch() RETURNS trigger LANGUAGE plpgsql AS $$ BEGIN RETURN NEW; END $$;\n",
        )]);
        let uri = Url::parse("file:///work/schema.pgsql").unwrap();

        let symbols = document_symbols(&index, &uri);
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names, vec!["public.users", "billing.invoices", "public.touch"]);
        assert_eq!(symbols[0].kind, SymbolKind::CLASS);
        assert_eq!(symbols[0].container_name.as_deref(), Some("public"));
        assert_eq!(symbols[2].kind, SymbolKind::FUNCTION);
    }

    #[test]
    fn test_workspace_symbols_search() {
        let index = indexed(&[
            ("a.pgsql", "CREATE TABLE users (id integer);"),
            ("b.pgsql", "CREATE VIEW active_users AS SELECT 1;"),
            ("c.pgsql", "CREATE TABLE orders (id integer);"),
        ]);

        let symbols = workspace_symbols(&index, "USERS");
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names, vec!["public.users", "public.active_users"]);
        assert_eq!(workspace_symbols(&index, "").len(), 3);
        assert!(workspace_symbols(&index, "missing").is_empty());
    }
}
