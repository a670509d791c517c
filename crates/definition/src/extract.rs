// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Candidate extraction
//!
//! Turns the top-level statements of one file into [`DefinitionCandidate`]s.
//!
//! ## Key policy
//!
//! - Explicit schema `S`, name `N`: one candidate keyed `S.N`
//! - No schema, or `S` equal to the default schema `D`: `D.N` and `N`, sharing one link
//!
//! ## Ranges
//!
//! The target range spans the whole statement. The selection range spans the name as
//! written: `[location, location + len("S.") + len(N))` for relation names. Functions,
//! domains, triggers and indexes carry no name offset, so the name is searched for in the
//! statement text.
//!
//! Statements that cannot produce a candidate contribute nothing; they never fail the file.

use lsp_types::Url;
use pgsql_lsp_parser::{RangeName, Statement, StatementKind};
use tracing::debug;

use crate::candidate::{DefinitionCandidate, DefinitionKind, definition_link};
use crate::range::LineIndex;

/// Per-file extraction inputs
pub struct Extractor<'a> {
    text: &'a str,
    lines: LineIndex<'a>,
    uri: &'a Url,
    default_schema: &'a str,
}

impl<'a> Extractor<'a> {
    pub fn new(text: &'a str, uri: &'a Url, default_schema: &'a str) -> Self {
        Self {
            text,
            lines: LineIndex::new(text),
            uri,
            default_schema,
        }
    }

    /// Extract candidates from every statement, in source order
    pub fn extract(&self, statements: &[Statement]) -> Vec<DefinitionCandidate> {
        statements
            .iter()
            .flat_map(|statement| self.statement_candidates(statement))
            .collect()
    }

    /// Extract candidates from one statement
    pub fn statement_candidates(&self, statement: &Statement) -> Vec<DefinitionCandidate> {
        match &statement.kind {
            StatementKind::CreateTable(name) => {
                self.relation_candidates(statement, DefinitionKind::Table, name)
            }
            StatementKind::CreateView(name) => {
                self.relation_candidates(statement, DefinitionKind::View, name)
            }
            StatementKind::CreateCompositeType(name) => {
                self.relation_candidates(statement, DefinitionKind::CompositeType, name)
            }
            StatementKind::CreateTableAs { into, materialized } => {
                let kind = if *materialized {
                    DefinitionKind::MaterializedView
                } else {
                    DefinitionKind::Table
                };
                self.relation_candidates(statement, kind, into)
            }
            StatementKind::CreateFunction {
                names,
                is_procedure,
            } => {
                let kind = if *is_procedure {
                    DefinitionKind::Procedure
                } else {
                    DefinitionKind::Function
                };
                self.name_list_candidates(statement, kind, names)
            }
            StatementKind::CreateDomain { names } => {
                self.name_list_candidates(statement, DefinitionKind::Domain, names)
            }
            StatementKind::CreateTrigger { name, relation } => {
                self.relation_scoped_candidates(statement, DefinitionKind::Trigger, name, relation)
            }
            StatementKind::CreateIndex { name, relation } => {
                self.relation_scoped_candidates(statement, DefinitionKind::Index, name, relation)
            }
            StatementKind::Other => Vec::new(),
        }
    }

    /// Tables, views, composite types: the parser gives the name offset directly
    fn relation_candidates(
        &self,
        statement: &Statement,
        kind: DefinitionKind,
        name: &RangeName,
    ) -> Vec<DefinitionCandidate> {
        let prefix_len = name.schema.as_ref().map_or(0, |schema| schema.len() + 1);
        let name_end = name.location + prefix_len + name.name.len();

        self.candidates(
            statement,
            kind,
            name.schema.as_deref(),
            &name.name,
            (name.location, name_end),
        )
    }

    /// Functions and domains: one component is a bare name, two are schema + name
    fn name_list_candidates(
        &self,
        statement: &Statement,
        kind: DefinitionKind,
        names: &[String],
    ) -> Vec<DefinitionCandidate> {
        let (schema, name) = match names {
            [name] => (None, name.as_str()),
            [schema, name] => (Some(schema.as_str()), name.as_str()),
            _ => {
                debug!("Skipping {} with {} name components", kind, names.len());
                return Vec::new();
            }
        };

        let written = names.join(".");
        let span = self.locate(statement, &written, name);

        self.candidates(statement, kind, schema, name, span)
    }

    /// Triggers and indexes live in the schema of the relation they are declared on
    fn relation_scoped_candidates(
        &self,
        statement: &Statement,
        kind: DefinitionKind,
        name: &str,
        relation: &Option<RangeName>,
    ) -> Vec<DefinitionCandidate> {
        let schema = relation
            .as_ref()
            .and_then(|relation| relation.schema.as_deref());
        let span = self.locate(statement, name, name);

        self.candidates(statement, kind, schema, name, span)
    }

    /// Find the byte span of a name inside the statement text
    ///
    /// Tries the name as written, then the bare name, then falls back to an empty span at
    /// the statement start. Only whole identifiers match, so `func` never lands inside
    /// `FUNCTION`.
    fn locate(&self, statement: &Statement, written: &str, bare: &str) -> (usize, usize) {
        let body_end = statement.end().min(self.text.len());
        let body = self
            .text
            .get(statement.location..body_end)
            .unwrap_or_default();

        [written, bare]
            .into_iter()
            .find_map(|needle| {
                find_identifier(body, needle).map(|found| {
                    let start = statement.location + found;
                    (start, start + needle.len())
                })
            })
            .unwrap_or((statement.location, statement.location))
    }

    /// Apply the key policy and build the shared link
    fn candidates(
        &self,
        statement: &Statement,
        kind: DefinitionKind,
        schema: Option<&str>,
        name: &str,
        (name_start, name_end): (usize, usize),
    ) -> Vec<DefinitionCandidate> {
        if name.is_empty() {
            return Vec::new();
        }

        let stmt_start = statement.location;
        let stmt_end = statement.end().max(stmt_start);
        let name_start = name_start.clamp(stmt_start, stmt_end);
        let name_end = name_end.clamp(name_start, stmt_end);

        let link = definition_link(
            self.uri,
            self.lines.range(stmt_start, stmt_end),
            self.lines.range(name_start, name_end),
        );

        let schema = schema.filter(|schema| !schema.is_empty());
        let qualifier = schema.or((!self.default_schema.is_empty()).then_some(self.default_schema));
        let in_default_schema = schema.is_none_or(|schema| schema == self.default_schema);

        let mut candidates = Vec::with_capacity(2);
        if let Some(qualifier) = qualifier {
            candidates.push(DefinitionCandidate::new(
                format!("{}.{}", qualifier, name),
                kind,
                link.clone(),
            ));
        }
        if in_default_schema {
            candidates.push(DefinitionCandidate::new(name, kind, link));
        }

        candidates
    }
}

/// Extract definition candidates from the statements of one file
pub fn extract_candidates(
    text: &str,
    statements: &[Statement],
    uri: &Url,
    default_schema: &str,
) -> Vec<DefinitionCandidate> {
    Extractor::new(text, uri, default_schema).extract(statements)
}

/// Byte offset of the first whole-identifier occurrence of `needle`
///
/// An exact match wins. Unquoted identifiers reach us case-folded, so `Public.Foo` in the
/// source is found as `public.foo` when no exact match exists.
fn find_identifier(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }

    let bytes = haystack.as_bytes();
    let bounded = |start: usize| {
        let end = start + needle.len();
        let before = start.checked_sub(1).and_then(|i| bytes.get(i).copied());
        let after = bytes.get(end).copied();
        !before.is_some_and(is_identifier_byte) && !after.is_some_and(is_identifier_byte)
    };

    haystack
        .match_indices(needle)
        .map(|(start, _)| start)
        .find(|&start| bounded(start))
        .or_else(|| {
            bytes
                .windows(needle.len())
                .enumerate()
                .filter(|(_, window)| window.eq_ignore_ascii_case(needle.as_bytes()))
                .map(|(start, _)| start)
                .find(|&start| bounded(start))
        })
}

fn is_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}
