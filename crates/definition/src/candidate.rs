// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Definition candidates produced by extraction and stored by the index

use lsp_types::{LocationLink, Range, SymbolKind, Url};
use std::fmt;

/// What kind of object a definition declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Table,
    View,
    MaterializedView,
    CompositeType,
    Function,
    Procedure,
    Domain,
    Trigger,
    Index,
}

impl DefinitionKind {
    /// Symbol kind shown in editor outlines
    pub fn symbol_kind(&self) -> SymbolKind {
        match self {
            DefinitionKind::Table | DefinitionKind::View | DefinitionKind::MaterializedView => {
                SymbolKind::CLASS
            }
            DefinitionKind::CompositeType | DefinitionKind::Domain => SymbolKind::STRUCT,
            DefinitionKind::Function | DefinitionKind::Procedure => SymbolKind::FUNCTION,
            DefinitionKind::Trigger => SymbolKind::EVENT,
            DefinitionKind::Index => SymbolKind::KEY,
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DefinitionKind::Table => "TABLE",
            DefinitionKind::View => "VIEW",
            DefinitionKind::MaterializedView => "MATERIALIZED VIEW",
            DefinitionKind::CompositeType => "TYPE",
            DefinitionKind::Function => "FUNCTION",
            DefinitionKind::Procedure => "PROCEDURE",
            DefinitionKind::Domain => "DOMAIN",
            DefinitionKind::Trigger => "TRIGGER",
            DefinitionKind::Index => "INDEX",
        };
        f.write_str(name)
    }
}

/// One lookup key pointing at one physical definition
///
/// A statement declared in the default schema yields two candidates (qualified and bare)
/// sharing the same `link`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionCandidate {
    /// Lookup key, e.g. `public.users` or `users`
    pub key: String,

    pub kind: DefinitionKind,

    /// `target_range` spans the statement, `target_selection_range` the name
    pub link: LocationLink,
}

impl DefinitionCandidate {
    pub fn new(key: impl Into<String>, kind: DefinitionKind, link: LocationLink) -> Self {
        Self {
            key: key.into(),
            kind,
            link,
        }
    }

    /// File the definition lives in
    pub fn uri(&self) -> &Url {
        &self.link.target_uri
    }
}

/// Build the link shared by all candidates of one statement
pub fn definition_link(uri: &Url, target_range: Range, target_selection_range: Range) -> LocationLink {
    LocationLink {
        origin_selection_range: None,
        target_uri: uri.clone(),
        target_range,
        target_selection_range,
    }
}
