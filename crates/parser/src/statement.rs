// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Statement model
//!
//! Top-level statements as seen by the definition index. Each variant carries only the
//! fields its extractor needs; everything the index does not care about is `Other`.

/// A possibly schema-qualified relation name, as written at `location`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeName {
    /// Schema written in the source, if any
    pub schema: Option<String>,

    /// Object name (already case-folded by the parser)
    pub name: String,

    /// Byte offset of the first character of the qualified name
    pub location: usize,
}

impl RangeName {
    /// Create an unqualified name
    pub fn new(name: impl Into<String>, location: usize) -> Self {
        Self {
            schema: None,
            name: name.into(),
            location,
        }
    }

    /// Create a schema-qualified name
    pub fn qualified(schema: impl Into<String>, name: impl Into<String>, location: usize) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
            location,
        }
    }
}

/// Kind-specific payload of a top-level statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// `CREATE TABLE`
    CreateTable(RangeName),

    /// `CREATE VIEW`
    CreateView(RangeName),

    /// `CREATE TYPE ... AS (...)`
    CreateCompositeType(RangeName),

    /// `CREATE FUNCTION` / `CREATE PROCEDURE`
    ///
    /// The parser gives no offset for the name, only its components.
    CreateFunction {
        names: Vec<String>,
        is_procedure: bool,
    },

    /// `CREATE DOMAIN`
    CreateDomain { names: Vec<String> },

    /// `CREATE TRIGGER name ... ON relation`
    CreateTrigger {
        name: String,
        relation: Option<RangeName>,
    },

    /// `CREATE INDEX name ON relation`
    CreateIndex {
        name: String,
        relation: Option<RangeName>,
    },

    /// `CREATE TABLE ... AS` / `CREATE MATERIALIZED VIEW`
    CreateTableAs { into: RangeName, materialized: bool },

    /// Anything the index does not extract definitions from
    Other,
}

/// One top-level statement with its byte span in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Byte offset where the statement starts
    pub location: usize,

    /// Byte length of the statement
    pub len: usize,

    pub kind: StatementKind,
}

impl Statement {
    pub fn new(location: usize, len: usize, kind: StatementKind) -> Self {
        Self {
            location,
            len,
            kind,
        }
    }

    /// Byte offset one past the end of the statement
    pub fn end(&self) -> usize {
        self.location + self.len
    }
}
