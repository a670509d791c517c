// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # pgsql-lsp - Statement Parser
//!
//! This crate is the boundary between pgsql-lsp and libpg_query.
//!
//! ## Overview
//!
//! libpg_query returns a loosely typed protobuf tree where every statement kind is an
//! optional field. This crate decodes the top-level statements of a file into the closed
//! [`StatementKind`] variant type, so that downstream code matches on one case per
//! statement kind and never checks field presence itself.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pgsql_lsp_parser::{parse_statements, StatementKind};
//!
//! let statements = parse_statements("CREATE TABLE users (id int);")?;
//! assert!(matches!(statements[0].kind, StatementKind::CreateTable(_)));
//! ```

pub mod decode;
pub mod error;
pub mod statement;

pub use decode::parse_statements;
pub use error::{ParseError, ParseResult};
pub use statement::{RangeName, Statement, StatementKind};
