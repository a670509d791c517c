// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # pgsql-lsp - Definition Index
//!
//! Go-to-definition across a workspace of PostgreSQL files.
//!
//! ## Architecture
//!
//! ```text
//! file text ─→ pgsql_lsp_parser ─→ [Statement]
//!                                       │
//!                                       ↓
//!                          Extractor (+ LineIndex ranges)
//!                                       │  [DefinitionCandidate]
//!                                       ↓
//!                DefinitionIndex::replace_file_candidates(uri, ..)
//!                                       ↑
//!          resolve(index, token) ── sanitize_generic / sanitize_specific
//! ```
//!
//! - [`range`]: byte offsets to editor ranges
//! - [`extract`]: statements to candidates, one function per statement kind
//! - [`sanitize`]: raw cursor tokens to lookup keys
//! - [`index`]: shared key -> locations store, replaced per file
//! - [`resolve`]: two-pass lookup of a cursor token
//!
//! Nothing in this crate fails: unsupported statements contribute no candidates and a
//! missed lookup is `None`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pgsql_lsp_definition::{DefinitionIndex, extract_candidates, resolve};
//!
//! let index = DefinitionIndex::new();
//! let statements = pgsql_lsp_parser::parse_statements(&text)?;
//! index.replace_file_candidates(&uri, extract_candidates(&text, &statements, &uri, "public"));
//!
//! let links = resolve(&index, r#"public."users_20240101""#);
//! ```

pub mod candidate;
pub mod extract;
pub mod index;
pub mod range;
pub mod resolve;
pub mod sanitize;

pub use candidate::{DefinitionCandidate, DefinitionKind, definition_link};
pub use extract::{Extractor, extract_candidates};
pub use index::DefinitionIndex;
pub use range::{LineIndex, range_from_offsets};
pub use resolve::resolve;
pub use sanitize::{sanitize_generic, sanitize_specific};
