// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # pgsql-lsp - Language Server Protocol
//!
//! Go-to-definition for PostgreSQL projects that keep their schema in `.pgsql`/`.sql`
//! definition files.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Client (VS Code, etc.)          │
//! └──────────────┬──────────────────────────┘
//!                │ LSP Protocol
//!                ↓
//! ┌─────────────────────────────────────────┐
//! │         LSP Backend (tower-lsp)         │
//! ├─────────────────────────────────────────┤
//! │  • did_open / did_change / did_save     │
//! │  • definition / symbols                 │
//! └──────────────┬──────────────────────────┘
//!                │
//!         ┌──────┴──────┬────────────────┐
//!         ↓             ↓                ↓
//! ┌────────────┐ ┌──────────┐  ┌──────────────────┐
//! │  Settings  │ │ Document │  │ Workspace Indexer│
//! │            │ │   Store  │  │  → Definition    │
//! └────────────┘ └──────────┘  │    Index         │
//!                              └──────────────────┘
//! ```
//!
//! ## Configuration
//!
//! 1. **Client Settings** (recommended)
//! ```json
//! {
//!   "pgsqlLsp": {
//!     "defaultSchema": "public",
//!     "definitionFiles": ["**/*.pgsql"]
//!   }
//! }
//! ```
//!
//! 2. **Configuration File** `.pgsql-lsp.yaml` at the workspace root
//! ```yaml
//! defaultSchema: public
//! definitionFiles:
//!   - "schema/**/*.pgsql"
//! ```
//!
//! A document whose leading comment is `-- pgsql-lsp:disable` gets no definitions.
//!
//! ## Modules
//!
//! - [`backend`]: Main LSP server implementation
//! - [`config`]: Settings and validation
//! - [`definition`]: Go-to-definition on open documents
//! - [`document`]: Document management and storage
//! - [`symbols`]: Document and workspace symbols
//! - [`word`]: Token under the cursor, disable marker
//! - [`workspace`]: Scanning and re-indexing definition files
//!
//! ## Error Handling
//!
//! The server degrades gracefully:
//! - Invalid settings → keep the previous settings, warn the user
//! - Unreadable or unparsable file → that file contributes nothing, log a warning
//! - Unknown name → no definition, no error

pub mod backend;
pub mod config;
pub mod definition;
pub mod document;
pub mod symbols;
pub mod word;
pub mod workspace;

// Re-exports for convenience
pub use backend::{LspBackend, LspError};
pub use config::{ConfigError, Settings};
pub use definition::find_definition;
pub use document::{Document, DocumentError, DocumentStore};
pub use symbols::{document_symbols, workspace_symbols};
pub use word::{CursorWord, is_disabled, word_at_position};
pub use workspace::{DefinitionFilter, FileLocks, ScanSummary, WorkspaceError, WorkspaceIndexer};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name
pub const SERVER_NAME: &str = "pgsql-lsp";
