// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Document Management
//!
//! In-memory text of the documents the client has open.
//!
//! ## Overview
//!
//! The document store handles:
//! - Document synchronization (open, change, close)
//! - Text content management using Ropey for efficient edits
//! - Document metadata (language ID, version, URI)
//!
//! Positions received from the client use UTF-16 columns; they are converted to rope
//! character indices before any edit.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pgsql_lsp_server::DocumentStore;
//!
//! let store = DocumentStore::new();
//! store.open_document(uri.clone(), text, 1, "pgsql".to_string()).await;
//!
//! if let Some(doc) = store.get_document(&uri).await {
//!     println!("Line 0: {:?}", doc.get_line(0));
//! }
//! ```

use ropey::Rope;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp::lsp_types::{
    Position, TextDocumentContentChangeEvent, Url, VersionedTextDocumentIdentifier,
};

/// Document metadata
#[derive(Debug, Clone)]
struct DocumentMetadata {
    /// Document URI
    uri: Url,

    /// Language identifier (e.g., "sql", "pgsql")
    language_id: String,

    /// Document version
    /// Incremented on each change
    version: i32,

    /// Line count
    line_count: usize,
}

impl DocumentMetadata {
    /// Create new document metadata
    fn new(uri: Url, language_id: String, version: i32, line_count: usize) -> Self {
        Self {
            uri,
            language_id,
            version,
            line_count,
        }
    }
}

/// A document managed by the LSP server
#[derive(Debug, Clone)]
pub struct Document {
    /// Document metadata
    metadata: DocumentMetadata,

    /// Document content as a rope for efficient editing
    content: Rope,
}

impl Document {
    /// Create a new document
    pub fn new(uri: Url, content: String, version: i32, language_id: String) -> Self {
        let rope = Rope::from_str(&content);
        let line_count = rope.len_lines();

        Self {
            metadata: DocumentMetadata::new(uri, language_id, version, line_count),
            content: rope,
        }
    }

    /// Get the document URI
    pub fn uri(&self) -> &Url {
        &self.metadata.uri
    }

    /// Get the document language ID
    pub fn language_id(&self) -> &str {
        &self.metadata.language_id
    }

    /// Get the document version
    pub fn version(&self) -> i32 {
        self.metadata.version
    }

    /// Get the line count
    pub fn line_count(&self) -> usize {
        self.metadata.line_count
    }

    /// Get the full document content as a string
    pub fn get_content(&self) -> String {
        self.content.to_string()
    }

    /// Get a line of text without its line ending
    pub fn get_line(&self, line: usize) -> Option<String> {
        if line >= self.line_count() {
            return None;
        }

        // ropey's line() includes the line ending, so we need to strip it
        let line_with_ending = self.content.line(line).to_string();
        Some(line_with_ending.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Convert an LSP position (UTF-16 column) to a rope character index
    ///
    /// Returns `None` for positions past the end of their line or the document.
    pub fn position_to_char(&self, position: Position) -> Option<usize> {
        let line = position.line as usize;
        if line >= self.content.len_lines() {
            return None;
        }

        let slice = self.content.line(line);
        let character = position.character as usize;
        if character > slice.len_utf16_cu() {
            return None;
        }

        Some(self.content.line_to_char(line) + slice.utf16_cu_to_char(character))
    }

    /// Apply content changes to the document
    ///
    /// Changes are applied in order; a change without a range replaces the whole text.
    pub fn apply_changes(
        &mut self,
        changes: &[TextDocumentContentChangeEvent],
        new_version: i32,
    ) -> Result<(), DocumentError> {
        for change in changes {
            match &change.range {
                Some(range) => {
                    let invalid = || DocumentError::InvalidRange {
                        start: (range.start.line as usize, range.start.character as usize),
                        end: (range.end.line as usize, range.end.character as usize),
                    };

                    let start_char = self.position_to_char(range.start).ok_or_else(invalid)?;
                    let end_char = self.position_to_char(range.end).ok_or_else(invalid)?;
                    if start_char > end_char {
                        return Err(invalid());
                    }

                    self.content.remove(start_char..end_char);
                    self.content.insert(start_char, &change.text);
                }
                None => {
                    self.content = Rope::from_str(&change.text);
                }
            }
        }

        // Update metadata
        self.metadata.version = new_version;
        self.metadata.line_count = self.content.len_lines();

        Ok(())
    }
}

/// Store for all open documents
#[derive(Debug, Default)]
pub struct DocumentStore {
    /// Map of document URI to document
    documents: Arc<RwLock<HashMap<Url, Document>>>,
}

impl DocumentStore {
    /// Create a new document store
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document, replacing any previous text under the same URI
    pub async fn open_document(&self, uri: Url, content: String, version: i32, language_id: String) {
        let mut docs = self.documents.write().await;
        let document = Document::new(uri.clone(), content, version, language_id);
        docs.insert(uri, document);
    }

    /// Close a document
    ///
    /// Returns true if the document was closed, false if it didn't exist
    pub async fn close_document(&self, uri: &Url) -> bool {
        let mut docs = self.documents.write().await;
        docs.remove(uri).is_some()
    }

    /// Apply changes to an open document and return its new text
    pub async fn update_document(
        &self,
        identifier: &VersionedTextDocumentIdentifier,
        changes: &[TextDocumentContentChangeEvent],
    ) -> Result<String, DocumentError> {
        let mut docs = self.documents.write().await;

        let document = docs
            .get_mut(&identifier.uri)
            .ok_or_else(|| DocumentError::DocumentNotFound(identifier.uri.clone()))?;

        document.apply_changes(changes, identifier.version)?;

        Ok(document.get_content())
    }

    /// Get a document by URI
    pub async fn get_document(&self, uri: &Url) -> Option<Document> {
        let docs = self.documents.read().await;
        docs.get(uri).cloned()
    }

    /// Check if a document exists
    pub async fn has_document(&self, uri: &Url) -> bool {
        let docs = self.documents.read().await;
        docs.contains_key(uri)
    }

    /// Snapshot of every open document
    pub async fn list_documents(&self) -> Vec<Document> {
        let docs = self.documents.read().await;
        docs.values().cloned().collect()
    }
}

/// Document-related errors
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(Url),

    /// Invalid range for text operation
    #[error("Invalid range: start={start:?}, end={end:?}")]
    InvalidRange {
        start: (usize, usize),
        end: (usize, usize),
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Range;

    fn create_test_uri() -> Url {
        Url::parse("file:///test.pgsql").unwrap()
    }

    fn edit(start: (u32, u32), end: (u32, u32), text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(Range::new(
                Position::new(start.0, start.1),
                Position::new(end.0, end.1),
            )),
            range_length: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_document_new() {
        let uri = create_test_uri();
        let doc = Document::new(
            uri.clone(),
            "SELECT * FROM users".to_string(),
            1,
            "pgsql".to_string(),
        );

        assert_eq!(doc.uri(), &uri);
        assert_eq!(doc.language_id(), "pgsql");
        assert_eq!(doc.version(), 1);
        assert_eq!(doc.get_content(), "SELECT * FROM users");
    }

    #[test]
    fn test_document_get_line() {
        let content = "SELECT *\r\nFROM users\nWHERE id = 1";
        let doc = Document::new(create_test_uri(), content.to_string(), 1, "sql".to_string());

        assert_eq!(doc.get_line(0), Some("SELECT *".to_string()));
        assert_eq!(doc.get_line(1), Some("FROM users".to_string()));
        assert_eq!(doc.get_line(2), Some("WHERE id = 1".to_string()));
        assert_eq!(doc.get_line(3), None);
    }

    #[test]
    fn test_position_to_char_counts_utf16() {
        // "é" is one UTF-16 unit, "😀" is two
        let doc = Document::new(create_test_uri(), "é😀x\nab".to_string(), 1, "sql".to_string());

        assert_eq!(doc.position_to_char(Position::new(0, 1)), Some(1));
        assert_eq!(doc.position_to_char(Position::new(0, 3)), Some(2));
        assert_eq!(doc.position_to_char(Position::new(1, 2)), Some(6));
        assert_eq!(doc.position_to_char(Position::new(1, 3)), None);
        assert_eq!(doc.position_to_char(Position::new(5, 0)), None);
    }

    #[test]
    fn test_document_apply_changes_full() {
        let mut doc = Document::new(create_test_uri(), "old content".to_string(), 1, "sql".to_string());

        let changes = vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new content".to_string(),
        }];

        doc.apply_changes(&changes, 2).unwrap();

        assert_eq!(doc.get_content(), "new content");
        assert_eq!(doc.version(), 2);
    }

    #[test]
    fn test_document_apply_changes_incremental() {
        let mut doc = Document::new(
            create_test_uri(),
            "CREATE TABLE users ();".to_string(),
            1,
            "sql".to_string(),
        );

        doc.apply_changes(&[edit((0, 13), (0, 18), "accounts")], 2)
            .unwrap();

        assert_eq!(doc.get_content(), "CREATE TABLE accounts ();");
        assert_eq!(doc.version(), 2);
    }

    #[test]
    fn test_document_apply_changes_multiline() {
        let mut doc = Document::new(
            create_test_uri(),
            "CREATE TABLE a (\n  id integer\n);\n".to_string(),
            1,
            "sql".to_string(),
        );

        doc.apply_changes(&[edit((0, 15), (2, 1), "()")], 2).unwrap();

        assert_eq!(doc.get_content(), "CREATE TABLE a ();\n");
        assert_eq!(doc.line_count(), 2);
    }

    #[test]
    fn test_document_apply_changes_invalid_range() {
        let mut doc = Document::new(create_test_uri(), "SELECT *".to_string(), 1, "sql".to_string());

        let result = doc.apply_changes(&[edit((0, 0), (10, 0), "x")], 2);
        assert!(matches!(result, Err(DocumentError::InvalidRange { .. })));

        let result = doc.apply_changes(&[edit((0, 5), (0, 2), "x")], 2);
        assert!(matches!(result, Err(DocumentError::InvalidRange { .. })));
    }

    #[tokio::test]
    async fn test_document_store_open_close() {
        let store = DocumentStore::new();
        let uri = create_test_uri();

        store
            .open_document(uri.clone(), "SELECT *".to_string(), 1, "sql".to_string())
            .await;

        assert!(store.has_document(&uri).await);
        assert_eq!(store.list_documents().await.len(), 1);

        assert!(store.close_document(&uri).await);
        assert!(!store.has_document(&uri).await);
        assert!(!store.close_document(&uri).await);
    }

    #[tokio::test]
    async fn test_document_store_update() {
        let store = DocumentStore::new();
        let uri = create_test_uri();

        store
            .open_document(uri.clone(), "old".to_string(), 1, "sql".to_string())
            .await;

        let identifier = VersionedTextDocumentIdentifier {
            uri: uri.clone(),
            version: 2,
        };

        let changes = vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new".to_string(),
        }];

        let text = store.update_document(&identifier, &changes).await.unwrap();
        assert_eq!(text, "new");

        let doc = store.get_document(&uri).await.unwrap();
        assert_eq!(doc.version(), 2);
    }

    #[tokio::test]
    async fn test_document_store_update_unknown() {
        let store = DocumentStore::new();
        let identifier = VersionedTextDocumentIdentifier {
            uri: create_test_uri(),
            version: 2,
        };

        let result = store.update_document(&identifier, &[]).await;
        assert!(matches!(result, Err(DocumentError::DocumentNotFound(_))));
    }
}
