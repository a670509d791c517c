// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # LSP Backend Implementation
//!
//! This module provides the main LSP server backend using tower-lsp.
//!
//! ## Overview
//!
//! The backend handles:
//! - LSP protocol communication via tower-lsp
//! - Document lifecycle (open, change, save, close)
//! - Keeping the definition index in sync with definition files
//! - Settings from the client and from `.pgsql-lsp.yaml`
//!
//! ## Architecture
//!
//! ```text
//! Client → LSP Backend → Document Store
//!                ↓
//!        Workspace Indexer ─→ Definition Index ←─ goto_definition / symbols
//! ```
//!
//! ## Supported LSP Features
//!
//! - textDocument/didOpen, didChange, didSave, didClose
//! - textDocument/definition
//! - textDocument/documentSymbol
//! - workspace/symbol
//! - workspace/didChangeWatchedFiles
//! - workspace/didChangeConfiguration
//!
//! Open documents are indexed from their in-memory text, everything else from disk.

use crate::config::{ConfigError, Settings};
use crate::definition::find_definition;
use crate::document::{DocumentError, DocumentStore};
use crate::symbols::{document_symbols, workspace_symbols};
use crate::workspace::{DefinitionFilter, ScanSummary, WorkspaceError, WorkspaceIndexer};
use pgsql_lsp_definition::DefinitionIndex;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info, warn};

/// LSP backend implementation
///
/// Main entry point for all LSP protocol operations.
/// Uses tower-lsp framework for protocol handling.
pub struct LspBackend {
    /// LSP client for sending notifications and requests
    client: Client,

    /// Document store for managing open documents
    documents: Arc<DocumentStore>,

    /// Active settings
    settings: Arc<RwLock<Settings>>,

    /// Workspace folder paths
    roots: Arc<RwLock<Vec<PathBuf>>>,

    /// Owner of the definition index
    indexer: WorkspaceIndexer,

    /// Serializes workspace rescans
    rescans: Arc<RescanGate>,
}

impl LspBackend {
    /// Create a new LSP backend
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(DocumentStore::new()),
            settings: Arc::new(RwLock::new(Settings::default())),
            roots: Arc::new(RwLock::new(Vec::new())),
            indexer: WorkspaceIndexer::new(Arc::new(DefinitionIndex::new())),
            rescans: Arc::new(RescanGate::default()),
        }
    }

    /// Get the document store
    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Get the definition index
    pub fn index(&self) -> &Arc<DefinitionIndex> {
        self.indexer.index()
    }

    /// Get the active settings
    pub async fn get_settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Replace the active settings
    pub async fn set_settings(&self, settings: Settings) {
        info!(
            "Settings updated: defaultSchema={}, definitionFiles={:?}",
            settings.default_schema, settings.definition_files
        );
        *self.settings.write().await = settings;
    }

    /// Get the workspace folder paths
    pub async fn workspace_roots(&self) -> Vec<PathBuf> {
        self.roots.read().await.clone()
    }

    /// Re-index the workspace with the current settings
    ///
    /// Rescans run one at a time. Returns `None` when a newer rescan was requested while
    /// this one waited, in which case the newer one does the work.
    pub async fn reindex_workspace(&self) -> std::result::Result<Option<ScanSummary>, LspError> {
        let ticket = self.rescans.ticket();
        rescan(
            &self.rescans,
            ticket,
            &self.indexer,
            &self.documents,
            &self.settings,
            &self.roots,
        )
        .await
    }

    /// Run [`Self::reindex_workspace`] in the background
    fn spawn_reindex(&self) {
        let ticket = self.rescans.ticket();
        let client = self.client.clone();
        let rescans = self.rescans.clone();
        let indexer = self.indexer.clone();
        let documents = self.documents.clone();
        let settings = self.settings.clone();
        let roots = self.roots.clone();

        tokio::spawn(async move {
            match rescan(&rescans, ticket, &indexer, &documents, &settings, &roots).await {
                Ok(Some(summary)) => {
                    client
                        .log_message(
                            MessageType::INFO,
                            format!(
                                "Indexed {} definition files ({} failed)",
                                summary.indexed, summary.failed
                            ),
                        )
                        .await;
                }
                Ok(None) => debug!("Workspace rescan {} superseded", ticket),
                Err(e) => {
                    error!("Workspace indexing failed: {}", e);
                    client
                        .log_message(MessageType::ERROR, format!("Workspace indexing failed: {}", e))
                        .await;
                }
            }
        });
    }

    /// Re-index an open document from its in-memory text, if it holds definitions
    async fn index_document(&self, uri: &Url, text: String) -> std::result::Result<(), LspError> {
        let settings = self.get_settings().await;
        let filter = DefinitionFilter::new(self.workspace_roots().await, &settings)?;
        if !filter.matches_uri(uri) {
            debug!("Not a definition file: {}", uri);
            return Ok(());
        }

        let count = self
            .indexer
            .index_text(uri, text, &settings.default_schema)
            .await?;
        debug!("Re-indexed {}: {} candidates", uri, count);
        Ok(())
    }

    /// Re-index a file from disk, if it holds definitions
    async fn index_from_disk(&self, uri: &Url) -> std::result::Result<(), LspError> {
        let settings = self.get_settings().await;
        let filter = DefinitionFilter::new(self.workspace_roots().await, &settings)?;
        if !filter.matches_uri(uri) {
            return Ok(());
        }

        self.indexer.index_uri(uri, &settings.default_schema).await?;
        Ok(())
    }

    /// Log a message to the client
    async fn log_message(&self, message: &str, message_type: MessageType) {
        self.client.log_message(message_type, message).await;
    }

    /// Show a message to the user
    async fn show_message(&self, message: &str, message_type: MessageType) {
        self.client.show_message(message_type, message).await;
    }
}

/// Settings from the client, else the first workspace root's settings file, else defaults
fn initial_settings(roots: &[PathBuf], initialization_options: Option<&Value>) -> Settings {
    if let Some(options) = initialization_options {
        match Settings::from_lsp_settings(options) {
            Ok(Some(settings)) => return settings,
            Ok(None) => {}
            Err(e) => warn!("Ignoring invalid initialization options: {}", e),
        }
    }

    for root in roots {
        match Settings::from_workspace_root(root) {
            Ok(Some(settings)) => {
                info!("Loaded settings from {}", root.display());
                return settings;
            }
            Ok(None) => {}
            Err(e) => warn!("Ignoring settings file in {}: {}", root.display(), e),
        }
    }

    Settings::default()
}

#[allow(deprecated)]
fn workspace_roots_from(params: &InitializeParams) -> Vec<PathBuf> {
    let uris: Vec<Url> = match &params.workspace_folders {
        Some(folders) if !folders.is_empty() => {
            folders.iter().map(|folder| folder.uri.clone()).collect()
        }
        _ => params.root_uri.iter().cloned().collect(),
    };

    uris.iter()
        .filter_map(|uri| match uri.to_file_path() {
            Ok(path) => Some(path),
            Err(()) => {
                warn!("Ignoring non-file workspace folder: {}", uri);
                None
            }
        })
        .collect()
}

/// Orders workspace rescans
///
/// Every request takes a ticket. A rescan whose ticket is no longer the latest by the time
/// it gets to run is skipped.
#[derive(Debug, Default)]
struct RescanGate {
    running: Mutex<()>,
    latest: AtomicU64,
}

impl RescanGate {
    fn ticket(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}

async fn rescan(
    gate: &RescanGate,
    ticket: u64,
    indexer: &WorkspaceIndexer,
    documents: &DocumentStore,
    settings: &RwLock<Settings>,
    roots: &RwLock<Vec<PathBuf>>,
) -> std::result::Result<Option<ScanSummary>, LspError> {
    let _running = gate.running.lock().await;
    if !gate.is_latest(ticket) {
        return Ok(None);
    }

    // Read under the gate so the last rescan to run sees the newest settings
    let settings = settings.read().await.clone();
    let roots = roots.read().await.clone();

    rebuild_index(indexer, documents, roots, &settings)
        .await
        .map(Some)
}

/// Re-index open documents from memory and everything else from disk, in place
async fn rebuild_index(
    indexer: &WorkspaceIndexer,
    documents: &DocumentStore,
    roots: Vec<PathBuf>,
    settings: &Settings,
) -> std::result::Result<ScanSummary, LspError> {
    let filter = DefinitionFilter::new(roots, settings)?;

    // Open documents may hold unsaved edits
    let mut open = HashSet::new();
    for document in documents.list_documents().await {
        if !filter.matches_uri(document.uri()) {
            continue;
        }
        open.insert(document.uri().clone());

        if let Err(e) = indexer
            .index_text(document.uri(), document.get_content(), &settings.default_schema)
            .await
        {
            warn!("Failed to index open document {}: {}", document.uri(), e);
        }
    }

    let summary = indexer
        .scan(filter, &settings.default_schema, &open)
        .await?;

    Ok(summary)
}

#[tower_lsp::async_trait]
impl LanguageServer for LspBackend {
    /// Initialize the LSP server
    ///
    /// Records workspace folders and settings. Indexing starts on `initialized`.
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("Initializing LSP server");
        info!("Client info: {:?}", params.client_info);

        let roots = workspace_roots_from(&params);
        info!("Workspace roots: {:?}", roots);

        let settings = initial_settings(&roots, params.initialization_options.as_ref());
        *self.roots.write().await = roots;
        self.set_settings(settings).await;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                // Text synchronization
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::INCREMENTAL),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(true),
                        })),
                        ..Default::default()
                    },
                )),

                definition_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                workspace_symbol_provider: Some(OneOf::Left(true)),

                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(false),
                        change_notifications: Some(OneOf::Left(false)),
                    }),
                    ..Default::default()
                }),

                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: crate::SERVER_NAME.to_string(),
                version: Some(crate::VERSION.to_string()),
            }),
        })
    }

    /// Initialized notification
    ///
    /// Starts the initial workspace scan in the background.
    async fn initialized(&self, _params: InitializedParams) {
        info!("LSP server initialized successfully");

        self.log_message("pgsql-lsp server initialized", MessageType::INFO)
            .await;

        self.spawn_reindex();
    }

    /// Shutdown the LSP server
    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down LSP server");
        Ok(())
    }

    /// Document opened notification
    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let uri = doc.uri;

        info!(
            "Document opened: uri={}, language={}, version={}",
            uri, doc.language_id, doc.version
        );

        self.documents
            .open_document(uri.clone(), doc.text.clone(), doc.version, doc.language_id)
            .await;

        if let Err(e) = self.index_document(&uri, doc.text).await {
            warn!("Failed to index {}: {}", uri, e);
        }
    }

    /// Document changed notification
    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let identifier = params.text_document;
        let uri = identifier.uri.clone();

        debug!(
            "Document changed: uri={}, version={}, changes={}",
            uri,
            identifier.version,
            params.content_changes.len()
        );

        match self
            .documents
            .update_document(&identifier, &params.content_changes)
            .await
        {
            Ok(text) => {
                if let Err(e) = self.index_document(&uri, text).await {
                    debug!("Failed to re-index {} after change: {}", uri, e);
                }
            }
            Err(DocumentError::DocumentNotFound(uri)) => {
                warn!("Document not found for change: {}", uri);
            }
            Err(e) => {
                error!("Failed to update document: {}", e);
                self.show_message(
                    &format!("Failed to update document: {}", e),
                    MessageType::ERROR,
                )
                .await;
            }
        }
    }

    /// Document saved notification
    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Document saved: uri={}", uri);

        let text = match params.text {
            Some(text) => Some(text),
            None => self
                .documents
                .get_document(&uri)
                .await
                .map(|doc| doc.get_content()),
        };

        let result = match text {
            Some(text) => self.index_document(&uri, text).await,
            None => self.index_from_disk(&uri).await,
        };
        if let Err(e) = result {
            warn!("Failed to index {} after save: {}", uri, e);
        }
    }

    /// Document closed notification
    ///
    /// Unsaved edits are discarded, so the file is re-read from disk.
    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;

        info!("Document closed: uri={}", uri);

        if !self.documents.close_document(&uri).await {
            warn!("Document not found for close: {}", uri);
            return;
        }

        if let Err(e) = self.index_from_disk(&uri).await {
            warn!("Failed to re-index {} after close: {}", uri, e);
        }
    }

    /// Watched files changed on disk
    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        for event in params.changes {
            let uri = event.uri;

            if event.typ == FileChangeType::DELETED {
                debug!("Definition file deleted: {}", uri);
                self.indexer.remove(&uri).await;
                continue;
            }

            // The editor's copy of an open document is authoritative
            if self.documents.has_document(&uri).await {
                continue;
            }

            if let Err(e) = self.index_from_disk(&uri).await {
                warn!("Failed to index {}: {}", uri, e);
            }
        }
    }

    /// Client settings changed
    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        match Settings::from_lsp_settings(&params.settings) {
            Ok(Some(settings)) => {
                self.set_settings(settings).await;
                self.spawn_reindex();
            }
            Ok(None) => debug!("Configuration change without pgsqlLsp section"),
            Err(e) => {
                warn!("Invalid settings: {}", e);
                self.show_message(&format!("pgsql-lsp: {}", e), MessageType::WARNING)
                    .await;
            }
        }
    }

    /// Go to definition request
    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        debug!(
            "Definition requested: uri={}, line={}, col={}",
            uri, position.line, position.character
        );

        let Some(document) = self.documents.get_document(&uri).await else {
            warn!("Document not found for definition: {}", uri);
            return Ok(None);
        };

        Ok(find_definition(self.index(), &document, position).map(GotoDefinitionResponse::Link))
    }

    /// Document symbols request
    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let symbols = document_symbols(self.index(), &params.text_document.uri);
        Ok(Some(DocumentSymbolResponse::Flat(symbols)))
    }

    /// Workspace symbols request
    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        Ok(Some(workspace_symbols(self.index(), &params.query)))
    }
}

/// LSP-specific errors
#[derive(Debug, thiserror::Error)]
pub enum LspError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Document error
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Indexing error
    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
}
