// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Workspace Indexing
//!
//! Feeds definition files into the shared [`DefinitionIndex`].
//!
//! ## Flow
//!
//! ```text
//! scan(roots) ─→ walkdir + globset ─→ [path]
//!                                       │  JoinSet, at most N in flight
//!                                       ↓
//!                     FileLocks::lock(uri) ─→ read ─→ parse (blocking pool)
//!                                       │
//!                                       ↓
//!                  DefinitionIndex::replace_file_candidates(uri, ..)
//! ```
//!
//! Every read-parse-replace of one file runs under that file's lock, so two updates of the
//! same file never interleave. Different files proceed in parallel, and the index itself is
//! locked only for the final swap.
//!
//! A file that cannot be read or parsed loses its contribution; the rest of the scan goes on.
//!
//! A rescan replaces files in place and only then drops files that are no longer matched,
//! so a lookup during the rescan still sees each file's old or new definitions.

use globset::GlobSet;
use pgsql_lsp_definition::{DefinitionCandidate, DefinitionIndex, extract_candidates};
use pgsql_lsp_parser::{ParseError, parse_statements};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, Semaphore};
use tokio::task::JoinSet;
use tower_lsp::lsp_types::Url;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::{ConfigError, Settings};

/// Per-file async locks
///
/// Entries nobody holds or waits on are pruned whenever another file is locked.
#[derive(Debug, Default)]
pub struct FileLocks {
    locks: Mutex<HashMap<Url, Arc<Mutex<()>>>>,
}

impl FileLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `uri`
    pub async fn lock(&self, uri: &Url) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(uri.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Decides which paths hold definitions
///
/// Patterns are matched against the path relative to the workspace root containing it.
/// Without workspace roots only the file name is matched.
#[derive(Debug, Clone)]
pub struct DefinitionFilter {
    roots: Vec<PathBuf>,
    matcher: GlobSet,
}

impl DefinitionFilter {
    pub fn new(roots: Vec<PathBuf>, settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            roots,
            matcher: settings.definition_matcher()?,
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        if self.roots.is_empty() {
            return path
                .file_name()
                .is_some_and(|name| self.matcher.is_match(Path::new(name)));
        }

        self.roots.iter().any(|root| {
            path.strip_prefix(root)
                .is_ok_and(|relative| self.matcher.is_match(relative))
        })
    }

    pub fn matches_uri(&self, uri: &Url) -> bool {
        uri.to_file_path().is_ok_and(|path| self.matches(&path))
    }

    /// Walk every root and collect matching files, sorted
    ///
    /// Hidden directories are skipped. Unreadable entries are logged and skipped.
    pub fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for root in &self.roots {
            let walker = WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Skipping unreadable workspace entry: {}", e);
                        continue;
                    }
                };

                if entry.file_type().is_file() && self.matches(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        }

        files.sort();
        files.dedup();
        files
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

/// Outcome of a workspace scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Files indexed successfully
    pub indexed: usize,

    /// Files that could not be read or parsed
    pub failed: usize,

    /// Candidates added across all files
    pub candidates: usize,
}

/// Parses files and keeps the shared index up to date
#[derive(Debug, Clone)]
pub struct WorkspaceIndexer {
    index: Arc<DefinitionIndex>,
    locks: Arc<FileLocks>,
}

impl WorkspaceIndexer {
    pub fn new(index: Arc<DefinitionIndex>) -> Self {
        Self {
            index,
            locks: Arc::new(FileLocks::new()),
        }
    }

    pub fn index(&self) -> &Arc<DefinitionIndex> {
        &self.index
    }

    /// Re-index `uri` from in-memory text
    ///
    /// Returns the number of candidates now contributed by the file. On a parse failure
    /// the file's previous contribution is dropped and the error returned.
    pub async fn index_text(
        &self,
        uri: &Url,
        text: String,
        default_schema: &str,
    ) -> Result<usize, WorkspaceError> {
        let _guard = self.locks.lock(uri).await;
        self.replace_locked(uri, text, default_schema).await
    }

    /// Re-index a file from disk
    pub async fn index_path(&self, path: &Path, default_schema: &str) -> Result<usize, WorkspaceError> {
        let uri = Url::from_file_path(path)
            .map_err(|_| WorkspaceError::InvalidPath(path.to_path_buf()))?;

        let _guard = self.locks.lock(&uri).await;

        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(source) => {
                self.index.remove_file(&uri);
                return Err(WorkspaceError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        self.replace_locked(&uri, text, default_schema).await
    }

    /// Re-index the file behind a `file://` URI from disk
    pub async fn index_uri(&self, uri: &Url, default_schema: &str) -> Result<usize, WorkspaceError> {
        let path = uri
            .to_file_path()
            .map_err(|_| WorkspaceError::NotAFile(uri.clone()))?;

        self.index_path(&path, default_schema).await
    }

    /// Drop everything `uri` contributed
    pub async fn remove(&self, uri: &Url) {
        let _guard = self.locks.lock(uri).await;
        self.index.remove_file(uri);
    }

    /// Index every definition file under the filter's roots
    ///
    /// Reads and parses run concurrently, bounded by the available parallelism. Files in
    /// `keep` are left as they are; open documents are indexed from memory instead. Files
    /// indexed earlier that are neither found nor kept are dropped afterwards.
    pub async fn scan(
        &self,
        filter: DefinitionFilter,
        default_schema: &str,
        keep: &HashSet<Url>,
    ) -> Result<ScanSummary, WorkspaceError> {
        let files = tokio::task::spawn_blocking(move || filter.collect_files()).await?;
        info!("Indexing {} definition files", files.len());

        let limit = std::thread::available_parallelism().map_or(4, |n| n.get());
        let permits = Arc::new(Semaphore::new(limit));
        let mut tasks = JoinSet::new();
        let mut scanned = HashSet::with_capacity(files.len());

        for path in files {
            let Ok(uri) = Url::from_file_path(&path) else {
                warn!("Skipping non-absolute path {}", path.display());
                continue;
            };
            if !scanned.insert(uri.clone()) || keep.contains(&uri) {
                continue;
            }

            let permit = permits.clone().acquire_owned().await?;
            let indexer = self.clone();
            let default_schema = default_schema.to_string();

            tasks.spawn(async move {
                let _permit = permit;
                let result = indexer.index_path(&path, &default_schema).await;
                (path, result)
            });
        }

        let mut summary = ScanSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(candidates))) => {
                    summary.indexed += 1;
                    summary.candidates += candidates;
                }
                Ok((path, Err(e))) => {
                    warn!("Failed to index {}: {}", path.display(), e);
                    summary.failed += 1;
                }
                Err(e) => {
                    error!("Indexing task failed: {}", e);
                    summary.failed += 1;
                }
            }
        }

        for uri in self.index.files() {
            if !scanned.contains(&uri) && !keep.contains(&uri) {
                debug!("Dropping {} from the index", uri);
                self.remove(&uri).await;
            }
        }

        info!(
            "Workspace indexed: {} files, {} failed, {} candidates",
            summary.indexed, summary.failed, summary.candidates
        );

        Ok(summary)
    }

    /// Parse off the async runtime, then swap the file's candidates
    ///
    /// Caller must hold the file lock.
    async fn replace_locked(
        &self,
        uri: &Url,
        text: String,
        default_schema: &str,
    ) -> Result<usize, WorkspaceError> {
        let parse_uri = uri.clone();
        let default_schema = default_schema.to_string();
        let extracted = tokio::task::spawn_blocking(move || {
            extract_definitions(&parse_uri, &text, &default_schema)
        })
        .await?;

        match extracted {
            Ok(candidates) => {
                let count = candidates.len();
                self.index.replace_file_candidates(uri, candidates);
                debug!("Indexed {} candidates from {}", count, uri);
                Ok(count)
            }
            Err(source) => {
                self.index.remove_file(uri);
                Err(WorkspaceError::Parse {
                    uri: uri.clone(),
                    source,
                })
            }
        }
    }
}

/// Parse `text` and extract its definition candidates
pub fn extract_definitions(
    uri: &Url,
    text: &str,
    default_schema: &str,
) -> Result<Vec<DefinitionCandidate>, ParseError> {
    let statements = parse_statements(text)?;
    Ok(extract_candidates(text, &statements, uri, default_schema))
}

/// Workspace indexing errors
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// File could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File could not be parsed
    #[error("Failed to parse {uri}: {source}")]
    Parse {
        uri: Url,
        #[source]
        source: ParseError,
    },

    /// Path cannot be expressed as a `file://` URI
    #[error("Not an absolute file path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// URI does not name a local file
    #[error("Not a file URI: {0}")]
    NotAFile(Url),

    /// Invalid definition file settings
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Background task panicked or was cancelled
    #[error("Indexing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Concurrency limiter closed
    #[error("Indexing cancelled: {0}")]
    Cancelled(#[from] tokio::sync::AcquireError),
}
