// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Definition index
//!
//! Workspace-wide map from definition key to every location declaring it.
//!
//! ## Update model
//!
//! Each file's contribution is replaced as a unit: [`DefinitionIndex::replace_file_candidates`]
//! drops everything the file contributed before and inserts the new candidates under one
//! write lock, so readers see either the old or the new contribution of that file, never a
//! mix. Contributions of other files are left untouched.
//!
//! Parsing happens outside the index; the lock is held only for the swap.

use lsp_types::{LocationLink, Url};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::candidate::DefinitionCandidate;

#[derive(Debug, Default)]
struct IndexState {
    /// Key -> candidates, in insertion order across files
    by_key: HashMap<String, Vec<DefinitionCandidate>>,

    /// File -> keys it contributed
    by_file: HashMap<Url, HashSet<String>>,
}

impl IndexState {
    fn remove_file(&mut self, uri: &Url) -> usize {
        let Some(keys) = self.by_file.remove(uri) else {
            return 0;
        };

        let mut removed = 0;
        for key in keys {
            if let Some(candidates) = self.by_key.get_mut(&key) {
                let before = candidates.len();
                candidates.retain(|candidate| candidate.uri() != uri);
                removed += before - candidates.len();

                if candidates.is_empty() {
                    self.by_key.remove(&key);
                }
            }
        }
        removed
    }

    fn insert(&mut self, uri: &Url, candidates: Vec<DefinitionCandidate>) {
        if candidates.is_empty() {
            return;
        }

        let keys = self.by_file.entry(uri.clone()).or_default();
        for candidate in candidates {
            keys.insert(candidate.key.clone());
            self.by_key
                .entry(candidate.key.clone())
                .or_default()
                .push(candidate);
        }
    }
}

/// Shared definition index
///
/// Create one per workspace and hand an `Arc` of it to both the indexer and the request
/// handlers.
#[derive(Debug, Default)]
pub struct DefinitionIndex {
    state: RwLock<IndexState>,
}

impl DefinitionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything `uri` contributed with `candidates`
    ///
    /// Candidates pointing at another file are ignored; a file only ever owns its own
    /// definitions. Passing an empty list removes the file from the index.
    pub fn replace_file_candidates(&self, uri: &Url, candidates: Vec<DefinitionCandidate>) {
        let candidates: Vec<DefinitionCandidate> = candidates
            .into_iter()
            .filter(|candidate| candidate.uri() == uri)
            .collect();
        let added = candidates.len();

        let removed = {
            let mut state = self.state.write();
            let removed = state.remove_file(uri);
            state.insert(uri, candidates);
            removed
        };

        debug!(
            "Indexed {}: removed {} candidates, added {}",
            uri, removed, added
        );
    }

    /// Drop every candidate contributed by `uri`
    pub fn remove_file(&self, uri: &Url) {
        self.replace_file_candidates(uri, Vec::new());
    }

    /// Exact-match lookup
    ///
    /// Returns `None` when the key is unknown. A present key always has at least one link.
    pub fn lookup(&self, key: &str) -> Option<Vec<LocationLink>> {
        let state = self.state.read();
        state
            .by_key
            .get(key)
            .map(|candidates| candidates.iter().map(|c| c.link.clone()).collect())
    }

    /// Candidates currently contributed by `uri`, in key order
    pub fn file_candidates(&self, uri: &Url) -> Vec<DefinitionCandidate> {
        let state = self.state.read();
        let Some(keys) = state.by_file.get(uri) else {
            return Vec::new();
        };

        let mut keys: Vec<&String> = keys.iter().collect();
        keys.sort();

        keys.into_iter()
            .filter_map(|key| state.by_key.get(key))
            .flatten()
            .filter(|candidate| candidate.uri() == uri)
            .cloned()
            .collect()
    }

    /// Candidates whose key contains `query`, ignoring ASCII case
    ///
    /// An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<DefinitionCandidate> {
        let query = query.to_ascii_lowercase();
        let state = self.state.read();

        let mut keys: Vec<&String> = state
            .by_key
            .keys()
            .filter(|key| key.to_ascii_lowercase().contains(&query))
            .collect();
        keys.sort();

        keys.into_iter()
            .filter_map(|key| state.by_key.get(key))
            .flatten()
            .cloned()
            .collect()
    }

    /// Whether `uri` currently contributes anything
    pub fn contains_file(&self, uri: &Url) -> bool {
        self.state.read().by_file.contains_key(uri)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.state.read().by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().by_key.is_empty()
    }

    /// Number of indexed files
    pub fn file_count(&self) -> usize {
        self.state.read().by_file.len()
    }

    /// Files currently contributing candidates
    pub fn files(&self) -> Vec<Url> {
        self.state.read().by_file.keys().cloned().collect()
    }
}
