// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Workspace indexing tests against a temporary directory

use pgsql_lsp_definition::{DefinitionIndex, resolve};
use pgsql_lsp_server::config::Settings;
use pgsql_lsp_server::workspace::{DefinitionFilter, WorkspaceError, WorkspaceIndexer};
use pgsql_lsp_test_utils::SqlFixtures;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};
use tower_lsp::lsp_types::Url;

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "schema/tables/companies.pgsql", SqlFixtures::companies());
    write(dir.path(), "schema/tables/public_users.pgsql", SqlFixtures::public_users());
    write(
        dir.path(),
        "schema/tables/campaign_participants.sql",
        SqlFixtures::campaign_participants(),
    );
    write(dir.path(), "schema/views/deleted_users.psql", SqlFixtures::deleted_users());
    write(dir.path(), "README.md", "# not sql");
    dir
}

fn indexer() -> WorkspaceIndexer {
    WorkspaceIndexer::new(Arc::new(DefinitionIndex::new()))
}

fn filter(dir: &TempDir, settings: &Settings) -> DefinitionFilter {
    DefinitionFilter::new(vec![dir.path().to_path_buf()], settings).unwrap()
}

#[tokio::test]
async fn test_scan_indexes_matching_files() {
    let dir = workspace();
    let indexer = indexer();
    let settings = Settings::default();

    let summary = indexer
        .scan(filter(&dir, &settings), &settings.default_schema, &HashSet::new())
        .await
        .unwrap();

    assert_eq!(summary.indexed, 4);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.candidates, 7);

    let index = indexer.index();
    assert!(resolve(index, "companies").is_some());
    assert!(resolve(index, "campaign.participants").is_some());
    assert!(resolve(index, "deleted_users").is_some());

    let users = resolve(index, r#"public."users_20240101""#).unwrap();
    let expected = Url::from_file_path(dir.path().join("schema/tables/public_users.pgsql")).unwrap();
    assert_eq!(users[0].target_uri, expected);
}

#[tokio::test]
async fn test_scan_respects_patterns() {
    let dir = workspace();
    let indexer = indexer();
    let settings = Settings {
        definition_files: vec!["schema/tables/*.pgsql".to_string()],
        ..Default::default()
    };

    let summary = indexer
        .scan(filter(&dir, &settings), &settings.default_schema, &HashSet::new())
        .await
        .unwrap();

    assert_eq!(summary.indexed, 2);
    assert!(resolve(indexer.index(), "campaign.participants").is_none());
    assert!(resolve(indexer.index(), "deleted_users").is_none());
}

#[tokio::test]
async fn test_scan_skips_hidden_directories() {
    let dir = workspace();
    write(dir.path(), ".git/hooks/users.sql", "CREATE TABLE hidden_table (id integer);");
    let indexer = indexer();
    let settings = Settings::default();

    indexer
        .scan(filter(&dir, &settings), &settings.default_schema, &HashSet::new())
        .await
        .unwrap();

    assert!(resolve(indexer.index(), "hidden_table").is_none());
}

#[tokio::test]
async fn test_broken_file_does_not_stop_scan() {
    let dir = workspace();
    write(dir.path(), "schema/broken.pgsql", SqlFixtures::syntax_error());
    let indexer = indexer();
    let settings = Settings::default();

    let summary = indexer
        .scan(filter(&dir, &settings), &settings.default_schema, &HashSet::new())
        .await
        .unwrap();

    assert_eq!(summary.indexed, 4);
    assert_eq!(summary.failed, 1);
    assert!(resolve(indexer.index(), "companies").is_some());
}

#[tokio::test]
async fn test_reindex_file_from_disk() {
    let dir = workspace();
    let indexer = indexer();
    let settings = Settings::default();
    indexer
        .scan(filter(&dir, &settings), &settings.default_schema, &HashSet::new())
        .await
        .unwrap();

    let path = dir.path().join("schema/tables/companies.pgsql");
    fs::write(&path, "CREATE TABLE organizations (id integer);").unwrap();
    let count = assert_ok!(indexer.index_path(&path, "public").await);

    assert_eq!(count, 2);
    assert!(resolve(indexer.index(), "companies").is_none());
    assert!(resolve(indexer.index(), "organizations").is_some());
    assert!(resolve(indexer.index(), "users").is_some());
}

#[tokio::test]
async fn test_parse_failure_clears_file() {
    let indexer = indexer();
    let uri = Url::parse("file:///work/companies.pgsql").unwrap();

    indexer
        .index_text(&uri, SqlFixtures::companies().to_string(), "public")
        .await
        .unwrap();
    assert!(resolve(indexer.index(), "companies").is_some());

    let result = indexer
        .index_text(&uri, SqlFixtures::syntax_error().to_string(), "public")
        .await;

    assert!(matches!(result, Err(WorkspaceError::Parse { .. })));
    assert!(resolve(indexer.index(), "companies").is_none());
    assert!(!indexer.index().contains_file(&uri));
}

#[tokio::test]
async fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let indexer = indexer();

    let error = assert_err!(
        indexer
            .index_path(&dir.path().join("missing.pgsql"), "public")
            .await
    );

    assert!(matches!(error, WorkspaceError::Io { .. }));
}

#[tokio::test]
async fn test_concurrent_reindex_of_one_file() {
    let indexer = indexer();
    let uri = Url::parse("file:///work/companies.pgsql").unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let indexer = indexer.clone();
            let uri = uri.clone();
            tokio::spawn(async move {
                indexer
                    .index_text(&uri, SqlFixtures::companies().to_string(), "public")
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // No duplicates from interleaved updates
    assert_eq!(resolve(indexer.index(), "companies").unwrap().len(), 1);
    assert_eq!(indexer.index().file_candidates(&uri).len(), 2);
}

#[tokio::test]
async fn test_remove_file() {
    let indexer = indexer();
    let uri = Url::parse("file:///work/companies.pgsql").unwrap();

    indexer
        .index_text(&uri, SqlFixtures::companies().to_string(), "public")
        .await
        .unwrap();
    indexer.remove(&uri).await;

    assert!(indexer.index().is_empty());
}
