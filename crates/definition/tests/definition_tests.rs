// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! End-to-end definition tests: parse, extract, index, resolve

use lsp_types::Url;
use pgsql_lsp_definition::{DefinitionIndex, DefinitionKind, extract_candidates, resolve};
use pgsql_lsp_parser::parse_statements;
use pgsql_lsp_test_utils::assertions::range;
use pgsql_lsp_test_utils::{LinkAssertions, SqlFixtures, fixture_uri};

fn index_file(index: &DefinitionIndex, path: &str, text: &str) -> Url {
    let uri = fixture_uri(path);
    let statements = parse_statements(text).expect("fixture should parse");
    index.replace_file_candidates(&uri, extract_candidates(text, &statements, &uri, "public"));
    uri
}

#[test]
fn test_unqualified_table_is_reachable_both_ways() {
    let index = DefinitionIndex::new();
    let uri = index_file(&index, "tables/companies.pgsql", SqlFixtures::companies());

    let bare = LinkAssertions::assert_single(resolve(&index, "companies"));
    let qualified = LinkAssertions::assert_single(resolve(&index, "public.companies"));

    LinkAssertions::assert_link(&bare, &uri, range((0, 0), (3, 1)), range((0, 13), (0, 22)));
    assert_eq!(bare, qualified);
}

#[test]
fn test_leading_comment_is_part_of_first_statement() {
    let index = DefinitionIndex::new();
    let uri = index_file(&index, "tables/public_users.pgsql", SqlFixtures::public_users());

    let link = LinkAssertions::assert_single(resolve(&index, "users"));
    LinkAssertions::assert_link(&link, &uri, range((0, 0), (4, 1)), range((1, 13), (1, 25)));
}

#[test]
fn test_non_default_schema_needs_qualification() {
    let index = DefinitionIndex::new();
    let uri = index_file(
        &index,
        "tables/campaign_participants.pgsql",
        SqlFixtures::campaign_participants(),
    );

    let link = LinkAssertions::assert_single(resolve(&index, "campaign.participants"));
    LinkAssertions::assert_link(&link, &uri, range((0, 0), (2, 1)), range((0, 13), (0, 34)));

    LinkAssertions::assert_none(resolve(&index, "participants"));
    LinkAssertions::assert_none(resolve(&index, "public.participants"));
}

#[test]
fn test_view_and_function_definitions() {
    let index = DefinitionIndex::new();
    let views = index_file(&index, "views/deleted_users.pgsql", SqlFixtures::deleted_users());
    let functions = index_file(
        &index,
        "functions/touch_updated_at.pgsql",
        SqlFixtures::touch_updated_at(),
    );

    let view = LinkAssertions::assert_single(resolve(&index, "deleted_users"));
    LinkAssertions::assert_link(&view, &views, range((0, 0), (6, 24)), range((0, 12), (0, 25)));

    let function = LinkAssertions::assert_single(resolve(&index, "touch_updated_at"));
    assert_eq!(function.target_uri, functions);
    assert_eq!(function.target_selection_range, range((0, 16), (0, 39)));
    LinkAssertions::assert_selection_within_target(&function);
}

#[test]
fn test_cursor_token_variants_resolve_to_table() {
    let index = DefinitionIndex::new();
    index_file(&index, "tables/public_users.pgsql", SqlFixtures::public_users());

    let expected = LinkAssertions::assert_single(resolve(&index, "users"));

    for token in [
        r#"public."users""#,
        r#""users""#,
        "users%ROWTYPE",
        r#"public."users_$$"#,
        r#"public."users_20240101""#,
        "users_1234",
        "users_0a1b2c3d-4e5f-6a7b-8c9d-0e1f2a3b4c5d",
    ] {
        let link = LinkAssertions::assert_single(resolve(&index, token));
        assert_eq!(link, expected, "token {:?} resolved elsewhere", token);
    }

    LinkAssertions::assert_none(resolve(&index, "users_archive"));
}

#[test]
fn test_mixed_schema_file() {
    let text = SqlFixtures::mixed_schema();
    let uri = fixture_uri("mixed.pgsql");
    let statements = parse_statements(text).unwrap();
    let candidates = extract_candidates(text, &statements, &uri, "public");

    let keys: Vec<(&str, DefinitionKind)> = candidates
        .iter()
        .map(|candidate| (candidate.key.as_str(), candidate.kind))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("public.money_pair", DefinitionKind::CompositeType),
            ("money_pair", DefinitionKind::CompositeType),
            ("billing.invoices", DefinitionKind::Table),
            ("billing.invoices_id_idx", DefinitionKind::Index),
            ("public.invoice_totals", DefinitionKind::MaterializedView),
            ("invoice_totals", DefinitionKind::MaterializedView),
        ]
    );

    let index = DefinitionIndex::new();
    index.replace_file_candidates(&uri, candidates);

    let composite = LinkAssertions::assert_single(resolve(&index, "money_pair"));
    assert_eq!(composite.target_selection_range, range((0, 12), (0, 29)));

    let table = LinkAssertions::assert_single(resolve(&index, "billing.invoices"));
    assert_eq!(table.target_selection_range, range((2, 13), (2, 29)));

    let idx = LinkAssertions::assert_single(resolve(&index, "billing.invoices_id_idx"));
    assert_eq!(idx.target_selection_range, range((6, 13), (6, 28)));

    let matview = LinkAssertions::assert_single(resolve(&index, "invoice_totals"));
    assert_eq!(matview.target_selection_range, range((8, 25), (8, 39)));

    for link in [composite, table, idx, matview] {
        LinkAssertions::assert_selection_within_target(&link);
    }
}

#[test]
fn test_reindexing_one_file_keeps_others() {
    let index = DefinitionIndex::new();
    let companies = index_file(&index, "tables/companies.pgsql", SqlFixtures::companies());
    let users = index_file(&index, "tables/public_users.pgsql", SqlFixtures::public_users());

    // The companies table is renamed in place
    let renamed = "CREATE TABLE organizations (\n  id integer NOT NULL\n);\n";
    index_file(&index, "tables/companies.pgsql", renamed);

    LinkAssertions::assert_none(resolve(&index, "companies"));
    let organizations = LinkAssertions::assert_single(resolve(&index, "organizations"));
    assert_eq!(organizations.target_uri, companies);

    let link = LinkAssertions::assert_single(resolve(&index, "users"));
    assert_eq!(link.target_uri, users);
    assert_eq!(index.file_count(), 2);
}

#[test]
fn test_duplicate_definitions_across_files() {
    let index = DefinitionIndex::new();
    let first = index_file(&index, "a/companies.pgsql", SqlFixtures::companies());
    let second = index_file(&index, "b/companies.pgsql", SqlFixtures::companies());

    let links = resolve(&index, "companies").unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].target_uri, first);
    assert_eq!(links[1].target_uri, second);
}

#[test]
fn test_syntax_error_never_reaches_index() {
    let index = DefinitionIndex::new();
    index_file(&index, "tables/companies.pgsql", SqlFixtures::companies());

    assert!(parse_statements(SqlFixtures::syntax_error()).is_err());
    assert!(resolve(&index, "companies").is_some());
}

#[test]
fn test_file_candidates_for_document_symbols() {
    let index = DefinitionIndex::new();
    let uri = index_file(&index, "tables/companies.pgsql", SqlFixtures::companies());

    let keys: Vec<String> = index
        .file_candidates(&uri)
        .into_iter()
        .map(|candidate| candidate.key)
        .collect();
    assert_eq!(keys, vec!["companies", "public.companies"]);
}
