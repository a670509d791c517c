// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Test fixtures: definition files and cursor documents

use lsp_types::Url;

/// URI of a fixture file inside the virtual test workspace
pub fn fixture_uri(relative_path: &str) -> Url {
    Url::parse(&format!("file:///workspace/definitions/{}", relative_path))
        .unwrap_or_else(|e| panic!("Invalid fixture path '{}': {}", relative_path, e))
}

/// Sample SQL definition files
///
/// Positions quoted in the docs are `(line, character)`.
pub struct SqlFixtures;

impl SqlFixtures {
    // ===== Tables =====

    /// `tables/companies.pgsql`
    ///
    /// Statement `(0, 0)..(3, 1)`, name `(0, 13)..(0, 22)`.
    pub const fn companies() -> &'static str {
        "CREATE TABLE companies (\n  id integer NOT NULL,\n  name text NOT NULL\n);\n"
    }

    /// `tables/public_users.pgsql`
    ///
    /// Statement `(0, 0)..(4, 1)`, name `(1, 13)..(1, 25)`.
    pub const fn public_users() -> &'static str {
        "-- Application users.\nCREATE TABLE public.users (\n  id integer NOT NULL,\n  email text\n);\n"
    }

    /// `tables/campaign_participants.pgsql`
    ///
    /// Statement `(0, 0)..(2, 1)`, name `(0, 13)..(0, 34)`.
    pub const fn campaign_participants() -> &'static str {
        "CREATE TABLE campaign.participants (\n  id integer NOT NULL\n);\n"
    }

    // ===== Views =====

    /// `views/deleted_users.pgsql`
    ///
    /// Statement `(0, 0)..(6, 24)`, name `(0, 12)..(0, 25)`.
    pub const fn deleted_users() -> &'static str {
        "CREATE VIEW deleted_users AS\nSELECT\n  *\nFROM\n  users\nWHERE\n  deleted_at IS NOT NULL;\n"
    }

    // ===== Functions =====

    /// `functions/touch_updated_at.pgsql`
    ///
    /// Name `(0, 16)..(0, 39)`.
    pub const fn touch_updated_at() -> &'static str {
        "CREATE FUNCTION public.touch_updated_at() RETURNS trigger\nLANGUAGE plpgsql AS $$\nBEGIN\n  NEW.updated_at := now();\n  RETURN NEW;\nEND;\n$$;\n"
    }

    // ===== Mixed =====

    /// Several object kinds in one file
    pub const fn mixed_schema() -> &'static str {
        "CREATE TYPE public.money_pair AS (amount numeric, currency text);\n\
         \n\
         CREATE TABLE billing.invoices (\n  id integer NOT NULL\n);\n\
         \n\
         CREATE INDEX invoices_id_idx ON billing.invoices (id);\n\
         \n\
         CREATE MATERIALIZED VIEW invoice_totals AS SELECT 1 AS total;\n\
         \n\
         SELECT 1;\n"
    }

    /// A file the parser rejects
    pub const fn syntax_error() -> &'static str {
        "CREATE TABLE broken (\n  id integer\n"
    }

    // ===== Cursor documents =====

    /// A document that opts out of language server features
    pub const fn disabled_document() -> &'static str {
        "-- pgsql-lsp:disable\n\ncompanies\n"
    }

    /// Same as [`Self::disabled_document`] with a block comment marker
    pub const fn disabled_block_document() -> &'static str {
        "/* pgsql-lsp:disable */\n\ncompanies\n"
    }
}
