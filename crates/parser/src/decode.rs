// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Protobuf decoding
//!
//! Converts libpg_query's protobuf parse tree into [`Statement`] values.
//!
//! Decoding is tolerant: a statement whose payload lacks a required name decodes as
//! [`StatementKind::Other`] instead of failing the file.

use pg_query::NodeEnum;
use pg_query::protobuf::{self, ObjectType, RangeVar, RawStmt};
use tracing::debug;

use crate::error::ParseResult;
use crate::statement::{RangeName, Statement, StatementKind};

/// Parse SQL text into its top-level statements
///
/// # Returns
///
/// - `Ok(statements)` - One entry per top-level statement, in source order
/// - `Err(ParseError)` - The text is not valid PostgreSQL
pub fn parse_statements(text: &str) -> ParseResult<Vec<Statement>> {
    let parsed = pg_query::parse(text)?;

    let statements: Vec<Statement> = parsed
        .protobuf
        .stmts
        .iter()
        .map(|raw| decode_raw_stmt(raw, text.len()))
        .collect();

    debug!(
        "Decoded {} statements from {} bytes",
        statements.len(),
        text.len()
    );

    Ok(statements)
}

/// Decode one `RawStmt`
///
/// libpg_query reports `stmt_len == 0` for a statement that runs to the end of the input.
fn decode_raw_stmt(raw: &RawStmt, text_len: usize) -> Statement {
    let location = offset(raw.stmt_location);
    let len = match offset(raw.stmt_len) {
        0 => text_len.saturating_sub(location),
        len => len,
    };

    let kind = raw
        .stmt
        .as_ref()
        .and_then(|node| node.node.as_ref())
        .map(decode_node)
        .unwrap_or(StatementKind::Other);

    Statement::new(location, len, kind)
}

fn decode_node(node: &NodeEnum) -> StatementKind {
    let kind = match node {
        NodeEnum::CreateStmt(stmt) => range_name(stmt.relation.as_ref()).map(StatementKind::CreateTable),
        NodeEnum::ViewStmt(stmt) => range_name(stmt.view.as_ref()).map(StatementKind::CreateView),
        NodeEnum::CompositeTypeStmt(stmt) => {
            range_name(stmt.typevar.as_ref()).map(StatementKind::CreateCompositeType)
        }
        NodeEnum::CreateFunctionStmt(stmt) => Some(StatementKind::CreateFunction {
            names: string_list(&stmt.funcname),
            is_procedure: stmt.is_procedure,
        }),
        NodeEnum::CreateDomainStmt(stmt) => Some(StatementKind::CreateDomain {
            names: string_list(&stmt.domainname),
        }),
        NodeEnum::CreateTrigStmt(stmt) => {
            non_empty(&stmt.trigname).map(|name| StatementKind::CreateTrigger {
                name,
                relation: range_name(stmt.relation.as_ref()),
            })
        }
        NodeEnum::IndexStmt(stmt) => {
            non_empty(&stmt.idxname).map(|name| StatementKind::CreateIndex {
                name,
                relation: range_name(stmt.relation.as_ref()),
            })
        }
        NodeEnum::CreateTableAsStmt(stmt) => stmt
            .into
            .as_ref()
            .and_then(|into| range_name(into.rel.as_ref()))
            .map(|into| StatementKind::CreateTableAs {
                into,
                materialized: stmt.objtype() == ObjectType::ObjectMatview,
            }),
        _ => None,
    };

    kind.unwrap_or(StatementKind::Other)
}

/// Decode a `RangeVar`; `None` when it is absent or has no relation name
fn range_name(range_var: Option<&RangeVar>) -> Option<RangeName> {
    let range_var = range_var?;
    let name = non_empty(&range_var.relname)?;

    Some(RangeName {
        schema: non_empty(&range_var.schemaname),
        name,
        location: offset(range_var.location),
    })
}

/// Keep only the `String` components of a qualified name list
fn string_list(nodes: &[protobuf::Node]) -> Vec<String> {
    nodes
        .iter()
        .filter_map(|node| match &node.node {
            Some(NodeEnum::String(s)) => Some(s.sval.clone()),
            _ => None,
        })
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// libpg_query uses -1 for unknown locations
fn offset(value: i32) -> usize {
    usize::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_negative_is_zero() {
        assert_eq!(offset(-1), 0);
        assert_eq!(offset(42), 42);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("users"), Some("users".to_string()));
    }

    #[test]
    fn test_range_name_without_relname() {
        let range_var = RangeVar {
            schemaname: "public".to_string(),
            location: 3,
            ..Default::default()
        };

        assert_eq!(range_name(Some(&range_var)), None);
        assert_eq!(range_name(None), None);
    }

    #[test]
    fn test_range_name_unqualified() {
        let range_var = RangeVar {
            relname: "users".to_string(),
            location: 13,
            ..Default::default()
        };

        assert_eq!(range_name(Some(&range_var)), Some(RangeName::new("users", 13)));
    }

    #[test]
    fn test_raw_stmt_zero_len_runs_to_end() {
        let raw = RawStmt {
            stmt: None,
            stmt_location: 10,
            stmt_len: 0,
        };

        let statement = decode_raw_stmt(&raw, 50);
        assert_eq!(statement.location, 10);
        assert_eq!(statement.len, 40);
        assert_eq!(statement.kind, StatementKind::Other);
    }
}
