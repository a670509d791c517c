// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Error types for the parser boundary

/// Result type alias for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors that can occur while parsing a SQL file
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// libpg_query rejected the input
    #[error("Syntax error: {message}")]
    Syntax { message: String },
}

impl From<pg_query::Error> for ParseError {
    fn from(error: pg_query::Error) -> Self {
        ParseError::Syntax {
            message: error.to_string(),
        }
    }
}
