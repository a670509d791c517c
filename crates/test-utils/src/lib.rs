// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for pgsql-lsp
//!
//! This crate provides common testing components including:
//! - SQL definition files with known name and statement positions
//! - Assertions over definition links

pub mod assertions;
pub mod fixtures;

// Re-exports for convenience
pub use assertions::LinkAssertions;
pub use fixtures::{SqlFixtures, fixture_uri};
