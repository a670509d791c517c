// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Identifier sanitization
//!
//! Rewrites the raw token under the cursor into a lookup key. Every rule touches only the
//! trailing identifier component, keeps a leading `schema.` verbatim, and returns its input
//! unchanged when it does not match.
//!
//! Two chains are applied to the same raw token, in this order:
//!
//! 1. Generic: `%ROWTYPE` suffix, quoted identifier, dynamic `_$$` partition suffix
//! 2. Specific: numeric partition suffix, UUID partition suffix
//!
//! The chains must stay independent. Quote stripping in the generic chain would otherwise
//! eat the quotes around `"users_1234"` before the partition rules see the token whole.
//!
//! ```text
//! public.users%ROWTYPE                                   -> public.users
//! public."users"                                         -> public.users
//! "users_$$ || key || $$"   (token ends at `_$$`)        -> users
//! public.users_1234                                      -> public.users
//! "users_12345678-1234-1234-1234-123456789012"           -> users
//! ```

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static ROW_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""?([A-Za-z_][A-Za-z0-9_]*)"?%(?:ROWTYPE|rowtype)$"#).expect("valid regex")
});

static QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(^[A-Za-z_][A-Za-z0-9_]*\.)?"([A-Za-z_][A-Za-z0-9_]*)"$"#).expect("valid regex")
});

static DYNAMIC_PARTITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""?([A-Za-z_][A-Za-z0-9_]*)_\$\$"?$"#).expect("valid regex")
});

static NUMBER_PARTITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""?([A-Za-z_][A-Za-z0-9_]*)_[0-9]+"?$"#).expect("valid regex")
});

static UUID_PARTITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#""?([A-Za-z_][A-Za-z0-9_]*)_[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}"?$"#,
    )
    .expect("valid regex")
});

/// `public.users%ROWTYPE` -> `public.users`
pub fn sanitize_row_type(word: &str) -> Cow<'_, str> {
    ROW_TYPE.replace(word, "${1}")
}

/// `public."users"` -> `public.users`, `"users"` -> `users`
pub fn sanitize_quoted(word: &str) -> Cow<'_, str> {
    QUOTED.replace(word, "${1}${2}")
}

/// `public."users_$$` -> `public.users`
///
/// Dynamic SQL builds partition names as `'"users_$$ || key || $$"'`; the token under the
/// cursor stops at the `$$`.
pub fn sanitize_dynamic_partition(word: &str) -> Cow<'_, str> {
    DYNAMIC_PARTITION.replace(word, "${1}")
}

/// `public.users_1234` -> `public.users`, `"users_1234"` -> `users`
pub fn sanitize_number_partition(word: &str) -> Cow<'_, str> {
    NUMBER_PARTITION.replace(word, "${1}")
}

/// `users_12345678-1234-1234-1234-123456789012` -> `users`
pub fn sanitize_uuid_partition(word: &str) -> Cow<'_, str> {
    UUID_PARTITION.replace(word, "${1}")
}

/// Generic chain: row type, quoting, dynamic partition
pub fn sanitize_generic(word: &str) -> String {
    let word = sanitize_row_type(word);
    let word = sanitize_quoted(&word);
    sanitize_dynamic_partition(&word).into_owned()
}

/// Specific chain: numeric then UUID partition suffix
pub fn sanitize_specific(word: &str) -> String {
    let word = sanitize_number_partition(word);
    sanitize_uuid_partition(&word).into_owned()
}
