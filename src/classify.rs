//! Key decoding and filename classification
//!
//! Everything here is a pure function of the key: the same key always lands
//! in the same bucket.

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

use crate::config::RouterConfig;

static NUMERIC_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// Whether an object name counts as numeric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Numeric,
    NonNumeric,
}

impl Classification {
    /// Bucket this classification routes to
    pub fn destination<'a>(&self, config: &'a RouterConfig) -> &'a str {
        match self {
            Classification::Numeric => config.destination2(),
            Classification::NonNumeric => config.destination1(),
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Numeric => write!(f, "NUMERIC"),
            Classification::NonNumeric => write!(f, "NON_NUMERIC"),
        }
    }
}

/// Key could not be decoded to UTF-8 text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DecodeError(pub String);

/// Decode a key as delivered in an S3 notification
///
/// `+` becomes a space before percent-decoding, so `%2B` still yields a
/// literal plus. Escapes that are not followed by two hex digits are kept
/// verbatim.
pub fn decode_key(encoded: &str) -> Result<String, DecodeError> {
    let spaced = encoded.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| DecodeError(format!("decoded key is not valid UTF-8: {}", e)))
}

/// Last path segment of `key`
///
/// Empty for directory markers such as `photos/`.
pub fn file_name(key: &str) -> &str {
    match key.rfind('/') {
        Some(idx) => &key[idx + 1..],
        None => key,
    }
}

/// `name` without its last extension
///
/// Leading dots do not start an extension: `.env` and `..` are returned
/// whole, while `12.3` gives `12` and `123.` gives `123`.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if name[..idx].bytes().any(|b| b != b'.') => &name[..idx],
        _ => name,
    }
}

/// Whether `basename` is one or more ASCII digits and nothing else
pub fn is_numeric_basename(basename: &str) -> bool {
    NUMERIC_NAME.is_match(basename)
}

/// Classify an already decoded key
pub fn classify_key(key: &str) -> Classification {
    if is_numeric_basename(strip_extension(file_name(key))) {
        Classification::Numeric
    } else {
        Classification::NonNumeric
    }
}

/// Whether `key` denotes a folder placeholder rather than a file
pub fn is_directory_marker(key: &str) -> bool {
    key.ends_with('/')
}
