//! Validation of user metadata names and values.
//!
//! User metadata names look like `user.<key>`; only `<key>` travels in
//! request paths. Every call site (reads, adds, removals) goes through here.

use crate::models::meta::UserMetaKey;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const USER_META_PREFIX: &str = "user.";
pub const MAX_USER_META_KEY_LEN: usize = 256;
pub const MIN_USER_META_VALUE_LEN: usize = 1;
pub const MAX_USER_META_VALUE_LEN: usize = 1024;

static USER_META_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^user\.([A-Za-z0-9_-]{1,256})$").expect("user metadata key pattern is valid")
});

/// The rejected raw name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid user metadata key `{0}`")]
pub struct InvalidMetaKey(pub String);

/// Extract the wire-safe key segment from a raw `user.<key>` name.
pub fn to_wire_key(raw_name: &str) -> Result<UserMetaKey, InvalidMetaKey> {
    USER_META_KEY
        .captures(raw_name)
        .and_then(|caps| caps.get(1))
        .map(|key| UserMetaKey::new(raw_name, key.as_str()))
        .ok_or_else(|| InvalidMetaKey(raw_name.to_string()))
}

/// Character count in `[1, 1024]`. No normalization is applied.
pub fn is_valid_value(value: &str) -> bool {
    let len = value.chars().count();
    (MIN_USER_META_VALUE_LEN..=MAX_USER_META_VALUE_LEN).contains(&len)
}
