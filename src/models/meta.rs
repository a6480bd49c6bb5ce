//! Represents structured and user-defined metadata attached to media.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Server-defined metadata blocks of a media object.
///
/// User metadata is not part of this view; it is read per key or through
/// the `user` field endpoint.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaMeta {
    #[serde(default)]
    pub exif: BTreeMap<String, String>,
    #[serde(default)]
    pub gpano: BTreeMap<String, String>,
}

/// Metadata exactly as `GET /media/{id}/meta` returns it.
#[derive(Deserialize, Clone, Debug, Default)]
pub(crate) struct RawMeta {
    #[serde(default)]
    pub exif: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub gpano: Option<BTreeMap<String, String>>,
    #[serde(default)]
    #[allow(dead_code)]
    pub user: Option<BTreeMap<String, String>>,
}

impl From<RawMeta> for MediaMeta {
    fn from(raw: RawMeta) -> Self {
        Self {
            exif: raw.exif.unwrap_or_default(),
            gpano: raw.gpano.unwrap_or_default(),
        }
    }
}

/// A user metadata name that passed validation.
///
/// `raw` is the caller-facing name (`user.<key>`), `wire` the segment used in
/// request paths. Only `services::meta_key` constructs these.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserMetaKey {
    raw: String,
    wire: String,
}

impl UserMetaKey {
    pub(crate) fn new(raw: impl Into<String>, wire: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            wire: wire.into(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn wire(&self) -> &str {
        &self.wire
    }
}

impl fmt::Display for UserMetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
