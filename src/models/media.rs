//! Represents stored media objects and listing pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity and summary of one stored media object.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MediaInfo {
    /// Service-assigned media identifier.
    pub id: String,

    /// MIME type recorded at upload time.
    #[serde(alias = "contentType", default)]
    pub content_type: String,

    /// Size of the stored content in bytes.
    #[serde(default)]
    pub bytes: u64,

    /// When the object was created.
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// One row of a listing or search result.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MediaIndex {
    pub id: String,
}

/// Cursor pair for a listing. Both cursors are opaque and must be passed back verbatim.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

/// One page of listing or search results.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaList {
    pub media: Vec<MediaIndex>,
    pub paging: Paging,
}

/// Listing body as returned by both `GET /media` and `POST /media/search`.
#[derive(Deserialize, Debug)]
pub(crate) struct RawList {
    #[serde(default)]
    media: Vec<MediaIndex>,
    #[serde(default)]
    paging: Option<Paging>,
}

impl From<RawList> for MediaList {
    fn from(raw: RawList) -> Self {
        Self {
            media: raw.media,
            paging: raw.paging.unwrap_or_default(),
        }
    }
}

impl MediaList {
    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.media.iter().map(|m| m.id.as_str())
    }
}
