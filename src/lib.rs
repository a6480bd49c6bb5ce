//! Client library for the media storage service.
//!
//! ```no_run
//! use media_storage::{MediaStorage, StaticTokenProvider};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), media_storage::MediaStorageError> {
//! let storage = MediaStorage::new(Arc::new(StaticTokenProvider::new("token")))?;
//! storage.connect().await?;
//! let page = storage.list(None).await?;
//! for id in page.ids() {
//!     println!("{id}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod models;
pub mod services;

pub use config::ClientConfig;
pub use errors::{ErrorKind, MediaStorageError, MediaStorageResult};
pub use models::{
    content::MediaContent,
    media::{MediaIndex, MediaInfo, MediaList, Paging},
    meta::{MediaMeta, UserMetaKey},
};
pub use services::{
    media_storage::{ListParams, MediaStorage},
    session::{AccessToken, AuthResult, Scope, SessionError, SessionProvider, StaticTokenProvider},
};
