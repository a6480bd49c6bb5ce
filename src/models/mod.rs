//! Data records exchanged with the media storage service.
//!
//! These are plain values: they deserialize from the service's JSON via
//! `serde` and carry no behavior beyond small conveniences.

pub mod content;
pub mod media;
pub mod meta;
