//! Request orchestration: the HTTP exchange, metadata key validation, the
//! session seam and the `MediaStorage` façade built from them.

pub mod media_storage;
pub mod meta_key;
pub mod request;
pub mod session;
