//! Represents downloaded media content as a live byte stream.

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt, stream::BoxStream};
use std::{fmt, io};
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

/// Streamed payload of a media object.
///
/// The stream is bound to the open HTTP response. Nothing is buffered; the
/// caller drains it and dropping the value releases the connection.
pub struct MediaContent {
    content_type: Option<String>,
    content_length: Option<u64>,
    stream: BoxStream<'static, io::Result<Bytes>>,
}

impl MediaContent {
    pub fn new<S>(content_type: Option<String>, content_length: Option<u64>, stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            content_type,
            content_length,
            stream: stream.boxed(),
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Length announced by the service, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn into_stream(self) -> BoxStream<'static, io::Result<Bytes>> {
        self.stream
    }

    /// Adapt the body into an [`AsyncRead`], e.g. for `tokio::io::copy`.
    pub fn into_async_read(self) -> impl AsyncRead + Send + Unpin {
        StreamReader::new(self.stream)
    }

    /// Collect the whole body in memory.
    pub async fn bytes(mut self) -> io::Result<Bytes> {
        let capacity = self.content_length.unwrap_or(0).min(16 * 1024 * 1024) as usize;
        let mut buf = BytesMut::with_capacity(capacity);
        while let Some(chunk) = self.stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

impl fmt::Debug for MediaContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaContent")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}
