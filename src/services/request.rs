//! A single HTTP exchange with the media storage service.
//!
//! `ApiRequest` shapes the request (method, URL with optional query string,
//! headers, body encoding) and sends it. The resulting `ApiResponse` reports
//! the status and reads the body lazily, at most once. A non-2xx status is
//! not an error at this layer; only transport failures are.

use crate::{
    errors::{MediaStorageError, MediaStorageResult},
    models::content::MediaContent,
};
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::{
    Body, Client, Method, RequestBuilder, Response, StatusCode, Url,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io;
use tracing::debug;

/// Read size used when streaming an upload body from a reader.
pub const UPLOAD_CHUNK_SIZE: usize = 1024;

/// How `post` encodes its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamEncoding {
    /// `key=value` pairs joined with `&`.
    UrlEncoded,
    /// The parameter object serialized as JSON, with `Content-Type: application/json`.
    Json,
}

pub struct ApiRequest {
    client: Client,
    url: Url,
}

impl ApiRequest {
    pub fn new(client: &Client, url: Url) -> Self {
        Self {
            client: client.clone(),
            url,
        }
    }

    /// Target `url` with `params` appended as a URL-encoded query string.
    pub fn with_query<K, V>(client: &Client, mut url: Url, params: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key.as_ref(), value.as_ref());
            }
        }
        Self::new(client, url)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn get(self, headers: HeaderMap) -> MediaStorageResult<ApiResponse> {
        let builder = self.builder(Method::GET, headers);
        send(builder).await
    }

    /// GET whose body is meant to be streamed with [`ApiResponse::into_content`].
    pub async fn download(self, headers: HeaderMap) -> MediaStorageResult<ApiResponse> {
        let builder = self.builder(Method::GET, headers);
        send(builder).await
    }

    pub async fn post(
        self,
        mut headers: HeaderMap,
        params: &Value,
        encoding: ParamEncoding,
    ) -> MediaStorageResult<ApiResponse> {
        let builder = match encoding {
            ParamEncoding::UrlEncoded => {
                let pairs = form_pairs(params);
                self.builder(Method::POST, headers).form(&pairs)
            }
            ParamEncoding::Json => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                self.builder(Method::POST, headers).json(params)
            }
        };
        send(builder).await
    }

    /// PUT with `value` as the UTF-8 body, untouched.
    pub async fn put(self, headers: HeaderMap, value: &str) -> MediaStorageResult<ApiResponse> {
        let builder = self
            .builder(Method::PUT, headers)
            .body(value.to_owned());
        send(builder).await
    }

    /// POST streaming `stream` as the request body, chunk by chunk.
    pub async fn upload<S>(self, headers: HeaderMap, stream: S) -> MediaStorageResult<ApiResponse>
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        let builder = self
            .builder(Method::POST, headers)
            .body(Body::wrap_stream(stream));
        send(builder).await
    }

    pub async fn delete(self, headers: HeaderMap) -> MediaStorageResult<ApiResponse> {
        let builder = self.builder(Method::DELETE, headers);
        send(builder).await
    }

    fn builder(self, method: Method, headers: HeaderMap) -> RequestBuilder {
        debug!("{} {}", method, self.url);
        self.client.request(method, self.url).headers(headers)
    }
}

async fn send(builder: RequestBuilder) -> MediaStorageResult<ApiResponse> {
    let response = builder.send().await?;
    Ok(ApiResponse::new(response))
}

/// Flatten a JSON object into form pairs. Strings are used as-is, other
/// scalars through their JSON text.
fn form_pairs(params: &Value) -> Vec<(String, String)> {
    match params {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| (key.clone(), scalar_to_string(value)))
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// True for statuses in `[200, 300)`.
pub fn is_success_status(code: u16) -> bool {
    (200..300).contains(&code)
}

/// Drop line breaks, i.e. concatenate all lines of `body`.
fn join_lines(body: &str) -> String {
    body.chars().filter(|c| !matches!(c, '\n' | '\r')).collect()
}

/// Response of one exchange. The body is read on first access and cached.
pub struct ApiResponse {
    status: StatusCode,
    response: Option<Response>,
    body: Option<String>,
}

impl ApiResponse {
    fn new(response: Response) -> Self {
        Self {
            status: response.status(),
            response: Some(response),
            body: None,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        is_success_status(self.status.as_u16())
    }

    pub fn response_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Body text with line breaks preserved.
    pub async fn raw_body(&mut self) -> MediaStorageResult<&str> {
        if self.body.is_none() {
            let text = match self.response.take() {
                Some(response) => response.text().await?,
                None => {
                    return Err(MediaStorageError::invalid_usage(
                        "response body was already handed out as a stream",
                    ));
                }
            };
            self.body = Some(text);
        }
        Ok(self.body.as_deref().unwrap_or_default())
    }

    /// Body of a successful response, lines concatenated.
    pub async fn response_body(&mut self) -> MediaStorageResult<String> {
        Ok(join_lines(self.raw_body().await?))
    }

    /// Body of a failed response, lines concatenated.
    pub async fn error_body(&mut self) -> MediaStorageResult<String> {
        Ok(join_lines(self.raw_body().await?))
    }

    pub async fn json<T: DeserializeOwned>(&mut self) -> MediaStorageResult<T> {
        let body = self.response_body().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Turn a non-2xx response into [`MediaStorageError::Api`].
    ///
    /// The status is kept even when the error body cannot be read; the body is then empty.
    pub async fn into_api_error(mut self) -> MediaStorageError {
        let body = match self.error_body().await {
            Ok(body) => body,
            Err(err) => {
                debug!("could not read error body for {}: {}", self.status, err);
                String::new()
            }
        };
        MediaStorageError::Api {
            status: self.status,
            body,
        }
    }

    /// Hand the unread body to the caller as a live stream.
    pub fn into_content(mut self) -> MediaStorageResult<MediaContent> {
        let response = self.response.take().ok_or_else(|| {
            MediaStorageError::invalid_usage("response body was already read")
        })?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length();
        let stream = response.bytes_stream().map_err(io::Error::other);
        Ok(MediaContent::new(content_type, content_length, stream))
    }
}
