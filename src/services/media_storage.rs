//! src/services/media_storage.rs
//!
//! MediaStorage: client for the media storage REST service. Every operation
//! fetches a fresh access token from the session provider, shapes exactly
//! one request (metadata batch-add: one per key), and decodes the response
//! into an entity or a classified `MediaStorageError`. Nothing is cached and
//! nothing is retried.

use crate::{
    config::ClientConfig,
    errors::{MediaStorageError, MediaStorageResult},
    models::{
        content::MediaContent,
        media::{MediaInfo, MediaList, Paging, RawList},
        meta::{MediaMeta, RawMeta, UserMetaKey},
    },
    services::{
        meta_key::{self, to_wire_key},
        request::{ApiRequest, ApiResponse, ParamEncoding, UPLOAD_CHUNK_SIZE, scalar_to_string},
        session::{AccessToken, AuthResult, Scope, SessionProvider},
    },
};
use bytes::Bytes;
use futures::Stream;
use reqwest::{
    Client, Url,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde_json::{Map, Value, json};
use std::{collections::BTreeMap, io, sync::Arc, time::Duration};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

pub const DEFAULT_ENDPOINT: &str = "https://mss.ricohapi.com/v1/media";
pub const SEARCH_VERSION: &str = "2016-07-08";
const CONTENT_PATH: &str = "content";
const META_PATH: &str = "meta";
const SEARCH_PATH: &str = "search";
const USER_FIELD: &str = "user";
const META_FIELDS: [&str; 3] = ["exif", "gpano", USER_FIELD];

/// Parameters of a listing. Setting `filter` turns the listing into a search.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListParams {
    pub limit: Option<u32>,
    /// Opaque cursor from [`Paging::next`].
    pub after: Option<String>,
    /// Opaque cursor from [`Paging::previous`].
    pub before: Option<String>,
    /// Search query; `null` counts as absent.
    pub filter: Option<Value>,
}

/// Transport shape a listing resolves to.
#[derive(Debug, PartialEq)]
pub(crate) enum ListShape {
    Plain(Vec<(&'static str, String)>),
    Search(Value),
}

impl ListParams {
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn with_before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.paging_entries().is_empty() && self.search_filter().is_none()
    }

    /// Params for the page after the one `paging` came from.
    pub fn next_page(&self, paging: &Paging) -> Option<Self> {
        let cursor = paging.next.clone()?;
        Some(Self {
            after: Some(cursor),
            before: None,
            ..self.clone()
        })
    }

    /// Params for the page before the one `paging` came from.
    pub fn previous_page(&self, paging: &Paging) -> Option<Self> {
        let cursor = paging.previous.clone()?;
        Some(Self {
            after: None,
            before: Some(cursor),
            ..self.clone()
        })
    }

    fn search_filter(&self) -> Option<&Value> {
        self.filter.as_ref().filter(|f| !f.is_null())
    }

    fn paging_entries(&self) -> Vec<(&'static str, Value)> {
        let mut entries = Vec::new();
        if let Some(limit) = self.limit {
            entries.push(("limit", Value::from(limit)));
        }
        if let Some(after) = &self.after {
            entries.push(("after", Value::from(after.as_str())));
        }
        if let Some(before) = &self.before {
            entries.push(("before", Value::from(before.as_str())));
        }
        entries
    }

    pub(crate) fn shape(&self) -> ListShape {
        let entries = self.paging_entries();
        match self.search_filter() {
            None => ListShape::Plain(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, scalar_to_string(&value)))
                    .collect(),
            ),
            Some(filter) => {
                let paging: Map<String, Value> = entries
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), value))
                    .collect();
                ListShape::Search(json!({
                    "search_version": SEARCH_VERSION,
                    "query": filter,
                    "paging": paging,
                }))
            }
        }
    }
}

/// Client façade. Cheap to clone; clones share the HTTP connection pool.
#[derive(Clone)]
pub struct MediaStorage {
    session: Arc<dyn SessionProvider>,
    client: Client,
    endpoint: Url,
}

impl MediaStorage {
    /// Client against the default endpoint.
    pub fn new(session: Arc<dyn SessionProvider>) -> MediaStorageResult<Self> {
        Self::with_config(session, &ClientConfig::default())
    }

    pub fn with_config(
        session: Arc<dyn SessionProvider>,
        config: &ClientConfig,
    ) -> MediaStorageResult<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|_| {
            MediaStorageError::invalid_parameter("endpoint", config.endpoint.clone())
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(MediaStorageError::invalid_parameter(
                "endpoint",
                config.endpoint.clone(),
            ));
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            session,
            client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Establish a session for the media storage scope.
    ///
    /// No token is kept here; every later operation asks the provider again.
    pub async fn connect(&self) -> MediaStorageResult<AuthResult> {
        let result = self.session.session(Scope::MediaStorage).await?;
        info!("session established for scope {}", result.scope.as_str());
        Ok(result)
    }

    /// Upload `stream` as the content of a new media object.
    pub async fn upload<S>(&self, stream: S) -> MediaStorageResult<MediaInfo>
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        let token = self.access_token().await?;
        let mut headers = auth_headers(&token)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));

        let response = ApiRequest::new(&self.client, self.endpoint.clone())
            .upload(headers, stream)
            .await?;
        decode_json(response).await
    }

    /// Upload everything `reader` yields, read in fixed-size chunks.
    pub async fn upload_reader<R>(&self, reader: R) -> MediaStorageResult<MediaInfo>
    where
        R: AsyncRead + Send + 'static,
    {
        self.upload(ReaderStream::with_capacity(reader, UPLOAD_CHUNK_SIZE))
            .await
    }

    /// Stream the content of `media_id`. The returned body stays open until dropped.
    pub async fn download(&self, media_id: &str) -> MediaStorageResult<MediaContent> {
        ensure_media_id(media_id)?;
        let token = self.access_token().await?;
        let url = self.media_url(&[media_id, CONTENT_PATH])?;

        let response = ApiRequest::new(&self.client, url)
            .download(auth_headers(&token)?)
            .await?;
        expect_success(response).await?.into_content()
    }

    /// List media, or search when `params` carries a filter.
    pub async fn list(&self, params: Option<&ListParams>) -> MediaStorageResult<MediaList> {
        let shape = params
            .map(ListParams::shape)
            .unwrap_or(ListShape::Plain(Vec::new()));
        let token = self.access_token().await?;
        let headers = auth_headers(&token)?;

        let response = match shape {
            ListShape::Plain(query) => {
                ApiRequest::with_query(&self.client, self.endpoint.clone(), &query)
                    .get(headers)
                    .await?
            }
            ListShape::Search(body) => {
                let url = self.media_url(&[SEARCH_PATH])?;
                ApiRequest::new(&self.client, url)
                    .post(headers, &body, ParamEncoding::Json)
                    .await?
            }
        };
        let raw: RawList = decode_json(response).await?;
        Ok(raw.into())
    }

    pub async fn delete(&self, media_id: &str) -> MediaStorageResult<()> {
        ensure_media_id(media_id)?;
        let token = self.access_token().await?;
        let url = self.media_url(&[media_id])?;

        let response = ApiRequest::new(&self.client, url)
            .delete(auth_headers(&token)?)
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    pub async fn info(&self, media_id: &str) -> MediaStorageResult<MediaInfo> {
        ensure_media_id(media_id)?;
        let token = self.access_token().await?;
        let url = self.media_url(&[media_id])?;

        let response = ApiRequest::new(&self.client, url)
            .get(auth_headers(&token)?)
            .await?;
        decode_json(response).await
    }

    /// Exif and gpano metadata of `media_id`.
    pub async fn meta(&self, media_id: &str) -> MediaStorageResult<MediaMeta> {
        ensure_media_id(media_id)?;
        let token = self.access_token().await?;
        let url = self.media_url(&[media_id, META_PATH])?;

        let response = ApiRequest::new(&self.client, url)
            .get(auth_headers(&token)?)
            .await?;
        let raw: RawMeta = decode_json(response).await?;
        Ok(raw.into())
    }

    /// One metadata block (`exif`, `gpano`, `user`) or a single `user.<key>` value.
    ///
    /// A single user value comes back as `{<key>: <body>}`, body verbatim.
    pub async fn meta_field(
        &self,
        media_id: &str,
        field_name: &str,
    ) -> MediaStorageResult<BTreeMap<String, String>> {
        ensure_media_id(media_id)?;
        if field_name.is_empty() {
            return Err(MediaStorageError::invalid_usage(
                "a metadata field name is required",
            ));
        }

        if META_FIELDS.contains(&field_name) {
            let token = self.access_token().await?;
            let url = self.media_url(&[media_id, META_PATH, field_name])?;
            let response = ApiRequest::new(&self.client, url)
                .get(auth_headers(&token)?)
                .await?;
            return decode_json(response).await;
        }

        let key = to_wire_key(field_name)
            .map_err(|err| MediaStorageError::invalid_parameter("field name", err.0))?;
        let token = self.access_token().await?;
        let url = self.media_url(&[media_id, META_PATH, USER_FIELD, key.wire()])?;
        let response = ApiRequest::new(&self.client, url)
            .get(auth_headers(&token)?)
            .await?;
        let mut response = expect_success(response).await?;
        let value = response.raw_body().await?.to_string();
        Ok(BTreeMap::from([(key.wire().to_string(), value)]))
    }

    /// Attach user metadata, one PUT per entry in iteration order.
    ///
    /// Every entry is validated before the first request. The batch stops at
    /// the first failed request and resolves once, after the last success.
    pub async fn add_meta<I, K, V>(&self, media_id: &str, entries: I) -> MediaStorageResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        ensure_media_id(media_id)?;
        let entries = entries
            .into_iter()
            .map(|(key, value)| validate_entry(key.as_ref(), value.as_ref()))
            .collect::<MediaStorageResult<Vec<_>>>()?;
        if entries.is_empty() {
            return Ok(());
        }

        for (key, value) in entries {
            let token = self.access_token().await?;
            let mut headers = auth_headers(&token)?;
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
            let url = self.media_url(&[media_id, META_PATH, USER_FIELD, key.wire()])?;

            let response = ApiRequest::new(&self.client, url)
                .put(headers, &value)
                .await?;
            expect_success(response).await?;
            debug!("stored user metadata {} on {}", key, media_id);
        }
        Ok(())
    }

    /// Remove one `user.<key>` entry, or every user entry when `key` is `"user"`.
    pub async fn remove_meta(&self, media_id: &str, key: &str) -> MediaStorageResult<()> {
        ensure_media_id(media_id)?;
        if key.is_empty() {
            return Err(MediaStorageError::invalid_parameter("metadata key", key));
        }

        let url = if key == USER_FIELD {
            self.media_url(&[media_id, META_PATH, USER_FIELD])?
        } else {
            let key = to_wire_key(key)?;
            self.media_url(&[media_id, META_PATH, USER_FIELD, key.wire()])?
        };
        let token = self.access_token().await?;

        let response = ApiRequest::new(&self.client, url)
            .delete(auth_headers(&token)?)
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    async fn access_token(&self) -> MediaStorageResult<AccessToken> {
        Ok(self.session.access_token().await?)
    }

    /// `{endpoint}/{segments...}`, each segment percent-encoded.
    fn media_url(&self, segments: &[&str]) -> MediaStorageResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                MediaStorageError::invalid_parameter("endpoint", self.endpoint.to_string())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn ensure_media_id(media_id: &str) -> MediaStorageResult<()> {
    if media_id.is_empty() {
        return Err(MediaStorageError::invalid_parameter("media id", media_id));
    }
    Ok(())
}

fn validate_entry(raw_key: &str, value: &str) -> MediaStorageResult<(UserMetaKey, String)> {
    let key = to_wire_key(raw_key)?;
    if !meta_key::is_valid_value(value) {
        return Err(MediaStorageError::invalid_parameter(
            "metadata value",
            value,
        ));
    }
    Ok((key, value.to_string()))
}

fn auth_headers(token: &AccessToken) -> MediaStorageResult<HeaderMap> {
    let mut value = HeaderValue::from_str(&token.bearer())
        .map_err(|_| MediaStorageError::invalid_usage("access token is not a valid header value"))?;
    value.set_sensitive(true);
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

async fn expect_success(response: ApiResponse) -> MediaStorageResult<ApiResponse> {
    if response.is_succeeded() {
        Ok(response)
    } else {
        warn!("media storage responded with {}", response.status());
        Err(response.into_api_error().await)
    }
}

async fn decode_json<T: serde::de::DeserializeOwned>(
    response: ApiResponse,
) -> MediaStorageResult<T> {
    let mut response = expect_success(response).await?;
    response.json().await
}
