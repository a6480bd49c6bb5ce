//! In-process stand-in for the media storage service.
//!
//! Every request is recorded; responses are replayed from a queue of canned
//! answers (an empty `200 OK` once the queue runs dry).

#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::Response,
};
use media_storage::{ClientConfig, MediaStorage, SessionProvider, StaticTokenProvider};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};
use tokio::net::TcpListener;

pub const TOKEN: &str = "test-token";

#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

#[derive(Clone, Debug)]
pub struct Canned {
    status: StatusCode,
    content_type: &'static str,
    body: Vec<u8>,
}

impl Canned {
    pub fn json(status: StatusCode, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string().into_bytes(),
        }
    }

    pub fn text(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn binary(body: &[u8]) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "image/jpeg",
            body: body.to_vec(),
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: Vec::new(),
        }
    }
}

#[derive(Default)]
struct MockState {
    requests: Vec<Recorded>,
    responses: VecDeque<Canned>,
}

#[derive(Clone, Default)]
pub struct MockService {
    inner: Arc<Mutex<MockState>>,
}

impl MockService {
    pub fn respond(&self, canned: Canned) -> &Self {
        self.inner.lock().unwrap().responses.push_back(canned);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn only_request(&self) -> Recorded {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request: {requests:?}");
        requests.into_iter().next().unwrap()
    }
}

async fn record(
    State(service): State<MockService>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let canned = {
        let mut state = service.inner.lock().unwrap();
        state.requests.push(Recorded {
            method,
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            headers,
            body,
        });
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Canned::empty(StatusCode::OK))
    };

    Response::builder()
        .status(canned.status)
        .header(header::CONTENT_TYPE, canned.content_type)
        .body(Body::from(canned.body))
        .unwrap()
}

pub struct MockServer {
    pub service: MockService,
    pub endpoint: String,
}

impl MockServer {
    pub async fn start() -> Self {
        let service = MockService::default();
        let app = Router::new().fallback(record).with_state(service.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            service,
            endpoint: format!("http://{addr}/v1/media"),
        }
    }

    pub fn client_with(&self, provider: Arc<dyn SessionProvider>) -> MediaStorage {
        let config = ClientConfig {
            endpoint: self.endpoint.clone(),
            ..ClientConfig::default()
        };
        MediaStorage::with_config(provider, &config).unwrap()
    }

    /// Client whose session is already established.
    pub async fn connected_client(&self) -> MediaStorage {
        let storage = self.client_with(Arc::new(StaticTokenProvider::new(TOKEN)));
        storage.connect().await.unwrap();
        storage
    }
}
