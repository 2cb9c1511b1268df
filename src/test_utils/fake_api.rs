//! An in-process stand-in for the remote finance API.
//!
//! Routes answer with canned responses and every request is recorded so tests
//! can check what the client sent.

use std::sync::{Arc, Mutex};

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::api::ApiClient;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
struct CannedResponse {
    method: String,
    path: String,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

#[derive(Debug, Default)]
struct FakeApiState {
    routes: Vec<CannedResponse>,
    requests: Mutex<Vec<RecordedRequest>>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeApiBuilder {
    routes: Vec<CannedResponse>,
}

impl FakeApiBuilder {
    /// Answer `method path` with 200 OK and the JSON `body`.
    pub fn json(self, method: &str, path: &str, body: &str) -> Self {
        self.respond(method, path, 200, "application/json", body)
    }

    /// Answer `method path` with `status` and the plain text `body`.
    pub fn status(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.respond(method, path, status, "text/plain", body)
    }

    pub fn respond(
        mut self,
        method: &str,
        path: &str,
        status: u16,
        content_type: &'static str,
        body: impl AsRef<[u8]>,
    ) -> Self {
        self.routes.push(CannedResponse {
            method: method.to_owned(),
            path: path.to_owned(),
            status,
            content_type,
            body: body.as_ref().to_vec(),
        });
        self
    }

    /// Serve the fake API on an ephemeral local port.
    pub async fn start(self) -> FakeApi {
        let state = Arc::new(FakeApiState {
            routes: self.routes,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .fallback(handle_request)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind fake API listener");
        let address = listener
            .local_addr()
            .expect("Could not get fake API address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Fake API server failed");
        });

        FakeApi {
            base_url: format!("http://{address}"),
            state,
        }
    }
}

pub(crate) struct FakeApi {
    base_url: String,
    state: Arc<FakeApiState>,
}

impl FakeApi {
    pub fn builder() -> FakeApiBuilder {
        FakeApiBuilder::default()
    }

    /// A client pointed at this fake API.
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url, std::time::Duration::from_secs(5))
            .expect("Could not create API client")
    }

    /// The requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .expect("Could not lock recorded requests")
            .clone()
    }
}

async fn handle_request(
    State(state): State<Arc<FakeApiState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    state
        .requests
        .lock()
        .expect("Could not lock recorded requests")
        .push(RecordedRequest {
            method: method.to_string(),
            path: uri.path().to_owned(),
            query: uri.query().map(str::to_owned),
            authorization: headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
            body,
        });

    let canned = state
        .routes
        .iter()
        .find(|route| route.method == method.as_str() && route.path == uri.path());

    match canned {
        Some(route) => (
            StatusCode::from_u16(route.status).expect("Invalid canned status code"),
            [(CONTENT_TYPE, route.content_type)],
            route.body.clone(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "no canned response").into_response(),
    }
}
