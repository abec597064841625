//! Mock RedFish service for tests
//!
//! Serves canned bodies over plain HTTP on an ephemeral port, enforcing
//! the same Basic-Auth and content type a BMC would see from us.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;

use crate::{
    config::{Config, Credentials},
    endpoint::ApiRoot,
};

pub const USER: &str = "admin";
pub const PASSWORD: &str = "secret";

// base64("admin:secret")
const EXPECTED_AUTHORIZATION: &str = "Basic YWRtaW46c2VjcmV0";

struct MockState {
    routes: HashMap<String, (StatusCode, String)>,
    delay: Duration,
    hits: Mutex<Vec<String>>,
}

pub struct MockRedfish {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockRedfish {
    /// Starts a server answering each `(path, status, body)` route
    pub async fn start(routes: Vec<(&str, u16, &str)>) -> Self {
        Self::start_delayed(routes, Duration::ZERO).await
    }

    /// Like `start`, but every authorized request waits `delay` before answering
    pub async fn start_delayed(routes: Vec<(&str, u16, &str)>, delay: Duration) -> Self {
        let routes = routes
            .into_iter()
            .map(|(path, status, body)| {
                let status = StatusCode::from_u16(status).expect("valid status code");
                (path.to_string(), (status, body.to_string()))
            })
            .collect();

        let state = Arc::new(MockState {
            routes,
            delay,
            hits: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(serve).with_state(Arc::clone(&state));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server");
        });

        Self { addr, state }
    }

    /// Paths requested so far, in arrival order
    pub fn hits(&self) -> Vec<String> {
        self.state.hits.lock().expect("hits lock").clone()
    }

    pub fn config(&self) -> Config {
        Self::config_for(self.addr)
    }

    /// A config pointing at `addr` over plain HTTP with the expected credentials
    pub fn config_for(addr: SocketAddr) -> Config {
        Config {
            root: ApiRoot::new("http", &addr.to_string()).expect("mock root"),
            credentials: Credentials::new(USER, PASSWORD),
            endpoint: "Systems".to_string(),
            tls_skip_verify: false,
            expand_members: false,
            timeout: None,
            concurrency: 4,
            fail_fast: false,
            emit_partial: false,
        }
    }
}

async fn serve(State(state): State<Arc<MockState>>, uri: Uri, headers: HeaderMap) -> Response {
    let path = uri.path().to_string();
    state.hits.lock().expect("hits lock").push(path.clone());

    let authorized = headers
        .get(header::AUTHORIZATION)
        .is_some_and(|value| value == EXPECTED_AUTHORIZATION);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let json = headers
        .get(header::CONTENT_TYPE)
        .is_some_and(|value| value == "application/json");
    if !json {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    match state.routes.get(&path) {
        Some((status, body)) => (*status, body.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
