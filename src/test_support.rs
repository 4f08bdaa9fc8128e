//! Scripted transport and fixtures shared by client, session and API tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::config::SessionConfig;
use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest, ApiResponse, Transport};
use crate::navigation::History;
use crate::store::{MemoryStore, TokenStore};
use crate::types::Credentials;

/// One request as the transport saw it.
#[derive(Clone, Debug)]
pub struct SentRequest {
    pub method: String,
    pub url: String,
    pub path: String,
    pub bearer: Option<String>,
    pub request: ApiRequest,
}

/// Transport answering from per-route queues keyed by `"METHOD /path"`.
///
/// Unscripted routes fail with a transport error so a test never silently
/// hits an endpoint it did not plan for.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<HashMap<String, VecDeque<Result<ApiResponse, ApiError>>>>,
    sent: Mutex<Vec<SentRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, route: &str, status: u16, body: Value) {
        let body = if body.is_null() { Vec::new() } else { body.to_string().into_bytes() };
        self.push(route, Ok(ApiResponse::new(status, body)));
    }

    pub fn fail(&self, route: &str, error: ApiError) {
        self.push(route, Err(error));
    }

    fn push(&self, route: &str, outcome: Result<ApiResponse, ApiError>) {
        self.script
            .lock()
            .unwrap()
            .entry(route.to_owned())
            .or_default()
            .push_back(outcome);
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, route: &str) -> usize {
        self.sent()
            .iter()
            .filter(|sent| format!("{} {}", sent.method, sent.path) == route)
            .count()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, url: &str, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let route = format!("{} {}", request.method, request.path);
        self.sent.lock().unwrap().push(SentRequest {
            method: request.method.to_string(),
            url: url.to_owned(),
            path: request.path.clone(),
            bearer: request.bearer.clone(),
            request: request.clone(),
        });
        self.script
            .lock()
            .unwrap()
            .get_mut(&route)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(ApiError::Transport(format!("unscripted route {route}"))))
    }
}

/// Everything a client or session test needs, wired together.
pub struct Harness {
    pub config: SessionConfig,
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<MemoryStore>,
    pub tokens: TokenStore,
    pub history: Arc<History>,
    pub client: ApiClient,
}

impl Harness {
    pub fn at(path: &str) -> Self {
        let config = SessionConfig::default();
        let transport = ScriptedTransport::new();
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenStore::new(store.clone(), store.clone(), config.cookie_ttl_days);
        let history = Arc::new(History::new(path));
        let client = ApiClient::new(&config, transport.clone(), tokens.clone(), history.clone());
        Self { config, transport, store, tokens, history, client }
    }

    pub fn with_tokens(self, access: &str, refresh: Option<&str>) -> Self {
        self.tokens
            .store_credentials(&Credentials {
                access_token: access.to_owned(),
                refresh_token: refresh.unwrap_or_default().to_owned(),
            })
            .unwrap();
        self
    }
}

pub fn user_json(id: &str, role: &str) -> Value {
    serde_json::json!({ "id": id, "email": "a@b.com", "role": role, "tier": "FREE" })
}
