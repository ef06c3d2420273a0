//! In-memory [`Transport`] with canned replies.
//!
//! Records every request target so callers can assert on exactly what was
//! sent. A route can be gated on a [`Notify`] to hold its response until
//! released, which makes out-of-order completions reproducible.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{ApiError, Reply, Transport};

const STUB_ORIGIN: &str = "http://stub.local";

#[derive(Clone)]
enum Route {
    Reply { status: u16, body: String },
    Fail(String),
}

#[derive(Clone)]
struct Entry {
    route: Route,
    gate: Option<Arc<Notify>>,
}

#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<String, Entry>>,
    requests: Mutex<Vec<String>>,
}

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `target` with `status` and `body`.
    pub fn reply(&self, target: &str, status: u16, body: &str) {
        self.insert(
            target,
            Route::Reply {
                status,
                body: body.to_string(),
            },
            None,
        );
    }

    /// Fail `target` at the transport level.
    pub fn fail(&self, target: &str, message: &str) {
        self.insert(target, Route::Fail(message.to_string()), None);
    }

    /// Answer `target` only after the returned gate is notified.
    pub fn gated_reply(&self, target: &str, status: u16, body: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.insert(
            target,
            Route::Reply {
                status,
                body: body.to_string(),
            },
            Some(gate.clone()),
        );
        gate
    }

    /// Every target requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        locked(&self.requests).clone()
    }

    fn insert(&self, target: &str, route: Route, gate: Option<Arc<Notify>>) {
        locked(&self.routes).insert(target.to_string(), Entry { route, gate });
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, target: &str) -> Result<Reply, ApiError> {
        locked(&self.requests).push(target.to_string());
        let entry = locked(&self.routes).get(target).cloned();
        let url = self.resolve(target)?;

        let Some(entry) = entry else {
            return Ok(Reply {
                url,
                status: 404,
                content_type: None,
                body: "not found".to_string(),
            });
        };
        if let Some(gate) = entry.gate {
            gate.notified().await;
        }
        match entry.route {
            Route::Reply { status, body } => Ok(Reply {
                url,
                status,
                content_type: None,
                body,
            }),
            Route::Fail(message) => Err(ApiError::Transport(message)),
        }
    }

    fn resolve(&self, target: &str) -> Result<String, ApiError> {
        if target.starts_with("http://") || target.starts_with("https://") {
            Ok(target.to_string())
        } else {
            Ok(format!("{STUB_ORIGIN}{target}"))
        }
    }
}
