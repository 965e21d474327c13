//! In-memory transport with scripted replies, for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::{ApiError, ApiRequest, RawResponse, Transport};

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(u16, Value),
    Raw(u16, &'static str),
    Error(ApiError),
    /// Never answers; only the client timeout ends the request.
    Hang,
    Delayed(Duration, Box<Reply>),
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Reply::Json(200, body)
    }

    pub fn status(status: u16, body: Value) -> Self {
        Reply::Json(status, body)
    }

    pub fn delayed(delay: Duration, reply: Reply) -> Self {
        Reply::Delayed(delay, Box::new(reply))
    }
}

/// Transport that answers from per-path queues.
///
/// One-shot replies queued with [`push`](Self::push) are consumed first; then
/// the sticky reply set with [`always`](Self::always); otherwise 404.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    sticky: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, path: &str, reply: Reply) {
        self.queued
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn always(&self, path: &str, reply: Reply) {
        self.sticky.lock().insert(path.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.path == path).count()
    }

    fn next_reply(&self, path: &str) -> Reply {
        if let Some(reply) = self.queued.lock().get_mut(path).and_then(VecDeque::pop_front) {
            return reply;
        }
        self.sticky
            .lock()
            .get(path)
            .cloned()
            .unwrap_or_else(|| Reply::status(404, json!({"error": "Endpoint not found", "status": 404})))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let mut reply = self.next_reply(&request.path);
        self.requests.lock().push(request);

        loop {
            match reply {
                Reply::Json(status, body) => {
                    return Ok(RawResponse {
                        status,
                        body: body.to_string().into_bytes(),
                    })
                }
                Reply::Raw(status, body) => {
                    return Ok(RawResponse {
                        status,
                        body: body.as_bytes().to_vec(),
                    })
                }
                Reply::Error(err) => return Err(err),
                Reply::Hang => return std::future::pending().await,
                Reply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
            }
        }
    }

    fn describe(&self) -> &str {
        "scripted"
    }
}
