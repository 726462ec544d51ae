//! In-memory doubles shared by the unit tests.

use crate::client::ChatTransport;
use crate::models::{ChatRequest, ChatResponse, Error, Result, Turn};
use crate::session::ChatView;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub enum Reply {
    Json(serde_json::Value),
    Status(StatusCode),
    Hang,
}

pub struct FakeTransport {
    reply: Reply,
    calls: AtomicUsize,
    last_request: Mutex<Option<ChatRequest>>,
}

impl FakeTransport {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        match &self.reply {
            Reply::Json(body) => Ok(serde_json::from_value(body.clone())?),
            Reply::Status(status) => Err(Error::RequestFailed(*status)),
            Reply::Hang => std::future::pending().await,
        }
    }
}

#[derive(Default)]
pub struct RecordingView {
    turns: Mutex<Vec<Turn>>,
    pending: Mutex<Vec<bool>>,
}

impl RecordingView {
    pub fn turns(&self) -> Vec<Turn> {
        self.turns.lock().unwrap().clone()
    }

    pub fn pending_changes(&self) -> Vec<bool> {
        self.pending.lock().unwrap().clone()
    }
}

impl ChatView for RecordingView {
    fn append_turn(&self, turn: &Turn) {
        self.turns.lock().unwrap().push(turn.clone());
    }

    fn set_pending(&self, pending: bool) {
        self.pending.lock().unwrap().push(pending);
    }
}
