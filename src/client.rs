use crate::config::Config;
use crate::models::{ChatRequest, ChatResponse, Error, Result};
use crate::session::ChatView;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

pub const FALLBACK_REPLY: &str = "Sorry, I didn't understand that.";
pub const CANCELLED_REPLY: &str = "Request was canceled.";
pub const ERROR_REPLY: &str = "An error occurred while trying to get a response from the model.";

/// One chat-completion round trip.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::RequestFailed(status));
        }

        let body = response.bytes().await?;
        debug!(body = %String::from_utf8_lossy(&body), "generated response");

        Ok(serde_json::from_slice(&body)?)
    }
}

/// `Pending` carries the token for the one request allowed in flight.
#[derive(Debug)]
enum RequestState {
    Idle,
    Pending(CancellationToken),
}

pub struct ChatClient {
    transport: Arc<dyn ChatTransport>,
    view: Arc<dyn ChatView>,
    model: String,
    system_prompt: String,
    state: Mutex<RequestState>,
}

impl ChatClient {
    pub fn new(config: &Config, view: Arc<dyn ChatView>) -> Self {
        Self::with_transport(Arc::new(HttpTransport::new(&config.endpoint)), config, view)
    }

    pub fn with_transport(
        transport: Arc<dyn ChatTransport>,
        config: &Config,
        view: Arc<dyn ChatView>,
    ) -> Self {
        Self {
            transport,
            view,
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            state: Mutex::new(RequestState::Idle),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(*self.lock_state(), RequestState::Pending(_))
    }

    /// Sends `user_text` with the system prompt and resolves to the text to
    /// display. Returns `None` without touching the network when another
    /// request is still pending.
    pub async fn send_message(&self, user_text: &str) -> Option<String> {
        let reservation = self.reserve()?;
        Some(self.send_reserved(reservation, user_text).await)
    }

    /// Claims the single request slot. `None` while another request is
    /// pending. Dropping the reservation unused returns the slot.
    pub fn reserve(&self) -> Option<Reservation<'_>> {
        let mut state = self.lock_state();
        if matches!(*state, RequestState::Pending(_)) {
            debug!("request already pending, dropping submission");
            return None;
        }

        let token = CancellationToken::new();
        *state = RequestState::Pending(token.clone());
        Some(Reservation {
            client: self,
            token,
        })
    }

    /// Runs the request for a slot claimed with [`ChatClient::reserve`].
    pub async fn send_reserved(&self, reservation: Reservation<'_>, user_text: &str) -> String {
        self.view.set_pending(true);

        let request = ChatRequest::single_turn(&self.model, &self.system_prompt, user_text);

        let outcome = tokio::select! {
            biased;
            _ = reservation.token.cancelled() => Err(Error::Cancelled),
            result = self.transport.complete(&request) => result,
        };

        let reply = outcome
            .and_then(|response| {
                Ok(response
                    .reply_text()?
                    .map(str::to_owned)
                    .unwrap_or_else(|| FALLBACK_REPLY.to_string()))
            })
            .unwrap_or_else(|err| reply_for(&err).to_string());

        drop(reservation);
        reply
    }

    /// Fires the pending request's token. State is cleared by the request
    /// itself once it settles.
    pub fn cancel(&self) {
        if let RequestState::Pending(token) = &*self.lock_state() {
            debug!("cancelling pending request");
            token.cancel();
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RequestState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The claimed request slot. Returns the client to idle and restores the
/// submit affordance when dropped, whichever way the request ended.
pub struct Reservation<'a> {
    client: &'a ChatClient,
    token: CancellationToken,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        *self.client.lock_state() = RequestState::Idle;
        self.client.view.set_pending(false);
    }
}

/// Display text for a failed request. Details only go to the log.
pub fn reply_for(err: &Error) -> &'static str {
    match err {
        Error::Cancelled => {
            warn!("request was canceled");
            CANCELLED_REPLY
        }
        Error::RequestFailed(status) => {
            warn!(%status, "chat endpoint returned an error status");
            ERROR_REPLY
        }
        other => {
            error!(error = %other, "failed to get a response from the model");
            ERROR_REPLY
        }
    }
}
