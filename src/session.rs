use crate::client::ChatClient;
use crate::config::Config;
use crate::models::Turn;
use std::sync::{Arc, Mutex, PoisonError};

/// What the chat core needs from whatever draws the conversation.
pub trait ChatView: Send + Sync {
    fn append_turn(&self, turn: &Turn);

    /// `true` disables submission and shows the cancel affordance.
    fn set_pending(&self, pending: bool);
}

/// The chat widget without its surface: submit and cancel entry points plus
/// the display-only transcript.
pub struct ChatSession {
    client: ChatClient,
    view: Arc<dyn ChatView>,
    transcript: Mutex<Vec<Turn>>,
}

impl ChatSession {
    pub fn new(config: &Config, view: Arc<dyn ChatView>) -> Self {
        Self::with_client(ChatClient::new(config, view.clone()), view)
    }

    pub fn with_client(client: ChatClient, view: Arc<dyn ChatView>) -> Self {
        Self {
            client,
            view,
            transcript: Mutex::new(Vec::new()),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.client.is_busy()
    }

    /// Shows `text` as a user turn, waits for the reply and shows that too.
    /// Blank input and submissions made while a reply is pending are ignored.
    pub async fn on_submit(&self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        // Claim the slot before drawing so a dropped submission leaves no turn.
        let reservation = self.client.reserve()?;
        self.push(Turn::user(text));

        let reply = self.client.send_reserved(reservation, text).await;
        self.push(Turn::assistant(reply.as_str()));
        Some(reply)
    }

    pub fn on_cancel(&self) {
        self.client.cancel();
    }

    pub fn transcript(&self) -> Vec<Turn> {
        self.lock_transcript().clone()
    }

    pub fn clear(&self) {
        self.lock_transcript().clear();
    }

    fn push(&self, turn: Turn) {
        self.view.append_turn(&turn);
        self.lock_transcript().push(turn);
    }

    fn lock_transcript(&self) -> std::sync::MutexGuard<'_, Vec<Turn>> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CANCELLED_REPLY, ERROR_REPLY};
    use crate::models::Role;
    use crate::testing::{FakeTransport, RecordingView, Reply};
    use reqwest::StatusCode;
    use serde_json::json;

    fn session_with(reply: Reply) -> (Arc<ChatSession>, Arc<FakeTransport>, Arc<RecordingView>) {
        let transport = Arc::new(FakeTransport::new(reply));
        let view = Arc::new(RecordingView::default());
        let client = ChatClient::with_transport(transport.clone(), &Config::default(), view.clone());
        let session = ChatSession::with_client(client, view.clone());
        (Arc::new(session), transport, view)
    }

    #[tokio::test]
    async fn test_submit_appends_both_turns() {
        let (session, _, view) =
            session_with(Reply::Json(json!({"choices": [{"message": {"content": "Hi there!"}}]})));

        let reply = session.on_submit("  Hello  ").await;

        assert_eq!(reply.as_deref(), Some("Hi there!"));
        assert_eq!(
            view.turns(),
            vec![Turn::user("Hello"), Turn::assistant("Hi there!")]
        );
        assert_eq!(view.pending_changes(), vec![true, false]);
        assert_eq!(session.transcript(), view.turns());
    }

    #[tokio::test]
    async fn test_blank_submit_ignored() {
        let (session, transport, view) = session_with(Reply::Hang);

        assert_eq!(session.on_submit("   ").await, None);
        assert_eq!(transport.calls(), 0);
        assert!(view.turns().is_empty());
        assert!(view.pending_changes().is_empty());
    }

    #[tokio::test]
    async fn test_failure_shown_as_assistant_turn() {
        let (session, _, view) = session_with(Reply::Status(StatusCode::BAD_GATEWAY));

        session.on_submit("Hello").await;

        let turns = view.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].text, ERROR_REPLY);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_cancel_and_resubmit_while_pending() {
        let (session, transport, view) = session_with(Reply::Hang);

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.on_submit("first").await }
        });
        while !session.is_busy() {
            tokio::task::yield_now().await;
        }

        assert_eq!(session.on_submit("second").await, None);
        assert_eq!(transport.calls(), 1);

        session.on_cancel();
        assert_eq!(pending.await.unwrap().as_deref(), Some(CANCELLED_REPLY));

        assert_eq!(
            view.turns(),
            vec![Turn::user("first"), Turn::assistant(CANCELLED_REPLY)]
        );
        assert_eq!(view.pending_changes(), vec![true, false]);
    }

    /// Draws slowly so concurrent submissions overlap while drawing.
    #[derive(Default)]
    struct SlowView {
        inner: RecordingView,
    }

    impl ChatView for SlowView {
        fn append_turn(&self, turn: &Turn) {
            std::thread::sleep(std::time::Duration::from_millis(50));
            self.inner.append_turn(turn);
        }

        fn set_pending(&self, pending: bool) {
            self.inner.set_pending(pending);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_submit_draws_only_the_winner() {
        let transport = Arc::new(FakeTransport::new(Reply::Hang));
        let view = Arc::new(SlowView::default());
        let client = ChatClient::with_transport(transport.clone(), &Config::default(), view.clone());
        let session = Arc::new(ChatSession::with_client(client, view.clone()));

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.on_submit("first").await }
        });
        let second = tokio::spawn({
            let session = session.clone();
            async move { session.on_submit("second").await }
        });

        while transport.calls() == 0 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(transport.calls(), 1);
        assert_eq!(view.inner.turns().len(), 1);

        session.on_cancel();
        let replies = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(replies.iter().filter(|r| r.is_none()).count(), 1);
        let winner = if replies[0].is_some() { "first" } else { "second" };
        assert_eq!(
            session.transcript(),
            vec![Turn::user(winner), Turn::assistant(CANCELLED_REPLY)]
        );
        assert_eq!(view.inner.turns(), session.transcript());
    }

    #[tokio::test]
    async fn test_only_latest_message_sent() {
        let (session, transport, _) =
            session_with(Reply::Json(json!({"choices": [{"message": {"content": "ok"}}]})));

        session.on_submit("one").await;
        session.on_submit("two").await;

        let request = transport.last_request().unwrap();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].content, "two");
        assert_eq!(session.transcript().len(), 4);

        session.clear();
        assert!(session.transcript().is_empty());
    }
}
