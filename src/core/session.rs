//! Chat session: the controller that front ends drive.
//!
//! Records the user turn, asks the completion client for a reply, and records
//! whatever comes back as the assistant turn. Submissions are refused while
//! the session is paused. `submit` takes `&mut self`, so a second submission
//! cannot start while one is pending.

use tracing::debug;

use crate::core::cancel::CancelSlot;
use crate::core::completion::CompletionClient;
use crate::core::transcript::Transcript;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Blank,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Replied(String),
    Rejected(RejectReason),
}

pub struct ChatSession {
    client: CompletionClient,
    transcript: Transcript,
    cancel: CancelSlot,
    paused: bool,
}

impl ChatSession {
    pub fn new(client: CompletionClient) -> Self {
        Self {
            client,
            transcript: Transcript::new(),
            cancel: CancelSlot::new(),
            paused: false,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Handle for cancelling the pending reply from outside the session.
    pub fn cancel_handle(&self) -> CancelSlot {
        self.cancel.clone()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        if self.paused {
            return SubmitOutcome::Rejected(RejectReason::Paused);
        }
        let Some(with_user) = self.transcript.append_user(text) else {
            return SubmitOutcome::Rejected(RejectReason::Blank);
        };

        self.transcript = with_user;
        debug!(turns = self.transcript.len(), "submitting transcript");

        let reply = self.client.complete(&self.transcript, &self.cancel).await;

        self.transcript = self.transcript.append_assistant(reply.clone());
        SubmitOutcome::Replied(reply)
    }

    /// Cancel the pending reply, if any, and refuse new input until resumed.
    pub fn pause(&mut self) {
        self.cancel.cancel();
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::completion::{CANCELLED_REPLY, FAILURE_REPLY};
    use crate::core::message::{Message, Role};
    use crate::utils::test_utils::{MockResponse, MockServer};
    use std::time::Duration;

    #[tokio::test]
    async fn submit_records_user_and_assistant_turns() {
        let server = MockServer::start(vec![MockResponse::reply("Hi!")]).await;
        let mut session = ChatSession::new(server.client());
        let before = session.transcript().clone();

        let outcome = session.submit("Hello").await;

        assert_eq!(outcome, SubmitOutcome::Replied("Hi!".into()));
        assert!(before.is_empty());
        assert_eq!(
            session.transcript().messages(),
            &[Message::user("Hello"), Message::assistant("Hi!")]
        );
    }

    #[tokio::test]
    async fn blank_input_is_rejected_without_a_request() {
        let server = MockServer::start(vec![MockResponse::reply("unused")]).await;
        let mut session = ChatSession::new(server.client());

        assert_eq!(
            session.submit("   ").await,
            SubmitOutcome::Rejected(RejectReason::Blank)
        );
        assert!(session.transcript().is_empty());
        assert!(server.requests().await.is_empty());
    }

    #[tokio::test]
    async fn failures_are_recorded_as_assistant_text() {
        let server = MockServer::start(vec![MockResponse::new(500, "oops")]).await;
        let mut session = ChatSession::new(server.client());

        session.submit("Hello").await;

        let last = session.transcript().last().expect("assistant turn");
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, FAILURE_REPLY);
    }

    #[tokio::test]
    async fn paused_session_refuses_input_until_resumed() {
        let server = MockServer::start(vec![MockResponse::reply("back")]).await;
        let mut session = ChatSession::new(server.client());

        session.pause();
        assert!(session.is_paused());
        assert_eq!(
            session.submit("Hello").await,
            SubmitOutcome::Rejected(RejectReason::Paused)
        );

        session.resume();
        assert_eq!(
            session.submit("Hello").await,
            SubmitOutcome::Replied("back".into())
        );
        assert_eq!(session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn cancel_handle_interrupts_a_pending_submit() {
        let server = MockServer::stalled().await;
        let mut session = ChatSession::new(server.client());
        let cancel = session.cancel_handle();

        let outcome = tokio::join!(session.submit("Hello"), async {
            server.wait_for_request().await;
            cancel.cancel()
        });

        assert_eq!(outcome.0, SubmitOutcome::Replied(CANCELLED_REPLY.into()));
        assert!(outcome.1);
        assert_eq!(
            session.transcript().last(),
            Some(&Message::assistant(CANCELLED_REPLY))
        );
    }

    #[tokio::test]
    async fn abandoned_submit_does_not_block_the_next_one() {
        let server =
            MockServer::start(vec![MockResponse::stall(), MockResponse::reply("again")]).await;
        let mut session = ChatSession::new(server.client());

        let abandoned =
            tokio::time::timeout(Duration::from_millis(200), session.submit("hi")).await;
        assert!(abandoned.is_err());
        assert!(!session.cancel_handle().is_armed());
        assert_eq!(session.transcript().messages(), &[Message::user("hi")]);

        let outcome = tokio::time::timeout(Duration::from_secs(5), session.submit("hello?"))
            .await
            .expect("second submit should settle");
        assert_eq!(outcome, SubmitOutcome::Replied("again".into()));
        assert_eq!(
            session.transcript().messages(),
            &[
                Message::user("hi"),
                Message::user("hello?"),
                Message::assistant("again"),
            ]
        );
        assert!(!session.cancel_handle().is_armed());
        assert_eq!(server.requests().await.len(), 2);
    }
}
