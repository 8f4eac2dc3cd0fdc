//! Chat session controller
//!
//! Turns typed input into a request/response cycle while keeping the
//! transcript and the typing markers consistent. A send is split in two so a
//! front end can run the request on a background task:
//!
//! 1. [`ChatSession::submit`] appends the user message, clears the input and
//!    hands back a [`PendingReply`] token.
//! 2. [`ChatSession::settle`] consumes that token together with the outcome,
//!    drops its marker and appends the reply.
//!
//! Because `settle` takes the token by value, each marker is removed exactly
//! once, whichever way the request ends.

use tracing::{debug, warn};

use crate::api::ChatBackend;
use crate::deeplink::CannedQuestion;
use crate::error::ApiError;
use crate::state::{InputLine, Message, Transcript};

/// Shown in place of an answer whenever a reply could not be obtained
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyTicket(u64);

/// A reply that is in flight. Hand it back to [`ChatSession::settle`].
#[must_use = "an unsettled reply leaves its typing marker up"]
#[derive(Debug)]
pub struct PendingReply {
    ticket: ReplyTicket,
    message: String,
}

impl PendingReply {
    pub fn ticket(&self) -> ReplyTicket {
        self.ticket
    }

    /// The text that was sent
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Transcript,
    input: InputLine,
    pending: Vec<ReplyTicket>,
    next_ticket: u64,
    revision: u64,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn input(&self) -> &InputLine {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputLine {
        &mut self.input
    }

    pub fn is_awaiting_reply(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Bumped on every transcript append
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Send whatever is in the input field.
    ///
    /// Input that trims to nothing is dropped without touching the transcript.
    pub fn submit(&mut self) -> Option<PendingReply> {
        let text = self.input.text().trim().to_string();
        if text.is_empty() {
            return None;
        }

        self.append(Message::user(text.clone()));
        self.input.clear();

        let ticket = ReplyTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending.push(ticket);
        debug!(ticket = ticket.0, "reply pending");

        Some(PendingReply {
            ticket,
            message: text,
        })
    }

    /// Finish a send: remove its marker, then append the reply.
    ///
    /// Reported and transport failures produce the same fallback text; the
    /// difference only reaches the log.
    pub fn settle(&mut self, reply: PendingReply, outcome: Result<String, ApiError>) -> &Message {
        if let Some(pos) = self.pending.iter().position(|t| *t == reply.ticket) {
            self.pending.remove(pos);
        }

        let text = match outcome {
            Ok(answer) => answer,
            Err(err) if err.is_reported() => {
                warn!(ticket = reply.ticket.0, error = %err, "chat backend reported a failure");
                FALLBACK_REPLY.to_string()
            }
            Err(err) => {
                warn!(ticket = reply.ticket.0, error = %err, "chat request failed");
                FALLBACK_REPLY.to_string()
            }
        };

        self.append(Message::ai(text))
    }

    /// Submit, wait for the backend and settle in one go
    pub async fn exchange<B>(&mut self, backend: &B) -> Option<&Message>
    where
        B: ChatBackend + ?Sized,
    {
        let reply = self.submit()?;
        let (reply, outcome) = resolve(backend, reply).await;
        Some(self.settle(reply, outcome))
    }

    /// Put a canned question in the input without sending it
    pub fn prefill(&mut self, question: CannedQuestion) {
        self.input.set(question.question());
    }

    /// Pre-fill and send once if the link names a known topic
    pub fn open_deep_link(&mut self, link: &str) -> Option<PendingReply> {
        let question = CannedQuestion::from_link(link)?;
        debug!(topic = question.as_param(), "opening deep link");
        self.prefill(question);
        self.submit()
    }

    fn append(&mut self, message: Message) -> &Message {
        self.revision += 1;
        self.transcript.append(message)
    }
}

/// Issue the request for a pending reply and pair it with the outcome
pub async fn resolve<B>(backend: &B, reply: PendingReply) -> (PendingReply, Result<String, ApiError>)
where
    B: ChatBackend + ?Sized,
{
    let outcome = backend.send_message(&reply.message).await;
    (reply, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Sender;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned outcomes and records what was sent
    #[derive(Default)]
    struct ScriptedBackend {
        outcomes: Mutex<VecDeque<Result<String, ApiError>>>,
        sent: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn with(outcomes: Vec<Result<String, ApiError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send_message(&self, message: &str) -> Result<String, ApiError> {
            self.sent.lock().unwrap().push(message.to_string());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(format!("echo: {message}")))
        }
    }

    fn texts(session: &ChatSession) -> Vec<(Sender, String)> {
        session
            .transcript()
            .iter()
            .map(|m| (m.sender, m.text.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let backend = ScriptedBackend::default();
        let mut session = ChatSession::new();

        for blank in ["", "   ", "\t\n "] {
            session.input_mut().set(blank);
            assert!(session.exchange(&backend).await.is_none());
        }

        assert!(session.transcript().is_empty());
        assert!(backend.sent().is_empty());
        assert!(!session.is_awaiting_reply());
        assert_eq!(session.revision(), 0);
    }

    #[test]
    fn test_submit_appends_trimmed_text_and_clears_input() {
        let mut session = ChatSession::new();
        session.input_mut().set("  When do admissions open?  ");

        let reply = session.submit().unwrap();

        assert_eq!(reply.message(), "When do admissions open?");
        assert!(session.input().is_empty());
        assert_eq!(
            texts(&session),
            vec![(Sender::User, "When do admissions open?".to_string())]
        );
        assert_eq!(session.pending_count(), 1);

        session.settle(reply, Ok("In May.".to_string()));
    }

    #[test]
    fn test_marker_cleared_before_reply_is_visible() {
        let mut session = ChatSession::new();
        session.input_mut().set("hello");

        let reply = session.submit().unwrap();
        assert!(session.is_awaiting_reply());

        let rendered = session.settle(reply, Ok("Hi there".to_string())).clone();
        assert_eq!(rendered, Message::ai("Hi there"));
        assert!(!session.is_awaiting_reply());
        assert_eq!(session.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_sequential_sends_interleave() {
        let backend = ScriptedBackend::default();
        let mut session = ChatSession::new();

        for question in ["one", "two", "three"] {
            session.input_mut().set(question);
            session.exchange(&backend).await.unwrap();
            assert!(!session.is_awaiting_reply());
        }

        assert_eq!(
            texts(&session),
            vec![
                (Sender::User, "one".to_string()),
                (Sender::Ai, "echo: one".to_string()),
                (Sender::User, "two".to_string()),
                (Sender::Ai, "echo: two".to_string()),
                (Sender::User, "three".to_string()),
                (Sender::Ai, "echo: three".to_string()),
            ]
        );
        assert_eq!(backend.sent(), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_reported_and_transport_failures_share_fallback() {
        let backend = ScriptedBackend::with(vec![
            Err(ApiError::Rejected(Some("Not logged in".to_string()))),
            Err(ApiError::Http(StatusCode::INTERNAL_SERVER_ERROR)),
        ]);
        let mut session = ChatSession::new();

        session.input_mut().set("fees?");
        let first = session.exchange(&backend).await.unwrap().clone();
        session.input_mut().set("fees?");
        let second = session.exchange(&backend).await.unwrap().clone();

        assert_eq!(first, Message::ai(FALLBACK_REPLY));
        assert_eq!(first, second);
        assert!(!session.is_awaiting_reply());
    }

    #[test]
    fn test_overlapping_sends_clear_their_own_markers() {
        let mut session = ChatSession::new();

        session.input_mut().set("first");
        let first = session.submit().unwrap();
        session.input_mut().set("second");
        let second = session.submit().unwrap();
        assert_eq!(session.pending_count(), 2);

        session.settle(second, Ok("answer two".to_string()));
        assert!(session.is_awaiting_reply());

        session.settle(first, Ok("answer one".to_string()));
        assert!(!session.is_awaiting_reply());
        assert_eq!(session.transcript().len(), 4);
    }

    #[test]
    fn test_revision_tracks_appends() {
        let mut session = ChatSession::new();
        session.input_mut().set("hi");
        let reply = session.submit().unwrap();
        assert_eq!(session.revision(), 1);
        session.settle(reply, Ok("hello".to_string()));
        assert_eq!(session.revision(), 2);
    }

    #[tokio::test]
    async fn test_deep_link_submits_canned_question_once() {
        let backend = ScriptedBackend::default();
        let mut session = ChatSession::new();

        let reply = session.open_deep_link("/chat?question=fees").unwrap();
        assert_eq!(reply.message(), "What is the fee structure?");
        let (reply, outcome) = resolve(&backend, reply).await;
        session.settle(reply, outcome);

        assert_eq!(backend.sent(), vec!["What is the fee structure?"]);
        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn test_unknown_deep_link_does_nothing() {
        let mut session = ChatSession::new();

        assert!(session.open_deep_link("?question=parking").is_none());
        assert!(session.input().is_empty());
        assert!(session.transcript().is_empty());
    }
}
