use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, warn};

use floatdeck_gateway::{AiChatResponse, AskResponse, Gateway, GatewayError};
use floatdeck_schema::{ChatMessage, Confidence, MessageSource, Role};

use crate::AiControls;

/// Canned questions offered by the chat surface. Selecting one only
/// populates the input buffer; the user still has to send.
pub const QUICK_QUESTIONS: [&str; 7] = [
    "What is the average ocean temperature?",
    "How many ARGO floats are active?",
    "Show me recent observations",
    "What is the salinity data?",
    "Ocean conditions in Bay of Bengal",
    "Show me float positions",
    "What is the pressure at depth?",
];

const GREETING: &str = "Hello! I'm the floatdeck assistant with both database queries \
and advanced AI. Toggle between modes and ask me anything about ocean data!";
const DB_FALLBACK: &str = "I processed your query using the database.";
const AI_FALLBACK: &str = "No response";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Round trip completed; the transcript grew by exactly two entries.
    Sent,
    /// Blank or whitespace-only input; nothing happened.
    EmptyInput,
    /// Another round trip is in flight; nothing happened.
    Busy,
}

struct TranscriptState {
    messages: Vec<ChatMessage>,
    input: String,
    last_id: i64,
}

impl TranscriptState {
    /// Wall-clock message id, forced strictly increasing per transcript.
    fn next_id(&mut self) -> i64 {
        let id = Utc::now().timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id
    }
}

/// Owns the ordered, append-only conversation transcript and routes each
/// question to the deterministic or advanced-AI backend. One round trip
/// at a time; the engine always returns to an interactive state.
pub struct SessionEngine {
    gateway: Arc<dyn Gateway>,
    controls: AiControls,
    state: Mutex<TranscriptState>,
    sending: AtomicBool,
}

impl SessionEngine {
    pub fn new(gateway: Arc<dyn Gateway>, controls: AiControls) -> Self {
        let mut state = TranscriptState {
            messages: Vec::new(),
            input: String::new(),
            last_id: 0,
        };
        let id = state.next_id();
        state
            .messages
            .push(ChatMessage::new(id, Role::Assistant, GREETING, MessageSource::System));

        Self {
            gateway,
            controls,
            state: Mutex::new(state),
            sending: AtomicBool::new(false),
        }
    }

    pub fn controls(&self) -> &AiControls {
        &self.controls
    }

    pub fn input(&self) -> String {
        self.state.lock().expect("session lock").input.clone()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.state.lock().expect("session lock").input = text.into();
    }

    /// Overwrites the buffer entirely, even over typed text. Never sends.
    pub fn apply_quick_question(&self, question: &str) {
        self.set_input(question);
    }

    /// Snapshot of the transcript, oldest first.
    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.state.lock().expect("session lock").messages.clone()
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::SeqCst)
    }

    /// One message round trip: append the user entry, route, append the
    /// assistant or error entry. Blank input and in-flight round trips
    /// are no-ops, not errors.
    pub async fn send(&self) -> SendOutcome {
        let question = {
            let state = self.state.lock().expect("session lock");
            state.input.trim().to_string()
        };
        if question.is_empty() {
            return SendOutcome::EmptyInput;
        }
        if self
            .sending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return SendOutcome::Busy;
        }

        {
            let mut state = self.state.lock().expect("session lock");
            let id = state.next_id();
            state.messages.push(ChatMessage::new(
                id,
                Role::User,
                question.clone(),
                MessageSource::System,
            ));
            state.input.clear();
        }

        // Route decision is re-evaluated fresh for every message.
        let mut reply = if self.controls.route_advanced() {
            debug!("routing question to advanced ai");
            match self.gateway.ai_chat(&question).await {
                Ok(resp) => ai_reply(resp),
                Err(err) => error_reply(err),
            }
        } else {
            debug!("routing question to database query");
            match self.gateway.ask(&question).await {
                Ok(resp) => db_reply(resp),
                Err(err) => error_reply(err),
            }
        };

        {
            let mut state = self.state.lock().expect("session lock");
            reply.id = state.next_id();
            state.messages.push(reply);
        }
        self.sending.store(false, Ordering::SeqCst);
        SendOutcome::Sent
    }
}

fn ai_reply(resp: AiChatResponse) -> ChatMessage {
    let text = resp
        .ai_answer
        .or(resp.error)
        .unwrap_or_else(|| AI_FALLBACK.to_string());
    let mut msg = ChatMessage::new(0, Role::Assistant, text, MessageSource::AdvancedAi);
    msg.model = resp.model_type;
    msg.confidence = resp.confidence.as_deref().and_then(Confidence::parse);
    msg.success = resp.success;
    msg
}

fn db_reply(resp: AskResponse) -> ChatMessage {
    let text = resp
        .natural_language_response
        .unwrap_or_else(|| DB_FALLBACK.to_string());
    let mut msg = ChatMessage::new(0, Role::Assistant, text, MessageSource::Database);
    msg.sql = resp.sql;
    msg.record_count = resp.row_count;
    msg.success = resp.success;
    msg
}

fn error_reply(err: GatewayError) -> ChatMessage {
    warn!(%err, "chat round trip failed");
    ChatMessage::new(
        0,
        Role::Assistant,
        format!("Sorry, I encountered an error: {err}. Please make sure the API server is running."),
        MessageSource::Error,
    )
}
