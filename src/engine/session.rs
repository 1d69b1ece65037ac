//! Per-user session state and the session repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::llm::{ChatMessage, Role};

/// Number of seeded records (system instruction + answer snapshot) kept at
/// the head of the assistant history once seeding has happened.
const SEED_MESSAGES: usize = 2;

/// Where a user's flow currently stands.
///
/// `None` at the session level means no active flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    /// The question with this key is outstanding.
    Asking { key: String },
    /// The script's terminal key was reached; the report has been rendered.
    Terminal,
}

impl FlowState {
    /// The outstanding question key, if one exists.
    pub fn asking_key(&self) -> Option<&str> {
        match self {
            Self::Asking { key } => Some(key),
            Self::Terminal => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asking { key } => write!(f, "asking({key})"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

/// One user's conversation record.
///
/// Replaces the per-concern global maps with a single session: flow state,
/// collected answers, the pending-digression flag, and the assistant
/// history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    /// Current flow position; `None` = no active flow.
    pub flow: Option<FlowState>,
    /// Insertion-ordered answers for the current flow.
    answers: Vec<(String, String)>,
    /// True while the user has diverted into assistant mode with a question
    /// outstanding.
    pub pending_question: bool,
    /// Assistant dialogue history, seeded once per user.
    history: Vec<ChatMessage>,
    /// Whether the history head holds the seeded system/context pair.
    seeded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSession {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            flow: None,
            answers: Vec::new(),
            pending_question: false,
            history: Vec::new(),
            seeded: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Open a fresh flow: new answer set, pending flag cleared. The
    /// assistant history survives restarts.
    pub fn reset_flow(&mut self) {
        self.flow = None;
        self.answers.clear();
        self.pending_question = false;
        self.touch();
    }

    /// Discard the flow position and pending flag, keeping answers and
    /// history. Used when recovering from a flow integrity error.
    pub fn abandon_flow(&mut self) {
        self.flow = None;
        self.pending_question = false;
        self.touch();
    }

    /// Record an answer under `key`. Re-answering the same question (after
    /// a failed advance) overwrites the previous text.
    pub fn record_answer(&mut self, key: &str, text: &str) {
        match self.answers.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = text.to_string(),
            None => self.answers.push((key.to_string(), text.to_string())),
        }
        self.touch();
    }

    /// The recorded answer for `key`, if any.
    pub fn answer(&self, key: &str) -> Option<&str> {
        self.answers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All recorded answers in insertion order.
    pub fn answers(&self) -> &[(String, String)] {
        &self.answers
    }

    /// Whether the assistant history has been seeded.
    pub fn history_seeded(&self) -> bool {
        self.seeded
    }

    /// Seed the history head with the system instruction and context
    /// snapshot. Only the first call has any effect.
    pub fn seed_history(&mut self, instruction: ChatMessage, context: ChatMessage) {
        if self.seeded {
            return;
        }
        debug_assert!(instruction.role == Role::System && context.role == Role::System);
        self.history.insert(0, context);
        self.history.insert(0, instruction);
        self.seeded = true;
        self.touch();
    }

    /// Append a message, trimming the oldest non-seed records past `max`.
    pub fn push_history(&mut self, message: ChatMessage, max: usize) {
        self.history.push(message);

        let floor = if self.seeded { SEED_MESSAGES } else { 0 };
        while self.history.len() > max.max(floor + 1) && self.history.len() > floor {
            self.history.remove(floor.min(self.history.len() - 1));
        }
        self.touch();
    }

    /// The full ordered history.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for UserSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Repository of sessions keyed by user identity.
///
/// The engine loads a session, mutates it, and writes it back; a persistent
/// backend can be slotted in without touching engine logic.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user: &str) -> Option<UserSession>;
    async fn put(&self, user: &str, session: UserSession);
    async fn remove(&self, user: &str);
}

/// In-process session store.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, UserSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, user: &str) -> Option<UserSession> {
        self.sessions.read().await.get(user).cloned()
    }

    async fn put(&self, user: &str, session: UserSession) {
        self.sessions
            .write()
            .await
            .insert(user.to_string(), session);
    }

    async fn remove(&self, user: &str) {
        self.sessions.write().await.remove(user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_answer_overwrites_same_key() {
        let mut session = UserSession::new();
        session.record_answer("edad", "34");
        session.record_answer("edad", "35");
        assert_eq!(session.answer("edad"), Some("35"));
        assert_eq!(session.answers().len(), 1);
    }

    #[test]
    fn answers_keep_insertion_order() {
        let mut session = UserSession::new();
        session.record_answer("dni", "12345678");
        session.record_answer("edad", "34");
        let keys: Vec<&str> = session.answers().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["dni", "edad"]);
    }

    #[test]
    fn reset_flow_clears_answers_and_flag() {
        let mut session = UserSession::new();
        session.flow = Some(FlowState::Asking { key: "edad".into() });
        session.pending_question = true;
        session.record_answer("dni", "12345678");
        session.push_history(ChatMessage::user("hola"), 10);

        session.reset_flow();
        assert!(session.flow.is_none());
        assert!(!session.pending_question);
        assert!(session.answers().is_empty());
        // History survives a restart.
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn seed_history_is_idempotent() {
        let mut session = UserSession::new();
        session.push_history(ChatMessage::user("first question"), 10);
        session.seed_history(
            ChatMessage::system("instruction"),
            ChatMessage::system("context"),
        );
        session.seed_history(
            ChatMessage::system("other"),
            ChatMessage::system("other context"),
        );

        assert!(session.history_seeded());
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.history()[0].content, "instruction");
        assert_eq!(session.history()[1].content, "context");
        assert_eq!(session.history()[2].content, "first question");
    }

    #[test]
    fn history_cap_preserves_seed_pair() {
        let mut session = UserSession::new();
        session.seed_history(
            ChatMessage::system("instruction"),
            ChatMessage::system("context"),
        );
        for i in 0..10 {
            session.push_history(ChatMessage::user(format!("turn {i}")), 5);
        }

        assert_eq!(session.history().len(), 5);
        assert_eq!(session.history()[0].role, Role::System);
        assert_eq!(session.history()[1].role, Role::System);
        // Most recent turns survive.
        assert_eq!(session.history()[4].content, "turn 9");
    }

    #[test]
    fn history_cap_without_seed_drops_oldest() {
        let mut session = UserSession::new();
        for i in 0..6 {
            session.push_history(ChatMessage::user(format!("turn {i}")), 4);
        }
        assert_eq!(session.history().len(), 4);
        assert_eq!(session.history()[0].content, "turn 2");
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("34600000001").await.is_none());

        let mut session = UserSession::new();
        session.record_answer("dni", "12345678");
        store.put("34600000001", session).await;

        let loaded = store.get("34600000001").await.unwrap();
        assert_eq!(loaded.answer("dni"), Some("12345678"));

        store.remove("34600000001").await;
        assert!(store.get("34600000001").await.is_none());
    }

    #[tokio::test]
    async fn memory_store_partitions_by_user() {
        let store = MemoryStore::new();
        let mut a = UserSession::new();
        a.record_answer("dni", "111");
        let mut b = UserSession::new();
        b.record_answer("dni", "222");
        store.put("user-a", a).await;
        store.put("user-b", b).await;

        assert_eq!(store.get("user-a").await.unwrap().answer("dni"), Some("111"));
        assert_eq!(store.get("user-b").await.unwrap().answer("dni"), Some("222"));
    }

    #[test]
    fn flow_state_serde_roundtrip() {
        let state = FlowState::Asking { key: "edad".into() };
        let json = serde_json::to_string(&state).unwrap();
        let parsed: FlowState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.asking_key(), Some("edad"));
        assert!(!parsed.is_terminal());
        assert!(FlowState::Terminal.is_terminal());
    }
}
