//! Conversation engine — the intake state machine and its collaborators.

pub mod assistant;
pub mod intent;
pub mod routing;
pub mod script;
pub mod session;

pub use assistant::AssistantDialogue;
pub use intent::{ClassifyContext, Command, HeuristicClassifier, Intent, IntentClassifier};
pub use routing::{
    ConversationEngine, FLOW_ERROR_INSTRUCTION, REPORT_COMPLETED, START_INSTRUCTION,
    SUMMARY_GENERATED,
};
pub use script::{medical_intake_script, Question, QuestionScript};
pub use session::{FlowState, MemoryStore, SessionStore, UserSession};
