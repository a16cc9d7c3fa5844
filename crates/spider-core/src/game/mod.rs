pub mod config;
pub mod session;
pub mod submission;

pub use config::{EngineConfig, EngineConfigError};
pub use session::{
    AskedQuestion, GuessProposal, GuessRecord, LossReason, Outcome, Session, SessionError,
    SessionView,
};
pub use submission::{
    CharacterSuggestion, MemorySink, QuestionSuggestion, Reveal, SessionRecord, SinkError,
    Submission, SubmissionSink, Suggestions,
};
