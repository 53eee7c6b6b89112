//! Game Logic Module
//!
//! All quiz-flyer rules. Deterministic: no clock, no randomness, no I/O
//! outside the results sinks and question loading.
//!
//! ## Module Structure
//!
//! - `config`: Tunables, trigger and wrong-answer policies, env overrides
//! - `question`: Question records, answer bands, the question bank
//! - `trigger`: When a run of obstacles turns into a question
//! - `state`: Game session state machine and scoring
//! - `events`: Game events for presentation/replay
//! - `results`: Results summary and sinks
//! - `scheduler`: Session-tagged delayed tasks
//! - `runner`: Frame loop around a session

pub mod config;
pub mod question;
pub mod trigger;
pub mod state;
pub mod events;
pub mod results;
pub mod scheduler;
pub mod runner;

// Re-export key types
pub use config::{GameConfig, TriggerPolicy, WrongAnswerPolicy, ConfigError};
pub use question::{AnswerBand, Question, QuestionBank, QuestionError};
pub use trigger::{QuestionTrigger, TriggerProgress};
pub use state::{AnswerOutcome, GamePhase, GameSession, InvulnerabilityWindow, SessionId};
pub use events::{GameEvent, GameEventData};
pub use results::{Grade, JsonFileSink, MemorySink, Results, ResultsSink, SinkError};
pub use scheduler::{Scheduler, Task, TaskKind};
pub use runner::{FlightRunner, FrameInput, FrameResult, Screen};
