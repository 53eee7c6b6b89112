//! # Quest Flyer
//!
//! Game-state and scoring engine for a side-scrolling quiz flyer: dodge
//! obstacles, answer a multiple-choice question every few obstacles, keep
//! your lives, and finish with a results summary.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        QUEST FLYER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for replay checks           │
//! │                                                              │
//! │  game/           - Game rules (deterministic)                │
//! │  ├── config.rs   - Tunables and policies                     │
//! │  ├── question.rs - Questions, answer bands, question bank    │
//! │  ├── trigger.rs  - Question pacing predicates                │
//! │  ├── state.rs    - Session state machine and scoring         │
//! │  ├── events.rs   - Engine events                             │
//! │  ├── results.rs  - Results summary and sinks                 │
//! │  ├── scheduler.rs- Session-tagged timers                     │
//! │  └── runner.rs   - Frame loop around a session               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The engine owns no clock and draws no randomness. Timers are driven by
//! the frame delta the caller passes in, so the same questions, config and
//! input tape always produce the same final state hash.
//!
//! ```
//! use quest_flyer::game::{GameConfig, GameSession, QuestionBank};
//!
//! let bank = QuestionBank::builtin().unwrap();
//! let mut session = GameSession::new(bank.into_questions(), GameConfig::default());
//! for _ in 0..6 {
//!     session.pass_obstacle();
//! }
//! assert!(session.is_question_active());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use game::state::{GamePhase, GameSession, SessionId};
pub use game::results::Results;
pub use game::runner::{FlightRunner, FrameInput};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Frame rate the demo runner assumes (Hz)
pub const TICK_RATE: u32 = 60;

/// Frame duration at [`TICK_RATE`], in milliseconds
pub const FRAME_MS: u64 = 1000 / TICK_RATE as u64;
