//! Game Configuration
//!
//! Tunable constants for one play-through. `Default` carries the canonical
//! values; `from_env` lets a deployment override them without a rebuild.

use std::env;
use std::time::Duration;

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Passing threshold in whole percent. Fixed; not configurable.
pub const PASS_PERCENTAGE: u32 = 70;

/// Canonical starting lives.
pub const DEFAULT_STARTING_LIVES: u32 = 3;

/// Canonical obstacles between questions.
pub const DEFAULT_OBSTACLES_PER_QUESTION: u32 = 6;

/// Canonical points per correct answer.
pub const DEFAULT_SCORE_PER_CORRECT: u32 = 10;

/// Invulnerability window after a hit.
pub const DEFAULT_INVULNERABILITY_MS: u64 = 1000;

/// Delay before the question overlay is hidden after an answer.
pub const DEFAULT_ANSWER_FEEDBACK_MS: u64 = 800;

/// Delay before the game-over screen after the last life is lost.
pub const DEFAULT_GAME_OVER_DELAY_MS: u64 = 1000;

/// Delay before results are handed to the results sink.
pub const DEFAULT_RESULTS_DELAY_MS: u64 = 2000;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A session needs at least one life.
    #[error("starting lives must be at least 1")]
    NoLives,

    /// A trigger threshold of zero would fire on every event.
    #[error("question trigger threshold must be at least 1")]
    ZeroTriggerThreshold,

    /// Unknown wrong-answer policy name.
    #[error("unknown wrong answer policy: {0}")]
    UnknownPolicy(String),
}

/// When the engine should stop the run and ask a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// Ask after this many obstacles have been passed.
    ObstacleCount(u32),
    /// Ask after this many distance units have been flown.
    Distance(u32),
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        TriggerPolicy::ObstacleCount(DEFAULT_OBSTACLES_PER_QUESTION)
    }
}

/// What a wrong answer does to the question cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrongAnswerPolicy {
    /// One attempt per question: a wrong answer resolves the question and
    /// advances the index. Use [`WrongAnswerPolicy::ReaskLater`] to keep the
    /// index unchanged on a wrong answer.
    #[default]
    SingleAttempt,
    /// Resume play without advancing; the same question comes back at the
    /// next trigger.
    ReaskLater,
}

impl std::str::FromStr for WrongAnswerPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single_attempt" | "single" => Ok(WrongAnswerPolicy::SingleAttempt),
            "reask_later" | "reask" => Ok(WrongAnswerPolicy::ReaskLater),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Configuration for one play-through.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Lives at the start of a session.
    pub starting_lives: u32,
    /// Points awarded per correct answer.
    pub score_per_correct: u32,
    /// Question pacing.
    pub trigger: TriggerPolicy,
    /// Wrong-answer handling.
    pub wrong_answer_policy: WrongAnswerPolicy,
    /// Invulnerability window after an obstacle hit.
    pub invulnerability: Duration,
    /// Question overlay linger after an answer.
    pub answer_feedback_delay: Duration,
    /// Delay before showing game over.
    pub game_over_delay: Duration,
    /// Delay before results are published.
    pub results_delay: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_lives: DEFAULT_STARTING_LIVES,
            score_per_correct: DEFAULT_SCORE_PER_CORRECT,
            trigger: TriggerPolicy::default(),
            wrong_answer_policy: WrongAnswerPolicy::default(),
            invulnerability: Duration::from_millis(DEFAULT_INVULNERABILITY_MS),
            answer_feedback_delay: Duration::from_millis(DEFAULT_ANSWER_FEEDBACK_MS),
            game_over_delay: Duration::from_millis(DEFAULT_GAME_OVER_DELAY_MS),
            results_delay: Duration::from_millis(DEFAULT_RESULTS_DELAY_MS),
        }
    }
}

impl GameConfig {
    /// Read overrides from `QUEST_*` environment variables.
    ///
    /// Each variable falls back to its default on its own: a bad value is
    /// logged and replaced without discarding the other overrides.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let trigger = match read_env_nonzero_u32("QUEST_DISTANCE_PER_QUESTION") {
            Some(interval) => TriggerPolicy::Distance(interval),
            None => TriggerPolicy::ObstacleCount(
                read_env_nonzero_u32("QUEST_OBSTACLES_PER_QUESTION")
                    .unwrap_or(DEFAULT_OBSTACLES_PER_QUESTION),
            ),
        };

        let wrong_answer_policy = match env::var("QUEST_WRONG_ANSWER_POLICY") {
            Ok(raw) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!("{}; using {:?}", err, defaults.wrong_answer_policy);
                defaults.wrong_answer_policy
            }),
            Err(_) => defaults.wrong_answer_policy,
        };

        Self {
            starting_lives: read_env_nonzero_u32("QUEST_STARTING_LIVES")
                .unwrap_or(DEFAULT_STARTING_LIVES),
            score_per_correct: read_env_u32("QUEST_SCORE_PER_CORRECT", DEFAULT_SCORE_PER_CORRECT),
            trigger,
            wrong_answer_policy,
            invulnerability: Duration::from_millis(read_env_u64(
                "QUEST_INVULNERABILITY_MS",
                DEFAULT_INVULNERABILITY_MS,
            )),
            ..defaults
        }
    }

    /// Check the values a session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_lives == 0 {
            return Err(ConfigError::NoLives);
        }
        match self.trigger {
            TriggerPolicy::ObstacleCount(0) | TriggerPolicy::Distance(0) => {
                Err(ConfigError::ZeroTriggerThreshold)
            }
            _ => Ok(()),
        }
    }
}

pub(crate) fn read_env_u32(name: &str, default: u32) -> u32 {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{}={:?} is not a valid u32, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// A set, parseable, non-zero value; `None` (with a warning when set) otherwise.
pub(crate) fn read_env_nonzero_u32(name: &str) -> Option<u32> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            tracing::warn!("{}={:?} must be a positive integer, ignoring it", name, raw);
            None
        }
    }
}

pub(crate) fn read_env_u64(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{}={:?} is not a valid u64, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
