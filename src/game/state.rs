//! Game Session State
//!
//! The state and scoring engine for one play-through. Owns lives, score,
//! the question cursor, the trigger counters and the phase, and exposes
//! the event entry points the frame loop calls.
//!
//! ## Phases
//!
//! ```text
//!            trigger (question left)             correct / wrong, lives left
//!   PLAYING ───────────────────────▶ QUESTION_ACTIVE ─────────────────────▶ PLAYING
//!      │  trigger (bank exhausted)        │ last question resolved
//!      └──────────────▶ RESULTS ◀─────────┘
//!      │ hit, last life                   │ wrong, last life
//!      └──────────────▶ GAME_OVER ◀───────┘
//! ```
//!
//! `GAME_OVER` and `RESULTS` are terminal: no operation changes lives,
//! score or the question cursor afterwards.

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::core::hash::{compute_state_hash, StateHash};
use crate::game::config::{GameConfig, WrongAnswerPolicy};
use crate::game::events::GameEvent;
use crate::game::question::{AnswerBand, Question};
use crate::game::results::Results;
use crate::game::trigger::{QuestionTrigger, TriggerProgress};

/// Identity of one play-through. A restart issues a new one.
pub type SessionId = Uuid;

// =============================================================================
// GAME PHASE
// =============================================================================

/// Current phase of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[derive(Default)]
pub enum GamePhase {
    /// Flying and dodging obstacles
    #[default]
    Playing,
    /// A question is on screen
    QuestionActive,
    /// Out of lives
    GameOver,
    /// Question bank exhausted
    Results,
}

impl GamePhase {
    /// No further gameplay in this phase.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Results)
    }

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            GamePhase::Playing => "PLAYING",
            GamePhase::QuestionActive => "QUESTION_ACTIVE",
            GamePhase::GameOver => "GAME_OVER",
            GamePhase::Results => "RESULTS",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// OPERATION RESULTS
// =============================================================================

/// Outcome of [`GameSession::submit_answer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    /// The submitted text matched the correct answer.
    pub correct: bool,
    /// The session is now in a terminal phase.
    pub game_ended: bool,
}

/// Handle for one invulnerability window.
///
/// Only the handle from the latest [`GameSession::set_invulnerable`] call
/// can expire the window; older handles are stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvulnerabilityWindow {
    /// Window number within the session.
    pub epoch: u64,
    /// How long the caller should wait before expiring it.
    pub duration: Duration,
}

// =============================================================================
// GAME SESSION
// =============================================================================

/// Complete state of one play-through.
pub struct GameSession {
    /// Session identity (fresh on construction and on reset)
    id: SessionId,

    /// Tunables
    config: GameConfig,

    /// Ordered, immutable question list
    questions: Vec<Question>,

    /// Pacing predicate
    trigger: Box<dyn QuestionTrigger>,

    /// Remaining lives
    lives: u32,

    /// Accumulated score
    score: u32,

    /// Cursor into `questions`
    question_index: usize,

    /// Obstacles passed since the last question
    obstacles_passed: u32,

    /// Distance flown since the last question
    distance_travelled: u32,

    /// Obstacles passed over the whole session
    total_obstacles_passed: u32,

    /// Correct answers
    correct_answers: u32,

    /// Wrong answers plus obstacle hits
    wrong_answers: u32,

    /// Current phase
    phase: GamePhase,

    /// Collision debounce flag
    invulnerable: bool,

    /// Latest invulnerability window number
    invulnerability_epoch: u64,

    /// Applied-operation counter
    seq: u64,

    /// Events not yet drained
    pending_events: Vec<GameEvent>,
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("lives", &self.lives)
            .field("score", &self.score)
            .field("question_index", &self.question_index)
            .field("questions", &self.questions.len())
            .field("obstacles_passed", &self.obstacles_passed)
            .field("invulnerable", &self.invulnerable)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Create a session using the configured trigger policy.
    pub fn new(questions: Vec<Question>, config: GameConfig) -> Self {
        let trigger = config.trigger;
        Self::with_trigger(questions, config, trigger)
    }

    /// Create a session with a custom trigger predicate.
    pub fn with_trigger<T>(questions: Vec<Question>, config: GameConfig, trigger: T) -> Self
    where
        T: QuestionTrigger + 'static,
    {
        let starting_lives = config.starting_lives.max(1);
        Self {
            id: Uuid::new_v4(),
            config,
            questions,
            trigger: Box::new(trigger),
            lives: starting_lives,
            score: 0,
            question_index: 0,
            obstacles_passed: 0,
            distance_travelled: 0,
            total_obstacles_passed: 0,
            correct_answers: 0,
            wrong_answers: 0,
            phase: GamePhase::Playing,
            invulnerable: false,
            invulnerability_epoch: 0,
            seq: 0,
            pending_events: Vec::new(),
        }
    }

    /// Return to the fresh-session state with a new session id.
    pub fn reset(&mut self) {
        self.id = Uuid::new_v4();
        self.lives = self.starting_lives();
        self.score = 0;
        self.question_index = 0;
        self.obstacles_passed = 0;
        self.distance_travelled = 0;
        self.total_obstacles_passed = 0;
        self.correct_answers = 0;
        self.wrong_answers = 0;
        self.phase = GamePhase::Playing;
        self.invulnerable = false;
        self.invulnerability_epoch = 0;
        self.seq = 0;
        self.pending_events.clear();
    }

    /// Replace the question list and reset.
    pub fn load_questions(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.reset();
    }

    // =========================================================================
    // Event entry points
    // =========================================================================

    /// The flyer got past an obstacle.
    ///
    /// Returns `true` when this obstacle triggered a question. No-op (and
    /// `false`) outside `PLAYING`.
    pub fn pass_obstacle(&mut self) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        self.seq += 1;
        self.obstacles_passed = self.obstacles_passed.saturating_add(1);
        self.total_obstacles_passed = self.total_obstacles_passed.saturating_add(1);
        if self.check_trigger() {
            return true;
        }
        if self.is_playing() {
            self.push_event(GameEvent::obstacle_passed(self.seq, self.obstacles_passed));
        }
        false
    }

    /// The flyer covered `units` of distance.
    ///
    /// Same contract as [`pass_obstacle`](Self::pass_obstacle) for
    /// distance-paced sessions.
    pub fn advance_distance(&mut self, units: u32) -> bool {
        if self.phase != GamePhase::Playing || units == 0 {
            return false;
        }
        self.seq += 1;
        self.distance_travelled = self.distance_travelled.saturating_add(units);
        if self.check_trigger() {
            return true;
        }
        if self.is_playing() {
            self.push_event(GameEvent::distance_flown(self.seq, self.distance_travelled));
        }
        false
    }

    /// Resolve the active question with the selected answer text.
    ///
    /// Comparison is by value. Text that is not among the candidates is a
    /// wrong answer. Outside `QUESTION_ACTIVE` nothing changes.
    pub fn submit_answer(&mut self, answer: &str) -> AnswerOutcome {
        if self.phase != GamePhase::QuestionActive {
            return AnswerOutcome { correct: false, game_ended: self.phase.is_terminal() };
        }

        let (correct, band) = match self.questions.get(self.question_index) {
            Some(question) => {
                let band = question
                    .answers()
                    .iter()
                    .position(|a| a == answer)
                    .and_then(AnswerBand::from_index);
                (question.is_correct(answer), band)
            }
            None => {
                // Cursor past the end: nothing left to ask.
                self.seq += 1;
                self.set_phase(GamePhase::Results);
                return AnswerOutcome { correct: false, game_ended: true };
            }
        };

        self.seq += 1;
        let asked = self.question_index;

        if correct {
            self.score = self.score.saturating_add(self.config.score_per_correct);
            self.correct_answers += 1;
            self.push_event(GameEvent::answer_resolved(self.seq, asked, true, band, self.score, self.lives));
            self.advance_question();
        } else {
            self.lives = self.lives.saturating_sub(1);
            self.wrong_answers += 1;
            self.push_event(GameEvent::answer_resolved(self.seq, asked, false, band, self.score, self.lives));

            if self.config.wrong_answer_policy == WrongAnswerPolicy::SingleAttempt {
                self.question_index += 1;
            }
            if self.lives == 0 {
                self.set_phase(GamePhase::GameOver);
            } else {
                self.resume_or_finish();
            }
        }

        AnswerOutcome { correct, game_ended: self.phase.is_terminal() }
    }

    /// The flyer hit an obstacle.
    ///
    /// Takes one life and arms the invulnerability flag. No-op while
    /// invulnerable or outside `PLAYING`, so repeated contact reports for
    /// the same hit cost exactly one life. Returns `true` when a life was
    /// taken.
    pub fn decrement_life(&mut self) -> bool {
        if self.phase != GamePhase::Playing || self.invulnerable {
            return false;
        }
        self.seq += 1;
        self.lives = self.lives.saturating_sub(1);
        self.wrong_answers += 1;
        self.push_event(GameEvent::life_lost(self.seq, self.lives));
        self.arm_invulnerability();

        if self.lives == 0 {
            self.set_phase(GamePhase::GameOver);
        }
        true
    }

    /// Open (or extend) an invulnerability window.
    ///
    /// The caller schedules [`expire_invulnerability`](Self::expire_invulnerability)
    /// with the returned handle after `duration`. A second call supersedes
    /// the first handle instead of stacking.
    pub fn set_invulnerable(&mut self, duration: Duration) -> InvulnerabilityWindow {
        self.seq += 1;
        self.arm_invulnerability();
        self.invulnerability_epoch += 1;
        InvulnerabilityWindow { epoch: self.invulnerability_epoch, duration }
    }

    /// Close the invulnerability window if `window` is still the latest one.
    pub fn expire_invulnerability(&mut self, window: InvulnerabilityWindow) -> bool {
        if window.epoch != self.invulnerability_epoch || !self.invulnerable {
            return false;
        }
        self.clear_invulnerable();
        true
    }

    /// Close the invulnerability window unconditionally.
    pub fn clear_invulnerable(&mut self) {
        if self.invulnerable {
            self.seq += 1;
            self.invulnerable = false;
            self.push_event(GameEvent::invulnerability_changed(self.seq, false));
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Final (or current) results summary.
    pub fn results(&self) -> Results {
        Results::compute(
            self.score,
            self.question_index as u32,
            self.correct_answers,
            self.wrong_answers,
            self.starting_lives() - self.lives,
        )
    }

    /// Question at the cursor; `None` once the bank is exhausted.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.question_index)
    }

    /// Question on screen; `None` unless `QUESTION_ACTIVE`.
    pub fn active_question(&self) -> Option<&Question> {
        if self.phase == GamePhase::QuestionActive {
            self.current_question()
        } else {
            None
        }
    }

    /// `PLAYING`?
    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// `QUESTION_ACTIVE`?
    pub fn is_question_active(&self) -> bool {
        self.phase == GamePhase::QuestionActive
    }

    /// `GAME_OVER`?
    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// `RESULTS`?
    pub fn is_all_questions_done(&self) -> bool {
        self.phase == GamePhase::Results
    }

    /// Either terminal phase?
    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Session identity.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Configuration in use.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Remaining lives.
    pub fn lives(&self) -> u32 {
        self.lives
    }

    /// Lives at session start.
    pub fn starting_lives(&self) -> u32 {
        self.config.starting_lives.max(1)
    }

    /// Current score.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Question cursor.
    pub fn question_index(&self) -> usize {
        self.question_index
    }

    /// Number of questions in the session.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Obstacles passed since the last question.
    pub fn obstacles_passed(&self) -> u32 {
        self.obstacles_passed
    }

    /// Distance flown since the last question.
    pub fn distance_travelled(&self) -> u32 {
        self.distance_travelled
    }

    /// Obstacles passed over the whole session.
    pub fn total_obstacles_passed(&self) -> u32 {
        self.total_obstacles_passed
    }

    /// Correct answers.
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    /// Wrong answers plus obstacle hits.
    pub fn wrong_answers(&self) -> u32 {
        self.wrong_answers
    }

    /// Collision debounce flag.
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable
    }

    /// Applied-operation counter.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Hash of all gameplay state. The session id is excluded so a replay
    /// hashes the same as the original run.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.seq, |hasher| {
            hasher.update_u32(self.lives);
            hasher.update_u32(self.score);
            hasher.update_u64(self.question_index as u64);
            hasher.update_u64(self.questions.len() as u64);
            hasher.update_u32(self.obstacles_passed);
            hasher.update_u32(self.distance_travelled);
            hasher.update_u32(self.total_obstacles_passed);
            hasher.update_u32(self.correct_answers);
            hasher.update_u32(self.wrong_answers);
            hasher.update_str(self.phase.as_str());
            hasher.update_bool(self.invulnerable);
            hasher.update_u64(self.invulnerability_epoch);
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn check_trigger(&mut self) -> bool {
        let progress = TriggerProgress {
            obstacles: self.obstacles_passed,
            distance: self.distance_travelled,
        };
        if !self.trigger.should_trigger(&progress) {
            return false;
        }
        self.obstacles_passed = 0;
        self.distance_travelled = 0;
        self.trigger_question()
    }

    fn trigger_question(&mut self) -> bool {
        if self.current_question().is_some() {
            self.set_phase(GamePhase::QuestionActive);
            self.push_event(GameEvent::question_triggered(self.seq, self.question_index));
            true
        } else {
            self.set_phase(GamePhase::Results);
            false
        }
    }

    fn advance_question(&mut self) {
        self.question_index += 1;
        self.resume_or_finish();
    }

    fn resume_or_finish(&mut self) {
        if self.question_index >= self.questions.len() {
            self.set_phase(GamePhase::Results);
        } else {
            self.set_phase(GamePhase::Playing);
        }
    }

    fn arm_invulnerability(&mut self) {
        if !self.invulnerable {
            self.invulnerable = true;
            self.push_event(GameEvent::invulnerability_changed(self.seq, true));
        }
    }

    fn set_phase(&mut self, new_phase: GamePhase) {
        let old_phase = self.phase;
        if old_phase == new_phase {
            return;
        }
        self.phase = new_phase;
        tracing::debug!(session = %self.id, "phase {} -> {}", old_phase, new_phase);
        self.push_event(GameEvent::phase_changed(self.seq, old_phase, new_phase));
    }

    fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================
