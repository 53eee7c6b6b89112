//! Frame Runner
//!
//! Drives a [`GameSession`] from per-frame input. The presentation layer
//! reports what it detected this frame (a collision, obstacles passed,
//! distance, an answer band) and the runner turns that into engine calls,
//! owns the timers around them, and hands results to the sink.
//!
//! ## Frame order
//!
//! 1. Fire scheduled tasks that are due
//! 2. Collision
//! 3. Obstacles passed
//! 4. Distance flown
//! 5. Answer selection
//!
//! Gameplay input is only read while [`Screen::Flying`]; answers only
//! while [`Screen::Question`].

use std::time::Duration;

use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::game::config::GameConfig;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::question::{AnswerBand, Question};
use crate::game::results::{NullSink, Results, ResultsSink};
use crate::game::scheduler::{Scheduler, Task};
use crate::game::state::{GamePhase, GameSession, SessionId};

/// What the presentation layer detected during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInput {
    /// The flyer touched an obstacle.
    pub obstacle_hit: bool,
    /// Obstacles that scrolled past the flyer.
    pub obstacles_passed: u32,
    /// Distance units flown.
    pub distance: u32,
    /// Answer band the player picked.
    pub answer: Option<AnswerBand>,
}

impl FrameInput {
    /// Nothing happened.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Collision this frame.
    pub fn hit() -> Self {
        Self { obstacle_hit: true, ..Self::default() }
    }

    /// `count` obstacles passed this frame.
    pub fn passed(count: u32) -> Self {
        Self { obstacles_passed: count, ..Self::default() }
    }

    /// `units` of distance flown this frame.
    pub fn fly(units: u32) -> Self {
        Self { distance: units, ..Self::default() }
    }

    /// Answer band picked this frame.
    pub fn answer(band: AnswerBand) -> Self {
        Self { answer: Some(band), ..Self::default() }
    }
}

/// What the presentation layer should be showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    /// Gameplay
    Flying,
    /// Question overlay waiting for an answer
    Question,
    /// Question overlay showing the verdict
    Feedback,
    /// Game-over screen
    GameOver,
    /// Results screen
    Results,
}

/// Verdict shown on the question overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFeedback {
    /// Question that was answered.
    pub question_index: usize,
    /// Band the player picked.
    pub chosen: AnswerBand,
    /// Whether it was right.
    pub correct: bool,
    /// Band holding the right answer.
    pub correct_band: Option<AnswerBand>,
}

/// Output of one [`FlightRunner::update`].
#[derive(Debug, Default)]
pub struct FrameResult {
    /// Engine events produced this frame
    pub events: Vec<GameEvent>,
    /// Scheduled tasks that fired this frame
    pub tasks_fired: Vec<Task>,
    /// Answer verdict, on the frame an answer was submitted
    pub feedback: Option<AnswerFeedback>,
    /// Results, on the frame they were handed to the sink
    pub results_published: Option<Results>,
    /// The session entered a terminal phase this frame
    pub game_ended: bool,
}

/// Frame-driven wrapper around one session at a time.
pub struct FlightRunner {
    /// Current session
    session: GameSession,
    /// Timers for the current session
    scheduler: Scheduler,
    /// Results destination
    sink: Box<dyn ResultsSink>,
    /// Milliseconds since the runner was created
    now_ms: u64,
    /// Frames processed
    frame: u64,
    /// Current screen
    screen: Screen,
    /// Verdict on screen, if any
    feedback: Option<AnswerFeedback>,
    /// Results already handed off for this session
    published: bool,
}

impl FlightRunner {
    /// Runner for `session`, publishing to `sink`.
    pub fn new(session: GameSession, sink: Box<dyn ResultsSink>) -> Self {
        let scheduler = Scheduler::new(session.id());
        let mut runner = Self {
            session,
            scheduler,
            sink,
            now_ms: 0,
            frame: 0,
            screen: Screen::Flying,
            feedback: None,
            published: false,
        };
        runner.sync_screen();
        runner
    }

    /// Advance the clock by `dt` and apply this frame's input.
    pub fn update(&mut self, dt: Duration, input: &FrameInput) -> FrameResult {
        self.frame += 1;
        self.now_ms = self.now_ms.saturating_add(dt.as_millis() as u64);
        let mut result = FrameResult::default();

        // 1. Timers
        for task in self.scheduler.advance(self.now_ms) {
            self.run_task(task, &mut result);
            result.tasks_fired.push(task);
        }

        // 2-4. Gameplay
        if self.screen == Screen::Flying && self.session.is_playing() {
            if input.obstacle_hit && self.session.decrement_life() {
                let duration = self.session.config().invulnerability;
                let window = self.session.set_invulnerable(duration);
                self.scheduler.schedule(Task::ExpireInvulnerability(window), self.now_ms, window.duration);
                debug!(lives = self.session.lives(), "obstacle hit");
            }

            for _ in 0..input.obstacles_passed {
                if !self.session.is_playing() {
                    break;
                }
                self.session.pass_obstacle();
            }

            if input.distance > 0 && self.session.is_playing() {
                self.session.advance_distance(input.distance);
            }
        }

        // 5. Answer
        if self.screen == Screen::Question {
            if let Some(band) = input.answer {
                result.feedback = self.answer(band);
            }
        }

        result.events = self.session.take_events();
        for event in &result.events {
            if event.is_terminal_transition() {
                result.game_ended = true;
                self.on_session_end();
            }
        }
        self.sync_screen();

        result
    }

    /// Throw the current session away and start a fresh one with a new id.
    ///
    /// Timers scheduled by the old session never fire.
    pub fn restart(&mut self) {
        let old = self.session.id();
        self.session.reset();
        self.scheduler.bind(self.session.id());
        self.screen = Screen::Flying;
        self.feedback = None;
        self.published = false;
        info!(old = %old, new = %self.session.id(), "session restarted");
    }

    /// Current session.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Current session id.
    pub fn session_id(&self) -> SessionId {
        self.session.id()
    }

    /// Current screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Verdict on screen.
    pub fn feedback(&self) -> Option<AnswerFeedback> {
        self.feedback
    }

    /// Milliseconds since creation.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Frames processed.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Have this session's results been handed off?
    pub fn results_published(&self) -> bool {
        self.published
    }

    /// Pending timers.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    fn answer(&mut self, band: AnswerBand) -> Option<AnswerFeedback> {
        let question = self.session.active_question()?;
        let text = question.answer_in_band(band)?.to_owned();
        let correct_band = question.correct_band();
        let question_index = self.session.question_index();

        let outcome = self.session.submit_answer(&text);
        let feedback = AnswerFeedback {
            question_index,
            chosen: band,
            correct: outcome.correct,
            correct_band,
        };
        debug!(question = question_index, band = %band, correct = outcome.correct, "answer submitted");

        self.feedback = Some(feedback);
        self.screen = Screen::Feedback;
        let delay = self.session.config().answer_feedback_delay;
        self.scheduler.schedule(Task::HideQuestion, self.now_ms, delay);
        Some(feedback)
    }

    fn run_task(&mut self, task: Task, result: &mut FrameResult) {
        match task {
            Task::ExpireInvulnerability(window) => {
                self.session.expire_invulnerability(window);
            }
            Task::HideQuestion => {
                self.feedback = None;
                self.screen = match self.session.phase() {
                    GamePhase::QuestionActive => Screen::Question,
                    GamePhase::Results => Screen::Results,
                    GamePhase::Playing | GamePhase::GameOver => Screen::Flying,
                };
            }
            Task::ShowGameOver => {
                self.feedback = None;
                self.screen = Screen::GameOver;
                let results = self.session.results();
                info!(score = results.score, lives_used = results.lives_used, "game over");
            }
            Task::PublishResults => {
                result.results_published = self.publish();
            }
        }
    }

    fn on_session_end(&mut self) {
        let config = self.session.config();
        match self.session.phase() {
            GamePhase::GameOver => {
                let delay = config.game_over_delay;
                self.scheduler.schedule(Task::ShowGameOver, self.now_ms, delay);
            }
            GamePhase::Results => {
                let delay = config.results_delay;
                self.scheduler.schedule(Task::PublishResults, self.now_ms, delay);
                let results = self.session.results();
                info!(
                    score = results.score,
                    percentage = results.percentage,
                    passed = results.passed,
                    "all questions done"
                );
            }
            GamePhase::Playing | GamePhase::QuestionActive => {}
        }
    }

    fn publish(&mut self) -> Option<Results> {
        if self.published {
            return None;
        }
        self.published = true;
        let results = self.session.results();
        match self.sink.publish(&results) {
            Ok(()) => info!(session = %self.session.id(), "results published"),
            Err(err) => warn!(session = %self.session.id(), "results hand-off failed: {}", err),
        }
        Some(results)
    }

    fn sync_screen(&mut self) {
        if self.screen != Screen::Flying {
            return;
        }
        match self.session.phase() {
            GamePhase::QuestionActive => self.screen = Screen::Question,
            GamePhase::Results => self.screen = Screen::Results,
            GamePhase::Playing | GamePhase::GameOver => {}
        }
    }
}

/// Re-run a recorded input tape on a fresh session.
///
/// Every frame advances the clock by `frame_time`. The returned runner
/// holds the final session; its hash matches the original run when the
/// tape, questions and config match.
pub fn replay(
    questions: Vec<Question>,
    config: GameConfig,
    frame_time: Duration,
    tape: &[FrameInput],
) -> FlightRunner {
    let mut runner = FlightRunner::new(GameSession::new(questions, config), Box::new(NullSink));
    for input in tape {
        runner.update(frame_time, input);
    }
    runner
}

/// Count answer verdicts in a batch of events.
pub fn count_answers(events: &[GameEvent]) -> (u32, u32) {
    events.iter().fold((0, 0), |(right, wrong), event| match event.data {
        GameEventData::AnswerResolved { correct: true, .. } => (right + 1, wrong),
        GameEventData::AnswerResolved { correct: false, .. } => (right, wrong + 1),
        _ => (right, wrong),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::{TriggerPolicy, WrongAnswerPolicy};
    use crate::game::results::SinkError;
    use std::sync::{Arc, Mutex};

    /// Sink the test can inspect after handing it to the runner.
    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<Results>>>);

    impl SharedSink {
        fn count(&self) -> usize {
            self.0.lock().unwrap().len()
        }
    }

    impl ResultsSink for SharedSink {
        fn publish(&mut self, results: &Results) -> Result<(), SinkError> {
            self.0.lock().unwrap().push(*results);
            Ok(())
        }
    }

    struct FailingSink;

    impl ResultsSink for FailingSink {
        fn publish(&mut self, _results: &Results) -> Result<(), SinkError> {
            Err(SinkError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn questions(count: usize) -> Vec<Question> {
        (0..count)
            .map(|n| {
                Question::new(
                    format!("Q{}", n),
                    vec![format!("yes {}", n), format!("no {}", n), format!("maybe {}", n)],
                    format!("yes {}", n),
                )
                .unwrap()
            })
            .collect()
    }

    fn config(threshold: u32) -> GameConfig {
        GameConfig {
            trigger: TriggerPolicy::ObstacleCount(threshold),
            ..GameConfig::default()
        }
    }

    fn runner(count: usize, config: GameConfig) -> (FlightRunner, SharedSink) {
        let sink = SharedSink::default();
        let runner = FlightRunner::new(GameSession::new(questions(count), config), Box::new(sink.clone()));
        (runner, sink)
    }

    #[test]
    fn test_hit_is_debounced_until_window_expires() {
        let (mut r, _) = runner(3, config(5));

        r.update(ms(16), &FrameInput::hit());
        assert_eq!(r.session().lives(), 2);
        assert!(r.session().is_invulnerable());

        r.update(ms(500), &FrameInput::hit());
        assert_eq!(r.session().lives(), 2);

        let result = r.update(ms(500), &FrameInput::idle());
        assert_eq!(result.tasks_fired.len(), 1);
        assert!(!r.session().is_invulnerable());

        r.update(ms(16), &FrameInput::hit());
        assert_eq!(r.session().lives(), 1);
    }

    #[test]
    fn test_question_flow() {
        let (mut r, _) = runner(3, config(2));

        r.update(ms(16), &FrameInput::passed(1));
        assert_eq!(r.screen(), Screen::Flying);
        r.update(ms(16), &FrameInput::passed(1));
        assert_eq!(r.screen(), Screen::Question);

        // Gameplay input is ignored while the question is up.
        r.update(ms(16), &FrameInput::hit());
        assert_eq!(r.session().lives(), 3);

        let result = r.update(ms(16), &FrameInput::answer(AnswerBand::A));
        let feedback = result.feedback.unwrap();
        assert!(feedback.correct);
        assert_eq!(feedback.correct_band, Some(AnswerBand::A));
        assert_eq!(r.screen(), Screen::Feedback);
        assert_eq!(r.session().score(), 10);

        r.update(ms(400), &FrameInput::passed(5));
        assert_eq!(r.session().obstacles_passed(), 0);
        assert_eq!(r.screen(), Screen::Feedback);

        r.update(ms(400), &FrameInput::idle());
        assert_eq!(r.screen(), Screen::Flying);
        assert!(r.feedback().is_none());
    }

    #[test]
    fn test_answer_ignored_while_flying() {
        let (mut r, _) = runner(3, config(2));
        let result = r.update(ms(16), &FrameInput::answer(AnswerBand::A));
        assert!(result.feedback.is_none());
        assert_eq!(r.session().score(), 0);
    }

    #[test]
    fn test_missing_band_is_ignored() {
        let (mut r, _) = runner(3, config(1));
        r.update(ms(16), &FrameInput::passed(1));

        let result = r.update(ms(16), &FrameInput::answer(AnswerBand::D));
        assert!(result.feedback.is_none());
        assert_eq!(r.screen(), Screen::Question);
    }

    #[test]
    fn test_reask_later_brings_question_back() {
        let cfg = GameConfig { wrong_answer_policy: WrongAnswerPolicy::ReaskLater, ..config(1) };
        let (mut r, _) = runner(2, cfg);
        r.update(ms(16), &FrameInput::passed(1));

        let result = r.update(ms(16), &FrameInput::answer(AnswerBand::B));
        assert!(!result.feedback.unwrap().correct);
        assert_eq!(r.screen(), Screen::Feedback);

        r.update(ms(800), &FrameInput::idle());
        assert_eq!(r.screen(), Screen::Flying);

        r.update(ms(16), &FrameInput::passed(1));
        assert_eq!(r.screen(), Screen::Question);
        assert_eq!(r.session().active_question().unwrap().prompt(), "Q0");
        assert_eq!(r.session().lives(), 2);
    }

    #[test]
    fn test_results_published_once_after_delay() {
        let (mut r, sink) = runner(1, config(1));
        r.update(ms(16), &FrameInput::passed(1));

        let result = r.update(ms(16), &FrameInput::answer(AnswerBand::A));
        assert!(result.game_ended);
        assert!(r.session().is_all_questions_done());

        r.update(ms(800), &FrameInput::idle());
        assert_eq!(r.screen(), Screen::Results);
        assert_eq!(sink.count(), 0);

        let result = r.update(ms(1200), &FrameInput::idle());
        assert_eq!(result.results_published.map(|res| res.percentage), Some(100));
        assert_eq!(sink.count(), 1);

        for _ in 0..10 {
            r.update(ms(1000), &FrameInput::idle());
        }
        assert_eq!(sink.count(), 1);
        assert!(r.results_published());
    }

    #[test]
    fn test_empty_bank_goes_straight_to_results() {
        let (mut r, sink) = runner(0, config(1));
        let result = r.update(ms(16), &FrameInput::passed(1));
        assert!(result.game_ended);
        assert_eq!(r.screen(), Screen::Results);

        r.update(ms(2000), &FrameInput::idle());
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_game_over_screen_after_delay() {
        let cfg = GameConfig { starting_lives: 1, ..config(5) };
        let (mut r, sink) = runner(3, cfg);

        let result = r.update(ms(16), &FrameInput::hit());
        assert!(result.game_ended);
        assert!(r.session().is_game_over());
        assert_eq!(r.screen(), Screen::Flying);

        r.update(ms(999), &FrameInput::idle());
        assert_eq!(r.screen(), Screen::Flying);
        r.update(ms(1), &FrameInput::idle());
        assert_eq!(r.screen(), Screen::GameOver);

        r.update(ms(5000), &FrameInput::idle());
        assert_eq!(sink.count(), 0, "game over does not hand off results");
    }

    #[test]
    fn test_wrong_answer_on_last_life() {
        let cfg = GameConfig { starting_lives: 1, ..config(1) };
        let (mut r, _) = runner(3, cfg);
        r.update(ms(16), &FrameInput::passed(1));

        let result = r.update(ms(16), &FrameInput::answer(AnswerBand::C));
        assert!(result.game_ended);
        assert_eq!(r.screen(), Screen::Feedback);

        r.update(ms(800), &FrameInput::idle());
        assert_eq!(r.screen(), Screen::Flying);
        r.update(ms(200), &FrameInput::idle());
        assert_eq!(r.screen(), Screen::GameOver);
    }

    #[test]
    fn test_restart_drops_pending_timers() {
        let (mut r, sink) = runner(1, config(1));
        let first = r.session_id();
        r.update(ms(16), &FrameInput::passed(1));
        r.update(ms(16), &FrameInput::answer(AnswerBand::A));
        assert!(r.scheduler().len() >= 1);

        r.restart();
        assert_ne!(r.session_id(), first);
        assert_eq!(r.screen(), Screen::Flying);
        assert!(r.session().is_playing());

        let result = r.update(ms(5000), &FrameInput::idle());
        assert!(result.tasks_fired.is_empty());
        assert_eq!(sink.count(), 0);
        assert!(r.scheduler().is_empty());
        assert_eq!(r.session().score(), 0);
    }

    #[test]
    fn test_stale_invulnerability_does_not_touch_new_session() {
        let (mut r, _) = runner(3, config(5));
        r.update(ms(16), &FrameInput::hit());
        r.restart();

        r.update(ms(500), &FrameInput::hit());
        assert_eq!(r.session().lives(), 2);

        // The old session's expiry would have come due here.
        r.update(ms(600), &FrameInput::hit());
        assert!(r.session().is_invulnerable());
        assert_eq!(r.session().lives(), 2);
    }

    #[test]
    fn test_sink_failure_is_not_fatal() {
        let session = GameSession::new(questions(0), config(1));
        let mut r = FlightRunner::new(session, Box::new(FailingSink));
        r.update(ms(16), &FrameInput::passed(1));

        let result = r.update(ms(2000), &FrameInput::idle());
        assert!(result.results_published.is_some());
        assert!(r.results_published());
    }

    #[test]
    fn test_distance_paced_runner() {
        let cfg = GameConfig { trigger: TriggerPolicy::Distance(100), ..GameConfig::default() };
        let (mut r, _) = runner(2, cfg);

        r.update(ms(16), &FrameInput::fly(60));
        assert_eq!(r.screen(), Screen::Flying);
        r.update(ms(16), &FrameInput::fly(60));
        assert_eq!(r.screen(), Screen::Question);
    }

    #[test]
    fn test_replay_matches_original_run() {
        let tape = vec![
            FrameInput::passed(2),
            FrameInput::hit(),
            FrameInput::passed(1),
            FrameInput::answer(AnswerBand::B),
            FrameInput::idle(),
            FrameInput::passed(3),
            FrameInput::answer(AnswerBand::A),
        ];
        let frame = ms(400);

        let (mut original, _) = runner(4, config(3));
        let mut events = Vec::new();
        for input in &tape {
            events.extend(original.update(frame, input).events);
        }

        let replayed = replay(questions(4), config(3), frame, &tape);
        assert_eq!(replayed.session().compute_hash(), original.session().compute_hash());
        assert_eq!(replayed.session().results(), original.session().results());
        assert_eq!(count_answers(&events), (1, 1));
    }
}
