//! Quest Flyer Demo
//!
//! Plays one session with a seeded autopilot standing in for the player,
//! hands the results to a JSON file, then replays the recorded input tape
//! and checks that the final state hash matches.

use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use quest_flyer::{
    DeterministicRng, FRAME_MS, TICK_RATE, VERSION,
    game::{
        question::{AnswerBand, QuestionBank},
        results::JsonFileSink,
        runner::{count_answers, replay, FlightRunner, FrameInput, Screen},
        GameConfig, GameSession,
    },
};

/// Give up after ten minutes of simulated play.
const MAX_FRAMES: u64 = 60 * 60 * 10;

/// Frames the autopilot "reads" a question before answering.
const THINK_FRAMES: u32 = 45;

/// Chance (percent) the autopilot picks the right answer.
const AUTOPILOT_ACCURACY: u32 = 75;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Quest Flyer v{}", VERSION);
    info!("Frame Rate: {} Hz", TICK_RATE);

    let bank = match std::env::args().nth(1) {
        Some(path) => QuestionBank::from_path(&path)
            .with_context(|| format!("failed to load question bank {}", path))?,
        None => QuestionBank::builtin().context("built-in question bank is invalid")?,
    };
    let config = GameConfig::from_env();
    info!(
        "{} questions, {} lives, trigger {:?}, wrong answers {:?}",
        bank.len(),
        config.starting_lives,
        config.trigger,
        config.wrong_answer_policy
    );

    demo_run(bank, config)
}

/// Play one autopilot session, then verify it by replay.
fn demo_run(bank: QuestionBank, config: GameConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Session ===");

    let results_path =
        std::env::var("QUEST_RESULTS_PATH").unwrap_or_else(|_| "quest-results.json".to_string());
    let sink = JsonFileSink::new(&results_path);

    let session = GameSession::new(bank.questions().to_vec(), config.clone());
    let mut rng = DeterministicRng::for_session(session.id().as_bytes());
    let mut runner = FlightRunner::new(session, Box::new(sink));

    info!("Session ID: {}", hex::encode(runner.session_id().as_bytes()));

    let frame_time = Duration::from_millis(FRAME_MS);
    let mut tape = Vec::new();
    let mut events = Vec::new();
    let mut think = 0u32;

    while runner.frame() < MAX_FRAMES {
        let input = autopilot(&runner, &mut rng, &mut think);
        tape.push(input);

        let result = runner.update(frame_time, &input);
        if let Some(feedback) = result.feedback {
            info!(
                "Q{}: picked {} ({})",
                feedback.question_index + 1,
                feedback.chosen,
                if feedback.correct { "correct" } else { "wrong" }
            );
        }
        events.extend(result.events);

        if runner.results_published() || runner.screen() == Screen::GameOver {
            break;
        }
    }

    // Print final results
    info!("=== Session Results ===");
    let results = runner.session().results();
    let (right, wrong) = count_answers(&events);
    info!("Phase: {}", runner.session().phase());
    info!(
        "Score: {}  Questions: {}  Correct: {}  Wrong: {}  Lives used: {}",
        results.score,
        results.total_questions,
        results.correct_answers,
        results.wrong_answers,
        results.lives_used
    );
    info!("{}% - {} ({})", results.percentage, results.grade().message(), if results.passed { "passed" } else { "not passed" });
    info!("Answers: {} right, {} wrong, {} events, {} frames", right, wrong, events.len(), runner.frame());
    if runner.results_published() {
        info!("Results written to {}", results_path);
    }

    let hash = runner.session().compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let replayed = replay(bank.into_questions(), config, frame_time, &tape);
    let replay_hash = replayed.session().compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
        Ok(())
    } else {
        warn!("DETERMINISM FAILURE: Hashes differ!");
        anyhow::bail!("replay diverged from the recorded session")
    }
}

/// Pick this frame's input the way a middling player would.
fn autopilot(runner: &FlightRunner, rng: &mut DeterministicRng, think: &mut u32) -> FrameInput {
    match runner.screen() {
        Screen::Flying => {
            if rng.next_int(1500) == 0 {
                FrameInput::hit()
            } else if rng.next_int(30) == 0 {
                FrameInput::passed(1)
            } else {
                FrameInput::fly(rng.next_int_range(1, 3))
            }
        }
        Screen::Question => {
            *think += 1;
            if *think < THINK_FRAMES {
                return FrameInput::idle();
            }
            *think = 0;

            let Some(question) = runner.session().active_question() else {
                return FrameInput::idle();
            };
            let bands: Vec<AnswerBand> = question
                .bands()
                .map(|(band, _)| band)
                .collect();

            let pick = match question.correct_band() {
                Some(band) if rng.chance(AUTOPILOT_ACCURACY) => Some(band),
                _ => rng.choose(&bands).copied(),
            };
            pick.map(FrameInput::answer).unwrap_or_default()
        }
        Screen::Feedback | Screen::GameOver | Screen::Results => FrameInput::idle(),
    }
}
