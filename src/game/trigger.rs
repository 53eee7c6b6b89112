//! Question Trigger Policies
//!
//! Decides when a run of obstacles turns into a question. The session keeps
//! the counters; a trigger is a pure predicate over them, so pacing can be
//! swapped without touching the state machine.

use crate::game::config::TriggerPolicy;

/// Progress accumulated since the last question (or session start).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriggerProgress {
    /// Obstacles passed since the last question.
    pub obstacles: u32,
    /// Distance units flown since the last question.
    pub distance: u32,
}

/// "Should a question be asked now?"
pub trait QuestionTrigger: Send + Sync {
    /// Evaluate after every progress update.
    fn should_trigger(&self, progress: &TriggerProgress) -> bool;
}

impl QuestionTrigger for TriggerPolicy {
    fn should_trigger(&self, progress: &TriggerProgress) -> bool {
        match *self {
            TriggerPolicy::ObstacleCount(threshold) => progress.obstacles >= threshold.max(1),
            TriggerPolicy::Distance(interval) => progress.distance >= interval.max(1),
        }
    }
}

impl<F> QuestionTrigger for F
where
    F: Fn(&TriggerProgress) -> bool + Send + Sync,
{
    fn should_trigger(&self, progress: &TriggerProgress) -> bool {
        self(progress)
    }
}
