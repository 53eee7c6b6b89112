//! Game Events
//!
//! Records pushed by the engine on every state change. The presentation
//! layer drains them each frame; the replay check compares them.

use serde::{Serialize, Deserialize};

use crate::game::question::AnswerBand;
use crate::game::state::GamePhase;

/// What happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEventData {
    /// An obstacle was passed without a question being triggered.
    ObstaclePassed {
        obstacles_passed: u32,
    },

    /// Distance flown without a question being triggered.
    DistanceFlown {
        distance_travelled: u32,
    },

    /// A question is now on screen.
    QuestionTriggered {
        question_index: usize,
    },

    /// An answer was resolved.
    AnswerResolved {
        question_index: usize,
        correct: bool,
        /// Band of the submitted text, if it was one of the candidates.
        band: Option<AnswerBand>,
        score: u32,
        lives: u32,
    },

    /// An obstacle hit cost a life.
    LifeLost {
        lives: u32,
    },

    /// Invulnerability switched on or off.
    InvulnerabilityChanged {
        active: bool,
    },

    /// Phase transition.
    PhaseChanged {
        old_phase: GamePhase,
        new_phase: GamePhase,
    },
}

/// An event stamped with the engine's operation sequence number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Sequence number of the operation that produced the event.
    pub seq: u64,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(seq: u64, data: GameEventData) -> Self {
        Self { seq, data }
    }

    /// Obstacle passed.
    pub fn obstacle_passed(seq: u64, obstacles_passed: u32) -> Self {
        Self::new(seq, GameEventData::ObstaclePassed { obstacles_passed })
    }

    /// Distance flown.
    pub fn distance_flown(seq: u64, distance_travelled: u32) -> Self {
        Self::new(seq, GameEventData::DistanceFlown { distance_travelled })
    }

    /// Question shown.
    pub fn question_triggered(seq: u64, question_index: usize) -> Self {
        Self::new(seq, GameEventData::QuestionTriggered { question_index })
    }

    /// Answer resolved.
    pub fn answer_resolved(
        seq: u64,
        question_index: usize,
        correct: bool,
        band: Option<AnswerBand>,
        score: u32,
        lives: u32,
    ) -> Self {
        Self::new(
            seq,
            GameEventData::AnswerResolved {
                question_index,
                correct,
                band,
                score,
                lives,
            },
        )
    }

    /// Life lost to an obstacle.
    pub fn life_lost(seq: u64, lives: u32) -> Self {
        Self::new(seq, GameEventData::LifeLost { lives })
    }

    /// Invulnerability toggled.
    pub fn invulnerability_changed(seq: u64, active: bool) -> Self {
        Self::new(seq, GameEventData::InvulnerabilityChanged { active })
    }

    /// Phase changed.
    pub fn phase_changed(seq: u64, old_phase: GamePhase, new_phase: GamePhase) -> Self {
        Self::new(seq, GameEventData::PhaseChanged { old_phase, new_phase })
    }

    /// Is this the transition into a terminal phase?
    pub fn is_terminal_transition(&self) -> bool {
        matches!(
            self.data,
            GameEventData::PhaseChanged { new_phase, .. } if new_phase.is_terminal()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_transition_detection() {
        let over = GameEvent::phase_changed(3, GamePhase::Playing, GamePhase::GameOver);
        let done = GameEvent::phase_changed(4, GamePhase::QuestionActive, GamePhase::Results);
        let ask = GameEvent::phase_changed(5, GamePhase::Playing, GamePhase::QuestionActive);

        assert!(over.is_terminal_transition());
        assert!(done.is_terminal_transition());
        assert!(!ask.is_terminal_transition());
        assert!(!GameEvent::life_lost(6, 2).is_terminal_transition());
    }

    #[test]
    fn test_event_json_shape() {
        let event = GameEvent::answer_resolved(7, 1, true, Some(AnswerBand::C), 20, 3);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["seq"], 7);
        assert_eq!(json["data"]["type"], "answer_resolved");
        assert_eq!(json["data"]["band"], "C");
        assert_eq!(json["data"]["score"], 20);
    }
}
