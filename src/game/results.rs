//! Results Record
//!
//! The summary handed to the results screen at the end of a session, and
//! the sinks that carry it there. Field names and the pass rule are a
//! fixed contract with downstream readers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::config::PASS_PERCENTAGE;

/// Final summary of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Results {
    /// Final score.
    pub score: u32,
    /// Questions actually reached (the question cursor), not the bank size.
    pub total_questions: u32,
    /// Correct answers.
    pub correct_answers: u32,
    /// Wrong answers plus obstacle hits.
    pub wrong_answers: u32,
    /// Starting lives minus remaining lives.
    pub lives_used: u32,
    /// Rounded accuracy, 0 when no question was reached.
    pub percentage: u32,
    /// `percentage >= 70`.
    pub passed: bool,
}

impl Results {
    /// Build results from raw counters.
    pub fn compute(
        score: u32,
        total_questions: u32,
        correct_answers: u32,
        wrong_answers: u32,
        lives_used: u32,
    ) -> Self {
        let percentage = percentage(correct_answers, total_questions);
        Self {
            score,
            total_questions,
            correct_answers,
            wrong_answers,
            lives_used,
            percentage,
            passed: is_passing(percentage),
        }
    }

    /// Performance band shown on the results screen.
    pub fn grade(&self) -> Grade {
        Grade::for_percentage(self.percentage)
    }
}

/// `round(100 * correct / total)`, half away from zero, 0 when `total == 0`.
pub fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let correct = correct as u64;
    let total = total as u64;
    ((200 * correct + total) / (2 * total)) as u32
}

/// The fixed pass rule.
#[inline]
pub fn is_passing(percentage: u32) -> bool {
    percentage >= PASS_PERCENTAGE
}

/// Results-screen performance band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    /// Below 50%
    KeepPracticing,
    /// 50-69%
    GoodEffort,
    /// 70-79%
    GreatJob,
    /// 80-89%
    Excellent,
    /// 90% and up
    Outstanding,
}

impl Grade {
    /// Band for a percentage.
    pub fn for_percentage(percentage: u32) -> Grade {
        match percentage {
            90.. => Grade::Outstanding,
            80..=89 => Grade::Excellent,
            70..=79 => Grade::GreatJob,
            50..=69 => Grade::GoodEffort,
            _ => Grade::KeepPracticing,
        }
    }

    /// Headline text.
    pub fn message(self) -> &'static str {
        match self {
            Grade::Outstanding => "Outstanding!",
            Grade::Excellent => "Excellent!",
            Grade::GreatJob => "Great Job!",
            Grade::GoodEffort => "Good Effort!",
            Grade::KeepPracticing => "Keep Practicing!",
        }
    }
}

// =============================================================================
// SINKS
// =============================================================================

/// Results hand-off errors.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Write failed.
    #[error("failed to write results: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding failed.
    #[error("failed to encode results: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Receiver of the final results.
///
/// Publishing is fire-and-forget from the engine's point of view: the
/// runner logs a failure and carries on.
pub trait ResultsSink: Send {
    /// Hand the results over.
    fn publish(&mut self, results: &Results) -> Result<(), SinkError>;
}

/// Writes results as JSON to a file, replacing any previous contents.
///
/// The file holds the bare [`Results`] record so a results view can read
/// `percentage` and the other fields from the top level.
#[derive(Clone, Debug)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Sink writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back stored results.
    pub fn load(path: impl AsRef<Path>) -> Result<Results, SinkError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl ResultsSink for JsonFileSink {
    fn publish(&mut self, results: &Results) -> Result<(), SinkError> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, results)?;
        writer.flush()?;

        let saved_at: DateTime<Utc> = Utc::now();
        tracing::debug!(path = %self.path.display(), saved_at = %saved_at.to_rfc3339(), "results saved");
        Ok(())
    }
}

/// Keeps published results in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    published: Vec<Results>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far.
    pub fn published(&self) -> &[Results] {
        &self.published
    }

    /// Most recent results.
    pub fn last(&self) -> Option<&Results> {
        self.published.last()
    }
}

impl ResultsSink for MemorySink {
    fn publish(&mut self, results: &Results) -> Result<(), SinkError> {
        self.published.push(*results);
        Ok(())
    }
}

/// Discards results.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ResultsSink for NullSink {
    fn publish(&mut self, _results: &Results) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_guard_and_rounding() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 0), 0);
        assert_eq!(percentage(7, 10), 70);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        // 0.5 rounds up
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(3, 3), 100);
    }

    #[test]
    fn test_pass_boundary() {
        for (pct, passed) in [(0, false), (69, false), (70, true), (71, true), (100, true)] {
            assert_eq!(is_passing(pct), passed, "percentage {}", pct);
        }
    }

    #[test]
    fn test_compute_fills_derived_fields() {
        let results = Results::compute(70, 10, 7, 3, 1);
        assert_eq!(results.percentage, 70);
        assert!(results.passed);
        assert_eq!(results.grade(), Grade::GreatJob);

        let empty = Results::compute(0, 0, 0, 3, 3);
        assert_eq!(empty.percentage, 0);
        assert!(!empty.passed);
    }

    #[test]
    fn test_grades() {
        assert_eq!(Grade::for_percentage(100), Grade::Outstanding);
        assert_eq!(Grade::for_percentage(90), Grade::Outstanding);
        assert_eq!(Grade::for_percentage(89), Grade::Excellent);
        assert_eq!(Grade::for_percentage(70), Grade::GreatJob);
        assert_eq!(Grade::for_percentage(50), Grade::GoodEffort);
        assert_eq!(Grade::for_percentage(49), Grade::KeepPracticing);
        assert_eq!(Grade::Excellent.message(), "Excellent!");
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(Results::compute(70, 10, 7, 3, 1)).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();

        assert_eq!(
            keys,
            vec![
                "correctAnswers",
                "livesUsed",
                "passed",
                "percentage",
                "score",
                "totalQuestions",
                "wrongAnswers",
            ]
        );
    }

    #[test]
    fn test_json_file_sink_writes_bare_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let mut sink = JsonFileSink::new(&path);
        let results = Results::compute(70, 10, 7, 3, 1);

        sink.publish(&results).unwrap();
        assert_eq!(JsonFileSink::load(&path).unwrap(), results);

        let raw = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 7);
        assert_eq!(json["percentage"], 70);
        assert_eq!(json["passed"], true);
        assert_eq!(json["totalQuestions"], 10);
        assert!(object.get("results").is_none());
        assert!(object.get("savedAt").is_none());
    }

    #[test]
    fn test_json_file_sink_reports_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonFileSink::new(dir.path().join("missing").join("results.json"));
        let err = sink.publish(&Results::compute(0, 0, 0, 0, 0)).unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        assert!(sink.last().is_none());
        sink.publish(&Results::compute(10, 1, 1, 0, 0)).unwrap();
        assert_eq!(sink.published().len(), 1);
        assert_eq!(sink.last().unwrap().score, 10);
    }
}
