//! Question Records
//!
//! Immutable multiple-choice questions and the bank they are loaded from.
//! Field names on the wire follow the question JSON used by the quiz pages
//! (`question`, `answers`, `correctAnswer`).

use std::fmt;
use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Minimum number of candidate answers per question.
pub const MIN_ANSWERS: usize = 3;

/// Maximum number of candidate answers per question (bands A-D).
pub const MAX_ANSWERS: usize = 4;

static BUILTIN_QUESTIONS: &str = include_str!("../../assets/questions.json");

/// Question validation and loading errors.
#[derive(Debug, Error)]
pub enum QuestionError {
    /// Prompt text is empty.
    #[error("question prompt is empty")]
    EmptyPrompt,

    /// Wrong number of candidate answers.
    #[error("expected 3 to 4 answers, got {0}")]
    AnswerCount(usize),

    /// Correct answer is not one of the candidates.
    #[error("correct answer {0:?} is not among the candidates")]
    CorrectAnswerMissing(String),

    /// Bank file could not be read.
    #[error("failed to read question bank: {0}")]
    Io(#[from] std::io::Error),

    /// Bank JSON is malformed (or a record failed validation).
    #[error("invalid question bank: {0}")]
    Json(#[from] serde_json::Error),
}

/// Display band of a candidate answer.
///
/// Candidate order is significant: the first answer is shown in band A.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AnswerBand {
    /// First candidate
    A = 0,
    /// Second candidate
    B = 1,
    /// Third candidate
    C = 2,
    /// Fourth candidate
    D = 3,
}

impl AnswerBand {
    /// All bands in display order.
    pub const ALL: [AnswerBand; MAX_ANSWERS] = [AnswerBand::A, AnswerBand::B, AnswerBand::C, AnswerBand::D];

    /// Band for a candidate index.
    pub fn from_index(index: usize) -> Option<AnswerBand> {
        Self::ALL.get(index).copied()
    }

    /// Candidate index of this band.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display letter.
    pub fn letter(self) -> char {
        (b'A' + self as u8) as char
    }
}

impl fmt::Display for AnswerBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Raw record as it appears in the JSON bank, before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    question: String,
    answers: Vec<String>,
    correct_answer: String,
}

impl TryFrom<RawQuestion> for Question {
    type Error = QuestionError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        Question::new(raw.question, raw.answers, raw.correct_answer)
    }
}

/// One multiple-choice question.
///
/// `correct_answer` equals one of `answers` by value. Answers are compared
/// by text, never by index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawQuestion")]
pub struct Question {
    question: String,
    answers: Vec<String>,
    correct_answer: String,
}

impl Question {
    /// Build a validated question.
    pub fn new(
        question: impl Into<String>,
        answers: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let question = question.into();
        let correct_answer = correct_answer.into();

        if question.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if !(MIN_ANSWERS..=MAX_ANSWERS).contains(&answers.len()) {
            return Err(QuestionError::AnswerCount(answers.len()));
        }
        if !answers.iter().any(|a| *a == correct_answer) {
            return Err(QuestionError::CorrectAnswerMissing(correct_answer));
        }

        Ok(Self { question, answers, correct_answer })
    }

    /// Prompt text.
    pub fn prompt(&self) -> &str {
        &self.question
    }

    /// Candidate answers in display order.
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// The correct answer text.
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// Exact value match against the correct answer.
    #[inline]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }

    /// Answer text shown in a band, if the question has that many candidates.
    pub fn answer_in_band(&self, band: AnswerBand) -> Option<&str> {
        self.answers.get(band.index()).map(String::as_str)
    }

    /// Band the correct answer is displayed in.
    pub fn correct_band(&self) -> Option<AnswerBand> {
        self.answers
            .iter()
            .position(|a| *a == self.correct_answer)
            .and_then(AnswerBand::from_index)
    }

    /// Iterate `(band, answer)` pairs in display order.
    pub fn bands(&self) -> impl Iterator<Item = (AnswerBand, &str)> {
        AnswerBand::ALL.into_iter().zip(self.answers.iter().map(String::as_str))
    }
}

/// Ordered list of questions for one play-through.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Wrap an already-validated list.
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Parse a JSON array of question records.
    pub fn from_json_str(json: &str) -> Result<Self, QuestionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON bank file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, QuestionError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The bank compiled into the crate.
    pub fn builtin() -> Result<Self, QuestionError> {
        Self::from_json_str(BUILTIN_QUESTIONS)
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Is the bank empty?
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Question at an index.
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Borrow the list.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Take the list out.
    pub fn into_questions(self) -> Vec<Question> {
        self.questions
    }
}

impl From<Vec<Question>> for QuestionBank {
    fn from(questions: Vec<Question>) -> Self {
        Self::new(questions)
    }
}
