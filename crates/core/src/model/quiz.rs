use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::model::answer::AnswerValue;
use crate::model::ids::{QuestionKey, QuizId};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("two questions share the answer key {key}")]
    DuplicateQuestionKey { key: QuestionKey },
}

//
// ─── QUIZ TYPE ────────────────────────────────────────────────────────────────
//

/// Rendering variant of a quiz. Only consumed by presentation dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuizType {
    Calculation,
    GeneralSubject,
    MockTest,
    #[default]
    General,
}

impl QuizType {
    /// Reads a stored type tag. Unknown or missing tags fall back to `General`.
    #[must_use]
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some("calculation") => Self::Calculation,
            Some("gs" | "general-subject") => Self::GeneralSubject,
            Some("mock" | "mock-test") => Self::MockTest,
            _ => Self::General,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Calculation => "calculation",
            Self::GeneralSubject => "general-subject",
            Self::MockTest => "mock-test",
            Self::General => "general",
        }
    }
}

impl fmt::Display for QuizType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// Points awarded for a correct answer when the document gives none.
pub const DEFAULT_POINTS: f64 = 4.0;
/// Points deducted for a wrong attempt when the document gives none.
pub const DEFAULT_NEGATIVE_POINTS: f64 = 1.0;
/// Declared time limit when the document gives none.
pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: Option<String>,
    text: Option<String>,
    correct_answer: AnswerValue,
    points: f64,
    negative_points: f64,
}

impl Question {
    /// Creates a question worth the default points and negative points.
    #[must_use]
    pub fn new(
        id: Option<String>,
        text: Option<String>,
        correct_answer: impl Into<AnswerValue>,
    ) -> Self {
        Self {
            id: id.filter(|id| !id.is_empty()),
            text: text.filter(|text| !text.is_empty()),
            correct_answer: correct_answer.into(),
            points: DEFAULT_POINTS,
            negative_points: DEFAULT_NEGATIVE_POINTS,
        }
    }

    /// Sets the reward. Missing, zero and `NaN` values keep the default,
    /// matching how stored documents have always been scored.
    #[must_use]
    pub fn with_points(mut self, points: Option<f64>) -> Self {
        self.points = or_default(points, DEFAULT_POINTS);
        self
    }

    /// Sets the penalty. Missing, zero and `NaN` values keep the default.
    #[must_use]
    pub fn with_negative_points(mut self, negative_points: Option<f64>) -> Self {
        self.negative_points = or_default(negative_points, DEFAULT_NEGATIVE_POINTS);
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    #[must_use]
    pub fn correct_answer(&self) -> &AnswerValue {
        &self.correct_answer
    }

    #[must_use]
    pub fn points(&self) -> f64 {
        self.points
    }

    #[must_use]
    pub fn negative_points(&self) -> f64 {
        self.negative_points
    }

    /// Answer key for this question at position `index`.
    #[must_use]
    pub fn key(&self, index: usize) -> QuestionKey {
        self.id
            .as_deref()
            .map_or_else(|| QuestionKey::positional(index), QuestionKey::new)
    }

    /// Display label: the question text, or `Question N` (1-based).
    #[must_use]
    pub fn label(&self, index: usize) -> String {
        self.text
            .clone()
            .unwrap_or_else(|| format!("Question {}", index + 1))
    }
}

fn or_default(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v != 0.0 && !v.is_nan() => v,
        _ => default,
    }
}

//
// ─── QUIZ ─────────────────────────────────────────────────────────────────────
//

/// A loaded quiz. Read-only for the lifetime of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    id: QuizId,
    title: String,
    quiz_type: QuizType,
    time_limit_minutes: u32,
    questions: Vec<Question>,
}

impl Quiz {
    /// Builds a quiz, rejecting questions whose answer keys collide.
    ///
    /// A missing or zero time limit becomes [`DEFAULT_TIME_LIMIT_MINUTES`].
    ///
    /// # Errors
    ///
    /// Returns `QuizError::DuplicateQuestionKey` if two questions resolve to
    /// the same answer key.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        quiz_type: QuizType,
        time_limit_minutes: Option<u32>,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        let mut seen = HashSet::with_capacity(questions.len());
        for (index, question) in questions.iter().enumerate() {
            let key = question.key(index);
            if !seen.insert(key.clone()) {
                return Err(QuizError::DuplicateQuestionKey { key });
            }
        }

        Ok(Self {
            id,
            title: title.into(),
            quiz_type,
            time_limit_minutes: time_limit_minutes
                .filter(|m| *m > 0)
                .unwrap_or(DEFAULT_TIME_LIMIT_MINUTES),
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn quiz_type(&self) -> QuizType {
        self.quiz_type
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Questions in declared order with their answer keys.
    pub fn keyed_questions(&self) -> impl Iterator<Item = (QuestionKey, &Question)> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, q)| (q.key(index), q))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_falls_back_to_position() {
        let with_id = Question::new(Some("q7".into()), None, "A");
        let without_id = Question::new(None, None, "A");
        let blank_id = Question::new(Some(String::new()), None, "A");

        assert_eq!(with_id.key(0).as_str(), "q7");
        assert_eq!(without_id.key(3).as_str(), "3");
        assert_eq!(blank_id.key(1).as_str(), "1");
    }

    #[test]
    fn label_falls_back_to_one_based_number() {
        let q = Question::new(None, None, "A");
        assert_eq!(q.label(0), "Question 1");
        let q = Question::new(None, Some("2 + 2 = ?".into()), 4_i64);
        assert_eq!(q.label(0), "2 + 2 = ?");
    }

    #[test]
    fn zero_or_missing_points_use_defaults() {
        let q = Question::new(None, None, "A")
            .with_points(Some(0.0))
            .with_negative_points(None);
        assert_eq!(q.points(), DEFAULT_POINTS);
        assert_eq!(q.negative_points(), DEFAULT_NEGATIVE_POINTS);

        let q = Question::new(None, None, "A")
            .with_points(Some(2.0))
            .with_negative_points(Some(0.5));
        assert_eq!(q.points(), 2.0);
        assert_eq!(q.negative_points(), 0.5);
    }

    #[test]
    fn quiz_type_tags() {
        assert_eq!(QuizType::from_tag(Some("calculation")), QuizType::Calculation);
        assert_eq!(QuizType::from_tag(Some("gs")), QuizType::GeneralSubject);
        assert_eq!(QuizType::from_tag(Some("mock-test")), QuizType::MockTest);
        assert_eq!(QuizType::from_tag(Some("reasoning")), QuizType::General);
        assert_eq!(QuizType::from_tag(None), QuizType::General);
        assert_eq!(QuizType::MockTest.to_string(), "mock-test");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        // The second question has no id, so its key is its index "1".
        let questions = vec![
            Question::new(Some("1".into()), None, "A"),
            Question::new(None, None, "B"),
        ];
        let err = Quiz::new(QuizId::new("q"), "Clash", QuizType::General, None, questions)
            .unwrap_err();
        assert_eq!(
            err,
            QuizError::DuplicateQuestionKey {
                key: QuestionKey::new("1")
            }
        );
    }

    #[test]
    fn zero_time_limit_uses_default() {
        let quiz = Quiz::new(QuizId::new("q"), "T", QuizType::General, Some(0), Vec::new()).unwrap();
        assert_eq!(quiz.time_limit_minutes(), DEFAULT_TIME_LIMIT_MINUTES);
    }
}
