use crate::model::answer::{AnswerSheet, AnswerValue};
use crate::model::ids::QuestionKey;
use crate::model::quiz::Quiz;
use crate::model::score::{AnswerStatus, ScoreResult};

/// Percentage of all questions answered correctly. Zero for an empty quiz.
#[must_use]
pub fn accuracy(correct: u32, total_questions: u32) -> f64 {
    if total_questions == 0 {
        return 0.0;
    }
    f64::from(correct) / f64::from(total_questions) * 100.0
}

//
// ─── RESULT SUMMARY ───────────────────────────────────────────────────────────
//

/// Final outcome of an attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultSummary {
    score: ScoreResult,
    total_questions: u32,
    accuracy: f64,
    time_spent_secs: u32,
}

impl ResultSummary {
    /// Derives the summary from a score and the countdown state at finalization.
    ///
    /// Time spent is the limit minus what was left, clamped to `[0, limit]`.
    #[must_use]
    pub fn new(
        score: ScoreResult,
        total_questions: usize,
        time_limit_secs: u32,
        remaining_secs: i64,
    ) -> Self {
        let total_questions = u32::try_from(total_questions).unwrap_or(u32::MAX);
        let remaining = u32::try_from(remaining_secs.max(0)).unwrap_or(u32::MAX);
        Self {
            score,
            total_questions,
            accuracy: accuracy(score.correct, total_questions),
            time_spent_secs: time_limit_secs.saturating_sub(remaining),
        }
    }

    /// Scores `answers` against `quiz` and derives the summary in one step.
    #[must_use]
    pub fn from_answers(
        quiz: &Quiz,
        answers: &AnswerSheet,
        time_limit_secs: u32,
        remaining_secs: i64,
    ) -> Self {
        Self::new(
            ScoreResult::compute(quiz, answers),
            quiz.total_questions(),
            time_limit_secs,
            remaining_secs,
        )
    }

    #[must_use]
    pub fn score(&self) -> ScoreResult {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Accuracy rounded half-up to a whole percent, as shown on the results panel.
    #[must_use]
    pub fn rounded_accuracy(&self) -> f64 {
        (self.accuracy + 0.5).floor()
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn not_attempted(&self) -> u32 {
        self.total_questions.saturating_sub(self.score.attempted())
    }
}

//
// ─── DETAILED ANALYSIS ────────────────────────────────────────────────────────
//

/// One row of the question-wise breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionReview {
    pub key: QuestionKey,
    pub label: String,
    /// `None` when the question was not attempted.
    pub your_answer: Option<AnswerValue>,
    pub correct_answer: AnswerValue,
    pub status: AnswerStatus,
}

/// Question-wise breakdown shown after completion.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailedAnalysis {
    pub correct: u32,
    pub total_questions: u32,
    pub accuracy: f64,
    pub minutes_taken: f64,
    pub rows: Vec<QuestionReview>,
}

impl DetailedAnalysis {
    /// Projects every question against the answers in declared order.
    ///
    /// Header figures come from `summary` rather than re-scoring.
    #[must_use]
    pub fn build(quiz: &Quiz, answers: &AnswerSheet, summary: &ResultSummary) -> Self {
        let rows = quiz
            .keyed_questions()
            .enumerate()
            .map(|(index, (key, question))| {
                let your_answer = answers.attempted(&key).cloned();
                let status = AnswerStatus::grade(question, your_answer.as_ref());
                QuestionReview {
                    label: question.label(index),
                    key,
                    your_answer,
                    correct_answer: question.correct_answer().clone(),
                    status,
                }
            })
            .collect();

        Self {
            correct: summary.score().correct,
            total_questions: summary.total_questions(),
            accuracy: summary.accuracy(),
            minutes_taken: f64::from(summary.time_spent_secs()) / 60.0,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::QuizId;
    use crate::model::quiz::{Question, QuizType};

    fn quiz() -> Quiz {
        Quiz::new(
            QuizId::new("abc"),
            "ABC",
            QuizType::General,
            Some(20),
            vec![
                Question::new(Some("q1".into()), Some("First".into()), "A"),
                Question::new(Some("q2".into()), None, "B"),
                Question::new(Some("q3".into()), None, "C"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn accuracy_of_empty_quiz_is_zero() {
        assert_eq!(accuracy(0, 0), 0.0);
    }

    #[test]
    fn accuracy_is_share_of_all_questions() {
        let quiz = quiz();
        let mut answers = AnswerSheet::new();
        answers.record(QuestionKey::new("q1"), "A".into());
        answers.record(QuestionKey::new("q2"), "X".into());

        let summary = ResultSummary::from_answers(&quiz, &answers, 1200, 900);
        assert!((summary.accuracy() - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.rounded_accuracy(), 33.0);
        assert_eq!(summary.time_spent_secs(), 300);
        assert_eq!(summary.not_attempted(), 1);
    }

    #[test]
    fn all_correct_is_full_accuracy() {
        let quiz = quiz();
        let mut answers = AnswerSheet::new();
        for (key, answer) in [("q1", "A"), ("q2", "B"), ("q3", "C")] {
            answers.record(QuestionKey::new(key), answer.into());
        }
        let summary = ResultSummary::from_answers(&quiz, &answers, 60, 0);
        assert_eq!(summary.accuracy(), 100.0);
        assert_eq!(summary.score().score, 12.0);
    }

    #[test]
    fn time_spent_is_clamped() {
        let summary = ResultSummary::new(ScoreResult::default(), 0, 60, -5);
        assert_eq!(summary.time_spent_secs(), 60);
        let summary = ResultSummary::new(ScoreResult::default(), 0, 60, 600);
        assert_eq!(summary.time_spent_secs(), 0);
    }

    #[test]
    fn analysis_rows_follow_scoring_rule() {
        let quiz = quiz();
        let mut answers = AnswerSheet::new();
        answers.record(QuestionKey::new("q1"), "A".into());
        answers.record(QuestionKey::new("q2"), "X".into());
        answers.clear(QuestionKey::new("q3"));

        let summary = ResultSummary::from_answers(&quiz, &answers, 1200, 1110);
        let analysis = DetailedAnalysis::build(&quiz, &answers, &summary);

        let statuses: Vec<_> = analysis.rows.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                AnswerStatus::Correct,
                AnswerStatus::Wrong,
                AnswerStatus::NotAttempted
            ]
        );
        assert_eq!(analysis.rows[0].label, "First");
        assert_eq!(analysis.rows[1].label, "Question 2");
        assert_eq!(analysis.rows[2].your_answer, None);
        assert_eq!(analysis.correct, summary.score().correct);
        assert!((analysis.minutes_taken - 1.5).abs() < 1e-9);
    }
}
