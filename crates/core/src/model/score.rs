use crate::model::answer::{AnswerSheet, AnswerValue};
use crate::model::quiz::{Question, Quiz};

/// Outcome of one question at scoring time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerStatus {
    Correct,
    Wrong,
    NotAttempted,
}

impl AnswerStatus {
    /// Grades a single answer with the loose equality rule.
    ///
    /// `None` (and a `Null` answer) is not attempted, whatever the correct
    /// answer is.
    #[must_use]
    pub fn grade(question: &Question, answer: Option<&AnswerValue>) -> Self {
        match answer {
            None | Some(AnswerValue::Null) => Self::NotAttempted,
            Some(value) if value.loose_eq(question.correct_answer()) => Self::Correct,
            Some(_) => Self::Wrong,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Wrong => "wrong",
            Self::NotAttempted => "not-attempted",
        }
    }
}

/// Score of a set of answers against a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreResult {
    pub score: f64,
    pub correct: u32,
    pub wrong: u32,
}

impl ScoreResult {
    /// Scores every question in declared order.
    ///
    /// Correct answers add the question's points, wrong attempts subtract its
    /// negative points, and unanswered questions contribute nothing.
    #[must_use]
    pub fn compute(quiz: &Quiz, answers: &AnswerSheet) -> Self {
        let mut result = Self::default();
        for (key, question) in quiz.keyed_questions() {
            result.apply(question, AnswerStatus::grade(question, answers.attempted(&key)));
        }
        result
    }

    fn apply(&mut self, question: &Question, status: AnswerStatus) {
        match status {
            AnswerStatus::Correct => {
                self.correct = self.correct.saturating_add(1);
                self.score += question.points();
            }
            AnswerStatus::Wrong => {
                self.wrong = self.wrong.saturating_add(1);
                self.score -= question.negative_points();
            }
            AnswerStatus::NotAttempted => {}
        }
    }

    /// Number of graded attempts.
    #[must_use]
    pub fn attempted(&self) -> u32 {
        self.correct.saturating_add(self.wrong)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::{QuestionKey, QuizId};
    use crate::model::quiz::QuizType;
    use proptest::prelude::*;

    fn abc_quiz() -> Quiz {
        let questions = ["A", "B", "C"]
            .iter()
            .enumerate()
            .map(|(i, answer)| Question::new(Some(format!("q{}", i + 1)), None, *answer))
            .collect();
        Quiz::new(QuizId::new("abc"), "ABC", QuizType::General, None, questions).unwrap()
    }

    #[test]
    fn mixed_answers_apply_negative_marking() {
        let quiz = abc_quiz();
        let mut answers = AnswerSheet::new();
        answers.record(QuestionKey::new("q1"), "A".into());
        answers.record(QuestionKey::new("q2"), "X".into());

        let result = ScoreResult::compute(&quiz, &answers);
        assert_eq!(result.correct, 1);
        assert_eq!(result.wrong, 1);
        assert_eq!(result.score, 3.0);
    }

    #[test]
    fn unanswered_counts_in_neither_tally() {
        let quiz = abc_quiz();
        let result = ScoreResult::compute(&quiz, &AnswerSheet::new());
        assert_eq!(result, ScoreResult::default());
    }

    #[test]
    fn numeric_answer_matches_textual_correct_answer() {
        let quiz = Quiz::new(
            QuizId::new("num"),
            "Numbers",
            QuizType::Calculation,
            None,
            vec![Question::new(None, None, "5")],
        )
        .unwrap();
        let mut answers = AnswerSheet::new();
        answers.record(QuestionKey::positional(0), AnswerValue::from(5_i64));

        let result = ScoreResult::compute(&quiz, &answers);
        assert_eq!(result.correct, 1);
        assert_eq!(result.score, 4.0);
    }

    #[test]
    fn null_correct_answer_never_scores_unanswered() {
        let quiz = Quiz::new(
            QuizId::new("n"),
            "Null",
            QuizType::General,
            None,
            vec![Question::new(None, None, AnswerValue::Null)],
        )
        .unwrap();
        let result = ScoreResult::compute(&quiz, &AnswerSheet::new());
        assert_eq!(result.correct, 0);
        assert_eq!(result.wrong, 0);
    }

    #[test]
    fn custom_points_are_used() {
        let quiz = Quiz::new(
            QuizId::new("p"),
            "Points",
            QuizType::MockTest,
            None,
            vec![
                Question::new(None, None, "A").with_points(Some(2.0)),
                Question::new(None, None, "B").with_negative_points(Some(0.25)),
            ],
        )
        .unwrap();
        let mut answers = AnswerSheet::new();
        answers.record(QuestionKey::positional(0), "A".into());
        answers.record(QuestionKey::positional(1), "C".into());

        let result = ScoreResult::compute(&quiz, &answers);
        assert_eq!(result.score, 1.75);
    }

    proptest! {
        #[test]
        fn tallies_match_attempts(picks in proptest::collection::vec(0_u8..3, 0..40)) {
            // 0 = skip, 1 = correct, 2 = wrong
            let questions: Vec<Question> = picks
                .iter()
                .map(|_| Question::new(None, None, "ok"))
                .collect();
            let total = questions.len();
            let quiz = Quiz::new(QuizId::new("p"), "P", QuizType::General, None, questions).unwrap();

            let mut answers = AnswerSheet::new();
            for (i, pick) in picks.iter().enumerate() {
                match pick {
                    1 => answers.record(QuestionKey::positional(i), "ok".into()),
                    2 => answers.record(QuestionKey::positional(i), "nope".into()),
                    _ => {}
                }
            }

            let first = ScoreResult::compute(&quiz, &answers);
            let second = ScoreResult::compute(&quiz, &answers);
            prop_assert_eq!(first, second);
            prop_assert_eq!(first.attempted() as usize, answers.attempted_count());
            prop_assert!(first.correct as usize <= total);
            prop_assert!(first.wrong as usize <= total);
        }
    }
}
