//! Per-quiz-type question layouts.

use quiz_core::model::{Question, Quiz, QuizType};

/// How a quiz's questions are laid out in the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presenter {
    /// Worked arithmetic: compact numbered prompts, numeric answers expected.
    Calculation,
    /// General-subject sets: one question per block with room for a text answer.
    GeneralSubject,
    /// Full mock tests: section header and marking scheme up front.
    MockTest,
    General,
}

impl Presenter {
    #[must_use]
    pub fn for_type(quiz_type: QuizType) -> Self {
        match quiz_type {
            QuizType::Calculation => Self::Calculation,
            QuizType::GeneralSubject => Self::GeneralSubject,
            QuizType::MockTest => Self::MockTest,
            QuizType::General => Self::General,
        }
    }

    #[must_use]
    pub fn heading(self, quiz: &Quiz, minutes: u32) -> String {
        let count = quiz.total_questions();
        match self {
            Self::Calculation => format!(
                "== {} ==\n{count} calculations, {minutes} min. Answer with numbers.",
                quiz.title()
            ),
            Self::GeneralSubject => format!(
                "== {} (General Studies) ==\n{count} questions, {minutes} min.",
                quiz.title()
            ),
            Self::MockTest => {
                let max: f64 = quiz.questions().iter().map(Question::points).sum();
                format!(
                    "== MOCK TEST: {} ==\n{count} questions | {minutes} min | maximum {max} marks\nWrong answers carry negative marks.",
                    quiz.title()
                )
            }
            Self::General => format!("== {} ==\n{count} questions, {minutes} min.", quiz.title()),
        }
    }

    /// One question as shown to the user. `index` is zero-based.
    #[must_use]
    pub fn question(self, index: usize, question: &Question) -> String {
        let number = index + 1;
        let text = question.text().unwrap_or("(no text)");
        match self {
            Self::Calculation => format!("{number:>3}. {text}  = ?"),
            Self::GeneralSubject => format!("Q{number}. {text}\n     Your answer:"),
            Self::MockTest => format!(
                "Q{number}. {text}  [+{} / -{}]",
                question.points(),
                question.negative_points()
            ),
            Self::General => format!("{number}. {text}"),
        }
    }

    /// Full question sheet: heading, every question in order, input help.
    #[must_use]
    pub fn render(self, quiz: &Quiz, minutes: u32) -> String {
        let mut out = self.heading(quiz, minutes);
        out.push_str("\n\n");
        for (index, question) in quiz.questions().iter().enumerate() {
            out.push_str(&self.question(index, question));
            out.push('\n');
        }
        out.push('\n');
        out.push_str(INPUT_HELP);
        out
    }
}

pub const INPUT_HELP: &str = "Type `<number> <answer>` to answer, `<number>` to clear, `:end` to submit, `:restart` to start over.";
