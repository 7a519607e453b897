//! Reading answers from stdin and turning them into session commands.

use std::io::BufRead;

use tokio::sync::mpsc;
use tracing::debug;

use quiz_core::model::{AnswerValue, QuestionKey, QuizId};
use services::SessionCommand;

/// What one input line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(SessionCommand),
    Blank,
    Invalid(String),
}

/// Maps typed lines onto the loaded quiz's answer keys.
#[derive(Debug, Clone)]
pub struct LineParser {
    keys: Vec<QuestionKey>,
    quiz_id: QuizId,
    minutes: u32,
}

impl LineParser {
    #[must_use]
    pub fn new(keys: Vec<QuestionKey>, quiz_id: QuizId, minutes: u32) -> Self {
        Self {
            keys,
            quiz_id,
            minutes,
        }
    }

    /// `<n> <answer>` answers question `n` (1-based), a bare `<n>` clears it,
    /// `:end` submits and `:restart` starts the same quiz over.
    #[must_use]
    pub fn parse(&self, line: &str) -> Input {
        let line = line.trim();
        if line.is_empty() {
            return Input::Blank;
        }
        match line {
            ":end" | ":submit" => return Input::Command(SessionCommand::End),
            ":restart" => {
                return Input::Command(SessionCommand::Restart {
                    quiz_id: self.quiz_id.clone(),
                    time_limit_minutes: self.minutes,
                });
            }
            _ => {}
        }

        let (number, answer) = match line.split_once(char::is_whitespace) {
            Some((number, answer)) => (number, answer.trim()),
            None => (line, ""),
        };
        let Some(key) = number
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| self.keys.get(index))
        else {
            return Input::Invalid(format!(
                "expected a question number between 1 and {}",
                self.keys.len()
            ));
        };

        if answer.is_empty() {
            Input::Command(SessionCommand::Clear { key: key.clone() })
        } else {
            Input::Command(SessionCommand::Answer {
                key: key.clone(),
                value: AnswerValue::from(answer),
            })
        }
    }
}

/// Read stdin on a plain thread and forward commands to the driver.
///
/// A blocking thread is used because a pending stdin read cannot be
/// cancelled; the thread simply dies with the process. End of input submits
/// the attempt.
pub fn spawn_stdin_reader(parser: LineParser, commands: mpsc::Sender<SessionCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parser.parse(&line) {
                Input::Command(command) => {
                    if commands.blocking_send(command).is_err() {
                        // Driver finished.
                        return;
                    }
                }
                Input::Blank => {}
                Input::Invalid(message) => eprintln!("{message}"),
            }
        }
        debug!("stdin closed; submitting attempt");
        let _ = commands.blocking_send(SessionCommand::End);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> LineParser {
        LineParser::new(
            vec![QuestionKey::new("q1"), QuestionKey::new("1")],
            QuizId::new("quiz"),
            15,
        )
    }

    #[test]
    fn answers_by_position() {
        assert_eq!(
            parser().parse("2   forty two "),
            Input::Command(SessionCommand::Answer {
                key: QuestionKey::new("1"),
                value: "forty two".into(),
            })
        );
    }

    #[test]
    fn bare_number_clears() {
        assert_eq!(
            parser().parse("1"),
            Input::Command(SessionCommand::Clear {
                key: QuestionKey::new("q1")
            })
        );
    }

    #[test]
    fn control_words() {
        assert_eq!(parser().parse(":end"), Input::Command(SessionCommand::End));
        assert_eq!(
            parser().parse(":restart"),
            Input::Command(SessionCommand::Restart {
                quiz_id: QuizId::new("quiz"),
                time_limit_minutes: 15,
            })
        );
        assert_eq!(parser().parse("   "), Input::Blank);
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        assert!(matches!(parser().parse("0 a"), Input::Invalid(_)));
        assert!(matches!(parser().parse("3 a"), Input::Invalid(_)));
        assert!(matches!(parser().parse("abc"), Input::Invalid(_)));
    }
}
