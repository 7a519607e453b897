//! Plain-text rendering of the timer, results panel and history.

use std::fmt::Write as _;

use quiz_core::countdown::{format_remaining, is_urgent};
use quiz_core::model::{AnswerStatus, AuthUser, DetailedAnalysis, ResultSummary};
use services::{AuthSnapshot, ResultListItem, SessionErrorKind, SessionObserver};

/// Prints countdown updates, the results panel and save failures.
#[derive(Debug, Default)]
pub struct TerminalObserver;

impl TerminalObserver {
    /// Only some ticks are worth a line: each full minute, then every ten
    /// seconds once time is short, then every second for the last ten.
    #[must_use]
    pub fn should_announce(remaining_secs: i64) -> bool {
        if remaining_secs <= 10 {
            return true;
        }
        if is_urgent(remaining_secs) {
            return remaining_secs % 10 == 0;
        }
        remaining_secs % 60 == 0
    }
}

#[must_use]
pub fn timer_line(remaining_secs: i64) -> String {
    let clock = format_remaining(remaining_secs);
    if is_urgent(remaining_secs) {
        format!("[{clock}] hurry up!")
    } else {
        format!("[{clock}]")
    }
}

impl SessionObserver for TerminalObserver {
    fn on_tick(&self, remaining_secs: i64) {
        if Self::should_announce(remaining_secs) {
            println!("{}", timer_line(remaining_secs));
        }
    }

    fn on_expire(&self) {
        println!("Time's up! Submitting your answers.");
    }

    fn on_scored(&self, summary: &ResultSummary) {
        println!("{}", results_panel(summary));
    }

    fn on_error(&self, kind: SessionErrorKind, message: &str) {
        // Load failures are returned to the caller and reported there.
        if kind == SessionErrorKind::Persistence {
            eprintln!("Your result could not be saved: {message}");
        }
    }
}

/// Correct / wrong / score / accuracy block shown after submission.
#[must_use]
pub fn results_panel(summary: &ResultSummary) -> String {
    let score = summary.score();
    let mut out = String::from("---- Results ----\n");
    let _ = writeln!(out, "Correct answers : {}", score.correct);
    let _ = writeln!(out, "Wrong answers   : {}", score.wrong);
    let _ = writeln!(out, "Not attempted   : {}", summary.not_attempted());
    let _ = writeln!(out, "Total score     : {}", score.score);
    let _ = writeln!(out, "Accuracy        : {}%", summary.rounded_accuracy());
    let _ = write!(
        out,
        "Time taken      : {}",
        format_remaining(i64::from(summary.time_spent_secs()))
    );
    out
}

fn status_label(status: AnswerStatus) -> &'static str {
    match status {
        AnswerStatus::Correct => "correct",
        AnswerStatus::Wrong => "wrong",
        AnswerStatus::NotAttempted => "not attempted",
    }
}

/// Question-wise table: question, your answer, correct answer, status.
#[must_use]
pub fn analysis_table(analysis: &DetailedAnalysis) -> String {
    let mut out = String::from("---- Question-wise analysis ----\n");
    let _ = writeln!(
        out,
        "Correct {} of {} ({:.1}%) in {:.1} min",
        analysis.correct, analysis.total_questions, analysis.accuracy, analysis.minutes_taken
    );
    let width = analysis
        .rows
        .iter()
        .map(|row| row.label.chars().count())
        .max()
        .unwrap_or(0)
        .max("Question".len());
    let _ = writeln!(
        out,
        "{:<width$} | {:<14} | {:<14} | Status",
        "Question", "Your answer", "Correct answer"
    );
    for row in &analysis.rows {
        let yours = row
            .your_answer
            .as_ref()
            .map_or_else(|| "Not attempted".to_owned(), ToString::to_string);
        let _ = writeln!(
            out,
            "{:<width$} | {:<14} | {:<14} | {}",
            row.label,
            yours,
            row.correct_answer.to_string(),
            status_label(row.status)
        );
    }
    out
}

#[must_use]
pub fn history_table(user: &AuthUser, items: &[ResultListItem]) -> String {
    let who = user.display_label().unwrap_or(user.uid.as_str());
    if items.is_empty() {
        return format!("No saved results for {who}.");
    }
    let mut out = format!("Recent results for {who}:\n");
    for item in items {
        let _ = writeln!(
            out,
            "{}  {:<28} {:<16} score {:>6}  {}/{} correct  {:.0}%  {}",
            item.recorded_at.format("%Y-%m-%d %H:%M"),
            item.quiz_title,
            item.quiz_type.as_str(),
            item.score,
            item.correct,
            item.total_questions,
            item.accuracy,
            format_remaining(i64::from(item.time_spent_secs))
        );
    }
    out
}

#[must_use]
pub fn whoami(snapshot: &AuthSnapshot) -> String {
    match &snapshot.user {
        None => "Not signed in.".to_owned(),
        Some(user) => {
            let name = user.display_label().unwrap_or(user.uid.as_str());
            let role = if snapshot.is_admin { "admin" } else { "member" };
            format!("{name} ({}) - {role}", user.uid)
        }
    }
}
