use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::model::ids::QuestionKey;

//
// ─── ANSWER VALUE ─────────────────────────────────────────────────────────────
//

/// A loosely typed answer as it appears in quiz documents and user input.
///
/// Quiz documents store correct answers as whatever JSON scalar the author
/// typed (`5`, `"5"`, `true`, `"B"`), and user input arrives as text. Values
/// are compared with [`AnswerValue::loose_eq`], never with `==`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum AnswerValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AnswerValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, AnswerValue::Null)
    }

    /// Coercing equality used for scoring.
    ///
    /// `Null` only equals `Null`. Two texts compare exactly, two booleans
    /// compare exactly, every other pairing compares numerically after
    /// coercion (`5 == "5"`, `" 5 " == 5`, `true == 1`, `"" == 0`). A text
    /// that is not numeric never equals a number.
    ///
    /// Stored results were scored with this rule, so it must not be
    /// tightened to strict equality.
    #[must_use]
    pub fn loose_eq(&self, other: &AnswerValue) -> bool {
        match (self, other) {
            (AnswerValue::Null, AnswerValue::Null) => true,
            (AnswerValue::Null, _) | (_, AnswerValue::Null) => false,
            (AnswerValue::Text(a), AnswerValue::Text(b)) => a == b,
            (AnswerValue::Bool(a), AnswerValue::Bool(b)) => a == b,
            _ => match (self.coerce_number(), other.coerce_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    fn coerce_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Null => None,
            AnswerValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            AnswerValue::Number(n) => Some(*n),
            AnswerValue::Text(s) => Some(text_to_number(s)),
        }
    }
}

/// Numeric reading of a text, `NaN` when it is not a number.
fn text_to_number(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }

    let (sign, unsigned) = match s.as_bytes()[0] {
        b'-' => (-1.0, &s[1..]),
        b'+' => (1.0, &s[1..]),
        _ => (1.0, s),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        #[allow(clippy::cast_precision_loss)]
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |v| v as f64);
    }

    // Rust's float parser also accepts "inf" and "nan"; restrict to decimal literals.
    let decimal = unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !decimal {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Null => f.write_str("null"),
            AnswerValue::Bool(b) => write!(f, "{b}"),
            AnswerValue::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            AnswerValue::Number(n) => write!(f, "{n}"),
            AnswerValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_owned())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Number(value)
    }
}

impl From<i64> for AnswerValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        AnswerValue::Number(value as f64)
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        AnswerValue::Bool(value)
    }
}

impl<T: Into<AnswerValue>> From<Option<T>> for AnswerValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AnswerValue::Null, Into::into)
    }
}

//
// ─── ANSWER SHEET ─────────────────────────────────────────────────────────────
//

/// The user's in-progress answers, keyed by [`QuestionKey`].
///
/// A key that was never written and a key holding `Null` both mean
/// "not attempted".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerSheet {
    answers: HashMap<QuestionKey, AnswerValue>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an answer, replacing any earlier one for the same question.
    pub fn record(&mut self, key: QuestionKey, value: AnswerValue) {
        self.answers.insert(key, value);
    }

    /// Withdraws an answer. Scores exactly like never answering.
    pub fn clear(&mut self, key: QuestionKey) {
        self.answers.insert(key, AnswerValue::Null);
    }

    /// The attempted answer for `key`, if any.
    #[must_use]
    pub fn attempted(&self, key: &QuestionKey) -> Option<&AnswerValue> {
        self.answers.get(key).filter(|value| !value.is_null())
    }

    /// Number of keys holding a non-null answer.
    #[must_use]
    pub fn attempted_count(&self) -> usize {
        self.answers.values().filter(|value| !value.is_null()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn reset(&mut self) {
        self.answers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_matches_numeric_text() {
        assert!(AnswerValue::from(5_i64).loose_eq(&AnswerValue::from("5")));
        assert!(AnswerValue::from("5").loose_eq(&AnswerValue::from(5_i64)));
        assert!(AnswerValue::from(" 2.50 ").loose_eq(&AnswerValue::from(2.5)));
    }

    #[test]
    fn text_compares_exactly() {
        assert!(AnswerValue::from("B").loose_eq(&AnswerValue::from("B")));
        assert!(!AnswerValue::from("b").loose_eq(&AnswerValue::from("B")));
        assert!(!AnswerValue::from("5.0").loose_eq(&AnswerValue::from("5")));
    }

    #[test]
    fn non_numeric_text_never_equals_number() {
        assert!(!AnswerValue::from("five").loose_eq(&AnswerValue::from(5_i64)));
        assert!(!AnswerValue::from("inf").loose_eq(&AnswerValue::from(f64::INFINITY)));
        assert!(!AnswerValue::from(f64::NAN).loose_eq(&AnswerValue::from(f64::NAN)));
    }

    #[test]
    fn booleans_and_blank_text_coerce() {
        assert!(AnswerValue::from(true).loose_eq(&AnswerValue::from(1_i64)));
        assert!(AnswerValue::from(false).loose_eq(&AnswerValue::from("0")));
        assert!(AnswerValue::from("").loose_eq(&AnswerValue::from(0_i64)));
        assert!(AnswerValue::from("0x1A").loose_eq(&AnswerValue::from(26_i64)));
        assert!(AnswerValue::from("-Infinity").loose_eq(&AnswerValue::from(f64::NEG_INFINITY)));
    }

    #[test]
    fn null_only_equals_null() {
        assert!(AnswerValue::Null.loose_eq(&AnswerValue::Null));
        assert!(!AnswerValue::Null.loose_eq(&AnswerValue::from(0_i64)));
        assert!(!AnswerValue::from("").loose_eq(&AnswerValue::Null));
    }

    #[test]
    fn deserializes_any_json_scalar() {
        let values: Vec<AnswerValue> =
            serde_json::from_str(r#"[null, true, 4, 4.5, "B"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                AnswerValue::Null,
                AnswerValue::Bool(true),
                AnswerValue::Number(4.0),
                AnswerValue::Number(4.5),
                AnswerValue::Text("B".into()),
            ]
        );
    }

    #[test]
    fn displays_like_the_source_document() {
        assert_eq!(AnswerValue::from(5_i64).to_string(), "5");
        assert_eq!(AnswerValue::from(2.5).to_string(), "2.5");
        assert_eq!(AnswerValue::from("B").to_string(), "B");
        assert_eq!(AnswerValue::Null.to_string(), "null");
    }

    #[test]
    fn cleared_answer_counts_as_not_attempted() {
        let key = QuestionKey::new("q1");
        let mut sheet = AnswerSheet::new();
        sheet.record(key.clone(), AnswerValue::from("A"));
        assert_eq!(sheet.attempted_count(), 1);

        sheet.clear(key.clone());
        assert!(sheet.attempted(&key).is_none());
        assert_eq!(sheet.attempted_count(), 0);
        assert!(!sheet.is_empty());
    }

    #[test]
    fn later_answer_overwrites_earlier() {
        let key = QuestionKey::new("q1");
        let mut sheet = AnswerSheet::new();
        sheet.record(key.clone(), AnswerValue::from("A"));
        sheet.record(key.clone(), AnswerValue::from("C"));
        assert_eq!(sheet.attempted(&key), Some(&AnswerValue::from("C")));
    }
}
