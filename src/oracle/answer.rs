//! Typed answers of each decision and the checks run against them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// A rejected answer together with the diagnostic sent back to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub message: String,
}

impl Violation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Semantic check of an answer; `Err` asks the model again.
pub type Check<'a, T> = &'a dyn Fn(&T) -> Result<(), Violation>;

/// Accepts every answer.
pub fn accept_any<T>(_: &T) -> Result<(), Violation> {
    Ok(())
}

/// Outcome of one decision with the model's justification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision<T> {
    pub value: T,
    pub reason: String,
}

impl<T> Decision<T> {
    pub fn new(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileNamesAnswer {
    pub thoughts: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub files: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChooseAnswer {
    pub choose_list: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextFileAnswer {
    /// `null` once nothing relevant is left
    #[serde(deserialize_with = "required_nullable")]
    pub file: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreAnswer {
    #[serde(deserialize_with = "lenient_int")]
    pub score: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JudgeAnswer {
    #[serde(deserialize_with = "lenient_bool")]
    pub relevant: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnippetAnswer {
    /// `-1` in either bound ends the search
    #[serde(deserialize_with = "lenient_int")]
    pub start_line: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub end_line: i64,
    pub reason: String,
}

impl SnippetAnswer {
    pub fn is_stop(&self) -> bool {
        self.start_line == -1 || self.end_line == -1
    }
}

/// Relevance scores are integers in `0..=3`.
pub const MAX_SCORE: i64 = 3;

pub fn check_score_range(answer: &ScoreAnswer) -> Result<(), Violation> {
    if (0..=MAX_SCORE).contains(&answer.score) {
        Ok(())
    } else {
        Err(Violation::new(super::prompts::invalid_score(answer.score)))
    }
}

fn required_nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Integers, integral floats and numeric strings.
fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| D::Error::custom(format!("expected an integer, found {value}")))
}

/// Booleans, or strings/numbers read the way people write them.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "y" | "yes" | "1"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Null => false,
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_numbers() {
        let answer: SnippetAnswer =
            serde_json::from_value(json!({"start_line": "12", "end_line": 20.0, "reason": "r"})).unwrap();
        assert_eq!((answer.start_line, answer.end_line), (12, 20));
        assert!(!answer.is_stop());

        let answer: SnippetAnswer =
            serde_json::from_value(json!({"start_line": -1, "end_line": "-1", "reason": ""})).unwrap();
        assert!(answer.is_stop());

        assert!(serde_json::from_value::<ScoreAnswer>(json!({"score": "high", "reason": ""})).is_err());
    }

    #[test]
    fn test_lenient_bool() {
        for (raw, expected) in [(json!(true), true), (json!("Yes"), true), (json!("no"), false), (json!(0), false)] {
            let answer: JudgeAnswer = serde_json::from_value(json!({"relevant": raw, "reason": ""})).unwrap();
            assert_eq!(answer.relevant, expected);
        }
    }

    #[test]
    fn test_nullable_file_must_be_present() {
        let answer: NextFileAnswer = serde_json::from_value(json!({"file": null, "reason": "done"})).unwrap();
        assert_eq!(answer.file, None);
        assert!(serde_json::from_value::<NextFileAnswer>(json!({"reason": "done"})).is_err());
    }

    #[test]
    fn test_score_range() {
        let answer = |score| ScoreAnswer {
            score,
            reason: String::new(),
        };
        assert!(check_score_range(&answer(0)).is_ok());
        assert!(check_score_range(&answer(3)).is_ok());
        assert!(check_score_range(&answer(4)).is_err());
        assert!(check_score_range(&answer(-1)).is_err());
    }

    #[test]
    fn test_file_names_null_list() {
        let answer: FileNamesAnswer =
            serde_json::from_value(json!({"thoughts": "t", "files": null, "reason": "r"})).unwrap();
        assert!(answer.files.is_empty());
    }
}
