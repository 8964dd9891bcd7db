//! Bounded request/response rounds until the model answers in shape.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::answer::Check;
use super::error::{OracleError, OracleResult};
use super::model::{ChatMessage, ChatModel};

fn json_instruction(schema: &str) -> String {
    format!(
        "\
## Response Format ##

Your response MUST be in the following JSON format:

```
{schema}
```

## Your Response ##

"
    )
}

fn retry_instruction(failure: &str, schema: &str) -> String {
    format!(
        "\
**FAILURE**: {failure}.

Your response must strictly follow this JSON format:

```
{schema}
```

Please fix the issues shown above and respond again.

## Your Response ##

"
    )
}

/// Diagnostic appended to the conversation after a rejected reply.
fn diagnostic(error: &OracleError, schema: &str) -> String {
    match error {
        OracleError::SemanticViolation(message) => message.clone(),
        other => retry_instruction(&other.to_string(), schema),
    }
}

/// First JSON object in `reply`; text around it, such as code fences, is ignored.
pub fn extract_json_object(reply: &str) -> OracleResult<Value> {
    let start = reply
        .find('{')
        .ok_or_else(|| OracleError::MalformedAnswer("no JSON object found".to_string()))?;
    let mut stream = serde_json::Deserializer::from_str(&reply[start..]).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) if value.is_object() => Ok(value),
        Some(Ok(_)) | None => Err(OracleError::MalformedAnswer("no JSON object found".to_string())),
        Some(Err(e)) => Err(OracleError::MalformedAnswer(e.to_string())),
    }
}

fn interpret<T: DeserializeOwned>(reply: &str, check: Check<'_, T>) -> OracleResult<T> {
    let value = extract_json_object(reply)?;
    let answer: T = serde_json::from_value(value).map_err(|e| OracleError::SchemaViolation(e.to_string()))?;
    check(&answer).map_err(|violation| OracleError::SemanticViolation(violation.message))?;
    Ok(answer)
}

/// Ask `model` until a reply parses into `T` and passes `check`.
///
/// Every rejected reply is answered with a diagnostic and counts as one
/// round, as does a failed request. Fails with
/// [`OracleError::RoundLimitExceeded`] once `max_rounds` are used up.
pub fn decide<T: DeserializeOwned>(
    model: &dyn ChatModel,
    prompt: &str,
    schema: &str,
    max_rounds: usize,
    check: Check<'_, T>,
) -> OracleResult<T> {
    let mut history = vec![ChatMessage::user(format!("{prompt}{}", json_instruction(schema)))];

    for round in 1..=max_rounds {
        let reply = match model.complete(&history) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(target: "oracle", "round {round}/{max_rounds}: {e}");
                continue;
            }
        };

        match interpret(&reply, check) {
            Ok(answer) => {
                crate::debug_event!("oracle", "decided", "round {round}/{max_rounds}");
                return Ok(answer);
            }
            Err(e) => {
                crate::debug_event!("oracle", "rejected", "round {round}/{max_rounds}: {e}");
                history.push(ChatMessage::assistant(reply));
                history.push(ChatMessage::user(diagnostic(&e, schema)));
            }
        }
    }

    Err(OracleError::RoundLimitExceeded(max_rounds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::answer::{ScoreAnswer, Violation, accept_any, check_score_range};
    use crate::oracle::model::Role;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replays canned replies and records every conversation it saw.
    struct Scripted {
        replies: Mutex<VecDeque<OracleResult<String>>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl Scripted {
        fn new(replies: Vec<OracleResult<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChatModel for Scripted {
        fn name(&self) -> String {
            "scripted".to_string()
        }

        fn complete(&self, messages: &[ChatMessage]) -> OracleResult<String> {
            self.seen.lock().push(messages.to_vec());
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(OracleError::Transport("script exhausted".to_string())))
        }
    }

    #[test]
    fn test_extract_json_object() {
        let value = extract_json_object("Sure!\n```json\n{\"score\": 2, \"reason\": \"x\"}\n```").unwrap();
        assert_eq!(value["score"], 2);
        assert!(matches!(
            extract_json_object("no braces here"),
            Err(OracleError::MalformedAnswer(_))
        ));
        assert!(matches!(
            extract_json_object("{\"score\": "),
            Err(OracleError::MalformedAnswer(_))
        ));
    }

    #[test]
    fn test_first_valid_answer_wins() {
        let model = Scripted::new(vec![Ok(r#"{"score": 3, "reason": "core"}"#.to_string())]);
        let answer: ScoreAnswer = decide(&model, "prompt", "{}", 3, &accept_any::<ScoreAnswer>).unwrap();
        assert_eq!(answer.score, 3);
        let seen = model.seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0][0].content.starts_with("prompt## Response Format ##"));
    }

    #[test]
    fn test_diagnostics_are_fed_back() {
        let model = Scripted::new(vec![
            Ok("not json".to_string()),
            Ok(r#"{"reason": "missing score"}"#.to_string()),
            Ok(r#"{"score": 7, "reason": "too high"}"#.to_string()),
            Ok(r#"{"score": 1, "reason": "fine"}"#.to_string()),
        ]);
        let answer: ScoreAnswer = decide(&model, "p", "SCHEMA", 10, &check_score_range).unwrap();
        assert_eq!(answer.score, 1);

        let seen = model.seen.lock();
        let last = seen.last().unwrap();
        assert_eq!(last.len(), 7);
        assert_eq!(last[1].role, Role::Assistant);
        assert!(last[2].content.contains("not a valid JSON object"));
        assert!(last[2].content.contains("SCHEMA"));
        assert!(last[4].content.contains("violates the JSON format"));
        assert!(last[6].content.contains("NOT chosen from [0, 1, 2, 3]"));
    }

    #[test]
    fn test_round_limit() {
        let model = Scripted::new(vec![
            Err(OracleError::Transport("down".to_string())),
            Ok(r#"{"score": 2, "reason": ""}"#.to_string()),
        ]);
        let reject = |_: &ScoreAnswer| -> Result<(), Violation> { Err(Violation::new("never")) };
        let result: OracleResult<ScoreAnswer> = decide(&model, "p", "{}", 2, &reject);
        assert!(matches!(result, Err(OracleError::RoundLimitExceeded(2))));
    }
}
