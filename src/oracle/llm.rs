//! Decision oracle backed by a chat model.

use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::answer::{
    Check, ChooseAnswer, Decision, FileNamesAnswer, JudgeAnswer, NextFileAnswer, ScoreAnswer, SnippetAnswer,
    accept_any, check_score_range,
};
use super::model::ChatModel;
use super::{DecisionOracle, SnippetRequest, prompts, rounds};
use crate::types::SnippetRange;

pub struct LlmOracle {
    model: Arc<dyn ChatModel>,
    repo_name: String,
    max_rounds: usize,
}

impl LlmOracle {
    pub fn new(model: Arc<dyn ChatModel>, repo_name: impl Into<String>, max_rounds: usize) -> Self {
        Self {
            model,
            repo_name: repo_name.into(),
            max_rounds: max_rounds.max(1),
        }
    }

    fn decide<T: DeserializeOwned>(&self, what: &str, prompt: &str, schema: &str, check: Check<'_, T>) -> Option<T> {
        match rounds::decide(self.model.as_ref(), prompt, schema, self.max_rounds, check) {
            Ok(answer) => Some(answer),
            Err(e) => {
                tracing::warn!(target: "oracle", "{what}: {e}; using default answer");
                None
            }
        }
    }

    fn gave_up(&self) -> String {
        format!(
            "{} gave no valid answer within {} rounds",
            self.model.name(),
            self.max_rounds
        )
    }

    fn to_score(score: i64) -> u8 {
        u8::try_from(score.clamp(0, 3)).unwrap_or_default()
    }
}

impl DecisionOracle for LlmOracle {
    fn extract_file_names(&self, query: &str) -> Decision<Vec<String>> {
        let prompt = prompts::extract_file_names(&self.repo_name, query);
        match self.decide::<FileNamesAnswer>("extract file names", &prompt, prompts::FILE_NAMES_SCHEMA, &accept_any) {
            Some(answer) => Decision::new(answer.files, format!("{}\n{}", answer.thoughts, answer.reason)),
            None => Decision::new(Vec::new(), self.gave_up()),
        }
    }

    fn choose_files(&self, query: &str, candidates: &[String], check: Check<'_, ChooseAnswer>) -> Decision<Vec<String>> {
        let prompt = prompts::choose_files(&self.repo_name, query, candidates);
        match self.decide("choose files", &prompt, prompts::CHOOSE_FILES_SCHEMA, check) {
            Some(answer) => Decision::new(answer.choose_list, answer.reason),
            None => Decision::new(Vec::new(), self.gave_up()),
        }
    }

    fn next_file(
        &self,
        query: &str,
        tree: &str,
        found: &[String],
        check: Check<'_, NextFileAnswer>,
    ) -> Decision<Option<String>> {
        let example = found.first().map_or("src/module/file.ext", String::as_str);
        let schema = prompts::next_file_schema(example);
        let prompt = prompts::next_file(&self.repo_name, query, tree, found);
        match self.decide("next file", &prompt, &schema, check) {
            Some(answer) => Decision::new(answer.file, answer.reason),
            None => Decision::new(None, self.gave_up()),
        }
    }

    fn score_preview(
        &self,
        query: &str,
        file: &str,
        preview: &str,
        others: &[String],
        check: Check<'_, ScoreAnswer>,
    ) -> Decision<u8> {
        let prompt = prompts::score_preview(&self.repo_name, query, file, preview, others);
        let checked = |answer: &ScoreAnswer| {
            check_score_range(answer)?;
            check(answer)
        };
        match self.decide("score preview", &prompt, prompts::SCORE_SCHEMA, &checked) {
            Some(answer) => Decision::new(Self::to_score(answer.score), answer.reason),
            None => Decision::new(0, self.gave_up()),
        }
    }

    fn score_snippet(&self, query: &str, snippet: &SnippetRange, content: &str) -> Decision<u8> {
        let prompt = prompts::score_snippet(query, &snippet.to_string(), content);
        match self.decide("score snippet", &prompt, prompts::SCORE_SCHEMA, &check_score_range) {
            Some(answer) => Decision::new(Self::to_score(answer.score), answer.reason),
            None => Decision::new(0, self.gave_up()),
        }
    }

    fn judge_snippet(&self, query: &str, snippet: &SnippetRange, content: &str) -> Decision<bool> {
        let prompt = prompts::judge_snippet(query, &snippet.to_string(), content);
        match self.decide::<JudgeAnswer>("judge snippet", &prompt, prompts::JUDGE_SCHEMA, &accept_any) {
            Some(answer) => Decision::new(answer.relevant, answer.reason),
            None => Decision::new(false, self.gave_up()),
        }
    }

    fn next_snippet(
        &self,
        request: &SnippetRequest<'_>,
        check: Check<'_, SnippetAnswer>,
    ) -> Decision<Option<(usize, usize)>> {
        let accepted: Vec<String> = request
            .accepted
            .iter()
            .map(|(start, end)| format!("{}:{start}-{end}", request.file))
            .collect();
        let prompt = prompts::next_snippet(request.file, request.query, request.preview, &accepted);
        let Some(answer) = self.decide("next snippet", &prompt, prompts::NEXT_SNIPPET_SCHEMA, check) else {
            return Decision::new(None, self.gave_up());
        };
        if answer.is_stop() {
            return Decision::new(None, answer.reason);
        }
        let range = usize::try_from(answer.start_line)
            .ok()
            .zip(usize::try_from(answer.end_line).ok());
        Decision::new(range, answer.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::answer::Violation;
    use crate::oracle::error::{OracleError, OracleResult};
    use crate::oracle::model::ChatMessage;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    struct Replies(Mutex<VecDeque<&'static str>>);

    impl ChatModel for Replies {
        fn name(&self) -> String {
            "replies".to_string()
        }

        fn complete(&self, _: &[ChatMessage]) -> OracleResult<String> {
            self.0
                .lock()
                .pop_front()
                .map(str::to_string)
                .ok_or_else(|| OracleError::Transport("no more replies".to_string()))
        }
    }

    fn oracle(replies: &[&'static str]) -> LlmOracle {
        LlmOracle::new(
            Arc::new(Replies(Mutex::new(replies.iter().copied().collect()))),
            "acme/app",
            3,
        )
    }

    #[test]
    fn test_extract_file_names_joins_reasons() {
        let decision = oracle(&[r#"{"thoughts": "t", "files": ["login.py"], "reason": "r"}"#])
            .extract_file_names("login.py breaks");
        assert_eq!(decision.value, vec!["login.py"]);
        assert_eq!(decision.reason, "t\nr");
    }

    #[test]
    fn test_choose_files_retries_on_violation() {
        let candidates = vec!["a.py".to_string(), "b.py".to_string()];
        let check = |answer: &ChooseAnswer| match answer.choose_list.iter().find(|f| !candidates.contains(f)) {
            Some(file) => Err(Violation::new(format!("{file} not listed"))),
            None => Ok(()),
        };
        let decision = oracle(&[
            r#"{"choose_list": ["c.py"], "reason": "guess"}"#,
            r#"{"choose_list": ["b.py"], "reason": "fits"}"#,
        ])
        .choose_files("q", &candidates, &check);
        assert_eq!(decision.value, vec!["b.py"]);
    }

    #[test]
    fn test_defaults_when_rounds_run_out() {
        let oracle = oracle(&["garbage", "still garbage", "nope"]);
        assert!(oracle.extract_file_names("q").value.is_empty());
        let snippet = SnippetRange::new("a.py", 0, 3);
        assert_eq!(oracle.score_snippet("q", &snippet, "x").value, 0);
        assert!(!oracle.judge_snippet("q", &snippet, "x").value);
    }

    #[test]
    fn test_score_preview_enforces_range() {
        let decision = oracle(&[r#"{"score": 5, "reason": "x"}"#, r#"{"score": "2", "reason": "y"}"#])
            .score_preview("q", "a.py", "0 | x", &[], &accept_any);
        assert_eq!(decision.value, 2);
        assert_eq!(decision.reason, "y");
    }

    #[test]
    fn test_next_snippet_stop_and_range() {
        let request = SnippetRequest {
            query: "q",
            file: "a.py",
            preview: "0 | x",
            accepted: &[],
        };
        let decision = oracle(&[r#"{"start_line": 4, "end_line": 9, "reason": "r"}"#])
            .next_snippet(&request, &accept_any);
        assert_eq!(decision.value, Some((4, 9)));

        let decision = oracle(&[r#"{"start_line": -1, "end_line": -1, "reason": "done"}"#])
            .next_snippet(&request, &accept_any);
        assert_eq!(decision.value, None);
        assert_eq!(decision.reason, "done");
    }
}
