use coderecall::chunking::ChunkingStrategy;
use coderecall::oracle::{
    Check, ChooseAnswer, Decision, DecisionOracle, NextFileAnswer, ScoreAnswer, SnippetAnswer, SnippetRequest,
};
use coderecall::preview::PlainPreview;
use coderecall::retrieval::CancellationToken;
use coderecall::{RepoRef, Repository, Retriever, Settings, SnippetRange};
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

const QUERY: &str = "how does login work";

/// Oracle that knows `def login` is what the user is after.
struct ScriptedOracle {
    explored: Mutex<Vec<String>>,
    rejected: Mutex<Vec<String>>,
    /// Cancelled as soon as the first file preview is scored
    cancel_on_score: Option<CancellationToken>,
}

impl ScriptedOracle {
    fn new() -> Self {
        Self {
            explored: Mutex::new(vec!["src/missing.py".to_string()]),
            rejected: Mutex::new(Vec::new()),
            cancel_on_score: None,
        }
    }
}

impl DecisionOracle for ScriptedOracle {
    fn extract_file_names(&self, _: &str) -> Decision<Vec<String>> {
        Decision::new(vec!["login.py".to_string()], "the query mentions login")
    }

    fn choose_files(&self, _: &str, candidates: &[String], check: Check<'_, ChooseAnswer>) -> Decision<Vec<String>> {
        let answer = ChooseAnswer {
            choose_list: candidates.iter().filter(|f| f.ends_with("login.py")).cloned().collect(),
            reason: "defines login".to_string(),
        };
        match check(&answer) {
            Ok(()) => Decision::new(answer.choose_list, answer.reason),
            Err(_) => Decision::new(Vec::new(), "gave up"),
        }
    }

    fn next_file(&self, _: &str, _: &str, _: &[String], check: Check<'_, NextFileAnswer>) -> Decision<Option<String>> {
        while let Some(file) = self.explored.lock().unwrap().pop() {
            let answer = NextFileAnswer {
                file: Some(file),
                reason: String::new(),
            };
            match check(&answer) {
                Ok(()) => return Decision::new(answer.file, "explored"),
                Err(violation) => self.rejected.lock().unwrap().push(violation.message),
            }
        }
        Decision::new(None, "nothing else")
    }

    fn score_preview(&self, _: &str, _: &str, preview: &str, _: &[String], _: Check<'_, ScoreAnswer>) -> Decision<u8> {
        if let Some(token) = &self.cancel_on_score {
            token.cancel();
        }
        Decision::new(if preview.contains("def login") { 3 } else { 0 }, "scored")
    }

    fn score_snippet(&self, _: &str, _: &SnippetRange, content: &str) -> Decision<u8> {
        Decision::new(if content.contains("def login") { 3 } else { 0 }, "scored")
    }

    fn judge_snippet(&self, _: &str, _: &SnippetRange, content: &str) -> Decision<bool> {
        Decision::new(content.contains("def login"), "judged")
    }

    fn next_snippet(&self, _: &SnippetRequest<'_>, _: Check<'_, SnippetAnswer>) -> Decision<Option<(usize, usize)>> {
        Decision::new(None, "done")
    }
}

fn create_repository(temp: &TempDir) -> (Repository, Settings) {
    let root = temp.path();
    fs::create_dir_all(root.join("src/auth")).unwrap();
    fs::write(
        root.join("src/auth/login.py"),
        "import hashlib\nimport time\n\nMAX_ATTEMPTS = 3\n\n\
         def login(user, password):\n    digest = hashlib.sha256(password)\n    if digest != user.digest:\n        raise PermissionError(user)\n    return time.time()\n",
    )
    .unwrap();
    fs::write(
        root.join("src/auth/session.py"),
        "class Session:\n    def __init__(self, token):\n        self.token = token\n",
    )
    .unwrap();
    fs::write(root.join("src/db.py"), "def connect(url):\n    return url\n").unwrap();
    fs::write(root.join("README.md"), "# Shop\nHow the shop works.\n").unwrap();

    let mut settings = Settings::default();
    settings.chunking.strategy = ChunkingStrategy::Line;
    settings.chunking.line_window = 5;
    settings.retrieval.scr_snippet_size = 5;
    settings.retrieval.num_threads = 1;

    let repo = Repository::open(RepoRef::new("acme", "shop", root), &settings)
        .unwrap()
        .with_index_dir(None);
    (repo, settings)
}

#[test]
fn test_retrieve_files_only() {
    let temp = TempDir::new().unwrap();
    let (repo, settings) = create_repository(&temp);
    let oracle = ScriptedOracle::new();

    let retriever = Retriever::new(&repo, &oracle, &PlainPreview, settings.retrieval.clone());
    let retrieval = retriever.retrieve(QUERY, true).unwrap();

    assert_eq!(retrieval.items, vec!["src/auth/login.py"]);
    assert!(!retrieval.cancelled);
    let names: Vec<&str> = retrieval.stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["EDL", "KWS", "FTE", "FPS"]);
    assert_eq!(retrieval.stage("EDL").unwrap().output, vec!["src/auth/login.py"]);
    assert!(
        !retrieval
            .stage("KWS")
            .unwrap()
            .output
            .contains(&"src/auth/login.py".to_string())
    );
    assert!(retrieval.stage("FTE").unwrap().output.is_empty());

    // The explorer's made-up file was sent back with a diagnostic
    assert_eq!(oracle.rejected.lock().unwrap().len(), 1);
}

#[test]
fn test_retrieve_snippets() {
    let temp = TempDir::new().unwrap();
    let (repo, settings) = create_repository(&temp);
    let oracle = ScriptedOracle::new();

    let retriever = Retriever::new(&repo, &oracle, &PlainPreview, settings.retrieval.clone());
    let retrieval = retriever.retrieve(QUERY, false).unwrap();

    assert_eq!(retrieval.items, vec!["src/auth/login.py:5-10"]);
    assert_eq!(retrieval.stages.len(), 5);
    assert_eq!(retrieval.stage("SCR").unwrap().output, retrieval.items);
}

#[test]
fn test_includes_limit_candidates() {
    let temp = TempDir::new().unwrap();
    let (repo, settings) = create_repository(&temp);
    let oracle = ScriptedOracle::new();

    let retriever = Retriever::new(&repo, &oracle, &PlainPreview, settings.retrieval.clone())
        .with_includes(vec!["*.md".to_string()]);
    let retrieval = retriever.retrieve(QUERY, true).unwrap();

    assert!(retrieval.items.is_empty());
    assert_eq!(retrieval.stage("KWS").unwrap().output, vec!["README.md"]);
}

#[test]
fn test_cancelled_before_start_returns_keyword_matches() {
    let temp = TempDir::new().unwrap();
    let (repo, settings) = create_repository(&temp);
    let oracle = ScriptedOracle::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let retriever =
        Retriever::new(&repo, &oracle, &PlainPreview, settings.retrieval.clone()).with_cancellation(cancel);
    let retrieval = retriever.retrieve(QUERY, false).unwrap();

    assert!(retrieval.cancelled);
    let names: Vec<&str> = retrieval.stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["EDL", "KWS"]);
    assert!(retrieval.stage("EDL").unwrap().output.is_empty());
    assert_eq!(retrieval.items, retrieval.stage("KWS").unwrap().output);
    assert!(!retrieval.items.is_empty());
}

#[test]
fn test_cancelled_while_scoring_keeps_scored_files() {
    let temp = TempDir::new().unwrap();
    let (repo, settings) = create_repository(&temp);
    let cancel = CancellationToken::new();
    let oracle = ScriptedOracle {
        cancel_on_score: Some(cancel.clone()),
        ..ScriptedOracle::new()
    };

    let retriever =
        Retriever::new(&repo, &oracle, &PlainPreview, settings.retrieval.clone()).with_cancellation(cancel);
    let retrieval = retriever.retrieve(QUERY, false).unwrap();

    assert!(retrieval.cancelled);
    assert!(retrieval.stage("SCR").is_none());
    assert_eq!(retrieval.items, vec!["src/auth/login.py"]);
}
