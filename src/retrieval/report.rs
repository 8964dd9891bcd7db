use serde::Serialize;
use std::time::Instant;

/// Output and timing of one retrieval stage.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StageReport {
    pub name: String,
    pub output: Vec<String>,
    pub elapsed_ms: u64,
}

/// Result of a retrieval: relevant files, or snippets as `path:start-end`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Retrieval {
    pub items: Vec<String>,
    pub stages: Vec<StageReport>,
    /// Set when the retrieval was cancelled before its last stage
    pub cancelled: bool,
}

impl Retrieval {
    pub fn stage(&self, name: &str) -> Option<&StageReport> {
        self.stages.iter().find(|stage| stage.name == name)
    }
}

/// Times a stage from creation until [`StageTimer::finish`].
pub(crate) struct StageTimer {
    name: &'static str,
    start: Instant,
}

impl StageTimer {
    pub(crate) fn start(name: &'static str) -> Self {
        crate::log_event!("retrieval", "stage started", "{name}");
        Self {
            name,
            start: Instant::now(),
        }
    }

    pub(crate) fn finish(self, output: &[String]) -> StageReport {
        let elapsed_ms = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX);
        crate::log_event!(
            "retrieval",
            "stage finished",
            "{} found {} item(s) in {elapsed_ms}ms",
            self.name,
            output.len()
        );
        StageReport {
            name: self.name.to_string(),
            output: output.to_vec(),
            elapsed_ms,
        }
    }
}
