//! JSON output envelope for the `--json` flag.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Succeeded with results
    Success,
    /// Succeeded but found nothing
    NotFound,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Meta {
    /// Number of items in data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    /// Original query string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Execution time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Every command prints this structure when `--json` is used.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub status: Status,
    pub command: &'static str,
    pub message: String,
    pub data: Option<T>,
    pub meta: Meta,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(command: &'static str, data: T) -> Self {
        Self {
            status: Status::Success,
            command,
            message: "Operation completed successfully".to_string(),
            data: Some(data),
            meta: Meta::default(),
        }
    }

    pub fn not_found(command: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: Status::NotFound,
            command,
            message: message.into(),
            data: None,
            meta: Meta::default(),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.meta.count = Some(count);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.meta.query = Some(query.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.meta.duration_ms = Some(duration_ms);
        self
    }

    /// Print as pretty JSON on stdout.
    pub fn emit(&self) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let envelope = Envelope::success("search", vec!["a.py:0-3"])
            .with_count(1)
            .with_query("login");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["command"], "search");
        assert_eq!(json["data"][0], "a.py:0-3");
        assert_eq!(json["meta"]["count"], 1);
        assert!(json["meta"].get("duration_ms").is_none());

        let empty: Envelope<Vec<String>> = Envelope::not_found("retrieve", "Nothing relevant");
        let json = serde_json::to_value(&empty).unwrap();
        assert_eq!(json["status"], "not_found");
        assert!(json["data"].is_null());
    }
}
