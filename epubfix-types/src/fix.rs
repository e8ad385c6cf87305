use serde::{Deserialize, Serialize};

/// Outcome of one dispatch attempt. Created once, never mutated.
///
/// `success = false` covers both "no strategy matched" and "the strategy ran
/// but found nothing to change"; the message distinguishes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixResult {
    pub success: bool,
    pub message: String,

    /// Name of the strategy that produced this result, or "none" when no
    /// strategy accepted the issue.
    pub strategy: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_files: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl FixResult {
    pub fn applied(
        strategy: &str,
        message: impl Into<String>,
        changed_files: Vec<String>,
    ) -> Self {
        Self {
            success: true,
            message: message.into(),
            strategy: strategy.to_string(),
            changed_files,
            details: None,
        }
    }

    pub fn unchanged(strategy: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            strategy: strategy.to_string(),
            changed_files: vec![],
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collections_are_omitted() {
        let json = serde_json::to_string(&FixResult::unchanged("title", "nothing to do"))
            .expect("serialize");
        assert!(!json.contains("changed_files"));
        assert!(!json.contains("details"));
    }
}
