use crate::fix::FixResult;
use crate::issue::ValidationIssue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Artifact written after a fix pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixReport {
    pub schema: String,
    pub tool: ToolInfo,
    pub run: RunInfo,
    pub summary: FixSummary,

    #[serde(default)]
    pub results: Vec<FixResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_validation: Option<PostValidation>,
}

impl FixReport {
    pub fn new(tool: ToolInfo, run: RunInfo) -> Self {
        Self {
            schema: crate::schema::EPUBFIX_FIX_V1.to_string(),
            tool,
            run,
            summary: FixSummary::default(),
            results: vec![],
            post_validation: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixSummary {
    pub issues_total: u64,
    pub attempted: u64,
    pub fixed: u64,
    pub failed: u64,
    pub unfixable: u64,
    pub files_modified: u64,
}

/// Result of re-parsing every document flagged modified.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostValidation {
    #[serde(default)]
    pub validated_files: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationFailure>,
}

/// A modified document that no longer re-parses. The mutation is kept; the
/// failure is only reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub path: String,
    pub error: String,
}

/// Artifact written by the dry-run query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub schema: String,
    pub tool: ToolInfo,
    pub run: RunInfo,

    #[serde(default)]
    pub fixable: Vec<StrategyAssignment>,

    #[serde(default)]
    pub unfixable: Vec<ValidationIssue>,
}

impl CheckReport {
    pub fn new(tool: ToolInfo, run: RunInfo) -> Self {
        Self {
            schema: crate::schema::EPUBFIX_CHECK_V1.to_string(),
            tool,
            run,
            fixable: vec![],
            unfixable: vec![],
        }
    }
}

/// A fixable issue paired with the strategy the dispatcher would invoke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAssignment {
    pub strategy: String,
    pub issue: ValidationIssue,
}
