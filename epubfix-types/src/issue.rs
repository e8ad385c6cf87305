use serde::{Deserialize, Serialize};

/// One defect reported by an external validator.
///
/// epubfix tries hard to be *tolerant* when reading reports:
/// - Unknown fields are ignored.
/// - Optional fields may be absent.
///
/// The code/message vocabulary belongs to the validator; epubfix matches
/// against it but never defines or normalizes it. Two issues are "the same
/// report" only when all of their fields compare equal — there is no
/// synthetic id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Validator rule code, e.g. "RSC-005" or "html-has-lang".
    pub code: String,

    /// Human-readable message as emitted by the validator.
    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub severity: Severity,

    /// Whether the validator considers this issue repairable.
    #[serde(default)]
    pub fixable: bool,

    /// Set by the remediation pass. Monotonic: false -> true, never back.
    #[serde(default)]
    pub fixed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<IssueLocation>,
}

impl ValidationIssue {
    /// File the issue points at, if the validator reported one.
    pub fn file(&self) -> Option<&str> {
        self.location.as_ref().map(|loc| loc.file.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    #[default]
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLocation {
    /// Package-internal path as reported. May disagree with the store key in
    /// case or prefix; resolution happens at lookup time.
    pub file: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
}
