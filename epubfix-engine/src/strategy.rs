use crate::context::ProcessingContext;
use epubfix_types::fix::FixResult;
use epubfix_types::issue::ValidationIssue;

/// How a strategy relates to an issue.
///
/// `Declines` means "I recognize this code but this report is not my
/// flavor" — distinct from `NotApplicable` so dispatch diagnostics can say
/// an issue was seen and deferred rather than never recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    Accepts,
    Declines,
    NotApplicable,
}

/// Declarative acceptance rules: code patterns plus a curated list of
/// message fragments. Matching is data, not inline conditionals, so the
/// priority-ordered dispatch stays auditable.
#[derive(Debug, Clone)]
pub struct IssueMatcher {
    /// Code patterns (`*`/`?` wildcards allowed).
    pub codes: &'static [&'static str],

    /// When non-empty, the message must contain one of these fragments
    /// (case-insensitive) for the strategy to accept.
    pub message_fragments: &'static [&'static str],
}

impl IssueMatcher {
    pub const fn new(
        codes: &'static [&'static str],
        message_fragments: &'static [&'static str],
    ) -> Self {
        Self {
            codes,
            message_fragments,
        }
    }

    pub fn matches_code(&self, code: &str) -> bool {
        self.codes.iter().any(|pattern| glob_match(pattern, code))
    }

    /// Pure predicate over the issue's code and message text.
    pub fn acceptance(&self, issue: &ValidationIssue) -> Acceptance {
        if !self.matches_code(&issue.code) {
            return Acceptance::NotApplicable;
        }
        if self.message_fragments.is_empty() {
            return Acceptance::Accepts;
        }
        let message = issue.message.to_ascii_lowercase();
        let hit = self
            .message_fragments
            .iter()
            .any(|fragment| message.contains(&fragment.to_ascii_lowercase()));
        if hit {
            Acceptance::Accepts
        } else {
            Acceptance::Declines
        }
    }
}

/// One repair capability.
///
/// `accept` must stay cheap and side-effect free; the dispatcher calls it
/// for every strategy in priority order until one accepts. `apply` runs to
/// completion before the next issue is dispatched and reports what happened
/// — returning a non-success result ("found nothing to fix") is a
/// legitimate outcome, not an error.
pub trait FixStrategy {
    fn name(&self) -> &'static str;

    fn matcher(&self) -> &'static IssueMatcher;

    fn accept(&self, issue: &ValidationIssue) -> Acceptance {
        self.matcher().acceptance(issue)
    }

    fn handled_codes(&self) -> &'static [&'static str] {
        self.matcher().codes
    }

    fn apply(
        &self,
        issue: &ValidationIssue,
        ctx: &mut ProcessingContext,
    ) -> anyhow::Result<FixResult>;
}

/// Simple wildcard matcher: '*' and '?'.
///
/// DP implementation to avoid recursion.
pub fn glob_match(pat: &str, text: &str) -> bool {
    let p = pat.as_bytes();
    let t = text.as_bytes();
    let mut dp = vec![vec![false; t.len() + 1]; p.len() + 1];
    dp[0][0] = true;

    for i in 1..=p.len() {
        if p[i - 1] == b'*' {
            dp[i][0] = dp[i - 1][0];
        }
    }

    for i in 1..=p.len() {
        for j in 1..=t.len() {
            dp[i][j] = match p[i - 1] {
                b'*' => dp[i - 1][j] || dp[i][j - 1],
                b'?' => dp[i - 1][j - 1],
                c => dp[i - 1][j - 1] && c == t[j - 1],
            };
        }
    }

    dp[p.len()][t.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use epubfix_types::issue::{IssueLocation, Severity};

    fn issue(code: &str, message: &str) -> ValidationIssue {
        ValidationIssue {
            code: code.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
            fixable: true,
            fixed: false,
            location: Some(IssueLocation {
                file: "ch1.xhtml".to_string(),
                line: None,
            }),
        }
    }

    #[test]
    fn glob_match_handles_star_and_question() {
        assert!(glob_match("a*b", "ab"));
        assert!(glob_match("a*b", "acb"));
        assert!(!glob_match("a?b", "ab"));
        assert!(glob_match("a?b", "acb"));
        assert!(glob_match("metadata-*", "metadata-accessmode"));
        assert!(!glob_match("metadata-?", "metadata-accessmode"));
    }

    #[test]
    fn matcher_without_fragments_accepts_on_code() {
        const M: IssueMatcher = IssueMatcher::new(&["image-alt"], &[]);
        assert_eq!(M.acceptance(&issue("image-alt", "anything")), Acceptance::Accepts);
        assert_eq!(
            M.acceptance(&issue("link-name", "anything")),
            Acceptance::NotApplicable
        );
    }

    #[test]
    fn matcher_with_fragments_declines_other_flavors() {
        const M: IssueMatcher = IssueMatcher::new(&["RSC-005"], &["page-map"]);
        assert_eq!(
            M.acceptance(&issue("RSC-005", "attribute \"page-map\" not allowed here")),
            Acceptance::Accepts
        );
        assert_eq!(
            M.acceptance(&issue("RSC-005", "element \"foo\" missing required child")),
            Acceptance::Declines
        );
        assert_eq!(
            M.acceptance(&issue("OPF-096", "whatever")),
            Acceptance::NotApplicable
        );
    }

    #[test]
    fn fragment_matching_is_case_insensitive() {
        const M: IssueMatcher = IssueMatcher::new(&["RSC-005"], &["page-map"]);
        assert_eq!(
            M.acceptance(&issue("RSC-005", "Attribute \"PAGE-MAP\" not allowed")),
            Acceptance::Accepts
        );
    }
}
