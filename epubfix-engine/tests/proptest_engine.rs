//! Robustness: dispatch plumbing must never panic on arbitrary report
//! content, and propagation must never revert a fixed flag.

use epubfix_engine::{ProcessingContext, glob_match, propagate};
use epubfix_types::document::Document;
use epubfix_types::issue::{IssueLocation, Severity, ValidationIssue};
use epubfix_types::package::{PackageManifest, PackageMetadata};
use proptest::prelude::*;

fn issue(code: &str, message: &str, file: Option<&str>, fixed: bool) -> ValidationIssue {
    ValidationIssue {
        code: code.to_string(),
        message: message.to_string(),
        severity: Severity::Warning,
        fixable: true,
        fixed,
        location: file.map(|f| IssueLocation {
            file: f.to_string(),
            line: None,
        }),
    }
}

proptest! {
    #[test]
    fn glob_match_never_panics(pattern in ".{0,64}", text in ".{0,64}") {
        let _ = glob_match(&pattern, &text);
    }

    #[test]
    fn path_resolution_never_panics(reported in ".{0,64}", stored in "[a-zA-Z0-9./_-]{1,32}") {
        let mut ctx = ProcessingContext::new(
            "content.opf",
            PackageManifest::default(),
            PackageMetadata::default(),
        );
        ctx.insert_document(Document::text(
            stored,
            "application/xhtml+xml",
            "<html/>",
        ));
        let _ = ctx.resolve_path(&reported);
    }

    #[test]
    fn propagation_never_unfixes(
        codes in proptest::collection::vec("[a-z-]{1,12}", 1..8),
        fixed_flags in proptest::collection::vec(any::<bool>(), 1..8),
        fixed_idx in 0usize..8,
    ) {
        let mut issues: Vec<ValidationIssue> = codes
            .iter()
            .zip(fixed_flags.iter().cycle())
            .map(|(code, fixed)| issue(code, "m", Some("a.xhtml"), *fixed))
            .collect();
        let fixed_idx = fixed_idx % issues.len();
        issues[fixed_idx].fixed = true;

        let before: Vec<bool> = issues.iter().map(|i| i.fixed).collect();
        let attempted = vec![false; issues.len()];
        propagate(&mut issues, fixed_idx, &attempted);

        for (issue, was_fixed) in issues.iter().zip(before) {
            if was_fixed {
                prop_assert!(issue.fixed, "fixed flag must be monotonic");
            }
        }
    }
}
