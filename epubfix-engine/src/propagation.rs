use crate::strategy::glob_match;
use epubfix_types::issue::ValidationIssue;

/// How far one successful repair reaches when marking other reports of the
/// same defect as resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationScope {
    /// Same code, same file. The default.
    FileCode,
    /// Same code, same file, byte-identical message. For categories where
    /// the message distinguishes genuinely different repairs.
    FileExactMessage,
    /// Same code anywhere in the package. For single-application,
    /// whole-package repairs.
    Global,
    /// Same code, same file — like [`PropagationScope::FileCode`], kept as
    /// its own row because the repair itself loops per file and each file
    /// needs independent judgement.
    FileLocal,
}

/// Scope assignment per code pattern, first match wins. Adding a defect
/// category means adding a row here, not a conditional branch elsewhere.
const SCOPE_RULES: &[(&str, PropagationScope)] = &[
    ("RSC-*", PropagationScope::FileExactMessage),
    ("metadata-*", PropagationScope::Global),
    ("epub-lang", PropagationScope::Global),
    ("heading-order", PropagationScope::FileLocal),
];

pub fn scope_for(code: &str) -> PropagationScope {
    SCOPE_RULES
        .iter()
        .find(|(pattern, _)| glob_match(pattern, code))
        .map(|(_, scope)| *scope)
        .unwrap_or(PropagationScope::FileCode)
}

/// After the issue at `fixed_idx` was successfully repaired, mark every
/// other still-unfixed, not-yet-dispatched issue the same repair resolved.
/// Returns how many were marked.
///
/// Issues that were already dispatched this pass keep their own outcome;
/// propagation never rewrites history.
pub fn propagate(
    issues: &mut [ValidationIssue],
    fixed_idx: usize,
    attempted: &[bool],
) -> usize {
    let (code, message, file) = {
        let fixed = &issues[fixed_idx];
        (
            fixed.code.clone(),
            fixed.message.clone(),
            fixed.file().map(str::to_string),
        )
    };
    let scope = scope_for(&code);

    let mut marked = 0;
    for (idx, issue) in issues.iter_mut().enumerate() {
        if idx == fixed_idx || issue.fixed || attempted.get(idx).copied().unwrap_or(false) {
            continue;
        }
        if issue.code != code {
            continue;
        }
        let same_file = issue.file() == file.as_deref();
        let resolved = match scope {
            PropagationScope::Global => true,
            PropagationScope::FileCode | PropagationScope::FileLocal => same_file,
            PropagationScope::FileExactMessage => same_file && issue.message == message,
        };
        if resolved {
            issue.fixed = true;
            marked += 1;
        }
    }
    marked
}
