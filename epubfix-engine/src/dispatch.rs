use crate::strategy::{Acceptance, FixStrategy};
use epubfix_types::issue::ValidationIssue;

/// Holds strategies in a fixed, hand-curated priority order and selects the
/// first one whose acceptance predicate says yes.
///
/// Only one strategy is ever invoked per issue per pass; there is no
/// fallback chaining when an accepted strategy's `apply` fails. The order is
/// a deliberate tie-break for code ranges that overlap (the page-map
/// cleanup must outrank the generic RSC-005 handler).
pub struct Dispatcher {
    strategies: Vec<Box<dyn FixStrategy>>,
}

impl Dispatcher {
    pub fn builtin() -> Self {
        Self::with_strategies(crate::strategies::builtin_strategies())
    }

    pub fn with_strategies(strategies: Vec<Box<dyn FixStrategy>>) -> Self {
        Self { strategies }
    }

    /// First strategy in priority order that accepts the issue.
    pub fn select(&self, issue: &ValidationIssue) -> Option<&dyn FixStrategy> {
        self.strategies
            .iter()
            .find(|s| s.accept(issue) == Acceptance::Accepts)
            .map(|s| s.as_ref())
    }

    /// True when no strategy accepts but at least one explicitly declined —
    /// the issue's code is known, this particular report just isn't anyone's
    /// job.
    pub fn recognizes(&self, issue: &ValidationIssue) -> bool {
        self.strategies
            .iter()
            .any(|s| s.accept(issue) == Acceptance::Declines)
    }

    pub fn strategies(&self) -> impl Iterator<Item = &dyn FixStrategy> {
        self.strategies.iter().map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
