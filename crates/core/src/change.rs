//! Change detection between consecutive alert snapshots.

use crate::alert::AlertRecord;

/// How one alert category moved between two successful polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First successful poll; establishes the baseline.
    Baseline,
    /// Nothing to show before, a record now.
    Appeared,
    /// A record before and a different one now.
    Changed,
    /// A record before, nothing now.
    Cleared,
    Unchanged,
}

impl Transition {
    /// Whether this transition drives notification side effects.
    ///
    /// Clearing an alert only updates the display.
    #[inline]
    pub fn notifies(self) -> bool {
        matches!(self, Transition::Appeared | Transition::Changed)
    }
}

/// Classify the move from `prev` to `next`.
///
/// `has_baseline` is false until the first successful poll has been applied,
/// so alerts that already exist at startup never notify.
pub fn classify<T: AlertRecord>(has_baseline: bool, prev: Option<&T>, next: Option<&T>) -> Transition {
    if !has_baseline {
        return Transition::Baseline;
    }
    match (prev, next) {
        (None, None) => Transition::Unchanged,
        (None, Some(_)) => Transition::Appeared,
        (Some(_), None) => Transition::Cleared,
        (Some(p), Some(n)) if p.same_fields(n) => Transition::Unchanged,
        (Some(_), Some(_)) => Transition::Changed,
    }
}
