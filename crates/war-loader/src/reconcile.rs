//! Reconciliation of the `clearReferencesStatic` shutdown policy.
//!
//! The signal is tri-state (`Some(true)`, `Some(false)`, `None` = unknown)
//! and may come from the archive's own `context.xml`, the domain-wide
//! default, or any virtual server hosting the deployment.

use serde::{Deserialize, Serialize};

/// Outcome of merging the clear-references signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reconciliation {
    /// All sources agree; `None` means the loader keeps its default policy.
    Consistent(Option<bool>),
    /// Hosting virtual servers disagree; the loader keeps its default.
    Inconsistent,
}

/// Merge the archive signal with the hosting virtual servers' signals.
///
/// The archive wins unconditionally when it carries a signal. Otherwise the
/// first non-unknown virtual-server signal is adopted and every later
/// non-unknown signal must agree with it.
#[must_use]
pub fn reconcile_clear_references(
    archive_signal: Option<bool>,
    virtual_server_signals: &[Option<bool>],
) -> Reconciliation {
    if archive_signal.is_some() {
        return Reconciliation::Consistent(archive_signal);
    }

    let mut value = None;
    for signal in virtual_server_signals.iter().copied().flatten() {
        match value {
            None => value = Some(signal),
            Some(current) if current != signal => return Reconciliation::Inconsistent,
            Some(_) => {}
        }
    }
    Reconciliation::Consistent(value)
}

#[cfg(test)]
mod tests {
    use super::{reconcile_clear_references, Reconciliation};

    #[test]
    fn archive_signal_wins_unconditionally() {
        assert_eq!(
            reconcile_clear_references(Some(true), &[Some(false), Some(false)]),
            Reconciliation::Consistent(Some(true))
        );
        assert_eq!(
            reconcile_clear_references(Some(false), &[]),
            Reconciliation::Consistent(Some(false))
        );
    }

    #[test]
    fn all_unknown_leaves_the_default() {
        assert_eq!(
            reconcile_clear_references(None, &[None, None]),
            Reconciliation::Consistent(None)
        );
        assert_eq!(
            reconcile_clear_references(None, &[]),
            Reconciliation::Consistent(None)
        );
    }

    #[test]
    fn first_non_unknown_signal_is_adopted() {
        assert_eq!(
            reconcile_clear_references(None, &[None, Some(true), None, Some(true)]),
            Reconciliation::Consistent(Some(true))
        );
    }

    #[test]
    fn conflicting_signals_are_inconsistent_in_any_order() {
        let signals = [Some(true), Some(false), None];
        // Every permutation that contains both values must be flagged.
        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in orders {
            let permuted: Vec<_> = order.iter().map(|&i| signals[i]).collect();
            assert_eq!(
                reconcile_clear_references(None, &permuted),
                Reconciliation::Inconsistent,
                "order {order:?}"
            );
        }
    }
}
