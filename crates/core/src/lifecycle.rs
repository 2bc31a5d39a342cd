//! Lifecycle state machine: `Created → ContentLoaded → Running`.

use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Phase of a core instance. Ordering follows the phase order, so `>=`
/// comparisons express "at least".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lifecycle {
    Created,
    ContentLoaded,
    Running,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Created => "Created",
            Lifecycle::ContentLoaded => "ContentLoaded",
            Lifecycle::Running => "Running",
        }
    }

    /// Fail with `BadState` unless at least `min`.
    pub fn require_at_least(self, op: &'static str, min: Lifecycle) -> CoreResult<()> {
        if self >= min {
            return Ok(());
        }
        Err(CoreError::BadState {
            op,
            required: match min {
                Lifecycle::Created => ">= Created",
                Lifecycle::ContentLoaded => ">= ContentLoaded",
                Lifecycle::Running => ">= Running",
            },
            actual: self,
        })
    }

    /// Fail with `BadState` unless exactly `state`.
    pub fn require_exactly(self, op: &'static str, state: Lifecycle) -> CoreResult<()> {
        if self == state {
            return Ok(());
        }
        Err(CoreError::BadState {
            op,
            required: state.as_str(),
            actual: self,
        })
    }

    /// State after a successful step of at least one tick. Running is terminal.
    pub fn after_step(self) -> Lifecycle {
        match self {
            Lifecycle::Created => Lifecycle::Created,
            Lifecycle::ContentLoaded | Lifecycle::Running => Lifecycle::Running,
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_phases() {
        assert!(Lifecycle::Created < Lifecycle::ContentLoaded);
        assert!(Lifecycle::ContentLoaded < Lifecycle::Running);
    }

    #[test]
    fn require_at_least() {
        assert!(Lifecycle::Running
            .require_at_least("snapshot", Lifecycle::ContentLoaded)
            .is_ok());
        let err = Lifecycle::Created
            .require_at_least("snapshot", Lifecycle::ContentLoaded)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::BadState {
                op: "snapshot",
                actual: Lifecycle::Created,
                ..
            }
        ));
    }

    #[test]
    fn require_exactly_rejects_later_phase() {
        assert!(Lifecycle::Created
            .require_exactly("load_content", Lifecycle::Created)
            .is_ok());
        assert!(Lifecycle::ContentLoaded
            .require_exactly("load_content", Lifecycle::Created)
            .is_err());
    }

    #[test]
    fn running_is_terminal() {
        assert_eq!(Lifecycle::ContentLoaded.after_step(), Lifecycle::Running);
        assert_eq!(Lifecycle::Running.after_step(), Lifecycle::Running);
    }
}
