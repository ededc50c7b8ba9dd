/// Status lifecycle shared by projects, invitations, sessions, participants
/// and payments
///
/// Every status enum lists its legal moves in `can_transition_to`. Route
/// handlers call [`StatusLifecycle::ensure_transition`] before issuing the
/// compare-and-set `UPDATE`, so an illegal request is reported with the
/// current and requested states instead of a generic conflict.

use std::fmt;

/// An illegal status change
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct TransitionError {
    /// Entity name, e.g. "session"
    pub entity: &'static str,

    /// Current status
    pub from: &'static str,

    /// Requested status
    pub to: &'static str,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{} is already '{}'", capitalize(self.entity), self.to)
        } else {
            write!(
                f,
                "Cannot change {} status from '{}' to '{}'",
                self.entity, self.from, self.to
            )
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A status enum with a fixed transition table
pub trait StatusLifecycle: Copy + PartialEq + fmt::Debug {
    /// Name of the entity the status belongs to
    const ENTITY: &'static str;

    /// Database / wire representation
    fn as_str(&self) -> &'static str;

    /// Whether no further transitions are possible
    fn is_terminal(&self) -> bool;

    /// Whether moving to `target` is allowed
    fn can_transition_to(&self, target: Self) -> bool;

    /// Returns an error describing the move when it is not allowed
    fn ensure_transition(&self, target: Self) -> Result<(), TransitionError> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(TransitionError {
                entity: Self::ENTITY,
                from: self.as_str(),
                to: target.as_str(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_display() {
        let err = TransitionError {
            entity: "session",
            from: "completed",
            to: "scheduled",
        };
        assert_eq!(
            err.to_string(),
            "Cannot change session status from 'completed' to 'scheduled'"
        );

        let same = TransitionError {
            entity: "payment",
            from: "pending",
            to: "pending",
        };
        assert_eq!(same.to_string(), "Payment is already 'pending'");
    }
}
