//! Error types for store operations.

use thiserror::Error;

/// Main error type for store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An action was dispatched while another action on the same store was
    /// still running or notifying its subscribers.
    #[error("cannot call action `{action}` in the middle of an action on `{store}`")]
    ReentrantAction { store: String, action: String },

    #[error("store `{store}` has no action named `{action}`")]
    UnknownAction { store: String, action: String },
}

impl StoreError {
    /// Whether this is the reentrancy rejection.
    pub fn is_reentrant(&self) -> bool {
        matches!(self, StoreError::ReentrantAction { .. })
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reentrant_message_names_the_action() {
        let err = StoreError::ReentrantAction {
            store: "counter".to_string(),
            action: "inc".to_string(),
        };
        assert!(err.is_reentrant());
        assert!(err.to_string().contains("in the middle of an action"));
        assert!(err.to_string().contains("inc"));
    }

    #[test]
    fn unknown_action_is_not_reentrant() {
        let err = StoreError::UnknownAction {
            store: "counter".to_string(),
            action: "missing".to_string(),
        };
        assert!(!err.is_reentrant());
    }
}
