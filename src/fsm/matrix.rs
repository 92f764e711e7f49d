//! # Static transition table.
//!
//! A [`TransitionMatrix`] maps `state → (event → next state)`. A state with
//! no row, or a row without the event, means the event is illegal there.
//!
//! ```text
//! New ──Execute──► Executing ──ExecutionCompleted──► Completed
//!                      │
//!                      └──Interrupt──► Interrupting ──InterruptionCompleted──► Interrupted
//! ```

use std::collections::HashMap;

use super::Label;

/// `State → (Event → State)` table, built once and shared by every instance
/// of a machine kind.
#[derive(Debug, Clone)]
pub struct TransitionMatrix<S: Label, E: Label> {
    rows: HashMap<S, HashMap<E, S>>,
}

impl<S: Label, E: Label> TransitionMatrix<S, E> {
    /// Creates an empty matrix (every event is illegal).
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    /// Adds `state --event--> next`. A later entry for the same pair wins.
    pub fn with(mut self, state: S, event: E, next: S) -> Self {
        self.rows.entry(state).or_default().insert(event, next);
        self
    }

    /// Returns the row of `state`, or `None` if the state has no entry.
    pub fn transitions(&self, state: &S) -> Option<&HashMap<E, S>> {
        self.rows.get(state)
    }

    /// Returns the next state for `(state, event)`.
    pub fn next(&self, state: &S, event: &E) -> Option<S> {
        self.rows.get(state)?.get(event).copied()
    }
}

impl<S: Label, E: Label> Default for TransitionMatrix<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum S {
        A,
        B,
        Done,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum E {
        Go,
        Stop,
    }

    #[test]
    fn missing_row_and_missing_event_are_illegal() {
        let m = TransitionMatrix::new().with(S::A, E::Go, S::B).with(S::B, E::Stop, S::Done);

        assert_eq!(m.next(&S::A, &E::Go), Some(S::B));
        assert_eq!(m.next(&S::A, &E::Stop), None);
        assert!(m.transitions(&S::Done).is_none());
        assert_eq!(m.next(&S::Done, &E::Go), None);
    }
}
