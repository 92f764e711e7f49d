//! # Concrete state machine kinds.
//!
//! Three kinds drive an application:
//!
//! ```text
//! Container:
//!   New ──Execute──► Executing ──ExecutionCompleted──► Completed
//!                       └──Interrupt──► Interrupting ──InterruptionCompleted──► Interrupted
//!   (any but Interrupting) ──Finalize──► Finalized
//!
//! Application:
//!   New ──Submit──► Submitted ──Execute──► Executing ──Complete──► Completed
//!                                             └──Fail──► Failed
//!   (any but Finalized) ──Finalize──► Finalized
//!
//! ApplicationMaster:
//!   New ──SubmitDag──► DagSubmitted ──ExecuteApplication──► Executing
//!   Executing ──ExecutionSuccess──► ExecutionSucceeded
//!   Executing ──ExecutionFailure──► ExecutionFailed
//!   Executing ──InterruptApplication──► Interrupting ──InterruptionSuccess──► Interrupted
//!   (DagSubmitted | Executing | ExecutionSucceeded | ExecutionFailed | Interrupted)
//!       ──DestroyApplication──► Finalized
//! ```
//!
//! `Finalized` has no row in any matrix: every event there is illegal.

use crate::fsm::TransitionMatrix;

/// Output of every kind: whether the event produced a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The event was applied.
    Success,
    /// The event had no transition.
    Failure,
}

/// Output function shared by the three kinds.
pub fn outcome<E, S>(_event: &E, next: Option<S>) -> Outcome {
    match next {
        Some(_) => Outcome::Success,
        None => Outcome::Failure,
    }
}

/// States of a processing container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerState {
    New,
    Executing,
    Completed,
    Interrupting,
    Interrupted,
    Finalized,
}

/// Events of a processing container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerEvent {
    Execute,
    ExecutionCompleted,
    Interrupt,
    InterruptionCompleted,
    Finalize,
}

/// States of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationState {
    New,
    Submitted,
    Executing,
    Completed,
    Failed,
    Finalized,
}

/// Events of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationEvent {
    Submit,
    Execute,
    Complete,
    Fail,
    Finalize,
}

/// States of an application master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MasterState {
    New,
    DagSubmitted,
    Executing,
    ExecutionSucceeded,
    ExecutionFailed,
    Interrupting,
    Interrupted,
    Finalized,
}

/// Events of an application master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MasterEvent {
    SubmitDag,
    ExecuteApplication,
    ExecutionSuccess,
    ExecutionFailure,
    InterruptApplication,
    InterruptionSuccess,
    DestroyApplication,
}

/// Transition table of processing containers.
pub fn container_matrix() -> TransitionMatrix<ContainerState, ContainerEvent> {
    use ContainerEvent as E;
    use ContainerState as S;

    let mut m = TransitionMatrix::new()
        .with(S::New, E::Execute, S::Executing)
        .with(S::Executing, E::ExecutionCompleted, S::Completed)
        .with(S::Executing, E::Interrupt, S::Interrupting)
        .with(S::Interrupting, E::InterruptionCompleted, S::Interrupted);
    for state in [S::New, S::Executing, S::Completed, S::Interrupted] {
        m = m.with(state, E::Finalize, S::Finalized);
    }
    m
}

/// Transition table of applications.
pub fn application_matrix() -> TransitionMatrix<ApplicationState, ApplicationEvent> {
    use ApplicationEvent as E;
    use ApplicationState as S;

    let mut m = TransitionMatrix::new()
        .with(S::New, E::Submit, S::Submitted)
        .with(S::Submitted, E::Execute, S::Executing)
        .with(S::Executing, E::Complete, S::Completed)
        .with(S::Executing, E::Fail, S::Failed);
    for state in [S::New, S::Submitted, S::Executing, S::Completed, S::Failed] {
        m = m.with(state, E::Finalize, S::Finalized);
    }
    m
}

/// Transition table of application masters.
pub fn master_matrix() -> TransitionMatrix<MasterState, MasterEvent> {
    use MasterEvent as E;
    use MasterState as S;

    let mut m = TransitionMatrix::new()
        .with(S::New, E::SubmitDag, S::DagSubmitted)
        .with(S::DagSubmitted, E::ExecuteApplication, S::Executing)
        .with(S::Executing, E::ExecutionSuccess, S::ExecutionSucceeded)
        .with(S::Executing, E::ExecutionFailure, S::ExecutionFailed)
        .with(S::Executing, E::InterruptApplication, S::Interrupting)
        .with(S::Interrupting, E::InterruptionSuccess, S::Interrupted);
    for state in [
        S::DagSubmitted,
        S::Executing,
        S::ExecutionSucceeded,
        S::ExecutionFailed,
        S::Interrupted,
    ] {
        m = m.with(state, E::DestroyApplication, S::Finalized);
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalized_is_terminal_everywhere() {
        assert!(container_matrix().transitions(&ContainerState::Finalized).is_none());
        assert!(application_matrix().transitions(&ApplicationState::Finalized).is_none());
        assert!(master_matrix().transitions(&MasterState::Finalized).is_none());
    }

    #[test]
    fn master_cannot_execute_twice() {
        let m = master_matrix();
        assert_eq!(
            m.next(&MasterState::DagSubmitted, &MasterEvent::ExecuteApplication),
            Some(MasterState::Executing)
        );
        assert_eq!(m.next(&MasterState::Executing, &MasterEvent::ExecuteApplication), None);
    }

    #[test]
    fn outcome_reflects_transition() {
        assert_eq!(outcome(&ContainerEvent::Execute, Some(ContainerState::Executing)), Outcome::Success);
        assert_eq!(outcome::<_, ContainerState>(&ContainerEvent::Execute, None), Outcome::Failure);
    }
}
