//! Editor session state machine
//!
//! One state per open editor. Every operation enters its state through
//! [`EditorStateMachine::try_begin`], which fails with `SessionBusy` unless the
//! session is `Done`, and hands back a [`StateGuard`] that returns the session
//! to `Done` when dropped, whatever the operation's outcome.

use std::fmt;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};

/// Editor session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EditorState {
    /// Idle, ready for the next operation
    #[default]
    Done,
    Importing,
    Processing,
    Loading,
    Saving,
}

impl fmt::Display for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => write!(f, "done"),
            Self::Importing => write!(f, "importing"),
            Self::Processing => write!(f, "processing"),
            Self::Loading => write!(f, "loading"),
            Self::Saving => write!(f, "saving"),
        }
    }
}

/// A state change observed by subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: EditorState,
    pub to: EditorState,
}

/// Gate for the operations of one editor session
#[derive(Debug, Default)]
pub struct EditorStateMachine {
    state: Mutex<EditorState>,
    listeners: Mutex<Vec<Sender<StateTransition>>>,
}

impl EditorStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditorState {
        *self.state.lock()
    }

    pub fn is_busy(&self) -> bool {
        self.state() != EditorState::Done
    }

    /// Enter `state` if the session is idle
    pub fn try_begin(&self, state: EditorState) -> EditorResult<StateGuard<'_>> {
        {
            let mut current = self.state.lock();
            if *current != EditorState::Done {
                return Err(EditorError::SessionBusy {
                    current: *current,
                    requested: state,
                });
            }
            *current = state;
        }
        self.notify(EditorState::Done, state);
        Ok(StateGuard { machine: self })
    }

    /// Receive every future transition
    pub fn subscribe(&self) -> Receiver<StateTransition> {
        let (tx, rx) = unbounded();
        self.listeners.lock().push(tx);
        rx
    }

    fn set(&self, next: EditorState) {
        let previous = std::mem::replace(&mut *self.state.lock(), next);
        if previous != next {
            self.notify(previous, next);
        }
    }

    fn notify(&self, from: EditorState, to: EditorState) {
        log::debug!("Editor state {} -> {}", from, to);
        let transition = StateTransition { from, to };
        // Dropped receivers unsubscribe themselves.
        self.listeners.lock().retain(|tx| tx.send(transition).is_ok());
    }
}

/// Keeps the session in a non-idle state until dropped
#[must_use = "the session returns to Done as soon as the guard is dropped"]
pub struct StateGuard<'a> {
    machine: &'a EditorStateMachine,
}

impl StateGuard<'_> {
    /// Move to the next phase of the running operation
    pub fn advance(&self, next: EditorState) {
        self.machine.set(next);
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.machine.set(EditorState::Done);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentry_is_rejected() {
        let machine = EditorStateMachine::new();
        let guard = machine.try_begin(EditorState::Importing).unwrap();

        match machine.try_begin(EditorState::Saving) {
            Err(EditorError::SessionBusy { current, requested }) => {
                assert_eq!(current, EditorState::Importing);
                assert_eq!(requested, EditorState::Saving);
            }
            Err(other) => panic!("expected SessionBusy, got {:?}", other),
            Ok(_) => panic!("re-entry was accepted"),
        }

        drop(guard);
        assert_eq!(machine.state(), EditorState::Done);
        assert!(machine.try_begin(EditorState::Saving).is_ok());
    }

    #[test]
    fn test_guard_resets_on_panic() {
        let machine = EditorStateMachine::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = machine.try_begin(EditorState::Loading).unwrap();
            panic!("worker blew up");
        }));
        assert!(result.is_err());
        assert!(!machine.is_busy());
    }

    #[test]
    fn test_subscribers_see_transitions() {
        let machine = EditorStateMachine::new();
        let rx = machine.subscribe();
        {
            let guard = machine.try_begin(EditorState::Importing).unwrap();
            guard.advance(EditorState::Loading);
        }

        let seen: Vec<_> = rx.try_iter().map(|t| (t.from, t.to)).collect();
        assert_eq!(
            seen,
            vec![
                (EditorState::Done, EditorState::Importing),
                (EditorState::Importing, EditorState::Loading),
                (EditorState::Loading, EditorState::Done),
            ]
        );
    }
}
