//! Lock phase state machine.
//!
//! The handlers coordinate through flags in [`DeviceState`](crate::DeviceState);
//! this module records which phase those flags put the lock in and rejects
//! any change that skips a step.
//!
//! # Phases
//!
//! - `Entry`: sampling enabled, digits are being captured
//! - `Validating`: four digits captured, sampling and the timer stopped
//! - `Holding`: feedback shown, one indicator lit, counting hold ticks
//! - `Resetting`: hold threshold reached, restoring the entry prompt
//!
//! # Valid Transitions
//!
//! - Entry → Validating → Holding → Resetting → Entry
//!
//! # Examples
//!
//! ```
//! use elock_emulator::{LockPhase, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), &LockPhase::Entry);
//!
//! machine.transition_to(LockPhase::Validating).unwrap();
//! assert!(machine.transition_to(LockPhase::Entry).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use elock_core::{Error, Result};

/// Maximum number of transitions kept in history.
///
/// A full entry cycle is four transitions, so this covers the last 25
/// attempts.
const MAX_HISTORY_SIZE: usize = 100;

/// Phase of the lock's entry/feedback cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockPhase {
    /// Sampling the potentiometer and capturing digits on each press.
    #[default]
    Entry,

    /// Comparing the captured digits against the password.
    Validating,

    /// Showing the result with one indicator lit until the hold expires.
    Holding,

    /// Turning the indicator off and restoring the entry prompt.
    Resetting,
}

impl fmt::Display for LockPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            LockPhase::Entry => "Entry",
            LockPhase::Validating => "Validating",
            LockPhase::Holding => "Holding",
            LockPhase::Resetting => "Resetting",
        };
        write!(f, "{}", phase)
    }
}

impl LockPhase {
    /// Check if moving to `target` is allowed from this phase.
    ///
    /// # Examples
    ///
    /// ```
    /// use elock_emulator::LockPhase;
    ///
    /// assert!(LockPhase::Entry.can_transition_to(&LockPhase::Validating));
    /// assert!(!LockPhase::Holding.can_transition_to(&LockPhase::Entry));
    /// ```
    pub fn can_transition_to(&self, target: &LockPhase) -> bool {
        matches!(
            (self, target),
            (LockPhase::Entry, LockPhase::Validating)
                | (LockPhase::Validating, LockPhase::Holding)
                | (LockPhase::Holding, LockPhase::Resetting)
                | (LockPhase::Resetting, LockPhase::Entry)
        )
    }

    /// Returns `true` if a button press in this phase captures a digit.
    pub fn accepts_entry(&self) -> bool {
        matches!(self, LockPhase::Entry)
    }
}

/// One recorded phase change.
///
/// The timestamp is not serialized; deserialized records carry the time
/// of deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: LockPhase,
    pub to: LockPhase,

    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    pub fn new(from: LockPhase, to: LockPhase) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }
}

/// Tracks the lock phase and a bounded history of changes.
///
/// Not thread-safe; it lives inside the device state, which the runtime
/// owns exclusively.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current_state: LockPhase,
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a machine in the `Entry` phase.
    pub fn new() -> Self {
        Self {
            current_state: LockPhase::Entry,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> &LockPhase {
        &self.current_state
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    /// Move to `new_state` if the transition is allowed.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the transition is not
    /// allowed from the current phase. The machine is left unchanged.
    pub fn transition_to(&mut self, new_state: LockPhase) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        self.perform_state_change(new_state, transition.clone());
        Ok(transition)
    }

    /// Force the machine back to `Entry`, recording the jump.
    pub fn reset(&mut self) -> StateTransition {
        let transition = StateTransition::new(self.current_state, LockPhase::Entry);
        self.perform_state_change(LockPhase::Entry, transition.clone());
        transition
    }

    fn perform_state_change(&mut self, new_state: LockPhase, transition: StateTransition) {
        self.current_state = new_state;

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
