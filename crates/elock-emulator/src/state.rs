//! State shared between the interrupt handlers and the entry controller.
//!
//! Each field has a fixed set of writers:
//!
//! | field              | set by                 | cleared/reset by         |
//! |--------------------|------------------------|--------------------------|
//! | `entry`            | entry controller       | validator (rewind)       |
//! | `pressed`          | button edge detector   | entry controller         |
//! | `sampling_enabled` | hold timer             | entry controller         |
//! | `result`           | validator (downgrade)  | hold timer               |
//! | `hold_ticks`       | hold timer             | feedback, hold timer     |
//!
//! The runtime runs one handler at a time to completion, so no field is
//! ever observed half-updated.

use tracing::warn;

use elock_core::{EntryBuffer, ValidationResult};

use crate::state_machine::{LockPhase, StateMachine};

#[derive(Debug, Clone)]
pub struct DeviceState {
    /// Captured digits and the slot the next one goes into.
    pub entry: EntryBuffer,

    /// A debounced press is waiting to be consumed.
    pub pressed: bool,

    /// The sampler may write digits to the display.
    pub sampling_enabled: bool,

    /// Outcome of the latest validation.
    pub result: ValidationResult,

    /// Hold ticks counted since feedback was shown.
    pub hold_ticks: u8,

    phase: StateMachine,
}

impl DeviceState {
    /// Power-on state: slot 0, sampling enabled, result `Correct`.
    pub fn new() -> Self {
        Self {
            entry: EntryBuffer::new(),
            pressed: false,
            sampling_enabled: true,
            result: ValidationResult::default(),
            hold_ticks: 0,
            phase: StateMachine::new(),
        }
    }

    pub fn phase(&self) -> LockPhase {
        *self.phase.current_state()
    }

    pub fn phase_machine(&self) -> &StateMachine {
        &self.phase
    }

    /// Record that the handlers moved the lock into `next`.
    ///
    /// An out-of-order change is logged and the machine is forced back into
    /// step, since the flags above remain the source of truth.
    pub fn advance(&mut self, next: LockPhase) {
        if let Err(error) = self.phase.transition_to(next) {
            warn!(%error, "phase out of step");
            if next == LockPhase::Entry {
                self.phase.reset();
            }
        }
    }

    /// Returns `true` when sampling and the hold countdown are mutually
    /// exclusive, as the phase says they should be.
    pub fn is_consistent(&self) -> bool {
        self.sampling_enabled == self.phase().accepts_entry()
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}
