//! Entry controller, validator and feedback.
//!
//! The controller runs once per main-loop iteration. It consumes the
//! pressed flag, captures the digit under the knob and, after the fourth
//! digit, runs validation and feedback inline before returning.

use std::time::Duration;

use tracing::{debug, info, warn};

use elock_core::constants::{
    LCD_CLEAR, PASSWORD_POSITION, PASSWORD_TEXT, UNLOCKED_POSITION, UNLOCKED_TEXT,
    WRONG_POSITION, WRONG_TEXT,
};
use elock_core::{Digit, Password, ValidationResult};
use elock_hardware::{CharacterDisplay, DigitalOutput, Interrupt};

use crate::board::Board;
use crate::state::DeviceState;
use crate::state_machine::LockPhase;

/// What one controller step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No press was waiting.
    Idle,
    /// A digit was stored; `slot` is the slot it went into.
    Captured { slot: usize, digit: Digit },
    /// A press arrived outside entry and was discarded.
    Dropped,
    /// The fourth digit completed the entry and feedback is showing.
    Validated(ValidationResult),
}

/// Orchestrates capture, validation and feedback.
#[derive(Debug, Clone)]
pub struct EntryController {
    password: Password,
    hold_tick: Duration,
    message_delay: Duration,
}

impl EntryController {
    /// `hold_tick` is loaded into the shared timer when feedback is shown;
    /// `message_delay` separates the two halves of the failure message.
    pub fn new(password: Password, hold_tick: Duration, message_delay: Duration) -> Self {
        Self {
            password,
            hold_tick,
            message_delay,
        }
    }

    /// Run one main-loop step.
    pub async fn step<D, A, B, O>(
        &self,
        board: &mut Board<D, A, B, O>,
        state: &mut DeviceState,
    ) -> StepOutcome
    where
        D: CharacterDisplay,
        O: DigitalOutput,
    {
        if !state.pressed {
            return StepOutcome::Idle;
        }

        let mut outcome = StepOutcome::Dropped;

        if state.sampling_enabled {
            let digit = Digit::from_sample(board.adc.memory());
            match state.entry.capture(digit) {
                Ok(next) => {
                    debug!(slot = next - 1, %digit, "digit captured");
                    outcome = StepOutcome::Captured {
                        slot: next - 1,
                        digit,
                    };
                }
                Err(error) => warn!(%error, "capture skipped"),
            }
        }

        if state.entry.is_complete() {
            state.sampling_enabled = false;
            let result = self.validate(board, state);
            self.feedback(board, state).await;
            outcome = StepOutcome::Validated(result);
        }

        if outcome == StepOutcome::Dropped {
            debug!(phase = %state.phase(), "press dropped");
        }

        state.pressed = false;
        outcome
    }

    /// Stop sampling and the timer, then compare the entry to the password.
    ///
    /// The result may only move from `Correct` to `Incorrect`. The slot
    /// index is rewound so the next entry starts at slot 0.
    pub fn validate<D, A, B, O>(
        &self,
        board: &mut Board<D, A, B, O>,
        state: &mut DeviceState,
    ) -> ValidationResult {
        state.advance(LockPhase::Validating);

        board.adc.disable_conversion();
        board.interrupts.disable(Interrupt::SampleReady);
        board.timer.stop();

        if !self.password.verify(state.entry.digits()).is_correct() {
            state.result.downgrade();
        }
        state.entry.rewind();

        info!(result = %state.result, "entry validated");
        state.result
    }

    /// Show the result, light its indicator and arm the hold countdown.
    pub async fn feedback<D, A, B, O>(
        &self,
        board: &mut Board<D, A, B, O>,
        state: &mut DeviceState,
    ) where
        D: CharacterDisplay,
        O: DigitalOutput,
    {
        board.display.command(LCD_CLEAR);
        match state.result {
            ValidationResult::Correct => {
                board.display.text(UNLOCKED_TEXT, UNLOCKED_POSITION);
            }
            ValidationResult::Incorrect => {
                board.display.text(WRONG_TEXT, WRONG_POSITION);
                tokio::time::sleep(self.message_delay).await;
                board.display.text(PASSWORD_TEXT, PASSWORD_POSITION);
            }
        }

        state.hold_ticks = 0;
        board.timer.start(self.hold_tick);
        board.interrupts.clear_pending(Interrupt::TickElapsed);
        board.interrupts.enable(Interrupt::TickElapsed);

        board.indicator_mut(state.result.indicator()).set_high();
        state.advance(LockPhase::Holding);
    }
}
