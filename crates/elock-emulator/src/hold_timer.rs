//! Hold countdown and return to the entry prompt.

use std::time::Duration;

use tracing::{debug, info};

use elock_core::ValidationResult;
use elock_core::constants::LCD_CLEAR;
use elock_hardware::{CharacterDisplay, DigitalOutput, Interrupt};

use crate::board::Board;
use crate::state::DeviceState;
use crate::state_machine::LockPhase;

/// Result of one hold tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still holding; carries the tick count so far.
    Counting(u8),
    /// The threshold was reached and the lock is back at the prompt.
    Reset,
}

/// Counts hold ticks after feedback and restores the entry state.
#[derive(Debug, Clone, Copy)]
pub struct HoldTimer {
    threshold: u8,
    sample_period: Duration,
}

impl HoldTimer {
    /// `threshold` is the tick count that ends the hold; `sample_period`
    /// is restored on the shared timer afterwards.
    pub fn new(threshold: u8, sample_period: Duration) -> Self {
        Self {
            threshold,
            sample_period,
        }
    }

    /// Service `TickElapsed`.
    pub fn on_tick<D, A, B, O>(
        &self,
        board: &mut Board<D, A, B, O>,
        state: &mut DeviceState,
    ) -> TickOutcome
    where
        D: CharacterDisplay,
        O: DigitalOutput,
    {
        state.hold_ticks = state.hold_ticks.saturating_add(1);

        let outcome = if state.hold_ticks >= self.threshold {
            self.reset(board, state);
            TickOutcome::Reset
        } else {
            debug!(ticks = state.hold_ticks, "hold tick");
            TickOutcome::Counting(state.hold_ticks)
        };

        board.interrupts.clear_pending(Interrupt::TickElapsed);
        outcome
    }

    fn reset<D, A, B, O>(&self, board: &mut Board<D, A, B, O>, state: &mut DeviceState)
    where
        D: CharacterDisplay,
        O: DigitalOutput,
    {
        state.advance(LockPhase::Resetting);

        board.indicator_mut(state.result.indicator()).set_low();
        board.interrupts.disable(Interrupt::TickElapsed);

        board.display.command(LCD_CLEAR);
        board.display.begin();

        state.result = ValidationResult::Correct;
        state.hold_ticks = 0;
        state.entry.rewind();

        board.timer.start(self.sample_period);
        board.adc.enable_conversion();
        board.interrupts.enable(Interrupt::SampleReady);
        state.sampling_enabled = true;

        state.advance(LockPhase::Entry);
        info!("hold expired, entry prompt restored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::VirtualLcd;
    use elock_core::Indicator;
    use elock_hardware::mock::{MockButton, MockOutput, MockOutputHandle, MockPotentiometer};

    type TestBoard = Board<VirtualLcd, MockPotentiometer, MockButton, MockOutput>;

    /// A board and state as feedback leaves them.
    fn holding(result: ValidationResult) -> (TestBoard, DeviceState, [MockOutputHandle; 2]) {
        let (pot, _) = MockPotentiometer::new();
        let (button, _) = MockButton::new();
        let (success, success_probe) = MockOutput::new("success");
        let (failure, failure_probe) = MockOutput::new("failure");
        let (activity, _) = MockOutput::new("activity");
        let mut board = Board::new(VirtualLcd::default(), pot, button, success, failure, activity);
        board.power_on(Duration::from_millis(500));

        let mut state = DeviceState::new();
        state.sampling_enabled = false;
        state.result = result;
        state.advance(LockPhase::Validating);
        state.advance(LockPhase::Holding);

        board.adc.disable_conversion();
        board.interrupts.disable(Interrupt::SampleReady);
        board.timer.start(Duration::from_secs(1));
        board.interrupts.enable(Interrupt::TickElapsed);
        board.indicator_mut(result.indicator()).set_high();
        board.display.command(LCD_CLEAR);
        board.display.text("UNLOCKED", 0x84);

        (board, state, [success_probe, failure_probe])
    }

    #[test]
    fn test_counts_below_threshold() {
        let (mut board, mut state, [success, _]) = holding(ValidationResult::Correct);
        let timer = HoldTimer::new(3, Duration::from_millis(500));

        assert_eq!(timer.on_tick(&mut board, &mut state), TickOutcome::Counting(1));
        assert_eq!(timer.on_tick(&mut board, &mut state), TickOutcome::Counting(2));

        assert!(success.is_high());
        assert_eq!(state.phase(), LockPhase::Holding);
        assert!(!board.interrupts.is_pending(Interrupt::TickElapsed));
    }

    #[test]
    fn test_third_tick_resets() {
        let (mut board, mut state, [success, failure]) = holding(ValidationResult::Correct);
        let timer = HoldTimer::new(3, Duration::from_millis(500));

        timer.on_tick(&mut board, &mut state);
        timer.on_tick(&mut board, &mut state);
        assert_eq!(timer.on_tick(&mut board, &mut state), TickOutcome::Reset);

        assert!(!success.is_high());
        assert!(!failure.is_high());
        assert_eq!(state.hold_ticks, 0);
        assert_eq!(state.result, ValidationResult::Correct);
        assert!(state.sampling_enabled);
        assert_eq!(state.phase(), LockPhase::Entry);
        assert!(state.is_consistent());

        assert!(!board.interrupts.is_enabled(Interrupt::TickElapsed));
        assert!(board.interrupts.is_enabled(Interrupt::SampleReady));
        assert!(board.adc.is_conversion_enabled());
        assert_eq!(board.timer.period(), Duration::from_millis(500));
        assert_eq!(board.display.get_line(0).unwrap().trim(), "0000");
        assert_eq!(board.display.get_line(1).unwrap().trim(), "Enter PW");
    }

    #[test]
    fn test_reset_after_failure_clears_failure_led() {
        let (mut board, mut state, [_, failure]) = holding(ValidationResult::Incorrect);
        let timer = HoldTimer::new(3, Duration::from_millis(500));
        assert!(failure.is_high());

        for _ in 0..3 {
            timer.on_tick(&mut board, &mut state);
        }

        assert!(!failure.is_high());
        assert_eq!(state.result, ValidationResult::Correct);
        assert_eq!(board.lit_indicators(), 0);
        assert_eq!(state.result.indicator(), Indicator::Success);
    }

    #[test]
    fn test_custom_threshold() {
        let (mut board, mut state, _) = holding(ValidationResult::Correct);
        let timer = HoldTimer::new(1, Duration::from_millis(250));

        assert_eq!(timer.on_tick(&mut board, &mut state), TickOutcome::Reset);
        assert_eq!(board.timer.period(), Duration::from_millis(250));
    }
}
