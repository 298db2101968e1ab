//! Conversion-complete handler.

use tracing::trace;

use elock_core::Digit;
use elock_core::constants::LCD_SET_CURSOR;
use elock_hardware::{AnalogInput, CharacterDisplay, DigitalOutput, Interrupt};

use crate::board::Board;
use crate::state::DeviceState;

/// Shows the digit the potentiometer currently selects.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalogSampler;

impl AnalogSampler {
    /// Service `SampleReady`.
    ///
    /// While sampling is enabled the digit is written at the current slot
    /// on line 1. The activity LED toggles on every conversion, shown or
    /// not. Returns the digit derived from the conversion.
    pub fn on_sample_ready<D, A, B, O>(
        &self,
        board: &mut Board<D, A, B, O>,
        state: &DeviceState,
    ) -> Digit
    where
        D: CharacterDisplay,
        A: AnalogInput,
        O: DigitalOutput,
    {
        let digit = Digit::from_sample(board.adc.memory());

        if state.sampling_enabled && !state.entry.is_complete() {
            let slot = state.entry.slot() as u8;
            board.display.command(LCD_SET_CURSOR + slot);
            board.display.display(digit.to_ascii());
            trace!(slot, %digit, "sample shown");
        }

        board.activity_led.toggle();
        board.interrupts.clear_pending(Interrupt::SampleReady);
        digit
    }
}
