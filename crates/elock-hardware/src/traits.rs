//! Peripheral trait definitions.
//!
//! These traits are the contract between the lock's interrupt handlers and
//! the peripherals they drive: a character display, the potentiometer's
//! analog channel, the button line and the indicator outputs. Every method
//! is synchronous and infallible, matching register-level access on the
//! target; simulated implementations live in [`crate::mock`] and in the
//! emulator crate.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use elock_core::constants::{
    ASCII_CLAMP_END, ASCII_NINE, ASCII_ZERO, CODE_LENGTH, LCD_CLEAR, LCD_DISPLAY_ON,
    LCD_ENTRY_MODE, LCD_FUNCTION_SET, LCD_SET_CURSOR, PROMPT_POSITION, PROMPT_TEXT,
};

/// Two-line character display driven by instructions and data bytes.
///
/// Implementors provide the three primitive transfers (`reset`, `command`,
/// `write_data`). The higher-level operations used by the lock are
/// provided on top of them and should not normally be overridden.
///
/// # Examples
///
/// ```
/// use elock_hardware::traits::CharacterDisplay;
///
/// #[derive(Default)]
/// struct Recorder(Vec<u8>);
///
/// impl CharacterDisplay for Recorder {
///     fn reset(&mut self) {}
///     fn command(&mut self, instruction: u8) {
///         self.0.push(instruction);
///     }
///     fn write_data(&mut self, byte: u8) {
///         self.0.push(byte);
///     }
/// }
///
/// let mut lcd = Recorder::default();
/// lcd.text("OK", 0x84);
/// assert_eq!(lcd.0, vec![0x84, b'O', b'K']);
/// ```
pub trait CharacterDisplay {
    /// Bring the controller to a known state, ready to accept instructions.
    fn reset(&mut self);

    /// Send a control instruction (clear, set cursor, entry mode, ...).
    fn command(&mut self, instruction: u8);

    /// Write one raw character at the cursor, advancing it.
    fn write_data(&mut self, byte: u8);

    /// Write one visible character at the cursor.
    ///
    /// Codes just above `'9'` (`':'` through `'@'`) are clamped down to
    /// `'9'`, so an out-of-range digit never shows as punctuation.
    fn display(&mut self, byte: u8) {
        let byte = if (ASCII_NINE + 1..=ASCII_CLAMP_END).contains(&byte) {
            ASCII_NINE
        } else {
            byte
        };
        self.write_data(byte);
    }

    /// Move the cursor to `position` and write `text` character by character.
    fn text(&mut self, text: &str, position: u8) {
        self.command(position);
        for byte in text.bytes() {
            self.display(byte);
        }
    }

    /// Show the entry prompt: all-zero digits, prompt text on line 2 and
    /// the cursor parked on the first digit.
    fn begin(&mut self) {
        self.command(LCD_SET_CURSOR);
        for _ in 0..CODE_LENGTH {
            self.display(ASCII_ZERO);
        }
        self.text(PROMPT_TEXT, PROMPT_POSITION);
        self.command(LCD_SET_CURSOR);
    }

    /// Full power-on sequence ending in the entry prompt.
    fn initialization(&mut self) {
        self.reset();
        self.command(LCD_FUNCTION_SET);
        self.command(LCD_DISPLAY_ON);
        self.command(LCD_ENTRY_MODE);
        self.command(LCD_CLEAR);
        self.begin();
    }
}

/// Analog channel holding the result of the latest conversion.
pub trait AnalogInput {
    /// Latest 12-bit reading (0-4095).
    fn read(&self) -> u16;
}

/// Discrete input line, such as a push button.
pub trait DigitalInput {
    /// Returns `true` while the line is at its active level.
    fn is_asserted(&self) -> bool;
}

/// Source of falling-edge events on a discrete input line.
///
/// Uses native `async fn` in traits, so the trait is not object-safe;
/// take it as a generic parameter.
pub trait EdgeSource {
    /// Wait for the next falling edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the line can no longer produce edges.
    async fn wait_edge(&mut self) -> Result<()>;

    /// Discard edges that are already queued, returning how many were
    /// discarded.
    fn drain_edges(&mut self) -> usize;
}

/// Discrete output line, such as an indicator LED.
pub trait DigitalOutput {
    /// Drive the line high.
    fn set_high(&mut self);

    /// Drive the line low.
    fn set_low(&mut self);

    /// Returns `true` if the line is currently driven high.
    fn is_set_high(&self) -> bool;

    /// Invert the current level.
    fn toggle(&mut self) {
        if self.is_set_high() {
            self.set_low();
        } else {
            self.set_high();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Default)]
    struct Recorder {
        commands: Vec<u8>,
        data: Vec<u8>,
        resets: usize,
    }

    impl CharacterDisplay for Recorder {
        fn reset(&mut self) {
            self.resets += 1;
        }

        fn command(&mut self, instruction: u8) {
            self.commands.push(instruction);
        }

        fn write_data(&mut self, byte: u8) {
            self.data.push(byte);
        }
    }

    #[rstest]
    #[case(b'0', b'0')]
    #[case(b'9', b'9')]
    #[case(b':', b'9')] // first clamped code
    #[case(b'?', b'9')]
    #[case(b'@', b'9')] // last clamped code
    #[case(b'A', b'A')]
    #[case(b'/', b'/')]
    fn test_display_clamps_above_nine(#[case] input: u8, #[case] expected: u8) {
        let mut lcd = Recorder::default();
        lcd.display(input);
        assert_eq!(lcd.data, vec![expected]);
    }

    #[test]
    fn test_text_positions_then_writes() {
        let mut lcd = Recorder::default();
        lcd.text("WRONG", 0x85);

        assert_eq!(lcd.commands, vec![0x85]);
        assert_eq!(lcd.data, b"WRONG".to_vec());
    }

    #[test]
    fn test_begin_writes_zeros_and_prompt() {
        let mut lcd = Recorder::default();
        lcd.begin();

        assert_eq!(lcd.commands, vec![0x80, 0xC1, 0x80]);
        assert_eq!(lcd.data, b"0000Enter PW".to_vec());
    }

    #[test]
    fn test_initialization_sequence() {
        let mut lcd = Recorder::default();
        lcd.initialization();

        assert_eq!(lcd.resets, 1);
        assert_eq!(lcd.commands[..5], [0x28, 0x0C, 0x06, 0x01, 0x80]);
    }

    #[test]
    fn test_output_toggle() {
        struct Pin(bool);

        impl DigitalOutput for Pin {
            fn set_high(&mut self) {
                self.0 = true;
            }
            fn set_low(&mut self) {
                self.0 = false;
            }
            fn is_set_high(&self) -> bool {
                self.0
            }
        }

        let mut pin = Pin(false);
        pin.toggle();
        assert!(pin.is_set_high());
        pin.toggle();
        assert!(!pin.is_set_high());
    }
}
