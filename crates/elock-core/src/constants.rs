//! Core constants for the electric lock.
//!
//! This module collects the fixed values that define the lock's behavior:
//! code length, the stored password, timing of the sampling and hold
//! timers, the analog range of the potentiometer, and the instruction set
//! of the two-line character display.
//!
//! # Display Addressing
//!
//! The display uses DDRAM addresses with bit 7 set as the "set cursor"
//! instruction:
//!
//! ```text
//! line 1: 0x80 0x81 0x82 0x83 ...   (digit slots live at 0x80-0x83)
//! line 2: 0xC0 0xC1 ...             (prompt starts at 0xC1)
//! ```
//!
//! # Usage
//!
//! ```
//! use elock_core::constants::*;
//!
//! assert_eq!(CODE_LENGTH, 4);
//! assert_eq!(LCD_SET_CURSOR + 2, 0x82);
//! assert_eq!(DEFAULT_PASSWORD, [1, 2, 3, 4]);
//! ```

// ============================================================================
// Entry
// ============================================================================

/// Number of digits in an entered code.
pub const CODE_LENGTH: usize = 4;

/// Largest value a single digit can take.
pub const MAX_DIGIT: u8 = 9;

/// Password stored in the lock when no configuration overrides it.
pub const DEFAULT_PASSWORD: [u8; CODE_LENGTH] = [1, 2, 3, 4];

// ============================================================================
// Analog Input
// ============================================================================

/// Largest raw reading of the 12-bit converter.
pub const ADC_MAX: u16 = 4095;

/// Shift applied to a raw reading before masking out the digit nibble.
pub const ADC_DIGIT_SHIFT: u16 = 8;

/// Mask applied to the shifted reading.
pub const ADC_DIGIT_MASK: u16 = 0x0F;

// ============================================================================
// Timing
// ============================================================================

/// Free-run period of the shared timer while digits are being entered (ms).
///
/// One conversion is triggered per period, giving the 2 Hz refresh of the
/// digit under the cursor.
pub const DEFAULT_SAMPLE_PERIOD_MS: u64 = 500;

/// Period of the shared timer while an indicator is held (ms).
pub const DEFAULT_HOLD_TICK_MS: u64 = 1000;

/// Number of hold ticks after which the lock resets for a new entry.
pub const DEFAULT_HOLD_TICKS: u8 = 3;

/// Minimum time the button line must stay asserted to count as a press (ms).
pub const DEFAULT_DEBOUNCE_MS: u64 = 20;

/// Pause between the two halves of the failure message (ms).
pub const DEFAULT_MESSAGE_DELAY_MS: u64 = 1;

// ============================================================================
// Display Instructions
// ============================================================================

/// Clear display and return the cursor home.
pub const LCD_CLEAR: u8 = 0x01;

/// Entry mode: increment cursor, no display shift.
pub const LCD_ENTRY_MODE: u8 = 0x06;

/// Display control: display on, cursor off.
pub const LCD_DISPLAY_ON: u8 = 0x0C;

/// Function set: 4-bit bus, two lines, 5x7 font.
pub const LCD_FUNCTION_SET: u8 = 0x28;

/// Set-cursor instruction; OR it with a DDRAM address.
pub const LCD_SET_CURSOR: u8 = 0x80;

/// DDRAM address of the first column of the second line.
pub const LCD_LINE2_ADDRESS: u8 = 0x40;

/// ASCII code of the character `'0'`.
pub const ASCII_ZERO: u8 = 0x30;

/// ASCII code of the character `'9'`.
pub const ASCII_NINE: u8 = 0x39;

/// Highest code the display clamps down to `'9'` (the `'@'` character).
pub const ASCII_CLAMP_END: u8 = 0x40;

/// Default number of display lines.
pub const DEFAULT_LCD_LINES: usize = 2;

/// Default number of characters per display line.
pub const DEFAULT_LCD_COLUMNS: usize = 16;

/// Default number of display port writes kept in the bus trace.
pub const DEFAULT_LCD_TRACE_CAPACITY: usize = 64;

// ============================================================================
// Messages
// ============================================================================

/// Prompt shown below the digits while entering a code.
pub const PROMPT_TEXT: &str = "Enter PW";

/// Cursor instruction for the prompt (line 2, column 1).
pub const PROMPT_POSITION: u8 = 0xC1;

/// Message shown after a correct code.
pub const UNLOCKED_TEXT: &str = "UNLOCKED";

/// Cursor instruction for the unlocked message (line 1, column 4).
pub const UNLOCKED_POSITION: u8 = 0x84;

/// First half of the failure message.
pub const WRONG_TEXT: &str = "WRONG";

/// Cursor instruction for the first half of the failure message.
pub const WRONG_POSITION: u8 = 0x85;

/// Second half of the failure message.
pub const PASSWORD_TEXT: &str = "PASSWORD";

/// Cursor instruction for the second half of the failure message.
pub const PASSWORD_POSITION: u8 = 0xC4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_slots_fit_on_first_line() {
        let last_slot = LCD_SET_CURSOR + (CODE_LENGTH as u8 - 1);
        assert!(last_slot < LCD_SET_CURSOR + DEFAULT_LCD_COLUMNS as u8);
    }

    #[test]
    fn test_message_positions_are_cursor_instructions() {
        for position in [
            PROMPT_POSITION,
            UNLOCKED_POSITION,
            WRONG_POSITION,
            PASSWORD_POSITION,
        ] {
            assert_eq!(position & LCD_SET_CURSOR, LCD_SET_CURSOR);
        }
    }

    #[test]
    fn test_display_on_hides_cursor() {
        assert_eq!(LCD_DISPLAY_ON & 0x04, 0x04);
        assert_eq!(LCD_DISPLAY_ON & 0x03, 0);
    }

    #[test]
    fn test_ascii_digit_range() {
        assert_eq!(ASCII_NINE - ASCII_ZERO, MAX_DIGIT);
        assert_eq!(ASCII_CLAMP_END, b'@');
    }

    #[test]
    fn test_default_password_digits_are_valid() {
        assert!(DEFAULT_PASSWORD.iter().all(|d| *d <= MAX_DIGIT));
    }
}
