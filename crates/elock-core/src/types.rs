use crate::{
    Result,
    constants::{
        ADC_DIGIT_MASK, ADC_DIGIT_SHIFT, ASCII_ZERO, CODE_LENGTH, DEFAULT_PASSWORD, MAX_DIGIT,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single decimal digit (0-9) of an entered code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

impl Digit {
    /// The digit zero, shown in every slot at the start of an entry.
    pub const ZERO: Digit = Digit(0);

    /// Create a digit with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidDigit` if the value is greater than 9.
    pub fn new(value: u8) -> Result<Self> {
        if value > MAX_DIGIT {
            return Err(Error::InvalidDigit { value });
        }
        Ok(Digit(value))
    }

    /// Quantize a raw 12-bit converter reading into a digit.
    ///
    /// The digit is the high nibble of the reading (`(raw >> 8) & 0x0F`),
    /// clamped so that nibbles 10-15 all map to 9.
    ///
    /// # Examples
    ///
    /// ```
    /// use elock_core::Digit;
    ///
    /// assert_eq!(Digit::from_sample(0x0000).as_u8(), 0);
    /// assert_eq!(Digit::from_sample(0x03FF).as_u8(), 3);
    /// assert_eq!(Digit::from_sample(0x0A00).as_u8(), 9);
    /// assert_eq!(Digit::from_sample(0x0FFF).as_u8(), 9);
    /// ```
    #[must_use]
    pub fn from_sample(raw: u16) -> Self {
        let nibble = ((raw >> ADC_DIGIT_SHIFT) & ADC_DIGIT_MASK) as u8;
        Digit(nibble.min(MAX_DIGIT))
    }

    /// Get the raw digit value.
    #[inline]
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self.0
    }

    /// ASCII code of this digit, as written to the display.
    #[inline]
    #[must_use]
    pub fn to_ascii(self) -> u8 {
        ASCII_ZERO + self.0
    }
}

impl TryFrom<u8> for Digit {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Digit::new(value)
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> u8 {
        digit.0
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of comparing an entry against the password.
///
/// Defaults to `Correct`; a comparison may only downgrade it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationResult {
    #[default]
    Correct,
    Incorrect,
}

impl ValidationResult {
    /// Downgrade the result to `Incorrect`. There is no upgrade path.
    #[inline]
    pub fn downgrade(&mut self) {
        *self = ValidationResult::Incorrect;
    }

    /// Returns `true` if the entry matched.
    #[inline]
    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, ValidationResult::Correct)
    }

    /// Indicator output that reports this result.
    #[must_use]
    pub fn indicator(self) -> Indicator {
        match self {
            ValidationResult::Correct => Indicator::Success,
            ValidationResult::Incorrect => Indicator::Failure,
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationResult::Correct => write!(f, "Correct"),
            ValidationResult::Incorrect => write!(f, "Incorrect"),
        }
    }
}

/// The two discrete feedback outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Success,
    Failure,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Indicator::Success => write!(f, "Success"),
            Indicator::Failure => write!(f, "Failure"),
        }
    }
}

/// The fixed code that opens the lock.
///
/// Written and parsed as four ASCII digits (`"1234"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Password([Digit; CODE_LENGTH]);

impl Password {
    /// Create a password from raw digit values.
    ///
    /// # Errors
    /// Returns `Error::InvalidDigit` if any value is greater than 9.
    pub fn new(digits: [u8; CODE_LENGTH]) -> Result<Self> {
        let mut out = [Digit::ZERO; CODE_LENGTH];
        for (slot, value) in out.iter_mut().zip(digits) {
            *slot = Digit::new(value)?;
        }
        Ok(Password(out))
    }

    /// Get the password digits in entry order.
    #[must_use]
    pub fn digits(&self) -> &[Digit; CODE_LENGTH] {
        &self.0
    }

    /// Compare an entry against the password, slot 0 first.
    ///
    /// Stops at the first mismatching slot. The result starts out
    /// `Correct` and is only ever downgraded, so a later matching slot can
    /// never overwrite an earlier mismatch.
    ///
    /// # Examples
    ///
    /// ```
    /// use elock_core::{Digit, Password, ValidationResult};
    ///
    /// let password = Password::new([1, 2, 3, 4]).unwrap();
    /// let entry = [1, 2, 3, 5].map(|d| Digit::new(d).unwrap());
    /// assert_eq!(password.verify(&entry), ValidationResult::Incorrect);
    /// ```
    #[must_use]
    pub fn verify(&self, entry: &[Digit; CODE_LENGTH]) -> ValidationResult {
        let mut result = ValidationResult::default();
        for (entered, expected) in entry.iter().zip(self.0.iter()) {
            if entered != expected {
                result.downgrade();
                break;
            }
        }
        result
    }
}

impl Default for Password {
    fn default() -> Self {
        Password(DEFAULT_PASSWORD.map(Digit))
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for digit in &self.0 {
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Password {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != CODE_LENGTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidPassword(format!(
                "expected {CODE_LENGTH} decimal digits, got '{s}'"
            )));
        }

        let mut digits = [0u8; CODE_LENGTH];
        for (slot, byte) in digits.iter_mut().zip(s.bytes()) {
            *slot = byte - b'0';
        }
        Password::new(digits)
    }
}

impl TryFrom<String> for Password {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Password> for String {
    fn from(password: Password) -> String {
        password.to_string()
    }
}

/// The four-slot buffer the entry controller captures digits into.
///
/// Rewinding only moves the slot index back to 0; previous contents stay
/// in place until they are overwritten by the next entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntryBuffer {
    digits: [Digit; CODE_LENGTH],
    slot: usize,
}

impl EntryBuffer {
    /// Create an empty buffer positioned at slot 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the slot the next captured digit goes into (0-4).
    #[inline]
    #[must_use]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Returns `true` once all four slots have been captured.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.slot >= CODE_LENGTH
    }

    /// Store a digit in the current slot and advance.
    ///
    /// Returns the slot index after advancing.
    ///
    /// # Errors
    /// Returns `Error::BufferFull` if all four slots are already captured.
    pub fn capture(&mut self, digit: Digit) -> Result<usize> {
        if self.is_complete() {
            return Err(Error::BufferFull);
        }
        self.digits[self.slot] = digit;
        self.slot += 1;
        Ok(self.slot)
    }

    /// Move back to slot 0 for a new entry.
    pub fn rewind(&mut self) {
        self.slot = 0;
    }

    /// Get all four slots.
    #[must_use]
    pub fn digits(&self) -> &[Digit; CODE_LENGTH] {
        &self.digits
    }

    /// Get the digit in a specific slot.
    ///
    /// # Errors
    /// Returns `Error::InvalidSlot` if `index` is not 0-3.
    pub fn get(&self, index: usize) -> Result<Digit> {
        self.digits
            .get(index)
            .copied()
            .ok_or(Error::InvalidSlot {
                index,
                max: CODE_LENGTH - 1,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn digits(values: [u8; CODE_LENGTH]) -> [Digit; CODE_LENGTH] {
        values.map(|v| Digit::new(v).unwrap())
    }

    #[rstest]
    #[case(0x0000, 0)]
    #[case(0x00FF, 0)]
    #[case(0x0100, 1)]
    #[case(0x08FF, 8)]
    #[case(0x0900, 9)]
    #[case(0x09FF, 9)]
    #[case(0x0A00, 9)] // first clamped nibble
    #[case(0x0B7F, 9)]
    #[case(0x0FFF, 9)]
    fn test_digit_from_sample(#[case] raw: u16, #[case] expected: u8) {
        assert_eq!(Digit::from_sample(raw).as_u8(), expected);
    }

    #[rstest]
    #[case(10)]
    #[case(15)]
    #[case(255)]
    fn test_digit_invalid(#[case] value: u8) {
        let result = Digit::new(value);
        assert!(matches!(result, Err(Error::InvalidDigit { value: v }) if v == value));
    }

    #[test]
    fn test_digit_to_ascii() {
        assert_eq!(Digit::ZERO.to_ascii(), b'0');
        assert_eq!(Digit::new(7).unwrap().to_ascii(), b'7');
        assert_eq!(Digit::new(9).unwrap().to_ascii(), b'9');
    }

    #[rstest]
    #[case([1, 2, 3, 4], ValidationResult::Correct)]
    #[case([1, 2, 3, 5], ValidationResult::Incorrect)] // mismatch at last slot
    #[case([9, 2, 3, 4], ValidationResult::Incorrect)] // mismatch at first slot
    #[case([1, 9, 3, 4], ValidationResult::Incorrect)]
    #[case([0, 0, 0, 0], ValidationResult::Incorrect)]
    fn test_password_verify(#[case] entry: [u8; 4], #[case] expected: ValidationResult) {
        let password = Password::new([1, 2, 3, 4]).unwrap();
        assert_eq!(password.verify(&digits(entry)), expected);
    }

    #[test]
    fn test_password_parse_and_display() {
        let password: Password = "9081".parse().unwrap();
        assert_eq!(password.to_string(), "9081");
        assert_eq!(password.digits()[1], Digit::ZERO);
    }

    #[rstest]
    #[case("123")]
    #[case("12345")]
    #[case("12a4")]
    #[case("")]
    fn test_password_parse_invalid(#[case] input: &str) {
        assert!(input.parse::<Password>().is_err());
    }

    #[test]
    fn test_password_default() {
        assert_eq!(Password::default().to_string(), "1234");
    }

    #[test]
    fn test_password_serde_as_string() {
        let password = Password::new([4, 3, 2, 1]).unwrap();
        let json = serde_json::to_string(&password).unwrap();
        assert_eq!(json, "\"4321\"");

        let back: Password = serde_json::from_str(&json).unwrap();
        assert_eq!(back, password);
        assert!(serde_json::from_str::<Password>("\"43x1\"").is_err());
    }

    #[test]
    fn test_validation_result_downgrade_is_sticky() {
        let mut result = ValidationResult::default();
        assert!(result.is_correct());

        result.downgrade();
        result.downgrade();
        assert_eq!(result, ValidationResult::Incorrect);
        assert_eq!(result.indicator(), Indicator::Failure);
        assert_eq!(ValidationResult::Correct.indicator(), Indicator::Success);
    }

    #[test]
    fn test_entry_buffer_capture_and_complete() {
        let mut buffer = EntryBuffer::new();
        assert_eq!(buffer.slot(), 0);

        for (i, value) in [5, 6, 7, 8].into_iter().enumerate() {
            let slot = buffer.capture(Digit::new(value).unwrap()).unwrap();
            assert_eq!(slot, i + 1);
        }

        assert!(buffer.is_complete());
        assert_eq!(buffer.digits(), &digits([5, 6, 7, 8]));
        assert!(matches!(buffer.capture(Digit::ZERO), Err(Error::BufferFull)));
    }

    #[test]
    fn test_entry_buffer_rewind_keeps_contents() {
        let mut buffer = EntryBuffer::new();
        buffer.capture(Digit::new(3).unwrap()).unwrap();
        buffer.capture(Digit::new(4).unwrap()).unwrap();
        buffer.rewind();

        assert_eq!(buffer.slot(), 0);
        assert_eq!(buffer.get(1).unwrap().as_u8(), 4);

        buffer.capture(Digit::new(8).unwrap()).unwrap();
        assert_eq!(buffer.get(0).unwrap().as_u8(), 8);
        assert_eq!(buffer.get(1).unwrap().as_u8(), 4);
    }

    #[test]
    fn test_entry_buffer_get_out_of_range() {
        let buffer = EntryBuffer::new();
        assert!(matches!(
            buffer.get(4),
            Err(Error::InvalidSlot { index: 4, max: 3 })
        ));
    }

    proptest! {
        #[test]
        fn prop_verify_correct_iff_equal(
            password in prop::array::uniform4(0u8..=9),
            entry in prop::array::uniform4(0u8..=9),
        ) {
            let password = Password::new(password).unwrap();
            let result = password.verify(&digits(entry));
            prop_assert_eq!(result.is_correct(), password.digits() == &digits(entry));
        }

        #[test]
        fn prop_from_sample_always_valid(raw in 0u16..=4095) {
            let digit = Digit::from_sample(raw);
            prop_assert!(digit.as_u8() <= MAX_DIGIT);
        }
    }
}
