//! Mock potentiometer feeding the analog channel.
//!
//! The potentiometer is a shared 12-bit reading. The device side is read
//! by the conversion interrupt; the handle side is turned by tests or the
//! interactive simulator.

use crate::{HardwareError, Result, traits::AnalogInput};
use elock_core::constants::{ADC_DIGIT_SHIFT, ADC_MAX, MAX_DIGIT};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

/// Reading offset inside a digit band, so a dialed digit sits mid-band.
const BAND_CENTER: u16 = 0x80;

/// Mock analog channel wired to a potentiometer.
///
/// # Examples
///
/// ```
/// use elock_hardware::mock::MockPotentiometer;
/// use elock_hardware::traits::AnalogInput;
///
/// let (pot, handle) = MockPotentiometer::new();
/// handle.set(2048).unwrap();
/// assert_eq!(pot.read(), 2048);
/// ```
#[derive(Debug)]
pub struct MockPotentiometer {
    /// Latest reading shared with the handle
    reading: Arc<AtomicU16>,
}

impl MockPotentiometer {
    /// Create a potentiometer turned fully down (reading 0).
    ///
    /// Returns a tuple of (MockPotentiometer, MockPotentiometerHandle).
    pub fn new() -> (Self, MockPotentiometerHandle) {
        let reading = Arc::new(AtomicU16::new(0));

        let pot = Self {
            reading: Arc::clone(&reading),
        };
        let handle = MockPotentiometerHandle { reading };

        (pot, handle)
    }
}

impl AnalogInput for MockPotentiometer {
    fn read(&self) -> u16 {
        self.reading.load(Ordering::Acquire)
    }
}

/// Handle for turning a mock potentiometer.
///
/// Cloneable; every clone turns the same knob.
#[derive(Debug, Clone)]
pub struct MockPotentiometerHandle {
    reading: Arc<AtomicU16>,
}

impl MockPotentiometerHandle {
    /// Set the raw 12-bit reading.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` exceeds 4095.
    pub fn set(&self, raw: u16) -> Result<()> {
        if raw > ADC_MAX {
            return Err(HardwareError::invalid_data(format!(
                "Reading {raw} exceeds {ADC_MAX}"
            )));
        }
        self.reading.store(raw, Ordering::Release);
        Ok(())
    }

    /// Turn the knob to the middle of the band that quantizes to `digit`.
    ///
    /// # Errors
    ///
    /// Returns an error if `digit` is greater than 9.
    ///
    /// # Examples
    ///
    /// ```
    /// use elock_core::Digit;
    /// use elock_hardware::mock::MockPotentiometer;
    /// use elock_hardware::traits::AnalogInput;
    ///
    /// let (pot, handle) = MockPotentiometer::new();
    /// handle.dial(7).unwrap();
    /// assert_eq!(Digit::from_sample(pot.read()).as_u8(), 7);
    /// ```
    pub fn dial(&self, digit: u8) -> Result<()> {
        if digit > MAX_DIGIT {
            return Err(HardwareError::invalid_data(format!(
                "Digit must be 0-9, got {digit}"
            )));
        }
        self.set((u16::from(digit) << ADC_DIGIT_SHIFT) | BAND_CENTER)
    }

    /// Current raw reading.
    pub fn value(&self) -> u16 {
        self.reading.load(Ordering::Acquire)
    }
}
