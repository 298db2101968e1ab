//! Peripheral abstraction layer for the electric lock.
//!
//! This crate defines the peripherals the lock's handlers touch and the
//! interrupt controller that schedules those handlers:
//!
//! - [`CharacterDisplay`]: two-line character LCD driven by instructions
//!   and data bytes, with the entry-prompt routines built on top.
//! - [`AnalogInput`]: the converter channel wired to the potentiometer.
//! - [`DigitalInput`]: the button line, sampled for the debounce re-check.
//! - [`EdgeSource`]: falling edges on the button line.
//! - [`DigitalOutput`]: the success, failure and activity LEDs.
//! - [`InterruptController`]: enable and pending bits for the three
//!   interrupt sources, serviced in priority order.
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides simulated peripherals that come paired with
//! handles, so tests and the interactive simulator can turn the knob, press
//! the button and watch the LEDs:
//!
//! ```
//! use elock_hardware::mock::{MockOutput, MockPotentiometer};
//! use elock_hardware::{AnalogInput, DigitalOutput};
//!
//! let (pot, knob) = MockPotentiometer::new();
//! knob.dial(4).unwrap();
//! assert_eq!(pot.read() >> 8, 4);
//!
//! let (mut led, probe) = MockOutput::new("success");
//! led.set_high();
//! assert!(probe.is_high());
//! ```
//!
//! # Error Handling
//!
//! Peripheral operations are infallible. [`HardwareError`] only reports
//! problems driving a mock from the outside, such as an out-of-range
//! reading or a dropped device.
//!
//! [`CharacterDisplay`]: traits::CharacterDisplay
//! [`AnalogInput`]: traits::AnalogInput
//! [`DigitalInput`]: traits::DigitalInput
//! [`DigitalOutput`]: traits::DigitalOutput
//! [`EdgeSource`]: traits::EdgeSource
//! [`InterruptController`]: interrupts::InterruptController

pub mod error;
pub mod interrupts;
pub mod mock;
pub mod traits;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use interrupts::{Interrupt, InterruptController};
pub use traits::{AnalogInput, CharacterDisplay, DigitalInput, DigitalOutput, EdgeSource};
