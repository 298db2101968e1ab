//! Electric lock emulator.
//!
//! This crate contains the handlers and runtime that emulate the lock
//! controller: a virtual character LCD, the lock phase state machine, the
//! interrupt handlers for sampling, the button and the hold countdown, the
//! entry controller, and [`ElectricLock`], which ties them to a board of
//! peripherals.

pub mod board;
pub mod button;
pub mod config;
pub mod controller;
pub mod display;
pub mod hold_timer;
pub mod lock;
pub mod sampler;
pub mod state;
pub mod state_machine;

pub use board::{Adc, Board, SharedTimer};
pub use button::{ButtonEdgeDetector, EdgeOutcome};
pub use config::{DisplayConfig, LockConfig};
pub use controller::{EntryController, StepOutcome};
pub use display::{VirtualLcd, VirtualLcdBuilder};
pub use hold_timer::{HoldTimer, TickOutcome};
pub use lock::{ElectricLock, LockSnapshot, LockStats, SimulatedControls, SimulatedLock};
pub use sampler::AnalogSampler;
pub use state::DeviceState;
pub use state_machine::{LockPhase, StateMachine, StateTransition};
