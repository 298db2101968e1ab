//! Mock peripheral implementations for testing and development.
//!
//! Each mock comes as a (device, handle) pair: the device is handed to the
//! board, the handle drives or observes it from tests and the simulator.

pub mod button;
pub mod output;
pub mod potentiometer;

// Re-export commonly used types
pub use button::{MockButton, MockButtonHandle};
pub use output::{MockOutput, MockOutputHandle};
pub use potentiometer::{MockPotentiometer, MockPotentiometerHandle};
