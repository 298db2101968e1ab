//! Mock discrete output, such as an indicator LED.

use crate::traits::DigitalOutput;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Debug, Default)]
struct Line {
    high: AtomicBool,
    edges: AtomicU32,
}

/// Mock output line whose level can be observed through a handle.
///
/// # Examples
///
/// ```
/// use elock_hardware::mock::MockOutput;
/// use elock_hardware::traits::DigitalOutput;
///
/// let (mut led, probe) = MockOutput::new("success");
/// led.set_high();
/// assert!(probe.is_high());
/// ```
#[derive(Debug)]
pub struct MockOutput {
    line: Arc<Line>,
}

impl MockOutput {
    /// Create a new output driven low; `name` labels the probe.
    pub fn new(name: impl Into<String>) -> (Self, MockOutputHandle) {
        let line = Arc::new(Line::default());
        let output = Self {
            line: Arc::clone(&line),
        };
        let handle = MockOutputHandle {
            line,
            name: name.into(),
        };

        (output, handle)
    }

    fn drive(&self, high: bool) {
        if self.line.high.swap(high, Ordering::AcqRel) != high {
            self.line.edges.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl DigitalOutput for MockOutput {
    fn set_high(&mut self) {
        self.drive(true);
    }

    fn set_low(&mut self) {
        self.drive(false);
    }

    fn is_set_high(&self) -> bool {
        self.line.high.load(Ordering::Acquire)
    }
}

/// Read-only probe on a mock output.
#[derive(Debug, Clone)]
pub struct MockOutputHandle {
    line: Arc<Line>,
    name: String,
}

impl MockOutputHandle {
    /// Returns `true` while the output is driven high.
    pub fn is_high(&self) -> bool {
        self.line.high.load(Ordering::Acquire)
    }

    /// Number of level changes since creation.
    pub fn edge_count(&self) -> u32 {
        self.line.edges.load(Ordering::Relaxed)
    }

    /// Get the output name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
