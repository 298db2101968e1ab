//! Interrupt controller for the simulated board.
//!
//! The lock reacts to three interrupt sources. Each source has an enable
//! bit and a pending flag, as on the target:
//!
//! - raising a source only sets its pending flag, so several raises before
//!   the handler runs collapse into a single service;
//! - a pending source is serviced only while it is enabled, and stays
//!   pending while disabled;
//! - the handler is responsible for clearing the pending flag.
//!
//! Pending sources are serviced highest priority first, one at a time, on
//! the same logical thread as the main loop.
//!
//! ```text
//!   timer period ──► SampleReady ─┐
//!   timer period ──► TickElapsed ─┼──► InterruptController ──► handler
//!   button edge  ──► EdgeDetected ┘       (enable, pending)
//! ```
//!
//! # Examples
//!
//! ```
//! use elock_hardware::interrupts::{Interrupt, InterruptController};
//!
//! let mut irq = InterruptController::new();
//! irq.enable(Interrupt::EdgeDetected);
//!
//! irq.raise(Interrupt::EdgeDetected);
//! irq.raise(Interrupt::EdgeDetected);
//! assert_eq!(irq.next_pending(), Some(Interrupt::EdgeDetected));
//!
//! irq.clear_pending(Interrupt::EdgeDetected);
//! assert_eq!(irq.next_pending(), None);
//! ```

use serde::{Deserialize, Serialize};

/// Interrupt sources, in descending priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interrupt {
    /// Analog conversion completed.
    SampleReady,

    /// Shared timer reached its compare value.
    TickElapsed,

    /// Falling edge on the button line.
    EdgeDetected,
}

impl Interrupt {
    /// All sources, highest priority first.
    pub const ALL: [Interrupt; 3] = [
        Interrupt::SampleReady,
        Interrupt::TickElapsed,
        Interrupt::EdgeDetected,
    ];

    fn index(self) -> usize {
        match self {
            Self::SampleReady => 0,
            Self::TickElapsed => 1,
            Self::EdgeDetected => 2,
        }
    }
}

impl std::fmt::Display for Interrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SampleReady => write!(f, "SampleReady"),
            Self::TickElapsed => write!(f, "TickElapsed"),
            Self::EdgeDetected => write!(f, "EdgeDetected"),
        }
    }
}

/// Enable and pending bits for every interrupt source.
///
/// All sources start disabled with nothing pending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterruptController {
    enabled: [bool; 3],
    pending: [bool; 3],
}

impl InterruptController {
    /// Create a controller with every source disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow a source to be serviced.
    pub fn enable(&mut self, source: Interrupt) {
        self.enabled[source.index()] = true;
    }

    /// Stop a source from being serviced. Its pending flag is kept.
    pub fn disable(&mut self, source: Interrupt) {
        self.enabled[source.index()] = false;
    }

    /// Returns `true` if the source is enabled.
    pub fn is_enabled(&self, source: Interrupt) -> bool {
        self.enabled[source.index()]
    }

    /// Set the pending flag of a source.
    ///
    /// Returns `false` if the flag was already set, meaning this raise was
    /// absorbed by an earlier one.
    pub fn raise(&mut self, source: Interrupt) -> bool {
        let flag = &mut self.pending[source.index()];
        let newly_pending = !*flag;
        *flag = true;
        newly_pending
    }

    /// Returns `true` if the source's pending flag is set.
    pub fn is_pending(&self, source: Interrupt) -> bool {
        self.pending[source.index()]
    }

    /// Clear the pending flag of a source.
    pub fn clear_pending(&mut self, source: Interrupt) {
        self.pending[source.index()] = false;
    }

    /// Highest priority source that is both pending and enabled.
    pub fn next_pending(&self) -> Option<Interrupt> {
        Interrupt::ALL
            .into_iter()
            .find(|source| self.is_pending(*source) && self.is_enabled(*source))
    }
}
