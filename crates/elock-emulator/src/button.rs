//! Button edge handler with debounce.

use std::time::Duration;

use tracing::{debug, trace};

use elock_hardware::{DigitalInput, EdgeSource, Interrupt};

use crate::board::Board;
use crate::state::DeviceState;

/// What the edge handler concluded about an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// The line was still asserted after the debounce wait.
    Accepted,
    /// The line had returned to idle; the edge was noise.
    Rejected,
}

/// Turns falling edges into debounced presses.
#[derive(Debug, Clone, Copy)]
pub struct ButtonEdgeDetector {
    debounce: Duration,
}

impl ButtonEdgeDetector {
    pub fn new(debounce: Duration) -> Self {
        Self { debounce }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Service `EdgeDetected`.
    ///
    /// Waits out the debounce interval, then sets the pressed flag only if
    /// the line is still asserted. Edges that arrived during the wait are
    /// discarded with the pending flag, so one press with any amount of
    /// contact bounce yields at most one activation.
    pub async fn on_edge<D, A, B, O>(
        &self,
        board: &mut Board<D, A, B, O>,
        state: &mut DeviceState,
    ) -> EdgeOutcome
    where
        B: DigitalInput + EdgeSource,
    {
        tokio::time::sleep(self.debounce).await;

        let outcome = if board.button.is_asserted() {
            state.pressed = true;
            EdgeOutcome::Accepted
        } else {
            EdgeOutcome::Rejected
        };

        let absorbed = board.button.drain_edges();
        board.interrupts.clear_pending(Interrupt::EdgeDetected);

        match outcome {
            EdgeOutcome::Accepted => trace!(absorbed, "press accepted"),
            EdgeOutcome::Rejected => debug!(absorbed, "edge rejected as bounce"),
        }
        outcome
    }
}
