//! Mock push button for testing and development.
//!
//! The button has two faces: a line level that can be sampled at any time
//! (for the debounce re-check) and a stream of falling-edge events that
//! raise the edge interrupt. A `MockButtonHandle` drives both.

use crate::{
    HardwareError, Result,
    traits::{DigitalInput, EdgeSource},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Mock button line with edge detection.
///
/// # Examples
///
/// ```
/// use elock_hardware::mock::MockButton;
/// use elock_hardware::traits::{DigitalInput, EdgeSource};
///
/// #[tokio::main]
/// async fn main() -> elock_hardware::Result<()> {
///     let (mut button, handle) = MockButton::new();
///
///     handle.press().await?;
///     button.wait_edge().await?;
///     assert!(button.is_asserted());
///
///     handle.release();
///     assert!(!button.is_asserted());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockButton {
    /// Line level shared with the handle
    level: Arc<AtomicBool>,

    /// Falling edges sent by the handle
    edge_rx: mpsc::Receiver<()>,

    /// Device name
    name: String,
}

impl MockButton {
    /// Create a new mock button with the default name.
    ///
    /// Returns a tuple of (MockButton, MockButtonHandle) where the handle
    /// presses, releases and glitches the line.
    pub fn new() -> (Self, MockButtonHandle) {
        Self::with_name("Mock Button".to_string())
    }

    /// Create a new mock button with a custom name.
    pub fn with_name(name: String) -> (Self, MockButtonHandle) {
        let (edge_tx, edge_rx) = mpsc::channel(32);
        let level = Arc::new(AtomicBool::new(false));

        let button = Self {
            level: Arc::clone(&level),
            edge_rx,
            name: name.clone(),
        };

        let handle = MockButtonHandle {
            level,
            edge_tx,
            name,
        };

        (button, handle)
    }
}

impl EdgeSource for MockButton {
    async fn wait_edge(&mut self) -> Result<()> {
        self.edge_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(self.name.clone()))
    }

    fn drain_edges(&mut self) -> usize {
        let mut drained = 0;
        while self.edge_rx.try_recv().is_ok() {
            drained += 1;
        }
        drained
    }
}

impl DigitalInput for MockButton {
    fn is_asserted(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }
}

/// Handle for driving a mock button.
///
/// Cloneable; every clone drives the same line.
#[derive(Debug, Clone)]
pub struct MockButtonHandle {
    level: Arc<AtomicBool>,
    edge_tx: mpsc::Sender<()>,
    name: String,
}

impl MockButtonHandle {
    /// Assert the line and emit a falling edge.
    ///
    /// The line stays asserted until [`release`](Self::release).
    ///
    /// # Errors
    ///
    /// Returns an error if the button has been dropped.
    pub async fn press(&self) -> Result<()> {
        self.level.store(true, Ordering::Release);
        self.send_edge().await
    }

    /// Deassert the line. Releasing never produces an edge event.
    pub fn release(&self) {
        self.level.store(false, Ordering::Release);
    }

    /// Emit a falling edge without asserting the line, like contact noise.
    ///
    /// # Errors
    ///
    /// Returns an error if the button has been dropped.
    pub async fn bounce(&self) -> Result<()> {
        self.send_edge().await
    }

    /// Press, hold for `hold`, then release.
    ///
    /// # Errors
    ///
    /// Returns an error if the button has been dropped.
    pub async fn click(&self, hold: Duration) -> Result<()> {
        self.press().await?;
        tokio::time::sleep(hold).await;
        self.release();
        Ok(())
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn send_edge(&self) -> Result<()> {
        self.edge_tx
            .send(())
            .await
            .map_err(|_| HardwareError::disconnected(self.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_press_asserts_and_emits_edge() {
        let (mut button, handle) = MockButton::new();

        handle.press().await.unwrap();
        button.wait_edge().await.unwrap();

        assert!(button.is_asserted());
    }

    #[tokio::test]
    async fn test_release_deasserts() {
        let (button, handle) = MockButton::new();

        handle.press().await.unwrap();
        handle.release();

        assert!(!button.is_asserted());
    }

    #[tokio::test]
    async fn test_bounce_emits_edge_without_asserting() {
        let (mut button, handle) = MockButton::new();

        handle.bounce().await.unwrap();
        button.wait_edge().await.unwrap();

        assert!(!button.is_asserted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_releases_after_hold() {
        let (mut button, handle) = MockButton::new();

        let clicker = handle.clone();
        let task = tokio::spawn(async move { clicker.click(Duration::from_millis(50)).await });

        button.wait_edge().await.unwrap();
        assert!(button.is_asserted());

        task.await.unwrap().unwrap();
        assert!(!button.is_asserted());
    }

    #[tokio::test]
    async fn test_drain_edges_discards_queued() {
        let (mut button, handle) = MockButton::new();

        handle.press().await.unwrap();
        handle.bounce().await.unwrap();
        handle.bounce().await.unwrap();

        button.wait_edge().await.unwrap();
        assert_eq!(button.drain_edges(), 2);
        assert_eq!(button.drain_edges(), 0);
    }

    #[tokio::test]
    async fn test_wait_edge_after_handle_dropped() {
        let (mut button, handle) = MockButton::with_name("Front Button".to_string());
        drop(handle);

        let result = button.wait_edge().await;
        let err = result.unwrap_err();
        assert!(matches!(err, HardwareError::Disconnected { .. }));
        assert_eq!(err.to_string(), "Device disconnected: Front Button");
    }

    #[tokio::test]
    async fn test_press_after_button_dropped() {
        let (button, handle) = MockButton::new();
        drop(button);

        assert!(handle.press().await.is_err());
    }
}
