//! The lock runtime.
//!
//! [`ElectricLock`] owns the board and the device state and plays the part
//! of the microcontroller: it waits for the shared timer or a button edge,
//! raises the matching interrupt, services pending interrupts in priority
//! order, runs one entry-controller step and publishes a snapshot.
//!
//! # Examples
//!
//! ```
//! use elock_emulator::{ElectricLock, LockConfig, LockPhase};
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread", start_paused = true)]
//! async fn main() -> elock_core::Result<()> {
//!     let (lock, controls) = ElectricLock::simulated(LockConfig::default())?;
//!     let mut snapshots = lock.subscribe();
//!     let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
//!     let task = tokio::spawn(lock.run(async move {
//!         let _ = stopped.await;
//!     }));
//!
//!     for digit in [1, 2, 3, 4] {
//!         controls.knob.dial(digit).unwrap();
//!         tokio::time::sleep(Duration::from_millis(600)).await;
//!         controls.button.click(Duration::from_millis(50)).await.unwrap();
//!     }
//!     tokio::time::sleep(Duration::from_millis(10)).await;
//!
//!     assert!(controls.success.is_high());
//!     assert_eq!(snapshots.borrow_and_update().phase, LockPhase::Holding);
//!
//!     let _ = stop.send(());
//!     let stats = task.await.unwrap();
//!     assert_eq!(stats.unlocks, 1);
//!     Ok(())
//! }
//! ```

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};

use elock_core::{EntryBuffer, Result, ValidationResult};
use elock_hardware::mock::{
    MockButton, MockButtonHandle, MockOutput, MockOutputHandle, MockPotentiometer,
    MockPotentiometerHandle,
};
use elock_hardware::{AnalogInput, DigitalInput, DigitalOutput, EdgeSource, Interrupt};

use crate::board::Board;
use crate::button::{ButtonEdgeDetector, EdgeOutcome};
use crate::config::LockConfig;
use crate::controller::{EntryController, StepOutcome};
use crate::display::VirtualLcd;
use crate::hold_timer::HoldTimer;
use crate::sampler::AnalogSampler;
use crate::state::DeviceState;
use crate::state_machine::{LockPhase, StateTransition};

/// Phase transitions carried in each snapshot, one full entry cycle.
const RECENT_TRANSITIONS: usize = 4;

/// Counters kept by the runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStats {
    pub samples: u64,
    pub presses_accepted: u64,
    pub presses_rejected: u64,
    pub presses_dropped: u64,
    pub unlocks: u64,
    pub failures: u64,
}

/// Observable state of the lock after a main-loop iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockSnapshot {
    pub phase: LockPhase,
    pub entry: EntryBuffer,
    pub sampling_enabled: bool,
    pub result: ValidationResult,
    pub hold_ticks: u8,
    pub success_led: bool,
    pub failure_led: bool,
    pub activity_led: bool,
    pub display: Vec<String>,

    /// Most recent phase changes, oldest first.
    pub transitions: Vec<StateTransition>,

    /// Values driven onto the display port since the previous snapshot.
    pub lcd_bus: Vec<u8>,

    pub stats: LockStats,
}

/// What woke the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wakeup {
    TimerElapsed,
    Edge,
    ButtonLost,
    Shutdown,
}

/// Emulated electric lock.
///
/// Generic over the analog input, the button and the output lines so the
/// same runtime drives mocks or any other implementation of the peripheral
/// traits. The display is always the virtual LCD.
pub struct ElectricLock<A, B, O> {
    config: LockConfig,
    board: Board<VirtualLcd, A, B, O>,
    state: DeviceState,
    sampler: AnalogSampler,
    detector: ButtonEdgeDetector,
    hold_timer: HoldTimer,
    controller: EntryController,
    stats: LockStats,
    lcd_bus: Vec<u8>,
    snapshot_tx: watch::Sender<LockSnapshot>,
}

impl<A, B, O> ElectricLock<A, B, O>
where
    A: AnalogInput,
    B: DigitalInput + EdgeSource,
    O: DigitalOutput,
{
    /// Build and power on a lock from its peripherals.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(
        config: LockConfig,
        analog: A,
        button: B,
        success: O,
        failure: O,
        activity: O,
    ) -> Result<Self> {
        config.validate()?;

        let display = VirtualLcd::builder()
            .with_size(config.display.lines, config.display.columns)
            .with_trace_capacity(config.display.trace_capacity)
            .build();
        let mut board = Board::new(display, analog, button, success, failure, activity);
        board.power_on(config.sample_period());

        let state = DeviceState::new();
        let stats = LockStats::default();
        let lcd_bus = board.display.take_port_writes();
        let (snapshot_tx, _) = watch::channel(Self::capture(&board, &state, stats, &lcd_bus));

        info!(
            sample_ms = config.sample_period_ms,
            hold_tick_ms = config.hold_tick_ms,
            hold_ticks = config.hold_ticks,
            "lock powered on"
        );

        Ok(Self {
            sampler: AnalogSampler,
            detector: ButtonEdgeDetector::new(config.debounce()),
            hold_timer: HoldTimer::new(config.hold_ticks, config.sample_period()),
            controller: EntryController::new(
                config.password,
                config.hold_tick(),
                config.message_delay(),
            ),
            config,
            board,
            state,
            stats,
            lcd_bus,
            snapshot_tx,
        })
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn board(&self) -> &Board<VirtualLcd, A, B, O> {
        &self.board
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn stats(&self) -> LockStats {
        self.stats
    }

    /// Receive a snapshot after every main-loop iteration.
    pub fn subscribe(&self) -> watch::Receiver<LockSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// The state as of the last main-loop iteration.
    pub fn snapshot(&self) -> LockSnapshot {
        Self::capture(&self.board, &self.state, self.stats, &self.lcd_bus)
    }

    /// Service every pending, enabled interrupt, highest priority first.
    ///
    /// Each handler clears its own pending flag, so this returns once
    /// nothing enabled is left pending.
    pub async fn service_interrupts(&mut self) {
        while let Some(source) = self.board.interrupts.next_pending() {
            match source {
                Interrupt::SampleReady => {
                    self.sampler.on_sample_ready(&mut self.board, &self.state);
                    self.stats.samples += 1;
                }
                Interrupt::TickElapsed => {
                    self.hold_timer.on_tick(&mut self.board, &mut self.state);
                }
                Interrupt::EdgeDetected => {
                    match self.detector.on_edge(&mut self.board, &mut self.state).await {
                        EdgeOutcome::Accepted => self.stats.presses_accepted += 1,
                        EdgeOutcome::Rejected => self.stats.presses_rejected += 1,
                    }
                }
            }
        }
    }

    /// Run one entry-controller step.
    pub async fn step(&mut self) -> StepOutcome {
        let outcome = self.controller.step(&mut self.board, &mut self.state).await;
        match outcome {
            StepOutcome::Dropped => self.stats.presses_dropped += 1,
            StepOutcome::Validated(ValidationResult::Correct) => self.stats.unlocks += 1,
            StepOutcome::Validated(ValidationResult::Incorrect) => self.stats.failures += 1,
            StepOutcome::Idle | StepOutcome::Captured { .. } => {}
        }
        if !self.state.is_consistent() {
            warn!(phase = %self.state.phase(), "sampling flag disagrees with phase");
        }
        outcome
    }

    /// Run the main loop until `shutdown` completes.
    ///
    /// Returns the final counters.
    pub async fn run<F>(mut self, shutdown: F) -> LockStats
    where
        F: Future<Output = ()>,
    {
        let mut shutdown = std::pin::pin!(shutdown);
        let mut deadline = Instant::now() + self.board.timer.period();
        let mut button_connected = true;

        info!("lock running");
        loop {
            if self.board.timer.take_restart() {
                deadline = Instant::now() + self.board.timer.period();
            }
            let timer_running = self.board.timer.is_running();

            let wakeup = tokio::select! {
                biased;
                () = &mut shutdown => Wakeup::Shutdown,
                () = tokio::time::sleep_until(deadline), if timer_running => Wakeup::TimerElapsed,
                edge = self.board.button.wait_edge(), if button_connected => match edge {
                    Ok(()) => Wakeup::Edge,
                    Err(error) => {
                        warn!(%error, "button line lost");
                        Wakeup::ButtonLost
                    }
                },
            };

            match wakeup {
                Wakeup::Shutdown => break,
                Wakeup::TimerElapsed => {
                    deadline += self.board.timer.period();
                    self.board.timer_elapsed();
                }
                Wakeup::Edge => {
                    self.board.interrupts.raise(Interrupt::EdgeDetected);
                }
                Wakeup::ButtonLost => button_connected = false,
            }

            self.service_interrupts().await;
            self.step().await;
            self.publish();
        }

        info!(?self.stats, "lock stopped");
        self.stats
    }

    fn publish(&mut self) {
        self.lcd_bus = self.board.display.take_port_writes();
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn capture(
        board: &Board<VirtualLcd, A, B, O>,
        state: &DeviceState,
        stats: LockStats,
        lcd_bus: &[u8],
    ) -> LockSnapshot {
        LockSnapshot {
            phase: state.phase(),
            entry: state.entry,
            sampling_enabled: state.sampling_enabled,
            result: state.result,
            hold_ticks: state.hold_ticks,
            success_led: board.success_led.is_set_high(),
            failure_led: board.failure_led.is_set_high(),
            activity_led: board.activity_led.is_set_high(),
            display: board.display.get_all_lines(),
            transitions: state.phase_machine().last_transitions(RECENT_TRANSITIONS),
            lcd_bus: lcd_bus.to_vec(),
            stats,
        }
    }
}

/// Handles for driving a simulated lock from the outside.
#[derive(Debug, Clone)]
pub struct SimulatedControls {
    pub knob: MockPotentiometerHandle,
    pub button: MockButtonHandle,
    pub success: MockOutputHandle,
    pub failure: MockOutputHandle,
    pub activity: MockOutputHandle,
}

/// A lock wired to mock peripherals.
pub type SimulatedLock = ElectricLock<MockPotentiometer, MockButton, MockOutput>;

impl SimulatedLock {
    /// Build a lock on mock peripherals, returning the handles that turn
    /// the knob, press the button and probe the LEDs.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn simulated(config: LockConfig) -> Result<(Self, SimulatedControls)> {
        let (pot, knob) = MockPotentiometer::new();
        let (button, button_handle) = MockButton::with_name("Entry Button".to_string());
        let (success, success_probe) = MockOutput::new("success");
        let (failure, failure_probe) = MockOutput::new("failure");
        let (activity, activity_probe) = MockOutput::new("activity");

        let lock = Self::new(config, pot, button, success, failure, activity)?;
        let controls = SimulatedControls {
            knob,
            button: button_handle,
            success: success_probe,
            failure: failure_probe,
            activity: activity_probe,
        };
        Ok((lock, controls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elock_core::Error;
    use std::time::Duration;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = LockConfig::default().with_hold_ticks(0);
        assert!(matches!(
            ElectricLock::simulated(config),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_initial_snapshot() {
        let (lock, controls) = ElectricLock::simulated(LockConfig::default()).unwrap();
        let snapshot = lock.subscribe().borrow().clone();

        assert_eq!(snapshot.phase, LockPhase::Entry);
        assert!(snapshot.sampling_enabled);
        assert_eq!(snapshot.display[0].trim(), "0000");
        assert_eq!(snapshot.display[1].trim(), "Enter PW");
        assert!(!snapshot.success_led && !snapshot.failure_led);
        assert!(!controls.activity.is_high());
    }

    #[tokio::test]
    async fn test_service_interrupts_in_priority_order() {
        let (mut lock, controls) = ElectricLock::simulated(LockConfig::default()).unwrap();
        controls.knob.dial(3).unwrap();
        controls.button.press().await.unwrap();

        lock.board.interrupts.raise(Interrupt::EdgeDetected);
        lock.board.timer_elapsed();
        lock.service_interrupts().await;

        assert_eq!(lock.stats().samples, 1);
        assert_eq!(lock.stats().presses_accepted, 1);
        assert!(lock.state().pressed);
        assert_eq!(lock.board().interrupts.next_pending(), None);

        assert!(matches!(lock.step().await, StepOutcome::Captured { slot: 0, .. }));
        assert_eq!(lock.board().display.get_line(0).unwrap().trim(), "3000");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_ticks_are_not_serviced_during_entry() {
        let (mut lock, _controls) = ElectricLock::simulated(LockConfig::default()).unwrap();

        for _ in 0..5 {
            lock.board.timer_elapsed();
            lock.service_interrupts().await;
        }

        assert_eq!(lock.state().hold_ticks, 0);
        assert_eq!(lock.state().phase(), LockPhase::Entry);
        assert!(lock.board().interrupts.is_pending(Interrupt::TickElapsed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let (lock, _controls) = ElectricLock::simulated(LockConfig::default()).unwrap();
        let mut snapshots = lock.subscribe();

        let stats = lock
            .run(tokio::time::sleep(Duration::from_millis(1600)))
            .await;

        assert_eq!(stats.samples, 3);
        assert_eq!(snapshots.borrow_and_update().stats.samples, 3);
    }

    #[tokio::test]
    async fn test_snapshot_carries_display_port_writes() {
        let (mut lock, _controls) = ElectricLock::simulated(LockConfig::default()).unwrap();
        assert_eq!(lock.snapshot().lcd_bus.len(), 64);

        lock.board.timer_elapsed();
        lock.service_interrupts().await;
        lock.publish();

        // Cursor to slot 0 (0x80), then the digit '0' with register select.
        assert_eq!(
            lock.snapshot().lcd_bus,
            vec![0x88, 0x80, 0x08, 0x00, 0x3C, 0x34, 0x0C, 0x04]
        );

        lock.publish();
        assert!(lock.snapshot().lcd_bus.is_empty());
    }

    #[tokio::test]
    async fn test_trace_can_be_disabled() {
        let config = LockConfig::default().with_trace_capacity(0);
        let (mut lock, _controls) = ElectricLock::simulated(config).unwrap();

        lock.board.timer_elapsed();
        lock.service_interrupts().await;
        lock.publish();

        assert!(lock.snapshot().lcd_bus.is_empty());
        assert_eq!(lock.board().display.get_line(0).unwrap().trim(), "0000");
    }

    #[test]
    fn test_snapshot_serializes() {
        let (lock, _controls) = ElectricLock::simulated(LockConfig::default()).unwrap();
        let json = serde_json::to_value(lock.snapshot()).unwrap();

        assert_eq!(json["phase"], "entry");
        assert_eq!(json["result"], "correct");
        assert_eq!(json["display"][1], " Enter PW       ");
    }
}
