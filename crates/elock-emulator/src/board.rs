//! The simulated board: every peripheral the handlers drive, plus the
//! converter, the shared timer and the interrupt controller that decide
//! when those handlers run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use elock_core::Indicator;
use elock_hardware::{
    AnalogInput, CharacterDisplay, DigitalOutput, Interrupt, InterruptController,
};

/// Analog-to-digital converter channel wired to the potentiometer.
///
/// A conversion copies the input into the result register; the result
/// stays readable while conversions are disabled.
#[derive(Debug)]
pub struct Adc<A> {
    input: A,
    conversion_enabled: bool,
    memory: u16,
}

impl<A> Adc<A> {
    pub fn new(input: A) -> Self {
        Self {
            input,
            conversion_enabled: false,
            memory: 0,
        }
    }

    pub fn enable_conversion(&mut self) {
        self.conversion_enabled = true;
    }

    pub fn disable_conversion(&mut self) {
        self.conversion_enabled = false;
    }

    pub fn is_conversion_enabled(&self) -> bool {
        self.conversion_enabled
    }

    /// Result of the latest conversion.
    pub fn memory(&self) -> u16 {
        self.memory
    }
}

impl<A: AnalogInput> Adc<A> {
    /// Run one conversion if conversions are enabled.
    ///
    /// Returns `true` if a new result was latched.
    pub fn trigger(&mut self) -> bool {
        if !self.conversion_enabled {
            return false;
        }
        self.memory = self.input.read();
        true
    }
}

/// The single hardware timer shared by sampling and the hold countdown.
///
/// Starting the timer with a new period restarts the count; the runtime
/// picks the restart up through [`take_restart`](Self::take_restart).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedTimer {
    period: Duration,
    running: bool,
    #[serde(skip)]
    restarted: bool,
}

impl SharedTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            running: false,
            restarted: false,
        }
    }

    /// Load a new period and start counting from zero.
    pub fn start(&mut self, period: Duration) {
        self.period = period;
        self.running = true;
        self.restarted = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns `true` once after each [`start`](Self::start).
    pub fn take_restart(&mut self) -> bool {
        std::mem::take(&mut self.restarted)
    }
}

/// Peripherals of the lock board.
///
/// Fields are public so each handler can reach exactly the registers it
/// owns; the runtime passes the whole board by `&mut` to one handler at a
/// time.
#[derive(Debug)]
pub struct Board<D, A, B, O> {
    pub display: D,
    pub adc: Adc<A>,
    pub timer: SharedTimer,
    pub button: B,
    pub success_led: O,
    pub failure_led: O,
    pub activity_led: O,
    pub interrupts: InterruptController,
}

impl<D, A, B, O> Board<D, A, B, O> {
    /// Assemble a board from its peripherals. Nothing is enabled until
    /// [`power_on`](Self::power_on).
    pub fn new(display: D, analog: A, button: B, success: O, failure: O, activity: O) -> Self {
        Self {
            display,
            adc: Adc::new(analog),
            timer: SharedTimer::new(Duration::ZERO),
            button,
            success_led: success,
            failure_led: failure,
            activity_led: activity,
            interrupts: InterruptController::new(),
        }
    }

    /// The indicator output for `indicator`.
    pub fn indicator_mut(&mut self, indicator: Indicator) -> &mut O {
        match indicator {
            Indicator::Success => &mut self.success_led,
            Indicator::Failure => &mut self.failure_led,
        }
    }
}

impl<D, A, B, O: DigitalOutput> Board<D, A, B, O> {
    /// Number of indicator outputs currently asserted.
    pub fn lit_indicators(&self) -> usize {
        usize::from(self.success_led.is_set_high()) + usize::from(self.failure_led.is_set_high())
    }
}

impl<D, A, B, O> Board<D, A, B, O>
where
    D: CharacterDisplay,
    A: AnalogInput,
    O: DigitalOutput,
{
    /// Platform bring-up: outputs low, display initialized with the entry
    /// prompt, converter and button interrupts enabled and the timer
    /// free-running at `sample_period`. The hold tick interrupt stays
    /// disabled.
    pub fn power_on(&mut self, sample_period: Duration) {
        self.success_led.set_low();
        self.failure_led.set_low();
        self.activity_led.set_low();

        self.display.initialization();

        self.interrupts = InterruptController::new();
        self.adc.enable_conversion();
        self.interrupts.enable(Interrupt::SampleReady);
        self.interrupts.enable(Interrupt::EdgeDetected);
        self.timer.start(sample_period);
    }

    /// One timer period has elapsed.
    ///
    /// Triggers a conversion, raising `SampleReady` if one completed, and
    /// raises `TickElapsed`. The tick stays pending while its interrupt is
    /// disabled, like a compare flag.
    pub fn timer_elapsed(&mut self) {
        if self.adc.trigger() {
            self.interrupts.raise(Interrupt::SampleReady);
        }
        self.interrupts.raise(Interrupt::TickElapsed);
    }
}
