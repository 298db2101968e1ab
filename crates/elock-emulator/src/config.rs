//! Lock configuration.
//!
//! Every setting has a default matching the reference board, so an empty
//! TOML file (or no file at all) yields a working lock. Durations are
//! written in milliseconds:
//!
//! ```toml
//! password = "1234"
//! sample_period_ms = 500
//! hold_tick_ms = 1000
//! hold_ticks = 3
//! debounce_ms = 20
//! message_delay_ms = 1
//!
//! [display]
//! lines = 2
//! columns = 16
//! trace_capacity = 64
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use elock_core::constants::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_HOLD_TICK_MS, DEFAULT_HOLD_TICKS, DEFAULT_LCD_COLUMNS,
    DEFAULT_LCD_LINES, DEFAULT_LCD_TRACE_CAPACITY, DEFAULT_MESSAGE_DELAY_MS,
    DEFAULT_SAMPLE_PERIOD_MS,
};
use elock_core::{Error, Password, Result};

/// Largest display the controller can address.
const MAX_DISPLAY_LINES: usize = 2;
const MAX_DISPLAY_COLUMNS: usize = 40;

/// Display geometry and bus trace depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub lines: usize,
    pub columns: usize,

    /// Port writes kept between snapshots; 0 turns the trace off.
    pub trace_capacity: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            lines: DEFAULT_LCD_LINES,
            columns: DEFAULT_LCD_COLUMNS,
            trace_capacity: DEFAULT_LCD_TRACE_CAPACITY,
        }
    }
}

/// Settings for one emulated lock.
///
/// # Examples
///
/// ```
/// use elock_emulator::LockConfig;
/// use std::time::Duration;
///
/// let config = LockConfig::from_toml_str("password = \"4321\"\nhold_ticks = 5").unwrap();
/// assert_eq!(config.password.to_string(), "4321");
/// assert_eq!(config.hold_ticks, 5);
/// assert_eq!(config.sample_period(), Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Code that unlocks.
    pub password: Password,

    /// Free-running timer period while digits are being entered.
    pub sample_period_ms: u64,

    /// Timer period while feedback is held.
    pub hold_tick_ms: u64,

    /// Hold ticks before the prompt is restored.
    pub hold_ticks: u8,

    /// Wait between a button edge and the line re-check.
    pub debounce_ms: u64,

    /// Pause between "WRONG" and "PASSWORD".
    pub message_delay_ms: u64,

    pub display: DisplayConfig,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            password: Password::default(),
            sample_period_ms: DEFAULT_SAMPLE_PERIOD_MS,
            hold_tick_ms: DEFAULT_HOLD_TICK_MS,
            hold_ticks: DEFAULT_HOLD_TICKS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            message_delay_ms: DEFAULT_MESSAGE_DELAY_MS,
            display: DisplayConfig::default(),
        }
    }
}

impl LockConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the document does not parse or a value
    /// is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| Error::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, or `Error::Config`
    /// as for [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDuration` for a zero timer period and
    /// `Error::Config` for a zero hold threshold or an unsupported display.
    pub fn validate(&self) -> Result<()> {
        if self.sample_period_ms == 0 || self.hold_tick_ms == 0 {
            return Err(Error::InvalidDuration);
        }
        if self.hold_ticks == 0 {
            return Err(Error::Config("hold_ticks must be at least 1".to_string()));
        }
        let DisplayConfig { lines, columns, .. } = self.display;
        if !(1..=MAX_DISPLAY_LINES).contains(&lines) {
            return Err(Error::Config(format!(
                "display lines must be 1-{MAX_DISPLAY_LINES}, got {lines}"
            )));
        }
        if !(1..=MAX_DISPLAY_COLUMNS).contains(&columns) {
            return Err(Error::Config(format!(
                "display columns must be 1-{MAX_DISPLAY_COLUMNS}, got {columns}"
            )));
        }
        Ok(())
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms)
    }

    pub fn hold_tick(&self) -> Duration {
        Duration::from_millis(self.hold_tick_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn message_delay(&self) -> Duration {
        Duration::from_millis(self.message_delay_ms)
    }

    pub fn with_password(mut self, password: Password) -> Self {
        self.password = password;
        self
    }

    pub fn with_sample_period(mut self, period: Duration) -> Self {
        self.sample_period_ms = millis(period);
        self
    }

    pub fn with_hold_tick(mut self, period: Duration) -> Self {
        self.hold_tick_ms = millis(period);
        self
    }

    pub fn with_hold_ticks(mut self, ticks: u8) -> Self {
        self.hold_ticks = ticks;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = millis(debounce);
        self
    }

    pub fn with_message_delay(mut self, delay: Duration) -> Self {
        self.message_delay_ms = millis(delay);
        self
    }

    pub fn with_display(mut self, lines: usize, columns: usize) -> Self {
        self.display.lines = lines;
        self.display.columns = columns;
        self
    }

    pub fn with_trace_capacity(mut self, capacity: usize) -> Self {
        self.display.trace_capacity = capacity;
        self
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = LockConfig::default();

        assert_eq!(config.password, Password::new([1, 2, 3, 4]).unwrap());
        assert_eq!(config.sample_period(), Duration::from_millis(500));
        assert_eq!(config.hold_tick(), Duration::from_secs(1));
        assert_eq!(config.hold_ticks, 3);
        assert_eq!(config.debounce(), Duration::from_millis(20));
        assert_eq!(config.message_delay(), Duration::from_millis(1));
        assert_eq!(config.display.lines, 2);
        assert_eq!(config.display.columns, 16);
        assert_eq!(config.display.trace_capacity, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(LockConfig::from_toml_str("").unwrap(), LockConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = LockConfig::from_toml_str(
            r#"
            password = "0000"
            debounce_ms = 5

            [display]
            columns = 20
            trace_capacity = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.password.to_string(), "0000");
        assert_eq!(config.debounce(), Duration::from_millis(5));
        assert_eq!(config.display.lines, 2);
        assert_eq!(config.display.columns, 20);
        assert_eq!(config.display.trace_capacity, 0);
        assert_eq!(config.hold_ticks, 3);
    }

    #[rstest]
    #[case("password = \"12a4\"")]
    #[case("password = \"123\"")]
    #[case("hold_ticks = 0")]
    #[case("sample_period_ms = 0")]
    #[case("hold_tick_ms = 0")]
    #[case("[display]\nlines = 3")]
    #[case("[display]\ncolumns = 0")]
    #[case("not toml at all")]
    fn test_rejects_invalid(#[case] text: &str) {
        assert!(LockConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn test_zero_period_is_invalid_duration() {
        let config = LockConfig::default().with_sample_period(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::InvalidDuration)));
    }

    #[test]
    fn test_builder_methods() {
        let config = LockConfig::default()
            .with_password("9876".parse().unwrap())
            .with_hold_tick(Duration::from_millis(100))
            .with_hold_ticks(2)
            .with_message_delay(Duration::from_millis(3))
            .with_display(1, 8);

        assert_eq!(config.password.to_string(), "9876");
        assert_eq!(config.hold_tick_ms, 100);
        assert_eq!(config.hold_ticks, 2);
        assert_eq!(config.message_delay_ms, 3);
        assert_eq!(config.display.columns, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = LockConfig::default().with_password("5555".parse().unwrap());
        let text = config.to_toml_string().unwrap();
        assert_eq!(LockConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = LockConfig::load("/nonexistent/elock.toml");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
