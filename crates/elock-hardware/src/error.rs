//! Error types for peripheral operations.
//!
//! The lock's state machine never sees these errors: conversions and
//! display writes are modeled as infallible. They surface only at the
//! edges, where a simulated peripheral is driven from outside (a closed
//! control channel, an out-of-range reading).

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while driving a simulated peripheral.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Peripheral has been dropped and its control channel is closed.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Value outside the range the peripheral accepts.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("Mock Button");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: Mock Button");
    }

    #[test]
    fn test_invalid_data_error() {
        let error = HardwareError::invalid_data("Reading 5000 exceeds 4095");
        assert!(matches!(error, HardwareError::InvalidData { .. }));
        assert_eq!(error.to_string(), "Invalid data: Reading 5000 exceeds 4095");
    }
}
