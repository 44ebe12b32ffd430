//! Port configuration
//!
//! A [`SerialConfig`] is everything `begin` needs. It can be built in code,
//! parsed from the short format notation, or deserialized when the `serde`
//! feature is enabled.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::format::{FormatCode, SERIAL_8N1};

/// Errors rejected at configuration time
///
/// A port that fails to configure is left exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Format code is not one of the 40 supported combinations
    UnsupportedFormat(FormatCode),
    /// Baud rate is not finite or is below the minimum
    InvalidBaudRate,
    /// Format string is not of the form `<5-8><N|E|O|M|S><1|2>`
    MalformedFormat,
}

/// Baud rate and word format for one port
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SerialConfig {
    /// Bits per second; fractional rates are allowed
    pub baud_rate: f32,
    /// Word format
    pub format: FormatCode,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600.0,
            format: SERIAL_8N1,
        }
    }
}

impl SerialConfig {
    /// Create a configuration from a baud rate and format code
    pub const fn new(baud_rate: f32, format: FormatCode) -> Self {
        Self { baud_rate, format }
    }

    /// Create a configuration from a baud rate and a short format like `"7E1"`
    pub fn parse(baud_rate: f32, format: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            baud_rate,
            format: format.parse()?,
        })
    }
}
