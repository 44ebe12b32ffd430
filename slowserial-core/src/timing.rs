//! Baud rate to timer period conversion

use crate::config::ConfigError;
use crate::format::{resolve, FormatCode, FrameFormat};

/// Lowest accepted baud rate
pub const MIN_BAUD_RATE: f32 = 1.0;

/// Receive timer ticks per bit
pub const SAMPLES_PER_BIT: u8 = 4;

/// Timer periods for one baud rate
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    /// Transmit timer period: one bit
    pub baud_interval_us: f32,
    /// Receive timer period: a quarter bit
    pub sample_interval_us: f32,
}

impl BitTiming {
    /// Compute timer periods for a baud rate
    pub fn from_baud(baud_rate: f32) -> Result<Self, ConfigError> {
        if !baud_rate.is_finite() || baud_rate < MIN_BAUD_RATE {
            return Err(ConfigError::InvalidBaudRate);
        }

        let baud_interval_us = 1_000_000.0 / baud_rate;
        Ok(Self {
            baud_interval_us,
            sample_interval_us: baud_interval_us / SAMPLES_PER_BIT as f32,
        })
    }
}

/// Frame layout plus timer periods: the full per-configuration schedule
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResolvedTiming {
    pub format: FrameFormat,
    pub timing: BitTiming,
}

impl ResolvedTiming {
    /// Validate and resolve a baud rate and format code together
    ///
    /// Nothing is returned unless both are acceptable.
    pub fn resolve(baud_rate: f32, code: FormatCode) -> Result<Self, ConfigError> {
        let timing = BitTiming::from_baud(baud_rate)?;
        let format = resolve(code)?;
        Ok(Self { format, timing })
    }
}
