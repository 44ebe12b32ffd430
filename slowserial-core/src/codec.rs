//! Frame codec: parity, stop bits and line polarity
//!
//! The codec turns a payload byte into the word the transmit engine shifts
//! out, LSB first. The start bit is not part of the word; the engine drives
//! it when it loads the word.

use slowserial_hal::Edge;

use crate::format::{FrameFormat, Parity};

/// Line polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Idle high, start bit low (TTL serial)
    #[default]
    Normal,
    /// Idle low, start bit high (RS-232 levels without a transceiver)
    Inverted,
}

impl Polarity {
    /// Pin level of a start bit (`true` = high)
    pub const fn start_level(self) -> bool {
        matches!(self, Polarity::Inverted)
    }

    /// Pin level of a stop bit and of the idle line
    pub const fn stop_level(self) -> bool {
        !self.start_level()
    }

    /// Transition from idle into a start bit
    pub const fn start_edge(self) -> Edge {
        match self {
            Polarity::Normal => Edge::Falling,
            Polarity::Inverted => Edge::Rising,
        }
    }

    /// Logical bit value for a sampled pin level
    pub const fn to_bit(self, level: bool) -> bool {
        level != self.start_level()
    }
}

/// True when `byte` has an odd number of set bits
pub const fn parity_is_odd(byte: u8) -> bool {
    let mut folded = byte ^ (byte >> 4);
    folded ^= folded >> 2;
    folded ^= folded >> 1;
    folded & 0x01 != 0
}

/// Encoder for one frame format and polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    format: FrameFormat,
    polarity: Polarity,
}

impl FrameCodec {
    pub const fn new(format: FrameFormat, polarity: Polarity) -> Self {
        Self { format, polarity }
    }

    pub const fn format(&self) -> &FrameFormat {
        &self.format
    }

    pub const fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Append the parity bit to an in-range payload
    pub const fn add_parity(&self, byte: u8) -> u16 {
        let word = byte as u16;
        let parity_bit = self.format.parity_bit;

        match self.format.spec.parity {
            Parity::Odd if !parity_is_odd(byte) => word | parity_bit,
            Parity::Even if parity_is_odd(byte) => word | parity_bit,
            Parity::Mark => word | parity_bit,
            _ => word,
        }
    }

    /// Build the transmittable word for a payload byte
    ///
    /// Bits above the data width are silently dropped. For inverted lines
    /// every bit of the word is flipped, stop bits included.
    pub const fn assemble(&self, byte: u8) -> u16 {
        let word = self.add_parity(byte & self.format.data_mask) | self.format.stop_pattern;
        match self.polarity {
            Polarity::Normal => word,
            Polarity::Inverted => !word,
        }
    }

    /// Payload of a received word (data + parity bits, already normalized)
    pub const fn payload(&self, word: u16) -> u8 {
        (word as u8) & self.format.data_mask
    }
}
