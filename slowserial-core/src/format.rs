//! Word-format codes and their resolved bit layout
//!
//! A format code packs data bits, parity and stop bits into one 16-bit
//! value:
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────┐
//! │ 15..12   │ 11..8    │ 7..4     │ 3..0     │
//! │ reserved │ data     │ stop     │ parity   │
//! │ 0        │ 1-4=5-8  │ 1=1 3=2  │ 1=E 2=O  │
//! │          │          │ (2=1.5)  │ 3=N 4=M  │
//! │          │          │          │ 5=S      │
//! └──────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! [`resolve`] turns a code into a [`FrameFormat`]: everything the codec and
//! both engines need to put a character on the wire and take it off again.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Opaque word-format code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FormatCode(pub u16);

impl FormatCode {
    pub const PARITY_EVEN: u16 = 0x001;
    pub const PARITY_ODD: u16 = 0x002;
    pub const PARITY_NONE: u16 = 0x003;
    pub const PARITY_MARK: u16 = 0x004;
    pub const PARITY_SPACE: u16 = 0x005;
    pub const PARITY_MASK: u16 = 0x00F;

    pub const STOP_BIT_1: u16 = 0x010;
    pub const STOP_BIT_1_5: u16 = 0x020;
    pub const STOP_BIT_2: u16 = 0x030;
    pub const STOP_BIT_MASK: u16 = 0x0F0;

    pub const DATA_5: u16 = 0x100;
    pub const DATA_6: u16 = 0x200;
    pub const DATA_7: u16 = 0x300;
    pub const DATA_8: u16 = 0x400;
    pub const DATA_MASK: u16 = 0xF00;

    /// Build a code from its three fields
    pub const fn from_parts(data: DataBits, parity: Parity, stop: StopBits) -> Self {
        let data = match data {
            DataBits::Five => Self::DATA_5,
            DataBits::Six => Self::DATA_6,
            DataBits::Seven => Self::DATA_7,
            DataBits::Eight => Self::DATA_8,
        };
        let parity = match parity {
            Parity::Even => Self::PARITY_EVEN,
            Parity::Odd => Self::PARITY_ODD,
            Parity::None => Self::PARITY_NONE,
            Parity::Mark => Self::PARITY_MARK,
            Parity::Space => Self::PARITY_SPACE,
        };
        let stop = match stop {
            StopBits::One => Self::STOP_BIT_1,
            StopBits::Two => Self::STOP_BIT_2,
        };
        Self(data | parity | stop)
    }

    /// Raw code value
    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl Default for FormatCode {
    fn default() -> Self {
        SERIAL_8N1
    }
}

impl From<FormatSpec> for FormatCode {
    fn from(spec: FormatSpec) -> Self {
        Self::from_parts(spec.data_bits, spec.parity, spec.stop_bits)
    }
}

impl fmt::Display for FormatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match FormatSpec::try_from(*self) {
            Ok(spec) => write!(f, "{}", spec),
            Err(_) => write!(f, "{:#06x}", self.0),
        }
    }
}

/// Parses the conventional short form, e.g. `"8N1"` or `"7e2"`
impl FromStr for FormatCode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        if bytes.len() != 3 {
            return Err(ConfigError::MalformedFormat);
        }

        let data = match bytes[0] {
            b'5' => DataBits::Five,
            b'6' => DataBits::Six,
            b'7' => DataBits::Seven,
            b'8' => DataBits::Eight,
            _ => return Err(ConfigError::MalformedFormat),
        };
        let parity = match bytes[1].to_ascii_uppercase() {
            b'N' => Parity::None,
            b'E' => Parity::Even,
            b'O' => Parity::Odd,
            b'M' => Parity::Mark,
            b'S' => Parity::Space,
            _ => return Err(ConfigError::MalformedFormat),
        };
        let stop = match bytes[2] {
            b'1' => StopBits::One,
            b'2' => StopBits::Two,
            _ => return Err(ConfigError::MalformedFormat),
        };

        Ok(Self::from_parts(data, parity, stop))
    }
}

macro_rules! format_codes {
    ($($name:ident = $data:ident $parity:ident $stop:ident;)*) => {
        $(
            pub const $name: FormatCode =
                FormatCode::from_parts(DataBits::$data, Parity::$parity, StopBits::$stop);
        )*

        /// Every supported format code
        pub const ALL_FORMATS: &[FormatCode] = &[$($name),*];
    };
}

format_codes! {
    SERIAL_5N1 = Five None One;
    SERIAL_6N1 = Six None One;
    SERIAL_7N1 = Seven None One;
    SERIAL_8N1 = Eight None One;
    SERIAL_5N2 = Five None Two;
    SERIAL_6N2 = Six None Two;
    SERIAL_7N2 = Seven None Two;
    SERIAL_8N2 = Eight None Two;
    SERIAL_5E1 = Five Even One;
    SERIAL_6E1 = Six Even One;
    SERIAL_7E1 = Seven Even One;
    SERIAL_8E1 = Eight Even One;
    SERIAL_5E2 = Five Even Two;
    SERIAL_6E2 = Six Even Two;
    SERIAL_7E2 = Seven Even Two;
    SERIAL_8E2 = Eight Even Two;
    SERIAL_5O1 = Five Odd One;
    SERIAL_6O1 = Six Odd One;
    SERIAL_7O1 = Seven Odd One;
    SERIAL_8O1 = Eight Odd One;
    SERIAL_5O2 = Five Odd Two;
    SERIAL_6O2 = Six Odd Two;
    SERIAL_7O2 = Seven Odd Two;
    SERIAL_8O2 = Eight Odd Two;
    SERIAL_5M1 = Five Mark One;
    SERIAL_6M1 = Six Mark One;
    SERIAL_7M1 = Seven Mark One;
    SERIAL_8M1 = Eight Mark One;
    SERIAL_5M2 = Five Mark Two;
    SERIAL_6M2 = Six Mark Two;
    SERIAL_7M2 = Seven Mark Two;
    SERIAL_8M2 = Eight Mark Two;
    SERIAL_5S1 = Five Space One;
    SERIAL_6S1 = Six Space One;
    SERIAL_7S1 = Seven Space One;
    SERIAL_8S1 = Eight Space One;
    SERIAL_5S2 = Five Space Two;
    SERIAL_6S2 = Six Space Two;
    SERIAL_7S2 = Seven Space Two;
    SERIAL_8S2 = Eight Space Two;
}

/// Number of data bits per character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl DataBits {
    /// Bit count as a number
    pub const fn count(self) -> u8 {
        match self {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parity {
    None,
    Odd,
    Even,
    /// Parity bit always 1
    Mark,
    /// Parity bit always 0
    Space,
}

impl Parity {
    fn letter(self) -> char {
        match self {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
            Parity::Mark => 'M',
            Parity::Space => 'S',
        }
    }
}

/// Number of stop bits
///
/// 1.5 stop bits is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopBits {
    One,
    Two,
}

impl StopBits {
    /// Bit count as a number
    pub const fn count(self) -> u8 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

/// Decoded format code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FormatSpec {
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl TryFrom<FormatCode> for FormatSpec {
    type Error = ConfigError;

    fn try_from(code: FormatCode) -> Result<Self, Self::Error> {
        let raw = code.bits();
        let unsupported = ConfigError::UnsupportedFormat(code);

        if raw & !(FormatCode::DATA_MASK | FormatCode::STOP_BIT_MASK | FormatCode::PARITY_MASK)
            != 0
        {
            return Err(unsupported);
        }

        let data_bits = match raw & FormatCode::DATA_MASK {
            FormatCode::DATA_5 => DataBits::Five,
            FormatCode::DATA_6 => DataBits::Six,
            FormatCode::DATA_7 => DataBits::Seven,
            FormatCode::DATA_8 => DataBits::Eight,
            _ => return Err(unsupported),
        };
        let parity = match raw & FormatCode::PARITY_MASK {
            FormatCode::PARITY_EVEN => Parity::Even,
            FormatCode::PARITY_ODD => Parity::Odd,
            FormatCode::PARITY_NONE => Parity::None,
            FormatCode::PARITY_MARK => Parity::Mark,
            FormatCode::PARITY_SPACE => Parity::Space,
            _ => return Err(unsupported),
        };
        // STOP_BIT_1_5 falls through: neither engine can emit or sample
        // half a bit
        let stop_bits = match raw & FormatCode::STOP_BIT_MASK {
            FormatCode::STOP_BIT_1 => StopBits::One,
            FormatCode::STOP_BIT_2 => StopBits::Two,
            _ => return Err(unsupported),
        };

        Ok(Self {
            data_bits,
            parity,
            stop_bits,
        })
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.data_bits.count(),
            self.parity.letter(),
            self.stop_bits.count()
        )
    }
}

/// Bit layout of one character, derived from a [`FormatSpec`]
///
/// Words handled by the codec and the engines are laid out LSB first in
/// wire order: data bits, then the parity bit (if any), then the stop bits.
/// The start bit is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameFormat {
    pub spec: FormatSpec,
    /// Data bits plus parity bit; excludes start and stop bits
    pub bits_to_send: u8,
    /// Bits shifted out after the start bit: `bits_to_send` plus stop bits
    pub word_bits: u8,
    /// Stop bit(s), pre-shifted into place above the parity bit
    pub stop_pattern: u16,
    /// Parity bit position, 0 when parity is `None`
    pub parity_bit: u16,
    /// Bits of a payload byte that fit the word width
    pub data_mask: u8,
    /// Position each received bit is OR'd into before the accumulator shifts
    pub shift_in_bit: u16,
}

impl FrameFormat {
    /// Derive the layout for a decoded format
    pub const fn from_spec(spec: FormatSpec) -> Self {
        let data_bits = spec.data_bits.count();
        let stop_bits = spec.stop_bits.count();
        let parity_bits = match spec.parity {
            Parity::None => 0,
            _ => 1,
        };
        let bits_to_send = data_bits + parity_bits;

        Self {
            spec,
            bits_to_send,
            word_bits: bits_to_send + stop_bits,
            stop_pattern: ((1u16 << stop_bits) - 1) << bits_to_send,
            parity_bit: (parity_bits as u16) << data_bits,
            data_mask: ((1u16 << data_bits) - 1) as u8,
            shift_in_bit: 1 << (bits_to_send - 1),
        }
    }

    /// Parity mode of this format
    pub const fn parity(&self) -> Parity {
        self.spec.parity
    }

    /// Check the parity bit of a received word (data + parity, no stop bits)
    ///
    /// Always true for formats without parity.
    pub fn parity_valid(&self, word: u16) -> bool {
        let ones = (word & (self.data_mask as u16 | self.parity_bit)).count_ones();
        let parity_set = word & self.parity_bit != 0;

        match self.spec.parity {
            Parity::None => true,
            Parity::Even => ones % 2 == 0,
            Parity::Odd => ones % 2 == 1,
            Parity::Mark => parity_set,
            Parity::Space => !parity_set,
        }
    }
}

/// Resolve a format code to its frame layout
///
/// Fails with [`ConfigError::UnsupportedFormat`] for anything outside the
/// 40 supported combinations.
pub fn resolve(code: FormatCode) -> Result<FrameFormat, ConfigError> {
    FormatSpec::try_from(code).map(FrameFormat::from_spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_all_formats_resolve() {
        assert_eq!(ALL_FORMATS.len(), 40);
        for &code in ALL_FORMATS {
            let format = resolve(code).unwrap();
            let parity_bits = if format.parity() == Parity::None { 0 } else { 1 };
            assert_eq!(
                format.bits_to_send,
                format.spec.data_bits.count() + parity_bits
            );
            assert_eq!(
                format.word_bits,
                format.bits_to_send + format.spec.stop_bits.count()
            );
        }
    }

    #[test]
    fn test_8n1_layout() {
        let format = resolve(SERIAL_8N1).unwrap();
        assert_eq!(format.bits_to_send, 8);
        assert_eq!(format.word_bits, 9);
        assert_eq!(format.stop_pattern, 0x100);
        assert_eq!(format.parity_bit, 0);
        assert_eq!(format.data_mask, 0xFF);
        assert_eq!(format.shift_in_bit, 0x80);
    }

    #[test]
    fn test_parity_layouts() {
        let format = resolve(SERIAL_8E2).unwrap();
        assert_eq!(format.word_bits, 11);
        assert_eq!(format.stop_pattern, 0x600);
        assert_eq!(format.parity_bit, 0x100);
        assert_eq!(format.shift_in_bit, 0x100);

        let format = resolve(SERIAL_7O1).unwrap();
        assert_eq!(format.word_bits, 9);
        assert_eq!(format.stop_pattern, 0x100);
        assert_eq!(format.parity_bit, 0x80);
        assert_eq!(format.data_mask, 0x7F);

        let format = resolve(SERIAL_5N2).unwrap();
        assert_eq!(format.word_bits, 7);
        assert_eq!(format.stop_pattern, 0x60);
        assert_eq!(format.data_mask, 0x1F);
        assert_eq!(format.shift_in_bit, 0x10);
    }

    #[test]
    fn test_one_and_a_half_stop_bits_rejected() {
        let code = FormatCode(FormatCode::DATA_8 | FormatCode::STOP_BIT_1_5 | FormatCode::PARITY_NONE);
        assert_eq!(resolve(code), Err(ConfigError::UnsupportedFormat(code)));
    }

    #[test]
    fn test_garbage_codes_rejected() {
        for raw in [0x0000, 0x0403, 0x0016, 0x0513, 0x1413, 0x0410] {
            assert!(resolve(FormatCode(raw)).is_err(), "{:#x} accepted", raw);
        }
    }

    #[test]
    fn test_parse_short_form() {
        assert_eq!("8N1".parse::<FormatCode>(), Ok(SERIAL_8N1));
        assert_eq!("7e2".parse::<FormatCode>(), Ok(SERIAL_7E2));
        assert_eq!(" 5S1 ".parse::<FormatCode>(), Ok(SERIAL_5S1));
        assert_eq!("9N1".parse::<FormatCode>(), Err(ConfigError::MalformedFormat));
        assert_eq!("8X1".parse::<FormatCode>(), Err(ConfigError::MalformedFormat));
        assert_eq!("8N3".parse::<FormatCode>(), Err(ConfigError::MalformedFormat));
        assert_eq!("8N".parse::<FormatCode>(), Err(ConfigError::MalformedFormat));
    }

    #[test]
    fn test_display() {
        assert_eq!(SERIAL_6M2.to_string(), "6M2");
        assert_eq!(FormatCode(0x0423).to_string(), "0x0423");
    }

    #[test]
    fn test_display_parse_roundtrip() {
        for &code in ALL_FORMATS {
            assert_eq!(code.to_string().parse::<FormatCode>(), Ok(code));
        }
    }

    #[test]
    fn test_parity_valid() {
        let even = resolve(SERIAL_7E1).unwrap();
        assert!(even.parity_valid(0x03));
        assert!(!even.parity_valid(0x01));
        assert!(even.parity_valid(0x81));

        let mark = resolve(SERIAL_8M1).unwrap();
        assert!(mark.parity_valid(0x100));
        assert!(!mark.parity_valid(0x0FF));

        let none = resolve(SERIAL_8N1).unwrap();
        assert!(none.parity_valid(0x5A));
    }
}
