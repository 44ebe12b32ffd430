//! `embedded-io` and `core::fmt` adapters
//!
//! Implemented on `&SoftSerial` so a shared port can be handed to generic
//! drivers while the interrupt handlers keep their own reference.

use core::fmt;

use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write, WriteReady};

use crate::port::{SerialHardware, SoftSerial};

/// Stream errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Port is not active: nothing can be written and nothing more will arrive
    Inactive,
}

impl embedded_io::Error for Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl<H: SerialHardware, const TXN: usize, const RXN: usize> ErrorType for &SoftSerial<H, TXN, RXN> {
    type Error = Error;
}

impl<H: SerialHardware, const TXN: usize, const RXN: usize> Read for &SoftSerial<H, TXN, RXN> {
    /// Blocks until at least one byte is available, then takes whatever is
    /// queued up to `buf.len()`
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let port: &SoftSerial<H, TXN, RXN> = *self;
        let Some((first, rest)) = buf.split_first_mut() else {
            return Ok(0);
        };

        *first = loop {
            if let Some(byte) = SoftSerial::read(port) {
                break byte;
            }
            if !port.is_active() {
                return Err(Error::Inactive);
            }
            core::hint::spin_loop();
        };

        let mut count = 1;
        for slot in rest {
            match SoftSerial::read(port) {
                Some(byte) => *slot = byte,
                None => break,
            }
            count += 1;
        }
        Ok(count)
    }
}

impl<H: SerialHardware, const TXN: usize, const RXN: usize> ReadReady for &SoftSerial<H, TXN, RXN> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.available() > 0)
    }
}

impl<H: SerialHardware, const TXN: usize, const RXN: usize> Write for &SoftSerial<H, TXN, RXN> {
    /// Blocks until the first byte is queued, then queues as many more as
    /// fit without blocking
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let port: &SoftSerial<H, TXN, RXN> = *self;
        let Some((&first, rest)) = buf.split_first() else {
            return Ok(0);
        };

        if SoftSerial::write(port, first) == 0 {
            return Err(Error::Inactive);
        }

        let mut count = 1;
        for &byte in rest {
            if port.available_for_write() == 0 || SoftSerial::write(port, byte) == 0 {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        SoftSerial::flush(*self);
        Ok(())
    }
}

impl<H: SerialHardware, const TXN: usize, const RXN: usize> WriteReady for &SoftSerial<H, TXN, RXN> {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        if !self.is_active() {
            return Err(Error::Inactive);
        }
        Ok(self.available_for_write() > 0)
    }
}

impl<H: SerialHardware, const TXN: usize, const RXN: usize> fmt::Write for &SoftSerial<H, TXN, RXN> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.write_bytes(s.as_bytes()) == s.len() {
            Ok(())
        } else {
            Err(fmt::Error)
        }
    }
}
