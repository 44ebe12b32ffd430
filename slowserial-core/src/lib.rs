//! Interrupt-driven software UART
//!
//! This crate implements a complete asynchronous serial port on top of two
//! periodic timers, one GPIO output, one GPIO input with an edge interrupt
//! and, optionally, a clear-to-send input:
//!
//! - Format resolution: word-format code to bit layout and receive schedule
//! - Frame codec: parity and stop bit insertion
//! - Transmit engine: one timer tick per bit, LSB first
//! - Receive engine: start edge detection, 4x oversampling with voting
//! - Port facade: byte-oriented foreground API over lock-protected queues
//! - Interrupt registry: context-carrying trampolines for platform vectors
//!
//! # Data flow
//!
//! ```text
//!  write() ─▶ codec ─▶ TX queue ─▶ TX engine (timer IRQ) ─▶ TX pin
//!  RX pin ─▶ RX engine (edge + timer IRQ) ─▶ RX queue ─▶ read()
//! ```

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod buffer;
pub mod codec;
pub mod config;
pub mod format;
pub mod io;
pub mod port;
pub mod registry;
pub mod rx;
pub mod schedule;
pub mod timing;
pub mod tx;

#[cfg(test)]
mod sim;

pub use buffer::WordQueue;
pub use codec::{FrameCodec, Polarity};
pub use config::{ConfigError, SerialConfig};
pub use format::{resolve, DataBits, FormatCode, FormatSpec, FrameFormat, Parity, StopBits};
pub use io::Error as IoError;
pub use port::{PinRelease, SerialHardware, SoftSerial, DEFAULT_QUEUE_LEN};
pub use registry::{Registry, RegistryError, SerialInterrupts};
pub use rx::{RxEngine, RxOutcome};
pub use schedule::{ReceiveSchedule, RxOp};
pub use timing::{BitTiming, ResolvedTiming};
pub use tx::{TxEngine, TxEvent};
