//! SlowSerial Hardware Abstraction Layer
//!
//! This crate defines the small set of platform services the software UART
//! engine needs. A chip-specific port implements them on top of its own GPIO,
//! timer and pin-interrupt drivers; the engine in `slowserial-core` never
//! touches registers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  slowserial-core (engines, port facade) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  slowserial-hal (this crate - traits)   │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  chip port A  │       │  chip port B  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`], [`gpio::ModePin`] - Digital I/O
//! - [`timer::PeriodicTimer`] - Recurring interval timer
//! - [`interrupt::EdgeInterrupt`] - Pin change interrupt

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod interrupt;
pub mod timer;

// Re-export key traits at crate root for convenience
pub use gpio::{InputPin, ModePin, NoPin, OutputPin, PinMode};
pub use interrupt::{Edge, EdgeInterrupt};
pub use timer::PeriodicTimer;
