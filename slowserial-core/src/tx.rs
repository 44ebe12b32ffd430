//! Transmit engine
//!
//! A periodic timer fires once per bit. Each tick either shifts the next bit
//! of the current word onto the pin or, between words, loads the next word
//! from the queue and drives the start bit. When the queue runs dry the pin
//! is parked at stop level and the timer is stopped until the next `write`.
//!
//! ```text
//!            write()/kick
//!   Idle ───────────────────▶ Shifting ──┐ tick: bit out
//!    ▲                          │   ▲    │
//!    │  tick: queue empty       │   └────┘
//!    └──────────────────────────┘   tick: next word (start bit)
//! ```

use slowserial_hal::{InputPin, OutputPin, PeriodicTimer};

use crate::buffer::WordQueue;
use crate::codec::Polarity;

/// What a transmit tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxEvent {
    /// Shifted one data, parity or stop bit out
    Shifted,
    /// Loaded a word and drove its start bit
    Started,
    /// Words are waiting but the handshake input is deasserted
    Blocked,
    /// Nothing left to send; timer stopped
    Stopped,
}

/// Shifter state, touched only by the transmit handler and by `kick`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TxState {
    word: u16,
    remaining: u8,
    running: bool,
    enabled: bool,
}

/// Interrupt-driven bit shifter
#[derive(Debug, Clone)]
pub struct TxEngine {
    state: TxState,
    word_bits: u8,
    polarity: Polarity,
    period_us: f32,
}

impl Default for TxEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Handshake check: no pin means always clear, otherwise active low
fn clear_to_send<C: InputPin>(cts: Option<&C>) -> bool {
    cts.map_or(true, |pin| pin.is_low())
}

impl TxEngine {
    /// Create a disabled engine
    pub const fn new() -> Self {
        Self {
            state: TxState {
                word: 0,
                remaining: 0,
                running: false,
                enabled: false,
            },
            word_bits: 0,
            polarity: Polarity::Normal,
            period_us: 0.0,
        }
    }

    /// Reset and enable for a new configuration
    ///
    /// `word_bits` counts every bit after the start bit, stop bits included.
    /// The caller must have stopped the timer.
    pub fn configure(&mut self, word_bits: u8, polarity: Polarity, period_us: f32) {
        self.state = TxState {
            enabled: true,
            ..TxState::default()
        };
        self.word_bits = word_bits;
        self.polarity = polarity;
        self.period_us = period_us;
    }

    /// Stop accepting work; the caller stops the timer
    pub fn disable(&mut self) {
        self.state = TxState::default();
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    /// True while the timer is running (shifting or waiting on handshake)
    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Start transmitting if idle and there is something queued
    ///
    /// Called from the foreground right after a word is queued. Sends the
    /// start bit immediately when the handshake allows.
    pub fn kick<P, T, C, const N: usize>(
        &mut self,
        queue: &mut WordQueue<N>,
        pin: &mut P,
        timer: &mut T,
        cts: Option<&C>,
    ) where
        P: OutputPin,
        T: PeriodicTimer,
        C: InputPin,
    {
        if !self.state.enabled || self.state.running || queue.is_empty() {
            return;
        }

        timer.start(self.period_us);
        self.state.running = true;

        if clear_to_send(cts) {
            self.load_next(queue, pin);
        }
    }

    /// Transmit timer interrupt
    pub fn on_tick<P, T, C, const N: usize>(
        &mut self,
        queue: &mut WordQueue<N>,
        pin: &mut P,
        timer: &mut T,
        cts: Option<&C>,
    ) -> TxEvent
    where
        P: OutputPin,
        T: PeriodicTimer,
        C: InputPin,
    {
        // Stale interrupt after the port was shut down
        if !self.state.running {
            timer.stop();
            return TxEvent::Stopped;
        }

        if self.state.remaining > 0 {
            pin.set_state(self.state.word & 0x01 != 0);
            self.state.word >>= 1;
            self.state.remaining -= 1;
            return TxEvent::Shifted;
        }

        if self.state.enabled && !queue.is_empty() {
            if clear_to_send(cts) {
                self.load_next(queue, pin);
                return TxEvent::Started;
            }
            return TxEvent::Blocked;
        }

        pin.set_state(self.polarity.stop_level());
        timer.stop();
        self.state.running = false;
        TxEvent::Stopped
    }

    fn load_next<P: OutputPin, const N: usize>(&mut self, queue: &mut WordQueue<N>, pin: &mut P) {
        if let Some(word) = queue.pop() {
            pin.set_state(self.polarity.start_level());
            self.state.word = word;
            self.state.remaining = self.word_bits;
        }
    }
}
