//! Port facade
//!
//! [`SoftSerial`] owns the pins, timers, queues and engines of one port and
//! exposes a byte-oriented API to the foreground plus three entry points for
//! the platform's interrupt vectors. All state is split across two
//! critical-section cells, one per direction, so a transmit tick never
//! contends with the receive side for anything but the critical section
//! itself.
//!
//! # Example
//!
//! ```ignore
//! let port: SoftSerial<Board> = SoftSerial::new(tx, rx, tx_timer, rx_timer, Polarity::Normal);
//! port.begin(9600.0, SERIAL_8N1)?;
//! port.write_bytes(b"hello");
//! port.flush();
//! ```

use core::cell::RefCell;

use critical_section::Mutex;
use slowserial_hal::{EdgeInterrupt, InputPin, ModePin, OutputPin, PeriodicTimer, PinMode};

use crate::buffer::WordQueue;
use crate::codec::{FrameCodec, Polarity};
use crate::config::{ConfigError, SerialConfig};
use crate::format::{FormatCode, FrameFormat, SERIAL_8N1};
use crate::registry::SerialInterrupts;
use crate::rx::RxEngine;
use crate::timing::ResolvedTiming;
use crate::tx::TxEngine;

/// Default capacity of each word queue
pub const DEFAULT_QUEUE_LEN: usize = 64;

/// Platform types a port is built from
///
/// Implement this on a marker type per board to name the concrete pin and
/// timer types once instead of threading five type parameters around.
pub trait SerialHardware {
    type TxPin: OutputPin + ModePin;
    type RxPin: InputPin + ModePin + EdgeInterrupt;
    /// Clear-to-send input, active low. Use [`slowserial_hal::NoPin`] if
    /// flow control is never attached.
    type CtsPin: InputPin;
    type TxTimer: PeriodicTimer;
    type RxTimer: PeriodicTimer;
}

/// What `end` does with the data pins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinRelease {
    /// Keep TX driven at idle level and RX configured as input
    Retain,
    /// Return both pins to floating inputs
    Release,
}

struct TxSide<H: SerialHardware, const N: usize> {
    pin: H::TxPin,
    timer: H::TxTimer,
    cts: Option<H::CtsPin>,
    queue: WordQueue<N>,
    engine: TxEngine,
    codec: Option<FrameCodec>,
}

struct RxSide<H: SerialHardware, const N: usize> {
    pin: H::RxPin,
    timer: H::RxTimer,
    queue: WordQueue<N>,
    engine: RxEngine,
    data_mask: u8,
}

/// Interrupt-driven software serial port
///
/// `TXN` and `RXN` are the queue capacities in words. Every method takes
/// `&self`; share the port between the foreground and interrupt handlers
/// through a `static` or a [`Registry`](crate::Registry).
pub struct SoftSerial<
    H: SerialHardware,
    const TXN: usize = DEFAULT_QUEUE_LEN,
    const RXN: usize = DEFAULT_QUEUE_LEN,
> {
    polarity: Polarity,
    tx: Mutex<RefCell<TxSide<H, TXN>>>,
    rx: Mutex<RefCell<RxSide<H, RXN>>>,
}

impl<H: SerialHardware, const TXN: usize, const RXN: usize> SoftSerial<H, TXN, RXN> {
    /// Take ownership of the hardware; the port stays inactive until `begin`
    pub fn new(
        tx_pin: H::TxPin,
        rx_pin: H::RxPin,
        tx_timer: H::TxTimer,
        rx_timer: H::RxTimer,
        polarity: Polarity,
    ) -> Self {
        Self {
            polarity,
            tx: Mutex::new(RefCell::new(TxSide {
                pin: tx_pin,
                timer: tx_timer,
                cts: None,
                queue: WordQueue::new(),
                engine: TxEngine::new(),
                codec: None,
            })),
            rx: Mutex::new(RefCell::new(RxSide {
                pin: rx_pin,
                timer: rx_timer,
                queue: WordQueue::new(),
                engine: RxEngine::new(),
                data_mask: 0xFF,
            })),
        }
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Activate (or reconfigure) the port
    ///
    /// Both timers are stopped before anything is reset, and both queues
    /// start out empty. On error nothing is touched: an active port keeps
    /// running with its previous configuration.
    pub fn begin(&self, baud_rate: f32, format: FormatCode) -> Result<(), ConfigError> {
        let resolved = match ResolvedTiming::resolve(baud_rate, format) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("begin rejected: {} baud, {}: {}", baud_rate, format, e);
                return Err(e);
            }
        };
        let ResolvedTiming { format: frame, timing } = resolved;
        let polarity = self.polarity;

        critical_section::with(|cs| {
            let mut tx = self.tx.borrow_ref_mut(cs);
            let mut rx = self.rx.borrow_ref_mut(cs);
            let tx = &mut *tx;
            let rx = &mut *rx;

            tx.timer.stop();
            rx.engine.disarm(&mut rx.pin, &mut rx.timer);

            tx.queue.clear();
            tx.engine
                .configure(frame.word_bits, polarity, timing.baud_interval_us);
            tx.codec = Some(FrameCodec::new(frame, polarity));
            tx.pin.set_mode(PinMode::Output);
            tx.pin.set_state(polarity.stop_level());

            rx.queue.clear();
            rx.engine.configure(&frame, polarity, &timing);
            rx.data_mask = frame.data_mask;
            rx.pin.set_mode(match polarity {
                Polarity::Normal => PinMode::InputPullUp,
                Polarity::Inverted => PinMode::InputPullDown,
            });
            rx.engine.arm(&mut rx.pin);
        });

        debug!("serial up: {} baud, {}", baud_rate, format);
        Ok(())
    }

    /// Activate with 8 data bits, no parity, 1 stop bit
    pub fn begin_default(&self, baud_rate: f32) -> Result<(), ConfigError> {
        self.begin(baud_rate, SERIAL_8N1)
    }

    /// Activate from a stored configuration
    pub fn begin_with(&self, config: &SerialConfig) -> Result<(), ConfigError> {
        self.begin(config.baud_rate, config.format)
    }

    /// Deactivate the port
    ///
    /// Timers are stopped first so no handler can observe the teardown.
    /// Queued transmit data is discarded; received data stays readable.
    pub fn end(&self, release: PinRelease) {
        critical_section::with(|cs| {
            let mut tx = self.tx.borrow_ref_mut(cs);
            let mut rx = self.rx.borrow_ref_mut(cs);
            let tx = &mut *tx;
            let rx = &mut *rx;

            tx.timer.stop();
            rx.engine.disarm(&mut rx.pin, &mut rx.timer);

            tx.queue.clear();
            tx.engine.disable();

            match release {
                PinRelease::Retain => tx.pin.set_state(self.polarity.stop_level()),
                PinRelease::Release => {
                    tx.pin.set_mode(PinMode::Input);
                    rx.pin.set_mode(PinMode::Input);
                }
            }
        });

        debug!("serial down ({})", release);
    }

    /// True between a successful `begin` and `end`
    pub fn is_active(&self) -> bool {
        critical_section::with(|cs| self.tx.borrow_ref(cs).engine.is_enabled())
    }

    /// Frame layout of the current (or last) configuration
    pub fn frame_format(&self) -> Option<FrameFormat> {
        critical_section::with(|cs| self.tx.borrow_ref(cs).codec.map(|codec| *codec.format()))
    }

    /// Gate transmission on an active-low clear-to-send input
    ///
    /// Replaces any previously attached pin. A word already being shifted
    /// out always completes; the input is checked before each new word.
    pub fn attach_flow_control(&self, cts: H::CtsPin) {
        critical_section::with(|cs| self.tx.borrow_ref_mut(cs).cts = Some(cts));
    }

    /// Remove flow control and hand the pin back
    pub fn detach_flow_control(&self) -> Option<H::CtsPin> {
        critical_section::with(|cs| self.tx.borrow_ref_mut(cs).cts.take())
    }

    /// Queue one byte for transmission
    ///
    /// Bits above the data width are dropped. Blocks while the transmit
    /// queue is full. Returns 1 once queued, 0 if the port is not active.
    pub fn write(&self, byte: u8) -> usize {
        loop {
            let queued = critical_section::with(|cs| {
                let mut tx = self.tx.borrow_ref_mut(cs);
                let tx = &mut *tx;

                let Some(codec) = tx.codec.filter(|_| tx.engine.is_enabled()) else {
                    return Some(0);
                };
                if tx.queue.push(codec.assemble(byte)).is_err() {
                    return None;
                }
                tx.engine
                    .kick(&mut tx.queue, &mut tx.pin, &mut tx.timer, tx.cts.as_ref());
                Some(1)
            });

            match queued {
                Some(count) => return count,
                None => core::hint::spin_loop(),
            }
        }
    }

    /// Queue every byte, blocking as needed; returns how many were queued
    pub fn write_bytes(&self, bytes: &[u8]) -> usize {
        let mut written = 0;
        for &byte in bytes {
            if self.write(byte) == 0 {
                break;
            }
            written += 1;
        }
        written
    }

    /// Oldest received byte, masked to the data width
    pub fn read(&self) -> Option<u8> {
        critical_section::with(|cs| {
            let mut rx = self.rx.borrow_ref_mut(cs);
            let mask = rx.data_mask;
            rx.queue.pop().map(|word| word as u8 & mask)
        })
    }

    /// Oldest received byte without consuming it
    pub fn peek(&self) -> Option<u8> {
        critical_section::with(|cs| {
            let rx = self.rx.borrow_ref(cs);
            rx.queue.peek().map(|word| word as u8 & rx.data_mask)
        })
    }

    /// Oldest received word with its parity bit
    ///
    /// Check it with [`FrameFormat::parity_valid`].
    pub fn read_frame(&self) -> Option<u16> {
        critical_section::with(|cs| self.rx.borrow_ref_mut(cs).queue.pop())
    }

    /// Received words waiting to be read
    pub fn available(&self) -> usize {
        critical_section::with(|cs| self.rx.borrow_ref(cs).queue.len())
    }

    /// Bytes `write` can take without blocking; 0 when inactive
    pub fn available_for_write(&self) -> usize {
        critical_section::with(|cs| {
            let tx = self.tx.borrow_ref(cs);
            if tx.engine.is_enabled() {
                tx.queue.free()
            } else {
                0
            }
        })
    }

    /// Wait until every queued word has left the pin
    ///
    /// Returns immediately on an inactive port. Under flow-control
    /// backpressure this can wait indefinitely.
    pub fn flush(&self) {
        while !self.tx_idle() {
            core::hint::spin_loop();
        }
    }

    fn tx_idle(&self) -> bool {
        critical_section::with(|cs| {
            let tx = self.tx.borrow_ref(cs);
            !tx.engine.is_enabled() || (tx.queue.is_empty() && !tx.engine.is_running())
        })
    }

    /// Transmit timer interrupt handler
    pub fn on_tx_timer(&self) {
        critical_section::with(|cs| {
            let mut tx = self.tx.borrow_ref_mut(cs);
            let tx = &mut *tx;
            tx.engine
                .on_tick(&mut tx.queue, &mut tx.pin, &mut tx.timer, tx.cts.as_ref());
        });
    }

    /// Receive sample timer interrupt handler
    pub fn on_rx_timer(&self) {
        critical_section::with(|cs| {
            let mut rx = self.rx.borrow_ref_mut(cs);
            let rx = &mut *rx;
            rx.engine.on_sample(&mut rx.pin, &mut rx.timer, &mut rx.queue);
        });
    }

    /// Receive start edge interrupt handler
    pub fn on_rx_edge(&self) {
        critical_section::with(|cs| {
            let mut rx = self.rx.borrow_ref_mut(cs);
            let rx = &mut *rx;
            rx.engine.on_start_edge(&mut rx.pin, &mut rx.timer);
        });
    }
}

impl<H: SerialHardware, const TXN: usize, const RXN: usize> SerialInterrupts
    for SoftSerial<H, TXN, RXN>
where
    Self: Sync,
{
    fn on_tx_timer(&self) {
        SoftSerial::on_tx_timer(self)
    }

    fn on_rx_timer(&self) {
        SoftSerial::on_rx_timer(self)
    }

    fn on_rx_edge(&self) {
        SoftSerial::on_rx_edge(self)
    }
}
