//! Interrupt registry
//!
//! Platform interrupt vectors take no context argument, so something global
//! has to find the port a timer or edge interrupt belongs to. A [`Registry`]
//! is a fixed table of ports indexed by slot; each slot stands for one
//! transmit timer, one receive timer and one edge line. The vector for a slot
//! calls the matching trampoline and the registry forwards to the port.
//!
//! ```ignore
//! static PORTS: Registry<2> = Registry::new();
//!
//! #[interrupt]
//! fn TIMER0() {
//!     PORTS.on_tx_timer(0);
//! }
//! ```

use core::cell::RefCell;

use critical_section::Mutex;

/// Interrupt entry points of a serial port
pub trait SerialInterrupts: Sync {
    fn on_tx_timer(&self);
    fn on_rx_timer(&self);
    fn on_rx_edge(&self);
}

/// Registry errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Another port already owns the slot
    SlotOccupied,
    /// Slot index beyond the registry size
    InvalidSlot,
}

type Entry = Option<&'static dyn SerialInterrupts>;

/// Slot table routing interrupts to ports
pub struct Registry<const N: usize> {
    slots: Mutex<RefCell<[Entry; N]>>,
}

impl<const N: usize> Default for Registry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Registry<N> {
    pub const fn new() -> Self {
        const NONE: Entry = None;
        Self {
            slots: Mutex::new(RefCell::new([NONE; N])),
        }
    }

    /// Route a slot's interrupts to `port`
    pub fn register(&self, slot: usize, port: &'static dyn SerialInterrupts) -> Result<(), RegistryError> {
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            let entry = slots.get_mut(slot).ok_or(RegistryError::InvalidSlot)?;
            if entry.is_some() {
                return Err(RegistryError::SlotOccupied);
            }
            *entry = Some(port);
            Ok(())
        })
    }

    /// Free a slot, returning the port that held it
    ///
    /// Stop the port first; interrupts for an empty slot are ignored.
    pub fn unregister(&self, slot: usize) -> Option<&'static dyn SerialInterrupts> {
        critical_section::with(|cs| {
            self.slots
                .borrow_ref_mut(cs)
                .get_mut(slot)
                .and_then(|entry| entry.take())
        })
    }

    /// Port registered in a slot
    pub fn get(&self, slot: usize) -> Option<&'static dyn SerialInterrupts> {
        critical_section::with(|cs| self.slots.borrow_ref(cs).get(slot).copied().flatten())
    }

    pub fn on_tx_timer(&self, slot: usize) {
        if let Some(port) = self.get(slot) {
            port.on_tx_timer();
        }
    }

    pub fn on_rx_timer(&self, slot: usize) {
        if let Some(port) = self.get(slot) {
            port.on_rx_timer();
        }
    }

    pub fn on_rx_edge(&self, slot: usize) {
        if let Some(port) = self.get(slot) {
            port.on_rx_edge();
        }
    }
}
