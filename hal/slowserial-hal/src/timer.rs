//! Periodic interval timer abstraction
//!
//! Each serial port uses two of these: one ticking once per bit for the
//! transmitter, one ticking four times per bit while a character is being
//! received.

/// Recurring interval timer that raises an interrupt every period
///
/// The platform port routes the interrupt to the owning serial port's
/// handler (directly or through a `Registry` trampoline).
pub trait PeriodicTimer {
    /// Start (or restart) the timer with the given period
    ///
    /// The first interrupt fires one full period after this call.
    fn start(&mut self, period_us: f32);

    /// Stop the timer
    ///
    /// No interrupt may be raised after this returns. Stopping an idle timer
    /// is a no-op.
    fn stop(&mut self);
}
