//! Pin change interrupt abstraction

/// Signal transition that triggers an edge interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Low-to-high transition
    Rising,
    /// High-to-low transition
    Falling,
}

/// Edge-triggered interrupt on an input pin
///
/// The receiver arms this while waiting for a start bit and disarms it for
/// the duration of each character.
pub trait EdgeInterrupt {
    /// Arm the interrupt for the given transition
    fn enable_edge(&mut self, edge: Edge);

    /// Disarm the interrupt
    ///
    /// Disarming an already disarmed interrupt is a no-op.
    fn disable_edge(&mut self);
}
