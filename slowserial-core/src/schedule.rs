//! Receive operation schedule
//!
//! The receiver runs one operation per quarter-bit timer tick. Which
//! operation runs on which tick depends only on the frame format, so the
//! whole sequence is built once per `begin` and the interrupt handler just
//! indexes into it.
//!
//! For one character (ticks counted from the start edge):
//!
//! ```text
//!  start bit        data/parity bit (×bits_to_send)     stop bit(s)
//! ┌──┬──┬──┬──┐    ┌──┬──┬──┬──┐                        ┌──┬──┬──┬───┐
//! │S │S │S │C │    │V │c │c │>>│  ...                   │P │P │F │(x)│
//! └──┴──┴──┴──┘    └──┴──┴──┴──┘                        └──┴──┴──┴───┘
//!  S=StartCheck C=Clear V=VoteSample c=VoteConfirm >>=ShiftIn
//!  P=StopCheck F=Final; the last quarter (x) is left to the next start edge
//! ```

use heapless::Vec;

use crate::format::FrameFormat;
use crate::timing::SAMPLES_PER_BIT;

/// Longest schedule: 8 data bits + parity, 2 stop bits is 47 ticks
pub const MAX_SCHEDULE_LEN: usize = 48;

/// One receive timer tick's worth of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxOp {
    /// Line must still be at start level
    StartCheck,
    /// Reset the accumulator; lands on the start/data boundary
    Clear,
    /// Take the tentative value of the current bit
    VoteSample,
    /// Line must still agree with the tentative value
    VoteConfirm,
    /// Shift the tentative value into the accumulator; lands on a bit boundary
    ShiftIn,
    /// Line must be at stop level
    StopCheck,
    /// Last stop level check, then deliver the character
    Final,
}

/// Precomputed tick-by-tick operation sequence for one character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveSchedule {
    ops: Vec<RxOp, MAX_SCHEDULE_LEN>,
}

impl Default for ReceiveSchedule {
    fn default() -> Self {
        Self { ops: Vec::new() }
    }
}

impl ReceiveSchedule {
    /// Build the schedule for a frame format
    pub fn new(format: &FrameFormat) -> Self {
        let mut ops = Vec::new();
        let mut emit = |op: RxOp, count: usize| {
            for _ in 0..count {
                // Cannot fail: the longest format needs 47 slots
                let _ = ops.push(op);
            }
        };

        emit(RxOp::StartCheck, 3);
        emit(RxOp::Clear, 1);
        for _ in 0..format.bits_to_send {
            emit(RxOp::VoteSample, 1);
            emit(RxOp::VoteConfirm, 2);
            emit(RxOp::ShiftIn, 1);
        }
        let stop_ticks = (format.spec.stop_bits.count() * SAMPLES_PER_BIT) as usize;
        emit(RxOp::StopCheck, stop_ticks - 2);
        emit(RxOp::Final, 1);

        Self { ops }
    }

    /// Operation for a tick, `None` past the end
    pub fn get(&self, index: usize) -> Option<RxOp> {
        self.ops.get(index).copied()
    }

    /// Number of ticks in one character
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True before any format has been resolved
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// All operations in tick order
    pub fn ops(&self) -> &[RxOp] {
        &self.ops
    }
}
