//! Receive engine
//!
//! Idle, the engine waits on the start edge interrupt. The edge disarms
//! itself and starts the sample timer at four ticks per bit; each tick runs
//! one [`RxOp`] from the precomputed schedule. Any sample that disagrees
//! with what the schedule expects abandons the character and re-arms the
//! edge straight away, so a glitch costs at most the character it hit.

use slowserial_hal::{EdgeInterrupt, InputPin, PeriodicTimer};

use crate::buffer::WordQueue;
use crate::codec::Polarity;
use crate::format::FrameFormat;
use crate::schedule::{ReceiveSchedule, RxOp};
use crate::timing::BitTiming;

/// Result of one sample tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxOutcome {
    /// Character still in progress
    Continue,
    /// Line disagreed with the schedule; character abandoned
    Aborted(RxOp),
    /// Complete word queued (data + parity, logical levels)
    Received(u16),
    /// Complete word discarded because the queue was full
    Dropped(u16),
    /// Tick arrived with no character in progress
    Idle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RxState {
    index: usize,
    accumulator: u16,
    sampled: bool,
    receiving: bool,
}

/// Oversampling receiver
#[derive(Debug, Clone, Default)]
pub struct RxEngine {
    state: RxState,
    schedule: ReceiveSchedule,
    shift_in_bit: u16,
    polarity: Polarity,
    sample_us: f32,
    armed: bool,
}

impl RxEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the schedule for a new configuration
    ///
    /// Leaves the engine disarmed; the caller stops the timer and arms.
    pub fn configure(&mut self, format: &FrameFormat, polarity: Polarity, timing: &BitTiming) {
        self.state = RxState::default();
        self.schedule = ReceiveSchedule::new(format);
        self.shift_in_bit = format.shift_in_bit;
        self.polarity = polarity;
        self.sample_us = timing.sample_interval_us;
        self.armed = false;
    }

    pub fn schedule(&self) -> &ReceiveSchedule {
        &self.schedule
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// True between a start edge and the end of that character
    pub fn is_receiving(&self) -> bool {
        self.state.receiving
    }

    /// Start listening for start bits
    pub fn arm<P: EdgeInterrupt>(&mut self, pin: &mut P) {
        self.state = RxState::default();
        self.armed = true;
        pin.enable_edge(self.polarity.start_edge());
    }

    /// Stop listening; drops any character in progress
    pub fn disarm<P: EdgeInterrupt, T: PeriodicTimer>(&mut self, pin: &mut P, timer: &mut T) {
        timer.stop();
        pin.disable_edge();
        self.armed = false;
        self.state = RxState::default();
    }

    /// Start edge interrupt
    pub fn on_start_edge<P: EdgeInterrupt, T: PeriodicTimer>(&mut self, pin: &mut P, timer: &mut T) {
        if !self.armed {
            pin.disable_edge();
            return;
        }

        pin.disable_edge();
        self.state = RxState {
            receiving: true,
            ..RxState::default()
        };
        timer.start(self.sample_us);
    }

    /// Sample timer interrupt
    pub fn on_sample<P, T, const N: usize>(
        &mut self,
        pin: &mut P,
        timer: &mut T,
        queue: &mut WordQueue<N>,
    ) -> RxOutcome
    where
        P: InputPin + EdgeInterrupt,
        T: PeriodicTimer,
    {
        if !self.state.receiving {
            timer.stop();
            return RxOutcome::Idle;
        }

        let Some(op) = self.schedule.get(self.state.index) else {
            self.restart(pin, timer);
            return RxOutcome::Idle;
        };
        let bit = self.polarity.to_bit(pin.is_high());

        match op {
            RxOp::StartCheck if bit => return self.abort(op, pin, timer),
            RxOp::Clear => self.state.accumulator = 0,
            RxOp::VoteSample => self.state.sampled = bit,
            RxOp::VoteConfirm if bit != self.state.sampled => {
                return self.abort(op, pin, timer)
            }
            RxOp::ShiftIn => {
                self.state.accumulator >>= 1;
                if self.state.sampled {
                    self.state.accumulator |= self.shift_in_bit;
                }
            }
            RxOp::StopCheck if !bit => return self.abort(op, pin, timer),
            RxOp::Final => {
                if !bit {
                    return self.abort(op, pin, timer);
                }
                let word = self.state.accumulator;
                self.restart(pin, timer);
                return match queue.push(word) {
                    Ok(()) => RxOutcome::Received(word),
                    Err(word) => {
                        trace!("rx overrun, dropped {=u16:#x}", word);
                        RxOutcome::Dropped(word)
                    }
                };
            }
            _ => {}
        }

        self.state.index += 1;
        RxOutcome::Continue
    }

    fn abort<P: EdgeInterrupt, T: PeriodicTimer>(
        &mut self,
        op: RxOp,
        pin: &mut P,
        timer: &mut T,
    ) -> RxOutcome {
        trace!("rx abort at tick {=usize}", self.state.index);
        self.restart(pin, timer);
        RxOutcome::Aborted(op)
    }

    /// Back to waiting for a start edge
    fn restart<P: EdgeInterrupt, T: PeriodicTimer>(&mut self, pin: &mut P, timer: &mut T) {
        timer.stop();
        self.state.receiving = false;
        self.state.index = 0;
        pin.enable_edge(self.polarity.start_edge());
    }
}
