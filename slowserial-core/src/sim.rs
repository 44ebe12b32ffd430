//! Host-side simulated hardware
//!
//! A [`Bench`] wires a port's TX pin straight back into its RX pin and
//! advances a clock in quarter-bit ticks, firing whichever timers are due.
//! Handles cloned from the bench let tests drive the handshake input, inject
//! a wrong level on a single receive sample and inspect pins and timers.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use slowserial_hal::{Edge, EdgeInterrupt, InputPin, ModePin, OutputPin, PeriodicTimer, PinMode};

use crate::codec::Polarity;
use crate::port::{SerialHardware, SoftSerial};
use crate::registry::SerialInterrupts;

#[derive(Debug, Default, Clone, Copy)]
struct TimerState {
    next_fire: Option<u64>,
    period_ticks: u64,
}

#[derive(Debug)]
struct BenchState {
    quantum_us: f32,
    now: AtomicU64,
    line: AtomicBool,
    last_seen: AtomicBool,
    transitions: AtomicUsize,
    cts_high: AtomicBool,
    glitch: Mutex<Option<(u64, bool)>>,
    edge: Mutex<Option<Edge>>,
    tx_mode: Mutex<Option<PinMode>>,
    rx_mode: Mutex<Option<PinMode>>,
    tx_timer: Mutex<TimerState>,
    rx_timer: Mutex<TimerState>,
}

pub struct Sim;

impl SerialHardware for Sim {
    type TxPin = SimTxPin;
    type RxPin = SimRxPin;
    type CtsPin = SimCtsPin;
    type TxTimer = SimTimer;
    type RxTimer = SimTimer;
}

pub struct SimTxPin(Arc<BenchState>);

impl OutputPin for SimTxPin {
    fn set_high(&mut self) {
        self.set_state(true);
    }

    fn set_low(&mut self) {
        self.set_state(false);
    }

    fn set_state(&mut self, high: bool) {
        if self.0.line.swap(high, Ordering::SeqCst) != high {
            self.0.transitions.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_set_high(&self) -> bool {
        self.0.line.load(Ordering::SeqCst)
    }
}

impl ModePin for SimTxPin {
    fn set_mode(&mut self, mode: PinMode) {
        *self.0.tx_mode.lock().unwrap() = Some(mode);
    }
}

pub struct SimRxPin(Arc<BenchState>);

impl InputPin for SimRxPin {
    fn is_high(&self) -> bool {
        let now = self.0.now.load(Ordering::SeqCst);
        match *self.0.glitch.lock().unwrap() {
            Some((at, level)) if at == now => level,
            _ => self.0.line.load(Ordering::SeqCst),
        }
    }
}

impl ModePin for SimRxPin {
    fn set_mode(&mut self, mode: PinMode) {
        *self.0.rx_mode.lock().unwrap() = Some(mode);
    }
}

impl EdgeInterrupt for SimRxPin {
    fn enable_edge(&mut self, edge: Edge) {
        *self.0.edge.lock().unwrap() = Some(edge);
    }

    fn disable_edge(&mut self) {
        *self.0.edge.lock().unwrap() = None;
    }
}

pub struct SimCtsPin(Arc<BenchState>);

impl InputPin for SimCtsPin {
    fn is_high(&self) -> bool {
        self.0.cts_high.load(Ordering::SeqCst)
    }
}

pub struct SimTimer {
    bench: Arc<BenchState>,
    rx: bool,
}

impl SimTimer {
    fn slot(&self) -> &Mutex<TimerState> {
        if self.rx {
            &self.bench.rx_timer
        } else {
            &self.bench.tx_timer
        }
    }
}

impl PeriodicTimer for SimTimer {
    fn start(&mut self, period_us: f32) {
        let period_ticks = ((period_us / self.bench.quantum_us) + 0.5) as u64;
        let period_ticks = period_ticks.max(1);
        let now = self.bench.now.load(Ordering::SeqCst);
        *self.slot().lock().unwrap() = TimerState {
            next_fire: Some(now + period_ticks),
            period_ticks,
        };
    }

    fn stop(&mut self) {
        self.slot().lock().unwrap().next_fire = None;
    }
}

/// Loopback test bench clocked in quarter-bit ticks
pub struct Bench {
    state: Arc<BenchState>,
    polarity: Polarity,
}

impl Bench {
    pub fn new(baud_rate: f32, polarity: Polarity) -> Self {
        let idle = polarity.stop_level();
        Self {
            state: Arc::new(BenchState {
                quantum_us: 250_000.0 / baud_rate,
                now: AtomicU64::new(0),
                line: AtomicBool::new(idle),
                last_seen: AtomicBool::new(idle),
                transitions: AtomicUsize::new(0),
                cts_high: AtomicBool::new(false),
                glitch: Mutex::new(None),
                edge: Mutex::new(None),
                tx_mode: Mutex::new(None),
                rx_mode: Mutex::new(None),
                tx_timer: Mutex::new(TimerState::default()),
                rx_timer: Mutex::new(TimerState::default()),
            }),
            polarity,
        }
    }

    /// Build an inactive port on this bench's pins and timers
    pub fn port<const TXN: usize, const RXN: usize>(&self) -> SoftSerial<Sim, TXN, RXN> {
        SoftSerial::new(
            SimTxPin(self.state.clone()),
            SimRxPin(self.state.clone()),
            SimTimer {
                bench: self.state.clone(),
                rx: false,
            },
            SimTimer {
                bench: self.state.clone(),
                rx: true,
            },
            self.polarity,
        )
    }

    /// Handshake input wired to [`Bench::set_cts`]
    pub fn cts(&self) -> SimCtsPin {
        SimCtsPin(self.state.clone())
    }

    /// Drive the handshake input; asserted is low
    pub fn set_cts(&self, asserted: bool) {
        self.state.cts_high.store(!asserted, Ordering::SeqCst);
    }

    /// Make the receiver read `level` on the sample taken at `tick`
    pub fn glitch_at(&self, tick: u64, level: bool) {
        *self.state.glitch.lock().unwrap() = Some((tick, level));
    }

    pub fn now(&self) -> u64 {
        self.state.now.load(Ordering::SeqCst)
    }

    pub fn line(&self) -> bool {
        self.state.line.load(Ordering::SeqCst)
    }

    /// Level changes driven by the TX pin so far
    pub fn transitions(&self) -> usize {
        self.state.transitions.load(Ordering::SeqCst)
    }

    pub fn edge(&self) -> Option<Edge> {
        *self.state.edge.lock().unwrap()
    }

    pub fn tx_mode(&self) -> Option<PinMode> {
        *self.state.tx_mode.lock().unwrap()
    }

    pub fn rx_mode(&self) -> Option<PinMode> {
        *self.state.rx_mode.lock().unwrap()
    }

    pub fn tx_timer_running(&self) -> bool {
        self.state.tx_timer.lock().unwrap().next_fire.is_some()
    }

    pub fn rx_timer_running(&self) -> bool {
        self.state.rx_timer.lock().unwrap().next_fire.is_some()
    }

    /// Advance one quarter bit
    ///
    /// Edges driven from the foreground since the last step are seen first,
    /// then the transmit timer fires before the receive timer.
    pub fn step(&self, port: &dyn SerialInterrupts) {
        self.check_edge(port);
        let now = self.state.now.fetch_add(1, Ordering::SeqCst) + 1;

        if Self::due(&self.state.tx_timer, now) {
            port.on_tx_timer();
        }
        if Self::due(&self.state.rx_timer, now) {
            port.on_rx_timer();
        }
        self.check_edge(port);
    }

    pub fn run(&self, port: &dyn SerialInterrupts, ticks: u64) {
        for _ in 0..ticks {
            self.step(port);
        }
    }

    /// Reschedule a due timer before its handler runs so a `stop` inside
    /// the handler sticks
    fn due(timer: &Mutex<TimerState>, now: u64) -> bool {
        let mut timer = timer.lock().unwrap();
        match timer.next_fire {
            Some(at) if at == now => {
                timer.next_fire = Some(now + timer.period_ticks);
                true
            }
            _ => false,
        }
    }

    fn check_edge(&self, port: &dyn SerialInterrupts) {
        let level = self.state.line.load(Ordering::SeqCst);
        let previous = self.state.last_seen.swap(level, Ordering::SeqCst);
        if previous == level {
            return;
        }

        let armed = *self.state.edge.lock().unwrap();
        let fires = matches!(
            (armed, level),
            (Some(Edge::Falling), false) | (Some(Edge::Rising), true)
        );
        if fires {
            port.on_rx_edge();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_period_in_ticks() {
        let bench = Bench::new(9600.0, Polarity::Normal);
        let mut timer = SimTimer {
            bench: bench.state.clone(),
            rx: false,
        };

        timer.start(1_000_000.0 / 9600.0);
        assert_eq!(bench.state.tx_timer.lock().unwrap().period_ticks, 4);
        assert_eq!(bench.state.tx_timer.lock().unwrap().next_fire, Some(4));
        timer.stop();
        assert!(!bench.tx_timer_running());
    }

    #[test]
    fn test_glitch_only_hits_one_tick() {
        let bench = Bench::new(9600.0, Polarity::Normal);
        let pin = SimRxPin(bench.state.clone());

        bench.glitch_at(0, false);
        assert!(!pin.is_high());
        bench.state.now.store(1, Ordering::SeqCst);
        assert!(pin.is_high());
    }
}
