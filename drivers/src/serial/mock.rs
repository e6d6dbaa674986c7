//! In-memory doubles for the injected seams, used across the serial
//! tests: a register-file port, a recording notifier, and a
//! thread-parking suspension primitive.

use crate::hal::port::{HardwarePort, IrqSource, PortStatus};
use crate::notifier::StatusNotifier;
use crate::serial::wait::{Suspend, WaitOutcome};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, Thread};
use std::vec::Vec;

/// Backing state of [`MockPort`]: an in-memory register file plus the
/// wire on either side of it.
#[derive(Default)]
struct PortState {
    /// Bytes "arriving" on the line, not yet read from the data register.
    wire_in: VecDeque<u8>,
    /// Bytes the service path pushed out through the data register.
    wire_out: Vec<u8>,
    rx_enabled: bool,
    tx_enabled: bool,
    divisors: Vec<u32>,
}

/// In-memory [`HardwarePort`]. Cloning yields another handle onto the
/// same register file, so a test can keep one while the device owns the
/// other.
///
/// Status semantics mirror a real UART closely enough for the service
/// loop: transmit-ready is pending whenever the transmit source is
/// armed (the sink always accepts), receive-ready whenever the source is
/// armed and line bytes are waiting.
#[derive(Clone, Default)]
pub(crate) struct MockPort {
    state: Arc<Mutex<PortState>>,
}

impl MockPort {
    /// Queue bytes as if they arrived on the line.
    pub fn feed(&self, bytes: &[u8]) {
        self.state.lock().unwrap().wire_in.extend(bytes);
    }

    /// Everything transmitted so far, in order.
    pub fn sent(&self) -> Vec<u8> {
        self.state.lock().unwrap().wire_out.clone()
    }

    /// Whether an interrupt source is currently unmasked.
    pub fn source_enabled(&self, source: IrqSource) -> bool {
        let state = self.state.lock().unwrap();
        match source {
            IrqSource::Receive => state.rx_enabled,
            IrqSource::Transmit => state.tx_enabled,
        }
    }

    /// Every rate programmed into the divisor, in order.
    pub fn divisor_history(&self) -> Vec<u32> {
        self.state.lock().unwrap().divisors.clone()
    }
}

impl HardwarePort for MockPort {
    fn poll(&mut self) -> PortStatus {
        let state = self.state.lock().unwrap();
        let mut status = PortStatus::empty();
        if state.tx_enabled {
            status |= PortStatus::TRANSMIT_READY;
        }
        if state.rx_enabled && !state.wire_in.is_empty() {
            status |= PortStatus::RECEIVE_READY;
        }
        status
    }

    fn read_data(&mut self) -> u8 {
        self.state.lock().unwrap().wire_in.pop_front().unwrap_or(0)
    }

    fn write_data(&mut self, byte: u8) {
        self.state.lock().unwrap().wire_out.push(byte);
    }

    fn enable_source(&mut self, source: IrqSource) {
        let mut state = self.state.lock().unwrap();
        match source {
            IrqSource::Receive => state.rx_enabled = true,
            IrqSource::Transmit => state.tx_enabled = true,
        }
    }

    fn disable_source(&mut self, source: IrqSource) {
        let mut state = self.state.lock().unwrap();
        match source {
            IrqSource::Receive => state.rx_enabled = false,
            IrqSource::Transmit => state.tx_enabled = false,
        }
    }

    fn set_baud_divisor(&mut self, baud_rate: u32) {
        self.state.lock().unwrap().divisors.push(baud_rate);
    }
}

/// Life-cycle events a [`NotifierLog`] records.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Open,
    Close,
    ReadStart,
    ReadComplete(usize),
    WriteStart,
    WriteComplete(usize),
    Exit,
}

/// [`StatusNotifier`] that records the sequence of hooks it saw.
#[derive(Clone, Default)]
pub(crate) struct NotifierLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl NotifierLog {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl StatusNotifier for NotifierLog {
    fn on_open(&self) {
        self.record(Event::Open);
    }

    fn on_close(&self) {
        self.record(Event::Close);
    }

    fn on_read_start(&self) {
        self.record(Event::ReadStart);
    }

    fn on_read_complete(&self, bytes: usize) {
        self.record(Event::ReadComplete(bytes));
    }

    fn on_write_start(&self) {
        self.record(Event::WriteStart);
    }

    fn on_write_complete(&self, bytes: usize) {
        self.record(Event::WriteComplete(bytes));
    }

    fn on_exit(&self) {
        self.record(Event::Exit);
    }
}

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

std::thread_local! {
    static TOKEN: u64 = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
}

#[derive(Default)]
struct SuspendState {
    threads: HashMap<u64, Thread>,
    interrupted: HashSet<u64>,
}

/// [`Suspend`] built on `std::thread` park/unpark, which natively has
/// the permit semantics the trait demands.
#[derive(Clone, Default)]
pub(crate) struct ThreadSuspend {
    state: Arc<Mutex<SuspendState>>,
}

impl ThreadSuspend {
    /// Deliver an interruption signal to every caller that has ever
    /// registered, waking the parked ones.
    pub fn interrupt_all(&self) {
        let mut state = self.state.lock().unwrap();
        let tokens: Vec<u64> = state.threads.keys().copied().collect();
        for token in tokens {
            state.interrupted.insert(token);
            if let Some(thread) = state.threads.get(&token) {
                thread.unpark();
            }
        }
    }
}

impl Suspend for ThreadSuspend {
    type Waiter = u64;

    fn current(&self) -> u64 {
        let token = TOKEN.with(|t| *t);
        self.state
            .lock()
            .unwrap()
            .threads
            .insert(token, thread::current());
        token
    }

    fn block(&self) -> WaitOutcome {
        thread::park();
        let token = TOKEN.with(|t| *t);
        if self.state.lock().unwrap().interrupted.remove(&token) {
            WaitOutcome::Interrupted
        } else {
            WaitOutcome::Woken
        }
    }

    fn wake(&self, waiter: u64) {
        if let Some(thread) = self.state.lock().unwrap().threads.get(&waiter) {
            thread.unpark();
        }
    }
}
