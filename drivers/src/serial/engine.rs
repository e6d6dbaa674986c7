//! Serial device engine: per-device state and the blocking
//! open/close/read/write/ioctl surface.
//!
//! A `SerialDevice` owns both rings, the life-cycle state, and the locks;
//! it is constructed per device, so independent instances never share
//! state. Two locks split the two kinds of mutation:
//!
//! - the channel lock (IRQ-masking, shared with the interrupt service
//!   path) guards the rings and the open/closed flag, held only long
//!   enough to inspect or move bytes;
//! - the configuration lock (sleeping, process context only) serializes
//!   open/close transitions and baud-rate changes.
//!
//! The channel lock is never held across a suspension, a notifier call,
//! or a log call. The configuration lock stays held across the open and
//! close notifications so concurrent transitions report in order; it is
//! a sleeping lock and is never taken in interrupt context.

use alloc::boxed::Box;
use spin::Mutex;
use uart_common::sync::{IrqControl, IrqSpinLock};

use super::ring::{RingBuffer, DEFAULT_CAPACITY};
use super::wait::{Suspend, WaitOutcome, WaitQueue};
use super::SerialError;
use crate::hal::port::{HardwarePort, IrqSource};
use crate::notifier::StatusNotifier;

/// Baud rates the engine accepts (the classic 16550 divisor table).
pub const SUPPORTED_BAUD_RATES: [u32; 11] = [
    110, 300, 600, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200,
];

/// `ioctl` command: set the baud rate to the argument value.
pub const IOCTL_SET_BAUDRATE: u32 = 0;
/// `ioctl` command: return the current baud rate.
pub const IOCTL_GET_BAUDRATE: u32 = 1;
/// `ioctl` command: reset both rings.
pub const IOCTL_RESET_BUFFERS: u32 = 2;

/// What a second `open` on an already-open device does.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpenPolicy {
    /// `open` on an open device fails with [`SerialError::AlreadyOpen`].
    Exclusive,
    /// `open` on an open device succeeds as a no-op.
    Shared,
}

/// Open/closed life-cycle state of a device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceState {
    /// Interrupt sources masked, rings idle. The initial state.
    Closed,
    /// Receive interrupts enabled, read/write available.
    Open,
}

/// Device construction parameters.
#[derive(Debug, Copy, Clone)]
pub struct SerialConfig {
    /// Initial baud rate; must be in [`SUPPORTED_BAUD_RATES`].
    pub baud_rate: u32,
    /// Concurrent-open policy.
    pub open_policy: OpenPolicy,
    /// Receive ring capacity in bytes.
    pub rx_capacity: usize,
    /// Transmit ring capacity in bytes.
    pub tx_capacity: usize,
}

impl Default for SerialConfig {
    /// 115200 baud, shared opens, 4000-byte rings.
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            open_policy: OpenPolicy::Shared,
            rx_capacity: DEFAULT_CAPACITY,
            tx_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Channel state shared between process context and the interrupt path.
///
/// Reached only through the device's channel lock.
pub(super) struct Channel<P: HardwarePort> {
    pub(super) port: P,
    pub(super) rx: RingBuffer,
    pub(super) tx: RingBuffer,
    pub(super) state: DeviceState,
    /// Transmit interrupt source currently armed.
    pub(super) tx_armed: bool,
    /// Receive bytes dropped against a full RX ring. Monotonic,
    /// diagnostic only.
    pub(super) overruns: u64,
}

/// Mutable configuration, serialized by the sleeping configuration lock.
struct Config {
    baud_rate: u32,
}

/// Outcome of one predicate check under the channel lock.
enum Progress<T> {
    Ready(T),
    Pending,
    Closed,
}

/// One serial device instance.
///
/// Type parameters are the three injected seams: `P` supplies register
/// access, `S` supplies suspension, and `I` supplies interrupt masking
/// for the channel lock. The status notifier is injected as a trait
/// object at construction.
pub struct SerialDevice<P: HardwarePort, S: Suspend, I: IrqControl> {
    pub(super) channel: IrqSpinLock<Channel<P>, I>,
    config: Mutex<Config>,
    pub(super) suspend: S,
    pub(super) rx_wait: WaitQueue<S, I>,
    pub(super) tx_wait: WaitQueue<S, I>,
    notifier: Box<dyn StatusNotifier + Send + Sync>,
    open_policy: OpenPolicy,
}

impl<P, S, I> SerialDevice<P, S, I>
where
    P: HardwarePort + Send,
    S: Suspend,
    I: IrqControl,
{
    /// Build a device around a hardware port.
    ///
    /// Programs the initial baud divisor; the device starts Closed with
    /// all interrupt sources masked. Fails with
    /// [`SerialError::InvalidArgument`] when the configured rate is not
    /// in the supported set.
    pub fn new(
        mut port: P,
        suspend: S,
        notifier: Box<dyn StatusNotifier + Send + Sync>,
        config: SerialConfig,
    ) -> Result<Self, SerialError> {
        if !SUPPORTED_BAUD_RATES.contains(&config.baud_rate) {
            return Err(SerialError::InvalidArgument);
        }
        port.set_baud_divisor(config.baud_rate);
        port.disable_source(IrqSource::Receive);
        port.disable_source(IrqSource::Transmit);
        Ok(Self {
            channel: IrqSpinLock::new(Channel {
                port,
                rx: RingBuffer::new(config.rx_capacity),
                tx: RingBuffer::new(config.tx_capacity),
                state: DeviceState::Closed,
                tx_armed: false,
                overruns: 0,
            }),
            config: Mutex::new(Config {
                baud_rate: config.baud_rate,
            }),
            suspend,
            rx_wait: WaitQueue::new(),
            tx_wait: WaitQueue::new(),
            notifier,
            open_policy: config.open_policy,
        })
    }

    /// Current life-cycle state.
    pub fn state(&self) -> DeviceState {
        self.channel.lock().state
    }

    /// Receive bytes dropped so far against a full RX ring.
    pub fn overruns(&self) -> u64 {
        self.channel.lock().overruns
    }

    /// Transition Closed -> Open and enable the receive interrupt source.
    ///
    /// On an already-open device the outcome follows the configured
    /// [`OpenPolicy`].
    pub fn open(&self) -> Result<(), SerialError> {
        let _config = self.config.lock();
        {
            let mut channel = self.channel.lock();
            match channel.state {
                DeviceState::Open => {
                    return match self.open_policy {
                        OpenPolicy::Exclusive => Err(SerialError::AlreadyOpen),
                        OpenPolicy::Shared => Ok(()),
                    };
                }
                DeviceState::Closed => {
                    channel.state = DeviceState::Open;
                    channel.port.enable_source(IrqSource::Receive);
                }
            }
        }
        log::info!("serial device opened");
        self.notifier.on_open();
        Ok(())
    }

    /// Transition Open -> Closed.
    ///
    /// Masks both interrupt sources, discards both rings, and wakes every
    /// blocked waiter; the waiters observe the Closed state and return
    /// [`SerialError::Closed`] instead of hanging. Idempotent.
    pub fn close(&self) -> Result<(), SerialError> {
        let _config = self.config.lock();
        let was_open = {
            let mut channel = self.channel.lock();
            match channel.state {
                DeviceState::Closed => false,
                DeviceState::Open => {
                    channel.port.disable_source(IrqSource::Receive);
                    channel.port.disable_source(IrqSource::Transmit);
                    channel.tx_armed = false;
                    channel.rx.reset();
                    channel.tx.reset();
                    channel.state = DeviceState::Closed;
                    true
                }
            }
        };
        if was_open {
            self.rx_wait.wake_all(&self.suspend);
            self.tx_wait.wake_all(&self.suspend);
            log::info!("serial device closed");
            self.notifier.on_close();
        }
        Ok(())
    }

    /// Blocking read.
    ///
    /// Suspends until the RX ring has at least one byte or the device
    /// closes, then moves `min(buf.len(), available)` bytes into `buf`
    /// and returns the count. Returns [`SerialError::NotOpen`] when the
    /// device is not open at entry and [`SerialError::Closed`] when it
    /// closed while the caller was blocked.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, SerialError> {
        self.notifier.on_read_start();
        if buf.is_empty() {
            self.notifier.on_read_complete(0);
            return Ok(0);
        }
        let count = self.read_blocking(buf)?;
        self.notifier.on_read_complete(count);
        Ok(count)
    }

    fn read_blocking(&self, buf: &mut [u8]) -> Result<usize, SerialError> {
        let mut blocked = false;
        loop {
            let waiter = self.suspend.current();
            self.rx_wait.register(waiter);
            let progress = {
                let mut channel = self.channel.lock();
                if channel.state == DeviceState::Closed {
                    Progress::Closed
                } else if channel.rx.is_empty() {
                    Progress::Pending
                } else {
                    let mut count = 0;
                    while count < buf.len() {
                        match channel.rx.try_pop() {
                            Some(byte) => {
                                buf[count] = byte;
                                count += 1;
                            }
                            None => break,
                        }
                    }
                    Progress::Ready(count)
                }
            };
            match progress {
                Progress::Ready(count) => {
                    self.rx_wait.deregister(waiter);
                    return Ok(count);
                }
                Progress::Closed => {
                    self.rx_wait.deregister(waiter);
                    return Err(if blocked {
                        SerialError::Closed
                    } else {
                        SerialError::NotOpen
                    });
                }
                Progress::Pending => {
                    blocked = true;
                    match self.suspend.block() {
                        WaitOutcome::Woken => self.rx_wait.deregister(waiter),
                        WaitOutcome::Interrupted => {
                            self.rx_wait.deregister(waiter);
                            return Err(SerialError::Interrupted);
                        }
                    }
                }
            }
        }
    }

    /// Blocking write.
    ///
    /// Pushes as many bytes as currently fit into the TX ring, arms the
    /// transmit interrupt source whenever it was idle and bytes were
    /// queued, and re-suspends until every byte is accepted. Returns the
    /// total accepted. Returns [`SerialError::Closed`] when the device
    /// closes mid-write (queued bytes were discarded by the close) and,
    /// when interrupted before any byte was accepted,
    /// [`SerialError::Interrupted`]; an interruption after partial
    /// acceptance returns the partial count.
    pub fn write(&self, data: &[u8]) -> Result<usize, SerialError> {
        self.notifier.on_write_start();
        if data.is_empty() {
            self.notifier.on_write_complete(0);
            return Ok(0);
        }
        let count = self.write_blocking(data)?;
        self.notifier.on_write_complete(count);
        Ok(count)
    }

    fn write_blocking(&self, data: &[u8]) -> Result<usize, SerialError> {
        let mut written = 0;
        let mut blocked = false;
        loop {
            let waiter = self.suspend.current();
            self.tx_wait.register(waiter);
            let progress = {
                let mut channel = self.channel.lock();
                if channel.state == DeviceState::Closed {
                    Progress::Closed
                } else {
                    let mut pushed = 0;
                    while written + pushed < data.len() && channel.tx.try_push(data[written + pushed])
                    {
                        pushed += 1;
                    }
                    if pushed > 0 && !channel.tx_armed {
                        channel.tx_armed = true;
                        channel.port.enable_source(IrqSource::Transmit);
                    }
                    if written + pushed == data.len() {
                        Progress::Ready(pushed)
                    } else {
                        written += pushed;
                        Progress::Pending
                    }
                }
            };
            match progress {
                Progress::Ready(pushed) => {
                    self.tx_wait.deregister(waiter);
                    return Ok(written + pushed);
                }
                Progress::Closed => {
                    self.tx_wait.deregister(waiter);
                    return Err(if blocked {
                        SerialError::Closed
                    } else {
                        SerialError::NotOpen
                    });
                }
                Progress::Pending => {
                    blocked = true;
                    match self.suspend.block() {
                        WaitOutcome::Woken => self.tx_wait.deregister(waiter),
                        WaitOutcome::Interrupted => {
                            self.tx_wait.deregister(waiter);
                            return if written > 0 {
                                Ok(written)
                            } else {
                                Err(SerialError::Interrupted)
                            };
                        }
                    }
                }
            }
        }
    }

    /// Raw ioctl entry point.
    ///
    /// Dispatches [`IOCTL_SET_BAUDRATE`], [`IOCTL_GET_BAUDRATE`], and
    /// [`IOCTL_RESET_BUFFERS`]; any other command fails with
    /// [`SerialError::InvalidArgument`]. The returned value is the
    /// current baud rate for GET and zero otherwise.
    pub fn ioctl(&self, cmd: u32, arg: u32) -> Result<u32, SerialError> {
        match cmd {
            IOCTL_SET_BAUDRATE => self.set_baud_rate(arg).map(|()| 0),
            IOCTL_GET_BAUDRATE => Ok(self.baud_rate()),
            IOCTL_RESET_BUFFERS => self.reset_buffers().map(|()| 0),
            _ => Err(SerialError::InvalidArgument),
        }
    }

    /// Change the baud rate and reprogram the hardware divisor.
    ///
    /// Serialized by the configuration lock; never called from interrupt
    /// context. A rate outside [`SUPPORTED_BAUD_RATES`] fails with
    /// [`SerialError::InvalidArgument`], and a device that is not open
    /// fails with [`SerialError::NotOpen`]; neither touches the divisor.
    pub fn set_baud_rate(&self, rate: u32) -> Result<(), SerialError> {
        if !SUPPORTED_BAUD_RATES.contains(&rate) {
            return Err(SerialError::InvalidArgument);
        }
        let mut config = self.config.lock();
        {
            let mut channel = self.channel.lock();
            if channel.state != DeviceState::Open {
                return Err(SerialError::NotOpen);
            }
            channel.port.set_baud_divisor(rate);
        }
        config.baud_rate = rate;
        log::info!("baud rate set to {rate}");
        Ok(())
    }

    /// Current baud rate. No side effects.
    pub fn baud_rate(&self) -> u32 {
        self.config.lock().baud_rate
    }

    /// Reset both rings, atomically with respect to the interrupt path.
    ///
    /// Idempotent and immediate; never blocks. Writers blocked on a full
    /// TX ring are woken because the reset made room.
    pub fn reset_buffers(&self) -> Result<(), SerialError> {
        {
            let mut channel = self.channel.lock();
            channel.rx.reset();
            channel.tx.reset();
        }
        self.tx_wait.wake_all(&self.suspend);
        log::debug!("serial rings reset");
        Ok(())
    }
}

impl<P, S, I> Drop for SerialDevice<P, S, I>
where
    P: HardwarePort,
    S: Suspend,
    I: IrqControl,
{
    fn drop(&mut self) {
        self.notifier.on_exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::mock::{Event, MockPort, NotifierLog, ThreadSuspend};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use std::vec;
    use std::vec::Vec;
    use uart_common::sync::NullIrq;

    type TestDevice = SerialDevice<MockPort, ThreadSuspend, NullIrq>;

    struct Fixture {
        device: Arc<TestDevice>,
        port: MockPort,
        suspend: ThreadSuspend,
        log: NotifierLog,
    }

    fn fixture(config: SerialConfig) -> Fixture {
        let port = MockPort::default();
        let suspend = ThreadSuspend::default();
        let log = NotifierLog::default();
        let device = SerialDevice::new(
            port.clone(),
            suspend.clone(),
            Box::new(log.clone()),
            config,
        )
        .unwrap();
        Fixture {
            device: Arc::new(device),
            port,
            suspend,
            log,
        }
    }

    fn small_config() -> SerialConfig {
        SerialConfig {
            rx_capacity: 16,
            tx_capacity: 8,
            ..SerialConfig::default()
        }
    }

    #[test]
    fn write_with_room_completes_without_suspending() {
        // Scenario: TX empty with free space >= 5, write("HELLO").
        let f = fixture(small_config());
        f.device.open().unwrap();

        assert_eq!(f.device.write(b"HELLO"), Ok(5));
        assert_eq!(
            f.log.events(),
            vec![
                Event::Open,
                Event::WriteStart,
                Event::WriteComplete(5),
            ]
        );
        assert!(f.port.source_enabled(IrqSource::Transmit));

        // The service path drains exactly five bytes, in order, then
        // disarms the idle transmitter.
        f.device.handle_interrupt();
        assert_eq!(f.port.sent(), b"HELLO");
        assert!(!f.port.source_enabled(IrqSource::Transmit));
    }

    #[test]
    fn read_blocks_until_interrupt_delivers_bytes() {
        // Scenario: RX empty, read(10) suspends; the ISR delivers X,Y,Z.
        let f = fixture(small_config());
        f.device.open().unwrap();

        let device = Arc::clone(&f.device);
        let reader = thread::spawn(move || {
            let mut buf = [0u8; 10];
            let n = device.read(&mut buf)?;
            Ok::<Vec<u8>, SerialError>(buf[..n].to_vec())
        });

        // Give the reader a chance to park before data arrives.
        thread::sleep(Duration::from_millis(50));
        f.port.feed(b"XYZ");
        f.device.handle_interrupt();

        assert_eq!(reader.join().unwrap(), Ok(b"XYZ".to_vec()));
    }

    #[test]
    fn baud_rate_ioctl_round_trip_and_rejection() {
        let f = fixture(SerialConfig::default());
        f.device.open().unwrap();

        assert_eq!(f.device.ioctl(IOCTL_SET_BAUDRATE, 9600), Ok(0));
        assert_eq!(f.device.ioctl(IOCTL_GET_BAUDRATE, 0), Ok(9600));

        assert_eq!(
            f.device.ioctl(IOCTL_SET_BAUDRATE, 123_456),
            Err(SerialError::InvalidArgument)
        );
        assert_eq!(f.device.ioctl(IOCTL_GET_BAUDRATE, 0), Ok(9600));

        // Construction programmed 115200, the accepted change 9600; the
        // rejected rate never reached the divisor.
        assert_eq!(f.port.divisor_history(), vec![115_200, 9600]);
    }

    #[test]
    fn set_baud_on_a_device_that_is_not_open_is_rejected() {
        let f = fixture(SerialConfig::default());
        assert_eq!(
            f.device.ioctl(IOCTL_SET_BAUDRATE, 9600),
            Err(SerialError::NotOpen)
        );

        f.device.open().unwrap();
        f.device.close().unwrap();
        assert_eq!(
            f.device.ioctl(IOCTL_SET_BAUDRATE, 9600),
            Err(SerialError::NotOpen)
        );

        // Only the construction-time rate ever reached the divisor.
        assert_eq!(f.port.divisor_history(), vec![115_200]);
        assert_eq!(f.device.baud_rate(), 115_200);
    }

    #[test]
    fn unknown_ioctl_command_is_rejected() {
        let f = fixture(SerialConfig::default());
        assert_eq!(f.device.ioctl(99, 0), Err(SerialError::InvalidArgument));
    }

    #[test]
    fn close_unblocks_a_pending_read() {
        // Scenario: read(10) blocked on an empty RX, then close().
        let f = fixture(small_config());
        f.device.open().unwrap();

        let device = Arc::clone(&f.device);
        let reader = thread::spawn(move || {
            let mut buf = [0u8; 10];
            device.read(&mut buf)
        });

        thread::sleep(Duration::from_millis(50));
        f.device.close().unwrap();

        assert_eq!(reader.join().unwrap(), Err(SerialError::Closed));
        assert!(f.log.events().contains(&Event::Close));
    }

    #[test]
    fn interrupted_read_returns_instead_of_hanging() {
        let f = fixture(small_config());
        f.device.open().unwrap();

        let device = Arc::clone(&f.device);
        let reader = thread::spawn(move || {
            let mut buf = [0u8; 4];
            device.read(&mut buf)
        });

        thread::sleep(Duration::from_millis(50));
        f.suspend.interrupt_all();

        assert_eq!(reader.join().unwrap(), Err(SerialError::Interrupted));
    }

    #[test]
    fn write_larger_than_tx_ring_completes_across_drains() {
        let f = fixture(small_config()); // tx capacity 8
        f.device.open().unwrap();

        let device = Arc::clone(&f.device);
        let writer = thread::spawn(move || device.write(b"0123456789ABCDEF"));

        // Drain until all sixteen bytes crossed the wire.
        for _ in 0..200 {
            f.device.handle_interrupt();
            if f.port.sent().len() == 16 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(writer.join().unwrap(), Ok(16));
        assert_eq!(f.port.sent(), b"0123456789ABCDEF");
    }

    #[test]
    fn bytes_surface_in_arrival_order() {
        let f = fixture(small_config());
        f.device.open().unwrap();

        f.port.feed(b"abc");
        f.device.handle_interrupt();
        f.port.feed(b"def");
        f.device.handle_interrupt();

        let mut buf = [0u8; 16];
        assert_eq!(f.device.read(&mut buf), Ok(6));
        assert_eq!(&buf[..6], b"abcdef");
    }

    #[test]
    fn read_and_write_require_an_open_device() {
        let f = fixture(small_config());
        let mut buf = [0u8; 4];
        assert_eq!(f.device.read(&mut buf), Err(SerialError::NotOpen));
        assert_eq!(f.device.write(b"hi"), Err(SerialError::NotOpen));
    }

    #[test]
    fn exclusive_policy_rejects_second_open() {
        let f = fixture(SerialConfig {
            open_policy: OpenPolicy::Exclusive,
            ..small_config()
        });
        assert_eq!(f.device.open(), Ok(()));
        assert_eq!(f.device.open(), Err(SerialError::AlreadyOpen));
    }

    #[test]
    fn shared_policy_allows_reopen_without_side_effects() {
        let f = fixture(small_config());
        assert_eq!(f.device.open(), Ok(()));
        assert_eq!(f.device.open(), Ok(()));
        let opens = f
            .log
            .events()
            .iter()
            .filter(|event| **event == Event::Open)
            .count();
        assert_eq!(opens, 1);
    }

    #[test]
    fn close_is_idempotent() {
        let f = fixture(small_config());
        f.device.open().unwrap();
        assert_eq!(f.device.close(), Ok(()));
        assert_eq!(f.device.close(), Ok(()));
        assert_eq!(f.device.state(), DeviceState::Closed);
    }

    #[test]
    fn reset_buffers_empties_both_rings_and_is_idempotent() {
        let f = fixture(small_config());
        f.device.open().unwrap();

        f.device.write(b"queued").unwrap();
        f.port.feed(b"in");
        f.device.handle_interrupt();

        for _ in 0..2 {
            assert_eq!(f.device.ioctl(IOCTL_RESET_BUFFERS, 0), Ok(0));
            let channel = f.device.channel.lock();
            assert_eq!(channel.rx.available(), 0);
            assert_eq!(channel.tx.available(), 0);
        }
    }

    #[test]
    fn rejects_unsupported_initial_baud_rate() {
        let result = SerialDevice::<_, _, NullIrq>::new(
            MockPort::default(),
            ThreadSuspend::default(),
            Box::new(NotifierLog::default()),
            SerialConfig {
                baud_rate: 12345,
                ..SerialConfig::default()
            },
        );
        assert!(matches!(result, Err(SerialError::InvalidArgument)));
    }

    #[test]
    fn drop_signals_exit() {
        let log = NotifierLog::default();
        {
            let _device = SerialDevice::<_, _, NullIrq>::new(
                MockPort::default(),
                ThreadSuspend::default(),
                Box::new(log.clone()),
                SerialConfig::default(),
            )
            .unwrap();
        }
        assert_eq!(log.events(), vec![Event::Exit]);
    }
}
