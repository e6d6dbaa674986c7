//! Life-cycle status notification.
//!
//! The engine reports its life-cycle events through a [`StatusNotifier`];
//! the stock implementation drives RGB status LEDs, but anything that
//! wants to observe device activity can stand in. Hooks are invoked
//! synchronously with no core lock held, so a slow notifier delays the
//! caller without ever touching core correctness.

use crate::hal::gpio::GpioController;
use crate::hal::timer::CountingTimer;
use uart_common::sync::SpinLock;

/// Observer for serial device life-cycle events.
///
/// All hooks default to no-ops so implementations pick the events they
/// care about.
pub trait StatusNotifier {
    /// The device transitioned Closed -> Open.
    fn on_open(&self) {}

    /// The device transitioned Open -> Closed.
    fn on_close(&self) {}

    /// A read call entered the engine.
    fn on_read_start(&self) {}

    /// A read call returned `bytes` bytes.
    fn on_read_complete(&self, _bytes: usize) {}

    /// A write call entered the engine.
    fn on_write_start(&self) {}

    /// A write call accepted `bytes` bytes.
    fn on_write_complete(&self, _bytes: usize) {}

    /// The device is being torn down.
    fn on_exit(&self) {}
}

/// Notifier that observes nothing.
pub struct NullNotifier;

impl StatusNotifier for NullNotifier {}

/// RGB status LEDs driven from life-cycle events.
///
/// Red is steady while the device is open, green blinks once per
/// completed read, blue once per completed write, and all three blink
/// three times in sequence on teardown. Blinks run at a 50% duty cycle:
/// half the blink duration on, half off.
pub struct LedNotifier<G: GpioController, T: CountingTimer> {
    gpio: SpinLock<G>,
    timer: T,
    red: G::Pin,
    green: G::Pin,
    blue: G::Pin,
    blink_ms: u32,
}

impl<G: GpioController, T: CountingTimer> LedNotifier<G, T> {
    /// Default blink duration in milliseconds.
    pub const DEFAULT_BLINK_MS: u32 = 500;

    /// Wrap a GPIO controller and the three LED pins.
    ///
    /// The pins must already be configured as outputs; pin acquisition
    /// and release stay with the platform.
    pub fn new(gpio: G, timer: T, red: G::Pin, green: G::Pin, blue: G::Pin) -> Self {
        Self {
            gpio: SpinLock::new(gpio),
            timer,
            red,
            green,
            blue,
            blink_ms: Self::DEFAULT_BLINK_MS,
        }
    }

    /// Override the blink duration.
    pub fn with_blink_ms(mut self, blink_ms: u32) -> Self {
        self.blink_ms = blink_ms;
        self
    }

    fn set(&self, pin: G::Pin, high: bool) {
        let mut gpio = self.gpio.lock();
        let _ = if high {
            gpio.set_high(pin)
        } else {
            gpio.set_low(pin)
        };
    }

    fn blink(&self, pin: G::Pin) {
        self.set(pin, true);
        self.timer.delay_ms(self.blink_ms / 2);
        self.set(pin, false);
        self.timer.delay_ms(self.blink_ms / 2);
    }
}

impl<G: GpioController, T: CountingTimer> StatusNotifier for LedNotifier<G, T> {
    fn on_open(&self) {
        self.set(self.red, true);
    }

    fn on_close(&self) {
        self.set(self.red, false);
    }

    fn on_read_complete(&self, _bytes: usize) {
        self.blink(self.green);
    }

    fn on_write_complete(&self, _bytes: usize) {
        self.blink(self.blue);
    }

    fn on_exit(&self) {
        for _ in 0..3 {
            self.blink(self.red);
            self.blink(self.green);
            self.blink(self.blue);
        }
    }
}
