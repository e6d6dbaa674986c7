//! Interrupt-Driven Serial Device Subsystem
//!
//! This crate provides a layered architecture for a character-oriented
//! UART device:
//!
//! # Module Organization
//!
//! - [`hal`]: Platform-independent trait definitions
//! - [`serial`]: The device core: ring buffers, blocking wait primitive,
//!   engine, and interrupt service path
//! - [`notifier`]: Life-cycle status observers (LED signaling)
//! - [`platform`]: Platform-specific adapters (feature selected)
//!
//! # Design Principles
//!
//! 1. **Two Contexts, One Lock**: the interrupt path and process-context
//!    callers share the channel through a single IRQ-masking lock
//! 2. **Non-Blocking Interrupt Path**: the service loop never sleeps,
//!    never allocates, and absorbs its only failure (overrun) locally
//! 3. **Traits at the Seams**: register access, suspension, and status
//!    signaling are all injected capabilities, so a device instance is
//!    testable with in-memory doubles
//! 4. **Per-Device State**: every `SerialDevice` owns its own buffers and
//!    locks; independent instances never share globals
//!
//! # Usage Example
//!
//! ```no_run
//! use uart_common::sync::NullIrq;
//! use uart_drivers::notifier::NullNotifier;
//! use uart_drivers::serial::{SerialConfig, SerialDevice, SpinSuspend};
//!
//! fn bring_up<P: uart_drivers::HardwarePort + Send>(port: P) {
//!     let device: SerialDevice<P, SpinSuspend, NullIrq> = SerialDevice::new(
//!         port,
//!         SpinSuspend,
//!         Box::new(NullNotifier),
//!         SerialConfig::default(),
//!     )
//!     .unwrap();
//!     device.open().unwrap();
//!     device.write(b"Hello, world!\n").unwrap();
//! }
//! ```

#![no_std]

pub mod hal;
pub mod notifier;
pub mod platform;
pub mod serial;

// Re-export commonly used types
pub use hal::gpio::{GpioController, PinLevel};
pub use hal::port::{HardwarePort, IrqSource, PortStatus};
pub use notifier::{NullNotifier, StatusNotifier};
pub use serial::{SerialConfig, SerialDevice, SerialError};

extern crate alloc;

#[cfg(test)]
extern crate std;
