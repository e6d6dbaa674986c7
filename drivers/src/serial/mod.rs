//! Interrupt-driven serial device core.
//!
//! The core is the bridge between interrupt context and process context:
//!
//! - [`ring::RingBuffer`]: fixed-capacity FIFO byte buffers, one each for
//!   receive and transmit
//! - [`wait`]: the suspend/resume primitive blocking callers wait on
//! - [`engine::SerialDevice`]: per-device state and the blocking
//!   open/close/read/write/ioctl surface
//! - [`bridge`]: the interrupt service path that drains the transmit ring
//!   toward hardware and fills the receive ring from it
//!
//! Both rings live behind one IRQ-masking lock shared by the interrupt
//! path and process-context callers. Bytes surface to readers in the
//! exact order the interrupt path received them; writer bytes transmit in
//! submission order.

mod bridge;
mod engine;
mod ring;
mod wait;

#[cfg(test)]
pub(crate) mod mock;

pub use engine::{
    DeviceState, OpenPolicy, SerialConfig, SerialDevice, IOCTL_GET_BAUDRATE, IOCTL_RESET_BUFFERS,
    IOCTL_SET_BAUDRATE, SUPPORTED_BAUD_RATES,
};
pub use ring::{RingBuffer, DEFAULT_CAPACITY};
pub use wait::{SpinSuspend, Suspend, WaitOutcome, WaitQueue};

/// Errors surfaced by the serial core.
///
/// Nothing here is fatal; every variant is a recoverable signal to the
/// caller. The interrupt path never constructs one of these (its only
/// failure, receive overrun, is absorbed into a counter).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SerialError {
    /// A caller-memory transfer failed; buffer state is unchanged.
    Io,
    /// Unsupported ioctl command, or argument outside the supported set.
    InvalidArgument,
    /// `open` on a device that is already open under the exclusive policy.
    AlreadyOpen,
    /// Operation attempted on a device that is not open.
    NotOpen,
    /// The device was closed while the caller was blocked.
    Closed,
    /// An external signal interrupted the blocked caller.
    Interrupted,
}

impl core::fmt::Display for SerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            SerialError::Io => "caller memory transfer failed",
            SerialError::InvalidArgument => "unsupported command or argument",
            SerialError::AlreadyOpen => "device is already open",
            SerialError::NotOpen => "device is not open",
            SerialError::Closed => "device closed while waiting",
            SerialError::Interrupted => "wait interrupted by signal",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for SerialError {}
