//! Serial Port Hardware Capability.
//!
//! This module defines the narrow capability the platform supplies for
//! UART register access and interrupt line control. The interrupt service
//! path drives it exclusively through decoded conditions; the exact
//! register map and bit layout live entirely in the adapter.

use bitflags::bitflags;

bitflags! {
    /// Pending conditions decoded from the port's status register.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct PortStatus: u8 {
        /// The transmit holding register can accept a byte.
        const TRANSMIT_READY = 1 << 0;
        /// The receive register holds an unread byte.
        const RECEIVE_READY = 1 << 1;
    }
}

/// Interrupt sources a serial port can raise.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IrqSource {
    /// Transmit holding register empty.
    Transmit,
    /// Receive data available.
    Receive,
}

/// UART register/interrupt-line capability supplied by the platform.
///
/// Every method here runs with the channel lock held, possibly in
/// interrupt context, so implementations must be non-blocking: register
/// reads and writes only, no waiting on line state.
///
/// A test double can substitute an in-memory register file.
pub trait HardwarePort {
    /// Decode the currently pending interrupt conditions.
    ///
    /// Returns the empty set once nothing is pending. Hardware bounds the
    /// work behind each condition (FIFO depth), so a loop that services
    /// conditions until this returns empty terminates.
    fn poll(&mut self) -> PortStatus;

    /// Read a received byte from the data register.
    fn read_data(&mut self) -> u8;

    /// Write a byte into the transmit data register.
    fn write_data(&mut self, byte: u8);

    /// Unmask an interrupt source.
    fn enable_source(&mut self, source: IrqSource);

    /// Mask an interrupt source.
    fn disable_source(&mut self, source: IrqSource);

    /// Reprogram the baud-rate divisor for the given rate.
    ///
    /// The caller has already validated the rate against the supported
    /// set.
    fn set_baud_divisor(&mut self, baud_rate: u32);
}
