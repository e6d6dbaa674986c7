//! 16550-compatible UART adapter over x86 port I/O.
//!
//! Implements [`HardwarePort`] for the classic PC serial port: six
//! registers at consecutive I/O offsets from the base, interrupt
//! identification in the IIR, and the divisor latch reached by setting
//! DLAB in the line-control register.

use crate::hal::port::{HardwarePort, IrqSource, PortStatus};
use x86::io::{inb, outb};

/// I/O base of the primary PC serial port.
pub const COM1_BASE: u16 = 0x3f8;
/// ISA interrupt line of the primary PC serial port.
pub const COM1_IRQ: u32 = 4;

// Register offsets from the I/O base.
const REG_DATA: u16 = 0;
const REG_INT_ENABLE: u16 = 1; // divisor high byte when DLAB is set
const REG_INT_IDENT: u16 = 2; // read: IIR, write: FIFO control
const REG_LINE_CTRL: u16 = 3;
const REG_MODEM_CTRL: u16 = 4;
const REG_LINE_STATUS: u16 = 5;

// Interrupt-enable register bits.
const IER_RX_AVAILABLE: u8 = 1 << 0;
const IER_TX_EMPTY: u8 = 1 << 1;

// Interrupt-identification register bits. Bit 0 low means an interrupt
// is pending; bits 1-3 identify it.
const IIR_NO_PENDING: u8 = 1 << 0;
const IIR_ID_MASK: u8 = 0b1110;
const IIR_TX_EMPTY: u8 = 0b0010;
const IIR_RX_AVAILABLE: u8 = 0b0100;

// Line-control register bits.
const LCR_WLEN_8: u8 = 0b11;
const LCR_DLAB: u8 = 1 << 7;

// Line-status register bits.
const LSR_DATA_READY: u8 = 1 << 0;

/// Enable FIFOs, clear them, 14-byte receive trigger.
const FCR_ENABLE_CLEAR: u8 = 0xC7;
/// DTR + RTS + OUT2 (OUT2 gates the interrupt line on PC hardware).
const MCR_DTR_RTS_OUT2: u8 = 0x0B;

/// UART input clock divided by 16; divisor = this / baud rate.
const DIVISOR_CLOCK: u32 = 115_200;

/// Divisor latch value for a requested rate.
///
/// Total, so a caller handing [`Uart16550::init`] an out-of-range rate
/// gets the slowest or fastest hardware rate instead of a panic: zero
/// clamps to the maximum divisor, rates above the clock to divisor 1.
fn divisor_for(baud_rate: u32) -> u16 {
    (DIVISOR_CLOCK / baud_rate.max(1)).clamp(1, u16::MAX as u32) as u16
}

/// Port-I/O adapter for a 16550-compatible UART.
pub struct Uart16550 {
    base: u16,
    /// Shadow of the interrupt-enable register; avoids read-modify-write
    /// of a register that doubles as the divisor high byte under DLAB.
    ier: u8,
}

impl Uart16550 {
    /// Wrap the UART at `base`.
    ///
    /// # Safety
    /// `base` must be the I/O base of a 16550-compatible UART that the
    /// caller exclusively owns.
    pub const unsafe fn new(base: u16) -> Self {
        Self { base, ier: 0 }
    }

    /// Program line discipline (8N1), FIFOs, and modem control.
    ///
    /// Call once before handing the port to a device; interrupt sources
    /// start masked.
    pub fn init(&mut self, baud_rate: u32) {
        unsafe {
            outb(self.base + REG_INT_ENABLE, 0);
        }
        self.set_baud_divisor(baud_rate);
        unsafe {
            outb(self.base + REG_LINE_CTRL, LCR_WLEN_8);
            outb(self.base + REG_INT_IDENT, FCR_ENABLE_CLEAR);
            outb(self.base + REG_MODEM_CTRL, MCR_DTR_RTS_OUT2);
        }
        self.ier = 0;
    }

    fn flush_ier(&mut self) {
        unsafe { outb(self.base + REG_INT_ENABLE, self.ier) };
    }

    /// Whether a received byte is waiting, from the line status register.
    pub fn data_ready(&self) -> bool {
        unsafe { inb(self.base + REG_LINE_STATUS) & LSR_DATA_READY != 0 }
    }
}

impl HardwarePort for Uart16550 {
    fn poll(&mut self) -> PortStatus {
        let iir = unsafe { inb(self.base + REG_INT_IDENT) };
        let mut status = PortStatus::empty();
        if iir & IIR_NO_PENDING == 0 {
            match iir & IIR_ID_MASK {
                IIR_TX_EMPTY => status |= PortStatus::TRANSMIT_READY,
                IIR_RX_AVAILABLE => status |= PortStatus::RECEIVE_READY,
                _ => {}
            }
        }
        status
    }

    fn read_data(&mut self) -> u8 {
        unsafe { inb(self.base + REG_DATA) }
    }

    fn write_data(&mut self, byte: u8) {
        unsafe { outb(self.base + REG_DATA, byte) };
    }

    fn enable_source(&mut self, source: IrqSource) {
        self.ier |= match source {
            IrqSource::Receive => IER_RX_AVAILABLE,
            IrqSource::Transmit => IER_TX_EMPTY,
        };
        self.flush_ier();
    }

    fn disable_source(&mut self, source: IrqSource) {
        self.ier &= !match source {
            IrqSource::Receive => IER_RX_AVAILABLE,
            IrqSource::Transmit => IER_TX_EMPTY,
        };
        self.flush_ier();
    }

    fn set_baud_divisor(&mut self, baud_rate: u32) {
        let divisor = divisor_for(baud_rate);
        unsafe {
            let lcr = inb(self.base + REG_LINE_CTRL);
            outb(self.base + REG_LINE_CTRL, lcr | LCR_DLAB);
            outb(self.base + REG_DATA, (divisor & 0xff) as u8);
            outb(self.base + REG_INT_ENABLE, (divisor >> 8) as u8);
            outb(self.base + REG_LINE_CTRL, lcr & !LCR_DLAB);
        }
        self.flush_ier();
    }
}
