//! PC platform support: the 16550-compatible UART on the ISA I/O bus and
//! x86 interrupt masking.

mod irq;
mod uart16550;

pub use irq::X86IrqControl;
pub use uart16550::{Uart16550, COM1_BASE, COM1_IRQ};
