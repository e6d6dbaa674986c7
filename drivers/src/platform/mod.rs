//! Platform Adapters
//!
//! Adapters implement the HAL capabilities against real hardware.
//! Selection follows Cargo features; the core builds and tests with no
//! platform at all, driving the seams with in-memory doubles instead.
//!
//! # Usage
//!
//! ```ignore
//! use uart_drivers::platform::pc::{Uart16550, X86IrqControl, COM1_BASE};
//!
//! let port = unsafe { Uart16550::new(COM1_BASE) };
//! ```

cfg_if::cfg_if! {
    if #[cfg(all(feature = "pc", target_arch = "x86_64"))] {
        pub mod pc;
        pub use pc::{Uart16550, X86IrqControl};
    }
}
