//! Hardware Abstraction Layer (HAL) - Platform-Independent Traits
//!
//! This module defines generic traits for interacting with hardware
//! peripherals. These traits are implemented by platform-specific
//! adapters, allowing the serial core to be written in a
//! platform-independent manner.
//!
//! # Design Principles
//!
//! - **Zero-cost abstractions**: Traits compile to direct hardware access
//! - **Type safety**: Use associated types to catch errors at compile time
//! - **No platform leakage**: Traits must not reference platform-specific types
//!
//! # Available Interfaces
//!
//! - [`port`]: The narrow UART register/interrupt-line capability
//! - [`gpio`]: Output pin control for status LEDs
//! - [`timer`]: Free-running counter and busy-wait delays

pub mod gpio;
pub mod port;
pub mod timer;
