//! Primitives shared by every execution context of the serial driver
//! subsystem.
//!
//! The driver runs in two contexts at once: the interrupt service path
//! (non-preemptible, must never block) and ordinary process context. The
//! locks in [`sync`] are the only way the two are allowed to touch the
//! same data.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod sync;
