use core::fmt::Debug;

/// Architecture-specific interrupt masking interface.
///
/// The serial core masks interrupts for the duration of every channel
/// access so the interrupt service path can never observe a half-updated
/// ring buffer. The platform adapter supplies the implementation for its
/// architecture; [`NullIrq`] covers targets with no interrupt context at
/// all.
pub trait IrqControl {
    /// Saved interrupt state
    type State: Copy + Debug;

    /// Disable interrupts and return the previous state.
    fn disable() -> Self::State;

    /// Restore interrupts to a previous state.
    fn restore(state: Self::State);
}

/// No-op [`IrqControl`] for hosted targets and unit tests, where there is
/// no interrupt context to mask.
pub struct NullIrq;

impl IrqControl for NullIrq {
    type State = ();

    fn disable() -> Self::State {}

    fn restore(_state: Self::State) {}
}
