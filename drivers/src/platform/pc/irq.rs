use uart_common::sync::IrqControl;
use x86::bits64::rflags::{self, RFlags};

/// x86-64 interrupt masking for the channel lock.
pub struct X86IrqControl;

impl IrqControl for X86IrqControl {
    type State = bool;

    fn disable() -> Self::State {
        let enabled = rflags::read().contains(RFlags::FLAGS_IF);
        // SAFETY: masking interrupts is always sound; the paired restore
        // re-enables them only if they were enabled before.
        unsafe { x86::irq::disable() };
        enabled
    }

    fn restore(enabled: Self::State) {
        if enabled {
            // SAFETY: the saved state says interrupts were on at disable.
            unsafe { x86::irq::enable() };
        }
    }
}
