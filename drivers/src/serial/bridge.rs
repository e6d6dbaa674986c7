//! Interrupt service path.
//!
//! The platform's IRQ dispatch table points one entry at
//! [`SerialDevice::handle_interrupt`]; registration and acknowledgment
//! mechanics stay outside the core. The handler runs in interrupt
//! context: it never blocks, never allocates, and takes only the channel
//! lock, releasing it before delivering wakeups.

use uart_common::sync::IrqControl;

use super::engine::{DeviceState, SerialDevice};
use super::wait::Suspend;
use crate::hal::port::{HardwarePort, IrqSource, PortStatus};

impl<P, S, I> SerialDevice<P, S, I>
where
    P: HardwarePort + Send,
    S: Suspend,
    I: IrqControl,
{
    /// Service one hardware interrupt.
    ///
    /// Loops while the port reports pending conditions; the loop is
    /// bounded by hardware FIFO depth. Transmit-ready pops the TX ring
    /// into the data register, disarming the source once the ring runs
    /// dry so an idle transmitter cannot storm the line. Receive-ready
    /// pulls the data register into the RX ring; when the ring is full
    /// the byte is dropped and the overrun counter incremented - the
    /// documented lossy policy, since this path must never wait.
    ///
    /// After the channel lock is released: wakes readers when RX went
    /// empty to non-empty, and writers when TX went full to not-full.
    pub fn handle_interrupt(&self) {
        let mut rx_gained_data = false;
        let mut tx_gained_room = false;
        {
            let mut channel = self.channel.lock();
            if channel.state != DeviceState::Open {
                // Spurious interrupt racing a close; sources are already
                // masked.
                return;
            }
            loop {
                let status = channel.port.poll();
                if status.is_empty() {
                    break;
                }
                if status.contains(PortStatus::TRANSMIT_READY) {
                    let was_full = channel.tx.is_full();
                    match channel.tx.try_pop() {
                        Some(byte) => {
                            channel.port.write_data(byte);
                            if was_full {
                                tx_gained_room = true;
                            }
                        }
                        None => {
                            channel.port.disable_source(IrqSource::Transmit);
                            channel.tx_armed = false;
                        }
                    }
                }
                if status.contains(PortStatus::RECEIVE_READY) {
                    let byte = channel.port.read_data();
                    let was_empty = channel.rx.is_empty();
                    if channel.rx.try_push(byte) {
                        if was_empty {
                            rx_gained_data = true;
                        }
                    } else {
                        channel.overruns += 1;
                    }
                }
            }
        }
        if rx_gained_data {
            self.rx_wait.wake_all(&self.suspend);
        }
        if tx_gained_room {
            self.tx_wait.wake_all(&self.suspend);
        }
    }
}
