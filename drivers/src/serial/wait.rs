//! Blocking-wait primitive bridging interrupt and process context.
//!
//! Process-context callers park on a [`WaitQueue`] until the interrupt
//! service path (or `close`) signals the condition they are watching.
//! Wakeups are advisory: every woken waiter re-evaluates its predicate
//! under the channel lock before proceeding, so several callers waiting
//! on the same condition and wakeups racing with registration are both
//! safe. The discipline is:
//!
//! 1. register on the queue
//! 2. check the predicate under the channel lock; if satisfied,
//!    deregister and proceed
//! 3. block; on wakeup, deregister and go to 1
//!
//! Registering before the predicate check closes the window in which a
//! wakeup could slip between "saw nothing" and "went to sleep".

use alloc::vec::Vec;
use uart_common::sync::{IrqControl, IrqSpinLock};

/// Outcome of one suspension.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A wakeup (or a pending wake permit) ended the suspension.
    Woken,
    /// An external signal cancelled the wait.
    Interrupted,
}

/// Scheduler seam for suspending and resuming callers.
///
/// The platform's scheduler implements this; unit tests substitute an
/// implementation built on OS threads. `block` must have park-permit
/// semantics: a `wake` delivered after the caller registered on a queue
/// but before it called `block` makes the next `block` return
/// immediately rather than losing the wakeup. Spurious returns from
/// `block` are allowed; callers always re-check their predicate.
pub trait Suspend {
    /// Token identifying a blocked caller (a thread or task id).
    type Waiter: Copy + PartialEq;

    /// Token for the calling context.
    fn current(&self) -> Self::Waiter;

    /// Park the calling context until woken or interrupted.
    ///
    /// Must not be called while any lock is held.
    fn block(&self) -> WaitOutcome;

    /// Deliver a wake, or a permit if the target has not blocked yet.
    ///
    /// Callable from interrupt context; must never block.
    fn wake(&self, waiter: Self::Waiter);
}

/// Busy-wait [`Suspend`] for bring-up without a scheduler.
///
/// `block` spins once and reports [`WaitOutcome::Woken`], so callers
/// simply re-poll their predicate. Wakes are no-ops because nothing ever
/// sleeps.
pub struct SpinSuspend;

impl Suspend for SpinSuspend {
    type Waiter = ();

    fn current(&self) -> Self::Waiter {}

    fn block(&self) -> WaitOutcome {
        core::hint::spin_loop();
        WaitOutcome::Woken
    }

    fn wake(&self, _waiter: Self::Waiter) {}
}

/// A set of callers waiting on one condition over shared channel state.
///
/// The queue never evaluates the condition itself; see the module
/// documentation for the protocol. The membership list sits behind an
/// IRQ-masking lock because `wake_all` runs from the interrupt service
/// path while registration runs in process context.
pub struct WaitQueue<S: Suspend, I: IrqControl> {
    waiters: IrqSpinLock<Vec<S::Waiter>, I>,
}

impl<S: Suspend, I: IrqControl> WaitQueue<S, I> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            waiters: IrqSpinLock::new(Vec::new()),
        }
    }

    /// Register a caller. A waiter appears at most once.
    pub fn register(&self, waiter: S::Waiter) {
        let mut waiters = self.waiters.lock();
        if !waiters.contains(&waiter) {
            waiters.push(waiter);
        }
    }

    /// Remove a caller. Both the normal wake path and cancellation end
    /// here; removing an absent waiter is a no-op.
    pub fn deregister(&self, waiter: S::Waiter) {
        self.waiters.lock().retain(|w| *w != waiter);
    }

    /// Wake every registered waiter and clear the queue.
    ///
    /// Safe in interrupt context: draining in place frees no memory, and
    /// `Suspend::wake` never blocks.
    pub fn wake_all(&self, suspend: &S) {
        let mut waiters = self.waiters.lock();
        for waiter in waiters.drain(..) {
            suspend.wake(waiter);
        }
    }

    /// Number of registered waiters (diagnostic).
    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    /// True when nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Suspend, I: IrqControl> Default for WaitQueue<S, I> {
    fn default() -> Self {
        Self::new()
    }
}
