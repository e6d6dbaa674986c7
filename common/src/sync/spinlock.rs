use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};

/// A busy-waiting mutual-exclusion lock for `no_std` environments.
///
/// `SpinLock` guards state that is only ever touched from process context,
/// such as a wait-queue membership list or a GPIO controller. It spins
/// until the lock becomes available, so critical sections must stay short.
/// State that an interrupt handler can also reach belongs under
/// [`IrqSpinLock`](super::IrqSpinLock) instead; taking a plain `SpinLock`
/// from interrupt context can deadlock against the interrupted holder.
///
/// # Type Parameters
///
/// * `T` - The type of data protected by the spinlock.
pub struct SpinLock<T> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

// SAFETY: SpinLock can be shared between threads if T can be sent between threads
unsafe impl<T: Send> Sync for SpinLock<T> {}
unsafe impl<T: Send> Send for SpinLock<T> {}

impl<T> SpinLock<T> {
    /// Creates a new `SpinLock` wrapping the provided data.
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }

    /// Acquires the lock, spinning until it is available.
    ///
    /// Returns a `SpinLockGuard` which provides mutable access to the
    /// underlying data. The lock is released when the guard is dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use uart_common::sync::SpinLock;
    ///
    /// let lock = SpinLock::new(0);
    /// {
    ///     let mut guard = lock.lock();
    ///     *guard += 1;
    /// } // lock is released here
    /// ```
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        while self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }
        SpinLockGuard { lock: self }
    }
}

/// A guard that provides access to the data protected by a `SpinLock`.
///
/// This guard is returned by `SpinLock::lock`. It releases the lock
/// automatically when dropped.
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<T> core::ops::Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: The lock is held, so we have exclusive access
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> core::ops::DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: The lock is held, so we have exclusive access
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    /// Releases the lock when the guard goes out of scope.
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}
