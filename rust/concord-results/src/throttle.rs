//! Cooperative pause/resume for long-running result computation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

/// Scheduling weight for a driving computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    #[default]
    Normal,
    /// Yield the driving thread at every unit boundary, so the computation
    /// makes progress without crowding out concurrent queries.
    Low,
}

/// Lets an operator pause and resume a driving computation without killing
/// it.
///
/// The throttle is shared between the result stream being driven and the job
/// controlling it: the driver calls [`wait_if_paused`](Self::wait_if_paused)
/// at every unit boundary (before each source pull), an external task flips
/// [`pause`](Self::pause). Suspension therefore only ever happens *between*
/// discrete units of work, never mid-unit, and no pause or resume signal can
/// be lost.
pub struct ThreadThrottle {
    state: Mutex<ThrottleState>,
    unpaused: Condvar,
}

#[derive(Debug, Default)]
struct ThrottleState {
    paused: bool,
    priority: Priority,
}

impl ThreadThrottle {
    pub fn new() -> ThreadThrottle {
        ThreadThrottle {
            state: Mutex::new(ThrottleState::default()),
            unpaused: Condvar::new(),
        }
    }

    /// Pauses or resumes the driving computation.
    pub fn pause(&self, paused: bool) {
        let mut state = self.state.lock().expect("throttle lock");
        state.paused = paused;
        if !paused {
            self.unpaused.notify_all();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().expect("throttle lock").paused
    }

    /// Adjusts the scheduling weight of the driving computation.
    pub fn behave_with(&self, priority: Priority) {
        self.state.lock().expect("throttle lock").priority = priority;
    }

    pub fn priority(&self) -> Priority {
        self.state.lock().expect("throttle lock").priority
    }

    /// Called by the driver at each unit boundary. Blocks while paused,
    /// unless `interrupt` is raised (cooperative cancellation must win over
    /// an indefinite pause). Callers raise `interrupt` *before* calling
    /// [`interrupt_waiters`](Self::interrupt_waiters).
    pub fn wait_if_paused(&self, interrupt: &AtomicBool) {
        let mut state = self.state.lock().expect("throttle lock");
        while state.paused && !interrupt.load(Ordering::Acquire) {
            state = self.unpaused.wait(state).expect("throttle lock");
        }
        let yield_now = state.priority == Priority::Low;
        drop(state);
        if yield_now {
            std::thread::yield_now();
        }
    }

    /// Wakes any driver blocked in [`wait_if_paused`](Self::wait_if_paused)
    /// so it can observe its interrupt flag. Takes the state lock, which
    /// guarantees the wakeup cannot race with a driver that is between
    /// checking the flag and going to sleep.
    pub fn interrupt_waiters(&self) {
        let _state = self.state.lock().expect("throttle lock");
        self.unpaused.notify_all();
    }
}

impl Default for ThreadThrottle {
    fn default() -> Self {
        ThreadThrottle::new()
    }
}
