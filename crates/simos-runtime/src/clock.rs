//! A minimal stand-in for the simulator's external timer/event bus
//! (spec.md §1 names it an out-of-scope collaborator): a monotonic tick
//! counter that every CPU and loader thread rendezvous on through
//! [`SimClock::next_slot`], mirroring the original driver's
//! `next_slot(timer_id)` wait point.

use std::sync::{Condvar, Mutex};

struct ClockState {
    tick: u64,
    stopped: bool,
}

/// Shared simulated clock. One dedicated ticker thread (see
/// [`crate::Runtime::run`]) calls [`SimClock::advance`]; every CPU and
/// loader thread calls [`SimClock::next_slot`] to yield until the next
/// tick.
pub struct SimClock {
    state: Mutex<ClockState>,
    cv: Condvar,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClockState {
                tick: 0,
                stopped: false,
            }),
            cv: Condvar::new(),
        }
    }

    /// `current_time()`: the latest tick observed.
    pub fn current_time(&self) -> u64 {
        self.state.lock().expect("clock mutex poisoned").tick
    }

    /// Blocks until the tick advances past the value observed on entry, or
    /// the clock has been stopped. Returns the tick observed on wake.
    pub fn next_slot(&self) -> u64 {
        let mut state = self.state.lock().expect("clock mutex poisoned");
        let start = state.tick;
        while state.tick == start && !state.stopped {
            state = self.cv.wait(state).expect("clock mutex poisoned");
        }
        state.tick
    }

    /// Advances the clock by one tick and wakes every waiter.
    pub fn advance(&self) {
        let mut state = self.state.lock().expect("clock mutex poisoned");
        state.tick += 1;
        self.cv.notify_all();
    }

    /// Wakes every waiter without advancing the tick, so threads blocked in
    /// `next_slot` can observe shutdown and exit their loops.
    pub fn stop(&self) {
        let mut state = self.state.lock().expect("clock mutex poisoned");
        state.stopped = true;
        self.cv.notify_all();
    }

    pub fn stopped(&self) -> bool {
        self.state.lock().expect("clock mutex poisoned").stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn next_slot_blocks_until_advance() {
        let clock = Arc::new(SimClock::new());
        let waiter = Arc::clone(&clock);
        let handle = thread::spawn(move || waiter.next_slot());
        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());
        clock.advance();
        assert_eq!(handle.join().unwrap(), 1);
    }

    #[test]
    fn stop_wakes_waiters_without_advancing() {
        let clock = Arc::new(SimClock::new());
        let waiter = Arc::clone(&clock);
        let handle = thread::spawn(move || waiter.next_slot());
        thread::sleep(Duration::from_millis(20));
        clock.stop();
        assert_eq!(handle.join().unwrap(), 0);
        assert!(clock.stopped());
    }

    #[test]
    fn current_time_reflects_advances() {
        let clock = SimClock::new();
        assert_eq!(clock.current_time(), 0);
        clock.advance();
        clock.advance();
        assert_eq!(clock.current_time(), 2);
    }
}
