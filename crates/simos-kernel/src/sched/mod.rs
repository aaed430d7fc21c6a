//! MLQ scheduler (C7): the public, lock-holding wrapper around
//! [`mlq::SchedQueues`].
//!
//! `get_proc` is the only operation that takes both locks, always in
//! dispatch→queue order, so two CPU threads racing `get_proc` never
//! interleave the priority scan — §5's acquire-order rule.

pub mod mlq;

use std::sync::Mutex;

use mlq::SchedQueues;

use crate::error::SchedError;
use crate::types::Pid;

pub struct Mlq {
    dispatch: Mutex<()>,
    queue: Mutex<SchedQueues>,
}

impl Default for Mlq {
    fn default() -> Self {
        Self::new()
    }
}

impl Mlq {
    pub fn new() -> Self {
        Self {
            dispatch: Mutex::new(()),
            queue: Mutex::new(SchedQueues::new()),
        }
    }

    pub fn add_proc(&self, pid: Pid, priority: u32) -> Result<(), SchedError> {
        self.queue
            .lock()
            .expect("scheduler queue mutex poisoned")
            .add_proc(pid, priority)
    }

    pub fn get_proc(&self) -> Option<Pid> {
        let _dispatch = self.dispatch.lock().expect("dispatch mutex poisoned");
        self.queue
            .lock()
            .expect("scheduler queue mutex poisoned")
            .get_proc()
    }

    pub fn put_proc(&self, pid: Pid) -> Result<(), SchedError> {
        self.queue
            .lock()
            .expect("scheduler queue mutex poisoned")
            .put_proc(pid)
    }

    pub fn finish_proc(&self, pid: Pid) -> Result<(), SchedError> {
        self.queue
            .lock()
            .expect("scheduler queue mutex poisoned")
            .finish_proc(pid)
    }

    pub fn find_process_by_pid(&self, pid: Pid) -> Option<u32> {
        self.queue
            .lock()
            .expect("scheduler queue mutex poisoned")
            .find_process_by_pid(pid)
    }

    pub fn queue_empty(&self) -> bool {
        self.queue
            .lock()
            .expect("scheduler queue mutex poisoned")
            .queue_empty()
    }
}
