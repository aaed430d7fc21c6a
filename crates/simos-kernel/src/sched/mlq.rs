//! MLQ queue bookkeeping: per-priority ready queues, the running list, and
//! the slot-budget cursor that decides which priority gets served next.
//!
//! Only scheduling membership is kept here (`Pid` + priority) — the process
//! control block itself, including its `Mm`, lives in the kernel's process
//! table so that the queue mutex and the process-memory mutex can be
//! distinct locks without `Pcb` needing to live in two places at once.

use std::collections::VecDeque;

use crate::error::SchedError;
use crate::types::{Pid, MAX_PRIO};

pub struct SchedQueues {
    ready: Vec<VecDeque<Pid>>,
    running: Vec<(Pid, u32)>,
    slot: Vec<u32>,
    current_slot: Vec<u32>,
    current_prio: usize,
}

impl Default for SchedQueues {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedQueues {
    pub fn new() -> Self {
        let n = MAX_PRIO as usize;
        Self {
            ready: (0..n).map(|_| VecDeque::new()).collect(),
            running: Vec::new(),
            slot: (0..n as u32).map(|p| MAX_PRIO - p).collect(),
            current_slot: vec![0; n],
            current_prio: 0,
        }
    }

    /// `add_proc`: validates the priority and enqueues at the tail of its
    /// ready queue.
    pub fn add_proc(&mut self, pid: Pid, priority: u32) -> Result<(), SchedError> {
        let level = self.level(priority)?;
        self.ready[level].push_back(pid);
        Ok(())
    }

    /// `get_proc`: cyclic scan from `current_prio` for a non-empty,
    /// under-budget level; on a full-cycle miss, resets every
    /// `current_slot` and `current_prio` and retries exactly once.
    pub fn get_proc(&mut self) -> Option<Pid> {
        self.scan_once().or_else(|| {
            self.current_slot.iter_mut().for_each(|s| *s = 0);
            self.current_prio = 0;
            self.scan_once()
        })
    }

    fn scan_once(&mut self) -> Option<Pid> {
        let n = self.ready.len();
        for step in 0..n {
            let level = (self.current_prio + step) % n;
            if !self.ready[level].is_empty() && self.current_slot[level] < self.slot[level] {
                let pid = self.ready[level].pop_front().expect("checked non-empty above");
                self.running.push((pid, level as u32));
                self.current_slot[level] += 1;
                if self.current_slot[level] >= self.slot[level] {
                    self.current_slot[level] = 0;
                    self.current_prio = (level + 1) % n;
                } else {
                    self.current_prio = level;
                }
                return Some(pid);
            }
        }
        None
    }

    /// `put_proc`: removes `pid` from the running list and re-enqueues it
    /// at the tail of its own priority's ready queue.
    pub fn put_proc(&mut self, pid: Pid) -> Result<(), SchedError> {
        let priority = self.take_from_running(pid)?;
        self.ready[priority as usize].push_back(pid);
        Ok(())
    }

    /// `finish_proc`: removes `pid` from the running list; the caller owns
    /// releasing its process-table entry.
    pub fn finish_proc(&mut self, pid: Pid) -> Result<(), SchedError> {
        self.take_from_running(pid)?;
        Ok(())
    }

    fn take_from_running(&mut self, pid: Pid) -> Result<u32, SchedError> {
        let pos = self
            .running
            .iter()
            .position(|&(p, _)| p == pid)
            .ok_or(SchedError::NotFound(pid.get()))?;
        Ok(self.running.remove(pos).1)
    }

    /// `find_process_by_pid`: searches the running list, then every ready
    /// queue; returns the priority level it was found at.
    pub fn find_process_by_pid(&self, pid: Pid) -> Option<u32> {
        if let Some(&(_, prio)) = self.running.iter().find(|&&(p, _)| p == pid) {
            return Some(prio);
        }
        self.ready
            .iter()
            .enumerate()
            .find(|(_, q)| q.iter().any(|&p| p == pid))
            .map(|(level, _)| level as u32)
    }

    /// True iff every ready queue is empty (there is no legacy single-queue
    /// fallback in this implementation — MLQ is the only policy built).
    pub fn queue_empty(&self) -> bool {
        self.ready.iter().all(VecDeque::is_empty)
    }

    fn level(&self, priority: u32) -> Result<usize, SchedError> {
        if priority < MAX_PRIO {
            Ok(priority as usize)
        } else {
            Err(SchedError::InvalidPriority(priority))
        }
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::collection::hash_set;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// §8 invariant 8: across a long schedule with every chosen priority
        /// kept perpetually runnable (re-added the instant it is dispatched,
        /// as one long-running process would be), each priority's share of
        /// dispatches converges to `slot[p] / sum(slot)`.
        #[test]
        fn mlq_dispatch_share_converges_to_slot_ratio(
            priorities in hash_set(130u32..140, 1..4),
        ) {
            let mut q = SchedQueues::new();
            let priorities: Vec<u32> = priorities.into_iter().collect();
            for (i, &p) in priorities.iter().enumerate() {
                q.add_proc(pid((i + 1) as u32), p).unwrap();
            }

            let total_slot: u32 = priorities.iter().map(|&p| MAX_PRIO - p).sum();
            let rounds = 10u32;
            let iterations = total_slot * rounds;

            let mut dispatches = vec![0u32; MAX_PRIO as usize];
            for _ in 0..iterations {
                let pid = q.get_proc().expect("every chosen priority stays runnable");
                let level = q.find_process_by_pid(pid).expect("just dispatched, must be in running");
                dispatches[level as usize] += 1;
                q.put_proc(pid).unwrap();
            }

            for &p in &priorities {
                let expected_share = (MAX_PRIO - p) as f64 / total_slot as f64;
                let actual_share = dispatches[p as usize] as f64 / iterations as f64;
                prop_assert!(
                    (actual_share - expected_share).abs() < 0.02,
                    "priority {p}: expected share {expected_share:.4}, got {actual_share:.4}"
                );
            }
        }
    }

    fn pid(n: u32) -> Pid {
        Pid::new(n).unwrap()
    }
}
