//! CPU-thread driver and loader-thread glue (C8) for simos.
//!
//! spec.md treats the CPU driver and loader as external collaborators,
//! specifying only the shapes they consume (`Kernel`, `Program`). This
//! crate supplies the minimal concrete versions needed to drive C1-C7 end
//! to end: one OS thread per simulated CPU, one loader thread, and a
//! [`clock::SimClock`] standing in for the simulator's external timer.

pub mod clock;
pub mod driver;
pub mod error;
pub mod loader;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use simos_kernel::Kernel;

pub use driver::ProcessSpec;
pub use error::RuntimeError;

/// How long the ticker thread sleeps between simulated clock ticks.
const TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Owns the kernel and simulated clock for one run, and spawns/joins every
/// thread the run needs.
pub struct Runtime {
    kernel: Arc<Kernel>,
    clock: Arc<clock::SimClock>,
    num_cpus: usize,
    time_slot: u32,
    processes: Vec<ProcessSpec>,
}

impl Runtime {
    pub fn new(
        ram_size: u32,
        swap_sizes: &[u32],
        num_cpus: usize,
        time_slot: u32,
        processes: Vec<ProcessSpec>,
    ) -> Self {
        Self {
            kernel: Arc::new(Kernel::new(ram_size, swap_sizes)),
            clock: Arc::new(clock::SimClock::new()),
            num_cpus,
            time_slot,
            processes,
        }
    }

    /// Spawns the ticker, loader, and CPU threads; blocks until the loader
    /// has admitted every process and every CPU has observed an empty,
    /// exhausted queue.
    pub fn run(self) -> Result<(), RuntimeError> {
        let loader_done = Arc::new(AtomicBool::new(false));

        let ticker_clock = Arc::clone(&self.clock);
        let ticker_stop = Arc::new(AtomicBool::new(false));
        let ticker_stop_flag = Arc::clone(&ticker_stop);
        let ticker = thread::spawn(move || {
            while !ticker_stop_flag.load(Ordering::SeqCst) {
                thread::sleep(TICK_INTERVAL);
                ticker_clock.advance();
            }
        });

        let ld_handle = {
            let kernel = Arc::clone(&self.kernel);
            let clock = Arc::clone(&self.clock);
            let done = Arc::clone(&loader_done);
            let processes = self.processes;
            thread::spawn(move || driver::ld_routine(processes, kernel, clock, done))
        };

        let cpu_handles: Vec<_> = (0..self.num_cpus)
            .map(|id| {
                let kernel = Arc::clone(&self.kernel);
                let clock = Arc::clone(&self.clock);
                let done = Arc::clone(&loader_done);
                let time_slot = self.time_slot;
                thread::spawn(move || driver::cpu_routine(id, kernel, clock, time_slot, done))
            })
            .collect();

        for handle in cpu_handles {
            handle.join().expect("cpu thread panicked");
        }
        let ld_result = ld_handle.join().expect("loader thread panicked");

        ticker_stop.store(true, Ordering::SeqCst);
        self.clock.stop();
        ticker.join().expect("ticker thread panicked");

        ld_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn runs_two_single_instruction_processes_to_completion() {
        let p0 = fixture("HALT\n");
        let p1 = fixture("NOP\nHALT\n");

        let runtime = Runtime::new(
            4096,
            &[4096],
            2,
            4,
            vec![
                ProcessSpec {
                    start_time: 0,
                    path: p0.path().to_path_buf(),
                    priority: 0,
                },
                ProcessSpec {
                    start_time: 0,
                    path: p1.path().to_path_buf(),
                    priority: 1,
                },
            ],
        );

        runtime.run().unwrap();
    }

    #[test]
    fn surfaces_a_missing_process_file_as_an_error() {
        let runtime = Runtime::new(
            4096,
            &[4096],
            1,
            4,
            vec![ProcessSpec {
                start_time: 0,
                path: "/no/such/process/file".into(),
                priority: 0,
            }],
        );

        assert!(runtime.run().is_err());
    }
}
