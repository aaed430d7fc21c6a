//! Configuration-file reader (spec.md §6): an ambient concern the core
//! spec deliberately leaves out of scope, but the CLI still needs it to
//! drive a run end to end.
//!
//! Format: a `time_slot num_cpus num_processes` header line; a memory line
//! of `ram_size` followed by one or more swap-device sizes; then one
//! `start_time path [priority]` line per process. `priority` defaults to 0
//! when omitted — the original always supplies it, but spec.md marks it
//! optional.

use std::fs;
use std::path::{Path, PathBuf};

use simos_runtime::ProcessSpec;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot open configuration file {0:?}: {1}")]
    Open(PathBuf, std::io::Error),

    #[error("{0:?}: malformed header line {1:?}")]
    Header(PathBuf, String),

    #[error("{0:?}: malformed memory line {1:?}")]
    Memory(PathBuf, String),

    #[error("{0:?}: expected {1} process lines, found {2}")]
    ProcessCount(PathBuf, usize, usize),

    #[error("{0:?}: malformed process line {1:?}")]
    Process(PathBuf, String),
}

/// A fully parsed configuration file: scheduler/CPU topology, RAM and swap
/// device sizes, and every process descriptor to load.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub time_slot: u32,
    pub num_cpus: usize,
    pub ram_size: u32,
    pub swap_sizes: Vec<u32>,
    pub processes: Vec<ProcessSpec>,
}

/// Parses `path`. Process paths resolve under `input/proc/`, matching the
/// original reader's `strcat(path, "input/proc/")`.
pub fn read_config(path: &Path) -> Result<SimConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Open(path.to_path_buf(), e))?;
    let mut lines = text.lines();

    let header = lines.next().unwrap_or_default();
    let (time_slot, num_cpus, num_processes) = parse_header(header)
        .ok_or_else(|| ConfigError::Header(path.to_path_buf(), header.to_string()))?;

    let mem_line = lines.next().unwrap_or_default();
    let (ram_size, swap_sizes) = parse_memory(mem_line)
        .ok_or_else(|| ConfigError::Memory(path.to_path_buf(), mem_line.to_string()))?;

    let mut processes = Vec::with_capacity(num_processes);
    for line in lines.filter(|l| !l.trim().is_empty()) {
        processes.push(
            parse_process(line)
                .ok_or_else(|| ConfigError::Process(path.to_path_buf(), line.to_string()))?,
        );
    }

    if processes.len() != num_processes {
        return Err(ConfigError::ProcessCount(
            path.to_path_buf(),
            num_processes,
            processes.len(),
        ));
    }

    Ok(SimConfig {
        time_slot,
        num_cpus,
        ram_size,
        swap_sizes,
        processes,
    })
}

fn parse_header(line: &str) -> Option<(u32, usize, usize)> {
    let mut tokens = line.split_whitespace();
    let time_slot: u32 = tokens.next()?.parse().ok()?;
    let num_cpus: usize = tokens.next()?.parse().ok()?;
    let num_processes: usize = tokens.next()?.parse().ok()?;
    Some((time_slot, num_cpus, num_processes))
}

fn parse_memory(line: &str) -> Option<(u32, Vec<u32>)> {
    let mut tokens = line.split_whitespace();
    let ram_size: u32 = tokens.next()?.parse().ok()?;
    let swap_sizes: Vec<u32> = tokens.filter_map(|t| t.parse().ok()).collect();
    if swap_sizes.is_empty() {
        None
    } else {
        Some((ram_size, swap_sizes))
    }
}

fn parse_process(line: &str) -> Option<ProcessSpec> {
    let mut tokens = line.split_whitespace();
    let start_time: u64 = tokens.next()?.parse().ok()?;
    let proc_name = tokens.next()?;
    let priority: u32 = tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0);
    Some(ProcessSpec {
        start_time,
        path: Path::new("input/proc").join(proc_name),
        priority,
    })
}
