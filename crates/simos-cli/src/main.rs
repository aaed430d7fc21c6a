mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::error;

/// simos: an educational paging + MLQ-scheduler OS simulator.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file, resolved under `input/` when not found as given.
    config: PathBuf,
}

fn resolve_config_path(given: &Path) -> PathBuf {
    if given.exists() {
        given.to_path_buf()
    } else {
        Path::new("input").join(given)
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let path = resolve_config_path(&cli.config);
    let cfg = match config::read_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };

    let runtime = simos_runtime::Runtime::new(
        cfg.ram_size,
        &cfg.swap_sizes,
        cfg.num_cpus,
        cfg.time_slot,
        cfg.processes,
    );

    match runtime.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("simulation error: {e}");
            eprintln!("simulation error: {e}");
            ExitCode::from(1)
        }
    }
}
