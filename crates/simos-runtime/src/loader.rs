//! The (out-of-scope) bytecode loader's minimal concrete stand-in.
//!
//! spec.md treats the real loader format as an external collaborator and
//! only specifies the shape it hands the CPU driver (`Program`, a `Vec` of
//! [`Instruction`]). This reads that shape from a plain-text file, one
//! instruction per line, since the core spec does not define an on-disk
//! bytecode format and a general loader is out of scope here. Blank lines
//! and `#`-comments are skipped so process fixtures can carry a header.

use std::fs;
use std::path::Path;

use simos_vm::{Instruction, MemOp, Program};

use crate::error::RuntimeError;

/// Reads `path` as a newline-delimited instruction stream.
pub fn load_program(path: &Path) -> Result<Program, RuntimeError> {
    let text = fs::read_to_string(path).map_err(|e| RuntimeError::Io(path.to_path_buf(), e))?;
    let mut instructions = Vec::new();

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        instructions.push(parse_line(path, lineno + 1, line)?);
    }

    Ok(Program::new(instructions))
}

fn parse_line(path: &Path, lineno: usize, line: &str) -> Result<Instruction, RuntimeError> {
    let bad = || RuntimeError::BadInstruction(path.to_path_buf(), lineno, line.to_string());

    let mut tokens = line.split_whitespace();
    let mnemonic = tokens.next().ok_or_else(bad)?;

    match mnemonic {
        "NOP" => Ok(Instruction::Nop),
        "HALT" => Ok(Instruction::Halt),
        "MEMMAP" => {
            let op = match tokens.next().ok_or_else(bad)? {
                "MAP" => MemOp::Map,
                "INC" => MemOp::Inc,
                "SWP" => MemOp::Swp,
                "IO_READ" => MemOp::IoRead,
                "IO_WRITE" => MemOp::IoWrite,
                _ => return Err(bad()),
            };
            let a2 = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(bad)?;
            let a3 = tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0);
            Ok(Instruction::MemMap { op, a2, a3 })
        }
        _ => Err(bad()),
    }
}
