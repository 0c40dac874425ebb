//! System toolchain glue.
//!
//! The core's product is assembly text; turning it into an executable
//! is delegated to the host C compiler driver, which runs the
//! assembler and linker and pulls in libc (our runtime shim and
//! `printf` both need it).

use std::path::Path;
use std::process::Command;

use crate::error::{EmitError, Result};

/// Assemble and link one `.s` file into an executable
pub fn assemble_and_link(asm_path: &Path, output: &Path) -> Result<()> {
    let result = Command::new("cc")
        .arg(asm_path)
        .arg("-o")
        .arg(output)
        .arg("-lm")
        .output();

    let output = match result {
        Ok(output) => output,
        Err(error) => {
            return Err(EmitError::Toolchain {
                tool: "cc".to_string(),
                message: error.to_string(),
            })
        }
    };

    if !output.status.success() {
        return Err(EmitError::Toolchain {
            tool: "cc".to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// True when a C compiler driver is available on PATH
///
/// The driver uses this to produce a clear diagnostic instead of a
/// spawn failure; tests use it to skip execution on minimal images.
pub fn have_cc() -> bool {
    Command::new("cc")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
