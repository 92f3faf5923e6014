//! Hands emitted assembly text to the system toolchain. Assembling and
//! linking an x86-64 `.s` file is squarely a platform/ABI concern, so this
//! just shells out to `cc` rather than reimplementing an assembler.

use crate::error::{CodeGenError, Result};
use std::path::Path;
use std::process::Command;

pub struct Linker {
    /// The driver program invoked to assemble and link, e.g. `"cc"`.
    pub cc: String,
}

impl Default for Linker {
    fn default() -> Self {
        Self { cc: "cc".to_string() }
    }
}

impl Linker {
    pub fn new(cc: impl Into<String>) -> Self {
        Self { cc: cc.into() }
    }

    /// Assembles and links `asm_path` into an executable at `output`.
    pub fn link(&self, asm_path: &Path, output: &Path) -> Result<()> {
        let status = Command::new(&self.cc)
            .arg(asm_path)
            .arg("-o")
            .arg(output)
            .status()
            .map_err(|e| CodeGenError::LinkFailed(e.to_string()))?;

        if !status.success() {
            return Err(CodeGenError::LinkFailed(format!(
                "{} exited with {status}",
                self.cc
            )));
        }
        Ok(())
    }
}
