//! Error types for the x86-64 text emitter.
//!
//! Emission itself cannot fail on a well-typed AST (every node the analyzer
//! accepted has a known size and layout by the time this crate sees it);
//! the fallible surface is entirely in [`crate::linker`], where invoking an
//! external assembler/linker is genuinely allowed to fail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodeGenError {
    /// The system assembler/linker exited with a non-zero status.
    #[error("assembling/linking failed: {0}")]
    LinkFailed(String),

    /// Couldn't write the assembly or the linked binary to disk.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CodeGenError>;
