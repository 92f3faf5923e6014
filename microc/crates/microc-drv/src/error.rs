//! Error handling for the driver layer.
//!
//! Compiler diagnostics (type errors, undefined symbols, ...) flow through
//! `microc_util::Handler` and never become a `DrvError` — these are the
//! driver's own failures: a source file that can't be read, a config file
//! that doesn't parse, a link that fails.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrvError {
    #[error("failed to read {0}: {1}")]
    ReadSource(std::path::PathBuf, std::io::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error(transparent)]
    CodeGen(#[from] microc_gen::CodeGenError),

    #[error("compilation failed with {0} error(s)")]
    CompilationFailed(usize),
}

pub type Result<T> = std::result::Result<T, DrvError>;
