//! The code generator: lowers an analyzed AST straight to x86-64 assembly
//! text, then hands the result to an external assembler/linker.
//!
//! No intermediate representation sits between the AST and the emitted
//! instructions — struct/union layout ([`layout`]) and instruction selection
//! ([`emit`]) are the only two stages here, matching the pipeline's
//! lexer -> parser -> analyzer -> emitter shape.

pub mod emit;
pub mod error;
pub mod layout;
pub mod linker;

pub use emit::emit;
pub use error::{CodeGenError, Result};
pub use linker::Linker;
