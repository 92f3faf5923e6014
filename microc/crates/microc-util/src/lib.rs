//! microc-util - Core Utilities and Foundation Types
//!
//! ============================================================================
//! MODULE OVERVIEW
//! ============================================================================
//!
//! This module provides fundamental utilities and types that form the foundation
//! of the entire microc compiler infrastructure. These utilities are designed to be
//! zero-cost abstractions that improve code clarity, type safety, and performance
//! without runtime overhead.
//!
//! DESIGN PRINCIPLES:
//! ------------------
//! 1. ZERO-COST ABSTRACTIONS
//!    All utilities compile down to efficient code with no runtime penalty
//!    compared to hand-written implementations.
//!
//! 2. TYPE SAFETY
//!    Leverage Rust's type system to prevent bugs at compile time.
//!    Examples: Typed indices prevent mixing different ID spaces.
//!
//! 3. PERFORMANCE
//!    Optimize for the common case while maintaining correctness.
//!    Examples: Efficient string interning, lock-free data structures.
//!
//! 4. ERGONOMICS
//!    APIs should be intuitive and easy to use correctly.
//!    Examples: Builder patterns, type inference-friendly interfaces.
//!
//! ============================================================================
//! STRING INTERNING (SYMBOL)
//! ============================================================================
//!
//! String interning is a technique for storing only one copy of each distinct
//! string value, which must be immutable. All occurrences of the same string
//! point to the same memory location, enabling fast equality comparisons and
//! reducing memory usage. See [`symbol`] for the interner itself.
//!
//! ============================================================================
//! MODULES
//! ============================================================================
//!
//! - [`span`]: source locations (`Span`, `FileId`, `SourceMap`, `SourceFile`)
//! - [`symbol`]: string interning (`Symbol` and its predefined keyword/type constants)
//! - [`diagnostic`]: error/warning reporting (`Handler`, `DiagnosticBuilder`, `Diagnostic`)
//! - [`index_vec`]: typed-index vectors (`IndexVec`, `Idx`, `define_idx!`)
//! - [`error`]: internal error types for the above subsystems

pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

mod def_id;

pub use def_id::{DefId, DefIdGenerator};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, Span};
pub use symbol::Symbol;

// Re-export commonly used types
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
