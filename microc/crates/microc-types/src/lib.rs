//! microc-types - Type System and Symbol Table
//!
//! Shared below both the parser and the analyzer: the parser seeds the
//! symbol table and resolves plain identifiers as it goes (so `node.symbol`
//! is populated by the time the analyzer sees the tree), and the analyzer
//! consults the same table plus the `Type` machinery here while walking
//! expressions.

pub mod symtab;
pub mod types;

pub use symtab::{Builtins, Layout, Storage, Symbol, SymbolClass, SymbolId, SymbolTable, ScopeId};
pub use types::Type;
