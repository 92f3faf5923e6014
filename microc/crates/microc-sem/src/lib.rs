//! microc-sem - Semantic Analyzer & Type Checker
//!
//! Walks the tree `microc-par` produced, typing every expression and
//! checking the statement-level rules (conditions, return types, declared
//! vs. initializer types). Results are recorded in two `ExprId`-keyed side
//! tables (`expr_types`, `expr_symbols`) rather than written back onto the
//! tree, so nothing here needs a mutable borrow of the AST.
//!
//! Split in two along the same line the reference implementation does:
//! `analyzer` dispatches over statements and items, `expr` owns every
//! operator's typing rule.

pub mod analyzer;
pub mod expr;

pub use analyzer::{analyze, AnalysisResult};
