//! The type system: a tagged `Type` enum, category predicates used by the
//! expression analyzer to decide which operators apply, and the derivation
//! helpers that compute one type from another (e.g. dereferencing a pointer).
//!
//! `Invalid` is a propagating poison value: once a sub-expression fails to
//! type-check, its recorded type becomes `Invalid` and every predicate that
//! asks "can these two types be used together" answers `true` for it, so a
//! single error does not cascade into a wall of follow-on diagnostics. The
//! one place that cares about the distinction is the comma operator, which
//! rejects `void` but must still accept `Invalid` — see `is_void`/`is_invalid`.

use crate::symtab::{Builtins, SymbolId, SymbolTable};

/// A type in the source language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Poison value produced by a failed type-check. Compatible with everything.
    Invalid,
    /// The empty type, e.g. a function with no return value.
    Void,
    /// A named scalar or record type (`int`, `char`, `bool`, or a `struct`/`union`/`enum`).
    Basic(SymbolId),
    /// `T*`
    Pointer(Box<Type>),
    /// `T[n]`
    Array(Box<Type>, usize),
    /// `(params) -> return`
    Function(Box<Type>, Vec<Type>),
}

impl Type {
    pub fn invalid() -> Type {
        Type::Invalid
    }

    pub fn void() -> Type {
        Type::Void
    }

    pub fn basic(name: SymbolId) -> Type {
        Type::Basic(name)
    }

    pub fn ptr(base: Type) -> Type {
        Type::Pointer(Box::new(base))
    }

    pub fn array(elem: Type, len: usize) -> Type {
        Type::Array(Box::new(elem), len)
    }

    pub fn function(ret: Type, params: Vec<Type>) -> Type {
        Type::Function(Box::new(ret), params)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Invalid)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_basic(&self) -> bool {
        matches!(self, Type::Basic(_))
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_, _))
    }

    pub fn is_callable(&self) -> bool {
        match self {
            Type::Function(_, _) => true,
            Type::Pointer(base) => matches!(**base, Type::Function(_, _)),
            _ => false,
        }
    }

    /// A record is a `Basic` type whose symbol was declared as `struct`/`union`/`enum`,
    /// which this needs the symbol table to tell apart from a scalar `Basic` like `int`.
    pub fn is_record(&self, table: &SymbolTable) -> bool {
        match self {
            Type::Basic(sym) => table.is_record_symbol(*sym),
            _ => false,
        }
    }

    /// Numeric types admit arithmetic (`+ - * / %`). `int` and `char` qualify; `bool`
    /// and records do not. `Invalid` passes so one bad operand doesn't cascade
    /// into a second diagnostic on the same expression.
    pub fn is_numeric(&self, builtins: &Builtins) -> bool {
        self.is_invalid() || matches!(self, Type::Basic(sym) if *sym == builtins.int || *sym == builtins.char)
    }

    /// Ordinal types admit relational comparison (`< <= > >=`): numeric types and pointers.
    pub fn is_ordinal(&self, builtins: &Builtins) -> bool {
        self.is_numeric(builtins) || self.is_ptr()
    }

    /// Equality types admit `== !=`: ordinal types plus `bool`.
    pub fn is_equality(&self, builtins: &Builtins) -> bool {
        self.is_ordinal(builtins) || matches!(self, Type::Basic(sym) if *sym == builtins.boolean)
    }

    /// Condition types are legal as the controlling expression of `if`/`while`/`for`:
    /// anything with a truthiness reading except `void`.
    pub fn is_condition(&self, _builtins: &Builtins) -> bool {
        self.is_invalid() || !self.is_void()
    }

    /// Assignable types: scalars, pointers, and records (struct copy), never `void`
    /// or a bare function.
    pub fn is_assignment(&self, _builtins: &Builtins) -> bool {
        !self.is_void() && !matches!(self, Type::Function(_, _))
    }

    pub fn is_compatible(a: &Type, b: &Type) -> bool {
        if a.is_invalid() || b.is_invalid() {
            return true;
        }
        a == b
    }

    /// The pointee of a pointer type, or `Invalid` if `self` isn't a pointer.
    pub fn derive_base(&self) -> Type {
        match self {
            Type::Pointer(base) => (**base).clone(),
            Type::Invalid => Type::Invalid,
            _ => Type::Invalid,
        }
    }

    /// `T -> T*`
    pub fn derive_ptr(&self) -> Type {
        Type::ptr(self.clone())
    }

    /// The return type of a function or function-pointer type.
    pub fn derive_return(&self) -> Type {
        match self {
            Type::Function(ret, _) => (**ret).clone(),
            Type::Pointer(base) => base.derive_return(),
            Type::Invalid => Type::Invalid,
            _ => Type::Invalid,
        }
    }

    /// The element type of an array, or one level of pointer decay.
    pub fn derive_array(&self) -> Type {
        match self {
            Type::Array(elem, _) => (**elem).clone(),
            Type::Pointer(base) => (**base).clone(),
            Type::Invalid => Type::Invalid,
            _ => Type::Invalid,
        }
    }

    /// Picks a result type for a binary operator from its two (already checked)
    /// operand types: `Invalid` propagates, otherwise the left operand's type wins
    /// (matching the source's left-to-right typing order).
    pub fn derive_from_two(a: &Type, b: &Type) -> Type {
        if a.is_invalid() {
            b.clone()
        } else {
            a.clone()
        }
    }

    /// Derive a result type from a single operand, propagating `Invalid`.
    pub fn derive_from(a: &Type) -> Type {
        a.clone()
    }

    /// Unify two types that are expected to agree (e.g. both arms of a ternary);
    /// `Invalid` defers to the other side, otherwise the left side wins.
    pub fn derive_unified(a: &Type, b: &Type) -> Type {
        Self::derive_from_two(a, b)
    }

    /// Render a type for diagnostics, e.g. `int *(char, char)`. `suffix` is spliced
    /// into the declarator position a C-style reading would put the name, so callers
    /// building `int x[3]`-shaped messages can pass `"x"` and get `int x[3]` back
    /// rather than `int[3] x`.
    pub fn type_to_string(&self, table: &SymbolTable, suffix: &str) -> String {
        match self {
            Type::Invalid => "<invalid>".to_string(),
            Type::Void => format!("void{}", space_suffix(suffix)),
            Type::Basic(sym) => format!("{}{}", table.symbol_name(*sym), space_suffix(suffix)),
            Type::Pointer(base) => {
                // A pointer to a function or array needs parens around the `*` so the
                // declarator doesn't re-associate, e.g. `int (*)(char, char)` rather
                // than the ambiguous `int *(char, char)` (function returning `int *`).
                let inner = match base.as_ref() {
                    Type::Function(_, _) | Type::Array(_, _) => format!("(*{})", suffix),
                    _ => format!("*{}", suffix),
                };
                base.type_to_string(table, &inner)
            }
            Type::Array(elem, len) => {
                let inner = format!("{}[{}]", suffix, len);
                elem.type_to_string(table, &inner)
            }
            Type::Function(ret, params) => {
                let param_list = params
                    .iter()
                    .map(|p| p.type_to_string(table, ""))
                    .collect::<Vec<_>>()
                    .join(", ");
                let inner = format!("{}({})", suffix, param_list);
                ret.type_to_string(table, &inner)
            }
        }
    }
}

fn space_suffix(suffix: &str) -> String {
    if suffix.is_empty() {
        String::new()
    } else {
        format!(" {}", suffix)
    }
}
