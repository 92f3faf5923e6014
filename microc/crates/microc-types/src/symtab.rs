//! The symbol table: a tree of lexical scopes plus the symbol records that
//! live in them. Grounded in the reference codebase's rib-based scope
//! resolution (each scope is a flat name-to-id map with a link to its
//! parent; lookup walks ancestors), adapted to also model record field lists
//! and function parameter lists as a symbol's ordered children rather than a
//! separate scope kind.

use microc_util::{define_idx, IndexVec, Symbol as Ident};
use rustc_hash::FxHashMap;

use crate::types::Type;

define_idx!(ScopeId);
define_idx!(SymbolId);

/// What kind of entity a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolClass {
    Type,
    Struct,
    Union,
    Enum,
    Variable,
    Parameter,
    Function,
}

impl SymbolClass {
    pub fn is_record(self) -> bool {
        matches!(self, SymbolClass::Struct | SymbolClass::Union)
    }
}

/// Where a variable's storage lives, set by the parser from declaration
/// keywords (`static`, `extern`) and defaulted to `Auto` otherwise. Consumed
/// by the emitter, not the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Storage {
    #[default]
    Auto,
    Static,
    External,
}

/// Layout slots the emitter fills in after the analyzer has run; `None`
/// until then.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub offset: Option<i64>,
    pub size: Option<usize>,
    pub label: Option<String>,
}

/// A single entry in the symbol table: a function, variable, parameter,
/// field, or named type.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub class: SymbolClass,
    pub name: Ident,
    pub ty: Type,
    /// The scope this symbol is visible from (for `Variable`/`Function`/named
    /// types) — not meaningful for `Parameter`/field symbols, which are found
    /// only through `sym_child` on their owning record or function.
    pub scope: ScopeId,
    pub storage: Storage,
    pub layout: Layout,
    /// Fields (for a record) or parameters (for a function), in declaration order.
    children: Vec<SymbolId>,
}

impl Symbol {
    fn new(class: SymbolClass, name: Ident, ty: Type, scope: ScopeId) -> Self {
        Symbol {
            class,
            name,
            ty,
            scope,
            storage: Storage::default(),
            layout: Layout::default(),
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[SymbolId] {
        &self.children
    }
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    bindings: FxHashMap<Ident, SymbolId>,
}

/// Owns every scope and every symbol created during one compilation.
/// `ScopeId` and `SymbolId` are stable indices into this table for the
/// lifetime of the session; nothing here is ever removed.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: IndexVec<ScopeId, Scope>,
    symbols: IndexVec<SymbolId, Symbol>,
    root: ScopeId,
}

impl SymbolTable {
    /// An empty table with just a root scope and no pre-registered names.
    pub fn new() -> Self {
        let mut scopes = IndexVec::new();
        let root = scopes.push(Scope::default());
        SymbolTable {
            scopes,
            symbols: IndexVec::new(),
            root,
        }
    }

    /// A table with `int`, `char`, `bool`, and `void` already registered as
    /// `Type`-class symbols in the root scope, plus the `Builtins` handle the
    /// analyzer uses to recognize them.
    pub fn with_builtins() -> (Self, Builtins) {
        let mut table = Self::new();
        let root = table.root();
        let int = table.create(SymbolClass::Type, root, Ident::intern("int"), Type::Void);
        let char_ = table.create(SymbolClass::Type, root, Ident::intern("char"), Type::Void);
        let boolean = table.create(SymbolClass::Type, root, Ident::intern("bool"), Type::Void);
        let void = table.create(SymbolClass::Type, root, Ident::intern("void"), Type::Void);

        // Each builtin's own `ty` field is `Basic(self)`, matching how a
        // user-declared type names itself.
        table.get_mut(int).ty = Type::Basic(int);
        table.get_mut(char_).ty = Type::Basic(char_);
        table.get_mut(boolean).ty = Type::Basic(boolean);

        let builtins = Builtins {
            int,
            char: char_,
            boolean,
            void,
        };
        (table, builtins)
    }

    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Creates a new child scope of `parent` and returns its id.
    pub fn create_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            parent: Some(parent),
            bindings: FxHashMap::default(),
        })
    }

    /// Registers a new symbol directly in `scope`'s own binding map (used for
    /// top-level and block-local declarations, not for record fields or
    /// function parameters — see `add_child` for those).
    pub fn create(&mut self, class: SymbolClass, scope: ScopeId, name: Ident, ty: Type) -> SymbolId {
        let id = self.symbols.push(Symbol::new(class, name, ty, scope));
        self.scopes[scope].bindings.insert(name, id);
        id
    }

    /// Attaches `child` (a field or parameter symbol) to `parent`'s ordered
    /// child list, in the order given. Does not affect scope bindings.
    pub fn add_child(&mut self, parent: SymbolId, child: SymbolId) {
        self.symbols[parent].children.push(child);
    }

    /// Looks up `name` starting in `scope` and walking up through parent
    /// scopes until found or the root's parent (`None`) is reached.
    pub fn find(&self, scope: ScopeId, name: Ident) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(&found) = self.scopes[id].bindings.get(&name) {
                return Some(found);
            }
            current = self.scopes[id].parent;
        }
        None
    }

    /// Looks up `name` only among `symbol`'s direct children (record fields
    /// or function parameters) — unlike `find`, this never walks lexical
    /// scopes.
    pub fn sym_child(&self, symbol: SymbolId, name: Ident) -> Option<SymbolId> {
        self.symbols[symbol]
            .children()
            .iter()
            .copied()
            .find(|&child| self.symbols[child].name == name)
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id]
    }

    pub fn symbol_name(&self, id: SymbolId) -> &'static str {
        self.symbols[id].name.as_str()
    }

    /// Whether `sym` names a `struct`/`union` — used by `Type::is_record`,
    /// which can't tell a scalar `Basic` from a record `Basic` without
    /// consulting the table.
    pub fn is_record_symbol(&self, sym: SymbolId) -> bool {
        self.symbols[sym].class.is_record()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Handles to the pre-registered builtin scalar types, so the analyzer and
/// type predicates can recognize `int`/`char`/`bool`/`void` without
/// re-interning or re-looking-up their names on every comparison.
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    pub int: SymbolId,
    pub char: SymbolId,
    pub boolean: SymbolId,
    pub void: SymbolId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_scope_returns_distinct_ids() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let a = table.create_scope(root);
        let b = table.create_scope(root);
        assert_ne!(a, b);
    }

    #[test]
    fn find_resolves_in_current_scope() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let name = Ident::intern("x");
        let id = table.create(SymbolClass::Variable, root, name, Type::Void);
        assert_eq!(table.find(root, name), Some(id));
    }

    #[test]
    fn find_walks_ancestor_scopes() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let name = Ident::intern("outer");
        let id = table.create(SymbolClass::Variable, root, name, Type::Void);
        let inner = table.create_scope(root);
        let inner2 = table.create_scope(inner);
        assert_eq!(table.find(inner2, name), Some(id));
    }

    #[test]
    fn find_does_not_see_sibling_scope() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let a = table.create_scope(root);
        let b = table.create_scope(root);
        let name = Ident::intern("local");
        table.create(SymbolClass::Variable, a, name, Type::Void);
        assert_eq!(table.find(b, name), None);
    }

    #[test]
    fn find_missing_name_returns_none() {
        let table = SymbolTable::new();
        let root = table.root();
        assert_eq!(table.find(root, Ident::intern("nope")), None);
    }

    #[test]
    fn sym_child_finds_record_field() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let point = table.create(SymbolClass::Struct, root, Ident::intern("Point"), Type::Void);
        let field_scope = table.create_scope(root);
        let x_field = table.create(
            SymbolClass::Variable,
            field_scope,
            Ident::intern("x"),
            Type::Void,
        );
        table.add_child(point, x_field);
        assert_eq!(table.sym_child(point, Ident::intern("x")), Some(x_field));
    }

    #[test]
    fn sym_child_does_not_walk_scopes() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let point = table.create(SymbolClass::Struct, root, Ident::intern("Point"), Type::Void);
        // "x" exists in root scope but was never added as a child of `point`.
        table.create(SymbolClass::Variable, root, Ident::intern("x"), Type::Void);
        assert_eq!(table.sym_child(point, Ident::intern("x")), None);
    }

    #[test]
    fn with_builtins_registers_four_scalars() {
        let (table, builtins) = SymbolTable::with_builtins();
        assert_eq!(table.get(builtins.int).class, SymbolClass::Type);
        assert_eq!(table.get(builtins.void).class, SymbolClass::Type);
        assert_eq!(table.symbol_name(builtins.int), "int");
    }

    #[test]
    fn is_record_symbol_distinguishes_struct_from_scalar() {
        let (mut table, builtins) = SymbolTable::with_builtins();
        let root = table.root();
        let point = table.create(SymbolClass::Struct, root, Ident::intern("Point"), Type::Void);
        assert!(table.is_record_symbol(point));
        assert!(!table.is_record_symbol(builtins.int));
    }
}
