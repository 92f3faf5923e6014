//! Statement- and item-level dispatch, plus the diagnostic-formatting
//! helpers every operator rule in [`crate::expr`] calls through.

use microc_par::ast::{Ast, Branch, Decl, ExprId, Item, Iter, Loop, Return, Stmt};
use microc_types::{Builtins, SymbolId, SymbolTable, Type};
use microc_util::diagnostic::{DiagnosticBuilder, E_SEMANTIC_TYPE_MISMATCH};
use microc_util::{FxHashMap, Handler, Span};

/// Result of analyzing one file: diagnostic counts plus the type/symbol
/// annotations every expression picked up along the way.
pub struct AnalysisResult {
    pub errors: usize,
    pub warnings: usize,
    pub expr_types: FxHashMap<ExprId, Type>,
    pub expr_symbols: FxHashMap<ExprId, SymbolId>,
}

/// Drives one pass over an already-parsed, already-resolved [`Ast`]. The
/// symbol table is read-only from here on: the parser seeded it and
/// resolved every plain identifier, so the analyzer only ever looks things
/// up, never declares.
pub struct Analyzer<'a> {
    pub(crate) table: &'a SymbolTable,
    pub(crate) builtins: &'a Builtins,
    pub(crate) handler: &'a Handler,
    pub(crate) current_ret_type: Type,
    pub(crate) expr_types: FxHashMap<ExprId, Type>,
    pub(crate) expr_symbols: FxHashMap<ExprId, SymbolId>,
}

/// Runs the analyzer over every top-level item.
pub fn analyze(
    items: &[Item],
    ast: &Ast,
    table: &mut SymbolTable,
    builtins: &Builtins,
    handler: &Handler,
) -> AnalysisResult {
    let mut analyzer = Analyzer {
        table: &*table,
        builtins,
        handler,
        current_ret_type: Type::Void,
        expr_types: FxHashMap::default(),
        expr_symbols: FxHashMap::default(),
    };

    for item in items {
        analyzer.analyze_item(item, ast);
    }

    AnalysisResult {
        errors: handler.error_count(),
        warnings: handler.warning_count(),
        expr_types: analyzer.expr_types,
        expr_symbols: analyzer.expr_symbols,
    }
}

impl<'a> Analyzer<'a> {
    fn analyze_item(&mut self, item: &Item, ast: &Ast) {
        match item {
            Item::FnImpl(f) => {
                self.current_ret_type = f.ret_type.clone();
                for stmt in &f.body {
                    self.analyze_stmt(stmt, ast);
                }
                self.current_ret_type = Type::Void;
            }
            Item::DeclStruct(_) => {}
            Item::Decl(d) => self.analyze_top_level_decl(d, ast),
        }
    }

    fn analyze_top_level_decl(&mut self, decl: &Decl, ast: &Ast) {
        if let Some(init) = decl.init {
            let found = self.analyze_expr(init, ast);
            if !Type::is_compatible(&decl.ty, &found) {
                self.error_mismatch("=", &decl.ty, &found, decl.span);
            }
        }
    }

    pub(crate) fn analyze_stmt(&mut self, stmt: &Stmt, ast: &Ast) {
        match stmt {
            Stmt::Decl(d) => self.analyze_top_level_decl(d, ast),
            Stmt::DeclStruct(_) => {}
            Stmt::Branch(b) => self.analyze_branch(b, ast),
            Stmt::Loop(l) => self.analyze_loop(l, ast),
            Stmt::Iter(i) => self.analyze_iter(i, ast),
            Stmt::Return(r) => self.analyze_return(r, ast),
            Stmt::Break(_) => {}
            // TODO: flag expression statements whose value is computed and discarded
            // (every arithmetic/comparison expr used only for its side effect).
            Stmt::Expr(e) => {
                self.analyze_expr(*e, ast);
            }
            Stmt::Block(stmts) => {
                for s in stmts {
                    self.analyze_stmt(s, ast);
                }
            }
            Stmt::Empty => {}
        }
    }

    fn analyze_branch(&mut self, branch: &Branch, ast: &Ast) {
        let cond_ty = self.analyze_expr(branch.cond, ast);
        if !cond_ty.is_condition(self.builtins) {
            let span = ast.exprs.span(branch.cond);
            self.error_expected("if", &Type::basic(self.builtins.boolean), &cond_ty, span);
        }
        self.analyze_stmt(&branch.then_branch, ast);
        if let Some(else_branch) = &branch.else_branch {
            self.analyze_stmt(else_branch, ast);
        }
    }

    fn analyze_loop(&mut self, loop_: &Loop, ast: &Ast) {
        let cond_ty = self.analyze_expr(loop_.cond, ast);
        if !cond_ty.is_condition(self.builtins) {
            let span = ast.exprs.span(loop_.cond);
            self.error_expected("while loop", &Type::basic(self.builtins.boolean), &cond_ty, span);
        }
        self.analyze_stmt(&loop_.body, ast);
    }

    fn analyze_iter(&mut self, iter: &Iter, ast: &Ast) {
        if let Some(init) = &iter.init {
            self.analyze_stmt(init, ast);
        }
        if let Some(cond) = iter.cond {
            let cond_ty = self.analyze_expr(cond, ast);
            if !cond_ty.is_condition(self.builtins) {
                let span = ast.exprs.span(cond);
                self.error_expected("for loop", &Type::basic(self.builtins.boolean), &cond_ty, span);
            }
        }
        if let Some(step) = iter.step {
            self.analyze_expr(step, ast);
        }
        self.analyze_stmt(&iter.body, ast);
    }

    fn analyze_return(&mut self, ret: &Return, ast: &Ast) {
        // A bare `return;` types as Invalid, which `is_compatible` always
        // accepts — matching a return with no value never actually fires
        // this check, no matter the function's declared return type.
        let found = match ret.value {
            Some(v) => self.analyze_expr(v, ast),
            None => Type::Invalid,
        };
        if !Type::is_compatible(&found, &self.current_ret_type) {
            self.error_expected("return", &self.current_ret_type.clone(), &found, ret.span);
        }
    }

    // ---- diagnostics, mirroring the reference analyzerError* family -------

    pub(crate) fn type_name(&self, ty: &Type) -> String {
        ty.type_to_string(self.table, "")
    }

    pub(crate) fn error_expected(&self, where_: &str, expected: &Type, found: &Type, span: Span) {
        DiagnosticBuilder::error(format!(
            "{} expected {}, found {}",
            where_,
            self.type_name(expected),
            self.type_name(found)
        ))
        .code(E_SEMANTIC_TYPE_MISMATCH)
        .span(span)
        .emit(self.handler);
    }

    pub(crate) fn error_op(&self, op: &str, desc: &str, found: &Type, span: Span) {
        DiagnosticBuilder::error(format!("{} requires {}, found {}", op, desc, self.type_name(found)))
            .code(E_SEMANTIC_TYPE_MISMATCH)
            .span(span)
            .emit(self.handler);
    }

    pub(crate) fn error_mismatch(&self, op: &str, l: &Type, r: &Type, span: Span) {
        DiagnosticBuilder::error(format!(
            "type mismatch between {} and {} for {}",
            self.type_name(l),
            self.type_name(r),
            op
        ))
        .code(E_SEMANTIC_TYPE_MISMATCH)
        .span(span)
        .emit(self.handler);
    }

    pub(crate) fn error_degree(&self, thing: &str, expected: usize, found: usize, name: &str, span: Span) {
        DiagnosticBuilder::error(format!(
            "{} {} expected, {} given to {}",
            expected, thing, found, name
        ))
        .code(E_SEMANTIC_TYPE_MISMATCH)
        .span(span)
        .emit(self.handler);
    }

    pub(crate) fn error_param_mismatch(&self, n: usize, name: &str, expected: &Type, found: &Type, span: Span) {
        DiagnosticBuilder::error(format!(
            "type mismatch at parameter {} of {}: expected {}, found {}",
            n,
            name,
            self.type_name(expected),
            self.type_name(found)
        ))
        .code(E_SEMANTIC_TYPE_MISMATCH)
        .span(span)
        .emit(self.handler);
    }

    pub(crate) fn error_member(&self, op: &str, record: &Type, name: &str, span: Span) {
        DiagnosticBuilder::error(format!(
            "{} expected field of {}, found {}",
            op,
            self.type_name(record),
            name
        ))
        .code(E_SEMANTIC_TYPE_MISMATCH)
        .span(span)
        .emit(self.handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use microc_par::Parser;
    use microc_util::FileId;

    fn run(src: &str) -> (AnalysisResult, microc_par::ast::Ast, Handler) {
        let handler = Handler::new();
        let tokens = microc_lex::Lexer::new(src, FileId(0)).tokenize(&handler);
        let (mut table, builtins) = SymbolTable::with_builtins();
        let ast = {
            let parser = Parser::new(tokens, &mut table, &builtins, &handler);
            parser.parse()
        };
        let result = analyze(&ast.items, &ast, &mut table, &builtins, &handler);
        (result, ast, handler)
    }

    #[test]
    fn accepts_well_typed_function() {
        let (result, _, handler) = run("int add(int a, int b) { return a + b; }");
        assert!(!handler.has_errors());
        assert_eq!(result.errors, 0);
    }

    #[test]
    fn rejects_mismatched_return_type() {
        let (result, _, _) = run("bool flag() { return 1 + 1; }");
        assert!(result.errors >= 1);
    }

    #[test]
    fn bare_return_is_always_compatible() {
        let (result, _, _) = run("int f() { return; }");
        assert_eq!(result.errors, 0);
    }

    #[test]
    fn every_expression_gets_a_recorded_type() {
        let (result, ast, _) = run("int f() { return 1 + 2 * 3; }");
        for item in &ast.items {
            if let microc_par::ast::Item::FnImpl(f) = item {
                for stmt in &f.body {
                    if let Stmt::Return(r) = stmt {
                        if let Some(v) = r.value {
                            assert!(result.expr_types.contains_key(&v));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn reports_undefined_field_access_once() {
        let (result, _, handler) = run(
            "struct Point { int x; int y; } int f() { struct Point p; return p.z; }",
        );
        assert!(result.errors >= 1);
        let _ = handler;
    }

    #[test]
    fn unused_local_variable_is_not_warned_about() {
        // No warning helpers are defined at this layer: an unused local is
        // typed like any other declaration and never raises a diagnostic.
        let (result, _, _) = run("int f() { int unused; return 0; }");
        assert_eq!(result.warnings, 0);
        assert_eq!(result.errors, 0);
    }

    #[test]
    fn calling_a_non_function_does_not_also_type_its_arguments() {
        // Mirrors analyzerCall's non-callable branch, which returns
        // Invalid immediately without visiting the argument list: a badly
        // typed argument to a non-callable callee raises exactly one
        // diagnostic, not a second one from typing the argument.
        let (result, _, _) = run("int x; int f() { return x(1 + true); }");
        assert_eq!(result.errors, 1);
    }

    #[test]
    fn call_arity_mismatch_is_reported() {
        let (result, _, _) = run(
            "int add(int a, int b) { return a + b; } int f() { return add(1); }",
        );
        assert!(result.errors >= 1);
    }

    #[test]
    fn ternary_unifies_matching_branch_types() {
        let (result, _, _) = run("int f() { return true ? 1 : 2; }");
        assert_eq!(result.errors, 0);
    }

    #[test]
    fn comma_rejects_void_but_accepts_invalid_right_operand() {
        // `undefined` never resolves, so its type is Invalid; the comma's
        // right operand being Invalid must not itself raise a second error.
        let (result, _, _) = run("int f() { return (1, undefined); }");
        // exactly one diagnostic: the undefined-symbol lookup, not a second
        // one from the comma operator rejecting its right operand.
        assert_eq!(result.errors, 1);
    }

    #[test]
    fn pointer_deref_and_address_of_round_trip() {
        let (result, _, _) = run("int f() { int x = 0; int *p = &x; return *p; }");
        assert_eq!(result.errors, 0);
    }

    #[test]
    fn invalid_is_compatible_with_anything_both_ways() {
        let (_, builtins) = SymbolTable::with_builtins();
        assert!(Type::is_compatible(&builtins.int, &Type::Invalid));
        assert!(Type::is_compatible(&Type::Invalid, &builtins.int));
        assert!(Type::is_compatible(&builtins.boolean, &Type::Invalid));
        assert!(Type::is_compatible(&Type::Invalid, &builtins.boolean));
    }

    #[test]
    fn derive_from_derive_ptr_has_pointer_kind() {
        let (_, builtins) = SymbolTable::with_builtins();
        let ptr = builtins.int.derive_ptr();
        let derived = Type::derive_from(&ptr);
        assert!(matches!(derived, Type::Pointer(_)));
    }

    #[test]
    fn call_through_a_plain_function_symbol_checks_arity_and_params() {
        // The grammar has no function-pointer declarator, so the
        // pointer-to-function half of this invariant is covered at the type
        // level by `is_callable_true_for_function_and_function_pointer` in
        // `microc_types`, and by `analyze_call`'s explicit
        // `Type::Pointer(inner)` unwrap for whichever callee type it sees.
        let (result, _, _) = run(
            "int add(int a, int b) { return a + b; } int f() { return add(1, 2); }",
        );
        assert_eq!(result.errors, 0);
    }

    #[test]
    fn dot_and_arrow_agree_on_field_type() {
        let (result, _, _) = run(
            "struct Point { int x; int y; } \
             int f() { struct Point p; struct Point *q = &p; return p.x + q->x; }",
        );
        assert_eq!(result.errors, 0);
    }

    #[test]
    fn scenario_1_numeric_operator_rejects_bool_operand() {
        let (result, ast, handler) = run("int f() { int x = 1 + true; return x; }");
        assert_eq!(result.errors, 1);
        let diags = handler.diagnostics();
        assert!(diags.iter().any(|d| d.message.contains('+') && d.message.contains("numeric")));
        for item in &ast.items {
            if let microc_par::ast::Item::FnImpl(f) = item {
                if let Stmt::Decl(d) = &f.body[0] {
                    let init = d.init.expect("declaration has an initializer");
                    assert_eq!(result.expr_types.get(&init), Some(&Type::Invalid));
                }
            }
        }
    }

    #[test]
    fn scenario_2_call_arity_mismatch_still_computes_return_type() {
        let (result, ast, _) = run(
            "int f(int a) { return a; } int g() { return f(); }",
        );
        assert_eq!(result.errors, 1);
        for item in &ast.items {
            if let microc_par::ast::Item::FnImpl(func) = item {
                if func.name.as_str() == "g" {
                    if let Stmt::Return(r) = &func.body[0] {
                        let v = r.value.unwrap();
                        // the call's type is still the callee's declared
                        // return type, computed regardless of the arity error
                        assert_ne!(result.expr_types.get(&v), Some(&Type::Invalid));
                    }
                }
            }
        }
    }

    #[test]
    fn scenario_3_arrow_on_non_pointer_record_is_rejected() {
        let (result, _, handler) = run(
            "struct S { int a; } int f() { struct S s; return s->a; }",
        );
        assert_eq!(result.errors, 1);
        assert!(handler.diagnostics().iter().any(|d| d.message.contains("->") && d.message.contains("pointer")));
    }

    #[test]
    fn scenario_4_ternary_with_matching_int_branches_and_comparison_condition() {
        let (result, _, _) = run(
            "int f() { int a; bool b; return a == b ? 1 : 2; }",
        );
        assert_eq!(result.errors, 0);
    }

    #[test]
    fn scenario_5_index_with_bool_subscript_still_shapes_as_element_type() {
        let (result, ast, handler) = run("int f() { int *p; return p[true]; }");
        assert_eq!(result.errors, 1);
        assert!(handler.diagnostics().iter().any(|d| d.message.contains('[') && d.message.contains("numeric")));
        for item in &ast.items {
            if let microc_par::ast::Item::FnImpl(func) = item {
                for stmt in &func.body {
                    if let Stmt::Return(r) = stmt {
                        let v = r.value.unwrap();
                        // indexing still succeeds shape-wise: the result is
                        // the pointer's base type, not Invalid, even though
                        // the subscript itself was rejected.
                        assert_ne!(result.expr_types.get(&v), Some(&Type::Invalid));
                    }
                }
            }
        }
    }

    #[test]
    fn scenario_6_comma_result_type_and_void_assignment_mismatch() {
        let ok = run("void g() {} int f() { return (g(), 1); }");
        assert_eq!(ok.0.errors, 0);

        let mismatch = run("void g() {} int f() { int x = g(); return x; }");
        assert_eq!(mismatch.0.errors, 1);
        assert!(mismatch.2.diagnostics().iter().any(|d| {
            d.message.contains("type mismatch between") && d.message.contains("for =")
        }));
    }

    #[test]
    fn prefix_increment_and_decrement_on_a_numeric_lvalue() {
        let (result, _, _) = run("int f() { int x = 0; return ++x + --x; }");
        assert_eq!(result.errors, 0);
    }

    #[test]
    fn increment_of_a_non_numeric_operand_is_rejected() {
        let (result, _, handler) = run("int f() { bool b; return ++b; }");
        assert_eq!(result.errors, 1);
        assert!(handler.diagnostics().iter().any(|d| d.message.contains("++") && d.message.contains("numeric")));
    }

    #[test]
    fn lvalue_hook_never_rejects_a_non_lvalue_operand() {
        // The lvalue policy is a stub permanently wired to `true`, matching
        // the reference analyzer's own hardwired-true gate: taking the
        // address of or incrementing a plain int literal never raises an
        // "lvalue" diagnostic here, only ever a numeric-type one would.
        let (result, _, handler) = run("int f() { int *p = &1; ++1; return 0; }");
        assert!(handler.diagnostics().iter().all(|d| !d.message.contains("lvalue")));
        let _ = result;
    }

    #[test]
    fn member_not_found_types_as_invalid() {
        let (result, ast, _) = run(
            "struct Point { int x; } int f() { struct Point p; return p.z; }",
        );
        assert_eq!(result.errors, 1);
        let mut checked = false;
        for item in &ast.items {
            if let microc_par::ast::Item::FnImpl(func) = item {
                for stmt in &func.body {
                    if let Stmt::Return(r) = stmt {
                        if let Some(v) = r.value {
                            assert_eq!(result.expr_types.get(&v), Some(&Type::Invalid));
                            checked = true;
                        }
                    }
                }
            }
        }
        assert!(checked, "expected a return statement to be visited");
    }
}
