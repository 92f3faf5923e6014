//! Diagnostic module - Error and warning reporting infrastructure.
//!
//! This module provides types for creating, formatting, and reporting
//! compiler diagnostics (errors, warnings, notes, and help messages).
//!
//! # Examples
//!
//! ## Using the simple API (deprecated but still supported)
//!
//! ```
//! use microc_util::diagnostic::{Handler, Span};
//!
//! let handler = Handler::new();
//! handler.error("unexpected token", Span::DUMMY);
//!
//! if handler.has_errors() {
//!     eprintln!("Compilation failed");
//! }
//! ```
//!
//! ## Using the fluent builder API (recommended)
//!
//! ```
//! use microc_util::diagnostic::{DiagnosticBuilder, Span, DiagnosticCode};
//!
//! let diag = DiagnosticBuilder::error("unexpected token")
//!     .code(DiagnosticCode::new(2001, "unexpected_token"))
//!     .span(Span::DUMMY)
//!     .help("try checking the syntax")
//!     .build();
//! ```

mod builder;
mod codes;

pub use builder::{DiagnosticBuilder, SourceSnippet};
pub use codes::DiagnosticCode;

// Re-export commonly used diagnostic codes as constants for convenience
pub use codes::{
    E0001, E0002, E0003, E0004, E0005,
    E_LEXER_UNEXPECTED_CHAR, E_LEXER_UNTERMINATED_STRING, E_LEXER_INVALID_NUMBER, E_LEXER_UNKNOWN_TOKEN,
    E_PARSER_UNEXPECTED_TOKEN, E_PARSER_EXPECTED_TOKEN, E_PARSER_UNEXPECTED_EOF, E_PARSER_DUPLICATE_DEF,
    E_SEMANTIC_TYPE_MISMATCH, E_SEMANTIC_UNDEFINED_VAR, E_SEMANTIC_UNDEFINED_FN, E_SEMANTIC_MUT_REQUIRED,
    W0001, W0002, W0003,
    W_UNUSED_VARIABLE, W_UNUSED_FUNCTION, W_DEAD_CODE,
};

pub use crate::Span;
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity level
///
/// # Examples
///
/// ```
/// use microc_util::diagnostic::Level;
///
/// assert_eq!(format!("{}", Level::Error), "error");
/// assert_eq!(format!("{}", Level::Warning), "warning");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that prevents compilation
    Error,
    /// A warning that doesn't prevent compilation
    Warning,
    /// Additional information about a diagnostic
    Note,
    /// A suggestion for fixing an issue
    Help,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
            Level::Help => write!(f, "help"),
        }
    }
}

/// A diagnostic message with severity and location
///
/// # Examples
///
/// ```
/// use microc_util::diagnostic::{Diagnostic, Level, Span};
///
/// let diag = Diagnostic::error("something went wrong", Span::DUMMY);
/// assert_eq!(diag.level, Level::Error);
/// ```
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Diagnostic severity level
    pub level: Level,
    /// Main diagnostic message
    pub message: String,
    /// Source location
    pub span: Span,
    /// Optional diagnostic code
    pub code: Option<DiagnosticCode>,
    /// Additional notes for context
    pub notes: Vec<String>,
    /// Help suggestions for fixing the issue
    pub helps: Vec<String>,
    /// Source code snippets for display
    pub snippets: Vec<SourceSnippet>,
}

impl Diagnostic {
    /// Create a new diagnostic
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::{Diagnostic, Level, Span};
    ///
    /// let diag = Diagnostic::new(Level::Error, "error message", Span::DUMMY);
    /// ```
    pub fn new(level: Level, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            message: message.into(),
            span,
            code: None,
            notes: Vec::new(),
            helps: Vec::new(),
            snippets: Vec::new(),
        }
    }

    /// Create an error diagnostic
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::{Diagnostic, Span};
    ///
    /// let diag = Diagnostic::error("something went wrong", Span::DUMMY);
    /// ```
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, message, span)
    }

    /// Create a warning diagnostic
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::{Diagnostic, Span};
    ///
    /// let diag = Diagnostic::warning("unused variable", Span::DUMMY);
    /// ```
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Warning, message, span)
    }

    /// Set the diagnostic code
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::{Diagnostic, Span, DiagnosticCode};
    ///
    /// let mut diag = Diagnostic::error("type error", Span::DUMMY);
    /// diag = diag.with_code(DiagnosticCode::new(3001, "type_mismatch"));
    /// ```
    pub fn with_code(mut self, code: DiagnosticCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a note to the diagnostic
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::{Diagnostic, Span};
    ///
    /// let diag = Diagnostic::error("type mismatch", Span::DUMMY)
    ///     .with_note("expected type `i32`")
    ///     .with_note("found type `String`");
    /// ```
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Add a help suggestion
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::{Diagnostic, Span};
    ///
    /// let diag = Diagnostic::error("unexpected token", Span::DUMMY)
    ///     .with_help("try removing the semicolon");
    /// ```
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.helps.push(help.into());
        self
    }

    /// Add a source snippet
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::{Diagnostic, Span, SourceSnippet};
    ///
    /// let snippet = SourceSnippet::point("let x = 42;", 1, 5);
    /// let diag = Diagnostic::error("invalid name", Span::DUMMY)
    ///     .with_snippet(snippet);
    /// ```
    pub fn with_snippet(mut self, snippet: SourceSnippet) -> Self {
        self.snippets.push(snippet);
        self
    }
}

/// Handler for collecting and reporting diagnostics
///
/// The `Handler` collects diagnostics and provides methods for querying
/// their counts. It can be configured to panic on errors for testing.
///
/// # Examples
///
/// ```
/// use microc_util::diagnostic::Handler;
///
/// let mut handler = Handler::new();
/// handler.error("unexpected token", Span::DUMMY);
///
/// if handler.has_errors() {
///     eprintln!("Compilation failed with {} errors", handler.error_count());
/// }
/// ```
pub struct Handler {
    /// Collected diagnostics
    diagnostics: RefCell<Vec<Diagnostic>>,
    /// Whether to panic on errors (for testing)
    panic_on_error: RefCell<bool>,
}

impl Handler {
    /// Create a new handler
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::Handler;
    ///
    /// let handler = Handler::new();
    /// ```
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            panic_on_error: RefCell::new(false),
        }
    }

    /// Create a handler that panics on errors (for testing)
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::Handler;
    ///
    /// let handler = Handler::new_panicking();
    /// ```
    pub fn new_panicking() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            panic_on_error: RefCell::new(true),
        }
    }

    /// Report an error
    ///
    /// This is the legacy API. For more control, use [`DiagnosticBuilder`].
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::{Handler, Span};
    ///
    /// let handler = Handler::new();
    /// handler.error("unexpected token", Span::DUMMY);
    /// ```
    #[deprecated(since = "0.2.0", note = "Use `DiagnosticBuilder::error()` for more control")]
    pub fn error(&self, message: impl Into<String>, span: Span) {
        let diag = Diagnostic::error(message, span);
        self.emit(diag);
    }

    /// Report a warning
    ///
    /// This is the legacy API. For more control, use [`DiagnosticBuilder`].
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::{Handler, Span};
    ///
    /// let handler = Handler::new();
    /// handler.warning("unused variable", Span::DUMMY);
    /// ```
    #[deprecated(since = "0.2.0", note = "Use `DiagnosticBuilder::warning()` for more control")]
    pub fn warning(&self, message: impl Into<String>, span: Span) {
        let diag = Diagnostic::warning(message, span);
        self.emit(diag);
    }

    /// Emit a diagnostic
    fn emit(&self, diagnostic: Diagnostic) {
        if *self.panic_on_error.borrow() && diagnostic.level == Level::Error {
            panic!("Diagnostic error: {}", diagnostic.message);
        }
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Emit a pre-built diagnostic
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::{Handler, Diagnostic, Span};
    ///
    /// let handler = Handler::new();
    /// let diag = Diagnostic::error("test", Span::DUMMY);
    /// handler.emit_diagnostic(diag);
    /// ```
    pub fn emit_diagnostic(&self, diagnostic: Diagnostic) {
        self.emit(diagnostic);
    }

    /// Create a diagnostic builder for an error
    ///
    /// This is the recommended way to create error diagnostics with
    /// the fluent builder API.
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::Handler;
    ///
    /// let handler = Handler::new();
    /// handler.build_error("type mismatch")
    ///     .code(microc_util::diagnostic::DiagnosticCode::E0002)
    ///     .emit(&handler);
    /// ```
    pub fn build_error(&self, span: Span, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::error(message).span(span)
    }

    /// Create a diagnostic builder for a warning
    ///
    /// This is the recommended way to create warning diagnostics with
    /// the fluent builder API.
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::Handler;
    ///
    /// let handler = Handler::new();
    /// handler.build_warning("unused variable")
    ///     .code(microc_util::diagnostic::DiagnosticCode::W0001)
    ///     .emit(&handler);
    /// ```
    pub fn build_warning(&self, span: Span, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::warning(message).span(span)
    }

    /// Check if any errors have been reported
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::Handler;
    ///
    /// let handler = Handler::new();
    /// assert!(!handler.has_errors());
    /// ```
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Get the number of errors
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::Handler;
    ///
    /// let handler = Handler::new();
    /// assert_eq!(handler.error_count(), 0);
    /// ```
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Get the number of warnings
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::Handler;
    ///
    /// let handler = Handler::new();
    /// assert_eq!(handler.warning_count(), 0);
    /// ```
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Warning)
            .count()
    }

    /// Get all diagnostics
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::Handler;
    ///
    /// let handler = Handler::new();
    /// let diags = handler.diagnostics();
    /// ```
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Clear all diagnostics
    ///
    /// # Examples
    ///
    /// ```
    /// use microc_util::diagnostic::Handler;
    ///
    /// let handler = Handler::new();
    /// handler.clear();
    /// ```
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}
