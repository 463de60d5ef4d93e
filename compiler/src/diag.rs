// diag.rs — Unified diagnostics model
//
// Every loader, resolution, and emission error converts into a `Diagnostic`
// so a whole compilation unit can be reported in one batch.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use crate::ast::Span;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0201`, `W0301`).
///
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Assigned codes. `E01xx` loading, `E02xx` resolution, `W03xx` advisory.
pub mod codes {
    use super::DiagCode;

    pub const E0101_UNKNOWN_REACTOR: DiagCode = DiagCode("E0101");
    pub const E0102_UNKNOWN_PARAMETER: DiagCode = DiagCode("E0102");
    pub const E0103_DUPLICATE_REACTOR: DiagCode = DiagCode("E0103");
    pub const E0104_CYCLIC_EXTENDS: DiagCode = DiagCode("E0104");
    pub const E0105_UNKNOWN_TIME_UNIT: DiagCode = DiagCode("E0105");
    pub const E0106_MALFORMED_MODEL: DiagCode = DiagCode("E0106");
    pub const E0107_DUPLICATE_INSTANCE: DiagCode = DiagCode("E0107");

    pub const E0201_UNBOUND_SCOPE: DiagCode = DiagCode("E0201");
    pub const E0202_EMPTY_INITIALIZER: DiagCode = DiagCode("E0202");

    pub const W0301_AMBIGUOUS_NAME: DiagCode = DiagCode("W0301");
    pub const W0302_FOREIGN_FORWARD: DiagCode = DiagCode("W0302");
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Related span ─────────────────────────────────────────────────────────

/// A secondary source location providing context for a diagnostic.
#[derive(Debug, Clone)]
pub struct RelatedSpan {
    pub span: Span,
    pub label: String,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
    pub related_spans: Vec<RelatedSpan>,
}

impl Diagnostic {
    pub fn new(level: DiagLevel, span: Span, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            span,
            message: message.into(),
            hint: None,
            related_spans: Vec::new(),
        }
    }

    pub fn error(code: DiagCode, span: Span, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Error, span, message).with_code(code)
    }

    pub fn warning(code: DiagCode, span: Span, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Warning, span, message).with_code(code)
    }

    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_related(mut self, span: Span, label: impl Into<String>) -> Self {
        self.related_spans.push(RelatedSpan {
            span,
            label: label.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagLevel::Error
    }
}

/// True if any diagnostic in the batch is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        if let Some(code) = &self.code {
            write!(f, "{}[{}]: {}", level, code, self.message)?;
        } else {
            write!(f, "{}: {}", level, self.message)?;
        }
        if self.span != Span::default() {
            write!(f, "\n  at: {}", self.span)?;
        }
        for related in &self.related_spans {
            write!(f, "\n  note: {} ({})", related.label, related.span)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}
