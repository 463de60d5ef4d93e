// error.rs — Error taxonomy for loading, resolution, and emission
//
// `ParamError` covers the resolution/emission engine; `LoadError` covers
// building a `Program` from its JSON model. Both convert into diagnostics
// with stable codes so callers can batch-report a whole compilation unit.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::ast::Span;
use crate::diag::{codes, DiagLevel, Diagnostic};

/// Which initializer an `EmptyInitializer` error was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializerOrigin {
    Default,
    Override,
}

impl fmt::Display for InitializerOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitializerOrigin::Default => write!(f, "default"),
            InitializerOrigin::Override => write!(f, "override"),
        }
    }
}

/// Errors from parameter resolution and emission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// A forwarded parameter reference on the root, which has no enclosing
    /// instance.
    #[error("cannot forward a parameter into `{param}` of `{instance}`: no enclosing instance")]
    UnboundScope {
        param: String,
        instance: String,
        span: Span,
    },

    #[error("{origin} initializer of parameter `{param}` is empty")]
    EmptyInitializer {
        param: String,
        origin: InitializerOrigin,
        span: Span,
    },

    /// Advisory: two visible parameters of one declaration share a name.
    #[error("reactor `{reactor}` declares parameter `{name}` more than once")]
    AmbiguousName {
        reactor: String,
        name: String,
        first: Span,
        second: Span,
    },
}

impl ParamError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ParamError::AmbiguousName { .. })
    }

    /// Severity follows `is_fatal`: advisories become warnings.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let level = if self.is_fatal() {
            DiagLevel::Error
        } else {
            DiagLevel::Warning
        };
        let message = self.to_string();
        match self {
            ParamError::UnboundScope { span, .. } => Diagnostic::new(level, *span, message)
                .with_code(codes::E0201_UNBOUND_SCOPE)
                .with_hint("the root instance has no enclosing reactor to forward parameters from"),
            ParamError::EmptyInitializer { span, .. } => {
                Diagnostic::new(level, *span, message).with_code(codes::E0202_EMPTY_INITIALIZER)
            }
            ParamError::AmbiguousName { first, second, .. } => {
                Diagnostic::new(level, *second, message)
                    .with_code(codes::W0301_AMBIGUOUS_NAME)
                    .with_related(*first, "first declared here")
                    .with_hint("only one accessor is generated; the later field initializer wins")
            }
        }
    }
}

/// Errors from reading and binding a JSON program model.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed program model: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reactor `{name}` is declared more than once")]
    DuplicateReactor { name: String, span: Span, first: Span },

    #[error("instance `{name}` is declared more than once in `{parent}`")]
    DuplicateInstance {
        name: String,
        parent: String,
        span: Span,
        first: Span,
    },

    #[error("unknown reactor `{name}`")]
    UnknownReactor { name: String, span: Span },

    #[error("reactor `{reactor}` has no parameter `{name}`")]
    UnknownParameter {
        reactor: String,
        name: String,
        span: Span,
    },

    #[error("cyclic extends: {}", chain.join(" -> "))]
    CyclicExtends { chain: Vec<String>, span: Span },

    #[error("unknown time unit `{unit}`")]
    UnknownTimeUnit { unit: String, span: Span },

    #[error("{message}")]
    Malformed { message: String, span: Span },

    #[error(transparent)]
    Param(#[from] ParamError),
}

impl LoadError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let message = self.to_string();
        match self {
            LoadError::Io { .. } | LoadError::Json(_) => {
                Diagnostic::error(codes::E0106_MALFORMED_MODEL, Span::default(), message)
            }
            LoadError::Malformed { span, .. } => {
                Diagnostic::error(codes::E0106_MALFORMED_MODEL, *span, message)
            }
            LoadError::DuplicateReactor { span, first, .. } => {
                Diagnostic::error(codes::E0103_DUPLICATE_REACTOR, *span, message)
                    .with_related(*first, "first declared here")
            }
            LoadError::DuplicateInstance { span, first, .. } => {
                Diagnostic::error(codes::E0107_DUPLICATE_INSTANCE, *span, message)
                    .with_related(*first, "first declared here")
            }
            LoadError::UnknownReactor { span, .. } => {
                Diagnostic::error(codes::E0101_UNKNOWN_REACTOR, *span, message)
            }
            LoadError::UnknownParameter { span, .. } => {
                Diagnostic::error(codes::E0102_UNKNOWN_PARAMETER, *span, message)
            }
            LoadError::CyclicExtends { span, .. } => {
                Diagnostic::error(codes::E0104_CYCLIC_EXTENDS, *span, message)
            }
            LoadError::UnknownTimeUnit { span, .. } => {
                Diagnostic::error(codes::E0105_UNKNOWN_TIME_UNIT, *span, message)
            }
            LoadError::Param(e) => e.to_diagnostic(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_name_is_advisory() {
        let e = ParamError::AmbiguousName {
            reactor: "R".into(),
            name: "x".into(),
            first: Span::new(1, 2),
            second: Span::new(5, 6),
        };
        assert!(!e.is_fatal());
        let d = e.to_diagnostic();
        assert_eq!(d.level, DiagLevel::Warning);
        assert_eq!(d.span, Span::new(5, 6));
        assert_eq!(d.related_spans.len(), 1);
    }

    #[test]
    fn unbound_scope_carries_assignment_span() {
        let e = ParamError::UnboundScope {
            param: "p".into(),
            instance: "main".into(),
            span: Span::new(10, 20),
        };
        assert!(e.is_fatal());
        let d = e.to_diagnostic();
        assert_eq!(d.level, DiagLevel::Error);
        assert_eq!(d.code, Some(codes::E0201_UNBOUND_SCOPE));
        assert_eq!(d.span, Span::new(10, 20));
    }

    #[test]
    fn load_errors_wrap_param_errors() {
        let e: LoadError = ParamError::EmptyInitializer {
            param: "p".into(),
            origin: InitializerOrigin::Override,
            span: Span::default(),
        }
        .into();
        assert_eq!(e.to_string(), "override initializer of parameter `p` is empty");
        assert_eq!(e.to_diagnostic().code, Some(codes::E0202_EMPTY_INITIALIZER));
    }

    #[test]
    fn duplicate_instance_points_at_first() {
        let e = LoadError::DuplicateInstance {
            name: "x".into(),
            parent: "main".into(),
            span: Span::new(5, 6),
            first: Span::new(1, 2),
        };
        assert_eq!(e.to_string(), "instance `x` is declared more than once in `main`");
        let d = e.to_diagnostic();
        assert_eq!(d.code, Some(codes::E0107_DUPLICATE_INSTANCE));
        assert_eq!(d.related_spans[0].span, Span::new(1, 2));
    }
}
