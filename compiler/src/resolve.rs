// resolve.rs — Parameter resolution for reactor instances
//
// For one `ParameterInstance`, selects the authoritative initializer (the last
// matching override on the hosting instantiation, else the declared default)
// and turns every term into target text or a scope-qualified reference.
//
// Preconditions: `program` is fully loaded; the tree is not mutated while a
//                `Resolver` borrows it.
// Postconditions: the returned sequence has the arity of the selected source
//                 (never merged across override and default) and is non-empty.
// Failure modes: `UnboundScope` when a forwarded reference sits on the root,
//                which has no enclosing instance; `EmptyInitializer` for
//                zero-length sources.
// Side effects: none.

use std::fmt;

use tracing::debug;

use crate::ast::Value;
use crate::error::{InitializerOrigin, ParamError};
use crate::id::InstId;
use crate::instance::{Assignment, ParameterInstance};
use crate::model::Program;
use crate::target::{Scope, Target};

/// Parent links between an overridden instance and the instance whose
/// parameters its override may forward: the reactor that performs the
/// instantiation, in whose scope the right-hand side is written.
pub const FORWARD_DEPTH: usize = 1;

// ── Public types ────────────────────────────────────────────────────────────

/// One resolved initializer term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTerm {
    /// Serialized literal, time value, or in-scope reference.
    Text(String),
    /// Access to a parameter of an ancestor instance.
    Forwarded { path: String, name: String },
}

impl fmt::Display for ResolvedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedTerm::Text(text) => write!(f, "{}", text),
            ResolvedTerm::Forwarded { path, name } => write!(f, "{}.{}", path, name),
        }
    }
}

/// Resolver output with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub terms: Vec<ResolvedTerm>,
    pub origin: InitializerOrigin,
    /// True if any term reads another parameter, so the value must be
    /// recomputed per instance rather than taken from the class default.
    pub reads_parameters: bool,
}

// ── Resolver ────────────────────────────────────────────────────────────────

pub struct Resolver<'a, T: Target + ?Sized> {
    program: &'a Program,
    target: &'a T,
}

impl<'a, T: Target + ?Sized> Resolver<'a, T> {
    pub fn new(program: &'a Program, target: &'a T) -> Self {
        Resolver { program, target }
    }

    pub fn resolve(&self, pi: ParameterInstance) -> Result<Vec<ResolvedTerm>, ParamError> {
        self.resolve_with_origin(pi).map(|r| r.terms)
    }

    pub fn resolve_with_origin(&self, pi: ParameterInstance) -> Result<Resolution, ParamError> {
        let resolution = match pi.last_assignment(&self.program.tree) {
            Some(assignment) => self.resolve_override(pi, assignment)?,
            None => self.resolve_default(pi)?,
        };
        debug!(
            param = %self.program.decls.param(pi.param).name,
            instance = %self.program.tree.get(pi.host).name,
            origin = %resolution.origin,
            arity = resolution.terms.len(),
            "parameter resolved"
        );
        Ok(resolution)
    }

    /// The instance a forwarded reference on `host`'s overrides is read from.
    pub fn forward_scope(&self, host: InstId) -> Option<InstId> {
        self.program.tree.ancestor(host, FORWARD_DEPTH)
    }

    fn resolve_override(
        &self,
        pi: ParameterInstance,
        assignment: &Assignment,
    ) -> Result<Resolution, ParamError> {
        let param = self.program.decls.param(pi.param);
        if assignment.rhs.is_empty() {
            return Err(ParamError::EmptyInitializer {
                param: param.name.clone(),
                origin: InitializerOrigin::Override,
                span: assignment.span,
            });
        }
        let mut terms = Vec::with_capacity(assignment.rhs.len());
        let mut reads_parameters = false;
        for value in &assignment.rhs {
            match value {
                Value::ParamRef(referenced) => {
                    let scope =
                        self.forward_scope(pi.host)
                            .ok_or_else(|| ParamError::UnboundScope {
                                param: param.name.clone(),
                                instance: self.program.tree.get(pi.host).name.clone(),
                                span: assignment.span,
                            })?;
                    reads_parameters = true;
                    terms.push(ResolvedTerm::Forwarded {
                        path: self.target.path_to(&self.program.tree, scope),
                        name: self.program.decls.param(*referenced).name.clone(),
                    });
                }
                _ => terms.push(ResolvedTerm::Text(self.target.serialize(
                    self.program,
                    value,
                    Scope::Instance(pi.host),
                ))),
            }
        }
        Ok(Resolution {
            terms,
            origin: InitializerOrigin::Override,
            reads_parameters,
        })
    }

    fn resolve_default(&self, pi: ParameterInstance) -> Result<Resolution, ParamError> {
        let param = self.program.decls.param(pi.param);
        if param.default.is_empty() {
            return Err(ParamError::EmptyInitializer {
                param: param.name.clone(),
                origin: InitializerOrigin::Default,
                span: param.span,
            });
        }
        // Defaults are self-contained: references stay in the host's own scope.
        let terms = param
            .default
            .iter()
            .map(|v| {
                ResolvedTerm::Text(self.target.serialize(
                    self.program,
                    v,
                    Scope::Instance(pi.host),
                ))
            })
            .collect();
        Ok(Resolution {
            terms,
            origin: InitializerOrigin::Default,
            reads_parameters: param.default.iter().any(|v| v.as_param_ref().is_some()),
        })
    }
}
