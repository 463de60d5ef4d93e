// decl.rs — Declaration table: reactor declarations and their parameters
//
// Read-only view (after loading) over every reactor declaration of a program.
// Parameters are stored in one arena so a `ParamId` identifies a parameter
// across all declarations; names need not be unique.
//
// Preconditions: built by the model loader or directly through the builder API.
// Postconditions: `all_parameters` yields inherited parameters first (depth-first
//   in `extends` order, each declaration once), then local ones.
// Failure modes: none at this level; empty defaults, duplicate names, and
//   inheritance cycles are reported by the loader and the validation pass.
// Side effects: none.

use std::collections::{HashMap, HashSet};

use crate::ast::{Span, Value};
use crate::id::{DeclId, IdAllocator, ParamId};

// ── Data types ──────────────────────────────────────────────────────────────

/// A declared, typeable slot on a reactor declaration.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub id: ParamId,
    /// Declaration that owns this parameter.
    pub decl: DeclId,
    pub name: String,
    /// Declared type text as written in the source, `None` when untyped.
    pub declared_type: Option<String>,
    /// Default initializer. Never empty in a well-formed program.
    pub default: Vec<Value>,
    pub span: Span,
}

/// A reusable component template.
#[derive(Debug, Clone)]
pub struct ReactorDecl {
    pub id: DeclId,
    pub name: String,
    /// Superclass declarations, in source order.
    pub extends: Vec<DeclId>,
    /// Local parameters in declaration order.
    pub params: Vec<ParamId>,
    pub span: Span,
}

// ── Table ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct DeclTable {
    decls: Vec<ReactorDecl>,
    params: Vec<Parameter>,
    by_name: HashMap<String, DeclId>,
    ids: IdAllocator,
}

impl DeclTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration. A later declaration with the same name shadows the
    /// earlier one for `lookup`; the loader rejects duplicates before this point.
    pub fn add_reactor(&mut self, name: impl Into<String>, span: Span) -> DeclId {
        let id = self.ids.alloc_decl();
        let name = name.into();
        self.by_name.insert(name.clone(), id);
        self.decls.push(ReactorDecl {
            id,
            name,
            extends: Vec::new(),
            params: Vec::new(),
            span,
        });
        id
    }

    pub fn add_extends(&mut self, decl: DeclId, superclass: DeclId) {
        self.decls[decl.index()].extends.push(superclass);
    }

    pub fn add_parameter(
        &mut self,
        decl: DeclId,
        name: impl Into<String>,
        declared_type: Option<String>,
        default: Vec<Value>,
        span: Span,
    ) -> ParamId {
        let id = self.ids.alloc_param();
        self.params.push(Parameter {
            id,
            decl,
            name: name.into(),
            declared_type,
            default,
            span,
        });
        self.decls[decl.index()].params.push(id);
        id
    }

    /// Replace a parameter's default. Used when defaults reference sibling
    /// parameters that must exist before the reference can be bound.
    pub fn set_default(&mut self, param: ParamId, default: Vec<Value>) {
        self.params[param.index()].default = default;
    }

    pub fn decl(&self, id: DeclId) -> &ReactorDecl {
        &self.decls[id.index()]
    }

    pub fn param(&self, id: ParamId) -> &Parameter {
        &self.params[id.index()]
    }

    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        self.by_name.get(name).copied()
    }

    pub fn decls(&self) -> impl Iterator<Item = &ReactorDecl> {
        self.decls.iter()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Every parameter visible on `decl`: inherited ones first, then local.
    pub fn all_parameters(&self, decl: DeclId) -> Vec<ParamId> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        self.collect_parameters(decl, &mut visited, &mut out);
        out
    }

    fn collect_parameters(
        &self,
        decl: DeclId,
        visited: &mut HashSet<DeclId>,
        out: &mut Vec<ParamId>,
    ) {
        if !visited.insert(decl) {
            return;
        }
        let d = self.decl(decl);
        for &sup in &d.extends {
            self.collect_parameters(sup, visited, out);
        }
        out.extend(d.params.iter().copied());
    }

    /// Find a visible parameter by name. With duplicate names the last one in
    /// `all_parameters` order wins, matching which backing field survives
    /// in the generated skeleton.
    pub fn find_param(&self, decl: DeclId, name: &str) -> Option<ParamId> {
        self.all_parameters(decl)
            .into_iter()
            .rev()
            .find(|&p| self.param(p).name == name)
    }

    /// Pairs `(first, later)` of visible parameters on `decl` sharing a name.
    pub fn duplicate_names(&self, decl: DeclId) -> Vec<(ParamId, ParamId)> {
        let mut first_by_name: HashMap<&str, ParamId> = HashMap::new();
        let mut dups = Vec::new();
        for p in self.all_parameters(decl) {
            let name = self.param(p).name.as_str();
            match first_by_name.get(name) {
                Some(&first) => dups.push((first, p)),
                None => {
                    first_by_name.insert(name, p);
                }
            }
        }
        dups
    }

    /// Return the declarations forming an `extends` cycle through `decl`, if any.
    pub fn inheritance_cycle(&self, decl: DeclId) -> Option<Vec<DeclId>> {
        let mut stack = vec![decl];
        if self.find_cycle(decl, decl, &mut stack, &mut HashSet::new()) {
            Some(stack)
        } else {
            None
        }
    }

    fn find_cycle(
        &self,
        start: DeclId,
        current: DeclId,
        stack: &mut Vec<DeclId>,
        seen: &mut HashSet<DeclId>,
    ) -> bool {
        for &sup in &self.decl(current).extends {
            if sup == start {
                return true;
            }
            if !seen.insert(sup) {
                continue;
            }
            stack.push(sup);
            if self.find_cycle(start, sup, stack, seen) {
                return true;
            }
            stack.pop();
        }
        false
    }
}
