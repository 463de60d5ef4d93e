// instance.rs — Instantiation tree: reactor instances and their override sites
//
// The tree is an arena of `Instantiation` nodes addressed by `InstId`.
// Children are owned through index lists and parents are non-owning index
// back-links, so the structure has no reference cycles.
//
// Preconditions: declaration ids passed in exist in the program's `DeclTable`.
// Postconditions: the tree is immutable once loading completes.
// Failure modes: none (lookups of absent ancestors return `None`).
// Side effects: none.

use crate::ast::{Span, Value};
use crate::decl::DeclTable;
use crate::id::{DeclId, IdAllocator, InstId, ParamId};

// ── Data types ──────────────────────────────────────────────────────────────

/// An override supplied at an instantiation site.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Parameter of the instantiated declaration being overridden.
    pub lhs: ParamId,
    pub rhs: Vec<Value>,
    pub span: Span,
}

impl Assignment {
    pub fn new(lhs: ParamId, rhs: Vec<Value>) -> Self {
        Assignment {
            lhs,
            rhs,
            span: Span::default(),
        }
    }
}

/// A concrete placement of a reactor declaration.
#[derive(Debug, Clone)]
pub struct Instantiation {
    pub id: InstId,
    pub name: String,
    pub decl: DeclId,
    /// Absent only at the program root.
    pub parent: Option<InstId>,
    pub children: Vec<InstId>,
    /// Overrides in source order; the last one per parameter is authoritative.
    pub assignments: Vec<Assignment>,
    pub span: Span,
}

/// A parameter bound to the instantiation that hosts it.
///
/// Transient view: two ids and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterInstance {
    pub param: ParamId,
    pub host: InstId,
}

impl ParameterInstance {
    pub fn new(param: ParamId, host: InstId) -> Self {
        ParameterInstance { param, host }
    }

    /// The authoritative override for this parameter on its host, if any.
    ///
    /// Matches by parameter identity, scanning left to right and keeping the
    /// last hit.
    pub fn last_assignment<'t>(&self, tree: &'t InstanceTree) -> Option<&'t Assignment> {
        let mut last = None;
        for assignment in &tree.get(self.host).assignments {
            if assignment.lhs == self.param {
                tracing::trace!(
                    host = %self.host,
                    span = %assignment.span,
                    "assignment matches parameter"
                );
                last = Some(assignment);
            }
        }
        last
    }
}

// ── Tree ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InstanceTree {
    nodes: Vec<Instantiation>,
    ids: IdAllocator,
}

impl InstanceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, name: impl Into<String>, decl: DeclId, span: Span) -> InstId {
        self.push(name.into(), decl, None, Vec::new(), span)
    }

    pub fn add_child(
        &mut self,
        parent: InstId,
        name: impl Into<String>,
        decl: DeclId,
        assignments: Vec<Assignment>,
        span: Span,
    ) -> InstId {
        let id = self.push(name.into(), decl, Some(parent), assignments, span);
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn add_assignment(&mut self, inst: InstId, assignment: Assignment) {
        self.nodes[inst.index()].assignments.push(assignment);
    }

    fn push(
        &mut self,
        name: String,
        decl: DeclId,
        parent: Option<InstId>,
        assignments: Vec<Assignment>,
        span: Span,
    ) -> InstId {
        let id = self.ids.alloc_inst();
        self.nodes.push(Instantiation {
            id,
            name,
            decl,
            parent,
            children: Vec::new(),
            assignments,
            span,
        });
        id
    }

    pub fn get(&self, id: InstId) -> &Instantiation {
        &self.nodes[id.index()]
    }

    /// The first parentless node.
    pub fn root(&self) -> Option<InstId> {
        self.nodes.iter().find(|n| n.parent.is_none()).map(|n| n.id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk `depth` parent links up from `id`. `ancestor(id, 0) == Some(id)`.
    pub fn ancestor(&self, id: InstId, depth: usize) -> Option<InstId> {
        let mut current = id;
        for _ in 0..depth {
            current = self.get(current).parent?;
        }
        Some(current)
    }

    /// Number of parent links between `id` and the root.
    pub fn depth(&self, id: InstId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Instance names from the root down to `id`, inclusive.
    pub fn names_from_root(&self, id: InstId) -> Vec<&str> {
        let mut names = vec![self.get(id).name.as_str()];
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            names.push(self.get(parent).name.as_str());
            current = parent;
        }
        names.reverse();
        names
    }

    /// Pre-order walk of the subtree rooted at `id`, children in source order.
    pub fn subtree(&self, id: InstId) -> Vec<InstId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.get(next).children.iter().rev().copied());
        }
        out
    }

    /// One `ParameterInstance` per visible parameter of the host's declaration.
    pub fn parameter_instances(&self, decls: &DeclTable, host: InstId) -> Vec<ParameterInstance> {
        decls
            .all_parameters(self.get(host).decl)
            .into_iter()
            .map(|param| ParameterInstance::new(param, host))
            .collect()
    }
}
