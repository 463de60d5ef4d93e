// model.rs — JSON program model and loader
//
// Deserializes a program (reactor declarations plus the elaborated
// instantiation tree) and binds every name to an arena id, producing the
// `DeclTable` and `InstanceTree` the engine works on.
//
// Preconditions: input is a JSON document in the shape of `ProgramSpec`.
// Postconditions: on success every `ParamRef` and assignment left-hand side
//   refers to an existing parameter, and no declaration is in an `extends`
//   cycle.
// Failure modes: every binding problem is collected as a `LoadError`; loading
//   continues past errors so one run reports all of them.
// Side effects: `load_file` reads one file.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::ast::{Literal, Span, TimeUnit, TimeValue, Value};
use crate::config::EmitOptions;
use crate::decl::DeclTable;
use crate::error::{LoadError, ParamError};
use crate::id::{DeclId, InstId};
use crate::instance::{Assignment, InstanceTree};

/// A loaded program: declarations, instance tree, and emission options.
#[derive(Debug, Default)]
pub struct Program {
    pub decls: DeclTable,
    pub tree: InstanceTree,
    pub options: EmitOptions,
}

// ── Serialized form ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramSpec {
    #[serde(default)]
    pub options: EmitOptions,
    pub reactors: Vec<ReactorSpec>,
    pub main: InstanceSpec,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactorSpec {
    pub name: String,
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ParamSpec>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamSpec {
    pub name: String,
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
    pub default: Vec<ValueSpec>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceSpec {
    pub name: String,
    pub reactor: String,
    #[serde(default)]
    pub assignments: Vec<AssignmentSpec>,
    #[serde(default)]
    pub children: Vec<InstanceSpec>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignmentSpec {
    pub lhs: String,
    pub rhs: Vec<ValueSpec>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSpec {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Code(String),
    Time(TimeSpec),
    Param(ParamRefSpec),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeSpec {
    pub value: u64,
    #[serde(default)]
    pub unit: Option<String>,
}

/// `"x"` binds in the default scope; `{"name": "x", "of": "R"}` names the
/// declaration explicitly.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParamRefSpec {
    Name(String),
    Qualified { name: String, of: String },
}

// ── Entry points ────────────────────────────────────────────────────────────

pub fn load_file(path: &Path) -> Result<Program, Vec<LoadError>> {
    let source = std::fs::read_to_string(path).map_err(|source| {
        vec![LoadError::Io {
            path: path.to_path_buf(),
            source,
        }]
    })?;
    load_str(&source)
}

pub fn load_str(source: &str) -> Result<Program, Vec<LoadError>> {
    let spec: ProgramSpec = serde_json::from_str(source).map_err(|e| vec![e.into()])?;
    load(&spec)
}

/// Bind a deserialized model. Returns every error found, or the program.
pub fn load(spec: &ProgramSpec) -> Result<Program, Vec<LoadError>> {
    let mut loader = Loader {
        program: Program {
            options: spec.options.clone(),
            ..Program::default()
        },
        errors: Vec::new(),
    };
    if let Err(message) = spec.options.check() {
        loader.errors.push(LoadError::Malformed {
            message,
            span: Span::default(),
        });
    }
    let decl_ids = loader.declare_reactors(&spec.reactors);
    loader.bind_extends(&spec.reactors, &decl_ids);
    loader.bind_parameters(&spec.reactors, &decl_ids);
    loader.build_tree(&spec.main);

    if loader.errors.is_empty() {
        info!(
            reactors = loader.program.decls.len(),
            instances = loader.program.tree.len(),
            "program loaded"
        );
        Ok(loader.program)
    } else {
        Err(loader.errors)
    }
}

// ── Loader ──────────────────────────────────────────────────────────────────

struct Loader {
    program: Program,
    errors: Vec<LoadError>,
}

impl Loader {
    /// Declare every reactor. Duplicates are reported and get no id.
    fn declare_reactors(&mut self, reactors: &[ReactorSpec]) -> Vec<Option<DeclId>> {
        let mut ids = Vec::with_capacity(reactors.len());
        for r in reactors {
            if let Some(first) = self.program.decls.lookup(&r.name) {
                self.errors.push(LoadError::DuplicateReactor {
                    name: r.name.clone(),
                    span: r.span,
                    first: self.program.decls.decl(first).span,
                });
                ids.push(None);
                continue;
            }
            ids.push(Some(self.program.decls.add_reactor(&r.name, r.span)));
        }
        ids
    }

    fn bind_extends(&mut self, reactors: &[ReactorSpec], ids: &[Option<DeclId>]) {
        for (r, id) in reactors.iter().zip(ids) {
            let Some(id) = *id else { continue };
            for sup in &r.extends {
                match self.program.decls.lookup(sup) {
                    Some(sup_id) => self.program.decls.add_extends(id, sup_id),
                    None => self.errors.push(LoadError::UnknownReactor {
                        name: sup.clone(),
                        span: r.span,
                    }),
                }
            }
        }
        for id in ids.iter().flatten() {
            if let Some(cycle) = self.program.decls.inheritance_cycle(*id) {
                // Report each cycle once, from its smallest member.
                if cycle.iter().min() != Some(id) {
                    continue;
                }
                let decls = &self.program.decls;
                let mut chain: Vec<String> =
                    cycle.iter().map(|d| decls.decl(*d).name.clone()).collect();
                chain.push(decls.decl(*id).name.clone());
                self.errors.push(LoadError::CyclicExtends {
                    chain,
                    span: decls.decl(*id).span,
                });
            }
        }
    }

    /// Two steps so defaults may reference any parameter of their declaration,
    /// including inherited and later ones.
    fn bind_parameters(&mut self, reactors: &[ReactorSpec], ids: &[Option<DeclId>]) {
        let mut declared = Vec::new();
        for (r, id) in reactors.iter().zip(ids) {
            let Some(id) = *id else { continue };
            for p in &r.parameters {
                let pid =
                    self.program
                        .decls
                        .add_parameter(id, &p.name, p.ty.clone(), Vec::new(), p.span);
                declared.push((pid, id, p));
            }
        }
        for (pid, decl, p) in declared {
            let default = self.bind_values(&p.default, &Ok(decl), p.span);
            self.program.decls.set_default(pid, default);
        }
    }

    fn build_tree(&mut self, main: &InstanceSpec) {
        let Some(decl) = self.lookup_reactor(&main.reactor, main.span) else {
            return;
        };
        let root = self.program.tree.add_root(&main.name, decl, main.span);
        for a in self.bind_assignments(main, decl, None) {
            self.program.tree.add_assignment(root, a);
        }
        for child in &main.children {
            self.build_instance(root, child);
        }
    }

    fn build_instance(&mut self, parent: InstId, spec: &InstanceSpec) {
        let tree = &self.program.tree;
        let sibling = tree
            .get(parent)
            .children
            .iter()
            .map(|&c| tree.get(c))
            .find(|c| c.name == spec.name)
            .map(|c| c.span);
        if let Some(first) = sibling {
            self.errors.push(LoadError::DuplicateInstance {
                name: spec.name.clone(),
                parent: tree.get(parent).name.clone(),
                span: spec.span,
                first,
            });
            return;
        }
        let Some(decl) = self.lookup_reactor(&spec.reactor, spec.span) else {
            return;
        };
        let assignments = self.bind_assignments(spec, decl, Some(parent));
        let id = self
            .program
            .tree
            .add_child(parent, &spec.name, decl, assignments, spec.span);
        debug!(instance = %spec.name, id = %id, "instance elaborated");
        for child in &spec.children {
            self.build_instance(id, child);
        }
    }

    /// Right-hand sides bind unqualified parameter names in the declaration of
    /// `forward_scope`, the instance that performs the instantiation. The root
    /// has none.
    fn bind_assignments(
        &mut self,
        spec: &InstanceSpec,
        decl: DeclId,
        forward_scope: Option<InstId>,
    ) -> Vec<Assignment> {
        let scope_decl = forward_scope.map(|g| self.program.tree.get(g).decl);
        let mut out = Vec::with_capacity(spec.assignments.len());
        for a in &spec.assignments {
            let Some(lhs) = self.program.decls.find_param(decl, &a.lhs) else {
                self.errors.push(LoadError::UnknownParameter {
                    reactor: self.program.decls.decl(decl).name.clone(),
                    name: a.lhs.clone(),
                    span: a.span,
                });
                continue;
            };
            let scope = scope_decl.ok_or_else(|| ParamError::UnboundScope {
                param: a.lhs.clone(),
                instance: spec.name.clone(),
                span: a.span,
            });
            let rhs = self.bind_values(&a.rhs, &scope, a.span);
            out.push(Assignment {
                lhs,
                rhs,
                span: a.span,
            });
        }
        out
    }

    /// Convert value specs. Unqualified parameter names bind in `scope`, or
    /// report its error when there is no such scope.
    fn bind_values(
        &mut self,
        values: &[ValueSpec],
        scope: &Result<DeclId, ParamError>,
        span: Span,
    ) -> Vec<Value> {
        let mut out = Vec::with_capacity(values.len());
        for v in values {
            let value = match v {
                ValueSpec::Int(i) => Value::Literal(Literal::Int(*i)),
                ValueSpec::Float(f) => Value::Literal(Literal::Float(*f)),
                ValueSpec::Bool(b) => Value::Literal(Literal::Bool(*b)),
                ValueSpec::String(s) => Value::Literal(Literal::Str(s.clone())),
                ValueSpec::Code(c) => Value::Literal(Literal::Code(c.clone())),
                ValueSpec::Time(t) => match self.bind_time(t, span) {
                    Some(t) => Value::Time(t),
                    None => continue,
                },
                ValueSpec::Param(r) => {
                    let (name, decl) = match r {
                        ParamRefSpec::Name(name) => match scope {
                            Ok(d) => (name, *d),
                            Err(e) => {
                                self.errors.push(e.clone().into());
                                continue;
                            }
                        },
                        ParamRefSpec::Qualified { name, of } => {
                            match self.lookup_reactor(of, span) {
                                Some(d) => (name, d),
                                None => continue,
                            }
                        }
                    };
                    match self.program.decls.find_param(decl, name) {
                        Some(p) => Value::ParamRef(p),
                        None => {
                            self.errors.push(LoadError::UnknownParameter {
                                reactor: self.program.decls.decl(decl).name.clone(),
                                name: name.clone(),
                                span,
                            });
                            continue;
                        }
                    }
                }
            };
            out.push(value);
        }
        out
    }

    fn bind_time(&mut self, t: &TimeSpec, span: Span) -> Option<TimeValue> {
        match &t.unit {
            Some(unit) => match unit.parse::<TimeUnit>() {
                Ok(u) => Some(TimeValue::new(t.value, u)),
                Err(_) => {
                    self.errors.push(LoadError::UnknownTimeUnit {
                        unit: unit.clone(),
                        span,
                    });
                    None
                }
            },
            None if t.value == 0 => Some(TimeValue::zero()),
            None => {
                self.errors.push(LoadError::Malformed {
                    message: format!("time value {} needs a unit", t.value),
                    span,
                });
                None
            }
        }
    }

    fn lookup_reactor(&mut self, name: &str, span: Span) -> Option<DeclId> {
        let found = self.program.decls.lookup(name);
        if found.is_none() {
            self.errors.push(LoadError::UnknownReactor {
                name: name.to_string(),
                span,
            });
        }
        found
    }
}
