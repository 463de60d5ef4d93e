// emit.rs — Python emission of parameter skeletons, accessors, and overrides
//
// Two tiers: each declaration gets one class body holding default-initialized
// backing fields (declaration scope), and each instance gets its resolved
// overrides applied where it is constructed (instance scope).
//
// Preconditions: `program` loaded and validated; `options` fixed for the run.
// Postconditions: declaration order is preserved for fields and entries;
//                 sequences of one term render bare, longer ones parenthesized.
// Failure modes: resolution errors become diagnostics; emission continues
//                with the next parameter so a whole unit is reported at once.
// Side effects: none.

use std::collections::HashSet;
use std::fmt::Write as _;

use tracing::debug;

use crate::config::{EmitOptions, OverrideStyle};
use crate::diag::Diagnostic;
use crate::error::{InitializerOrigin, ParamError};
use crate::id::{DeclId, InstId, ParamId};
use crate::instance::ParameterInstance;
use crate::model::Program;
use crate::resolve::Resolver;
use crate::target::{Scope, Target, TargetType};

// ── Public types ────────────────────────────────────────────────────────────

/// Declaration-scoped parameter code for one reactor class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactorParameterCode {
    pub skeleton: String,
    pub accessors: String,
}

/// One resolved parameter of one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideEntry {
    pub param: ParamId,
    pub name: String,
    pub text: String,
    pub origin: InitializerOrigin,
    pub reads_parameters: bool,
}

impl OverrideEntry {
    /// Whether the class default is not enough and the construction site must
    /// supply this value.
    pub fn needs_injection(&self) -> bool {
        self.origin == InitializerOrigin::Override || self.reads_parameters
    }
}

/// Resolved initializers of one instance, in parameter declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceOverrides {
    pub instance: InstId,
    pub path: String,
    pub entries: Vec<OverrideEntry>,
}

impl InstanceOverrides {
    /// Initializer text for `name`. With duplicate names the later entry wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.name == name)
            .map(|e| e.text.as_str())
    }

    /// Entries with duplicate names collapsed to the last one, keeping the
    /// position of that last one.
    pub fn distinct_entries(&self) -> Vec<&OverrideEntry> {
        let mut seen = HashSet::new();
        let mut out: Vec<&OverrideEntry> = self
            .entries
            .iter()
            .rev()
            .filter(|e| seen.insert(e.name.as_str()))
            .collect();
        out.reverse();
        out
    }
}

#[derive(Debug)]
pub struct OverrideMapResult {
    pub maps: Vec<InstanceOverrides>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
pub struct ModuleResult {
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
}

// ── Sequence rendering ──────────────────────────────────────────────────────

/// One term bare, several as a parenthesized tuple, none as `None`.
pub fn render_sequence<S: AsRef<str>>(terms: &[S], separator: &str) -> Option<String> {
    match terms {
        [] => None,
        [single] => Some(single.as_ref().to_string()),
        many => {
            let parts: Vec<&str> = many.iter().map(AsRef::as_ref).collect();
            Some(format!("({})", parts.join(separator)))
        }
    }
}

// ── Declaration tier ────────────────────────────────────────────────────────

/// Backing-field statements initialized with declared defaults in the
/// declaration's own scope. Unindented; one statement per line.
pub fn render_default_skeleton<T: Target + ?Sized>(
    program: &Program,
    target: &T,
    decl: DeclId,
    options: &EmitOptions,
) -> Result<String, ParamError> {
    let mut lines = vec!["# Define parameters and their default values".to_string()];
    for pid in program.decls.all_parameters(decl) {
        let param = program.decls.param(pid);
        let terms: Vec<String> = param
            .default
            .iter()
            .map(|v| target.serialize(program, v, Scope::Declaration))
            .collect();
        let init = render_sequence(&terms, &options.separator).ok_or_else(|| {
            ParamError::EmptyInitializer {
                param: param.name.clone(),
                origin: InitializerOrigin::Default,
                span: param.span,
            }
        })?;
        match target.target_type(param) {
            TargetType::NoExplicitType => lines.push(format!("self._{} = {}", param.name, init)),
            TargetType::Explicit(ty) => {
                lines.push(format!("self._{}:{} = {}", param.name, ty, init))
            }
        }
    }
    if options.override_style == OverrideStyle::BulkMerge {
        lines.push("# Handle parameters that are set in instantiation".to_string());
        lines.push("self.__dict__.update(kwargs)".to_string());
    }
    Ok(lines.join("\n"))
}

/// One read-only property per distinct parameter name, first occurrence order.
pub fn render_accessors(program: &Program, decl: DeclId, options: &EmitOptions) -> String {
    let mut seen = HashSet::new();
    let indent = options.indent_str(1);
    let marker = if options.pylint_markers {
        " # pylint: disable=no-member"
    } else {
        ""
    };
    let mut getters = Vec::new();
    for pid in program.decls.all_parameters(decl) {
        let name = program.decls.param(pid).name.as_str();
        if !seen.insert(name) {
            continue;
        }
        getters.push(format!(
            "@property\ndef {name}(self):\n{indent}return self._{name}{marker}\n"
        ));
    }
    getters.join("\n")
}

pub fn emit_reactor_parameter_code<T: Target + ?Sized>(
    program: &Program,
    target: &T,
    decl: DeclId,
    options: &EmitOptions,
) -> Result<ReactorParameterCode, ParamError> {
    Ok(ReactorParameterCode {
        skeleton: render_default_skeleton(program, target, decl, options)?,
        accessors: render_accessors(program, decl, options),
    })
}

// ── Instance tier ───────────────────────────────────────────────────────────

pub fn render_resolved_initializer<T: Target + ?Sized>(
    program: &Program,
    target: &T,
    pi: ParameterInstance,
    options: &EmitOptions,
) -> Result<String, ParamError> {
    let terms = Resolver::new(program, target).resolve(pi)?;
    let texts: Vec<String> = terms.iter().map(ToString::to_string).collect();
    render_sequence(&texts, &options.separator).ok_or_else(|| {
        let param = program.decls.param(pi.param);
        ParamError::EmptyInitializer {
            param: param.name.clone(),
            origin: InitializerOrigin::Default,
            span: param.span,
        }
    })
}

/// Resolved initializers for every instance of the subtree rooted at `root`,
/// in pre-order. Errors are collected; the failing parameter is left out.
pub fn emit_instance_override_map<T: Target + ?Sized>(
    program: &Program,
    target: &T,
    root: InstId,
    options: &EmitOptions,
) -> OverrideMapResult {
    let resolver = Resolver::new(program, target);
    let mut maps = Vec::new();
    let mut diagnostics = Vec::new();
    for inst in program.tree.subtree(root) {
        let mut entries = Vec::new();
        for pi in program.tree.parameter_instances(&program.decls, inst) {
            let resolved = resolver.resolve_with_origin(pi).and_then(|r| {
                let texts: Vec<String> = r.terms.iter().map(ToString::to_string).collect();
                let text = render_sequence(&texts, &options.separator).ok_or_else(|| {
                    ParamError::EmptyInitializer {
                        param: program.decls.param(pi.param).name.clone(),
                        origin: r.origin,
                        span: program.decls.param(pi.param).span,
                    }
                })?;
                Ok((text, r))
            });
            match resolved {
                Ok((text, r)) => entries.push(OverrideEntry {
                    param: pi.param,
                    name: program.decls.param(pi.param).name.clone(),
                    text,
                    origin: r.origin,
                    reads_parameters: r.reads_parameters,
                }),
                Err(e) => diagnostics.push(e.to_diagnostic()),
            }
        }
        maps.push(InstanceOverrides {
            instance: inst,
            path: target.path_to(&program.tree, inst),
            entries,
        });
    }
    OverrideMapResult { maps, diagnostics }
}

/// Python class name for a declaration.
pub fn class_name(program: &Program, decl: DeclId) -> String {
    format!("_{}", program.decls.decl(decl).name)
}

/// Statements that construct one instance and hand it its overrides.
pub fn render_construction(
    program: &Program,
    overrides: &InstanceOverrides,
    options: &EmitOptions,
) -> String {
    let decl = program.tree.get(overrides.instance).decl;
    let class = class_name(program, decl);
    match options.override_style {
        OverrideStyle::Targeted => {
            // Overrides land before any default that reads them.
            let (overridden, derived): (Vec<&OverrideEntry>, Vec<&OverrideEntry>) = overrides
                .entries
                .iter()
                .filter(|e| e.needs_injection())
                .partition(|e| e.origin == InitializerOrigin::Override);
            let mut lines = vec![format!("{} = {}()", overrides.path, class)];
            for entry in overridden.into_iter().chain(derived) {
                lines.push(format!("{}._{} = {}", overrides.path, entry.name, entry.text));
            }
            lines.join("\n")
        }
        OverrideStyle::BulkMerge => {
            // A default that reads another parameter names the instance being
            // built, so it can only be assigned once the instance exists.
            let (deferred, kwargs): (Vec<&OverrideEntry>, Vec<&OverrideEntry>) = overrides
                .distinct_entries()
                .into_iter()
                .partition(|e| e.origin == InitializerOrigin::Default && e.reads_parameters);
            let kwargs: Vec<String> = kwargs
                .iter()
                .map(|e| format!("_{}={}", e.name, e.text))
                .collect();
            let mut lines = vec![format!(
                "{} = {}({})",
                overrides.path,
                class,
                kwargs.join(", ")
            )];
            for entry in deferred {
                lines.push(format!("{}._{} = {}", overrides.path, entry.name, entry.text));
            }
            lines.join("\n")
        }
    }
}

// ── Whole module ────────────────────────────────────────────────────────────

/// Render every reactor class followed by the construction of the instance
/// tree. `header` lines are emitted first as comments.
pub fn render_module<T: Target + ?Sized>(
    program: &Program,
    target: &T,
    header: &[String],
) -> ModuleResult {
    let mut ctx = EmitCtx::new(program, target);
    ctx.emit_header(header);
    ctx.emit_classes();
    ctx.emit_instances();
    ctx.build_result()
}

struct EmitCtx<'a, T: Target + ?Sized> {
    program: &'a Program,
    target: &'a T,
    options: &'a EmitOptions,
    out: String,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, T: Target + ?Sized> EmitCtx<'a, T> {
    fn new(program: &'a Program, target: &'a T) -> Self {
        EmitCtx {
            program,
            target,
            options: &program.options,
            out: String::with_capacity(4096),
            diagnostics: Vec::new(),
        }
    }

    fn emit_header(&mut self, header: &[String]) {
        for line in header {
            let _ = writeln!(self.out, "# {}", line);
        }
        if !header.is_empty() {
            self.out.push('\n');
        }
    }

    fn emit_classes(&mut self) {
        for decl in self.program.decls.decls() {
            match emit_reactor_parameter_code(self.program, self.target, decl.id, self.options) {
                Ok(code) => self.emit_class(decl.id, &code),
                Err(e) => self.diagnostics.push(e.to_diagnostic()),
            }
        }
    }

    fn emit_class(&mut self, decl: DeclId, code: &ReactorParameterCode) {
        debug!(reactor = %self.program.decls.decl(decl).name, "emitting class");
        let one = self.options.indent_str(1);
        let two = self.options.indent_str(2);
        let _ = writeln!(self.out, "class {}:", class_name(self.program, decl));
        let signature = match self.options.override_style {
            OverrideStyle::Targeted => "def __init__(self):",
            OverrideStyle::BulkMerge => "def __init__(self, **kwargs):",
        };
        let _ = writeln!(self.out, "{}{}", one, signature);
        write_indented(&mut self.out, &code.skeleton, &two);
        let has_statement = code.skeleton.lines().any(|l| !l.trim_start().starts_with('#'));
        if !has_statement {
            let _ = writeln!(self.out, "{}pass", two);
        }
        if !code.accessors.is_empty() {
            self.out.push('\n');
            write_indented(&mut self.out, code.accessors.trim_end(), &one);
        }
        self.out.push('\n');
    }

    fn emit_instances(&mut self) {
        let Some(root) = self.program.tree.root() else {
            return;
        };
        let result = emit_instance_override_map(self.program, self.target, root, self.options);
        self.diagnostics.extend(result.diagnostics);
        self.out.push_str("# Instantiate reactors\n");
        for overrides in &result.maps {
            let text = render_construction(self.program, overrides, self.options);
            self.out.push_str(&text);
            self.out.push('\n');
        }
    }

    fn build_result(self) -> ModuleResult {
        ModuleResult {
            source: self.out,
            diagnostics: self.diagnostics,
        }
    }
}

fn write_indented(out: &mut String, text: &str, indent: &str) {
    for line in text.lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "{}{}", indent, line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Span, Value};
    use crate::instance::Assignment;
    use crate::target::PythonTarget;

    #[test]
    fn sequence_arity() {
        assert_eq!(render_sequence::<&str>(&[], ", "), None);
        assert_eq!(render_sequence(&["5"], ", ").as_deref(), Some("5"));
        assert_eq!(render_sequence(&["1", "2"], ", ").as_deref(), Some("(1, 2)"));
        assert_eq!(render_sequence(&["1", "2", "3"], ",").as_deref(), Some("(1,2,3)"));
    }

    fn foo_program() -> (Program, DeclId) {
        let mut program = Program::default();
        let foo = program.decls.add_reactor("Foo", Span::default());
        program
            .decls
            .add_parameter(foo, "p", Some("int".into()), vec![Value::int(5)], Span::default());
        program.decls.add_parameter(
            foo,
            "pair",
            None,
            vec![Value::float(0.5), Value::string("x")],
            Span::default(),
        );
        (program, foo)
    }

    #[test]
    fn skeleton_targeted_has_no_merge() {
        let (program, foo) = foo_program();
        let text =
            render_default_skeleton(&program, &PythonTarget, foo, &EmitOptions::default()).unwrap();
        assert_eq!(
            text,
            "# Define parameters and their default values\n\
             self._p:int = 5\n\
             self._pair = (0.5, \"x\")"
        );
    }

    #[test]
    fn skeleton_bulk_merge_ends_with_update() {
        let (program, foo) = foo_program();
        let options = EmitOptions {
            override_style: OverrideStyle::BulkMerge,
            ..EmitOptions::default()
        };
        let text = render_default_skeleton(&program, &PythonTarget, foo, &options).unwrap();
        assert!(text.ends_with(
            "# Handle parameters that are set in instantiation\nself.__dict__.update(kwargs)"
        ));
    }

    #[test]
    fn skeleton_rejects_empty_default() {
        let (mut program, foo) = foo_program();
        program
            .decls
            .add_parameter(foo, "hollow", None, Vec::new(), Span::new(8, 14));
        let err = render_default_skeleton(&program, &PythonTarget, foo, &EmitOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            ParamError::EmptyInitializer {
                param: "hollow".into(),
                origin: InitializerOrigin::Default,
                span: Span::new(8, 14),
            }
        );
    }

    #[test]
    fn accessors_deduplicate_by_name() {
        let (mut program, foo) = foo_program();
        program
            .decls
            .add_parameter(foo, "p", None, vec![Value::int(6)], Span::default());
        let text = render_accessors(&program, foo, &EmitOptions::default());
        assert_eq!(text.matches("def p(self):").count(), 1);
        assert_eq!(
            text,
            "@property\ndef p(self):\n    return self._p # pylint: disable=no-member\n\n\
             @property\ndef pair(self):\n    return self._pair # pylint: disable=no-member\n"
        );
    }

    #[test]
    fn accessors_without_markers() {
        let (program, foo) = foo_program();
        let options = EmitOptions {
            pylint_markers: false,
            indent: 2,
            ..EmitOptions::default()
        };
        let text = render_accessors(&program, foo, &options);
        assert!(text.starts_with("@property\ndef p(self):\n  return self._p\n"));
    }

    #[test]
    fn end_to_end_foo_bar_baz() {
        let mut program = Program::default();
        let d = &mut program.decls;
        let main = d.add_reactor("Main", Span::default());
        let mid = d.add_reactor("Mid", Span::default());
        let parent_param = d.add_parameter(mid, "parentParam", None, vec![Value::int(1)], Span::default());
        let foo = d.add_reactor("Foo", Span::default());
        let p = d.add_parameter(foo, "p", Some("int".into()), vec![Value::int(5)], Span::default());
        let t = &mut program.tree;
        let root = t.add_root("main", main, Span::default());
        let mid_inst = t.add_child(root, "mid", mid, Vec::new(), Span::default());
        let bar = t.add_child(mid_inst, "bar", foo, Vec::new(), Span::default());
        let baz = t.add_child(
            mid_inst,
            "baz",
            foo,
            vec![Assignment::new(p, vec![Value::param(parent_param)])],
            Span::default(),
        );
        let opts = EmitOptions::default();
        let bar_text =
            render_resolved_initializer(&program, &PythonTarget, ParameterInstance::new(p, bar), &opts)
                .unwrap();
        let baz_text =
            render_resolved_initializer(&program, &PythonTarget, ParameterInstance::new(p, baz), &opts)
                .unwrap();
        assert_eq!(bar_text, "5");
        assert_eq!(baz_text, "main_mid_lf.parentParam");

        let result = emit_instance_override_map(&program, &PythonTarget, root, &opts);
        assert!(result.diagnostics.is_empty());
        let paths: Vec<_> = result.maps.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["main_lf", "main_mid_lf", "main_mid_bar_lf", "main_mid_baz_lf"]);
        assert_eq!(result.maps[3].get("p"), Some("main_mid_lf.parentParam"));

        assert_eq!(
            render_construction(&program, &result.maps[2], &opts),
            "main_mid_bar_lf = _Foo()"
        );
        assert_eq!(
            render_construction(&program, &result.maps[3], &opts),
            "main_mid_baz_lf = _Foo()\nmain_mid_baz_lf._p = main_mid_lf.parentParam"
        );
        let bulk = EmitOptions {
            override_style: OverrideStyle::BulkMerge,
            ..EmitOptions::default()
        };
        assert_eq!(
            render_construction(&program, &result.maps[2], &bulk),
            "main_mid_bar_lf = _Foo(_p=5)"
        );
    }

    #[test]
    fn override_map_collects_errors_and_continues() {
        let mut program = Program::default();
        let d = &mut program.decls;
        let top = d.add_reactor("Top", Span::default());
        let x = d.add_parameter(top, "x", None, vec![Value::int(1)], Span::default());
        let leaf = d.add_reactor("Leaf", Span::default());
        let a = d.add_parameter(leaf, "a", None, vec![Value::int(1)], Span::default());
        let b = d.add_parameter(leaf, "b", None, vec![Value::int(2)], Span::default());
        let root = program.tree.add_root("main", top, Span::default());
        // The root has no enclosing instance to forward from.
        program
            .tree
            .add_assignment(root, Assignment::new(x, vec![Value::param(x)]));
        program.tree.add_child(
            root,
            "leaf",
            leaf,
            vec![
                Assignment::new(a, vec![Value::param(x)]),
                Assignment::new(b, Vec::new()),
            ],
            Span::default(),
        );
        let result =
            emit_instance_override_map(&program, &PythonTarget, root, &EmitOptions::default());
        assert_eq!(result.diagnostics.len(), 2);
        assert_eq!(result.maps.len(), 2);
        assert!(result.maps[0].entries.is_empty());
        assert_eq!(result.maps[1].entries.len(), 1);
        assert_eq!(result.maps[1].get("a"), Some("main_lf.x"));
    }

    #[test]
    fn targeted_applies_overrides_before_dependent_defaults() {
        let mut program = Program::default();
        let d = &mut program.decls;
        let main = d.add_reactor("Main", Span::default());
        let cluster = d.add_reactor("Cluster", Span::default());
        let limit = d.add_parameter(cluster, "limit", None, Vec::new(), Span::default());
        let size = d.add_parameter(cluster, "size", None, vec![Value::int(4)], Span::default());
        d.set_default(limit, vec![Value::param(size)]);
        let root = program.tree.add_root("main", main, Span::default());
        program.tree.add_child(
            root,
            "c",
            cluster,
            vec![Assignment::new(size, vec![Value::int(8)])],
            Span::default(),
        );
        let opts = EmitOptions::default();
        let result = emit_instance_override_map(&program, &PythonTarget, root, &opts);
        assert_eq!(
            render_construction(&program, &result.maps[1], &opts),
            "main_c_lf = _Cluster()\n\
             main_c_lf._size = 8\n\
             main_c_lf._limit = main_c_lf.size"
        );
        let bulk = EmitOptions {
            override_style: OverrideStyle::BulkMerge,
            ..EmitOptions::default()
        };
        assert_eq!(
            render_construction(&program, &result.maps[1], &bulk),
            "main_c_lf = _Cluster(_size=8)\nmain_c_lf._limit = main_c_lf.size"
        );
    }

    #[test]
    fn distinct_entries_keep_last_duplicate() {
        let o = InstanceOverrides {
            instance: InstId(0),
            path: "main_lf".into(),
            entries: ["x", "y", "x"]
                .iter()
                .enumerate()
                .map(|(i, n)| OverrideEntry {
                    param: ParamId(i as u32),
                    name: n.to_string(),
                    text: i.to_string(),
                    origin: InitializerOrigin::Default,
                    reads_parameters: false,
                })
                .collect(),
        };
        let names: Vec<_> = o
            .distinct_entries()
            .iter()
            .map(|e| (e.name.as_str(), e.text.as_str()))
            .collect();
        assert_eq!(names, vec![("y", "1"), ("x", "2")]);
        assert_eq!(o.get("x"), Some("2"));
    }
}
