// target.rs — Target-language collaborators: value serializer, type resolver,
// accessor-path builder
//
// The resolver and emitter only see the three traits. `PythonTarget` is the
// implementation for the Python target.
//
// Preconditions: values passed in refer to parameters and instances that exist
//   in the given `Program`.
// Postconditions: all functions are total and deterministic.
// Failure modes: none.
// Side effects: none.

use std::fmt::Write as _;

use crate::ast::{Literal, Value};
use crate::decl::Parameter;
use crate::id::InstId;
use crate::instance::InstanceTree;
use crate::model::Program;

// ── Interfaces ──────────────────────────────────────────────────────────────

/// Where a term is rendered: inside a declaration's class body, or at a
/// concrete instance of the instantiation tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Declaration,
    Instance(InstId),
}

/// Resolved target type of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetType {
    Explicit(String),
    NoExplicitType,
}

pub trait ValueSerializer {
    /// Render one initializer term in `scope`.
    fn serialize(&self, program: &Program, value: &Value, scope: Scope) -> String;
}

pub trait TypeResolver {
    fn target_type(&self, param: &Parameter) -> TargetType;
}

pub trait AccessorPaths {
    /// Expression that evaluates to the generated object for `inst`.
    fn path_to(&self, tree: &InstanceTree, inst: InstId) -> String;
}

/// Everything the engine needs from a target language.
pub trait Target: ValueSerializer + TypeResolver + AccessorPaths {}

impl<T: ValueSerializer + TypeResolver + AccessorPaths> Target for T {}

// ── Python ──────────────────────────────────────────────────────────────────

/// Python target. Time values become integer nanoseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonTarget;

impl ValueSerializer for PythonTarget {
    fn serialize(&self, program: &Program, value: &Value, scope: Scope) -> String {
        match value {
            Value::Literal(lit) => python_literal(lit),
            Value::Time(t) => t.to_nanos().to_string(),
            Value::ParamRef(id) => {
                let name = &program.decls.param(*id).name;
                match scope {
                    Scope::Declaration => format!("self._{}", name),
                    Scope::Instance(inst) => {
                        format!("{}.{}", self.path_to(&program.tree, inst), name)
                    }
                }
            }
        }
    }
}

impl TypeResolver for PythonTarget {
    fn target_type(&self, param: &Parameter) -> TargetType {
        let Some(declared) = param.declared_type.as_deref() else {
            return TargetType::NoExplicitType;
        };
        let declared = declared.trim();
        if declared.is_empty() {
            return TargetType::NoExplicitType;
        }
        if declared.ends_with("[]") {
            return TargetType::Explicit("list".to_string());
        }
        let py = match declared {
            "int" | "long" | "time" => "int",
            "float" | "double" => "float",
            "bool" => "bool",
            "string" | "str" => "str",
            other => other,
        };
        TargetType::Explicit(py.to_string())
    }
}

impl AccessorPaths for PythonTarget {
    fn path_to(&self, tree: &InstanceTree, inst: InstId) -> String {
        format!("{}_lf", tree.names_from_root(inst).join("_"))
    }
}

fn python_literal(lit: &Literal) -> String {
    match lit {
        Literal::Int(v) => v.to_string(),
        Literal::Float(v) => python_float(*v),
        Literal::Bool(true) => "True".to_string(),
        Literal::Bool(false) => "False".to_string(),
        Literal::Str(s) => python_string(s),
        Literal::Code(code) => code.clone(),
    }
}

fn python_float(v: f64) -> String {
    if v.is_nan() {
        "float(\"nan\")".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "float(\"inf\")".to_string()
        } else {
            "float(\"-inf\")".to_string()
        }
    } else {
        // `{:?}` always keeps a decimal point or exponent: 2.0, 1e-7.
        format!("{:?}", v)
    }
}

fn python_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Span, TimeUnit, TimeValue};
    use crate::id::{DeclId, ParamId};

    fn param_with_type(ty: Option<&str>) -> Parameter {
        Parameter {
            id: ParamId(0),
            decl: DeclId(0),
            name: "p".to_string(),
            declared_type: ty.map(str::to_string),
            default: vec![Value::int(0)],
            span: Span::default(),
        }
    }

    #[test]
    fn literals_render_as_python() {
        assert_eq!(python_literal(&Literal::Int(-3)), "-3");
        assert_eq!(python_literal(&Literal::Float(2.0)), "2.0");
        assert_eq!(python_literal(&Literal::Float(1e-7)), "1e-7");
        assert_eq!(python_literal(&Literal::Float(f64::INFINITY)), "float(\"inf\")");
        assert_eq!(python_literal(&Literal::Bool(true)), "True");
        assert_eq!(python_literal(&Literal::Str("a\"b\n".into())), "\"a\\\"b\\n\"");
        assert_eq!(python_literal(&Literal::Code("[1, 2]".into())), "[1, 2]");
    }

    #[test]
    fn time_values_render_as_nanoseconds() {
        let mut program = Program::default();
        let decl = program.decls.add_reactor("R", Span::default());
        let root = program.tree.add_root("main", decl, Span::default());
        let v = Value::Time(TimeValue::new(5, TimeUnit::Msec));
        assert_eq!(
            PythonTarget.serialize(&program, &v, Scope::Instance(root)),
            "5000000"
        );
    }

    #[test]
    fn param_refs_depend_on_scope() {
        let mut program = Program::default();
        let decl = program.decls.add_reactor("R", Span::default());
        let p = program
            .decls
            .add_parameter(decl, "rate", None, vec![Value::int(1)], Span::default());
        let root = program.tree.add_root("main", decl, Span::default());
        let child = program
            .tree
            .add_child(root, "src", decl, Vec::new(), Span::default());
        let v = Value::param(p);
        assert_eq!(
            PythonTarget.serialize(&program, &v, Scope::Declaration),
            "self._rate"
        );
        assert_eq!(
            PythonTarget.serialize(&program, &v, Scope::Instance(child)),
            "main_src_lf.rate"
        );
    }

    #[test]
    fn type_mapping() {
        let t = PythonTarget;
        assert_eq!(t.target_type(&param_with_type(None)), TargetType::NoExplicitType);
        assert_eq!(t.target_type(&param_with_type(Some("  "))), TargetType::NoExplicitType);
        assert_eq!(
            t.target_type(&param_with_type(Some("time"))),
            TargetType::Explicit("int".into())
        );
        assert_eq!(
            t.target_type(&param_with_type(Some("double"))),
            TargetType::Explicit("float".into())
        );
        assert_eq!(
            t.target_type(&param_with_type(Some("int[]"))),
            TargetType::Explicit("list".into())
        );
        assert_eq!(
            t.target_type(&param_with_type(Some("numpy.ndarray"))),
            TargetType::Explicit("numpy.ndarray".into())
        );
    }
}
