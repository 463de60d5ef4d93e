// dump.rs — Inspection output: instance tree listing and override-map JSON
//
// Preconditions: `program` is loaded.
// Postconditions: output is deterministic for a given program.
// Failure modes: none (pure string formatting; resolution errors are returned
//                as diagnostics next to the JSON).
// Side effects: none.

use std::fmt::Write;

use serde_json::{Map, Value as Json};

use crate::diag::Diagnostic;
use crate::emit::emit_instance_override_map;
use crate::model::Program;
use crate::target::{Scope, Target};

/// Indented listing of the instantiation tree with each override site.
pub fn render_tree<T: Target + ?Sized>(program: &Program, target: &T) -> String {
    let mut buf = String::new();
    let Some(root) = program.tree.root() else {
        return buf;
    };
    for inst in program.tree.subtree(root) {
        let node = program.tree.get(inst);
        let pad = "  ".repeat(program.tree.depth(inst));
        let reactor = &program.decls.decl(node.decl).name;
        let _ = writeln!(buf, "{pad}{} : {reactor}", node.name);
        for a in &node.assignments {
            let rhs: Vec<String> = a
                .rhs
                .iter()
                .map(|v| match v.as_param_ref() {
                    Some(p) => format!("<{}>", program.decls.param(p).name),
                    None => target.serialize(program, v, Scope::Instance(inst)),
                })
                .collect();
            let _ = writeln!(
                buf,
                "{pad}  .{} = {}",
                program.decls.param(a.lhs).name,
                rhs.join(", ")
            );
        }
    }
    buf
}

/// `{instance_path: {parameter: initializer_text}}` for the whole tree.
pub fn overrides_json<T: Target + ?Sized>(
    program: &Program,
    target: &T,
) -> (String, Vec<Diagnostic>) {
    let Some(root) = program.tree.root() else {
        return ("{}".to_string(), Vec::new());
    };
    let result = emit_instance_override_map(program, target, root, &program.options);
    let mut top = Map::new();
    for overrides in &result.maps {
        let mut entries = Map::new();
        for entry in overrides.distinct_entries() {
            entries.insert(entry.name.clone(), Json::String(entry.text.clone()));
        }
        top.insert(overrides.path.clone(), Json::Object(entries));
    }
    let text = serde_json::to_string_pretty(&Json::Object(top)).unwrap_or_default();
    (text, result.diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Span, Value};
    use crate::instance::Assignment;
    use crate::target::PythonTarget;

    fn program() -> Program {
        let mut program = Program::default();
        let main = program.decls.add_reactor("Main", Span::default());
        program
            .decls
            .add_parameter(main, "rate", None, vec![Value::int(10)], Span::default());
        let src = program.decls.add_reactor("Source", Span::default());
        let period = program
            .decls
            .add_parameter(src, "period", None, vec![Value::int(1)], Span::default());
        let root = program.tree.add_root("main", main, Span::default());
        let mid = program.tree.add_child(root, "mid", src, Vec::new(), Span::default());
        program.tree.add_child(
            mid,
            "s",
            src,
            vec![Assignment::new(period, vec![Value::param(period), Value::int(3)])],
            Span::default(),
        );
        program
    }

    #[test]
    fn tree_listing() {
        let text = render_tree(&program(), &PythonTarget);
        assert_eq!(
            text,
            "main : Main\n  mid : Source\n    s : Source\n      .period = <period>, 3\n"
        );
    }

    #[test]
    fn override_json_by_path() {
        let (text, diags) = overrides_json(&program(), &PythonTarget);
        assert!(diags.is_empty());
        let parsed: Json = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["main_lf"]["rate"], "10");
        assert_eq!(parsed["main_mid_lf"]["period"], "1");
        assert_eq!(parsed["main_mid_s_lf"]["period"], "(main_mid_lf.period, 3)");
    }
}
