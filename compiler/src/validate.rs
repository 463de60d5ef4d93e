// validate.rs — Whole-program checks run before emission
//
// Reports every problem of a compilation unit in one batch: duplicate
// parameter names (advisory), empty initializers, forwarded references on
// the root (no enclosing scope to read from), and forwarded references to
// parameters the instantiating reactor does not declare (advisory).

use tracing::warn;

use crate::diag::{codes, Diagnostic};
use crate::error::{InitializerOrigin, ParamError};
use crate::model::Program;
use crate::resolve::FORWARD_DEPTH;

pub fn validate(program: &Program) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    check_declarations(program, &mut diagnostics);
    check_assignments(program, &mut diagnostics);
    diagnostics
}

fn check_declarations(program: &Program, diagnostics: &mut Vec<Diagnostic>) {
    let decls = &program.decls;
    for decl in decls.decls() {
        for (first, second) in decls.duplicate_names(decl.id) {
            let name = decls.param(second).name.clone();
            warn!(reactor = %decl.name, %name, "duplicate parameter name");
            diagnostics.push(
                ParamError::AmbiguousName {
                    reactor: decl.name.clone(),
                    name,
                    first: decls.param(first).span,
                    second: decls.param(second).span,
                }
                .to_diagnostic(),
            );
        }
        for &pid in &decl.params {
            let param = decls.param(pid);
            if param.default.is_empty() {
                diagnostics.push(
                    ParamError::EmptyInitializer {
                        param: param.name.clone(),
                        origin: InitializerOrigin::Default,
                        span: param.span,
                    }
                    .to_diagnostic(),
                );
            }
        }
    }
}

fn check_assignments(program: &Program, diagnostics: &mut Vec<Diagnostic>) {
    let Some(root) = program.tree.root() else {
        return;
    };
    let decls = &program.decls;
    for inst in program.tree.subtree(root) {
        let node = program.tree.get(inst);
        let scope = program.tree.ancestor(inst, FORWARD_DEPTH);
        for assignment in &node.assignments {
            let lhs_name = &decls.param(assignment.lhs).name;
            if assignment.rhs.is_empty() {
                diagnostics.push(
                    ParamError::EmptyInitializer {
                        param: lhs_name.clone(),
                        origin: InitializerOrigin::Override,
                        span: assignment.span,
                    }
                    .to_diagnostic(),
                );
                continue;
            }
            for referenced in assignment.rhs.iter().filter_map(|v| v.as_param_ref()) {
                let Some(scope) = scope else {
                    diagnostics.push(
                        ParamError::UnboundScope {
                            param: lhs_name.clone(),
                            instance: node.name.clone(),
                            span: assignment.span,
                        }
                        .to_diagnostic(),
                    );
                    break;
                };
                let scope_decl = program.tree.get(scope).decl;
                if !decls.all_parameters(scope_decl).contains(&referenced) {
                    let referenced = decls.param(referenced);
                    warn!(instance = %node.name, param = %referenced.name, "foreign forward");
                    diagnostics.push(
                        Diagnostic::warning(
                            codes::W0302_FOREIGN_FORWARD,
                            assignment.span,
                            format!(
                                "`{}` forwards `{}.{}`, which reactor `{}` does not declare",
                                node.name,
                                decls.decl(referenced.decl).name,
                                referenced.name,
                                decls.decl(scope_decl).name,
                            ),
                        )
                        .with_related(referenced.span, "parameter declared here"),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Span, Value};
    use crate::diag::{has_errors, DiagLevel};
    use crate::instance::Assignment;

    #[test]
    fn clean_program_has_no_diagnostics() {
        let mut program = Program::default();
        let main = program.decls.add_reactor("Main", Span::default());
        let x = program
            .decls
            .add_parameter(main, "x", None, vec![Value::int(1)], Span::default());
        let leaf = program.decls.add_reactor("Leaf", Span::default());
        let p = program
            .decls
            .add_parameter(leaf, "p", None, vec![Value::int(2)], Span::default());
        let root = program.tree.add_root("main", main, Span::default());
        let mid = program.tree.add_child(
            root,
            "mid",
            leaf,
            vec![Assignment::new(p, vec![Value::param(x)])],
            Span::default(),
        );
        program.tree.add_child(
            mid,
            "leaf",
            leaf,
            vec![Assignment::new(p, vec![Value::param(p)])],
            Span::default(),
        );
        assert!(validate(&program).is_empty());
    }

    #[test]
    fn reports_every_problem() {
        let mut program = Program::default();
        let main = program.decls.add_reactor("Main", Span::default());
        let leaf = program.decls.add_reactor("Leaf", Span::default());
        let p = program
            .decls
            .add_parameter(leaf, "p", None, vec![Value::int(2)], Span::default());
        program
            .decls
            .add_parameter(leaf, "p", None, vec![Value::int(3)], Span::default());
        program
            .decls
            .add_parameter(leaf, "hollow", None, Vec::new(), Span::default());
        let x = program
            .decls
            .add_parameter(main, "x", None, vec![Value::int(1)], Span::default());
        let root = program.tree.add_root("main", main, Span::default());
        program
            .tree
            .add_assignment(root, Assignment::new(x, vec![Value::param(x)]));
        program.tree.add_child(
            root,
            "leaf",
            leaf,
            vec![
                Assignment::new(p, Vec::new()),
                Assignment::new(p, vec![Value::param(p)]),
            ],
            Span::default(),
        );

        let diags = validate(&program);
        let found: Vec<_> = diags.iter().filter_map(|d| d.code).collect();
        assert_eq!(
            found,
            vec![
                codes::W0301_AMBIGUOUS_NAME,
                codes::E0202_EMPTY_INITIALIZER,
                codes::E0201_UNBOUND_SCOPE,
                codes::E0202_EMPTY_INITIALIZER,
                codes::W0302_FOREIGN_FORWARD,
            ]
        );
        assert!(has_errors(&diags));
        assert_eq!(diags[0].level, DiagLevel::Warning);
    }
}
