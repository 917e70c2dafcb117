//! Algorithm-kind classifier.
//!
//! A pure structural check over the AST: loops anywhere in the program,
//! self-calls in the principal procedure. It never fails; a program
//! without a principal procedure is `Unknown`.

use crate::ast::{walk, Program};
use crate::core::AlgorithmKind;
use serde::Serialize;

/// The evidence behind an [`AlgorithmKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub kind: AlgorithmKind,
    pub procedure: Option<String>,
    pub has_loops: bool,
    pub self_calls: usize,
}

pub fn classify(program: &Program) -> AlgorithmKind {
    classify_detailed(program).kind
}

pub fn classify_detailed(program: &Program) -> Classification {
    let has_loops = program
        .procedures
        .iter()
        .any(|p| walk::contains_loop(&p.body));
    let principal = program.principal_procedure();
    let self_calls = principal.map_or(0, |p| p.self_calls().len());
    let kind = match (has_loops, self_calls > 0) {
        (true, true) => AlgorithmKind::Hybrid,
        (false, true) => AlgorithmKind::Recursive,
        (true, false) => AlgorithmKind::Iterative,
        (false, false) => AlgorithmKind::Unknown,
    };
    Classification {
        kind,
        procedure: principal.map(|p| p.name.clone()),
        has_loops,
        self_calls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstExpr, BinOp, Procedure, Stmt};

    fn program(body: Vec<Stmt>) -> Program {
        Program {
            procedures: vec![Procedure {
                name: "F".into(),
                params: vec!["n".into()],
                body,
                line: 1,
            }],
        }
    }

    fn for_loop() -> Stmt {
        Stmt::For {
            line: 2,
            var: "i".into(),
            start: AstExpr::number(1),
            end: AstExpr::ident("n"),
            step: None,
            downto: false,
            body: vec![Stmt::Other {
                line: 3,
                text: None,
            }],
        }
    }

    fn self_call() -> Stmt {
        Stmt::Call {
            line: 4,
            name: "F".into(),
            args: vec![AstExpr::binary(
                BinOp::Sub,
                AstExpr::ident("n"),
                AstExpr::number(1),
            )],
        }
    }

    #[test]
    fn kinds_follow_loops_and_self_calls() {
        assert_eq!(classify(&program(vec![for_loop()])), AlgorithmKind::Iterative);
        assert_eq!(classify(&program(vec![self_call()])), AlgorithmKind::Recursive);
        assert_eq!(
            classify(&program(vec![for_loop(), self_call()])),
            AlgorithmKind::Hybrid
        );
        assert_eq!(
            classify(&program(vec![Stmt::Return {
                line: 1,
                value: None
            }])),
            AlgorithmKind::Unknown
        );
    }

    #[test]
    fn self_calls_match_without_regard_to_case() {
        let lowercase_call = match self_call() {
            Stmt::Call { line, args, .. } => Stmt::Call {
                line,
                name: "f".into(),
                args,
            },
            other => other,
        };
        let detail = classify_detailed(&program(vec![lowercase_call]));
        assert_eq!(detail.kind, AlgorithmKind::Recursive);
        assert_eq!(detail.self_calls, 1);
    }

    #[test]
    fn empty_program_is_unknown() {
        let detail = classify_detailed(&Program { procedures: vec![] });
        assert_eq!(detail.kind, AlgorithmKind::Unknown);
        assert_eq!(detail.procedure, None);
    }

    #[test]
    fn classification_is_repeatable() {
        let p = program(vec![for_loop(), self_call()]);
        assert_eq!(classify_detailed(&p), classify_detailed(&p));
        assert_eq!(classify_detailed(&p).self_calls, 1);
    }
}
