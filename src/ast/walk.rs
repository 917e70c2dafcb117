//! Read-only traversal helpers over statement blocks.

use super::{AstExpr, Line, Stmt};

/// A call found in a statement or expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallSite<'a> {
    pub name: &'a str,
    pub args: &'a [AstExpr],
    pub line: Line,
    /// `true` when the call is part of an expression, e.g. `return F(n-1) + F(n-2)`.
    pub in_expr: bool,
}

/// Whether any statement in `body`, at any depth, satisfies `pred`.
pub fn any_stmt(body: &[Stmt], pred: &mut dyn FnMut(&Stmt) -> bool) -> bool {
    body.iter().any(|stmt| {
        if pred(stmt) {
            return true;
        }
        stmt.blocks().into_iter().any(|block| any_stmt(block, pred))
    })
}

pub fn contains_loop(body: &[Stmt]) -> bool {
    any_stmt(body, &mut |stmt| stmt.is_loop())
}

/// Maximum loop nesting depth of `body`, counting only loops accepted by
/// `counts`.
pub fn loop_depth_with(body: &[Stmt], counts: &dyn Fn(&Stmt) -> bool) -> usize {
    body.iter()
        .map(|stmt| {
            let inner = stmt
                .blocks()
                .into_iter()
                .map(|block| loop_depth_with(block, counts))
                .max()
                .unwrap_or(0);
            if stmt.is_loop() && counts(stmt) {
                inner + 1
            } else {
                inner
            }
        })
        .max()
        .unwrap_or(0)
}

pub fn loop_depth(body: &[Stmt]) -> usize {
    loop_depth_with(body, &|_| true)
}

/// Calls made in `expr`, outermost first.
pub fn calls_in_expr<'a>(expr: &'a AstExpr, line: Line, out: &mut Vec<CallSite<'a>>) {
    match expr {
        AstExpr::Number { .. } | AstExpr::Bool { .. } | AstExpr::Null | AstExpr::Ident { .. } => {}
        AstExpr::Binary { lhs, rhs, .. } => {
            calls_in_expr(lhs, line, out);
            calls_in_expr(rhs, line, out);
        }
        AstExpr::Unary { operand, .. } => calls_in_expr(operand, line, out),
        AstExpr::Call { name, args } => {
            out.push(CallSite {
                name,
                args,
                line,
                in_expr: true,
            });
            args.iter().for_each(|a| calls_in_expr(a, line, out));
        }
        AstExpr::Index { array, index } => {
            calls_in_expr(array, line, out);
            calls_in_expr(index, line, out);
        }
    }
}

/// Calls made by the statement itself, not by its nested blocks.
pub fn calls_in_stmt(stmt: &Stmt) -> Vec<CallSite<'_>> {
    let mut out = Vec::new();
    if let Stmt::Call {
        name, args, line, ..
    } = stmt
    {
        out.push(CallSite {
            name,
            args,
            line: *line,
            in_expr: false,
        });
    }
    for expr in stmt.own_exprs() {
        calls_in_expr(expr, stmt.line(), &mut out);
    }
    out
}

/// Every call in `body`, at any depth, in source order.
pub fn calls_in_body(body: &[Stmt]) -> Vec<CallSite<'_>> {
    let mut out = Vec::new();
    for stmt in body {
        out.extend(calls_in_stmt(stmt));
        for block in stmt.blocks() {
            out.extend(calls_in_body(block));
        }
    }
    out
}

/// Statements of `body` at any depth, in pre-order.
pub fn flatten(body: &[Stmt]) -> Vec<&Stmt> {
    let mut out = Vec::new();
    for stmt in body {
        out.push(stmt);
        for block in stmt.blocks() {
            out.extend(flatten(block));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinOp;

    fn other(line: Line) -> Stmt {
        Stmt::Other { line, text: None }
    }

    fn for_loop(line: Line, body: Vec<Stmt>) -> Stmt {
        Stmt::For {
            line,
            var: "i".into(),
            start: AstExpr::number(1),
            end: AstExpr::ident("n"),
            step: None,
            downto: false,
            body,
        }
    }

    #[test]
    fn loop_depth_counts_nesting() {
        let body = vec![for_loop(1, vec![for_loop(2, vec![other(3)])]), other(4)];
        assert_eq!(loop_depth(&body), 2);
        assert_eq!(loop_depth(&[other(1)]), 0);
        assert!(contains_loop(&body));
    }

    #[test]
    fn finds_calls_inside_expressions() {
        let fib = |offset| {
            AstExpr::call(
                "Fib",
                vec![AstExpr::binary(
                    BinOp::Sub,
                    AstExpr::ident("n"),
                    AstExpr::number(offset),
                )],
            )
        };
        let body = vec![Stmt::Return {
            line: 4,
            value: Some(AstExpr::binary(BinOp::Add, fib(1), fib(2))),
        }];
        let calls = calls_in_body(&body);
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.name == "Fib" && c.in_expr && c.line == 4));
    }
}
