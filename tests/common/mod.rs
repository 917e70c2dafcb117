// Test utility module for costmap integration tests
#![allow(dead_code)]

use costmap::ast::{AstExpr, BinOp, Procedure, Program, Stmt};
use std::path::{Path, PathBuf};

pub fn ident(name: &str) -> AstExpr {
    AstExpr::ident(name)
}

pub fn num(value: i64) -> AstExpr {
    AstExpr::number(value)
}

pub fn bin(op: BinOp, lhs: AstExpr, rhs: AstExpr) -> AstExpr {
    AstExpr::binary(op, lhs, rhs)
}

pub fn minus(lhs: AstExpr, k: i64) -> AstExpr {
    bin(BinOp::Sub, lhs, num(k))
}

pub fn assign(line: u32, target: &str, value: AstExpr) -> Stmt {
    Stmt::Assign {
        line,
        target: ident(target),
        value,
    }
}

pub fn for_loop(line: u32, var: &str, start: AstExpr, end: AstExpr, body: Vec<Stmt>) -> Stmt {
    Stmt::For {
        line,
        var: var.into(),
        start,
        end,
        step: None,
        downto: false,
        body,
    }
}

pub fn ret(line: u32, value: Option<AstExpr>) -> Stmt {
    Stmt::Return { line, value }
}

pub fn if_then(line: u32, cond: AstExpr, then_branch: Vec<Stmt>) -> Stmt {
    Stmt::If {
        line,
        cond,
        then_branch,
        else_branch: None,
    }
}

pub fn procedure(name: &str, params: &[&str], body: Vec<Stmt>) -> Procedure {
    Procedure {
        name: name.into(),
        params: params.iter().map(|p| p.to_string()).collect(),
        body,
        line: 1,
    }
}

pub fn single(procedure: Procedure) -> Program {
    Program {
        procedures: vec![procedure],
    }
}

/// `for i = 1 to n: s = s + A[i]`
pub fn summing_loop() -> Program {
    single(procedure(
        "Sum",
        &["A", "n"],
        vec![
            assign(1, "s", num(0)),
            for_loop(
                2,
                "i",
                num(1),
                ident("n"),
                vec![assign(
                    3,
                    "s",
                    bin(
                        BinOp::Add,
                        ident("s"),
                        AstExpr::index(ident("A"), ident("i")),
                    ),
                )],
            ),
            ret(4, Some(ident("s"))),
        ],
    ))
}

/// Two nested loops over `1..n`.
pub fn nested_loops() -> Program {
    single(procedure(
        "Pairs",
        &["n"],
        vec![
            assign(1, "c", num(0)),
            for_loop(
                2,
                "i",
                num(1),
                ident("n"),
                vec![for_loop(
                    3,
                    "j",
                    num(1),
                    ident("n"),
                    vec![assign(4, "c", bin(BinOp::Add, ident("c"), num(1)))],
                )],
            ),
            ret(5, Some(ident("c"))),
        ],
    ))
}

/// Linear search returning on the first match.
pub fn linear_search() -> Program {
    single(procedure(
        "Find",
        &["A", "n", "x"],
        vec![
            for_loop(
                1,
                "i",
                num(1),
                ident("n"),
                vec![if_then(
                    2,
                    bin(
                        BinOp::Eq,
                        AstExpr::index(ident("A"), ident("i")),
                        ident("x"),
                    ),
                    vec![ret(3, Some(ident("i")))],
                )],
            ),
            ret(4, Some(num(-1))),
        ],
    ))
}

fn base_case(line: u32, k: i64) -> Stmt {
    if_then(
        line,
        bin(BinOp::Le, ident("n"), num(k)),
        vec![ret(line + 1, Some(ident("n")))],
    )
}

pub fn fibonacci() -> Program {
    fibonacci_calling("Fib")
}

/// `Fib` whose recursive calls are spelled `callee`.
pub fn fibonacci_calling(callee: &str) -> Program {
    single(procedure(
        "Fib",
        &["n"],
        vec![
            base_case(2, 1),
            ret(
                4,
                Some(bin(
                    BinOp::Add,
                    AstExpr::call(callee, vec![minus(ident("n"), 1)]),
                    AstExpr::call(callee, vec![minus(ident("n"), 2)]),
                )),
            ),
        ],
    ))
}

/// Halving recursion with `a` calls and a loop of linear work per level.
pub fn divide_and_conquer(name: &str, a: usize) -> Program {
    let half = bin(BinOp::IntDiv, ident("n"), num(2));
    let mut body = vec![base_case(2, 1)];
    body.push(for_loop(
        4,
        "i",
        num(1),
        ident("n"),
        vec![assign(5, "s", bin(BinOp::Add, ident("s"), ident("i")))],
    ));
    for k in 0..a {
        body.push(Stmt::Call {
            line: 6 + k as u32,
            name: name.into(),
            args: vec![half.clone()],
        });
    }
    single(procedure(name, &["n"], body))
}

pub fn binary_search() -> Program {
    let half = bin(BinOp::IntDiv, ident("n"), num(2));
    single(procedure(
        "Halve",
        &["n"],
        vec![
            base_case(2, 1),
            ret(4, Some(AstExpr::call("Halve", vec![half]))),
        ],
    ))
}

/// Write `program` as JSON into `dir` and return the file path.
pub fn write_program(dir: &Path, file_name: &str, program: &Program) -> PathBuf {
    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(program).expect("program serializes");
    std::fs::write(&path, json).expect("fixture is writable");
    path
}
