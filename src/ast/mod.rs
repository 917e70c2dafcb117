//! Boundary AST for the pseudocode language.
//!
//! The lexer and grammar live outside this crate; they hand the engine a
//! JSON document that deserializes into [`Program`]. Every node kind is an
//! explicit enum variant, so an unknown `"type"` is a decode error rather
//! than a silently ignored node.

pub mod lower;
pub mod walk;

pub use lower::to_expr;

use crate::core::RowKind;
use crate::errors::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source line of a statement.
pub type Line = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub procedures: Vec<Procedure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stmt {
    Decl {
        line: Line,
        name: String,
        #[serde(default)]
        init: Option<AstExpr>,
    },
    Assign {
        line: Line,
        target: AstExpr,
        value: AstExpr,
    },
    For {
        line: Line,
        var: String,
        start: AstExpr,
        end: AstExpr,
        #[serde(default)]
        step: Option<AstExpr>,
        #[serde(default)]
        downto: bool,
        #[serde(default)]
        body: Vec<Stmt>,
    },
    While {
        line: Line,
        cond: AstExpr,
        #[serde(default)]
        body: Vec<Stmt>,
    },
    Repeat {
        line: Line,
        #[serde(default)]
        body: Vec<Stmt>,
        until: AstExpr,
    },
    If {
        line: Line,
        cond: AstExpr,
        #[serde(default)]
        then_branch: Vec<Stmt>,
        #[serde(default)]
        else_branch: Option<Vec<Stmt>>,
    },
    Call {
        line: Line,
        name: String,
        #[serde(default)]
        args: Vec<AstExpr>,
    },
    Return {
        line: Line,
        #[serde(default)]
        value: Option<AstExpr>,
    },
    Break {
        line: Line,
    },
    Other {
        line: Line,
        #[serde(default)]
        text: Option<String>,
    },
}

impl Stmt {
    pub fn line(&self) -> Line {
        match self {
            Stmt::Decl { line, .. }
            | Stmt::Assign { line, .. }
            | Stmt::For { line, .. }
            | Stmt::While { line, .. }
            | Stmt::Repeat { line, .. }
            | Stmt::If { line, .. }
            | Stmt::Call { line, .. }
            | Stmt::Return { line, .. }
            | Stmt::Break { line }
            | Stmt::Other { line, .. } => *line,
        }
    }

    pub fn kind(&self) -> RowKind {
        match self {
            Stmt::Decl { .. } => RowKind::Decl,
            Stmt::Assign { .. } => RowKind::Assign,
            Stmt::For { .. } => RowKind::For,
            Stmt::While { .. } => RowKind::While,
            Stmt::Repeat { .. } => RowKind::Repeat,
            Stmt::If { .. } => RowKind::If,
            Stmt::Call { .. } => RowKind::Call,
            Stmt::Return { .. } => RowKind::Return,
            Stmt::Break { .. } | Stmt::Other { .. } => RowKind::Other,
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            Stmt::For { .. } | Stmt::While { .. } | Stmt::Repeat { .. }
        )
    }

    /// Nested statement blocks, in source order.
    pub fn blocks(&self) -> Vec<&[Stmt]> {
        match self {
            Stmt::For { body, .. } | Stmt::While { body, .. } | Stmt::Repeat { body, .. } => {
                vec![body.as_slice()]
            }
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                let mut blocks = vec![then_branch.as_slice()];
                if let Some(else_branch) = else_branch {
                    blocks.push(else_branch.as_slice());
                }
                blocks
            }
            _ => Vec::new(),
        }
    }

    /// Expressions evaluated by the statement itself, excluding nested blocks.
    pub fn own_exprs(&self) -> Vec<&AstExpr> {
        match self {
            Stmt::Decl { init, .. } => init.iter().collect(),
            Stmt::Assign { target, value, .. } => vec![target, value],
            Stmt::For {
                start, end, step, ..
            } => {
                let mut exprs = vec![start, end];
                exprs.extend(step.iter());
                exprs
            }
            Stmt::While { cond, .. } | Stmt::If { cond, .. } => vec![cond],
            Stmt::Repeat { until, .. } => vec![until],
            Stmt::Call { args, .. } => args.iter().collect(),
            Stmt::Return { value, .. } => value.iter().collect(),
            Stmt::Break { .. } | Stmt::Other { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AstExpr {
    Number {
        value: f64,
    },
    Bool {
        value: bool,
    },
    Null,
    Ident {
        name: String,
    },
    Binary {
        op: BinOp,
        lhs: Box<AstExpr>,
        rhs: Box<AstExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<AstExpr>,
    },
    Call {
        name: String,
        #[serde(default)]
        args: Vec<AstExpr>,
    },
    Index {
        array: Box<AstExpr>,
        index: Box<AstExpr>,
    },
}

impl AstExpr {
    pub fn number(value: i64) -> Self {
        AstExpr::Number {
            value: value as f64,
        }
    }

    pub fn ident(name: impl Into<String>) -> Self {
        AstExpr::Ident { name: name.into() }
    }

    pub fn binary(op: BinOp, lhs: AstExpr, rhs: AstExpr) -> Self {
        AstExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<AstExpr>) -> Self {
        AstExpr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn index(array: AstExpr, index: AstExpr) -> Self {
        AstExpr::Index {
            array: Box::new(array),
            index: Box::new(index),
        }
    }

    pub fn as_ident(&self) -> Option<&str> {
        match self {
            AstExpr::Ident { name } => Some(name),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AstExpr::Number { value } if value.fract() == 0.0 => Some(*value as i64),
            AstExpr::Unary {
                op: UnaryOp::Neg,
                operand,
            } => operand.as_integer().map(|v| -v),
            _ => None,
        }
    }

    /// Whether `name` is read anywhere in the expression.
    pub fn mentions(&self, name: &str) -> bool {
        match self {
            AstExpr::Number { .. } | AstExpr::Bool { .. } | AstExpr::Null => false,
            AstExpr::Ident { name: n } => n == name,
            AstExpr::Binary { lhs, rhs, .. } => lhs.mentions(name) || rhs.mentions(name),
            AstExpr::Unary { operand, .. } => operand.mentions(name),
            AstExpr::Call { args, .. } => args.iter().any(|a| a.mentions(name)),
            AstExpr::Index { array, index } => array.mentions(name) || index.mentions(name),
        }
    }
}

impl fmt::Display for AstExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstExpr::Number { value } if value.fract() == 0.0 => write!(f, "{}", *value as i64),
            AstExpr::Number { value } => write!(f, "{value}"),
            AstExpr::Bool { value } => write!(f, "{value}"),
            AstExpr::Null => write!(f, "null"),
            AstExpr::Ident { name } => write!(f, "{name}"),
            AstExpr::Binary { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            AstExpr::Unary { op, operand } => match op {
                UnaryOp::Neg => write!(f, "-{operand}"),
                UnaryOp::Not => write!(f, "not {operand}"),
            },
            AstExpr::Call { name, args } => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{}({})", name, args.join(", "))
            }
            AstExpr::Index { array, index } => write!(f, "{array}[{index}]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "div")]
    IntDiv,
    #[serde(rename = "mod")]
    Mod,
    #[serde(rename = "^")]
    Pow,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "and")]
    And,
    #[serde(rename = "or")]
    Or,
}

impl BinOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne
        )
    }

    /// The comparison with its operands swapped (`a < b` ⇔ `b > a`).
    pub fn flipped(&self) -> BinOp {
        match self {
            BinOp::Lt => BinOp::Gt,
            BinOp::Le => BinOp::Ge,
            BinOp::Gt => BinOp::Lt,
            BinOp::Ge => BinOp::Le,
            other => *other,
        }
    }

    /// Logical negation of a comparison.
    pub fn negated(&self) -> Option<BinOp> {
        match self {
            BinOp::Lt => Some(BinOp::Ge),
            BinOp::Le => Some(BinOp::Gt),
            BinOp::Gt => Some(BinOp::Le),
            BinOp::Ge => Some(BinOp::Lt),
            BinOp::Eq => Some(BinOp::Ne),
            BinOp::Ne => Some(BinOp::Eq),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::IntDiv => "div",
            BinOp::Mod => "mod",
            BinOp::Pow => "^",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "not")]
    Not,
}

impl Program {
    /// Decode a program from the JSON produced by the front end.
    pub fn from_json(source: &str) -> Result<Program> {
        let program: Program = serde_json::from_str(source)?;
        Ok(program)
    }

    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.is_named(name))
    }

    /// The entry procedure: the first one that no other procedure calls,
    /// falling back to the first procedure overall.
    pub fn principal_procedure(&self) -> Option<&Procedure> {
        self.procedures
            .iter()
            .find(|candidate| {
                !self.procedures.iter().any(|caller| {
                    !caller.is_named(&candidate.name)
                        && walk::calls_in_body(&caller.body)
                            .iter()
                            .any(|call| candidate.is_named(call.name))
                })
            })
            .or_else(|| self.procedures.first())
    }

    /// The principal procedure, or a structural error when there is none.
    pub fn require_principal(&self) -> Result<&Procedure> {
        self.principal_procedure()
            .ok_or(AnalysisError::NoMainProcedure)
    }
}

impl Procedure {
    /// Procedure names match without regard to ASCII case, so `fib(n - 1)`
    /// inside `Fib` is a self-call.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Every call site in the body that targets this procedure.
    pub fn self_calls(&self) -> Vec<walk::CallSite<'_>> {
        walk::calls_in_body(&self.body)
            .into_iter()
            .filter(|call| self.is_named(call.name))
            .collect()
    }

    pub fn is_self_recursive(&self) -> bool {
        !self.self_calls().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const MERGE_SORT: &str = indoc! {r#"
        {
          "procedures": [
            {
              "name": "Merge",
              "params": ["A", "p", "q", "r"],
              "body": [
                { "type": "for", "line": 2, "var": "k",
                  "start": { "type": "ident", "name": "p" },
                  "end": { "type": "ident", "name": "r" },
                  "body": [ { "type": "other", "line": 3 } ] }
              ]
            },
            {
              "name": "MergeSort",
              "params": ["A", "p", "r"],
              "body": [
                { "type": "if", "line": 6,
                  "cond": { "type": "binary", "op": "<",
                            "lhs": { "type": "ident", "name": "p" },
                            "rhs": { "type": "ident", "name": "r" } },
                  "then_branch": [
                    { "type": "assign", "line": 7,
                      "target": { "type": "ident", "name": "q" },
                      "value": { "type": "binary", "op": "div",
                                 "lhs": { "type": "binary", "op": "+",
                                          "lhs": { "type": "ident", "name": "p" },
                                          "rhs": { "type": "ident", "name": "r" } },
                                 "rhs": { "type": "number", "value": 2 } } },
                    { "type": "call", "line": 8, "name": "MergeSort",
                      "args": [ { "type": "ident", "name": "A" },
                                { "type": "ident", "name": "p" },
                                { "type": "ident", "name": "q" } ] },
                    { "type": "call", "line": 9, "name": "Merge",
                      "args": [ { "type": "ident", "name": "A" } ] }
                  ] }
              ]
            }
          ]
        }
    "#};

    #[test]
    fn decodes_tagged_json() {
        let program = Program::from_json(MERGE_SORT).unwrap();
        assert_eq!(program.procedures.len(), 2);
        let sort = program.procedure("MergeSort").unwrap();
        assert_eq!(sort.body[0].kind(), RowKind::If);
        assert_eq!(sort.body[0].line(), 6);
    }

    #[test]
    fn principal_is_the_uncalled_procedure() {
        let program = Program::from_json(MERGE_SORT).unwrap();
        let principal = program.principal_procedure().unwrap();
        assert_eq!(principal.name, "MergeSort");
        assert!(principal.is_self_recursive());
    }

    #[test]
    fn unknown_node_type_is_rejected() {
        let err = Program::from_json(
            r#"{"procedures":[{"name":"F","body":[{"type":"goto","line":1}]}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.reason(), "invalid_ast");
    }

    #[test]
    fn empty_program_has_no_principal() {
        let program = Program { procedures: vec![] };
        assert_eq!(
            program.require_principal().unwrap_err(),
            AnalysisError::NoMainProcedure
        );
    }
}
