//! Lowering of AST expressions into the algebraic [`Expr`] model.
//!
//! Only arithmetic survives lowering. Anything the cost model cannot reason
//! about (comparisons, array reads, `mod`, unknown calls) becomes an opaque
//! symbol named after its source rendering, so it still participates in
//! bounds symbolically.

use super::{AstExpr, BinOp, UnaryOp};
use crate::expr::Expr;
use num_rational::Rational64;

/// Calls whose result is the length of the input.
const SIZE_CALLS: [&str; 4] = ["length", "len", "size", "count"];

/// Lower an AST expression, mapping input-length calls to `size_variable`.
pub fn to_expr(expr: &AstExpr, size_variable: &str) -> Expr {
    match expr {
        AstExpr::Number { value } => number(*value),
        AstExpr::Bool { value } => Expr::int(i64::from(*value)),
        AstExpr::Null => opaque(expr),
        AstExpr::Ident { name } => Expr::sym(name.clone()),
        AstExpr::Binary { op, lhs, rhs } => {
            let l = || to_expr(lhs, size_variable);
            let r = || to_expr(rhs, size_variable);
            match op {
                BinOp::Add => l().add(r()),
                BinOp::Sub => l().sub(r()),
                BinOp::Mul => l().multiply(r()),
                // Floors are irrelevant to growth, so integer division lowers like `/`.
                BinOp::Div | BinOp::IntDiv => l().divide(r()),
                BinOp::Pow => l().power(r()),
                _ => opaque(expr),
            }
        }
        AstExpr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => to_expr(operand, size_variable).negate(),
        AstExpr::Unary { .. } => opaque(expr),
        AstExpr::Call { name, args } => lower_call(expr, name, args, size_variable),
        AstExpr::Index { .. } => opaque(expr),
    }
}

fn lower_call(expr: &AstExpr, name: &str, args: &[AstExpr], size_variable: &str) -> Expr {
    let lowered = name.to_ascii_lowercase();
    if SIZE_CALLS.contains(&lowered.as_str()) && args.len() <= 1 {
        return Expr::sym(size_variable);
    }
    match (lowered.as_str(), args) {
        ("log" | "lg" | "log2", [arg]) => to_expr(arg, size_variable).log(),
        ("floor" | "ceil" | "ceiling" | "round", [arg]) => to_expr(arg, size_variable),
        ("sqrt", [arg]) => to_expr(arg, size_variable).power(Expr::rational(1, 2)),
        _ => opaque(expr),
    }
}

fn number(value: f64) -> Expr {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Expr::int(value as i64);
    }
    match Rational64::approximate_float(value) {
        Some(r) => Expr::constant(r),
        None => Expr::sym(value.to_string()),
    }
}

fn opaque(expr: &AstExpr) -> Expr {
    Expr::sym(expr.to_string())
}
