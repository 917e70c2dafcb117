//! Master theorem for `T(n) = a·T(n/b) + f(n)`.

use super::model::{growth_of, theta_of, MasterCase, MasterResult, Recurrence, RecurrenceShape};
use super::{SolveMethod, Solved};
use crate::errors::{AnalysisError, Result};
use crate::expr::format_number;
use num_traits::ToPrimitive;

const EPS: f64 = 1e-9;

/// Why the Master theorem cannot be applied, if it cannot.
pub fn check(recurrence: &Recurrence) -> std::result::Result<(), String> {
    match &recurrence.shape {
        RecurrenceShape::DivideAndConquer { a, b } => {
            if *a < 1 {
                return Err("needs at least one recursive call".to_string());
            }
            if b.to_f64().map_or(true, |b| b <= 1.0) {
                return Err("the input must shrink by a factor b > 1".to_string());
            }
            if growth_of(&recurrence.f_n, &recurrence.size_variable).is_none() {
                return Err(format!("cannot compare f(n) = {} with n^(log_b a)", recurrence.f_n));
            }
            Ok(())
        }
        RecurrenceShape::Linear { .. } => {
            Err("the recurrence is not of the form a·T(n/b) + f(n)".to_string())
        }
    }
}

/// `log_b a` as written: an integer when exact, else `log_b a`.
fn critical_display(a: u32, b: f64, critical: f64) -> String {
    if (critical - critical.round()).abs() <= EPS {
        format_number(critical)
    } else {
        format!("log_{} {}", format_number(b), a)
    }
}

/// `n^e` with `e` given by its display form.
fn power_of(var: &str, exponent: &str, critical: f64) -> String {
    if critical.abs() <= EPS {
        String::new()
    } else if (critical - 1.0).abs() <= EPS {
        var.to_string()
    } else if exponent.contains(' ') {
        format!("{var}^({exponent})")
    } else {
        format!("{var}^{exponent}")
    }
}

fn with_log(poly: String, var: &str, log_power: f64) -> String {
    let log = if (log_power - 1.0).abs() <= EPS {
        format!("log({var})")
    } else {
        format!("log({var})^{}", format_number(log_power))
    };
    if poly.is_empty() {
        log
    } else {
        format!("{poly}·{log}")
    }
}

pub fn solve(recurrence: &Recurrence) -> Result<Solved> {
    check(recurrence).map_err(|reason| AnalysisError::not_applicable(SolveMethod::Master, reason))?;
    let RecurrenceShape::DivideAndConquer { a, b } = &recurrence.shape else {
        return Err(AnalysisError::not_applicable(
            SolveMethod::Master,
            "the recurrence is not of the form a·T(n/b) + f(n)",
        ));
    };
    let a = *a;
    let b = b.to_f64().unwrap_or(2.0);
    let var = recurrence.size_variable.as_str();
    let f = recurrence.work_growth().unwrap_or_default();

    let critical = f64::from(a).ln() / b.ln();
    let display = critical_display(a, b, critical);
    let mut steps = vec![
        recurrence.summary(),
        format!(
            "a = {}, b = {}, f({}) = {}",
            a,
            format_number(b),
            var,
            recurrence.f_n
        ),
        format!(
            "log_b(a) = log_{}({}) = {}",
            format_number(b),
            a,
            format_number(critical)
        ),
    ];

    let (case, theta, regularity_ratio) = if f.is_exponential() || f.degree > critical + EPS {
        let ratio = f64::from(a) / b.powf(f.degree);
        if !f.is_exponential() && ratio >= 1.0 {
            return Err(AnalysisError::not_applicable(
                SolveMethod::Master,
                format!("regularity condition fails: a/b^d = {}", format_number(ratio)),
            ));
        }
        steps.push(format!(
            "f({var}) = Ω({var}^({display} + ε)); regularity: a·f(n/b) ≤ c·f(n) with c = {} < 1",
            format_number(ratio)
        ));
        (MasterCase::Case3, theta_of(&f, var), Some(ratio))
    } else if f.degree < critical - EPS {
        steps.push(format!(
            "f({var}) = O({var}^({display} - ε)): the leaves dominate"
        ));
        let theta = format!("Θ({})", power_of(var, &display, critical));
        (MasterCase::Case1, theta, None)
    } else {
        if f.log_power < -EPS {
            return Err(AnalysisError::not_applicable(
                SolveMethod::Master,
                format!("f(n) = {} falls between cases 1 and 2", recurrence.f_n),
            ));
        }
        steps.push(format!(
            "f({var}) = Θ({var}^{display} · log^{}({var})): every level costs the same",
            format_number(f.log_power)
        ));
        let poly = power_of(var, &display, critical);
        let theta = format!("Θ({})", with_log(poly, var, f.log_power + 1.0));
        (MasterCase::Case2, theta, None)
    };
    steps.push(format!("{case} ⇒ T({var}) = {theta}"));
    log::debug!("master theorem: {} for {}", case, recurrence.summary());

    Ok(Solved {
        payload: super::SolutionPayload::Master(MasterResult {
            a,
            b,
            critical_exponent: critical,
            critical_display: display,
            f_growth: f,
            case,
            regularity_ratio,
        }),
        theta,
        steps,
        notes: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CasePolicy;
    use crate::expr::Expr;
    use num_rational::Rational64;

    fn divide(a: u32, b: i64, f_n: Expr) -> Recurrence {
        Recurrence {
            procedure: "F".into(),
            size_variable: "n".into(),
            shape: RecurrenceShape::DivideAndConquer {
                a,
                b: Rational64::from_integer(b),
            },
            f_n,
            n0: 1,
            applicable: true,
            method: None,
            call_sites: a as usize,
            case_policy: CasePolicy::Worst,
            work_source: String::new(),
        }
    }

    fn solved(rec: &Recurrence) -> (MasterCase, String) {
        match solve(rec) {
            Ok(Solved {
                payload: super::super::SolutionPayload::Master(result),
                theta,
                ..
            }) => (result.case, theta),
            other => panic!("expected a master result, got {other:?}"),
        }
    }

    #[test]
    fn merge_sort_is_case_two() {
        let (case, theta) = solved(&divide(2, 2, Expr::sym("n")));
        assert_eq!(case, MasterCase::Case2);
        assert_eq!(theta, "Θ(n·log(n))");
    }

    #[test]
    fn binary_search_is_logarithmic() {
        let (case, theta) = solved(&divide(1, 2, Expr::one()));
        assert_eq!(case, MasterCase::Case2);
        assert_eq!(theta, "Θ(log(n))");
    }

    #[test]
    fn strassen_is_case_one() {
        let (case, theta) = solved(&divide(7, 2, Expr::sym("n").power(Expr::int(2))));
        assert_eq!(case, MasterCase::Case1);
        assert_eq!(theta, "Θ(n^(log_2 7))");
    }

    #[test]
    fn heavy_combine_step_is_case_three() {
        let (case, theta) = solved(&divide(2, 2, Expr::sym("n").power(Expr::int(2))));
        assert_eq!(case, MasterCase::Case3);
        assert_eq!(theta, "Θ(n^2)");
    }

    #[test]
    fn linear_recurrences_are_rejected() {
        let mut rec = divide(1, 2, Expr::one());
        rec.shape = RecurrenceShape::Linear {
            coefficients: [(1, 1)].into_iter().collect(),
        };
        assert!(check(&rec).is_err());
        assert_eq!(
            solve(&rec).err().map(|e| e.reason()),
            Some("method_not_applicable")
        );
    }
}
