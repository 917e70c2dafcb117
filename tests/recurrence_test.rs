//! Recurrence extraction and solving on whole programs.

mod common;

use common::*;
use costmap::recurrence::{RecurrenceShape, SolutionPayload};
use costmap::{
    analyze, analyze_recursive, detect_applicable_methods, Analysis, AnalysisMode,
    AnalysisOptions, CasePolicy, SolveMethod,
};
use pretty_assertions::assert_eq;

fn solve(program: &costmap::Program) -> costmap::RecurrenceSolution {
    analyze_recursive(program, &AnalysisOptions::default()).unwrap()
}

#[test]
fn merge_sort_shape_is_n_log_n() {
    let solution = solve(&divide_and_conquer("Sort", 2));
    assert_eq!(solution.recurrence.summary(), "T(n) = 2T(n/2) + n");
    assert_eq!(solution.method, SolveMethod::Master);
    assert_eq!(solution.theta, "Θ(n·log(n))");
}

#[test]
fn four_halving_calls_are_quadratic() {
    let solution = solve(&divide_and_conquer("Quad", 4));
    match &solution.payload {
        SolutionPayload::Master(result) => assert_eq!(result.critical_display, "2"),
        other => panic!("expected a master result, got {other:?}"),
    }
    assert_eq!(solution.theta, "Θ(n^2)");
}

#[test]
fn halving_search_is_logarithmic() {
    let solution = solve(&binary_search());
    assert_eq!(
        solution.recurrence.shape,
        RecurrenceShape::DivideAndConquer {
            a: 1,
            b: num_rational::Rational64::from_integer(2)
        }
    );
    assert_eq!(solution.theta, "Θ(log(n))");
}

#[test]
fn fibonacci_uses_the_characteristic_equation() {
    let solution = solve(&fibonacci());
    assert_eq!(solution.method, SolveMethod::CharacteristicEquation);
    assert_eq!(solution.theta, "Θ(1.618^n)");
    match &solution.payload {
        SolutionPayload::CharacteristicEquation(result) => {
            assert_eq!(result.roots.len(), 2);
            assert!((result.dominant_root.re - 1.618_033_988).abs() < 1e-6);
        }
        other => panic!("expected characteristic roots, got {other:?}"),
    }
}

#[test]
fn lowercase_self_calls_still_route_to_the_recurrence_solver() {
    let program = fibonacci_calling("fib");
    assert_eq!(costmap::classify(&program), costmap::AlgorithmKind::Recursive);
    match analyze(&program, &AnalysisOptions::default(), AnalysisMode::Auto).unwrap() {
        Analysis::Recursive(solution) => assert_eq!(solution.theta, "Θ(1.618^n)"),
        other => panic!("expected a recursive analysis, got {other:?}"),
    }
}

#[test]
fn every_applicable_method_agrees_on_merge_sort() {
    let program = divide_and_conquer("Sort", 2);
    let report = detect_applicable_methods(&program, &AnalysisOptions::default()).unwrap();
    assert_eq!(report.methods[0], SolveMethod::Master);
    for method in report
        .methods
        .iter()
        .filter(|m| **m != SolveMethod::CharacteristicEquation)
    {
        let options = AnalysisOptions::default().with_method(Some(*method));
        let solution = analyze_recursive(&program, &options).unwrap();
        assert_eq!(solution.method, *method);
        assert_eq!(solution.theta, "Θ(n·log(n))", "{method}");
    }
}

#[test]
fn characteristic_equation_rejects_divide_and_conquer() {
    let options =
        AnalysisOptions::default().with_method(Some(SolveMethod::CharacteristicEquation));
    let err = analyze_recursive(&divide_and_conquer("Sort", 2), &options).unwrap_err();
    assert_eq!(err.reason(), "method_not_applicable");
}

#[test]
fn auto_mode_routes_recursion_to_the_solver() {
    let analysis = analyze(&fibonacci(), &AnalysisOptions::default(), AnalysisMode::Auto).unwrap();
    assert!(matches!(analysis, Analysis::Recursive(_)));
    assert_eq!(analysis.procedure(), "Fib");
}

#[test]
fn loops_without_recursion_cannot_be_solved() {
    let err = analyze_recursive(&summing_loop(), &AnalysisOptions::default()).unwrap_err();
    assert_eq!(err.reason(), "no_recursive_calls");
}

#[test]
fn case_policy_travels_with_the_recurrence() {
    let options = AnalysisOptions::new(CasePolicy::Best);
    let solution = analyze_recursive(&binary_search(), &options).unwrap();
    assert_eq!(solution.recurrence.case_policy, CasePolicy::Best);
}
