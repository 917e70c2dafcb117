//! Characteristic-equation method for `T(n) = Σ cᵢ·T(n − i) + f(n)`.

use super::model::{CharacteristicResult, Recurrence, RecurrenceShape, Root};
use super::{SolutionPayload, SolveMethod, Solved};
use crate::errors::{AnalysisError, Result};
use crate::expr::{format_number, Growth};
use num_complex::Complex64;

const MAX_ITERATIONS: usize = 500;
const TOLERANCE: f64 = 1e-12;
/// Roots closer than this are one root with multiplicity.
const ROOT_CLUSTER: f64 = 1e-5;
const EPS: f64 = 1e-9;

pub fn check(recurrence: &Recurrence) -> std::result::Result<(), String> {
    match &recurrence.shape {
        RecurrenceShape::Linear { coefficients } if !coefficients.is_empty() => Ok(()),
        RecurrenceShape::Linear { .. } => Err("no recursive terms".to_string()),
        RecurrenceShape::DivideAndConquer { .. } => Err(
            "only linear recurrences T(n) = Σ cᵢ·T(n − i) + f(n) have a characteristic equation"
                .to_string(),
        ),
    }
}

/// Monic characteristic polynomial, highest degree first:
/// `x^K − c₁x^(K−1) − ... − c_K`.
fn polynomial(recurrence: &Recurrence) -> Vec<f64> {
    let RecurrenceShape::Linear { coefficients } = &recurrence.shape else {
        return vec![1.0];
    };
    let order = coefficients.keys().max().copied().unwrap_or(0) as usize;
    let mut poly = vec![0.0; order + 1];
    poly[0] = 1.0;
    for (offset, c) in coefficients {
        poly[*offset as usize] -= *c as f64;
    }
    poly
}

fn render_polynomial(poly: &[f64]) -> String {
    let degree = poly.len().saturating_sub(1);
    let mut out = String::new();
    for (i, c) in poly.iter().enumerate() {
        if c.abs() < EPS {
            continue;
        }
        let power = degree - i;
        let sign = if *c < 0.0 { "-" } else { "+" };
        let magnitude = c.abs();
        let coefficient = if (magnitude - 1.0).abs() < EPS && power > 0 {
            String::new()
        } else {
            format_number(magnitude)
        };
        let term = match power {
            0 => coefficient,
            1 => format!("{coefficient}x"),
            p => format!("{coefficient}x^{p}"),
        };
        if out.is_empty() {
            if sign == "-" {
                out.push('-');
            }
            out.push_str(&term);
        } else {
            out.push_str(&format!(" {sign} {term}"));
        }
    }
    format!("{out} = 0")
}

fn horner(poly: &[f64], z: Complex64) -> Complex64 {
    poly.iter()
        .fold(Complex64::new(0.0, 0.0), |acc, c| acc * z + c)
}

/// All roots of a monic polynomial: closed form up to degree two,
/// Durand–Kerner iteration above.
fn roots(poly: &[f64]) -> Vec<Complex64> {
    match poly.len() {
        0 | 1 => Vec::new(),
        2 => vec![Complex64::new(-poly[1], 0.0)],
        3 => {
            let (b, c) = (poly[1], poly[2]);
            let disc = b * b - 4.0 * c;
            if disc >= 0.0 {
                let s = disc.sqrt();
                vec![
                    Complex64::new((-b + s) / 2.0, 0.0),
                    Complex64::new((-b - s) / 2.0, 0.0),
                ]
            } else {
                let s = (-disc).sqrt();
                vec![
                    Complex64::new(-b / 2.0, s / 2.0),
                    Complex64::new(-b / 2.0, -s / 2.0),
                ]
            }
        }
        len => durand_kerner(poly, len - 1),
    }
}

fn durand_kerner(poly: &[f64], degree: usize) -> Vec<Complex64> {
    let seed = Complex64::new(0.4, 0.9);
    let mut estimates: Vec<Complex64> = (0..degree).map(|k| seed.powu(k as u32)).collect();
    for _ in 0..MAX_ITERATIONS {
        let mut largest_step: f64 = 0.0;
        for i in 0..degree {
            let zi = estimates[i];
            let denominator = estimates
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .fold(Complex64::new(1.0, 0.0), |acc, (_, zj)| acc * (zi - zj));
            if denominator.norm() < f64::MIN_POSITIVE {
                continue;
            }
            let step = horner(poly, zi) / denominator;
            estimates[i] = zi - step;
            largest_step = largest_step.max(step.norm());
        }
        if largest_step < TOLERANCE {
            break;
        }
    }
    estimates
}

/// Merge nearly equal roots and clean tiny imaginary parts.
fn cluster(raw: Vec<Complex64>) -> Vec<Root> {
    let mut out: Vec<(Complex64, usize)> = Vec::new();
    for z in raw {
        let z = if z.im.abs() < 1e-7 {
            Complex64::new(z.re, 0.0)
        } else {
            z
        };
        match out.iter_mut().find(|(w, _)| (*w - z).norm() < ROOT_CLUSTER.sqrt()) {
            Some((w, count)) => {
                *w = (*w * (*count as f64) + z) / (*count as f64 + 1.0);
                *count += 1;
            }
            None => out.push((z, 1)),
        }
    }
    let mut roots: Vec<Root> = out
        .into_iter()
        .map(|(z, multiplicity)| Root {
            re: z.re,
            im: z.im,
            multiplicity,
        })
        .collect();
    roots.sort_by(|a, b| {
        b.modulus()
            .total_cmp(&a.modulus())
            .then(b.re.total_cmp(&a.re))
    });
    roots
}

pub fn solve(recurrence: &Recurrence) -> Result<Solved> {
    check(recurrence).map_err(|reason| {
        AnalysisError::not_applicable(SolveMethod::CharacteristicEquation, reason)
    })?;
    let var = recurrence.size_variable.as_str();
    let poly = polynomial(recurrence);
    let rendered = render_polynomial(&poly);
    let roots = cluster(roots(&poly));
    let Some(dominant) = roots.first().copied() else {
        return Err(AnalysisError::not_applicable(
            SolveMethod::CharacteristicEquation,
            "the characteristic polynomial has no roots",
        ));
    };
    let Some(forcing) = recurrence.work_growth() else {
        return Err(AnalysisError::not_applicable(
            SolveMethod::CharacteristicEquation,
            format!("forcing term {} has no recognizable growth", recurrence.f_n),
        ));
    };
    let rho = dominant.modulus();
    let multiplicity = dominant.multiplicity as f64;

    let growth = if forcing.exp_base > rho.max(1.0) + EPS {
        // The forcing term outgrows every homogeneous solution.
        forcing
    } else if rho > 1.0 + EPS {
        if (forcing.exp_base - rho).abs() <= EPS {
            // Forcing n^d·ρ^n on a root ρ of multiplicity m gives n^(d+m)·ρ^n.
            Growth {
                exp_base: rho,
                degree: forcing.degree + multiplicity,
                log_power: forcing.log_power,
            }
        } else {
            Growth {
                exp_base: rho,
                degree: multiplicity - 1.0,
                log_power: 0.0,
            }
        }
    } else if (rho - 1.0).abs() <= EPS {
        // Root 1 with multiplicity m lifts n^d·log^k n to n^(d+m)·log^k n.
        Growth {
            exp_base: 1.0,
            degree: forcing.degree + multiplicity,
            log_power: forcing.log_power,
        }
    } else {
        forcing
    };
    let theta = super::model::theta_of(&growth, var);

    let mut steps = vec![
        recurrence.summary(),
        format!("characteristic equation: {rendered}"),
        format!(
            "roots: {}",
            roots
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        format!("dominant root: {} (|r| = {})", dominant, format_number(rho)),
    ];
    if forcing.is_exponential() {
        steps.push(format!(
            "forcing term grows like {}",
            forcing.render(var)
        ));
    } else if (rho - 1.0).abs() <= EPS {
        steps.push(format!(
            "r = 1 with multiplicity {} and forcing term of degree {}",
            dominant.multiplicity,
            format_number(forcing.degree)
        ));
    }
    steps.push(format!("T({var}) = {theta}"));
    log::debug!("characteristic roots of {}: {:?}", rendered, roots);

    Ok(Solved {
        payload: SolutionPayload::CharacteristicEquation(CharacteristicResult {
            polynomial: rendered,
            roots,
            dominant_root: dominant,
            forcing_degree: forcing.degree,
        }),
        theta,
        steps,
        notes: Vec::new(),
    })
}
