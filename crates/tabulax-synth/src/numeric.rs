//! Numeric relationship fitting.
//!
//! Candidate functions are fitted by least squares in a fixed order (scale,
//! affine, quadratic, power, exponential). A fit is accepted only when its
//! formatted output reproduces every target string; coefficients are snapped
//! to the fewest decimals that still do.

use tabulax_model::{ExampleSet, parse_number};
use tracing::debug;

use crate::dialect::{Expr, MAX_DECIMALS, NumberFormat, NumericFn, Program, UnaryOp};

const MAX_SNAP_DECIMALS: usize = 12;
const SINGULAR: f64 = 1e-12;

/// Finds a numeric program reproducing every example, if one exists.
///
/// Returns None when any source or target is not a number.
pub fn fit_numeric(examples: &ExampleSet) -> Option<Program> {
    let points = examples
        .iter()
        .map(|e| Some((parse_number(&e.source)?, parse_number(&e.target)?)))
        .collect::<Option<Vec<_>>>()?;
    let formats = infer_formats(examples.targets())?;

    let candidates = [
        fit_scale(&points),
        fit_affine(&points),
        fit_quadratic(&points),
        fit_power(&points),
        fit_exponential(&points),
    ];
    for function in candidates.into_iter().flatten() {
        for &format in &formats {
            if let Some(program) = snap(function, format, examples) {
                debug!(function = function.name(), code = %program, "numeric fit accepted");
                return Some(program);
            }
        }
        debug!(function = function.name(), "numeric fit rejected");
    }
    None
}

/// Output formats consistent with the target strings, most specific first.
///
/// Targets that all carry the same number of decimals suggest fixed
/// formatting; otherwise values are rounded to the largest decimal count with
/// trailing zeros trimmed.
pub fn infer_formats<'a>(targets: impl Iterator<Item = &'a str>) -> Option<Vec<NumberFormat>> {
    let mut decimals = Vec::new();
    for target in targets {
        let target = target.trim();
        if target.contains(['e', 'E']) {
            return None;
        }
        let count = target.split_once('.').map_or(0, |(_, fraction)| fraction.len());
        decimals.push(u32::try_from(count).ok()?);
    }
    let max = decimals.iter().copied().max()?;
    if max > MAX_DECIMALS {
        return None;
    }
    if decimals.iter().all(|&d| d == max) {
        Some(vec![NumberFormat::Fixed(max), NumberFormat::Round(max)])
    } else {
        Some(vec![NumberFormat::Round(max)])
    }
}

fn program_for(function: NumericFn, format: NumberFormat) -> Program {
    Program::new(Expr::Format {
        expr: Box::new(Expr::Numeric {
            expr: Box::new(Expr::unary(UnaryOp::Number, Expr::Input)),
            function,
        }),
        format,
    })
}

/// Tries coefficients rounded to 0, 1, 2, ... decimals, then unrounded.
fn snap(function: NumericFn, format: NumberFormat, examples: &ExampleSet) -> Option<Program> {
    let raw = function.coefficients();
    let pairs = || examples.iter().map(|e| (e.source.as_str(), e.target.as_str()));

    for decimals in 0..=MAX_SNAP_DECIMALS {
        let rounded: Option<Vec<f64>> = raw
            .iter()
            .map(|c| format!("{c:.decimals$}").parse::<f64>().ok())
            .collect();
        let Some(snapped) = rounded.and_then(|c| function.with_coefficients(&c)) else {
            continue;
        };
        let program = program_for(snapped, format);
        if program.reproduces(pairs()) {
            return Some(program);
        }
    }
    let program = program_for(function, format);
    program.reproduces(pairs()).then_some(program)
}

// ============================================================================
// Least-squares fits
// ============================================================================

fn fit_scale(points: &[(f64, f64)]) -> Option<NumericFn> {
    let sxx: f64 = points.iter().map(|(x, _)| x * x).sum();
    if sxx.abs() < SINGULAR {
        return None;
    }
    let sxy: f64 = points.iter().map(|(x, y)| x * y).sum();
    finite(NumericFn::Scale { a: sxy / sxx })
}

/// Ordinary least squares line, returned as `(slope, intercept)`.
fn line(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    if sxx < SINGULAR {
        return None;
    }
    let sxy: f64 = points
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

fn fit_affine(points: &[(f64, f64)]) -> Option<NumericFn> {
    let (a, b) = line(points)?;
    finite(NumericFn::Affine { a, b })
}

fn fit_quadratic(points: &[(f64, f64)]) -> Option<NumericFn> {
    let mut distinct: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    if distinct.len() < 3 {
        return None;
    }

    // Normal equations for y = c + b*x + a*x^2.
    let mut power_sums = [0.0_f64; 5];
    let mut rhs = [0.0_f64; 3];
    for (x, y) in points {
        for (k, sum) in power_sums.iter_mut().enumerate() {
            *sum += x.powi(k as i32);
        }
        for (k, sum) in rhs.iter_mut().enumerate() {
            *sum += y * x.powi(k as i32);
        }
    }
    let mut system = [[0.0_f64; 4]; 3];
    for (i, row) in system.iter_mut().enumerate() {
        row[..3].copy_from_slice(&power_sums[i..i + 3]);
        row[3] = rhs[i];
    }
    let [c, b, a] = solve3(system)?;
    finite(NumericFn::Quadratic { a, b, c })
}

fn fit_power(points: &[(f64, f64)]) -> Option<NumericFn> {
    if points.iter().any(|&(x, y)| x <= 0.0 || y <= 0.0) {
        return None;
    }
    let logs: Vec<(f64, f64)> = points.iter().map(|(x, y)| (x.ln(), y.ln())).collect();
    let (b, ln_a) = line(&logs)?;
    finite(NumericFn::Power { a: ln_a.exp(), b })
}

fn fit_exponential(points: &[(f64, f64)]) -> Option<NumericFn> {
    if points.iter().any(|&(_, y)| y <= 0.0) {
        return None;
    }
    let logs: Vec<(f64, f64)> = points.iter().map(|(x, y)| (*x, y.ln())).collect();
    let (b, ln_a) = line(&logs)?;
    finite(NumericFn::Exponential { a: ln_a.exp(), b })
}

fn finite(function: NumericFn) -> Option<NumericFn> {
    function
        .coefficients()
        .iter()
        .all(|c| c.is_finite())
        .then_some(function)
}

/// Gauss-Jordan elimination with partial pivoting on an augmented 3x3 system.
fn solve3(mut m: [[f64; 4]; 3]) -> Option<[f64; 3]> {
    for col in 0..3 {
        let pivot = (col..3).max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))?;
        if m[pivot][col].abs() < SINGULAR {
            return None;
        }
        m.swap(col, pivot);
        for row in 0..3 {
            if row != col {
                let factor = m[row][col] / m[col][col];
                for k in col..4 {
                    m[row][k] -= factor * m[col][k];
                }
            }
        }
    }
    Some([m[0][3] / m[0][0], m[1][3] / m[1][1], m[2][3] / m[2][2]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn examples(pairs: &[(&str, &str)]) -> ExampleSet {
        ExampleSet::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_pounds_to_kilograms_style_scale() {
        let program = fit_numeric(&examples(&[("5", "2.2046"), ("10", "4.4092")])).unwrap();
        assert_eq!(program.code(), "fixed(scale(number(input), 0.44092), 4)");
        assert_eq!(program.run("20").unwrap(), "8.8184");
    }

    #[test]
    fn test_affine_celsius_to_fahrenheit() {
        let program =
            fit_numeric(&examples(&[("0", "32"), ("100", "212"), ("37", "98.6")])).unwrap();
        assert_eq!(program.code(), "round(affine(number(input), 1.8, 32), 1)");
        assert_eq!(program.run("-40").unwrap(), "-40");
    }

    #[test]
    fn test_quadratic() {
        let program =
            fit_numeric(&examples(&[("1", "1"), ("2", "4"), ("3", "9"), ("4", "16")])).unwrap();
        assert_eq!(program.run("12").unwrap(), "144");
    }

    #[test]
    fn test_exponential_doubling() {
        let program =
            fit_numeric(&examples(&[("0", "1"), ("1", "2"), ("2", "4"), ("3", "8"), ("5", "32")]))
                .unwrap();
        assert_eq!(program.run("4").unwrap(), "16");
    }

    #[test]
    fn test_non_numeric_rejected() {
        assert!(fit_numeric(&examples(&[("5", "five")])).is_none());
        assert!(fit_numeric(&examples(&[("abc", "2")])).is_none());
    }

    #[test]
    fn test_inconsistent_rejected() {
        let scattered = examples(&[("1", "7"), ("2", "3"), ("3", "12"), ("4", "1")]);
        assert!(fit_numeric(&scattered).is_none());
    }

    #[test]
    fn test_infer_formats() {
        assert_eq!(
            infer_formats(["2.20", "4.41"].into_iter()),
            Some(vec![NumberFormat::Fixed(2), NumberFormat::Round(2)])
        );
        assert_eq!(
            infer_formats(["32", "98.6"].into_iter()),
            Some(vec![NumberFormat::Round(1)])
        );
        assert_eq!(infer_formats(["1e5"].into_iter()), None);
        let long = format!("0.{}", "1".repeat(18));
        assert_eq!(infer_formats([long.as_str()].into_iter()), None);
    }
}
