//! Non-linear least squares fit of `y = a * exp(-b * x)`.
//!
//! A two parameter Levenberg-Marquardt solver. The normal equations are only 2×2, so they are
//! solved directly instead of pulling in a linear algebra library.
use itertools::izip;
use thiserror::Error;

/// Relative reduction in the cost function below which the fit is converged.
const FTOL: f64 = 1.49012e-8;
/// Relative step size below which the fit is converged.
const XTOL: f64 = 1.49012e-8;
/// Initial damping factor.
const INITIAL_DAMPING: f64 = 1.0e-3;
/// Damping factor beyond which no step will ever reduce the cost.
const MAX_DAMPING: f64 = 1.0e32;
/// Smallest diagonal element used to scale the damping term.
const MIN_SCALE: f64 = 1.0e-12;

/// Parameters of a converged fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialFit {
    /// Intercept, the model value at `x = 0`.
    pub n0: f64,
    /// Decay rate.
    pub lambda: f64,
    /// Number of model evaluations used.
    pub evaluations: usize,
}

/// Reasons a fit may not produce usable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FitError {
    /// At least two points are needed to fit two parameters.
    #[error("Need at least 2 points to fit, found {0}.")]
    NotEnoughPoints(usize),
    /// The cap on model evaluations was reached before converging.
    #[error("No convergence after {0} model evaluations.")]
    MaxEvaluations(usize),
    /// The damped normal equations could not be solved.
    #[error("Singular normal equations.")]
    Singular,
    /// The model or data produced non-finite residuals at the starting point.
    #[error("Non-finite residuals.")]
    NonFinite,
    /// No step in the search direction reduces the cost.
    #[error("The damping factor grew without reducing the cost.")]
    Stalled,
    /// The fit converged to parameters that are not physically meaningful.
    #[error("Fitted parameters out of bounds: N0 = {n0}, lambda = {lambda}.")]
    OutOfBounds {
        /// Fitted intercept.
        n0: f64,
        /// Fitted decay rate.
        lambda: f64,
    },
}

/// Fit `y = n0 * exp(-lambda * x)` to the points `(x, y)` by Levenberg-Marquardt, starting from
/// `initial = (n0, lambda)` and evaluating the model at most `max_evaluations` times.
///
/// Bounds are not checked here.
///
/// # Examples
///
/// ```rust
/// use pip_analysis::psd::fit_inverse_exponential;
///
/// let x: [f64; 5] = [0.5, 1.0, 1.5, 2.0, 2.5];
/// let y: Vec<f64> = x.iter().map(|x| 3.0 * (-0.7 * x).exp()).collect();
///
/// let fit = fit_inverse_exponential(&x, &y, (1.0, 1.0), 600).unwrap();
/// assert!((fit.n0 - 3.0).abs() < 1.0e-6);
/// assert!((fit.lambda - 0.7).abs() < 1.0e-6);
/// ```
pub fn fit_inverse_exponential(
    x: &[f64],
    y: &[f64],
    initial: (f64, f64),
    max_evaluations: usize,
) -> Result<ExponentialFit, FitError> {
    debug_assert_eq!(x.len(), y.len());

    let num_points = x.len().min(y.len());
    if num_points < 2 {
        return Err(FitError::NotEnoughPoints(num_points));
    }

    let (mut a, mut b) = initial;
    let mut evaluations = 1;
    let mut cost = cost(x, y, a, b).ok_or(FitError::NonFinite)?;
    let mut damping = INITIAL_DAMPING;

    let converged = |a: f64, b: f64, evaluations: usize| -> Result<ExponentialFit, FitError> {
        Ok(ExponentialFit {
            n0: a,
            lambda: b,
            evaluations,
        })
    };

    loop {
        if cost == 0.0 {
            return converged(a, b, evaluations);
        }

        // Normal equations J^T J and gradient J^T r
        let (mut jtj11, mut jtj12, mut jtj22) = (0.0, 0.0, 0.0);
        let (mut g1, mut g2) = (0.0, 0.0);
        for (&xi, &yi) in izip!(x, y) {
            let e = (-b * xi).exp();
            let r = a * e - yi;
            let da = e;
            let db = -a * xi * e;

            jtj11 += da * da;
            jtj12 += da * db;
            jtj22 += db * db;
            g1 += da * r;
            g2 += db * r;
        }

        let scale1 = jtj11.max(MIN_SCALE);
        let scale2 = jtj22.max(MIN_SCALE);

        // Increase the damping until a step reduces the cost
        loop {
            if evaluations >= max_evaluations {
                return Err(FitError::MaxEvaluations(evaluations));
            }

            let d11 = jtj11 + damping * scale1;
            let d22 = jtj22 + damping * scale2;
            let det = d11 * d22 - jtj12 * jtj12;
            if det == 0.0 || !det.is_finite() {
                return Err(FitError::Singular);
            }

            let step_a = (-g1 * d22 + jtj12 * g2) / det;
            let step_b = (-g2 * d11 + jtj12 * g1) / det;
            let tiny_step =
                step_a.abs() <= XTOL * (a.abs() + XTOL) && step_b.abs() <= XTOL * (b.abs() + XTOL);

            let (trial_a, trial_b) = (a + step_a, b + step_b);
            evaluations += 1;

            match self::cost(x, y, trial_a, trial_b) {
                Some(trial_cost) if trial_cost < cost => {
                    let reduction = (cost - trial_cost) / cost;

                    a = trial_a;
                    b = trial_b;
                    cost = trial_cost;
                    damping /= 10.0;

                    if reduction <= FTOL || tiny_step {
                        return converged(a, b, evaluations);
                    }
                    break;
                }
                _ => {
                    if tiny_step {
                        return converged(a, b, evaluations);
                    }

                    damping *= 10.0;
                    if damping > MAX_DAMPING {
                        return Err(FitError::Stalled);
                    }
                }
            }
        }
    }
}

/// Sum of squared residuals, `None` if it is not finite.
fn cost(x: &[f64], y: &[f64], a: f64, b: f64) -> Option<f64> {
    let total: f64 = izip!(x, y)
        .map(|(&xi, &yi)| {
            let r = a * (-b * xi).exp() - yi;
            r * r
        })
        .sum();

    if total.is_finite() {
        Some(total)
    } else {
        None
    }
}
