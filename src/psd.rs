//! Exponential model parameters of particle size distributions.
//!
//! The particle size distribution is modeled as `N(D) = N0 exp(-λ D)` where `D` is the particle
//! diameter in mm. The parameters are estimated by fitting the time averaged distribution.
use itertools::izip;
use log::{debug, warn};
use metfor::{Mm, Quantity};
use ndarray::ArrayView2;
use optional::{none, some, Optioned};

use crate::{
    dataset::Dataset,
    error::{AnalysisError, Result},
    keys::DistributionKind,
    reductions::{sum_missing_as_zero, time_means},
};

pub use self::fit::{fit_inverse_exponential, ExponentialFit, FitError};

/// Starting value for the intercept.
pub const INITIAL_N0: f64 = 1.0e4;
/// Starting value for the decay rate.
pub const INITIAL_LAMBDA: f64 = 2.0;
/// Cap on model evaluations during a fit.
pub const MAX_EVALUATIONS: usize = 600;
/// Fits with an intercept at or above this are rejected.
pub const N0_UPPER_BOUND: f64 = 1.0e7;
/// Fits with a decay rate at or above this are rejected.
pub const LAMBDA_UPPER_BOUND: f64 = 10.0;
/// Largest diameter sampled when drawing a model curve.
pub const CURVE_MAX_DIAMETER: Mm = Mm(26.1);
/// Number of samples when drawing a model curve.
pub const CURVE_SAMPLES: usize = 131;

/// Parameters of the exponential model for a particle size distribution, along with the total
/// particle count.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PsdParameters {
    /// Intercept, m^-3 mm^-1. Zero if no valid fit was found.
    pub n0: f64,
    /// Decay rate, mm^-1. Zero if no valid fit was found.
    pub lambda: f64,
    /// Sum of the distribution over all times and bins, missing values counted as zero.
    pub count: i64,
}

impl PsdParameters {
    /// Whether the parameters came from a valid fit.
    #[inline]
    pub fn is_fitted(&self) -> bool {
        self.n0 > 0.0 && self.lambda > 0.0
    }

    /// The model evaluated at a diameter, missing if there is no fit.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metfor::Mm;
    /// use pip_analysis::psd::PsdParameters;
    ///
    /// let params = PsdParameters { n0: 100.0, lambda: 1.0, count: 12 };
    /// assert_eq!(params.evaluate(Mm(0.0)).unwrap(), 100.0);
    ///
    /// let params = PsdParameters { count: 12, ..PsdParameters::default() };
    /// assert!(params.evaluate(Mm(0.0)).is_none());
    /// ```
    pub fn evaluate(&self, diameter: Mm) -> Optioned<f64> {
        if !self.is_fitted() {
            return none();
        }

        some(self.n0 * (-self.lambda * diameter.unpack()).exp())
    }

    /// The mean particle diameter of the modeled distribution, `1 / λ`.
    pub fn mean_diameter(&self) -> Optioned<Mm> {
        if !self.is_fitted() {
            return none();
        }

        some(Mm(1.0 / self.lambda))
    }

    /// Sample the model at `samples` evenly spaced diameters from 0 to `max_diameter` inclusive.
    ///
    /// Empty if there is no fit.
    pub fn curve(&self, max_diameter: Mm, samples: usize) -> Vec<(Mm, f64)> {
        if !self.is_fitted() {
            return vec![];
        }

        let step = if samples > 1 {
            max_diameter.unpack() / (samples - 1) as f64
        } else {
            0.0
        };

        (0..samples)
            .map(|i| Mm(i as f64 * step))
            .map(|d| (d, self.n0 * (-self.lambda * d.unpack()).exp()))
            .collect()
    }
}

/// Fit the exponential model to a (time × bin) particle size distribution.
///
/// The distribution is averaged over time skipping missing values, bins with no data are dropped,
/// and the model is fitted to what is left. A failed fit, or one outside `0 < N0 < 1e7` and
/// `0 < λ < 10`, is reported as zero for both parameters. The count is always computed.
///
/// # Examples
///
/// ```rust
/// use ndarray::Array2;
/// use pip_analysis::psd::psd_parameters;
///
/// let centers: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let psd = Array2::from_shape_fn((10, 5), |(_, j)| 500.0 * (-1.5 * centers[j]).exp());
///
/// let params = psd_parameters(psd.view(), &centers).unwrap();
/// assert!((params.n0 - 500.0).abs() < 1.0e-3);
/// assert!((params.lambda - 1.5).abs() < 1.0e-6);
/// ```
///
/// # Errors
///
/// Only if the number of bin centers does not match the number of columns.
pub fn psd_parameters(psd: ArrayView2<f64>, bin_centers: &[f64]) -> Result<PsdParameters> {
    if psd.ncols() != bin_centers.len() {
        return Err(AnalysisError::LengthMismatch {
            name: "bin centers".to_owned(),
            expected: psd.ncols(),
            found: bin_centers.len(),
        });
    }

    let count = sum_missing_as_zero(psd.iter()) as i64;
    let means = time_means(psd);

    let (n0, lambda) = match fit_psd(&means, bin_centers) {
        Ok(fit) => (fit.n0, fit.lambda),
        Err(err @ FitError::OutOfBounds { .. }) => {
            debug!("rejected PSD fit: {}", err);
            (0.0, 0.0)
        }
        Err(err) => {
            warn!("PSD fit failed: {}", err);
            (0.0, 0.0)
        }
    };

    Ok(PsdParameters { n0, lambda, count })
}

/// [`psd_parameters`] for the particle size distribution stored in a dataset.
///
/// ```rust
/// use pip_analysis::{doctest::make_test_dataset, psd::dataset_psd_parameters};
///
/// let params = dataset_psd_parameters(&make_test_dataset()).unwrap();
/// assert!(params.is_fitted());
/// ```
pub fn dataset_psd_parameters(ds: &Dataset) -> Result<PsdParameters> {
    let (psd, centers) = ds.distribution(DistributionKind::ParticleSize)?;
    psd_parameters(psd, centers)
}

/// Fit the model to time-mean bin values, skipping bins with missing means, and check the
/// parameters against the physical bounds.
pub fn fit_psd(
    means: &[Optioned<f64>],
    bin_centers: &[f64],
) -> std::result::Result<ExponentialFit, FitError> {
    let (x, y): (Vec<f64>, Vec<f64>) = izip!(bin_centers, means)
        .filter_map(|(&center, mean)| mean.into_option().map(|m| (center, m)))
        .unzip();

    let fit = fit_inverse_exponential(&x, &y, (INITIAL_N0, INITIAL_LAMBDA), MAX_EVALUATIONS)?;

    let in_bounds = |value: f64, upper: f64| value > 0.0 && value < upper;
    if in_bounds(fit.n0, N0_UPPER_BOUND) && in_bounds(fit.lambda, LAMBDA_UPPER_BOUND) {
        Ok(fit)
    } else {
        Err(FitError::OutOfBounds {
            n0: fit.n0,
            lambda: fit.lambda,
        })
    }
}


mod fit;
