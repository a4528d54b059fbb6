//! Derived values for the standard diagnostic plots. Nothing is drawn here, these are the
//! numbers a plotting front end needs.
use std::collections::BTreeMap;
use std::fmt::Display;

use itertools::izip;
use ndarray::ArrayView2;
use optional::{none, some, Optioned};

use crate::{
    dataset::Dataset,
    error::Result,
    keys::DistributionKind,
    loader::SiteYear,
    reductions::{bin_means_where, nan_max, time_means, time_stds},
};

/// Critical value of the normal distribution for a 95% confidence interval.
pub const Z_95: f64 = 1.96;

/// The measured and adjusted rainfall rates.
pub const RAINFALL_RATES: (&str, &str) = ("edensity_lwe_rate_rr", "rr_adj");
/// The measured and adjusted snowfall rates.
pub const SNOWFALL_RATES: (&str, &str) = ("edensity_lwe_rate_nrr", "nrr_adj");
/// The measured effective density.
pub const MEASURED_EFFECTIVE_DENSITY: &str = "edensity_lwe_rate_ed";

/// The time-mean of one bin of a distribution with its 95% confidence interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinMean {
    /// Bin center.
    pub center: f64,
    /// Mean over time, missing values skipped.
    pub mean: Optioned<f64>,
    /// Lower end of the confidence interval.
    pub lower: Optioned<f64>,
    /// Upper end of the confidence interval.
    pub upper: Optioned<f64>,
}

/// Mean of each bin of a distribution over time, with a confidence interval of
/// `mean ± 1.96 σ / √n` where `σ` is the population standard deviation of the bin and `n` is the
/// number of timesteps in the dataset.
pub fn distribution_means_with_ci(
    ds: &Dataset,
    kind: DistributionKind,
) -> Result<Vec<BinMean>> {
    let (values, centers) = ds.distribution(kind)?;

    let means = time_means(values);
    let stds = time_stds(values);
    let sqrt_n = (ds.len() as f64).sqrt();

    Ok(izip!(centers, means, stds)
        .map(|(&center, mean, std)| {
            let half_width = std.map_t(|std| Z_95 * std / sqrt_n);
            let (lower, upper) = match (mean.into_option(), half_width.into_option()) {
                (Some(mean), Some(hw)) => (some(mean - hw), some(mean + hw)),
                _ => (none(), none()),
            };

            BinMean {
                center,
                mean,
                lower,
                upper,
            }
        })
        .collect())
}

/// Mean over the bins at each timestep with zeros treated as missing.
///
/// ```rust
/// use ndarray::array;
/// use pip_analysis::diagnostics::nonzero_row_means;
///
/// let means = nonzero_row_means(array![[0.0, 0.2, 0.4], [0.0, 0.0, 0.0]].view());
/// assert!((means[0].unwrap() - 0.3).abs() < 1.0e-12);
/// assert!(means[1].is_none());
/// ```
pub fn nonzero_row_means(values: ArrayView2<f64>) -> Vec<Optioned<f64>> {
    bin_means_where(values, |v| v == 0.0)
}

/// A series paired with its adjusted version, for a scatter plot of one against the other.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentComparison {
    /// The values as measured.
    pub original: Vec<Optioned<f64>>,
    /// The adjusted values.
    pub adjusted: Vec<Optioned<f64>>,
    /// Largest measured value, used as the limit of both axes.
    pub axis_limit: Optioned<f64>,
}

/// Pair a measured series with its adjusted version.
///
/// ```rust
/// use pip_analysis::diagnostics::{adjustment_comparison, RAINFALL_RATES};
/// use pip_analysis::doctest::make_test_dataset;
///
/// let ds = make_test_dataset();
/// assert!(adjustment_comparison(&ds, RAINFALL_RATES.0, RAINFALL_RATES.1).is_err());
///
/// let cmp = adjustment_comparison(&ds, "rr_adj", "nrr_adj").unwrap();
/// assert_eq!(cmp.axis_limit.unwrap(), 1.2);
/// ```
pub fn adjustment_comparison(
    ds: &Dataset,
    original: &str,
    adjusted: &str,
) -> Result<AdjustmentComparison> {
    let original = ds.series(original)?;
    let adjusted = ds.series(adjusted)?;

    Ok(AdjustmentComparison {
        original: original.to_vec(),
        adjusted: adjusted.to_vec(),
        axis_limit: nan_max(original),
    })
}

/// Measured and adjusted effective density against the mean effective density distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveDensityComparison {
    /// Effective density as measured.
    pub measured: Vec<Optioned<f64>>,
    /// Adjusted effective density.
    pub adjusted: Vec<Optioned<f64>>,
    /// Per timestep mean of the non-zero bins of the effective density distribution.
    pub rho_means: Vec<Optioned<f64>>,
}

/// Build the measured and adjusted effective density comparison.
pub fn effective_density_comparison(ds: &Dataset) -> Result<EffectiveDensityComparison> {
    let (rho, _) = ds.distribution(DistributionKind::EffectiveDensity)?;

    Ok(EffectiveDensityComparison {
        measured: ds.series(MEASURED_EFFECTIVE_DENSITY)?.to_vec(),
        adjusted: ds.series("ed_adj")?.to_vec(),
        rho_means: nonzero_row_means(rho),
    })
}

/// Where a site-year was measured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteLocation {
    /// The site-year.
    pub key: SiteYear,
    /// Latitude and longitude, if known.
    pub location: Option<(f64, f64)>,
}

impl Display for SiteLocation {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.location {
            Some((lat, lon)) => write!(formatter, "{}: ({}, {})", self.key, lat, lon),
            None => write!(formatter, "{}: (unknown)", self.key),
        }
    }
}

/// The location of every loaded site-year, in key order.
pub fn site_locations(datasets: &BTreeMap<SiteYear, Dataset>) -> Vec<SiteLocation> {
    datasets
        .iter()
        .map(|(&key, ds)| SiteLocation {
            key,
            location: ds.site_info().location(),
        })
        .collect()
}
