//! Descriptive statistics of the time series in a dataset.
use std::fmt::{self, Display};

use optional::Optioned;

use crate::{
    dataset::{DType, Dataset, SiteInfo},
    reductions::{nan_count, nan_mean, nan_quantile, nan_std, nan_sum, nan_unique_count},
};

/// Variables left out of a summary.
pub const EXCLUDED_VARIABLES: [&str; 5] = [
    "lat",
    "lon",
    "edensity_distributions_rho",
    "particle_size_distributions_psd",
    "velocity_distributions_vvd",
];

/// Statistics of one time series. Missing values are skipped by every statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSummary {
    /// Flat variable name.
    pub name: String,
    /// Mean.
    pub mean: Optioned<f64>,
    /// Population standard deviation.
    pub std: Optioned<f64>,
    /// 25th percentile.
    pub p25: Optioned<f64>,
    /// Median.
    pub median: Optioned<f64>,
    /// 75th percentile.
    pub p75: Optioned<f64>,
    /// Number of values that are not missing.
    pub count: usize,
    /// Number of distinct values that are not missing.
    pub unique: usize,
    /// Sum, zero if all values are missing.
    pub sum: f64,
    /// Type the variable was stored as.
    pub dtype: DType,
    /// Memory used by the variable in bytes.
    pub nbytes: usize,
}

/// Summary of every time series in a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    /// Where the data came from.
    pub site: SiteInfo,
    /// Per variable statistics, in name order.
    pub variables: Vec<VariableSummary>,
}

impl DatasetSummary {
    /// Look up the summary for one variable.
    pub fn variable(&self, name: &str) -> Option<&VariableSummary> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// Compute descriptive statistics for every time series in the dataset.
///
/// Binned variables and the names in [`EXCLUDED_VARIABLES`] are skipped.
///
/// # Examples
///
/// ```rust
/// use pip_analysis::{describe::describe, doctest::make_test_dataset};
///
/// let summary = describe(&make_test_dataset());
/// let ed_adj = summary.variable("ed_adj").unwrap();
///
/// assert_eq!(ed_adj.count, 6);
/// assert!(summary.variable("particle_size_distributions_psd").is_none());
///
/// println!("{}", summary);
/// ```
pub fn describe(ds: &Dataset) -> DatasetSummary {
    let variables = ds
        .variables()
        .filter(|(name, _)| !EXCLUDED_VARIABLES.contains(name))
        .filter_map(|(name, var)| var.as_series().map(|vals| (name, var, vals)))
        .map(|(name, var, vals)| VariableSummary {
            name: name.to_owned(),
            mean: nan_mean(vals),
            std: nan_std(vals),
            p25: nan_quantile(vals, 0.25),
            median: nan_quantile(vals, 0.5),
            p75: nan_quantile(vals, 0.75),
            count: nan_count(vals),
            unique: nan_unique_count(vals),
            sum: nan_sum(vals),
            dtype: var.dtype(),
            nbytes: var.nbytes(),
        })
        .collect();

    DatasetSummary {
        site: *ds.site_info(),
        variables,
    }
}

struct Value(Optioned<f64>);

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0.into_option() {
            Some(v) => write!(f, "{}", v),
            None => write!(f, "nan"),
        }
    }
}

impl Display for VariableSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        writeln!(
            f,
            "    Mean = {}, Standard Deviation = {}",
            Value(self.mean),
            Value(self.std)
        )?;
        writeln!(
            f,
            "    25th Percentile = {}, Median = {}, 75th Percentile = {}",
            Value(self.p25),
            Value(self.median),
            Value(self.p75)
        )?;
        writeln!(
            f,
            "    Non-NaN Count = {}, Unique Values = {}",
            self.count, self.unique
        )?;
        writeln!(f, "    Sum = {}, Data Type = {}", self.sum, self.dtype)?;
        writeln!(f, "    Memory Usage = {} bytes", self.nbytes)
    }
}

impl Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Dataset statistics:")?;
        match self.site.location() {
            Some((lat, lon)) => writeln!(f, "Site position: ({}, {})", lat, lon)?,
            None => writeln!(f, "Site position: unknown")?,
        }
        writeln!(f)?;

        for var in &self.variables {
            writeln!(f, "{}", var)?;
        }

        Ok(())
    }
}
