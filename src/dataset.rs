//! Data type and methods to store a time-indexed PIP dataset.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use itertools::Itertools;
use ndarray::{concatenate, Array2, ArrayView2, Axis};
use optional::Optioned;

use crate::{
    error::{AnalysisError, Result},
    keys::DistributionKind,
};

pub use self::{
    site_info::SiteInfo,
    variable::{DType, Variable},
};

/// All the variables measured at a site over a period of time.
///
/// Every variable shares the dataset's time index. Time series hold one value per timestep,
/// binned variables hold a (time × bin) array and name the bin-center vector they are sampled
/// on, which must also be stored in the dataset.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    // Where the data was measured.
    site: SiteInfo,

    // Shared time index.
    time: Vec<NaiveDateTime>,

    // Variables by flat name.
    variables: BTreeMap<String, Variable>,

    // Bin-center vectors by flat name.
    bin_centers: BTreeMap<String, Vec<f64>>,
}

impl Dataset {
    /// Create a new dataset with the given time index and no variables.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use pip_analysis::Dataset;
    ///
    /// let t0 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    /// let ds = Dataset::new(vec![t0]);
    /// assert_eq!(ds.len(), 1);
    /// ```
    #[inline]
    pub fn new(time: Vec<NaiveDateTime>) -> Self {
        Dataset {
            time,
            ..Dataset::default()
        }
    }

    /// Builder function for setting the site info.
    #[inline]
    pub fn with_site_info(mut self, new_value: SiteInfo) -> Self {
        self.site = new_value;
        self
    }

    /// Get the site info.
    #[inline]
    pub fn site_info(&self) -> &SiteInfo {
        &self.site
    }

    /// Builder method to register a bin-center vector.
    ///
    /// Replacing a registered vector fails if a binned variable sampled on it has a different
    /// number of bins.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pip_analysis::{doctest::make_test_dataset, DistributionKind};
    ///
    /// let axis = DistributionKind::ParticleSize.bin_centers_name();
    /// let ds = make_test_dataset();
    ///
    /// assert!(ds.clone().with_bin_centers(&axis, vec![0.5, 1.5, 2.5, 3.5, 4.5]).is_ok());
    /// assert!(ds.with_bin_centers(&axis, vec![1.0, 2.0]).is_err());
    /// ```
    pub fn with_bin_centers<S: Into<String>>(mut self, name: S, centers: Vec<f64>) -> Result<Self> {
        let name = name.into();

        let in_use = self
            .variables
            .values()
            .filter(|var| var.axis() == Some(name.as_str()))
            .filter_map(|var| var.as_binned())
            .map(|values| values.ncols())
            .find(|&ncols| ncols != centers.len());

        if let Some(ncols) = in_use {
            return Err(AnalysisError::LengthMismatch {
                name: format!("{} bins", name),
                expected: ncols,
                found: centers.len(),
            });
        }

        self.bin_centers.insert(name, centers);
        Ok(self)
    }

    /// Builder method to add a time series.
    ///
    /// Fails if the series does not have one value per timestep.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pip_analysis::doctest::make_test_dataset;
    /// use optional::some;
    ///
    /// let ds = make_test_dataset();
    /// let n = ds.len();
    ///
    /// let ds = ds.with_series("extra", vec![some(1.0); n]).unwrap();
    /// assert_eq!(ds.series("extra").unwrap().len(), n);
    ///
    /// assert!(ds.with_series("short", vec![some(1.0)]).is_err());
    /// ```
    pub fn with_series<S: Into<String>>(self, name: S, values: Vec<Optioned<f64>>) -> Result<Self> {
        self.with_variable(name, Variable::series(values))
    }

    /// Builder method to add a binned variable sampled on the bin-center vector `axis`.
    ///
    /// Fails if the array does not have one row per timestep, if `axis` is not registered, or if
    /// the number of columns differs from the number of bin centers.
    pub fn with_binned<S, A>(self, name: S, values: Array2<f64>, axis: A) -> Result<Self>
    where
        S: Into<String>,
        A: Into<String>,
    {
        self.with_variable(name, Variable::binned(values, axis))
    }

    /// Builder method to add any variable, checking it against the time index and bin axes.
    pub fn with_variable<S: Into<String>>(mut self, name: S, var: Variable) -> Result<Self> {
        let name = name.into();

        if var.len() != self.time.len() {
            return Err(AnalysisError::LengthMismatch {
                name,
                expected: self.time.len(),
                found: var.len(),
            });
        }

        if let Variable::Binned { values, axis, .. } = &var {
            let centers = self.bin_centers(axis)?;
            if centers.len() != values.ncols() {
                return Err(AnalysisError::LengthMismatch {
                    name: format!("{} bins", name),
                    expected: centers.len(),
                    found: values.ncols(),
                });
            }
        }

        self.variables.insert(name, var);
        Ok(self)
    }

    /// The time index.
    #[inline]
    pub fn time(&self) -> &[NaiveDateTime] {
        &self.time
    }

    /// Number of timesteps.
    #[inline]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether there are no timesteps.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Look up a variable by its flat name.
    #[inline]
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Iterate over the variables in name order.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over the registered bin-center vectors in name order.
    pub fn bin_axes(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.bin_centers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Get a time series by name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pip_analysis::{doctest::make_test_dataset, AnalysisError};
    ///
    /// let ds = make_test_dataset();
    ///
    /// assert_eq!(ds.series("ed_adj").unwrap().len(), ds.len());
    /// assert!(matches!(ds.series("nope"), Err(AnalysisError::MissingVariable(_))));
    /// assert!(matches!(
    ///     ds.series("particle_size_distributions_psd"),
    ///     Err(AnalysisError::WrongKind { .. })
    /// ));
    /// ```
    pub fn series(&self, name: &str) -> Result<&[Optioned<f64>]> {
        let var = self.require(name)?;
        var.as_series().ok_or_else(|| AnalysisError::WrongKind {
            name: name.to_owned(),
            expected: "series",
        })
    }

    /// Get a binned variable by name.
    pub fn binned(&self, name: &str) -> Result<ArrayView2<f64>> {
        let var = self.require(name)?;
        var.as_binned().ok_or_else(|| AnalysisError::WrongKind {
            name: name.to_owned(),
            expected: "binned",
        })
    }

    /// Get a bin-center vector by name.
    pub fn bin_centers(&self, name: &str) -> Result<&[f64]> {
        self.bin_centers
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| AnalysisError::MissingBinAxis(name.to_owned()))
    }

    /// Get one of the instrument distributions together with its bin centers.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pip_analysis::{doctest::make_test_dataset, DistributionKind};
    ///
    /// let ds = make_test_dataset();
    /// let (psd, centers) = ds.distribution(DistributionKind::ParticleSize).unwrap();
    ///
    /// assert_eq!(psd.nrows(), ds.len());
    /// assert_eq!(psd.ncols(), centers.len());
    /// ```
    pub fn distribution(&self, kind: DistributionKind) -> Result<(ArrayView2<f64>, &[f64])> {
        let name = kind.variable_name();
        let values = self.binned(&name)?;
        let axis = self
            .variables
            .get(&name)
            .and_then(Variable::axis)
            .ok_or(AnalysisError::MissingVariable(name))?;

        Ok((values, self.bin_centers(axis)?))
    }

    /// Create a new dataset holding only the timesteps at `indices`, in that order. All
    /// variables are sliced consistently, bin axes and site info are kept.
    ///
    /// # Panics
    ///
    /// If any index is out of range.
    pub fn select_times(&self, indices: &[usize]) -> Dataset {
        Dataset {
            site: self.site,
            time: indices.iter().map(|&i| self.time[i]).collect(),
            variables: self
                .variables
                .iter()
                .map(|(name, var)| (name.clone(), var.select(indices)))
                .collect(),
            bin_centers: self.bin_centers.clone(),
        }
    }

    /// Rename every variable and bin axis with `rename`, keeping binned variables pointed at
    /// their renamed axes.
    pub fn renamed<F: Fn(&str) -> String>(self, rename: F) -> Dataset {
        let Dataset {
            site,
            time,
            variables,
            bin_centers,
        } = self;

        Dataset {
            site,
            time,
            variables: variables
                .into_iter()
                .map(|(name, var)| (rename(&name), var.rename_axis(&rename)))
                .collect(),
            bin_centers: bin_centers
                .into_iter()
                .map(|(name, centers)| (rename(&name), centers))
                .collect(),
        }
    }

    /// Merge two datasets into one.
    ///
    /// The time indexes are joined (the result is sorted), timesteps missing from one side are
    /// filled with missing values. A variable present in both must agree wherever both sides
    /// have a value, and bin axes with the same name must be identical.
    pub fn merge(self, other: Dataset) -> Result<Dataset> {
        let time: Vec<NaiveDateTime> = self
            .time
            .iter()
            .chain(other.time.iter())
            .copied()
            .sorted()
            .dedup()
            .collect();

        let left = self.reindexed(&time);
        let right = other.reindexed(&time);

        let mut merged = Dataset {
            site: left.site.or(right.site),
            time,
            variables: left.variables,
            bin_centers: left.bin_centers,
        };

        for (name, centers) in right.bin_centers {
            match merged.bin_centers.get(&name) {
                Some(existing) if !variable::same_values(existing, &centers) => {
                    return Err(AnalysisError::MergeConflict(name));
                }
                Some(_) => {}
                None => {
                    merged.bin_centers.insert(name, centers);
                }
            }
        }

        for (name, var) in right.variables {
            let combined = match merged.variables.get(&name) {
                Some(existing) => existing
                    .combine(&var)
                    .ok_or_else(|| AnalysisError::MergeConflict(name.clone()))?,
                None => var,
            };
            merged.variables.insert(name, combined);
        }

        Ok(merged)
    }

    /// Concatenate datasets along the time dimension, in iteration order.
    ///
    /// Every dataset must carry the same variables and bin axes. An empty iterator gives an empty
    /// dataset.
    pub fn concat<I>(datasets: I) -> Result<Dataset>
    where
        I: IntoIterator<Item = Dataset>,
    {
        let mut iter = datasets.into_iter();
        let first = match iter.next() {
            Some(first) => first,
            None => return Ok(Dataset::default()),
        };
        let rest: Vec<Dataset> = iter.collect();

        for ds in &rest {
            check_same_layout(&first, ds)?;
            check_same_layout(ds, &first)?;
        }

        let time: Vec<NaiveDateTime> = first
            .time
            .iter()
            .chain(rest.iter().flat_map(|ds| ds.time.iter()))
            .copied()
            .collect();

        let site = rest.iter().fold(first.site, |acc, ds| acc.or(ds.site));

        let mut variables = BTreeMap::new();
        for (name, var) in &first.variables {
            let parts: Vec<&Variable> = std::iter::once(var)
                .chain(rest.iter().filter_map(|ds| ds.variables.get(name)))
                .collect();
            variables.insert(name.clone(), concat_variable(name, &parts)?);
        }

        Ok(Dataset {
            site,
            time,
            variables,
            bin_centers: first.bin_centers,
        })
    }

    fn require(&self, name: &str) -> Result<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| AnalysisError::MissingVariable(name.to_owned()))
    }

    fn reindexed(self, time: &[NaiveDateTime]) -> Dataset {
        if self.time == time {
            return self;
        }

        let lookup: HashMap<NaiveDateTime, usize> =
            self.time.iter().enumerate().map(|(i, &t)| (t, i)).collect();
        let positions: Vec<Option<usize>> = time.iter().map(|t| lookup.get(t).copied()).collect();

        Dataset {
            site: self.site,
            time: time.to_vec(),
            variables: self
                .variables
                .iter()
                .map(|(name, var)| (name.clone(), var.reindex(&positions)))
                .collect(),
            bin_centers: self.bin_centers,
        }
    }
}

fn check_same_layout(a: &Dataset, b: &Dataset) -> Result<()> {
    if let Some(name) = a.variables.keys().find(|k| !b.variables.contains_key(*k)) {
        return Err(AnalysisError::ConcatMismatch(name.clone()));
    }

    for (name, centers) in &a.bin_centers {
        match b.bin_centers.get(name) {
            Some(other) if variable::same_values(centers, other) => {}
            _ => return Err(AnalysisError::ConcatMismatch(name.clone())),
        }
    }

    Ok(())
}

fn concat_variable(name: &str, parts: &[&Variable]) -> Result<Variable> {
    let first = parts[0];

    if parts.iter().any(|v| v.kind_name() != first.kind_name()) {
        return Err(AnalysisError::WrongKind {
            name: name.to_owned(),
            expected: first.kind_name(),
        });
    }

    match first {
        Variable::Series { dtype, .. } => Ok(Variable::Series {
            values: parts
                .iter()
                .filter_map(|v| v.as_series())
                .flat_map(|vals| vals.iter().copied())
                .collect(),
            dtype: *dtype,
        }),
        Variable::Binned { values, axis, dtype } => {
            let views: Vec<ArrayView2<f64>> = parts.iter().filter_map(|v| v.as_binned()).collect();
            let joined = concatenate(Axis(0), &views).map_err(|_| AnalysisError::LengthMismatch {
                name: format!("{} bins", name),
                expected: values.ncols(),
                found: views
                    .iter()
                    .map(|v| v.ncols())
                    .find(|&n| n != values.ncols())
                    .unwrap_or(0),
            })?;

            Ok(Variable::Binned {
                values: joined,
                axis: axis.clone(),
                dtype: *dtype,
            })
        }
    }
}

// Only needed for doc tests and tests, but those cannot see `cfg(test)` items.
#[doc(hidden)]
pub mod doctest {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use ndarray::Array2;
    use optional::some;

    /// Bin centers (mm) used by the test datasets.
    pub const TEST_BIN_CENTERS: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];

    /// Time index of `n` consecutive minutes starting at midnight on 2020-01-01.
    pub fn minutes(n: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");

        (0..n).map(|i| start + Duration::minutes(i as i64)).collect()
    }

    /// A six minute dataset with an `ed_adj` classifier, precipitation rates and a particle size
    /// distribution following `500 exp(-1.5 D)`.
    pub fn make_test_dataset() -> Dataset {
        let ed_adj = vec![0.1, 0.4, 0.9, 0.2, 0.5, 0.35];
        let rr_adj = vec![0.0, 0.0, 1.2, 0.0, 0.8, 0.0];
        let nrr_adj = vec![0.5, 0.3, 0.0, 0.6, 0.0, 0.4];

        let psd = Array2::from_shape_fn((ed_adj.len(), TEST_BIN_CENTERS.len()), |(_, j)| {
            500.0 * (-1.5 * TEST_BIN_CENTERS[j]).exp()
        });

        Dataset::new(minutes(ed_adj.len()))
            .with_site_info(SiteInfo::new_with_values(
                crate::keys::Site::Mqt,
                (46.53, -87.55),
            ))
            .with_bin_centers(
                DistributionKind::ParticleSize.bin_centers_name(),
                TEST_BIN_CENTERS.to_vec(),
            )
            .and_then(|ds| ds.with_series("ed_adj", ed_adj.into_iter().map(some).collect()))
            .and_then(|ds| ds.with_series("rr_adj", rr_adj.into_iter().map(some).collect()))
            .and_then(|ds| ds.with_series("nrr_adj", nrr_adj.into_iter().map(some).collect()))
            .and_then(|ds| {
                ds.with_binned(
                    DistributionKind::ParticleSize.variable_name(),
                    psd,
                    DistributionKind::ParticleSize.bin_centers_name(),
                )
            })
            .expect("consistent test dataset")
    }
}

#[cfg(test)]
mod test {
    use super::doctest::*;
    use super::*;
    use ndarray::array;
    use optional::{none, some};

    fn series(vals: &[f64]) -> Vec<Optioned<f64>> {
        vals.iter().copied().map(some).collect()
    }

    #[test]
    fn test_builder_checks_lengths() {
        let ds = Dataset::new(minutes(3))
            .with_bin_centers("axis", vec![1.0, 2.0])
            .unwrap();

        assert!(ds.clone().with_series("a", series(&[1.0, 2.0, 3.0])).is_ok());
        assert!(ds.clone().with_series("a", series(&[1.0, 2.0])).is_err());
        assert!(ds
            .clone()
            .with_binned("b", Array2::zeros((3, 2)), "axis")
            .is_ok());
        assert!(ds
            .clone()
            .with_binned("b", Array2::zeros((3, 3)), "axis")
            .is_err());
        assert!(matches!(
            ds.with_binned("b", Array2::zeros((3, 2)), "other"),
            Err(AnalysisError::MissingBinAxis(_))
        ));
    }

    #[test]
    fn test_replacing_bin_centers_in_use() {
        let axis = DistributionKind::ParticleSize.bin_centers_name();
        let ds = make_test_dataset();

        assert!(matches!(
            ds.clone().with_bin_centers(axis.as_str(), vec![1.0, 2.0]),
            Err(AnalysisError::LengthMismatch {
                expected: 5,
                found: 2,
                ..
            })
        ));

        let shifted: Vec<f64> = TEST_BIN_CENTERS.iter().map(|c| c + 0.5).collect();
        let ds = ds.with_bin_centers(axis.as_str(), shifted.clone()).unwrap();
        let (values, centers) = ds.distribution(DistributionKind::ParticleSize).unwrap();
        assert_eq!(centers, shifted.as_slice());
        assert_eq!(values.ncols(), centers.len());

        // Axes nothing is sampled on can take any length.
        let ds = ds.with_bin_centers("unused", vec![1.0, 2.0]).unwrap();
        assert_eq!(ds.bin_centers("unused").unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_select_times() {
        let ds = make_test_dataset();
        let sub = ds.select_times(&[4, 1]);

        assert_eq!(sub.time(), &[ds.time()[4], ds.time()[1]]);
        assert_eq!(sub.series("ed_adj").unwrap()[0].unwrap(), 0.5);
        assert_eq!(sub.series("ed_adj").unwrap()[1].unwrap(), 0.4);
        assert_eq!(
            sub.binned("particle_size_distributions_psd").unwrap().nrows(),
            2
        );
        assert_eq!(sub.site_info(), ds.site_info());
    }

    #[test]
    fn test_renamed_follows_axes() {
        let ds = Dataset::new(minutes(1))
            .with_bin_centers("bin_centers", vec![1.0])
            .and_then(|ds| ds.with_binned("psd", array![[3.0]], "bin_centers"))
            .unwrap()
            .renamed(|n| format!("particle_size_distributions_{}", n));

        let (values, centers) = ds.distribution(DistributionKind::ParticleSize).unwrap();
        assert_eq!(values[[0, 0]], 3.0);
        assert_eq!(centers, &[1.0]);
    }

    #[test]
    fn test_merge_outer_joins_time() {
        let t = minutes(3);
        let a = Dataset::new(vec![t[0], t[1]])
            .with_series("a", series(&[1.0, 2.0]))
            .unwrap();
        let b = Dataset::new(vec![t[2], t[1]])
            .with_series("b", series(&[30.0, 20.0]))
            .unwrap();

        let merged = a.merge(b).unwrap();
        assert_eq!(merged.time(), t.as_slice());

        let a_vals = merged.series("a").unwrap();
        assert_eq!(a_vals[0].unwrap(), 1.0);
        assert_eq!(a_vals[1].unwrap(), 2.0);
        assert!(a_vals[2].is_none());

        let b_vals = merged.series("b").unwrap();
        assert!(b_vals[0].is_none());
        assert_eq!(b_vals[1].unwrap(), 20.0);
        assert_eq!(b_vals[2].unwrap(), 30.0);
    }

    #[test]
    fn test_merge_conflicts() {
        let t = minutes(1);
        let a = Dataset::new(t.clone())
            .with_series("a", series(&[1.0]))
            .unwrap();
        let b = Dataset::new(t.clone())
            .with_series("a", series(&[2.0]))
            .unwrap();
        assert!(matches!(
            a.clone().merge(b),
            Err(AnalysisError::MergeConflict(_))
        ));

        let c = Dataset::new(t).with_series("a", vec![none()]).unwrap();
        let merged = a.merge(c).unwrap();
        assert_eq!(merged.series("a").unwrap()[0].unwrap(), 1.0);

        let x = Dataset::new(vec![])
            .with_bin_centers("axis", vec![1.0])
            .unwrap();
        let y = Dataset::new(vec![])
            .with_bin_centers("axis", vec![2.0])
            .unwrap();
        assert!(x.merge(y).is_err());
    }

    #[test]
    fn test_concat() {
        let day1 = make_test_dataset();
        let t: Vec<NaiveDateTime> = day1
            .time()
            .iter()
            .map(|&t| t + chrono::Duration::days(1))
            .collect();
        let day2 = Dataset::new(t)
            .with_site_info(*day1.site_info())
            .with_bin_centers(
                DistributionKind::ParticleSize.bin_centers_name(),
                TEST_BIN_CENTERS.to_vec(),
            )
            .and_then(|ds| ds.with_series("ed_adj", vec![some(0.7); 6]))
            .and_then(|ds| ds.with_series("rr_adj", vec![none(); 6]))
            .and_then(|ds| ds.with_series("nrr_adj", vec![none(); 6]))
            .and_then(|ds| {
                ds.with_binned(
                    "particle_size_distributions_psd",
                    Array2::zeros((6, 5)),
                    DistributionKind::ParticleSize.bin_centers_name(),
                )
            })
            .unwrap();

        let joined = Dataset::concat(vec![day1.clone(), day2.clone()]).unwrap();
        assert_eq!(joined.len(), 12);
        assert_eq!(&joined.time()[..6], day1.time());
        assert_eq!(&joined.time()[6..], day2.time());
        assert_eq!(joined.series("ed_adj").unwrap()[7].unwrap(), 0.7);
        assert_eq!(
            joined
                .binned("particle_size_distributions_psd")
                .unwrap()
                .nrows(),
            12
        );

        let missing = Dataset::new(minutes(1));
        assert!(matches!(
            Dataset::concat(vec![day1, missing]),
            Err(AnalysisError::ConcatMismatch(_))
        ));

        assert!(Dataset::concat(Vec::new()).unwrap().is_empty());
    }
}

mod site_info;
mod variable;
