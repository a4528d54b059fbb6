//! Reductions that are aware of missing values.
//!
//! Missing values are stored as NaN, either directly in an `f64` or as the "none" state of an
//! `Optioned<f64>`. Each function documents its own policy for missing values, there are two
//! different ones in use:
//!   - *exclude*: missing values do not take part in the reduction at all. If every value is
//!     missing the result is missing (mean, standard deviation, quantiles, max) or zero
//!     (counts, [`nan_sum`]).
//!   - *zero*: missing values count as zero. Only used for [`sum_missing_as_zero`], which is what
//!     particle counts need.
use itertools::Itertools;
use ndarray::{ArrayView2, Axis};
use optional::{none, some, Optioned};

/// Mean of the values that are present.
///
/// ```rust
/// use optional::some;
/// use pip_analysis::reductions::nan_mean;
///
/// let vals = [some(1.0), some(f64::NAN), some(3.0)];
/// assert_eq!(nan_mean(&vals).unwrap(), 2.0);
/// ```
pub fn nan_mean(values: &[Optioned<f64>]) -> Optioned<f64> {
    mean_of(present(values))
}

/// Population standard deviation (no degrees of freedom correction) of the values present.
pub fn nan_std(values: &[Optioned<f64>]) -> Optioned<f64> {
    std_of(present(values))
}

/// Quantile `q` in `[0, 1]` of the values present, interpolating linearly between the two
/// closest order statistics.
///
/// # Panics
///
/// If `q` is outside `[0, 1]` or is NaN.
pub fn nan_quantile(values: &[Optioned<f64>], q: f64) -> Optioned<f64> {
    assert!(
        (0.0..=1.0).contains(&q),
        "quantile {} outside of [0, 1]",
        q
    );

    let sorted: Vec<f64> = present(values).sorted_by(|a, b| a.total_cmp(b)).collect();
    if sorted.is_empty() {
        return none();
    }

    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);

    some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Number of values present.
pub fn nan_count(values: &[Optioned<f64>]) -> usize {
    present(values).count()
}

/// Number of distinct values among those present.
pub fn nan_unique_count(values: &[Optioned<f64>]) -> usize {
    present(values)
        .sorted_by(|a, b| a.total_cmp(b))
        .dedup()
        .count()
}

/// Sum of the values present, zero if none are.
pub fn nan_sum(values: &[Optioned<f64>]) -> f64 {
    present(values).sum()
}

/// Largest of the values present.
pub fn nan_max(values: &[Optioned<f64>]) -> Optioned<f64> {
    present(values)
        .fold(none(), |acc: Optioned<f64>, v| match acc.into_option() {
            Some(max) if max >= v => acc,
            _ => some(v),
        })
}

/// Sum of all values with missing values treated as zero.
///
/// ```rust
/// use pip_analysis::reductions::sum_missing_as_zero;
///
/// assert_eq!(sum_missing_as_zero(&[1.0, f64::NAN, 2.5]), 3.5);
/// assert_eq!(sum_missing_as_zero(&[f64::NAN, f64::NAN]), 0.0);
/// ```
pub fn sum_missing_as_zero<'a, I>(values: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    values
        .into_iter()
        .map(|&v| if v.is_nan() { 0.0 } else { v })
        .sum()
}

/// Mean along the time axis (axis 0) for each bin of a (time × bin) array, excluding missing
/// values. A bin is missing in the result only if all of its samples are missing.
pub fn time_means(values: ArrayView2<f64>) -> Vec<Optioned<f64>> {
    values
        .axis_iter(Axis(1))
        .map(|column| mean_of(column.iter().copied().filter(|v| !v.is_nan())))
        .collect()
}

/// Population standard deviation along the time axis for each bin, excluding missing values.
pub fn time_stds(values: ArrayView2<f64>) -> Vec<Optioned<f64>> {
    values
        .axis_iter(Axis(1))
        .map(|column| std_of(column.iter().copied().filter(|v| !v.is_nan())))
        .collect()
}

/// Mean over the bins for each timestep, excluding missing values and any value for which
/// `is_missing` returns true.
pub fn bin_means_where<F>(values: ArrayView2<f64>, is_missing: F) -> Vec<Optioned<f64>>
where
    F: Fn(f64) -> bool,
{
    values
        .axis_iter(Axis(0))
        .map(|row| mean_of(row.iter().copied().filter(|&v| !v.is_nan() && !is_missing(v))))
        .collect()
}

#[inline]
fn present<'a>(values: &'a [Optioned<f64>]) -> impl Iterator<Item = f64> + Clone + 'a {
    values.iter().filter_map(|v| v.into_option())
}

fn mean_of<I: Iterator<Item = f64>>(vals: I) -> Optioned<f64> {
    let (sum, n) = vals.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));

    if n == 0 {
        none()
    } else {
        some(sum / n as f64)
    }
}

fn std_of<I: Iterator<Item = f64> + Clone>(vals: I) -> Optioned<f64> {
    let mean = match mean_of(vals.clone()).into_option() {
        Some(mean) => mean,
        None => return none(),
    };

    let (sum_sq, n) = vals.fold((0.0, 0usize), |(acc, n), v| {
        (acc + (v - mean) * (v - mean), n + 1)
    });

    some((sum_sq / n as f64).sqrt())
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn opts(vals: &[f64]) -> Vec<Optioned<f64>> {
        vals.iter().copied().map(some).collect()
    }

    #[test]
    fn test_missing_values_are_excluded() {
        let nan = f64::NAN;
        let vals = opts(&[2.0, nan, 4.0, 4.0, nan, 4.0, 5.0, 5.0, 7.0, 9.0]);

        assert_abs_diff_eq!(nan_mean(&vals).unwrap(), 5.0);
        assert_abs_diff_eq!(nan_std(&vals).unwrap(), 2.0);
        assert_eq!(nan_count(&vals), 8);
        assert_eq!(nan_unique_count(&vals), 5);
        assert_abs_diff_eq!(nan_sum(&vals), 40.0);
        assert_abs_diff_eq!(nan_max(&vals).unwrap(), 9.0);
    }

    #[test]
    fn test_all_missing() {
        let vals = opts(&[f64::NAN, f64::NAN]);

        assert!(nan_mean(&vals).is_none());
        assert!(nan_std(&vals).is_none());
        assert!(nan_quantile(&vals, 0.5).is_none());
        assert!(nan_max(&vals).is_none());
        assert_eq!(nan_count(&vals), 0);
        assert_eq!(nan_unique_count(&vals), 0);
        assert_eq!(nan_sum(&vals), 0.0);
        assert!(nan_mean(&[]).is_none());
    }

    #[test]
    fn test_quantiles_interpolate() {
        let vals = opts(&[4.0, 1.0, f64::NAN, 3.0, 2.0]);

        assert_abs_diff_eq!(nan_quantile(&vals, 0.0).unwrap(), 1.0);
        assert_abs_diff_eq!(nan_quantile(&vals, 0.25).unwrap(), 1.75);
        assert_abs_diff_eq!(nan_quantile(&vals, 0.5).unwrap(), 2.5);
        assert_abs_diff_eq!(nan_quantile(&vals, 0.75).unwrap(), 3.25);
        assert_abs_diff_eq!(nan_quantile(&vals, 1.0).unwrap(), 4.0);

        let single = opts(&[7.0]);
        assert_abs_diff_eq!(nan_quantile(&single, 0.75).unwrap(), 7.0);
    }

    #[test]
    #[should_panic(expected = "outside of [0, 1]")]
    fn test_quantile_above_one() {
        nan_quantile(&opts(&[1.0, 2.0]), 1.5);
    }

    #[test]
    #[should_panic(expected = "outside of [0, 1]")]
    fn test_quantile_below_zero_with_no_values() {
        nan_quantile(&[], -0.1);
    }

    #[test]
    fn test_time_means_skip_missing() {
        let nan = f64::NAN;
        let vals = array![[1.0, nan, nan], [3.0, 4.0, nan], [nan, 8.0, nan]];

        let means = time_means(vals.view());
        assert_abs_diff_eq!(means[0].unwrap(), 2.0);
        assert_abs_diff_eq!(means[1].unwrap(), 6.0);
        assert!(means[2].is_none());

        let stds = time_stds(vals.view());
        assert_abs_diff_eq!(stds[0].unwrap(), 1.0);
        assert_abs_diff_eq!(stds[1].unwrap(), 2.0);
        assert!(stds[2].is_none());
    }

    #[test]
    fn test_bin_means_where() {
        let nan = f64::NAN;
        let vals = array![[0.0, 0.2, 0.4], [0.0, 0.0, nan]];

        let means = bin_means_where(vals.view(), |v| v == 0.0);
        assert_abs_diff_eq!(means[0].unwrap(), 0.3);
        assert!(means[1].is_none());
    }
}
