//! Split a dataset in two by thresholding a classifier series.
use optional::Optioned;

use crate::{
    dataset::Dataset,
    error::{AnalysisError, Result},
};

/// Adjusted effective density at or below which a timestep is considered snowfall.
pub const ED_ADJ_THRESHOLD: f64 = 0.4;

/// Split a dataset by comparing a per-timestep classifier against `threshold`.
///
/// Returns `(low, high)`, where `low` holds every timestep whose classifier is `<= threshold` and
/// `high` every timestep whose classifier is `> threshold`. A side with no timesteps is `None`.
/// Timesteps with a missing classifier value are in neither side.
///
/// # Examples
///
/// ```rust
/// use optional::some;
/// use pip_analysis::{doctest::make_test_dataset, partition::partition};
///
/// let ds = make_test_dataset();
/// let classifier = vec![some(1.0); ds.len()];
///
/// let (low, high) = partition(&ds, &classifier, 0.4).unwrap();
/// assert!(low.is_none());
/// assert_eq!(high.unwrap().len(), ds.len());
/// ```
///
/// # Errors
///
/// If the classifier does not have one value per timestep.
pub fn partition(
    ds: &Dataset,
    classifier: &[Optioned<f64>],
    threshold: f64,
) -> Result<(Option<Dataset>, Option<Dataset>)> {
    if classifier.len() != ds.len() {
        return Err(AnalysisError::LengthMismatch {
            name: "classifier".to_owned(),
            expected: ds.len(),
            found: classifier.len(),
        });
    }

    let mut low = vec![];
    let mut high = vec![];
    for (i, value) in classifier
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.into_option().map(|v| (i, v)))
    {
        if value <= threshold {
            low.push(i);
        } else {
            high.push(i);
        }
    }

    let side = |indices: Vec<usize>| {
        if indices.is_empty() {
            None
        } else {
            Some(ds.select_times(&indices))
        }
    };

    Ok((side(low), side(high)))
}

/// [`partition`] using a series stored in the dataset as the classifier.
pub fn split_by_variable(
    ds: &Dataset,
    name: &str,
    threshold: f64,
) -> Result<(Option<Dataset>, Option<Dataset>)> {
    partition(ds, ds.series(name)?, threshold)
}

/// Split into snowfall-like (`ed_adj <= 0.4`) and rainfall-like (`ed_adj > 0.4`) datasets.
///
/// ```rust
/// use pip_analysis::{doctest::make_test_dataset, partition::split_by_ed_adj};
///
/// let (snow, rain) = split_by_ed_adj(&make_test_dataset()).unwrap();
/// assert_eq!(snow.unwrap().len(), 4);
/// assert_eq!(rain.unwrap().len(), 2);
/// ```
pub fn split_by_ed_adj(ds: &Dataset) -> Result<(Option<Dataset>, Option<Dataset>)> {
    split_by_variable(ds, "ed_adj", ED_ADJ_THRESHOLD)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dataset::doctest::{make_test_dataset, minutes};
    use optional::{none, some};

    fn with_classifier(vals: &[Optioned<f64>]) -> Dataset {
        Dataset::new(minutes(vals.len()))
            .with_series("ed_adj", vals.to_vec())
            .unwrap()
    }

    #[test]
    fn test_every_timestep_in_one_side() {
        let ds = make_test_dataset();
        let ed_adj = ds.series("ed_adj").unwrap();

        let (low, high) = split_by_ed_adj(&ds).unwrap();
        let (low, high) = (low.unwrap(), high.unwrap());

        assert_eq!(low.len() + high.len(), ds.len());
        assert!(low.series("ed_adj").unwrap().iter().all(|v| v.unwrap() <= 0.4));
        assert!(high.series("ed_adj").unwrap().iter().all(|v| v.unwrap() > 0.4));

        for t in ds.time() {
            assert!(low.time().contains(t) != high.time().contains(t));
        }

        // Order is kept and the other variables follow their timesteps.
        assert_eq!(low.time(), &[ds.time()[0], ds.time()[1], ds.time()[3], ds.time()[5]]);
        assert_eq!(
            high.series("rr_adj").unwrap()[0].unwrap(),
            ds.series("rr_adj").unwrap()[2].unwrap()
        );
        assert_eq!(ed_adj.len(), 6);
    }

    #[test]
    fn test_threshold_is_inclusive_low() {
        let ds = with_classifier(&[some(0.4), some(0.4000001)]);

        let (low, high) = split_by_ed_adj(&ds).unwrap();
        assert_eq!(low.unwrap().series("ed_adj").unwrap()[0].unwrap(), 0.4);
        assert_eq!(high.unwrap().len(), 1);
    }

    #[test]
    fn test_empty_side_is_none() {
        let ds = with_classifier(&[some(0.5), some(0.9)]);
        let (low, high) = split_by_ed_adj(&ds).unwrap();
        assert!(low.is_none());
        assert_eq!(high.unwrap().len(), 2);

        let ds = with_classifier(&[some(0.1)]);
        let (low, high) = split_by_ed_adj(&ds).unwrap();
        assert_eq!(low.unwrap().len(), 1);
        assert!(high.is_none());
    }

    #[test]
    fn test_missing_classifier_excluded() {
        let ds = with_classifier(&[some(0.1), none(), some(0.9), some(f64::NAN)]);

        let (low, high) = split_by_ed_adj(&ds).unwrap();
        assert_eq!(low.unwrap().time(), &[ds.time()[0]]);
        assert_eq!(high.unwrap().time(), &[ds.time()[2]]);

        let ds = with_classifier(&[none(), none()]);
        assert!(matches!(split_by_ed_adj(&ds), Ok((None, None))));
    }

    #[test]
    fn test_errors() {
        let ds = make_test_dataset();

        assert!(matches!(
            partition(&ds, &[some(0.1)], 0.4),
            Err(AnalysisError::LengthMismatch { .. })
        ));
        assert!(matches!(
            split_by_variable(&ds, "not_there", 0.4),
            Err(AnalysisError::MissingVariable(_))
        ));
    }
}
