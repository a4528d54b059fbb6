use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use ndarray::Array2;
use optional::{some, Optioned};
use pip_analysis::{AnalysisError, Dataset, Result, Site, SiteInfo, SiteYear, VariableGroup};
use tempfile::TempDir;

pub mod archive_tests;

pub const BIN_CENTERS: [f64; 6] = [0.5, 1.0, 1.5, 2.0, 3.0, 4.0];
pub const LOCATION: (f64, f64) = (46.53, -87.55);
pub const MINUTES_PER_FILE: usize = 4;

#[allow(unused_macros)] // False alarm
macro_rules! check_fit {
    ($test_name:ident, $n0:expr, $lambda:expr) => {
        #[test]
        fn $test_name() {
            let psd = utils::exponential_psd($n0, $lambda, 12);
            let params =
                pip_analysis::psd_parameters(psd.view(), &utils::BIN_CENTERS).unwrap();

            assert!(params.is_fitted(), "{:?}", params);
            approx::assert_relative_eq!(params.n0, $n0, max_relative = 1.0e-4);
            approx::assert_relative_eq!(params.lambda, $lambda, max_relative = 1.0e-4);
        }
    };
}

#[allow(unused_macros)] // False alarm
macro_rules! check_rejected {
    ($test_name:ident, $n0:expr, $lambda:expr) => {
        #[test]
        fn $test_name() {
            let psd = utils::exponential_psd($n0, $lambda, 12);
            let params =
                pip_analysis::psd_parameters(psd.view(), &utils::BIN_CENTERS).unwrap();

            assert_eq!(params.n0, 0.0);
            assert_eq!(params.lambda, 0.0);
            assert_eq!(
                params.count,
                pip_analysis::reductions::sum_missing_as_zero(psd.iter()) as i64
            );
        }
    };
}

#[allow(dead_code)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A (time × bin) distribution following `n0 exp(-lambda D)` with alternating perturbations that
/// cancel in the time mean.
#[allow(dead_code)]
pub fn exponential_psd(n0: f64, lambda: f64, rows: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, BIN_CENTERS.len()), |(i, j)| {
        let value = n0 * (-lambda * BIN_CENTERS[j]).exp();
        let wiggle = if i % 2 == 0 { 1.0e-3 } else { -1.0e-3 };
        value * (1.0 + wiggle)
    })
}

#[allow(dead_code)]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[allow(dead_code)]
pub fn file_times(date: NaiveDate) -> Vec<NaiveDateTime> {
    let start = date.and_hms_opt(0, 0, 0).unwrap();
    (0..MINUTES_PER_FILE)
        .map(|i| start + Duration::minutes(i as i64))
        .collect()
}

#[allow(dead_code)]
fn series(vals: &[f64]) -> Vec<Optioned<f64>> {
    vals.iter().copied().map(some).collect()
}

/// The contents of one file of `group`, with the names used inside the file.
#[allow(dead_code)]
pub fn group_file(group: VariableGroup, date: NaiveDate) -> Dataset {
    let ds = Dataset::new(file_times(date)).with_site_info(SiteInfo::new().with_lat_lon(LOCATION));
    let n = MINUTES_PER_FILE;

    let binned = |ds: Dataset, name: &str, values: Array2<f64>| {
        ds.with_bin_centers("bin_centers", BIN_CENTERS.to_vec())
            .and_then(|ds| ds.with_binned(name, values, "bin_centers"))
    };

    let ds = match group {
        VariableGroup::EdensityLweRate => ds
            .with_series("ed_adj", series(&[0.1, 0.3, 0.6, 0.9]))
            .and_then(|ds| ds.with_series("rr_adj", series(&[0.0, 0.0, 1.5, 2.5])))
            .and_then(|ds| ds.with_series("nrr_adj", series(&[0.8, 0.4, 0.0, 0.0])))
            .and_then(|ds| ds.with_series("rr", series(&[0.0, 0.1, 1.2, 2.0])))
            .and_then(|ds| ds.with_series("nrr", series(&[0.7, 0.5, 0.0, 0.0])))
            .and_then(|ds| ds.with_series("ed", series(&[0.12, 0.25, 0.5, 0.95]))),
        VariableGroup::EdensityDistributions => {
            binned(ds, "rho", Array2::from_elem((n, BIN_CENTERS.len()), 0.2))
        }
        VariableGroup::ParticleSizeDistributions => {
            binned(ds, "psd", exponential_psd(500.0, 1.5, n))
        }
        VariableGroup::VelocityDistributions => {
            binned(ds, "vvd", Array2::from_elem((n, BIN_CENTERS.len()), 1.1))
        }
    };

    ds.unwrap()
}

/// A data archive in a temporary directory. Files are empty, their contents are served from
/// memory by [`Archive::read`].
#[allow(dead_code)]
pub struct Archive {
    dir: TempDir,
    files: HashMap<PathBuf, Dataset>,
}

#[allow(dead_code)]
impl Archive {
    pub fn new() -> Self {
        Archive {
            dir: tempfile::tempdir().unwrap(),
            files: HashMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Add one day's file for each of `groups`.
    pub fn add_day(&mut self, site: Site, date: NaiveDate, groups: &[VariableGroup]) {
        let key = SiteYear {
            year: chrono::Datelike::year(&date),
            site,
        };
        let stamp = date.format("%Y%m%d");

        for &group in groups {
            let dir = pip_analysis::loader::site_year_dir(self.path(), key).join(group.directory());
            fs::create_dir_all(&dir).unwrap();

            let path = dir.join(format!("{}_{}.nc", stamp, group.day_suffix()));
            fs::write(&path, b"").unwrap();
            self.files.insert(path, group_file(group, date));
        }
    }

    /// Add a day with every group.
    pub fn add_full_day(&mut self, site: Site, date: NaiveDate) {
        use strum::IntoEnumIterator;

        let groups: Vec<VariableGroup> = VariableGroup::iter().collect();
        self.add_day(site, date, &groups);
    }

    /// Add an empty directory directly under the archive root.
    pub fn add_dir(&self, name: &str) {
        fs::create_dir_all(self.path().join(name)).unwrap();
    }

    pub fn read(&self, path: &Path) -> Result<Dataset> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| AnalysisError::Read {
                path: path.to_path_buf(),
                reason: "not in archive".to_owned(),
            })
    }
}
