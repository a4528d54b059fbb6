//! Discover, read, and combine the per-day files of the data archive.
//!
//! The archive is laid out as
//!
//! ```text
//! {main_path}/{YEAR}_{SITE}/netCDF/{group directory}/{YYYYMMDD}..._{suffix}.nc
//! ```
//!
//! with one directory per [`VariableGroup`]. Every variable read from a group is renamed to
//! `{group}_{variable}` so the groups can share one flat namespace, except for the adjusted
//! effective density and precipitation rates which keep their names.
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::{Datelike, NaiveDate};
use glob::{glob, Pattern};
use log::{debug, error, info};
use strum::IntoEnumIterator;

use crate::{
    config::Config,
    dataset::Dataset,
    error::{AnalysisError, Result},
    keys::{Site, VariableGroup},
};

#[cfg(feature = "netcdf")]
pub use self::netcdf_reader::NetcdfReader;

/// Variables that keep their own names when loaded.
pub const UNPREFIXED_VARIABLES: [&str; 6] = ["lat", "lon", "time", "ed_adj", "nrr_adj", "rr_adj"];

/// Name of the directory under a site-year holding the groups.
const NETCDF_DIR: &str = "netCDF";

/// Reads a single file into a [`Dataset`] with the names used in the file.
pub trait DatasetReader {
    /// Read the file at `path`.
    fn read(&self, path: &Path) -> Result<Dataset>;
}

impl<F> DatasetReader for F
where
    F: Fn(&Path) -> Result<Dataset>,
{
    fn read(&self, path: &Path) -> Result<Dataset> {
        self(path)
    }
}

/// One year of data from one site, the key for a loaded dataset.
///
/// ```rust
/// use pip_analysis::{loader::SiteYear, Site};
///
/// let key: SiteYear = "2019_MQT".parse().unwrap();
/// assert_eq!(key, SiteYear { year: 2019, site: Site::Mqt });
/// assert_eq!(key.to_string(), "2019_MQT");
///
/// assert!("MQT_2019".parse::<SiteYear>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteYear {
    /// The year.
    pub year: i32,
    /// The site.
    pub site: Site,
}

impl Display for SiteYear {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "{}_{}", self.year, self.site)
    }
}

impl FromStr for SiteYear {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AnalysisError::InvalidSiteYear(s.to_owned());

        let mut parts = s.split('_');
        let (year, site) = match (parts.next(), parts.next(), parts.next()) {
            (Some(year), Some(site), None) => (year, site),
            _ => return Err(invalid()),
        };

        let year = year.parse().map_err(|_| invalid())?;
        let site = Site::from_code(site)?;

        Ok(SiteYear { year, site })
    }
}

/// Directory holding the group directories for a site-year.
pub fn site_year_dir(main_path: &Path, key: SiteYear) -> PathBuf {
    main_path.join(key.to_string()).join(NETCDF_DIR)
}

/// Name of a variable from `group` in a loaded dataset.
///
/// ```rust
/// use pip_analysis::{loader::flat_name, VariableGroup};
///
/// let group = VariableGroup::ParticleSizeDistributions;
/// assert_eq!(flat_name(group, "psd"), "particle_size_distributions_psd");
/// assert_eq!(flat_name(VariableGroup::EdensityLweRate, "ed_adj"), "ed_adj");
/// ```
pub fn flat_name(group: VariableGroup, name: &str) -> String {
    if UNPREFIXED_VARIABLES.contains(&name) {
        name.to_owned()
    } else {
        format!("{}_{}", group.name(), name)
    }
}

/// The dates, as the file name prefix before the first `_`, for which every group has at least
/// one file in the site-year directory `base_dir`.
pub fn common_dates(base_dir: &Path) -> Result<BTreeSet<String>> {
    let mut common: Option<BTreeSet<String>> = None;

    for group in VariableGroup::iter() {
        let dates: BTreeSet<String> = find_files(base_dir, group, "*.nc")?
            .iter()
            .filter_map(|path| path.file_name())
            .filter_map(|name| name.to_str())
            .filter_map(|name| name.split('_').next())
            .map(str::to_owned)
            .collect();

        common = Some(match common {
            Some(common) => common.intersection(&dates).cloned().collect(),
            None => dates,
        });
    }

    Ok(common.unwrap_or_default())
}

/// Loads datasets from the archive with a [`DatasetReader`].
#[derive(Debug, Clone)]
pub struct Loader<R> {
    reader: R,
}

impl<R: DatasetReader> Loader<R> {
    /// Create a loader that reads files with `reader`.
    pub fn new(reader: R) -> Self {
        Loader { reader }
    }

    /// Read one file of `group` and rename its variables into the flat namespace.
    pub fn load_file(&self, path: &Path, group: VariableGroup) -> Result<Dataset> {
        debug!("reading {}", path.display());

        Ok(self.reader.read(path)?.renamed(|name| flat_name(group, name)))
    }

    /// Load every group for one day at one site, merged into a single dataset.
    ///
    /// Returns `None` if any group has no file for that day.
    pub fn load_day(
        &self,
        main_path: &Path,
        site: Site,
        date: NaiveDate,
    ) -> Result<Option<Dataset>> {
        let key = SiteYear {
            year: date.year(),
            site,
        };
        let base_dir = site_year_dir(main_path, key);
        let stamp = date.format("%Y%m%d");

        let mut day = Dataset::default();
        for group in VariableGroup::iter() {
            let pattern = format!("*{}_{}.nc", stamp, group.day_suffix());
            let files = find_files(&base_dir, group, &pattern)?;

            if files.is_empty() {
                error!("no {} data found for {} on {}", group.name(), site, stamp);
                return Ok(None);
            }

            for file in files {
                day = day.merge(self.load_file(&file, group)?)?;
            }
        }

        Ok(Some(with_site(day, site)))
    }

    /// Load all the days of a year at a site for which every group has data.
    ///
    /// Days are concatenated in date order. No days gives an empty dataset.
    pub fn load_year(&self, main_path: &Path, site: Site, year: i32) -> Result<Dataset> {
        info!("loading {} {}", site, year);

        let base_dir = site_year_dir(main_path, SiteYear { year, site });

        let mut days = vec![];
        for date in common_dates(&base_dir)? {
            let mut day: Option<Dataset> = None;

            for group in VariableGroup::iter() {
                let pattern = format!("{}*.nc", Pattern::escape(&date));
                for file in find_files(&base_dir, group, &pattern)? {
                    let ds = self.load_file(&file, group)?;
                    day = Some(match day {
                        Some(day) => day.merge(ds)?,
                        None => ds,
                    });
                }
            }

            days.extend(day);
        }

        if days.is_empty() {
            debug!("no data for {} {}", site, year);
            return Ok(Dataset::default());
        }

        Ok(with_site(Dataset::concat(days)?, site))
    }

    /// Load every year of every requested site found under `main_path`.
    ///
    /// Directories that are not named `YEAR_SITE` are skipped.
    pub fn load_sites(
        &self,
        main_path: &Path,
        sites: &[Site],
    ) -> Result<BTreeMap<SiteYear, Dataset>> {
        let mut keys = vec![];
        for entry in fs::read_dir(main_path)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let name = entry.file_name();
            match name.to_str().map(SiteYear::from_str) {
                Some(Ok(key)) if sites.contains(&key.site) => keys.push(key),
                Some(Ok(key)) => debug!("skipping {}, site not requested", key),
                _ => debug!("skipping {:?}, not a site-year directory", name),
            }
        }

        let mut datasets = BTreeMap::new();
        for key in keys {
            datasets.insert(key, self.load_year(main_path, key.site, key.year)?);
        }

        Ok(datasets)
    }

    /// [`Loader::load_sites`] with the path and sites from a [`Config`].
    pub fn load_config(&self, config: &Config) -> Result<BTreeMap<SiteYear, Dataset>> {
        self.load_sites(config.main_path(), config.sites())
    }
}

#[cfg(feature = "netcdf")]
impl Loader<NetcdfReader> {
    /// A loader that reads the archive's NetCDF files.
    pub fn netcdf() -> Self {
        Loader::new(NetcdfReader::default())
    }
}

fn with_site(ds: Dataset, site: Site) -> Dataset {
    let info = ds.site_info().with_site(site);
    ds.with_site_info(info)
}

/// Files matching `pattern` in the directory of `group`, sorted by path.
fn find_files(base_dir: &Path, group: VariableGroup, pattern: &str) -> Result<Vec<PathBuf>> {
    let dir = base_dir.join(group.directory());
    let dir = dir.to_str().ok_or_else(|| AnalysisError::Read {
        path: dir.clone(),
        reason: "path is not valid unicode".to_owned(),
    })?;

    let full_pattern = format!("{}/{}", Pattern::escape(dir), pattern);

    let mut files = glob(&full_pattern)?
        .map(|entry| entry.map_err(|err| err.into_error()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    files.sort();

    Ok(files)
}


pub mod cf;
#[cfg(feature = "netcdf")]
mod netcdf_reader;
