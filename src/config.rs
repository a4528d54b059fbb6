//! Where the data archive lives and which sites to load from it.
use std::{
    env,
    path::{Path, PathBuf},
};

use strum::IntoEnumIterator;

use crate::{
    error::{AnalysisError, Result},
    keys::Site,
};

/// Environment variable holding the root of the data archive.
pub const DATA_PATH_VAR: &str = "PIP_DATA_PATH";
/// Environment variable holding a comma separated list of site codes.
pub const SITES_VAR: &str = "PIP_SITES";

/// Configuration for loading data.
///
/// # Examples
///
/// ```rust
/// use pip_analysis::{Config, Site};
///
/// let config = Config::default()
///     .with_main_path("/data/pip/converted")
///     .with_sites(vec![Site::Mqt, Site::Apx]);
///
/// assert_eq!(config.sites(), &[Site::Mqt, Site::Apx]);
/// assert_eq!(Config::default().sites().len(), 11);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    main_path: PathBuf,
    sites: Vec<Site>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            main_path: PathBuf::from("."),
            sites: Site::iter().collect(),
        }
    }
}

impl Config {
    /// Builder method to set the directory holding the `YEAR_SITE` directories.
    #[inline]
    pub fn with_main_path<P: Into<PathBuf>>(mut self, main_path: P) -> Self {
        self.main_path = main_path.into();
        self
    }

    /// Builder method to set the sites to load.
    #[inline]
    pub fn with_sites(mut self, sites: Vec<Site>) -> Self {
        self.sites = sites;
        self
    }

    /// Directory holding the `YEAR_SITE` directories.
    #[inline]
    pub fn main_path(&self) -> &Path {
        &self.main_path
    }

    /// Sites to load.
    #[inline]
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Build a configuration from the `PIP_DATA_PATH` and `PIP_SITES` environment variables,
    /// using the defaults for anything not set.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = env::var_os(DATA_PATH_VAR) {
            config = config.with_main_path(path);
        }

        if let Ok(sites) = env::var(SITES_VAR) {
            config = config.with_sites(parse_sites(&sites)?);
        }

        Ok(config)
    }
}

/// Parse a comma separated list of site codes, ignoring blank entries.
///
/// ```rust
/// use pip_analysis::{config::parse_sites, Site};
///
/// assert_eq!(parse_sites("MQT, NSA,").unwrap(), vec![Site::Mqt, Site::Nsa]);
/// assert!(parse_sites("MQT,XXX").is_err());
/// ```
pub fn parse_sites(list: &str) -> Result<Vec<Site>> {
    list.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(Site::from_code)
        .collect::<std::result::Result<Vec<_>, AnalysisError>>()
}
