#![warn(missing_docs)]
//! Functions and data types for loading and analyzing particle microphysics data from the
//! Precipitation Imaging Package (PIP) instrument network.
//!
//! Data is held in a [`Dataset`], a set of time series and binned distributions sharing one time
//! index. Datasets are usually built from the archive's per-day files by a [`Loader`], but they
//! can also be built directly with the builder methods.
//!
//! The analyses are pure functions of a borrowed dataset:
//!  - [`psd_parameters`] fits an exponential model to the particle size distribution,
//!  - [`partition`] splits a dataset in two by thresholding a classifier series,
//!  - [`describe`] computes descriptive statistics of every time series,
//!  - the [`diagnostics`] module prepares the inputs of the standard plots.

//
// API
//
pub use crate::{
    config::Config,
    dataset::{DType, Dataset, SiteInfo, Variable},
    describe::{describe, DatasetSummary, VariableSummary},
    error::{AnalysisError, Result},
    keys::{DistributionKind, Site, VariableGroup},
    loader::{DatasetReader, Loader, SiteYear},
    partition::{partition, split_by_ed_adj, split_by_variable},
    psd::{dataset_psd_parameters, fit_psd, psd_parameters, FitError, PsdParameters},
};

#[cfg(feature = "netcdf")]
pub use crate::loader::NetcdfReader;

pub mod config;
pub mod describe;
pub mod diagnostics;
pub mod loader;
pub mod partition;
pub mod psd;
pub mod reductions;

#[doc(hidden)]
pub use crate::dataset::doctest;

//
// Internal use only
//

// Modules
mod dataset;
mod error;
mod keys;
