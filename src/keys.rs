//! Enums used as keys for sites, file groups, and distributions.
use std::{fmt::Display, str::FromStr};

use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::error::AnalysisError;

/// Sites in the PIP network.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumString, IntoStaticStr,
)]
#[allow(missing_docs)]
pub enum Site {
    #[strum(serialize = "HUR")]
    Hur,
    #[strum(serialize = "KO1")]
    Ko1,
    #[strum(serialize = "KO2")]
    Ko2,
    #[strum(serialize = "IMP")]
    Imp,
    #[strum(serialize = "YFB")]
    Yfb,
    #[strum(serialize = "MQT")]
    Mqt,
    #[strum(serialize = "FIN")]
    Fin,
    #[strum(serialize = "APX")]
    Apx,
    #[strum(serialize = "HAK")]
    Hak,
    #[strum(serialize = "KIS")]
    Kis,
    #[strum(serialize = "NSA")]
    Nsa,
}

impl Site {
    /// Parse a site code, mapping failures into the crate error type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pip_analysis::Site;
    ///
    /// assert_eq!(Site::from_code("MQT").unwrap(), Site::Mqt);
    /// assert!(Site::from_code("XYZ").is_err());
    /// ```
    pub fn from_code(code: &str) -> Result<Self, AnalysisError> {
        Site::from_str(code.trim()).map_err(|_| AnalysisError::UnknownSite(code.to_owned()))
    }

    /// The three letter site code used in directory names.
    pub fn code(self) -> &'static str {
        self.into()
    }
}

impl Display for Site {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "{}", self.code())
    }
}

/// Groups of variables, each stored in its own directory of per-day files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum VariableGroup {
    /// Adjusted effective density and liquid water equivalent precipitation rates.
    EdensityLweRate,
    /// Effective density distributions.
    EdensityDistributions,
    /// Particle size distributions.
    ParticleSizeDistributions,
    /// Fall velocity distributions.
    VelocityDistributions,
}

impl VariableGroup {
    /// Prefix given to every variable read from this group.
    pub fn name(&self) -> &'static str {
        use VariableGroup::*;

        match self {
            EdensityLweRate => "edensity_lwe_rate",
            EdensityDistributions => "edensity_distributions",
            ParticleSizeDistributions => "particle_size_distributions",
            VelocityDistributions => "velocity_distributions",
        }
    }

    /// Directory holding this group's files, relative to a site-year `netCDF` directory.
    pub fn directory(&self) -> &'static str {
        use VariableGroup::*;

        match self {
            EdensityLweRate => "adjusted_edensity_lwe_rate",
            EdensityDistributions => "edensity_distributions",
            ParticleSizeDistributions => "particle_size_distributions",
            VelocityDistributions => "velocity_distributions",
        }
    }

    /// Suffix after the date in the name of a per-day file.
    pub fn day_suffix(&self) -> &'static str {
        use VariableGroup::*;

        match self {
            EdensityLweRate => "min",
            EdensityDistributions => "rho",
            ParticleSizeDistributions => "psd",
            VelocityDistributions => "vvd",
        }
    }
}

/// The binned distributions measured by the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum DistributionKind {
    /// Particle size distribution, m^-3 mm^-1 per diameter bin.
    ParticleSize,
    /// Fall velocity distribution, m s^-1 per diameter bin.
    Velocity,
    /// Effective density distribution, g cm^-3 per diameter bin.
    EffectiveDensity,
}

impl DistributionKind {
    /// The group this distribution is read from.
    pub fn group(&self) -> VariableGroup {
        use DistributionKind::*;

        match self {
            ParticleSize => VariableGroup::ParticleSizeDistributions,
            Velocity => VariableGroup::VelocityDistributions,
            EffectiveDensity => VariableGroup::EdensityDistributions,
        }
    }

    /// Flat name of the binned variable in a loaded dataset.
    ///
    /// ```rust
    /// use pip_analysis::DistributionKind;
    ///
    /// assert_eq!(
    ///     DistributionKind::ParticleSize.variable_name(),
    ///     "particle_size_distributions_psd"
    /// );
    /// ```
    pub fn variable_name(&self) -> String {
        format!("{}_{}", self.group().name(), self.group().day_suffix())
    }

    /// Flat name of the bin-center vector for this distribution.
    pub fn bin_centers_name(&self) -> String {
        format!("{}_bin_centers", self.group().name())
    }
}
