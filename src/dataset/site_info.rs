use crate::keys::Site;

/// Site information including the site code and location.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SiteInfo {
    /// Network site code.
    site: Option<Site>,
    /// Latitude and longitude.
    location: Option<(f64, f64)>,
}

impl SiteInfo {
    /// Create a new `SiteInfo` object.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pip_analysis::{Site, SiteInfo};
    ///
    /// let _info = SiteInfo::new_with_values(Site::Mqt, (46.53, -87.55));
    /// let _info = SiteInfo::new_with_values(Some(Site::Mqt), None);
    /// let _info = SiteInfo::new_with_values(None, Some((46.53, -87.55)));
    /// ```
    #[inline]
    pub fn new_with_values<T, U>(site: T, location: U) -> Self
    where
        T: Into<Option<Site>>,
        U: Into<Option<(f64, f64)>>,
    {
        SiteInfo {
            site: site.into(),
            location: location.into(),
        }
    }

    /// Create a new object with default values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pip_analysis::SiteInfo;
    ///
    /// assert!(SiteInfo::new().site().is_none());
    /// assert!(SiteInfo::new().location().is_none());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a site.
    #[inline]
    pub fn with_site<T>(mut self, site: T) -> Self
    where
        Option<Site>: From<T>,
    {
        self.site = Option::from(site);
        self
    }

    /// Builder method to add a location.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pip_analysis::SiteInfo;
    ///
    /// assert_eq!(
    ///     SiteInfo::new().with_lat_lon((64.86, -147.85)).location().unwrap(), (64.86, -147.85));
    /// assert!(SiteInfo::new().with_lat_lon(None).location().is_none());
    /// ```
    #[inline]
    pub fn with_lat_lon<T>(mut self, coords: T) -> Self
    where
        Option<(f64, f64)>: From<T>,
    {
        self.location = Option::from(coords);
        self
    }

    /// Network site code.
    #[inline]
    pub fn site(&self) -> Option<Site> {
        self.site
    }

    /// Latitude and longitude.
    #[inline]
    pub fn location(&self) -> Option<(f64, f64)> {
        self.location
    }

    /// Fill anything missing here from `other`.
    #[inline]
    pub(crate) fn or(self, other: SiteInfo) -> SiteInfo {
        SiteInfo {
            site: self.site.or(other.site),
            location: self.location.or(other.location),
        }
    }
}
