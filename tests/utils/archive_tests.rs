use super::*;
use pip_analysis::DistributionKind;

/// Check that a dataset loaded from the archive has every variable under its flat name.
#[allow(dead_code)]
pub fn check_flat_names(ds: &Dataset) {
    for name in &[
        "ed_adj",
        "rr_adj",
        "nrr_adj",
        "edensity_lwe_rate_rr",
        "edensity_lwe_rate_nrr",
        "edensity_lwe_rate_ed",
    ] {
        assert!(ds.series(name).is_ok(), "missing series {}", name);
    }

    for kind in &[
        DistributionKind::ParticleSize,
        DistributionKind::Velocity,
        DistributionKind::EffectiveDensity,
    ] {
        let (values, centers) = ds.distribution(*kind).unwrap();
        assert_eq!(values.nrows(), ds.len());
        assert_eq!(centers, &BIN_CENTERS);
    }

    for (name, _) in ds.variables() {
        assert!(!["rr", "nrr", "ed", "psd", "vvd", "rho"].contains(&name));
    }
}

/// Check that a dataset holds exactly the file times of `dates`, in order.
#[allow(dead_code)]
pub fn check_times(ds: &Dataset, dates: &[NaiveDate]) {
    let expected: Vec<NaiveDateTime> = dates.iter().flat_map(|&d| file_times(d)).collect();
    assert_eq!(ds.time(), expected.as_slice());
}

/// Check the site information attached by the loader.
#[allow(dead_code)]
pub fn check_site(ds: &Dataset, site: Site) {
    assert_eq!(ds.site_info().site(), Some(site));
    assert_eq!(ds.site_info().location(), Some(LOCATION));
}
