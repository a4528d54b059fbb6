use chrono::{Duration, NaiveDate};
use ndarray::Array2;
use optional::some;
use pip_analysis::{Dataset, DistributionKind, SiteInfo};

pub const BIN_CENTERS: [f64; 32] = [
    0.125, 0.375, 0.625, 0.875, 1.125, 1.375, 1.625, 1.875, 2.125, 2.375, 2.625, 2.875, 3.125,
    3.375, 3.625, 3.875, 4.25, 4.75, 5.25, 5.75, 6.25, 6.75, 7.25, 7.75, 8.5, 9.5, 10.5, 11.5,
    13.0, 15.0, 17.0, 19.0,
];

/// One day of minute data with a noisy exponential particle size distribution.
pub fn make_day() -> Dataset {
    const MINUTES: usize = 1440;

    let start = NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date");
    let time = (0..MINUTES)
        .map(|i| start + Duration::minutes(i as i64))
        .collect();

    let psd = Array2::from_shape_fn((MINUTES, BIN_CENTERS.len()), |(i, j)| {
        let noise = 1.0 + 0.2 * ((i * 7 + j * 13) % 11) as f64 / 11.0 - 0.1;
        if (i + j) % 17 == 0 {
            f64::NAN
        } else {
            800.0 * (-1.3 * BIN_CENTERS[j]).exp() * noise
        }
    });

    let ed_adj = (0..MINUTES)
        .map(|i| some(((i % 97) as f64) / 96.0))
        .collect();

    Dataset::new(time)
        .with_site_info(SiteInfo::new().with_lat_lon((64.86, -147.85)))
        .with_bin_centers(
            DistributionKind::ParticleSize.bin_centers_name(),
            BIN_CENTERS.to_vec(),
        )
        .and_then(|ds| {
            ds.with_binned(
                DistributionKind::ParticleSize.variable_name(),
                psd,
                DistributionKind::ParticleSize.bin_centers_name(),
            )
        })
        .and_then(|ds| ds.with_series("ed_adj", ed_adj))
        .expect("consistent bench dataset")
}
