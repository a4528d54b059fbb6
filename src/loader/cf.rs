//! Decoding of values stored following the CF metadata conventions.
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// The units of a CF time coordinate, `"<unit> since <reference time>"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUnits {
    seconds_per_unit: f64,
    epoch: NaiveDateTime,
}

impl TimeUnits {
    /// Parse a CF time units string, `None` if it is not understood.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use pip_analysis::loader::cf::TimeUnits;
    ///
    /// let units = TimeUnits::parse("minutes since 2019-01-01 00:00:00").unwrap();
    /// let expected = NaiveDate::from_ymd_opt(2019, 1, 1)
    ///     .unwrap()
    ///     .and_hms_opt(1, 30, 0)
    ///     .unwrap();
    ///
    /// assert_eq!(units.datetime(90.0).unwrap(), expected);
    /// assert!(TimeUnits::parse("fortnights since 2019-01-01").is_none());
    /// ```
    pub fn parse(units: &str) -> Option<Self> {
        let mut parts = units.trim().splitn(2, " since ");
        let unit = parts.next()?.trim().to_lowercase();
        let reference = parts.next()?.trim();

        let seconds_per_unit = match unit.as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => 1.0,
            "minutes" | "minute" | "mins" | "min" => 60.0,
            "hours" | "hour" | "hrs" | "hr" | "h" => 3_600.0,
            "days" | "day" | "d" => 86_400.0,
            _ => return None,
        };

        Some(TimeUnits {
            seconds_per_unit,
            epoch: parse_reference_time(reference)?,
        })
    }

    /// The time `offset` units after the reference time, to the nearest millisecond.
    pub fn datetime(&self, offset: f64) -> Option<NaiveDateTime> {
        let millis = offset * self.seconds_per_unit * 1_000.0;
        if !millis.is_finite() || millis.abs() >= 9.0e18 {
            return None;
        }

        self.epoch
            .checked_add_signed(Duration::milliseconds(millis.round() as i64))
    }
}

fn parse_reference_time(reference: &str) -> Option<NaiveDateTime> {
    let reference = reference
        .trim_end_matches("UTC")
        .trim_end_matches('Z')
        .trim();

    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(reference, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(reference, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Unpack raw stored values, mapping the fill value to NaN and applying `scale_factor` and
/// `add_offset`.
///
/// ```rust
/// use pip_analysis::loader::cf::unpack;
///
/// let vals = unpack(vec![1.0, -999.0, 3.0], Some(-999.0), Some(0.5), Some(10.0));
/// assert_eq!(vals[0], 10.5);
/// assert!(vals[1].is_nan());
/// assert_eq!(vals[2], 11.5);
/// ```
pub fn unpack(
    mut raw: Vec<f64>,
    fill_value: Option<f64>,
    scale_factor: Option<f64>,
    add_offset: Option<f64>,
) -> Vec<f64> {
    let scale = scale_factor.unwrap_or(1.0);
    let offset = add_offset.unwrap_or(0.0);

    for val in raw.iter_mut() {
        *val = match fill_value {
            Some(fill) if *val == fill => f64::NAN,
            _ => *val * scale + offset,
        };
    }

    raw
}
