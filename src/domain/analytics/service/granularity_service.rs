use tracing::warn;

use crate::domain::common::model::{GranularitySetting, GranularityUnit, TimeRange};

/// Ranges longer than this only offer day-based granularity.
pub const SUB_DAY_UNIT_LIMIT_DAYS: f64 = 1.0;

/// Bucket width in hours for a magnitude/unit pair.
pub fn granularity_to_hours(magnitude: u32, unit: GranularityUnit) -> f64 {
    GranularitySetting::new(magnitude, unit).to_hours()
}

/// Units the user may pick for `range`.
pub fn allowed_units(range: &TimeRange) -> Vec<GranularityUnit> {
    if range.duration_days() > SUB_DAY_UNIT_LIMIT_DAYS {
        vec![GranularityUnit::Days]
    } else {
        vec![GranularityUnit::Minutes, GranularityUnit::Hours, GranularityUnit::Days]
    }
}

pub fn validate_granularity(setting: &GranularitySetting) -> Result<(), String> {
    if setting.magnitude == 0 {
        return Err("granularity magnitude must be at least 1".into());
    }
    Ok(())
}

/// Forces a day-based unit when the range exceeds one day. The width is
/// rounded up to whole days, at least one.
pub fn coerce_for_range(setting: GranularitySetting, range: &TimeRange) -> GranularitySetting {
    let setting = if let Err(err) = validate_granularity(&setting) {
        // Soft validation: fall back to the default width
        warn!("Invalid granularity {:?}: {}", setting, err);
        GranularitySetting::one_day()
    } else {
        setting
    };

    if range.duration_days() <= SUB_DAY_UNIT_LIMIT_DAYS || setting.unit == GranularityUnit::Days {
        return setting;
    }

    let days = (setting.to_hours() / 24.0).ceil().max(1.0) as u32;
    GranularitySetting::new(days, GranularityUnit::Days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn range_of(hours: i64) -> TimeRange {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        TimeRange { start, end: start + Duration::hours(hours) }
    }

    #[test]
    fn converts_units_to_hours() {
        assert_eq!(granularity_to_hours(15, GranularityUnit::Minutes), 0.25);
        assert_eq!(granularity_to_hours(3, GranularityUnit::Hours), 3.0);
        assert_eq!(granularity_to_hours(7, GranularityUnit::Days), 168.0);
    }

    #[test]
    fn long_ranges_coerce_to_days() {
        let week = range_of(24 * 7);
        assert_eq!(
            coerce_for_range(GranularitySetting::new(6, GranularityUnit::Hours), &week),
            GranularitySetting::one_day()
        );
        assert_eq!(
            coerce_for_range(GranularitySetting::new(36, GranularityUnit::Hours), &week),
            GranularitySetting::new(2, GranularityUnit::Days)
        );
        assert_eq!(
            coerce_for_range(GranularitySetting::new(3, GranularityUnit::Days), &week),
            GranularitySetting::new(3, GranularityUnit::Days)
        );
        assert_eq!(allowed_units(&week), vec![GranularityUnit::Days]);
    }

    #[test]
    fn short_ranges_keep_sub_day_units() {
        let day = range_of(24);
        let fifteen = GranularitySetting::new(15, GranularityUnit::Minutes);
        assert_eq!(coerce_for_range(fifteen, &day), fifteen);
        assert_eq!(allowed_units(&day).len(), 3);
    }

    #[test]
    fn zero_magnitude_falls_back() {
        let zero = GranularitySetting::new(0, GranularityUnit::Hours);
        assert!(validate_granularity(&zero).is_err());
        assert_eq!(coerce_for_range(zero, &range_of(2)), GranularitySetting::one_day());
    }
}
