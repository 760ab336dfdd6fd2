use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::error::{IceError, Result};
use crate::grid::Grid;
use crate::readers::{BandEncoding, Data};

/// Reference date of the gridded record's time axis (days since 1601-01-01).
pub fn cdr_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1601, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Turns raw band values into concentrations.
///
/// Fill values, values outside the declared valid range and NaNs are masked to 0,
/// scale and offset are applied, and negative flag values become 0.
pub fn clean_concentration(data: Data, encoding: &BandEncoding) -> Result<Grid> {
    let scale = encoding.scale.unwrap_or(1.0);
    let offset = encoding.offset.unwrap_or(0.0);

    let mut grid = data.into_array()?;
    grid.mapv_inplace(|raw| {
        let raw_f64 = raw as f64;
        let masked = raw.is_nan()
            || encoding.fill_value.is_some_and(|fill| raw_f64 == fill)
            || encoding
                .valid_range
                .is_some_and(|(lo, hi)| raw_f64 < lo || raw_f64 > hi);
        if masked {
            return 0.0;
        }
        let value = (raw_f64 * scale + offset) as f32;
        if value < 0.0 { 0.0 } else { value }
    });

    Ok(grid)
}

/// Decodes a CF-style `<unit> since <epoch>` time coordinate.
///
/// Without a units string the value is taken as days since the record's epoch.
pub fn decode_time(value: f64, units: Option<&str>) -> Result<NaiveDateTime> {
    if !value.is_finite() {
        return Err(IceError::Decode(format!("time value {} is not finite", value)));
    }

    let (seconds_per_unit, epoch) = match units {
        None => (86_400.0, cdr_epoch()),
        Some(units) => parse_time_units(units)?,
    };

    let millis = (value * seconds_per_unit * 1000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return Err(IceError::Decode(format!("time value {} overflows", value)));
    }

    TimeDelta::try_milliseconds(millis as i64)
        .and_then(|delta| epoch.checked_add_signed(delta))
        .ok_or_else(|| IceError::Decode(format!("time value {} is out of range", value)))
}

fn parse_time_units(units: &str) -> Result<(f64, NaiveDateTime)> {
    let (unit, epoch) = units
        .split_once(" since ")
        .ok_or_else(|| IceError::Decode(format!("unrecognised time units {:?}", units)))?;

    let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "days" | "day" => 86_400.0,
        "hours" | "hour" => 3_600.0,
        "minutes" | "minute" => 60.0,
        "seconds" | "second" => 1.0,
        other => {
            return Err(IceError::Decode(format!("unsupported time unit {:?}", other)));
        }
    };

    let epoch = epoch.trim().trim_end_matches('Z').trim_end_matches(" UTC");
    let parsed = NaiveDateTime::parse_from_str(epoch, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(epoch, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(epoch, "%Y-%m-%d").map(|d| d.and_time(Default::default()))
        })
        .map_err(|e| IceError::Decode(format!("time epoch {:?}: {}", epoch, e)))?;

    Ok((seconds_per_unit, parsed))
}
