//! CAMx time handling.
//!
//! CAMx files store one date/time pair per timestep: the date as a `YYYYDDD`
//! Julian integer and the time either as `HHMMSS` or as fractional hours,
//! depending on the preprocessor that wrote the file. The decoded `TFLAG`
//! field normalizes both to `HHMMSS`, replicated across the variable axis.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CamxError, CamxResult};

/// Decoded per-timestep time flags, shaped `(TSTEP, VAR, DATE-TIME)`.
///
/// `[t, v, 0]` holds the `YYYYDDD` date and `[t, v, 1]` the `HHMMSS` time;
/// every variable index carries the same pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeFlags {
    data: Vec<i32>,
    timesteps: usize,
    nvars: usize,
}

impl TimeFlags {
    /// Flat row-major data, `timesteps * nvars * 2` values.
    pub fn data(&self) -> &[i32] {
        &self.data
    }

    /// Consume into the flat data vector.
    pub fn into_data(self) -> Vec<i32> {
        self.data
    }

    pub fn timesteps(&self) -> usize {
        self.timesteps
    }

    pub fn nvars(&self) -> usize {
        self.nvars
    }

    /// The (date, time) pair for one timestep.
    pub fn timestep(&self, t: usize) -> Option<(i32, i32)> {
        if t >= self.timesteps {
            return None;
        }
        let base = t * self.nvars * 2;
        Some((self.data[base], self.data[base + 1]))
    }
}

/// Convert raw CAMx per-timestep dates and times into a `TFLAG` array.
///
/// `dates` holds `YYYYDDD` integers and `times` the matching raw time words.
/// Times below 10000 are (possibly fractional) hours and are scaled by 10000
/// into `HHMMSS`; the scale decision is made from the first timestep, since a
/// single file never mixes conventions. The pair is replicated `nvars` times
/// along the variable axis.
pub fn convert_camx_time(dates: &[i32], times: &[f32], nvars: usize) -> CamxResult<TimeFlags> {
    if dates.len() != times.len() {
        return Err(CamxError::Shape(format!(
            "time flags: {} dates for {} times",
            dates.len(),
            times.len()
        )));
    }

    let timesteps = dates.len();
    let scale_hours = times.first().is_some_and(|&t| t < 10000.0);

    let mut data = Vec::with_capacity(timesteps * nvars * 2);
    for (&date, &time) in dates.iter().zip(times.iter()) {
        let hhmmss = if scale_hours {
            (time * 10000.0) as i32
        } else {
            time as i32
        };
        for _ in 0..nvars {
            data.push(date);
            data.push(hhmmss);
        }
    }

    Ok(TimeFlags {
        data,
        timesteps,
        nvars,
    })
}

/// Convert a `YYYYDDD` Julian date to a calendar date.
pub fn julian_to_date(yyyyddd: i32) -> CamxResult<NaiveDate> {
    let year = yyyyddd / 1000;
    let doy = yyyyddd % 1000;
    NaiveDate::from_yo_opt(year, doy as u32).ok_or_else(|| {
        CamxError::Format(format!("invalid Julian date {} (year {}, day {})", yyyyddd, year, doy))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractional_hours_scaled() {
        let dates = vec![2005185; 3];
        let times = vec![0.0, 1.0, 24.0];
        let tflag = convert_camx_time(&dates, &times, 2).unwrap();

        assert_eq!(tflag.timesteps(), 3);
        assert_eq!(tflag.nvars(), 2);
        assert_eq!(tflag.data().len(), 12);
        assert_eq!(tflag.timestep(0), Some((2005185, 0)));
        assert_eq!(tflag.timestep(1), Some((2005185, 10000)));
        assert_eq!(tflag.timestep(2), Some((2005185, 240000)));
    }

    #[test]
    fn test_hhmmss_passthrough() {
        let dates = vec![2005185, 2005186];
        let times = vec![230000.0, 10000.0];
        let tflag = convert_camx_time(&dates, &times, 2).unwrap();
        assert_eq!(tflag.timestep(0), Some((2005185, 230000)));
        assert_eq!(tflag.timestep(1), Some((2005186, 10000)));
    }

    #[test]
    fn test_variable_replication() {
        let tflag = convert_camx_time(&[2024001], &[60000.0], 3).unwrap();
        assert_eq!(tflag.data(), &[2024001, 60000, 2024001, 60000, 2024001, 60000]);
    }

    #[test]
    fn test_empty_trace() {
        let tflag = convert_camx_time(&[], &[], 2).unwrap();
        assert_eq!(tflag.timesteps(), 0);
        assert!(tflag.data().is_empty());
    }

    #[test]
    fn test_mismatched_lengths() {
        assert!(convert_camx_time(&[2024001], &[], 2).is_err());
    }

    #[test]
    fn test_julian_to_date() {
        let d = julian_to_date(2005185).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2005, 7, 4).unwrap());
        assert!(julian_to_date(2005366).is_err());
        assert!(julian_to_date(2024366).is_ok());
    }
}
