use std::fmt;

use chrono::{
    DateTime, Datelike, Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime, Timelike,
    Utc,
};
use serde::{Deserialize, Serialize};

use crate::error::{InputField, ProfileError, Result};

pub type JulianDay = f64;

/// Julian Day of 1970-01-01T00:00:00Z.
pub const UNIX_EPOCH_JULIAN_DAY: JulianDay = 2_440_587.5;
/// Julian Day of 2000-01-01T12:00:00.
pub const J2000: JulianDay = 2_451_545.0;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl BirthDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        BirthDate { year, month, day }
    }

    /// Calendar date, or `InvalidInput` when the day does not exist.
    pub fn to_naive(&self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(|| {
            ProfileError::invalid(
                InputField::Date,
                format!("{} is not a calendar date", self),
            )
        })
    }
}

impl fmt::Display for BirthDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthTime {
    pub hour: u32,
    pub minute: u32,
}

impl BirthTime {
    pub fn new(hour: u32, minute: u32) -> Self {
        BirthTime { hour, minute }
    }

    pub fn to_naive(&self) -> Result<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).ok_or_else(|| {
            ProfileError::invalid(InputField::Time, format!("{} is not a clock time", self))
        })
    }
}

impl fmt::Display for BirthTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A validated birth record. Fields are range-checked on construction; the
/// region is checked against the geolocation table by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BirthInput {
    name: String,
    date: BirthDate,
    time: BirthTime,
    region: String,
}

impl BirthInput {
    pub fn new(
        name: impl Into<String>,
        date: BirthDate,
        time: BirthTime,
        region: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let region = region.into();

        if name.trim().is_empty() {
            return Err(ProfileError::invalid(InputField::Name, "must not be empty"));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&date.year) {
            return Err(ProfileError::invalid(
                InputField::Year,
                format!("{} is outside {}-{}", date.year, MIN_YEAR, MAX_YEAR),
            ));
        }
        if !(1..=12).contains(&date.month) {
            return Err(ProfileError::invalid(
                InputField::Month,
                format!("{} is outside 1-12", date.month),
            ));
        }
        if !(1..=31).contains(&date.day) {
            return Err(ProfileError::invalid(
                InputField::Day,
                format!("{} is outside 1-31", date.day),
            ));
        }
        if time.hour > 23 {
            return Err(ProfileError::invalid(
                InputField::Hour,
                format!("{} is outside 0-23", time.hour),
            ));
        }
        if time.minute > 59 {
            return Err(ProfileError::invalid(
                InputField::Minute,
                format!("{} is outside 0-59", time.minute),
            ));
        }
        date.to_naive()?;
        if region.trim().is_empty() {
            return Err(ProfileError::invalid(InputField::Region, "must not be empty"));
        }

        Ok(BirthInput {
            name: name.trim().to_string(),
            date,
            time,
            region: region.trim().to_string(),
        })
    }

    /// Parses `YYYY-MM-DD` and `HH:MM` strings.
    pub fn parse(name: &str, date: &str, time: &str, region: &str) -> Result<Self> {
        let parsed_date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|err| {
            ProfileError::invalid(InputField::Date, format!("{:?}: {}", date, err))
        })?;
        let parsed_time = NaiveTime::parse_from_str(time.trim(), "%H:%M").map_err(|err| {
            ProfileError::invalid(InputField::Time, format!("{:?}: {}", time, err))
        })?;
        Self::new(
            name,
            BirthDate::new(parsed_date.year(), parsed_date.month(), parsed_date.day()),
            BirthTime::new(parsed_time.hour(), parsed_time.minute()),
            region,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn date(&self) -> BirthDate {
        self.date
    }

    pub fn time(&self) -> BirthTime {
        self.time
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn local_date_time(&self) -> Result<NaiveDateTime> {
        Ok(NaiveDateTime::new(self.date.to_naive()?, self.time.to_naive()?))
    }
}

/// Continuous UT time value fed to the ephemeris.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize)]
pub struct NormalizedInstant {
    pub julian_day: JulianDay,
    pub utc: DateTime<Utc>,
}

impl NormalizedInstant {
    pub fn from_utc(utc: DateTime<Utc>) -> Self {
        NormalizedInstant {
            julian_day: date_to_julian_day(utc),
            utc,
        }
    }
}

/// Civil date and time at a fixed UTC offset to a Julian Day.
///
/// The offset is subtracted as is; no daylight saving or historical zone
/// rules are applied.
pub fn normalize(
    date: BirthDate,
    time: BirthTime,
    utc_offset_hours: f64,
) -> Result<NormalizedInstant> {
    if !utc_offset_hours.is_finite() {
        return Err(ProfileError::Configuration(format!(
            "UTC offset {} is not a number of hours",
            utc_offset_hours
        )));
    }
    let local = NaiveDateTime::new(date.to_naive()?, time.to_naive()?);
    let offset = ChronoDuration::minutes((utc_offset_hours * 60.0).round() as i64);
    let utc = local
        .checked_sub_signed(offset)
        .ok_or_else(|| {
            ProfileError::invalid(InputField::Date, format!("{} cannot be shifted to UTC", date))
        })?
        .and_utc();
    Ok(NormalizedInstant::from_utc(utc))
}

// ---------------------------
// ## Utility Functions
// ---------------------------

pub fn date_to_julian_day(date_time: DateTime<Utc>) -> JulianDay {
    date_time.timestamp_millis() as f64 / MILLIS_PER_DAY + UNIX_EPOCH_JULIAN_DAY
}

/// Inverse of [`date_to_julian_day`], to the millisecond.
pub fn julian_day_to_date(jd: JulianDay) -> Option<DateTime<Utc>> {
    if !jd.is_finite() {
        return None;
    }
    let millis = ((jd - UNIX_EPOCH_JULIAN_DAY) * MILLIS_PER_DAY).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}
