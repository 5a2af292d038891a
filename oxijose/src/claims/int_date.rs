use std::fmt::Display;

use chrono::{
    DateTime,
    Utc,
};

/// Whole seconds since the Unix epoch, the JWT `NumericDate` restricted to integers
///
/// Conversion from a [`DateTime`] truncates sub-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntDate(i64);

impl IntDate {
    /// Wraps a count of seconds since the epoch
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// Seconds since the epoch
    #[must_use]
    pub const fn secs(self) -> i64 {
        self.0
    }

    /// Current system time
    #[must_use]
    pub fn now() -> Self {
        Utc::now().into()
    }

    /// Converts back to a calendar date; [`None`] if out of `chrono`'s range
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }
}

impl From<DateTime<Utc>> for IntDate {
    fn from(value: DateTime<Utc>) -> Self {
        // `timestamp` floors; round toward zero instead for pre-epoch dates
        let secs = value.timestamp();
        if secs < 0 && value.timestamp_subsec_nanos() > 0 {
            Self(secs + 1)
        } else {
            Self(secs)
        }
    }
}

impl From<IntDate> for i64 {
    fn from(value: IntDate) -> Self {
        value.0
    }
}

impl Display for IntDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
