use std::{fmt::Display, str::FromStr};

use chrono::{NaiveTime, Timelike};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Every half-hour mark of a day, in order. A `TimeLabel` is an index into this table.
const CATALOGUE: [&str; 48] = [
    "00:00", "00:30", "01:00", "01:30", "02:00", "02:30", "03:00", "03:30", //
    "04:00", "04:30", "05:00", "05:30", "06:00", "06:30", "07:00", "07:30", //
    "08:00", "08:30", "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", //
    "12:00", "12:30", "13:00", "13:30", "14:00", "14:30", "15:00", "15:30", //
    "16:00", "16:30", "17:00", "17:30", "18:00", "18:30", "19:00", "19:30", //
    "20:00", "20:30", "21:00", "21:30", "22:00", "22:30", "23:00", "23:30", //
];

/// A label that is not one of the 48 half-hour marks.
///
/// Only externally sourced data (rows written before validation existed, hand edited
/// databases) can produce this, so it is treated as corruption rather than user error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a half-hour time label")]
pub struct UnknownTimeLabel(pub String);

/// One of the 48 half-hour marks of a day, `"00:00"` through `"23:30"`.
///
/// Ordering follows the catalogue, so `09:00 < 09:30 < 10:00`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeLabel(u8);

impl TimeLabel {
    pub const COUNT: usize = CATALOGUE.len();

    /// Look up a label in the catalogue.
    pub fn parse(label: &str) -> Result<Self, UnknownTimeLabel> {
        CATALOGUE
            .iter()
            .position(|entry| *entry == label)
            .map(|position| Self(position as u8))
            .ok_or_else(|| UnknownTimeLabel(label.to_string()))
    }

    /// The label at `position`, or `None` past the end of the day.
    pub fn from_position(position: usize) -> Option<Self> {
        (position < Self::COUNT).then(|| Self(position as u8))
    }

    /// The label for a clock time, if it falls exactly on a half-hour mark.
    pub fn from_time(time: NaiveTime) -> Option<Self> {
        if time.second() != 0 || time.nanosecond() != 0 {
            return None;
        }
        match time.minute() {
            0 | 30 => Self::from_position((time.hour() * 2 + time.minute() / 30) as usize),
            _ => None,
        }
    }

    pub fn position(&self) -> usize {
        self.0 as usize
    }

    pub fn as_str(&self) -> &'static str {
        CATALOGUE[self.position()]
    }

    /// The whole catalogue in order.
    pub fn all() -> impl DoubleEndedIterator<Item = TimeLabel> + ExactSizeIterator {
        (0..Self::COUNT as u8).map(TimeLabel)
    }
}

impl FromStr for TimeLabel {
    type Err = UnknownTimeLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for TimeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TimeLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
