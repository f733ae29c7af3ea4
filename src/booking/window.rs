use std::sync::OnceLock;

use chrono::NaiveTime;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::timing::time_label::TimeLabel;

use super::error::BookingError;

/// A bookable range of half-hour marks, `start` through `finish` inclusive.
///
/// Windows coming from the write path always have `start < finish`. Windows rebuilt from
/// stored rows may have `start == finish` if they predate that rule.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Window {
    start: TimeLabel,
    finish: TimeLabel,
}

impl Window {
    /// Rebuild a window from labels read back from storage.
    ///
    /// Fails with `UnknownTimeLabel` if either label is outside the catalogue and with
    /// `InvertedWindow` if the start comes after the finish.
    pub fn from_labels(start: &str, finish: &str) -> Result<Self, BookingError> {
        let start_label = TimeLabel::parse(start)?;
        let finish_label = TimeLabel::parse(finish)?;
        if start_label > finish_label {
            return Err(BookingError::InvertedWindow {
                start: start.to_string(),
                finish: finish.to_string(),
            });
        }
        Ok(Self {
            start: start_label,
            finish: finish_label,
        })
    }

    pub fn start(&self) -> TimeLabel {
        self.start
    }

    pub fn finish(&self) -> TimeLabel {
        self.finish
    }
}

/// Why an admin-submitted window was refused. Each kind has its own corrective message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is not a HH:MM time")]
    MalformedTime(String),

    #[error("start time is after finish time")]
    StartAfterFinish,

    #[error("start time equals finish time")]
    ZeroLengthWindow,

    #[error("'{0}' is not on a half-hour mark")]
    NotOnHalfHour(String),
}

impl ValidationError {
    /// Text shown back to the admin so they can fix the form.
    pub fn user_message(&self) -> String {
        match self {
            Self::MalformedTime(input) => {
                format!("Enter times as HH:MM in 24-hour format (got '{}').", input)
            }
            Self::StartAfterFinish => "Please set the finish time after the start time!".to_string(),
            Self::ZeroLengthWindow => "The start time and finish time are the same.".to_string(),
            Self::NotOnHalfHour(input) => {
                format!("Times must be on the hour or half hour (got '{}').", input)
            }
        }
    }
}

fn clock_format() -> &'static Regex {
    static CLOCK_FORMAT: OnceLock<Regex> = OnceLock::new();
    CLOCK_FORMAT.get_or_init(|| Regex::new(r"^(\d{2}):(\d{2})$").unwrap())
}

/// Parse a strict 24-hour `HH:MM` string.
fn parse_clock(input: &str) -> Result<NaiveTime, ValidationError> {
    let malformed = || ValidationError::MalformedTime(input.to_string());
    let captures = clock_format().captures(input).ok_or_else(malformed)?;
    // Both groups are two ASCII digits
    let hour: u32 = captures[1].parse().map_err(|_| malformed())?;
    let minute: u32 = captures[2].parse().map_err(|_| malformed())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(malformed)
}

/**
Validate an admin-submitted window before anything is written.

Ordering is checked on the parsed clock times first, so an inverted or empty range is
reported as such even if the times are also off the half-hour grid.
*/
pub fn validate_window(start: &str, finish: &str) -> Result<Window, ValidationError> {
    let start_time = parse_clock(start)?;
    let finish_time = parse_clock(finish)?;

    if start_time > finish_time {
        return Err(ValidationError::StartAfterFinish);
    }
    if start_time == finish_time {
        return Err(ValidationError::ZeroLengthWindow);
    }

    let start = TimeLabel::from_time(start_time)
        .ok_or_else(|| ValidationError::NotOnHalfHour(start.to_string()))?;
    let finish = TimeLabel::from_time(finish_time)
        .ok_or_else(|| ValidationError::NotOnHalfHour(finish.to_string()))?;
    Ok(Window { start, finish })
}
