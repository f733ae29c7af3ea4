use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    booking::resolver::{Provenance, ResolvedWindow},
    timing::time_label::TimeLabel,
};

/// Today's window, expanded into the slots a user can pick from.
#[derive(Serialize, Clone)]
pub struct WindowResponse {
    start: TimeLabel,
    finish: TimeLabel,
    provenance: Provenance,
    slots: Vec<TimeLabel>,
}

impl WindowResponse {
    pub fn new(resolved: &ResolvedWindow) -> Self {
        Self {
            start: resolved.window.start(),
            finish: resolved.window.finish(),
            provenance: resolved.provenance,
            slots: resolved.slots(),
        }
    }
}

/// Echo of a window the admin just stored.
#[derive(Serialize, Clone)]
pub struct StoredResponse {
    kind: &'static str,
    start: TimeLabel,
    finish: TimeLabel,
}

impl StoredResponse {
    pub fn new(kind: &'static str, start: TimeLabel, finish: TimeLabel) -> Self {
        Self {
            kind,
            start,
            finish,
        }
    }
}

#[derive(Serialize, Clone)]
pub struct ConfirmResponse {
    date: String,
    slot: TimeLabel,
    notified: bool,
}

impl ConfirmResponse {
    pub fn new(date: NaiveDate, slot: TimeLabel, notified: bool) -> Self {
        Self {
            date: date.to_string(),
            slot,
            notified,
        }
    }
}
