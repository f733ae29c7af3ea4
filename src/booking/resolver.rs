use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::timing::{jst_datetime_now::jst_date_of, time_label::TimeLabel};

use super::{error::BookingError, slots::expand, store::WindowStore, window::Window};

/// Where the active window came from. Informational only.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Override,
    Default,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedWindow {
    pub window: Window,
    pub provenance: Provenance,
}

impl ResolvedWindow {
    pub fn slots(&self) -> Vec<TimeLabel> {
        expand(&self.window)
    }
}

/**
Decide which window applies on `today` (a UTC+9 calendar date).

The newest override wins if it was created on `today` in UTC+9. Otherwise the newest default
ever written is used, no matter how old. Overrides from earlier days are simply ignored.

Fails with `NoWindowConfigured` when neither applies, and with a corruption error if the chosen
record holds labels outside the catalogue.
*/
pub fn resolve_active_window<S: WindowStore + ?Sized>(
    store: &S,
    today: NaiveDate,
) -> Result<ResolvedWindow, BookingError> {
    if let Some(record) = store.most_recent_override()? {
        let recorded_on = jst_date_of(record.created_at);
        if recorded_on == today {
            debug!(%today, start = %record.start, finish = %record.finish, "using today's override");
            return Ok(ResolvedWindow {
                window: record.window()?,
                provenance: Provenance::Override,
            });
        }
        debug!(%today, %recorded_on, "latest override is not for today");
    }

    let Some(record) = store.most_recent_default()? else {
        return Err(BookingError::NoWindowConfigured);
    };
    debug!(start = %record.start, finish = %record.finish, "using default window");
    Ok(ResolvedWindow {
        window: record.window()?,
        provenance: Provenance::Default,
    })
}
