use thiserror::Error;

use crate::{database::StoreError, timing::time_label::UnknownTimeLabel};

/// Failures while resolving, expanding or booking against today's window.
///
/// Apart from `ChoiceOutsideWindow` none of these are the user's fault, and the HTTP layer
/// shows a generic failure for them.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("no override for today and no default window has ever been stored")]
    NoWindowConfigured,

    #[error("stored window is corrupt: {0}")]
    UnknownTimeLabel(#[from] UnknownTimeLabel),

    #[error("stored window is corrupt: start {start} is after finish {finish}")]
    InvertedWindow { start: String, finish: String },

    #[error("{0} is not one of today's slots")]
    ChoiceOutsideWindow(String),

    #[error("window store failure: {0}")]
    Store(#[from] StoreError),
}

impl BookingError {
    /// True for errors that mean stored data no longer matches the catalogue.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::UnknownTimeLabel(_) | Self::InvertedWindow { .. })
    }
}
