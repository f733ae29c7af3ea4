use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::StoreError;

use super::{error::BookingError, window::Window};

/// Which of the two window tables a record lives in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WindowTable {
    /// One-off windows entered for a specific day.
    Override,
    /// The standing window. Only the newest row matters.
    Default,
}

impl WindowTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Override => "coffeetime",
            Self::Default => "coffeetime_default",
        }
    }

    /// The admin form's name for this table.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Default => "default",
        }
    }

    /// Map the admin form's `kind` field onto a table.
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "override" => Some(Self::Override),
            "default" => Some(Self::Default),
            _ => None,
        }
    }
}

/// A window as it was persisted, labels unchecked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredWindow {
    pub start: String,
    pub finish: String,
    pub created_at: DateTime<Utc>,
}

impl StoredWindow {
    pub fn window(&self) -> Result<Window, BookingError> {
        Window::from_labels(&self.start, &self.finish)
    }
}

/// Durable storage for override and default windows.
///
/// Every query is a single read of the latest committed state. "Most recent" is by
/// insertion order.
pub trait WindowStore {
    fn most_recent_override(&self) -> Result<Option<StoredWindow>, StoreError>;

    fn most_recent_default(&self) -> Result<Option<StoredWindow>, StoreError>;

    fn insert(&self, table: WindowTable, window: &Window) -> Result<(), StoreError>;

    /// Every record in `table`, newest first.
    fn history(&self, table: WindowTable) -> Result<Vec<StoredWindow>, StoreError>;
}
