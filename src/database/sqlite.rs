use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::booking::{
    store::{StoredWindow, WindowStore, WindowTable},
    window::Window,
};

use super::StoreError;

pub struct SqliteDatabase {}

impl SqliteDatabase {
    /**
    Create the window table if it does not exist yet.

    Both window tables share this layout.
    */
    pub fn create_table(
        connection: &PooledConnection<SqliteConnectionManager>,
        table: WindowTable,
    ) -> rusqlite::Result<()> {
        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY,
                    created_at TEXT NOT NULL,
                    starttime TEXT NOT NULL,
                    finishtime TEXT NOT NULL
                )",
                table.table_name()
            ),
            (),
        )?;
        Ok(())
    }

    /**
    Get the most recently inserted window.

    Returns an `Ok(None)` if the table is empty.
    */
    pub fn query_most_recent(
        connection: &PooledConnection<SqliteConnectionManager>,
        table: WindowTable,
    ) -> Result<Option<StoredWindow>, StoreError> {
        // Table names come from `WindowTable`, never from the request
        let mut statement = connection.prepare(&format!(
            "SELECT created_at, starttime, finishtime FROM {} ORDER BY id DESC LIMIT 1",
            table.table_name()
        ))?;
        let mut rows = statement.query(())?;
        match rows.next()? {
            Some(row) => {
                let created_at: String = row.get(0)?;
                Ok(Some(StoredWindow {
                    created_at: Self::parse_timestamp(&created_at)?,
                    start: row.get(1)?,
                    finish: row.get(2)?,
                }))
            }
            None => Ok(None),
        }
    }

    /**
    Get every window in the table, newest first.
    */
    pub fn query_all(
        connection: &PooledConnection<SqliteConnectionManager>,
        table: WindowTable,
    ) -> Result<Vec<StoredWindow>, StoreError> {
        let mut statement = connection.prepare(&format!(
            "SELECT created_at, starttime, finishtime FROM {} ORDER BY id DESC",
            table.table_name()
        ))?;
        let rows = statement.query_map((), |row| {
            let created_at: String = row.get(0)?;
            let start: String = row.get(1)?;
            let finish: String = row.get(2)?;
            Ok((created_at, start, finish))
        })?;

        let mut data: Vec<StoredWindow> = Vec::new();
        for row in rows {
            let (created_at, start, finish) = row?;
            data.push(StoredWindow {
                created_at: Self::parse_timestamp(&created_at)?,
                start,
                finish,
            });
        }
        Ok(data)
    }

    /**
    Insert one window stamped with `created_at`.
    */
    pub fn insert_window(
        connection: &PooledConnection<SqliteConnectionManager>,
        table: WindowTable,
        window: &Window,
        created_at: DateTime<Utc>,
    ) -> rusqlite::Result<()> {
        connection.execute(
            &format!(
                "INSERT INTO {} (created_at, starttime, finishtime) VALUES (?1, ?2, ?3)",
                table.table_name()
            ),
            rusqlite::params![
                created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                window.start().as_str(),
                window.finish().as_str()
            ],
        )?;
        Ok(())
    }

    fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc))
    }
}

/// The window store backed by a pooled SQLite database.
#[derive(Clone)]
pub struct SqliteWindowStore {
    connection_pool: Arc<Pool<SqliteConnectionManager>>,
}

impl SqliteWindowStore {
    /// Wrap the pool and make sure both window tables exist.
    pub fn setup(connection_pool: Arc<Pool<SqliteConnectionManager>>) -> Result<Self, StoreError> {
        let connection = connection_pool.get()?;
        for table in [WindowTable::Override, WindowTable::Default] {
            SqliteDatabase::create_table(&connection, table)?;
        }
        info!("window tables ready");
        Ok(Self { connection_pool })
    }

    pub(crate) fn get_connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, StoreError> {
        Ok(self.connection_pool.get()?)
    }

    /// Insert with an explicit timestamp. `insert` stamps with the current time.
    pub fn insert_at(
        &self,
        table: WindowTable,
        window: &Window,
        created_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let connection = self.get_connection()?;
        SqliteDatabase::insert_window(&connection, table, window, created_at)?;
        Ok(())
    }
}

impl WindowStore for SqliteWindowStore {
    fn most_recent_override(&self) -> Result<Option<StoredWindow>, StoreError> {
        SqliteDatabase::query_most_recent(&self.get_connection()?, WindowTable::Override)
    }

    fn most_recent_default(&self) -> Result<Option<StoredWindow>, StoreError> {
        SqliteDatabase::query_most_recent(&self.get_connection()?, WindowTable::Default)
    }

    fn insert(&self, table: WindowTable, window: &Window) -> Result<(), StoreError> {
        self.insert_at(table, window, Utc::now())
    }

    fn history(&self, table: WindowTable) -> Result<Vec<StoredWindow>, StoreError> {
        SqliteDatabase::query_all(&self.get_connection()?, table)
    }
}

#[cfg(test)]
pub mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::booking::{
        error::BookingError,
        resolver::{resolve_active_window, Provenance},
    };

    /// A store over a private in-memory database. One connection, so every query sees the
    /// same database.
    pub fn memory_store() -> SqliteWindowStore {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).unwrap();
        SqliteWindowStore::setup(Arc::new(pool)).unwrap()
    }

    fn window(start: &str, finish: &str) -> Window {
        Window::from_labels(start, finish).unwrap()
    }

    #[test]
    fn empty_tables_have_no_recent_window() {
        let store = memory_store();
        assert_eq!(store.most_recent_override().unwrap(), None);
        assert_eq!(store.most_recent_default().unwrap(), None);
        assert!(store.history(WindowTable::Default).unwrap().is_empty());
    }

    #[test]
    fn most_recent_is_last_inserted() {
        let store = memory_store();
        let created_at = Utc.with_ymd_and_hms(2024, 6, 10, 1, 0, 0).unwrap();
        store
            .insert_at(WindowTable::Default, &window("09:00", "17:00"), created_at)
            .unwrap();
        // Same timestamp; insertion order decides.
        store
            .insert_at(WindowTable::Default, &window("10:00", "12:00"), created_at)
            .unwrap();

        let recent = store.most_recent_default().unwrap().unwrap();
        assert_eq!(recent.start, "10:00");
        assert_eq!(recent.finish, "12:00");
        assert_eq!(recent.created_at, created_at);
    }

    #[test]
    fn tables_are_independent() {
        let store = memory_store();
        store
            .insert(WindowTable::Override, &window("13:00", "14:00"))
            .unwrap();
        assert_eq!(store.most_recent_default().unwrap(), None);
        assert!(store.most_recent_override().unwrap().is_some());
    }

    #[test]
    fn history_is_newest_first() {
        let store = memory_store();
        for (start, finish) in [("09:00", "10:00"), ("10:00", "11:00"), ("11:00", "12:00")] {
            store
                .insert(WindowTable::Override, &window(start, finish))
                .unwrap();
        }
        let starts: Vec<String> = store
            .history(WindowTable::Override)
            .unwrap()
            .into_iter()
            .map(|record| record.start)
            .collect();
        assert_eq!(starts, vec!["11:00", "10:00", "09:00"]);
    }

    #[test]
    fn resolves_against_sqlite() {
        let store = memory_store();
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let yesterday = Utc.with_ymd_and_hms(2024, 6, 9, 1, 0, 0).unwrap();
        let this_morning = Utc.with_ymd_and_hms(2024, 6, 10, 1, 0, 0).unwrap();
        store
            .insert_at(WindowTable::Default, &window("09:00", "17:00"), yesterday)
            .unwrap();
        store
            .insert_at(WindowTable::Override, &window("13:00", "14:00"), yesterday)
            .unwrap();

        let resolved = resolve_active_window(&store, today).unwrap();
        assert_eq!(resolved.provenance, Provenance::Default);

        store
            .insert_at(WindowTable::Override, &window("13:00", "14:00"), this_morning)
            .unwrap();
        let resolved = resolve_active_window(&store, today).unwrap();
        assert_eq!(resolved.provenance, Provenance::Override);
        assert_eq!(resolved.window, window("13:00", "14:00"));
    }

    #[test]
    fn legacy_row_with_unknown_label_is_reported() {
        let store = memory_store();
        let connection = store.get_connection().unwrap();
        connection
            .execute(
                "INSERT INTO coffeetime_default (created_at, starttime, finishtime) VALUES (?1, ?2, ?3)",
                rusqlite::params!["2024-06-01T00:00:00Z", "9:00", "17:00"],
            )
            .unwrap();
        drop(connection);

        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert!(matches!(
            resolve_active_window(&store, today),
            Err(BookingError::UnknownTimeLabel(_))
        ));
    }

    #[test]
    fn bad_timestamp_is_a_store_error() {
        let store = memory_store();
        let connection = store.get_connection().unwrap();
        connection
            .execute(
                "INSERT INTO coffeetime (created_at, starttime, finishtime) VALUES ('yesterday', '09:00', '10:00')",
                (),
            )
            .unwrap();
        drop(connection);

        assert!(matches!(
            store.most_recent_override(),
            Err(StoreError::Timestamp(_))
        ));
    }
}
