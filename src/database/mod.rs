pub mod sqlite;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not get a database connection: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("bad created_at timestamp in database: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("{0}")]
    Other(String),
}
