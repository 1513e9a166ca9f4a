//! Diesel schema and row model for the append-only opportunity log.

pub mod model;
pub mod schema;

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;

use crate::error::{Error, Result};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Create a connection pool for `database_url`, creating the schema if it
/// does not already exist.
pub fn create_pool(database_url: &str) -> Result<DbPool> {
    use diesel::prelude::*;

    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder().max_size(5).build(manager).map_err(Error::DbConnection)?;

    let mut conn = pool.get().map_err(Error::DbConnection)?;
    diesel::sql_query(
        "CREATE TABLE IF NOT EXISTS opportunities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            t_detected TEXT NOT NULL,
            kind TEXT NOT NULL,
            payload_json TEXT NOT NULL
        )",
    )
    .execute(&mut conn)
    .map_err(Error::Database)?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_pool_with_memory_db() {
        assert!(create_pool(":memory:").is_ok());
    }
}
