#[macro_use]
extern crate diesel;

use std::fmt;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2;
use diesel::sql_types::Text;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use thiserror::Error;

/// Type of a pooled SQLite connection manager.
pub type SqliteConnectionManager = r2d2::ConnectionManager<SqliteConnection>;

/// Type for a SQLite connection pool.
pub type SqliteConnectionPool = r2d2::Pool<SqliteConnectionManager>;

pub type DbConnection = SqliteConnection;

/// Schema migrations, compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

// Unicode-aware lowercase. SQLite's own lower() only folds ASCII, which
// misses book names such as "Éxodo".
diesel::define_sql_function!(fn fold_case(text: Text) -> Text);

/// Kinds of rows that a lookup can fail to find.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    Book,
    Chapter,
    Verse,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Book => "Book",
            Entity::Chapter => "Chapter",
            Entity::Verse => "Verse",
        })
    }
}

#[derive(Clone, Error, Debug)]
pub enum DbError {
    #[error("{} was not found.", entity)]
    NotFound { entity: Entity },

    #[error("There was a connection pool error. Root cause: {:?}.", cause)]
    ConnectionPool { cause: String },

    #[error("Could not connect to the database. Root cause: {:?}.", cause)]
    Connection { cause: String },

    #[error("There was a database error. Root cause: {:?}.", cause)]
    Other { cause: String },

    #[error("There was a database migration error. Root cause: {:?}.", cause)]
    Migration { cause: String },

    #[error("Could not read the corpus document. Root cause: {:?}.", cause)]
    Document { cause: String },
}

impl From<diesel::result::Error> for DbError {
    fn from(e: diesel::result::Error) -> Self {
        DbError::Other {
            cause: e.to_string(),
        }
    }
}

impl From<r2d2::PoolError> for DbError {
    fn from(e: r2d2::PoolError) -> Self {
        DbError::ConnectionPool {
            cause: e.to_string(),
        }
    }
}

/// Per-connection setup: foreign keys, lock waiting and the `fold_case` function.
fn configure(conn: &mut SqliteConnection) -> QueryResult<()> {
    conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
    fold_case_utils::register_impl(conn, |text: String| text.to_lowercase())
}

#[derive(Debug)]
struct ConnectionOptions;

impl r2d2::CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        configure(conn).map_err(r2d2::Error::QueryError)
    }
}

/// Builds a SQLite connection pool with the given URL.
pub fn build_pool(db_url: &str, max_size: u32) -> Result<SqliteConnectionPool, DbError> {
    r2d2::Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(SqliteConnectionManager::new(db_url))
        .map_err(|e| DbError::ConnectionPool {
            cause: e.to_string(),
        })
}

/// Establishes a non-pooled SQLite connection.
pub fn establish_connection(db_url: &str) -> Result<SqliteConnection, DbError> {
    let mut conn = SqliteConnection::establish(db_url).map_err(|e| DbError::Connection {
        cause: format!("{db_url}: {e}"),
    })?;
    configure(&mut conn)?;

    Ok(conn)
}

/// Run any pending Diesel migrations.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<(), DbError> {
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|e| DbError::Migration {
            cause: e.to_string(),
        })
}

/// Drops every corpus table and recreates the schema from scratch.
pub fn reset_schema(conn: &mut SqliteConnection) -> Result<(), DbError> {
    conn.revert_all_migrations(MIGRATIONS)
        .map_err(|e| DbError::Migration {
            cause: e.to_string(),
        })?;
    run_migrations(conn)
}

pub mod concordance;
pub mod loader;
pub mod models;
mod schema;

pub use concordance::{Concordance, SqliteConcordance};
pub use loader::{load_document, load_file, Document, LoadSummary};
