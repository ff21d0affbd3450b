//! Repository implementations.
//!
//! - `sqlite`: Diesel + r2d2 over a SQLite file, the default backend
//! - `local`: In-memory implementation for tests and ephemeral runs
#[cfg(feature = "local-repo")]
pub mod local;
#[cfg(feature = "sqlite-repo")]
pub mod sqlite;

#[cfg(feature = "local-repo")]
pub use local::LocalRepository;
#[cfg(feature = "sqlite-repo")]
pub use sqlite::{SqliteConfig, SqliteRepository, DEFAULT_DATABASE_URL};
