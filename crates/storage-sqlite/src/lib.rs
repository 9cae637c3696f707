//! SQLite storage implementation for ad platform sync.
//!
//! This crate is the only place where Diesel dependencies exist. It implements
//! the repository traits defined in `adsync-core`:
//! - Connection pooling and the single-writer actor
//! - Embedded Diesel migrations
//! - Connected account and campaign repositories with optimistic versioning
//!
//! ```text
//! core (domain)          connect (sync engine)
//!       │                      │
//!       └──────────┬───────────┘
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
mod utils;

pub mod campaigns;
pub mod connected_accounts;

pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

pub use errors::{IntoCore, StorageError};

pub use adsync_core::errors::{DatabaseError, Error, Result};
