//! Storage layer
//!
//! The writer and the query engine only see the [`ArticleStore`] trait.
//!
//! ## Engines
//!
//! - **MemoryStore**: Tables in process memory, used by tests and `--memory`
//! - **SqliteStore**: Durable single-file engine
//!
//! Both engines order index scans by (creation time, id) and apply a
//! transaction's intents all-or-nothing.

pub mod engine;
pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;

pub use engine::{
    ArticleIndex, ArticleRange, ArticleStore, Direction, IdIndex, IdRange, Precondition,
    WriteIntent,
};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use sqlite::SqliteStore;
