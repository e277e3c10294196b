//! inkpost Core Library
//!
//! This crate provides article persistence and retrieval for inkpost,
//! a content-publishing backend (articles, tags, favorites).
//!
//! # Architecture
//!
//! - **Storage engine**: anything implementing [`ArticleStore`]. It offers
//!   point reads, ordered index range queries, batched point reads and
//!   all-or-nothing conditional transactions. [`SqliteStore`] is the durable
//!   engine, [`MemoryStore`] the in-process one.
//! - **Writer**: allocates collision-resistant identifiers and commits an
//!   article together with its tag links and tag counters in one transaction.
//! - **Query engine**: validates paging and filters, then serves listings
//!   either straight from an ordered index or by resolving an ordered id list
//!   through batched point reads.
//!
//! # Quick Start
//!
//! ```text
//! let mut articles = Articles::open(Config::load()?)?;
//!
//! let article = articles.create_article(
//!     NewArticle::new("jake", "How to train your dragon").with_tags(["dragons"]),
//! )?;
//!
//! let page = articles.list_articles(&ListRequest::new(0, 20).tag("dragons"))?;
//! ```
//!
//! # Modules
//!
//! - `service`: Facade exposing the article operations (main entry point)
//! - `models`: Articles, tag links, tag counters and favorites
//! - `writer`: Create/update/delete under the transactional protocol
//! - `query`: Listing validation and dispatch, lookup by slug
//! - `reconstruct`: Ordered reassembly of batched point reads
//! - `id`: Identifier allocation
//! - `slug`: Slug derivation and parsing
//! - `storage`: Storage engine boundary and implementations
//! - `config`: Application configuration

pub mod config;
pub mod error;
pub mod id;
pub mod models;
pub mod query;
pub mod reconstruct;
pub mod service;
pub mod slug;
pub mod storage;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, Limits};
pub use error::{ArticleError, ArticleResult};
pub use id::IdAllocator;
pub use models::{
    Article, ArticleId, ArticlePatch, FavoriteRecord, NewArticle, Revision, TagCounter, TagLink,
};
pub use query::{ArticleFilter, ArticleQueryEngine, ListRequest, Page};
pub use service::Articles;
pub use storage::{ArticleStore, MemoryStore, SqliteStore, StorageError};
pub use writer::ArticleWriter;
