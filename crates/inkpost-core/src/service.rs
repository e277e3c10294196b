//! Article service
//!
//! `Articles` is the entry point the rest of the application talks to. It
//! shares one storage engine between an [`ArticleWriter`] and an
//! [`ArticleQueryEngine`] and adds the checks that need both, such as the
//! author check on update.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::{Config, Limits};
use crate::error::{ArticleError, ArticleResult};
use crate::id::IdAllocator;
use crate::models::{Article, ArticlePatch, NewArticle, TagCounter};
use crate::query::{ArticleQueryEngine, ListRequest};
use crate::storage::{ArticleStore, SqliteStore};
use crate::writer::ArticleWriter;

/// Article operations over a shared storage engine
pub struct Articles<S: ArticleStore + ?Sized> {
    writer: ArticleWriter<Arc<S>>,
    query: ArticleQueryEngine<Arc<S>>,
    limits: Limits,
}

impl Articles<dyn ArticleStore> {
    /// Open the SQLite-backed service described by `config`
    pub fn open(config: &Config) -> Result<Self> {
        let store = SqliteStore::open(config).with_context(|| {
            format!("Failed to open article store at {:?}", config.sqlite_path())
        })?;
        let store: Arc<dyn ArticleStore> = Arc::new(store);
        Ok(Self::with_store(store, config.limits()))
    }
}

impl<S: ArticleStore + ?Sized> Articles<S> {
    /// Service over an existing engine with a fresh entropy-seeded allocator
    pub fn with_store(store: Arc<S>, limits: Limits) -> Self {
        Self::with_allocator(store, IdAllocator::new(), limits)
    }

    pub fn with_allocator(store: Arc<S>, allocator: IdAllocator, limits: Limits) -> Self {
        Self {
            writer: ArticleWriter::new(Arc::clone(&store), allocator, limits),
            query: ArticleQueryEngine::new(store, limits),
            limits,
        }
    }

    /// Another service over the same engine with its own id stream
    ///
    /// Use one per concurrent writer.
    pub fn fork(&mut self) -> Self {
        let allocator = self.writer.fork_allocator();
        Self::with_allocator(Arc::clone(self.query.store()), allocator, self.limits)
    }

    pub fn store(&self) -> &Arc<S> {
        self.query.store()
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn create_article(&mut self, input: NewArticle) -> ArticleResult<Article> {
        self.writer.create(input)
    }

    /// Patch the article behind `slug`; only its author may do so
    ///
    /// A concurrent change between the read and the write restarts the
    /// update from a fresh read, up to `limits.max_attempts` times.
    pub fn update_article(
        &self,
        slug: &str,
        patch: ArticlePatch,
        requester: &str,
    ) -> ArticleResult<Article> {
        let attempts = self.limits.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let old = self.query.get_by_slug(slug)?;
            if old.author != requester {
                return Err(ArticleError::Forbidden {
                    requester: requester.to_string(),
                });
            }

            match self.writer.update(&old, patch.clone()) {
                Err(ArticleError::Modified) if attempt < attempts => {
                    debug!(slug, attempt, "article changed during update, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    pub fn delete_article(&self, slug: &str, requester: &str) -> ArticleResult<()> {
        self.writer.delete(slug, requester)
    }

    pub fn get_article_by_slug(&self, slug: &str) -> ArticleResult<Article> {
        self.query.get_by_slug(slug)
    }

    pub fn list_articles(&self, request: &ListRequest) -> ArticleResult<Vec<Article>> {
        self.query.list(request)
    }

    pub fn favorite_article(&self, slug: &str, username: &str) -> ArticleResult<Article> {
        self.writer.favorite(slug, username)
    }

    pub fn unfavorite_article(&self, slug: &str, username: &str) -> ArticleResult<Article> {
        self.writer.unfavorite(slug, username)
    }

    /// Tags in use, most used first (ties by name)
    pub fn tags(&self) -> ArticleResult<Vec<TagCounter>> {
        let mut counters: Vec<TagCounter> = self
            .query
            .store()
            .tag_counters()?
            .into_iter()
            .filter(|c| c.count > 0)
            .collect();
        counters.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        debug!(count = counters.len(), "listed tags");
        Ok(counters)
    }
}
