//! Article listings and lookups
//!
//! A listing request is validated once and resolved into exactly one
//! [`ArticleFilter`]. Storage indexes only scan forward from the most recent
//! entry, so a page is served by fetching `offset + limit` rows and dropping
//! the first `offset`.
//!
//! - Unfiltered and by-author listings read full rows straight from an
//!   ordered article index.
//! - By-tag and by-favoriter listings read an ordered id list and resolve it
//!   through [`crate::reconstruct::resolve`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Limits;
use crate::error::{ArticleError, ArticleResult};
use crate::models::Article;
use crate::reconstruct::resolve;
use crate::slug::parse_slug;
use crate::storage::{ArticleIndex, ArticleRange, ArticleStore, Direction, IdIndex, IdRange};

/// Listing request as received from a caller
///
/// Empty filter strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    pub offset: i64,
    pub limit: i64,
    pub author: Option<String>,
    pub tag: Option<String>,
    pub favorited: Option<String>,
}

impl ListRequest {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            ..Self::default()
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn favorited(mut self, username: impl Into<String>) -> Self {
        self.favorited = Some(username.into());
        self
    }

    /// Check paging bounds and filters, resolving the one filter in effect
    pub fn validate(&self, limits: &Limits) -> ArticleResult<(Page, ArticleFilter)> {
        if self.offset < 0 {
            return Err(ArticleError::input("offset", "must be non-negative"));
        }
        if self.limit <= 0 {
            return Err(ArticleError::input("limit", "must be positive"));
        }

        let max_depth = limits.max_page_depth;
        let depth = self.offset.checked_add(self.limit);
        if depth.map_or(true, |d| d as u64 > max_depth as u64) {
            return Err(ArticleError::input(
                "offset + limit",
                format!("must be smaller or equal to {}", max_depth),
            ));
        }

        let author = set(&self.author);
        let tag = set(&self.tag);
        let favorited = set(&self.favorited);

        let filters = [author, tag, favorited].iter().flatten().count();
        if filters > 1 {
            return Err(ArticleError::input(
                "author, tag, favorited",
                "only one of these can be specified",
            ));
        }

        let filter = match (author, tag, favorited) {
            (Some(a), _, _) => ArticleFilter::ByAuthor(a.to_string()),
            (None, Some(t), _) => ArticleFilter::ByTag(t.to_string()),
            (None, None, Some(f)) => ArticleFilter::ByFavoriter(f.to_string()),
            (None, None, None) => ArticleFilter::Unfiltered,
        };

        let page = Page {
            offset: self.offset as usize,
            limit: self.limit as usize,
        };
        Ok((page, filter))
    }
}

fn set(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Validated paging window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    /// Rows to fetch from the front of an index
    pub fn depth(&self) -> usize {
        self.offset + self.limit
    }
}

/// The single listing strategy a request resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleFilter {
    Unfiltered,
    ByAuthor(String),
    ByTag(String),
    ByFavoriter(String),
}

/// Serves article listings and slug lookups
pub struct ArticleQueryEngine<S> {
    store: S,
    limits: Limits,
}

impl<S: ArticleStore> ArticleQueryEngine<S> {
    pub fn new(store: S, limits: Limits) -> Self {
        Self { store, limits }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// List articles, most recently created first
    ///
    /// Invalid requests fail before any storage call.
    pub fn list(&self, request: &ListRequest) -> ArticleResult<Vec<Article>> {
        let (page, filter) = request.validate(&self.limits)?;
        debug!(?filter, offset = page.offset, limit = page.limit, "listing articles");

        let articles = match filter {
            ArticleFilter::Unfiltered => self.from_article_index(ArticleIndex::CreatedAt, page)?,
            ArticleFilter::ByAuthor(author) => {
                self.from_article_index(ArticleIndex::Author(author), page)?
            }
            ArticleFilter::ByTag(tag) => self.from_id_index(IdIndex::Tag(tag), page)?,
            ArticleFilter::ByFavoriter(username) => {
                self.from_id_index(IdIndex::FavoritedBy(username), page)?
            }
        };
        Ok(articles)
    }

    /// Look up an article by slug
    pub fn get_by_slug(&self, slug: &str) -> ArticleResult<Article> {
        let id = parse_slug(slug)?;
        self.store.get_article(id)?.ok_or(ArticleError::NotFound)
    }

    fn from_article_index(&self, index: ArticleIndex, page: Page) -> ArticleResult<Vec<Article>> {
        let rows = self.store.query_articles(&ArticleRange {
            index,
            limit: page.depth(),
            direction: Direction::Descending,
        })?;
        Ok(rows.into_iter().skip(page.offset).collect())
    }

    fn from_id_index(&self, index: IdIndex, page: Page) -> ArticleResult<Vec<Article>> {
        let ids = self.store.query_article_ids(&IdRange {
            index,
            limit: page.depth(),
            direction: Direction::Descending,
        })?;
        let window = ids.get(page.offset..).unwrap_or_default();
        Ok(resolve(&self.store, window, page.limit)?)
    }
}
