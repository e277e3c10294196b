//! Storage engine boundary
//!
//! The core never talks to a database directly. It needs four access
//! patterns from the engine: point reads, ordered index range queries,
//! batched point reads with an engine-defined key ceiling, and atomic
//! multi-item conditional transactions.

use crate::models::{Article, ArticleId, FavoriteRecord, Revision, TagCounter, TagLink};
use crate::storage::error::StorageResult;

/// Scan direction over an ordered index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Oldest first
    Ascending,
    /// Most recent first
    #[default]
    Descending,
}

/// Indexes that hold full article rows, ordered by creation time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleIndex {
    /// Every article
    CreatedAt,
    /// Articles written by one author
    Author(String),
}

/// Indexes that hold article ids only, ordered by article creation time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdIndex {
    /// Tag links for one tag
    Tag(String),
    /// Favorites of one user
    FavoritedBy(String),
}

/// Range query over an [`ArticleIndex`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRange {
    pub index: ArticleIndex,
    pub limit: usize,
    pub direction: Direction,
}

/// Range query over an [`IdIndex`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRange {
    pub index: IdIndex,
    pub limit: usize,
    pub direction: Direction,
}

/// Existence requirement attached to a write intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precondition {
    /// Write unconditionally
    #[default]
    None,
    /// The item must not exist yet
    Absent,
    /// The item must already exist
    Present,
    /// The article must exist at exactly this revision
    Matches(Revision),
}

/// One write inside a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum WriteIntent {
    /// Insert or overwrite an article row
    PutArticle {
        article: Article,
        precondition: Precondition,
    },
    /// Remove an article row
    DeleteArticle {
        id: ArticleId,
        precondition: Precondition,
    },
    /// Insert a tag link row
    PutTagLink(TagLink),
    /// Remove a tag link row (no-op when missing)
    DeleteTagLink { tag: String, article_id: ArticleId },
    /// Atomically add `delta` to a tag counter, creating it at zero
    IncrementTagCount { tag: String, delta: i64 },
    /// Insert a favorite record
    PutFavorite {
        record: FavoriteRecord,
        precondition: Precondition,
    },
    /// Remove a favorite record
    DeleteFavorite {
        username: String,
        article_id: ArticleId,
        precondition: Precondition,
    },
    /// Atomically add `delta` to an article's favorites counter.
    /// Fails the transaction when the article does not exist.
    IncrementFavoritesCount { article_id: ArticleId, delta: i64 },
}

impl WriteIntent {
    /// Short name of the intent for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            WriteIntent::PutArticle { .. } => "put_article",
            WriteIntent::DeleteArticle { .. } => "delete_article",
            WriteIntent::PutTagLink(_) => "put_tag_link",
            WriteIntent::DeleteTagLink { .. } => "delete_tag_link",
            WriteIntent::IncrementTagCount { .. } => "increment_tag_count",
            WriteIntent::PutFavorite { .. } => "put_favorite",
            WriteIntent::DeleteFavorite { .. } => "delete_favorite",
            WriteIntent::IncrementFavoritesCount { .. } => "increment_favorites_count",
        }
    }

    /// Article the intent touches, if any
    pub fn article_id(&self) -> Option<ArticleId> {
        match self {
            WriteIntent::PutArticle { article, .. } => Some(article.id),
            WriteIntent::DeleteArticle { id, .. } => Some(*id),
            WriteIntent::PutTagLink(link) => Some(link.article_id),
            WriteIntent::DeleteTagLink { article_id, .. }
            | WriteIntent::DeleteFavorite { article_id, .. }
            | WriteIntent::IncrementFavoritesCount { article_id, .. } => Some(*article_id),
            WriteIntent::PutFavorite { record, .. } => Some(record.article_id),
            WriteIntent::IncrementTagCount { .. } => None,
        }
    }
}

/// Storage engine consumed by the writer and the query engine
///
/// Ordered indexes sort by (creation time, id); with [`Direction::Descending`]
/// the most recently created article comes first and equal timestamps put the
/// larger id first.
pub trait ArticleStore: Send + Sync {
    /// Point read by identifier
    fn get_article(&self, id: ArticleId) -> StorageResult<Option<Article>>;

    /// Batched point read
    ///
    /// Results come back in no particular order and missing ids are omitted.
    /// Fails with `BatchTooLarge` if `ids` exceeds [`max_batch_size`].
    ///
    /// [`max_batch_size`]: ArticleStore::max_batch_size
    fn batch_get_articles(&self, ids: &[ArticleId]) -> StorageResult<Vec<Article>>;

    /// Maximum number of keys accepted by one batched read
    fn max_batch_size(&self) -> usize;

    /// Range query returning full article rows
    fn query_articles(&self, range: &ArticleRange) -> StorageResult<Vec<Article>>;

    /// Range query returning ordered article ids
    fn query_article_ids(&self, range: &IdRange) -> StorageResult<Vec<ArticleId>>;

    /// Apply every intent or none of them
    ///
    /// Preconditions are checked against the state before the transaction.
    /// Any violated precondition fails the whole transaction with
    /// `StorageError::ConditionFailed`.
    fn submit_transaction(&self, intents: &[WriteIntent]) -> StorageResult<()>;

    /// All tag counters
    fn tag_counters(&self) -> StorageResult<Vec<TagCounter>>;
}

impl<S: ArticleStore + ?Sized> ArticleStore for std::sync::Arc<S> {
    fn get_article(&self, id: ArticleId) -> StorageResult<Option<Article>> {
        (**self).get_article(id)
    }

    fn batch_get_articles(&self, ids: &[ArticleId]) -> StorageResult<Vec<Article>> {
        (**self).batch_get_articles(ids)
    }

    fn max_batch_size(&self) -> usize {
        (**self).max_batch_size()
    }

    fn query_articles(&self, range: &ArticleRange) -> StorageResult<Vec<Article>> {
        (**self).query_articles(range)
    }

    fn query_article_ids(&self, range: &IdRange) -> StorageResult<Vec<ArticleId>> {
        (**self).query_article_ids(range)
    }

    fn submit_transaction(&self, intents: &[WriteIntent]) -> StorageResult<()> {
        (**self).submit_transaction(intents)
    }

    fn tag_counters(&self) -> StorageResult<Vec<TagCounter>> {
        (**self).tag_counters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewArticle;
    use chrono::Utc;

    #[test]
    fn test_intent_log_fields_leave_out_content() {
        let mut article = Article::draft(
            NewArticle::new("jake", "Secret draft").with_body("do not log me"),
            Utc::now(),
        );
        article.assign_id(ArticleId::new(0x2a).unwrap());

        let put = WriteIntent::PutArticle {
            precondition: Precondition::Matches(article.revision()),
            article,
        };
        assert_eq!(put.kind(), "put_article");
        assert_eq!(put.article_id(), ArticleId::new(0x2a));

        let count = WriteIntent::IncrementTagCount {
            tag: "t".to_string(),
            delta: 1,
        };
        assert_eq!(count.kind(), "increment_tag_count");
        assert_eq!(count.article_id(), None);
    }
}
