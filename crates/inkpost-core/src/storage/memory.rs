//! In-memory storage engine
//!
//! Keeps every table in `BTreeMap`s behind one `RwLock`. A transaction holds
//! the write lock for its whole duration, checks every precondition first and
//! only then applies the intents, so it is all-or-nothing.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::models::{Article, ArticleId, FavoriteRecord, Revision, TagCounter, TagLink};
use crate::storage::engine::{
    ArticleIndex, ArticleRange, ArticleStore, Direction, IdIndex, IdRange, Precondition,
    WriteIntent,
};
use crate::storage::error::{StorageError, StorageResult};

/// Default per-call key ceiling for batched reads
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Default)]
struct Tables {
    articles: BTreeMap<ArticleId, Article>,
    tag_links: BTreeMap<(String, ArticleId), TagLink>,
    tag_counters: BTreeMap<String, i64>,
    favorites: BTreeMap<(String, ArticleId), FavoriteRecord>,
}

/// Storage engine living entirely in process memory
pub struct MemoryStore {
    tables: RwLock<Tables>,
    batch_size: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_batch_size(DEFAULT_BATCH_SIZE)
    }

    /// Engine with a custom batched-read ceiling (at least 1)
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            batch_size: batch_size.max(1),
        }
    }

    /// Number of tag link rows for `tag`
    pub fn tag_link_count(&self, tag: &str) -> StorageResult<usize> {
        let tables = self.read()?;
        Ok(tables.tag_links.keys().filter(|(t, _)| t == tag).count())
    }

    /// Number of article rows
    pub fn article_count(&self) -> StorageResult<usize> {
        Ok(self.read()?.articles.len())
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StorageError::LockPoisoned)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleStore for MemoryStore {
    fn get_article(&self, id: ArticleId) -> StorageResult<Option<Article>> {
        Ok(self.read()?.articles.get(&id).cloned())
    }

    fn batch_get_articles(&self, ids: &[ArticleId]) -> StorageResult<Vec<Article>> {
        if ids.len() > self.batch_size {
            return Err(StorageError::BatchTooLarge {
                requested: ids.len(),
                max: self.batch_size,
            });
        }

        let tables = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.articles.get(id).cloned())
            .collect())
    }

    fn max_batch_size(&self) -> usize {
        self.batch_size
    }

    fn query_articles(&self, range: &ArticleRange) -> StorageResult<Vec<Article>> {
        let tables = self.read()?;
        let rows = tables.articles.values().filter(|a| match &range.index {
            ArticleIndex::CreatedAt => true,
            ArticleIndex::Author(author) => &a.author == author,
        });

        let keyed = rows.map(|a| ((a.created_at, a.id), a));
        Ok(ordered(keyed, range.direction, range.limit)
            .into_iter()
            .cloned()
            .collect())
    }

    fn query_article_ids(&self, range: &IdRange) -> StorageResult<Vec<ArticleId>> {
        let tables = self.read()?;
        let keyed: Vec<((DateTime<Utc>, ArticleId), ArticleId)> = match &range.index {
            IdIndex::Tag(tag) => tables
                .tag_links
                .values()
                .filter(|link| &link.tag == tag)
                .map(|link| ((link.created_at, link.article_id), link.article_id))
                .collect(),
            IdIndex::FavoritedBy(username) => tables
                .favorites
                .values()
                .filter(|fav| &fav.username == username)
                .map(|fav| ((fav.article_created_at, fav.article_id), fav.article_id))
                .collect(),
        };

        Ok(ordered(keyed, range.direction, range.limit))
    }

    fn submit_transaction(&self, intents: &[WriteIntent]) -> StorageResult<()> {
        let mut tables = self.write()?;

        for intent in intents {
            if !tables.precondition_holds(intent) {
                return Err(StorageError::ConditionFailed);
            }
        }

        for intent in intents {
            tables.apply(intent);
        }

        Ok(())
    }

    fn tag_counters(&self) -> StorageResult<Vec<TagCounter>> {
        let tables = self.read()?;
        Ok(tables
            .tag_counters
            .iter()
            .map(|(tag, count)| TagCounter {
                tag: tag.clone(),
                count: *count,
            })
            .collect())
    }
}

impl Tables {
    fn precondition_holds(&self, intent: &WriteIntent) -> bool {
        match intent {
            WriteIntent::PutArticle {
                article,
                precondition,
            } => check_article(*precondition, self.revision(article.id)),
            WriteIntent::DeleteArticle { id, precondition } => {
                check_article(*precondition, self.revision(*id))
            }
            WriteIntent::PutFavorite {
                record,
                precondition,
            } => check(
                *precondition,
                self.favorites
                    .contains_key(&(record.username.clone(), record.article_id)),
            ),
            WriteIntent::DeleteFavorite {
                username,
                article_id,
                precondition,
            } => check(
                *precondition,
                self.favorites.contains_key(&(username.clone(), *article_id)),
            ),
            WriteIntent::IncrementFavoritesCount { article_id, .. } => {
                self.articles.contains_key(article_id)
            }
            WriteIntent::PutTagLink(_)
            | WriteIntent::DeleteTagLink { .. }
            | WriteIntent::IncrementTagCount { .. } => true,
        }
    }

    fn revision(&self, id: ArticleId) -> Option<Revision> {
        self.articles.get(&id).map(Article::revision)
    }

    fn apply(&mut self, intent: &WriteIntent) {
        match intent {
            WriteIntent::PutArticle { article, .. } => {
                self.articles.insert(article.id, article.clone());
            }
            WriteIntent::DeleteArticle { id, .. } => {
                self.articles.remove(id);
            }
            WriteIntent::PutTagLink(link) => {
                self.tag_links
                    .insert((link.tag.clone(), link.article_id), link.clone());
            }
            WriteIntent::DeleteTagLink { tag, article_id } => {
                self.tag_links.remove(&(tag.clone(), *article_id));
            }
            WriteIntent::IncrementTagCount { tag, delta } => {
                *self.tag_counters.entry(tag.clone()).or_insert(0) += delta;
            }
            WriteIntent::PutFavorite { record, .. } => {
                self.favorites.insert(
                    (record.username.clone(), record.article_id),
                    record.clone(),
                );
            }
            WriteIntent::DeleteFavorite {
                username,
                article_id,
                ..
            } => {
                self.favorites.remove(&(username.clone(), *article_id));
            }
            WriteIntent::IncrementFavoritesCount { article_id, delta } => {
                if let Some(article) = self.articles.get_mut(article_id) {
                    article.favorites_count += delta;
                }
            }
        }
    }
}

fn check(precondition: Precondition, exists: bool) -> bool {
    match precondition {
        Precondition::None => true,
        Precondition::Absent => !exists,
        Precondition::Present => exists,
        // Only article rows carry a revision
        Precondition::Matches(_) => false,
    }
}

fn check_article(precondition: Precondition, current: Option<Revision>) -> bool {
    match precondition {
        Precondition::Matches(expected) => current == Some(expected),
        other => check(other, current.is_some()),
    }
}

/// Sort by key in the requested direction and keep the first `limit` values
fn ordered<K: Ord, V>(
    rows: impl IntoIterator<Item = (K, V)>,
    direction: Direction,
    limit: usize,
) -> Vec<V> {
    let mut rows: Vec<(K, V)> = rows.into_iter().collect();
    match direction {
        Direction::Ascending => rows.sort_by(|a, b| a.0.cmp(&b.0)),
        Direction::Descending => rows.sort_by(|a, b| b.0.cmp(&a.0)),
    }
    rows.into_iter().take(limit).map(|(_, v)| v).collect()
}
