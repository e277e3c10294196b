//! Article writes
//!
//! Every write is one storage transaction that keeps an article, its tag
//! links and the per-tag counters consistent:
//!
//! - **create**: article row guarded by an absent-precondition, plus one tag
//!   link and one +1 counter increment per distinct tag. A failed
//!   precondition is an id collision: reseed and try a fresh id.
//! - **update**: overwrite guarded by a present-precondition, plus the tag
//!   delta (links removed/added, counters -1/+1).
//! - **delete**: row removal guarded by a present-precondition, plus link
//!   removal and -1 for every tag.
//!
//! Favorites follow the same pattern with the article's favorites counter.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::Limits;
use crate::error::{ArticleError, ArticleResult};
use crate::id::IdAllocator;
use crate::models::{Article, ArticlePatch, FavoriteRecord, NewArticle};
use crate::slug::parse_slug;
use crate::storage::{ArticleStore, Precondition, StorageError, WriteIntent};

/// Commits articles to a storage engine
///
/// One writer per logical writer: the writer owns its [`IdAllocator`], so
/// concurrent writers never share a randomness stream.
pub struct ArticleWriter<S> {
    store: S,
    allocator: IdAllocator,
    limits: Limits,
}

impl<S: ArticleStore> ArticleWriter<S> {
    pub fn new(store: S, allocator: IdAllocator, limits: Limits) -> Self {
        Self {
            store,
            allocator,
            limits,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn allocator(&self) -> &IdAllocator {
        &self.allocator
    }

    /// Allocator for another writer, derived from this one's seed stream
    pub fn fork_allocator(&mut self) -> IdAllocator {
        self.allocator.fork()
    }

    /// Create an article, allocating its id and slug
    ///
    /// Fails with an input error before any write if there are too many tags
    /// or the title is blank. Id collisions are retried up to
    /// `limits.max_attempts` times; any other storage failure is returned
    /// immediately.
    pub fn create(&mut self, input: NewArticle) -> ArticleResult<Article> {
        self.check_tags(&input.tags)?;
        if input.title.trim().is_empty() {
            return Err(ArticleError::input("title", "can't be blank"));
        }
        if input.author.is_empty() {
            return Err(ArticleError::input("author", "can't be blank"));
        }

        let mut article = Article::draft(input, Utc::now());
        let attempts = self.limits.max_attempts;

        for attempt in 1..=attempts {
            article.assign_id(self.allocator.next_id());
            let intents = creation_intents(&article);

            match self.store.submit_transaction(&intents) {
                Ok(()) => {
                    info!(id = %article.id, slug = %article.slug, attempt, "created article");
                    return Ok(article);
                }
                Err(StorageError::ConditionFailed) => {
                    warn!(id = %article.id, attempt, "article id collision, reseeding");
                    self.allocator.reseed();
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(attempts, "no free article id found");
        Err(ArticleError::Conflict { attempts })
    }

    /// Merge `patch` over `old` and write the result
    ///
    /// Tag links and counters are moved to match the new tag set in the same
    /// transaction. The write only lands if the stored row is still at
    /// `old`'s revision: fails with `Modified` if it moved on and `NotFound`
    /// if it vanished.
    pub fn update(&self, old: &Article, patch: ArticlePatch) -> ArticleResult<Article> {
        if let Some(tags) = &patch.tags {
            self.check_tags(tags)?;
        }

        let updated = old.merge(patch, Utc::now());

        let old_tags = old.distinct_tags();
        let new_tags = updated.distinct_tags();

        let mut intents = vec![WriteIntent::PutArticle {
            article: updated.clone(),
            precondition: Precondition::Matches(old.revision()),
        }];
        for tag in old_tags.iter().filter(|t| !new_tags.contains(*t)) {
            intents.push(WriteIntent::DeleteTagLink {
                tag: tag.to_string(),
                article_id: old.id,
            });
            intents.push(WriteIntent::IncrementTagCount {
                tag: tag.to_string(),
                delta: -1,
            });
        }
        for tag in new_tags.iter().filter(|t| !old_tags.contains(*t)) {
            intents.push(WriteIntent::PutTagLink(updated.tag_link(tag)));
            intents.push(WriteIntent::IncrementTagCount {
                tag: tag.to_string(),
                delta: 1,
            });
        }

        match self.store.submit_transaction(&intents) {
            Ok(()) => {
                debug!(id = %updated.id, slug = %updated.slug, "updated article");
                Ok(updated)
            }
            Err(StorageError::ConditionFailed) => {
                self.reload(old)?;
                debug!(id = %old.id, "article changed since it was read");
                Err(ArticleError::Modified)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the article behind `slug` on behalf of `requester`
    ///
    /// Only the author may delete. Tag links and counters are removed with
    /// the article; favorites of the article are left for the listing path to
    /// skip. A concurrent change to the article restarts the delete from a
    /// fresh read, up to `limits.max_attempts` times.
    pub fn delete(&self, slug: &str, requester: &str) -> ArticleResult<()> {
        let attempts = self.limits.max_attempts.max(1);

        for attempt in 1..=attempts {
            let article = self.load(slug)?;
            if article.author != requester {
                return Err(ArticleError::Forbidden {
                    requester: requester.to_string(),
                });
            }

            let mut intents = vec![WriteIntent::DeleteArticle {
                id: article.id,
                precondition: Precondition::Matches(article.revision()),
            }];
            for tag in article.distinct_tags() {
                intents.push(WriteIntent::DeleteTagLink {
                    tag: tag.to_string(),
                    article_id: article.id,
                });
                intents.push(WriteIntent::IncrementTagCount {
                    tag: tag.to_string(),
                    delta: -1,
                });
            }

            match self.store.submit_transaction(&intents) {
                Ok(()) => {
                    info!(id = %article.id, slug, "deleted article");
                    return Ok(());
                }
                Err(StorageError::ConditionFailed) => {
                    debug!(id = %article.id, attempt, "article changed before delete, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        // The next read reports NotFound if the article is gone
        self.load(slug)?;
        warn!(slug, attempts, "article kept changing during delete");
        Err(ArticleError::Modified)
    }

    /// Mark the article behind `slug` as favorited by `username`
    ///
    /// Favoriting twice is a no-op.
    pub fn favorite(&self, slug: &str, username: &str) -> ArticleResult<Article> {
        let mut article = self.load(slug)?;
        let now = Utc::now();

        let intents = [
            WriteIntent::PutFavorite {
                record: FavoriteRecord {
                    username: username.to_string(),
                    article_id: article.id,
                    favorited_at: now,
                    article_created_at: article.created_at,
                },
                precondition: Precondition::Absent,
            },
            WriteIntent::IncrementFavoritesCount {
                article_id: article.id,
                delta: 1,
            },
        ];

        match self.store.submit_transaction(&intents) {
            Ok(()) => {
                article.favorites_count += 1;
                debug!(id = %article.id, username, "favorited article");
                Ok(article)
            }
            Err(StorageError::ConditionFailed) => self.reload(&article),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove `username`'s favorite from the article behind `slug`
    ///
    /// Unfavoriting an article that is not favorited is a no-op.
    pub fn unfavorite(&self, slug: &str, username: &str) -> ArticleResult<Article> {
        let mut article = self.load(slug)?;

        let intents = [
            WriteIntent::DeleteFavorite {
                username: username.to_string(),
                article_id: article.id,
                precondition: Precondition::Present,
            },
            WriteIntent::IncrementFavoritesCount {
                article_id: article.id,
                delta: -1,
            },
        ];

        match self.store.submit_transaction(&intents) {
            Ok(()) => {
                article.favorites_count -= 1;
                debug!(id = %article.id, username, "unfavorited article");
                Ok(article)
            }
            Err(StorageError::ConditionFailed) => self.reload(&article),
            Err(e) => Err(e.into()),
        }
    }

    fn check_tags(&self, tags: &[String]) -> ArticleResult<()> {
        if tags.len() > self.limits.max_tags {
            return Err(ArticleError::input(
                "tagList",
                format!(
                    "cannot add more than {} tags per article",
                    self.limits.max_tags
                ),
            ));
        }
        Ok(())
    }

    fn load(&self, slug: &str) -> ArticleResult<Article> {
        let id = parse_slug(slug)?;
        self.store.get_article(id)?.ok_or(ArticleError::NotFound)
    }

    /// Current state after a no-op favorite change, or `NotFound` if the
    /// article was deleted in between
    fn reload(&self, article: &Article) -> ArticleResult<Article> {
        self.store
            .get_article(article.id)?
            .ok_or(ArticleError::NotFound)
    }
}

/// Article row plus a link and +1 for every distinct tag
fn creation_intents(article: &Article) -> Vec<WriteIntent> {
    let tags = article.distinct_tags();
    let mut intents = Vec::with_capacity(1 + 2 * tags.len());
    intents.push(WriteIntent::PutArticle {
        article: article.clone(),
        precondition: Precondition::Absent,
    });
    for tag in tags {
        intents.push(WriteIntent::PutTagLink(article.tag_link(tag)));
        intents.push(WriteIntent::IncrementTagCount {
            tag: tag.to_string(),
            delta: 1,
        });
    }
    intents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, SqliteStore};
    use crate::testing::{Fault, RecordingStore};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn writer<S: ArticleStore>(store: S) -> ArticleWriter<S> {
        ArticleWriter::new(store, IdAllocator::new(), Limits::default())
    }

    fn counter(store: &impl ArticleStore, tag: &str) -> i64 {
        store
            .tag_counters()
            .unwrap()
            .into_iter()
            .find(|c| c.tag == tag)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    fn dragon() -> NewArticle {
        NewArticle::new("jake", "How to train your dragon")
            .with_description("Ever wonder how?")
            .with_body("You have to believe")
            .with_tags(["dragons", "training"])
    }

    #[test]
    fn test_create_example_article() {
        let mut w = writer(MemoryStore::new());
        let article = w.create(dragon()).unwrap();

        let prefix = "how-to-train-your-dragon-";
        assert!(article.slug.starts_with(prefix));
        let suffix = &article.slug[prefix.len()..];
        assert!(!suffix.is_empty());
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));

        assert_eq!(article.favorites_count, 0);
        assert_eq!(counter(w.store(), "dragons"), 1);
        assert_eq!(counter(w.store(), "training"), 1);
        assert_eq!(w.store().get_article(article.id).unwrap(), Some(article));
    }

    #[test]
    fn test_slug_round_trips_to_id() {
        let mut w = writer(MemoryStore::new());
        for i in 0..20 {
            let article = w
                .create(NewArticle::new("jake", format!("Post number {}", i)))
                .unwrap();
            assert_eq!(parse_slug(&article.slug).unwrap(), article.id);
        }
    }

    #[test]
    fn test_six_tags_rejected_without_write() {
        let store = RecordingStore::new(MemoryStore::new());
        let mut w = writer(store);

        let input = NewArticle::new("jake", "Too many")
            .with_tags(["a", "b", "c", "d", "e", "f"]);
        let err = w.create(input).unwrap_err();

        assert!(err.is_input());
        assert_eq!(w.store().calls().total(), 0);
        assert_eq!(w.store().inner().article_count().unwrap(), 0);
        assert!(w.store().inner().tag_counters().unwrap().is_empty());
        assert_eq!(w.store().inner().tag_link_count("a").unwrap(), 0);
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut w = writer(MemoryStore::new());
        let err = w.create(NewArticle::new("jake", "   ")).unwrap_err();
        assert!(matches!(err, ArticleError::Input { ref field, .. } if field == "title"));
    }

    #[test]
    fn test_duplicate_tags_kept_on_article_counted_once() {
        let mut w = writer(MemoryStore::new());
        let article = w
            .create(NewArticle::new("jake", "Dupes").with_tags(["x", "y", "x"]))
            .unwrap();

        assert_eq!(article.tags, vec!["x", "y", "x"]);
        assert_eq!(counter(w.store(), "x"), 1);
        assert_eq!(w.store().tag_link_count("x").unwrap(), 1);
    }

    #[test]
    fn test_counter_equals_number_of_tagged_articles() {
        let mut w = writer(MemoryStore::new());
        for i in 0..7 {
            w.create(NewArticle::new("jake", format!("Tagged {}", i)).with_tags(["x"]))
                .unwrap();
        }
        assert_eq!(counter(w.store(), "x"), 7);
        assert_eq!(w.store().tag_link_count("x").unwrap(), 7);
    }

    #[test]
    fn test_collision_reseeds_and_retries() {
        let store = Arc::new(MemoryStore::new());

        let mut first = ArticleWriter::new(
            Arc::clone(&store),
            IdAllocator::with_seed(42),
            Limits::default(),
        );
        let taken = first.create(NewArticle::new("jake", "First")).unwrap();

        // Same seed draws the same first id
        let mut second = ArticleWriter::new(
            Arc::clone(&store),
            IdAllocator::with_seed(42),
            Limits::default(),
        );
        let article = second
            .create(NewArticle::new("jane", "Second").with_tags(["t"]))
            .unwrap();

        assert_ne!(article.id, taken.id);
        assert_eq!(second.allocator().reseed_count(), 1);
        assert_eq!(store.article_count().unwrap(), 2);
        assert_eq!(store.get_article(taken.id).unwrap().unwrap().author, "jake");
        assert_eq!(counter(&store, "t"), 1);
    }

    #[test]
    fn test_exhausted_attempts_is_conflict() {
        let store = RecordingStore::new(MemoryStore::new());
        store.fail_with(Fault::ConditionFailed);
        let mut w = writer(store);

        let err = w
            .create(NewArticle::new("jake", "Never").with_tags(["t"]))
            .unwrap_err();

        assert!(matches!(err, ArticleError::Conflict { attempts: 5 }));
        assert!(err.is_retryable());
        assert_eq!(w.store().calls().transactions, 5);
        assert_eq!(w.allocator().reseed_count(), 5);
        assert!(w.store().inner().tag_counters().unwrap().is_empty());
    }

    #[test]
    fn test_transient_collisions_recover() {
        let store = RecordingStore::new(MemoryStore::new());
        store.collide_next(2);
        let mut w = writer(store);

        let article = w.create(NewArticle::new("jake", "Third time")).unwrap();
        assert_eq!(w.store().calls().transactions, 3);
        assert_eq!(w.allocator().reseed_count(), 2);
        assert!(w.store().inner().get_article(article.id).unwrap().is_some());
    }

    #[test]
    fn test_timeout_not_retried() {
        let store = RecordingStore::new(MemoryStore::new());
        store.fail_with(Fault::Timeout);
        let mut w = writer(store);

        let err = w.create(NewArticle::new("jake", "Slow")).unwrap_err();
        assert!(matches!(err, ArticleError::Storage(StorageError::Timeout)));
        assert_eq!(w.store().calls().transactions, 1);
        assert_eq!(w.allocator().reseed_count(), 0);
    }

    #[test]
    fn test_concurrent_creates_get_distinct_ids() {
        let store = Arc::new(MemoryStore::new());
        let mut root = IdAllocator::new();

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let mut w = ArticleWriter::new(Arc::clone(&store), root.fork(), Limits::default());
                thread::spawn(move || {
                    (0..25)
                        .map(|i| {
                            w.create(
                                NewArticle::new("jake", format!("w{} post {}", n, i))
                                    .with_tags(["x"]),
                            )
                            .unwrap()
                            .id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: Vec<_> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let distinct: HashSet<_> = ids.iter().copied().collect();

        assert_eq!(ids.len(), 200);
        assert_eq!(distinct.len(), 200);
        assert_eq!(counter(&store, "x"), 200);
    }

    #[test]
    fn test_concurrent_creates_on_sqlite() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = crate::config::Config {
            data_dir: dir.path().to_path_buf(),
            ..crate::config::Config::default()
        };
        let store = Arc::new(SqliteStore::open(&config).unwrap());
        let mut root = IdAllocator::new();

        let handles: Vec<_> = (0..4)
            .map(|n| {
                let mut w = ArticleWriter::new(Arc::clone(&store), root.fork(), config.limits());
                thread::spawn(move || {
                    for i in 0..10 {
                        w.create(
                            NewArticle::new("jake", format!("w{} post {}", n, i))
                                .with_tags(["x", "y"]),
                        )
                        .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.article_count().unwrap(), 40);
        assert_eq!(counter(&store, "x"), 40);
        assert_eq!(store.tag_link_count("y").unwrap(), 40);
    }

    #[test]
    fn test_update_merges_and_moves_tags() {
        let mut w = writer(MemoryStore::new());
        let old = w
            .create(NewArticle::new("jake", "Original").with_tags(["keep", "drop"]))
            .unwrap();

        let updated = w
            .update(
                &old,
                ArticlePatch {
                    body: Some("fresh body".to_string()),
                    tags: Some(vec!["keep".to_string(), "add".to_string()]),
                    ..ArticlePatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.id, old.id);
        assert_eq!(updated.slug, old.slug);
        assert_eq!(updated.title, "Original");
        assert_eq!(updated.body, "fresh body");
        assert_eq!(updated.created_at, old.created_at);
        assert!(updated.updated_at >= old.updated_at);

        assert_eq!(counter(w.store(), "keep"), 1);
        assert_eq!(counter(w.store(), "drop"), 0);
        assert_eq!(counter(w.store(), "add"), 1);
        assert_eq!(w.store().tag_link_count("drop").unwrap(), 0);
        assert_eq!(w.store().get_article(old.id).unwrap(), Some(updated));
    }

    fn retag(tags: &[&str]) -> ArticlePatch {
        ArticlePatch {
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            ..ArticlePatch::default()
        }
    }

    /// Two updates computed from the same read: only the first may land
    fn assert_stale_update_rejected<S: ArticleStore>(
        mut w: ArticleWriter<S>,
        links: impl Fn(&S, &str) -> usize,
    ) {
        let old = w
            .create(NewArticle::new("jake", "Original").with_tags(["keep", "drop"]))
            .unwrap();

        w.update(&old, retag(&["keep", "add"])).unwrap();
        let err = w.update(&old, retag(&["keep", "add"])).unwrap_err();
        assert!(matches!(err, ArticleError::Modified));
        assert!(err.is_retryable());

        for tag in ["keep", "drop", "add"] {
            assert_eq!(
                counter(w.store(), tag),
                links(w.store(), tag) as i64,
                "counter for {}",
                tag
            );
        }
        assert_eq!(counter(w.store(), "drop"), 0);
        assert_eq!(counter(w.store(), "add"), 1);
    }

    #[test]
    fn test_stale_update_rejected_in_memory() {
        assert_stale_update_rejected(writer(MemoryStore::new()), |s: &MemoryStore, t: &str| {
            s.tag_link_count(t).unwrap()
        });
    }

    #[test]
    fn test_stale_update_rejected_on_sqlite() {
        let w = writer(SqliteStore::open_in_memory().unwrap());
        assert_stale_update_rejected(w, |s: &SqliteStore, t: &str| {
            s.tag_link_count(t).unwrap()
        });
    }

    #[test]
    fn test_update_does_not_lose_concurrent_favorite() {
        let mut w = writer(SqliteStore::open_in_memory().unwrap());
        let old = w.create(NewArticle::new("jake", "Loved")).unwrap();
        w.favorite(&old.slug, "jane").unwrap();

        let err = w.update(&old, retag(&["late"])).unwrap_err();
        assert!(matches!(err, ArticleError::Modified));

        let stored = w.store().get_article(old.id).unwrap().unwrap();
        assert_eq!(stored.favorites_count, 1);
        assert!(stored.tags.is_empty());
        assert_eq!(counter(w.store(), "late"), 0);
    }

    #[test]
    fn test_delete_retries_after_concurrent_change() {
        let mut w = writer(RecordingStore::new(MemoryStore::new()));
        let article = w
            .create(NewArticle::new("jake", "Moving target").with_tags(["x"]))
            .unwrap();

        w.store().collide_next(1);
        w.delete(&article.slug, "jake").unwrap();

        // create + failed delete + retried delete
        assert_eq!(w.store().calls().transactions, 3);
        assert!(w.store().inner().get_article(article.id).unwrap().is_none());
        assert_eq!(counter(w.store().inner(), "x"), 0);
        assert_eq!(w.store().inner().tag_link_count("x").unwrap(), 0);
    }

    #[test]
    fn test_delete_gives_up_when_article_keeps_changing() {
        let mut w = writer(RecordingStore::new(MemoryStore::new()));
        let article = w.create(NewArticle::new("jake", "Busy")).unwrap();

        w.store().fail_with(Fault::ConditionFailed);
        let err = w.delete(&article.slug, "jake").unwrap_err();

        assert!(matches!(err, ArticleError::Modified));
        assert_eq!(w.store().calls().transactions, 1 + 5);
        assert!(w.store().inner().get_article(article.id).unwrap().is_some());
    }

    #[test]
    fn test_delete_and_unfavorite_on_sqlite() {
        let mut w = writer(SqliteStore::open_in_memory().unwrap());
        let article = w
            .create(NewArticle::new("jake", "Doomed").with_tags(["x", "y"]))
            .unwrap();
        w.create(NewArticle::new("jake", "Survivor").with_tags(["x"]))
            .unwrap();

        w.favorite(&article.slug, "jane").unwrap();
        let undone = w.unfavorite(&article.slug, "jane").unwrap();
        assert_eq!(undone.favorites_count, 0);
        let stored = w.store().get_article(article.id).unwrap().unwrap();
        assert_eq!(stored.favorites_count, 0);

        w.delete(&article.slug, "jake").unwrap();
        assert!(w.store().get_article(article.id).unwrap().is_none());
        assert_eq!(counter(w.store(), "x"), 1);
        assert_eq!(counter(w.store(), "y"), 0);
        assert_eq!(w.store().tag_link_count("x").unwrap(), 1);
        assert_eq!(w.store().tag_link_count("y").unwrap(), 0);

        let err = w.delete(&article.slug, "jake").unwrap_err();
        assert!(matches!(err, ArticleError::NotFound));
    }

    #[test]
    fn test_update_with_too_many_tags_rejected() {
        let mut w = writer(MemoryStore::new());
        let old = w.create(NewArticle::new("jake", "Original")).unwrap();

        let err = w
            .update(
                &old,
                ArticlePatch {
                    tags: Some((0..6).map(|i| i.to_string()).collect()),
                    ..ArticlePatch::default()
                },
            )
            .unwrap_err();
        assert!(err.is_input());
    }

    #[test]
    fn test_update_of_deleted_article_is_not_found() {
        let mut w = writer(MemoryStore::new());
        let old = w.create(NewArticle::new("jake", "Gone soon")).unwrap();
        w.delete(&old.slug, "jake").unwrap();

        let err = w.update(&old, ArticlePatch::default()).unwrap_err();
        assert!(matches!(err, ArticleError::NotFound));
    }

    #[test]
    fn test_delete_cleans_tag_index() {
        let mut w = writer(MemoryStore::new());
        let article = w
            .create(NewArticle::new("jake", "Doomed").with_tags(["x", "x", "y"]))
            .unwrap();
        w.create(NewArticle::new("jake", "Survivor").with_tags(["x"]))
            .unwrap();

        w.delete(&article.slug, "jake").unwrap();

        assert!(w.store().get_article(article.id).unwrap().is_none());
        assert_eq!(counter(w.store(), "x"), 1);
        assert_eq!(counter(w.store(), "y"), 0);
        assert_eq!(w.store().tag_link_count("x").unwrap(), 1);
    }

    #[test]
    fn test_delete_checks_author_and_existence() {
        let mut w = writer(MemoryStore::new());
        let article = w.create(NewArticle::new("jake", "Mine")).unwrap();

        let err = w.delete(&article.slug, "jane").unwrap_err();
        assert!(matches!(err, ArticleError::Forbidden { .. }));

        w.delete(&article.slug, "jake").unwrap();
        let err = w.delete(&article.slug, "jake").unwrap_err();
        assert!(matches!(err, ArticleError::NotFound));

        let err = w.delete("no-dash-here-zz", "jake").unwrap_err();
        assert!(matches!(err, ArticleError::InvalidSlug(_)));
    }

    #[test]
    fn test_favorite_is_idempotent() {
        let mut w = writer(MemoryStore::new());
        let article = w.create(NewArticle::new("jake", "Loved")).unwrap();

        let once = w.favorite(&article.slug, "jane").unwrap();
        let twice = w.favorite(&article.slug, "jane").unwrap();
        assert_eq!(once.favorites_count, 1);
        assert_eq!(twice.favorites_count, 1);

        let undone = w.unfavorite(&article.slug, "jane").unwrap();
        let again = w.unfavorite(&article.slug, "jane").unwrap();
        assert_eq!(undone.favorites_count, 0);
        assert_eq!(again.favorites_count, 0);
    }
}
