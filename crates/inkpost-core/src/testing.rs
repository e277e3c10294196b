//! Test doubles for the storage boundary

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::{Article, ArticleId, TagCounter};
use crate::storage::{
    ArticleRange, ArticleStore, IdRange, MemoryStore, StorageError, StorageResult, WriteIntent,
};

/// Failure injected into every `submit_transaction`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every transaction looks like an identifier collision
    ConditionFailed,
    /// Every transaction times out
    Timeout,
}

/// Snapshot of storage calls made through a [`RecordingStore`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub gets: usize,
    pub batch_gets: usize,
    pub article_queries: usize,
    pub id_queries: usize,
    pub transactions: usize,
    pub counter_reads: usize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.gets
            + self.batch_gets
            + self.article_queries
            + self.id_queries
            + self.transactions
            + self.counter_reads
    }
}

/// Wraps a [`MemoryStore`], counting calls and optionally failing writes
pub struct RecordingStore {
    inner: MemoryStore,
    fault: Mutex<Option<Fault>>,
    gets: AtomicUsize,
    batch_gets: AtomicUsize,
    article_queries: AtomicUsize,
    id_queries: AtomicUsize,
    transactions: AtomicUsize,
    counter_reads: AtomicUsize,
    /// Fail only the first N transactions with `ConditionFailed`
    collisions_left: AtomicUsize,
}

impl RecordingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fault: Mutex::new(None),
            gets: AtomicUsize::new(0),
            batch_gets: AtomicUsize::new(0),
            article_queries: AtomicUsize::new(0),
            id_queries: AtomicUsize::new(0),
            transactions: AtomicUsize::new(0),
            counter_reads: AtomicUsize::new(0),
            collisions_left: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn fail_with(&self, fault: Fault) {
        *self.fault.lock().unwrap() = Some(fault);
    }

    /// Make the next `n` transactions fail as collisions
    pub fn collide_next(&self, n: usize) {
        self.collisions_left.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Calls {
        Calls {
            gets: self.gets.load(Ordering::SeqCst),
            batch_gets: self.batch_gets.load(Ordering::SeqCst),
            article_queries: self.article_queries.load(Ordering::SeqCst),
            id_queries: self.id_queries.load(Ordering::SeqCst),
            transactions: self.transactions.load(Ordering::SeqCst),
            counter_reads: self.counter_reads.load(Ordering::SeqCst),
        }
    }
}

impl ArticleStore for RecordingStore {
    fn get_article(&self, id: ArticleId) -> StorageResult<Option<Article>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_article(id)
    }

    fn batch_get_articles(&self, ids: &[ArticleId]) -> StorageResult<Vec<Article>> {
        self.batch_gets.fetch_add(1, Ordering::SeqCst);
        self.inner.batch_get_articles(ids)
    }

    fn max_batch_size(&self) -> usize {
        self.inner.max_batch_size()
    }

    fn query_articles(&self, range: &ArticleRange) -> StorageResult<Vec<Article>> {
        self.article_queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query_articles(range)
    }

    fn query_article_ids(&self, range: &IdRange) -> StorageResult<Vec<ArticleId>> {
        self.id_queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query_article_ids(range)
    }

    fn submit_transaction(&self, intents: &[WriteIntent]) -> StorageResult<()> {
        self.transactions.fetch_add(1, Ordering::SeqCst);

        let pending = self
            .collisions_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if pending.is_ok() {
            return Err(StorageError::ConditionFailed);
        }

        match *self.fault.lock().unwrap() {
            Some(Fault::ConditionFailed) => Err(StorageError::ConditionFailed),
            Some(Fault::Timeout) => Err(StorageError::Timeout),
            None => self.inner.submit_transaction(intents),
        }
    }

    fn tag_counters(&self) -> StorageResult<Vec<TagCounter>> {
        self.counter_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.tag_counters()
    }
}
