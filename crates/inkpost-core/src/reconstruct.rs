//! Ordered reassembly of batched point reads
//!
//! Secondary indexes (tag links, favorites) only yield article ids. To turn
//! an ordered id slice into articles we fetch them in batches, which come
//! back in no particular order, then put them back in id-list order.
//! Ids that no longer resolve are skipped and the output is compacted.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{Article, ArticleId};
use crate::storage::{ArticleStore, StorageResult};

/// Fetch up to `limit` of `ordered_ids` and return them in the same order
///
/// Issues one batched read per `store.max_batch_size()` ids. An empty id
/// list makes no storage call.
pub fn resolve<S: ArticleStore + ?Sized>(
    store: &S,
    ordered_ids: &[ArticleId],
    limit: usize,
) -> StorageResult<Vec<Article>> {
    let ids = &ordered_ids[..ordered_ids.len().min(limit)];
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut fetched = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(store.max_batch_size().max(1)) {
        fetched.extend(store.batch_get_articles(chunk)?);
    }

    let articles = reassemble(ids, fetched);
    if articles.len() < ids.len() {
        debug!(
            requested = ids.len(),
            resolved = articles.len(),
            "skipped index entries without an article"
        );
    }
    Ok(articles)
}

/// Order `fetched` by the position of each id in `ordered_ids`
///
/// Articles whose id is not in `ordered_ids` are dropped; ids with no
/// matching article leave no gap. A duplicated id keeps its first position.
pub fn reassemble(ordered_ids: &[ArticleId], fetched: Vec<Article>) -> Vec<Article> {
    let mut position: HashMap<ArticleId, usize> = HashMap::with_capacity(ordered_ids.len());
    for (i, id) in ordered_ids.iter().enumerate() {
        position.entry(*id).or_insert(i);
    }

    let mut slots: Vec<Option<Article>> = vec![None; ordered_ids.len()];
    for article in fetched {
        if let Some(&i) = position.get(&article.id) {
            slots[i] = Some(article);
        }
    }

    slots.into_iter().flatten().collect()
}
