//! SQLite storage engine
//!
//! Durable engine backed by a single SQLite file. Transactions run under
//! `BEGIN IMMEDIATE` so concurrent writers serialize on the database lock;
//! a writer that cannot get the lock within the busy timeout sees
//! [`StorageError::Timeout`].
//!
//! ## Tables
//!
//! - `articles` - Article rows, tags stored as a JSON array
//! - `tag_links` - One row per (tag, article)
//! - `tag_counters` - Article count per tag
//! - `favorites` - One row per (user, article)

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::debug;

use crate::config::Config;
use crate::models::{from_nanos, to_nanos, Article, ArticleId, Revision, TagCounter};
use crate::storage::engine::{
    ArticleIndex, ArticleRange, ArticleStore, Direction, IdIndex, IdRange, Precondition,
    WriteIntent,
};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::memory::DEFAULT_BATCH_SIZE;
use crate::storage::schema::{init_schema, needs_init};

const ARTICLE_COLUMNS: &str =
    "id, slug, title, description, body, tags, created_at, updated_at, favorites_count, author";

/// Storage engine backed by SQLite
pub struct SqliteStore {
    conn: Mutex<Connection>,
    batch_size: usize,
}

impl SqliteStore {
    /// Open or create the database at `config.sqlite_path()`
    pub fn open(config: &Config) -> StorageResult<Self> {
        let path = config.sqlite_path();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
        }

        let conn = Connection::open(&path)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        if needs_init(&conn) {
            init_schema(&conn)?;
        }

        debug!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            conn: Mutex::new(conn),
            batch_size: config.batch_size.max(1),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::open_in_memory_with_batch_size(DEFAULT_BATCH_SIZE)
    }

    /// In-memory database with a custom batched-read ceiling (at least 1)
    pub fn open_in_memory_with_batch_size(batch_size: usize) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            batch_size: batch_size.max(1),
        })
    }

    /// Number of tag link rows for `tag`
    pub fn tag_link_count(&self, tag: &str) -> StorageResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tag_links WHERE tag = ?",
            params![tag],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Number of article rows
    pub fn article_count(&self) -> StorageResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

impl ArticleStore for SqliteStore {
    fn get_article(&self, id: ArticleId) -> StorageResult<Option<Article>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM articles WHERE id = ?", ARTICLE_COLUMNS);
        let row = conn
            .query_row(&sql, params![id.get()], ArticleRow::from_row)
            .optional()?;
        row.map(ArticleRow::hydrate).transpose()
    }

    fn batch_get_articles(&self, ids: &[ArticleId]) -> StorageResult<Vec<Article>> {
        if ids.len() > self.batch_size {
            return Err(StorageError::BatchTooLarge {
                requested: ids.len(),
                max: self.batch_size,
            });
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM articles WHERE id IN ({})",
            ARTICLE_COLUMNS, placeholders
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter().map(|id| id.get())), |row| {
            ArticleRow::from_row(row)
        })?;

        let mut articles = Vec::with_capacity(ids.len());
        for row in rows {
            articles.push(row?.hydrate()?);
        }
        Ok(articles)
    }

    fn max_batch_size(&self) -> usize {
        self.batch_size
    }

    fn query_articles(&self, range: &ArticleRange) -> StorageResult<Vec<Article>> {
        let order = order_by(range.direction, "created_at", "id");
        let limit = sql_limit(range.limit);
        let conn = self.lock()?;

        let mut articles = Vec::new();
        match &range.index {
            ArticleIndex::CreatedAt => {
                let sql = format!("SELECT {} FROM articles {} LIMIT ?", ARTICLE_COLUMNS, order);
                let mut stmt = conn.prepare(&sql)?;
                for row in stmt.query_map(params![limit], ArticleRow::from_row)? {
                    articles.push(row?.hydrate()?);
                }
            }
            ArticleIndex::Author(author) => {
                let sql = format!(
                    "SELECT {} FROM articles WHERE author = ? {} LIMIT ?",
                    ARTICLE_COLUMNS, order
                );
                let mut stmt = conn.prepare(&sql)?;
                for row in stmt.query_map(params![author, limit], ArticleRow::from_row)? {
                    articles.push(row?.hydrate()?);
                }
            }
        }
        Ok(articles)
    }

    fn query_article_ids(&self, range: &IdRange) -> StorageResult<Vec<ArticleId>> {
        let (sql, key) = match &range.index {
            IdIndex::Tag(tag) => (
                format!(
                    "SELECT article_id FROM tag_links WHERE tag = ? {} LIMIT ?",
                    order_by(range.direction, "created_at", "article_id")
                ),
                tag,
            ),
            IdIndex::FavoritedBy(username) => (
                format!(
                    "SELECT article_id FROM favorites WHERE username = ? {} LIMIT ?",
                    order_by(range.direction, "article_created_at", "article_id")
                ),
                username,
            ),
        };

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![key, sql_limit(range.limit)], |row| {
            row.get::<_, i64>(0)
        })?;

        let mut ids = Vec::new();
        for raw in rows {
            ids.push(stored_id(raw?)?);
        }
        Ok(ids)
    }

    fn submit_transaction(&self, intents: &[WriteIntent]) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        for intent in intents {
            if !precondition_holds(&tx, intent)? {
                debug!(
                    kind = intent.kind(),
                    article_id = ?intent.article_id().map(ArticleId::get),
                    "precondition failed, rolling back"
                );
                return Err(StorageError::ConditionFailed);
            }
        }

        for intent in intents {
            apply(&tx, intent)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn tag_counters(&self) -> StorageResult<Vec<TagCounter>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT tag, count FROM tag_counters ORDER BY tag")?;
        let rows = stmt.query_map([], |row| {
            Ok(TagCounter {
                tag: row.get(0)?,
                count: row.get(1)?,
            })
        })?;

        let mut counters = Vec::new();
        for row in rows {
            counters.push(row?);
        }
        Ok(counters)
    }
}

// ==================== Transaction helpers ====================

fn precondition_holds(conn: &Connection, intent: &WriteIntent) -> StorageResult<bool> {
    let holds = match intent {
        WriteIntent::PutArticle {
            article,
            precondition,
        } => check_article(conn, *precondition, article.id)?,
        WriteIntent::DeleteArticle { id, precondition } => {
            check_article(conn, *precondition, *id)?
        }
        WriteIntent::PutFavorite {
            record,
            precondition,
        } => check(*precondition, || {
            favorite_exists(conn, &record.username, record.article_id)
        })?,
        WriteIntent::DeleteFavorite {
            username,
            article_id,
            precondition,
        } => check(*precondition, || {
            favorite_exists(conn, username, *article_id)
        })?,
        WriteIntent::IncrementFavoritesCount { article_id, .. } => {
            article_exists(conn, *article_id)?
        }
        WriteIntent::PutTagLink(_)
        | WriteIntent::DeleteTagLink { .. }
        | WriteIntent::IncrementTagCount { .. } => true,
    };
    Ok(holds)
}

fn check(
    precondition: Precondition,
    exists: impl FnOnce() -> StorageResult<bool>,
) -> StorageResult<bool> {
    Ok(match precondition {
        Precondition::None => true,
        Precondition::Absent => !exists()?,
        Precondition::Present => exists()?,
        // Only article rows carry a revision
        Precondition::Matches(_) => false,
    })
}

fn check_article(
    conn: &Connection,
    precondition: Precondition,
    id: ArticleId,
) -> StorageResult<bool> {
    match precondition {
        Precondition::Matches(expected) => article_matches(conn, id, expected),
        other => check(other, || article_exists(conn, id)),
    }
}

fn article_exists(conn: &Connection, id: ArticleId) -> StorageResult<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM articles WHERE id = ?)",
        params![id.get()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn article_matches(conn: &Connection, id: ArticleId, revision: Revision) -> StorageResult<bool> {
    let matches: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM articles WHERE id = ? AND updated_at = ? AND favorites_count = ?)",
        params![
            id.get(),
            to_nanos(revision.updated_at),
            revision.favorites_count
        ],
        |row| row.get(0),
    )?;
    Ok(matches)
}

fn favorite_exists(conn: &Connection, username: &str, id: ArticleId) -> StorageResult<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM favorites WHERE username = ? AND article_id = ?)",
        params![username, id.get()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn apply(conn: &Connection, intent: &WriteIntent) -> StorageResult<()> {
    match intent {
        WriteIntent::PutArticle { article, .. } => {
            let tags = serde_json::to_string(&article.tags)?;
            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO articles ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    ARTICLE_COLUMNS
                ),
                params![
                    article.id.get(),
                    article.slug,
                    article.title,
                    article.description,
                    article.body,
                    tags,
                    to_nanos(article.created_at),
                    to_nanos(article.updated_at),
                    article.favorites_count,
                    article.author,
                ],
            )?;
        }
        WriteIntent::DeleteArticle { id, .. } => {
            conn.execute("DELETE FROM articles WHERE id = ?", params![id.get()])?;
        }
        WriteIntent::PutTagLink(link) => {
            conn.execute(
                "INSERT OR REPLACE INTO tag_links (tag, article_id, created_at) VALUES (?, ?, ?)",
                params![link.tag, link.article_id.get(), to_nanos(link.created_at)],
            )?;
        }
        WriteIntent::DeleteTagLink { tag, article_id } => {
            conn.execute(
                "DELETE FROM tag_links WHERE tag = ? AND article_id = ?",
                params![tag, article_id.get()],
            )?;
        }
        WriteIntent::IncrementTagCount { tag, delta } => {
            conn.execute(
                "INSERT INTO tag_counters (tag, count) VALUES (?, ?)
                 ON CONFLICT(tag) DO UPDATE SET count = count + excluded.count",
                params![tag, delta],
            )?;
        }
        WriteIntent::PutFavorite { record, .. } => {
            conn.execute(
                "INSERT OR REPLACE INTO favorites (username, article_id, favorited_at, article_created_at)
                 VALUES (?, ?, ?, ?)",
                params![
                    record.username,
                    record.article_id.get(),
                    to_nanos(record.favorited_at),
                    to_nanos(record.article_created_at),
                ],
            )?;
        }
        WriteIntent::DeleteFavorite {
            username,
            article_id,
            ..
        } => {
            conn.execute(
                "DELETE FROM favorites WHERE username = ? AND article_id = ?",
                params![username, article_id.get()],
            )?;
        }
        WriteIntent::IncrementFavoritesCount { article_id, delta } => {
            conn.execute(
                "UPDATE articles SET favorites_count = favorites_count + ? WHERE id = ?",
                params![delta, article_id.get()],
            )?;
        }
    }
    Ok(())
}

// ==================== Row mapping ====================

fn order_by(direction: Direction, time_column: &str, id_column: &str) -> String {
    let dir = match direction {
        Direction::Ascending => "ASC",
        Direction::Descending => "DESC",
    };
    format!("ORDER BY {} {}, {} {}", time_column, dir, id_column, dir)
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn stored_id(raw: i64) -> StorageResult<ArticleId> {
    ArticleId::new(raw).ok_or_else(|| StorageError::InvalidRow(format!("article id {}", raw)))
}

/// Raw article row as stored
struct ArticleRow {
    id: i64,
    slug: String,
    title: String,
    description: String,
    body: String,
    tags: String,
    created_at: i64,
    updated_at: i64,
    favorites_count: i64,
    author: String,
}

impl ArticleRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            slug: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            body: row.get(4)?,
            tags: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
            favorites_count: row.get(8)?,
            author: row.get(9)?,
        })
    }

    fn hydrate(self) -> StorageResult<Article> {
        Ok(Article {
            id: stored_id(self.id)?,
            slug: self.slug,
            title: self.title,
            description: self.description,
            body: self.body,
            tags: serde_json::from_str(&self.tags)?,
            created_at: from_nanos(self.created_at),
            updated_at: from_nanos(self.updated_at),
            favorites_count: self.favorites_count,
            author: self.author,
        })
    }
}
