//! SQLite schema for the durable storage engine
//!
//! One table per entity plus the ordered indexes the query engine scans:
//! articles by creation time, articles by author, tag links by tag and
//! favorites by user. Timestamps are i64 nanoseconds since the Unix epoch.

use rusqlite::{Connection, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Articles table
        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY,
            slug TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            body TEXT NOT NULL,
            tags TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            favorites_count INTEGER NOT NULL DEFAULT 0,
            author TEXT NOT NULL
        );

        -- Article-tag links, one row per (tag, article)
        CREATE TABLE IF NOT EXISTS tag_links (
            tag TEXT NOT NULL,
            article_id INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (tag, article_id)
        );

        -- Per-tag article counts
        CREATE TABLE IF NOT EXISTS tag_counters (
            tag TEXT PRIMARY KEY,
            count INTEGER NOT NULL
        );

        -- Favorites, one row per (user, article)
        CREATE TABLE IF NOT EXISTS favorites (
            username TEXT NOT NULL,
            article_id INTEGER NOT NULL,
            favorited_at INTEGER NOT NULL,
            article_created_at INTEGER NOT NULL,
            PRIMARY KEY (username, article_id)
        );

        -- Ordered indexes for listings (most recent first)
        CREATE INDEX IF NOT EXISTS idx_articles_created_at
            ON articles(created_at, id);
        CREATE INDEX IF NOT EXISTS idx_articles_author
            ON articles(author, created_at, id);
        CREATE INDEX IF NOT EXISTS idx_tag_links_tag
            ON tag_links(tag, created_at, article_id);
        CREATE INDEX IF NOT EXISTS idx_favorites_username
            ON favorites(username, article_created_at, article_id);
        "#,
    )?;

    // Set schema version
    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let result: Result<String> = conn.query_row(
        "SELECT value FROM schema_info WHERE key = 'version'",
        [],
        |row| row.get(0),
    );

    match result {
        Ok(v) => Ok(v.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(rusqlite::Error::SqliteFailure(_, _)) => Ok(None), // Table doesn't exist
        Err(e) => Err(e),
    }
}

/// Check if schema needs initialization
pub fn needs_init(conn: &Connection) -> bool {
    get_schema_version(conn).ok().flatten().is_none()
}
