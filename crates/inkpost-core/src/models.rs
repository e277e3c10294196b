//! Data models for inkpost
//!
//! Defines the core data structures: Article, TagLink, TagCounter and
//! FavoriteRecord, plus the inputs used to create and patch articles.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::slug::make_slug;

/// Exclusive upper bound for article identifiers
pub const MAX_ARTICLE_ID: i64 = i64::MAX;

/// Unique article identifier (63-bit positive integer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(i64);

impl ArticleId {
    /// Wrap a raw value, rejecting zero and negative numbers
    pub fn new(raw: i64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// Caller guarantees `raw >= 1`
    pub(crate) fn from_drawn(raw: i64) -> Self {
        debug_assert!(raw > 0);
        Self(raw)
    }

    /// Get the raw value
    pub fn get(self) -> i64 {
        self.0
    }

    /// Lowercase hex form, as embedded in slugs
    pub fn to_hex(self) -> String {
        format!("{:x}", self.0)
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A published article
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    /// Unique identifier, immutable once assigned
    pub id: ArticleId,
    /// `slugify(title)-hex(id)`
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    /// Tags in the order they were given (at most 5, duplicates kept)
    pub tags: Vec<String>,
    /// When this article was created
    pub created_at: DateTime<Utc>,
    /// When this article was last updated
    pub updated_at: DateTime<Utc>,
    /// Number of users who favorited this article
    pub favorites_count: i64,
    /// Username of the author
    pub author: String,
}

impl Article {
    /// Build a fresh article from creation input
    ///
    /// The identifier and slug are placeholders until the writer assigns them.
    pub(crate) fn draft(input: NewArticle, now: DateTime<Utc>) -> Self {
        Self {
            id: ArticleId(1),
            slug: String::new(),
            title: input.title,
            description: input.description,
            body: input.body,
            tags: input.tags,
            created_at: now,
            updated_at: now,
            favorites_count: 0,
            author: input.author,
        }
    }

    /// Assign an identifier, recomputing the slug from the title
    pub(crate) fn assign_id(&mut self, id: ArticleId) {
        self.id = id;
        self.slug = make_slug(&self.title, id);
    }

    /// Merge a patch over this article
    ///
    /// Empty or absent fields keep their prior value. Identifier, creation
    /// time, favorites count and author carry over; the slug is recomputed
    /// only when the title changes.
    pub fn merge(&self, patch: ArticlePatch, now: DateTime<Utc>) -> Article {
        let title = non_empty(patch.title).unwrap_or_else(|| self.title.clone());
        let slug = if title == self.title {
            self.slug.clone()
        } else {
            make_slug(&title, self.id)
        };

        Article {
            id: self.id,
            slug,
            title,
            description: non_empty(patch.description)
                .unwrap_or_else(|| self.description.clone()),
            body: non_empty(patch.body).unwrap_or_else(|| self.body.clone()),
            tags: patch.tags.unwrap_or_else(|| self.tags.clone()),
            created_at: self.created_at,
            updated_at: now.max(self.updated_at + Duration::nanoseconds(1)),
            favorites_count: self.favorites_count,
            author: self.author.clone(),
        }
    }

    /// The parts of this row that concurrent writers change
    pub fn revision(&self) -> Revision {
        Revision {
            updated_at: self.updated_at,
            favorites_count: self.favorites_count,
        }
    }

    /// Distinct tags in first-occurrence order
    pub fn distinct_tags(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            if !seen.contains(&tag.as_str()) {
                seen.push(tag.as_str());
            }
        }
        seen
    }

    /// The tag-index row for one of this article's tags
    pub fn tag_link(&self, tag: &str) -> TagLink {
        TagLink {
            tag: tag.to_string(),
            article_id: self.id,
            created_at: self.created_at,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Input for creating an article
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewArticle {
    pub title: String,
    pub description: String,
    pub body: String,
    pub tags: Vec<String>,
    /// Username of the author
    pub author: String,
}

impl NewArticle {
    /// Start an article for the given author and title
    pub fn new(author: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Replace the tag list
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Partial update of an article
///
/// `None` or an empty string keeps the current value. For tags, `None` keeps
/// the current list while `Some(vec![])` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Version of a stored article row
///
/// Writes computed from an earlier read carry the revision they saw; the
/// engine rejects them once the row has moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision {
    pub updated_at: DateTime<Utc>,
    pub favorites_count: i64,
}

/// "Article X carries tag T"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagLink {
    pub tag: String,
    pub article_id: ArticleId,
    /// Copied from the article
    pub created_at: DateTime<Utc>,
}

/// Number of articles carrying a tag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagCounter {
    pub tag: String,
    pub count: i64,
}

/// "User U favorited article X"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FavoriteRecord {
    pub username: String,
    pub article_id: ArticleId,
    pub favorited_at: DateTime<Utc>,
    /// Creation time of the favorited article, the favorites index sort key
    pub article_created_at: DateTime<Utc>,
}

/// Nanoseconds since the Unix epoch, as stored by the SQLite engine
pub fn to_nanos(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// Inverse of [`to_nanos`]
pub fn from_nanos(nanos: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(nanos)
}
