//! Article operation errors
//!
//! Every core operation returns [`ArticleError`]. Input problems, conflicts
//! and missing records are distinguished from storage failures so callers
//! can map them to responses without string matching.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced by article operations
#[derive(Error, Debug)]
pub enum ArticleError {
    /// Request failed validation; nothing was written or read
    #[error("{field} {message}")]
    Input { field: String, message: String },

    /// Slug has no `-` or its suffix is not a hex id
    #[error("slug '{0}' is invalid")]
    InvalidSlug(String),

    /// No free identifier was found within the attempt budget
    #[error("could not allocate a unique article id after {attempts} attempts")]
    Conflict { attempts: u32 },

    /// Article changed between the read and the write
    #[error("article was modified concurrently")]
    Modified,

    /// Slug or identifier does not resolve to an article
    #[error("article not found")]
    NotFound,

    /// Requester is not the article's author
    #[error("'{requester}' is not allowed to modify this article")]
    Forbidden { requester: String },

    /// Underlying storage failure, propagated unretried
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ArticleError {
    pub fn input(field: impl Into<String>, message: impl Into<String>) -> Self {
        ArticleError::Input {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this is a caller mistake (bad paging, too many tags, bad slug)
    pub fn is_input(&self) -> bool {
        matches!(self, ArticleError::Input { .. } | ArticleError::InvalidSlug(_))
    }

    /// Whether the caller may reasonably retry the same request
    pub fn is_retryable(&self) -> bool {
        match self {
            ArticleError::Conflict { .. } | ArticleError::Modified => true,
            ArticleError::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for article operations
pub type ArticleResult<T> = Result<T, ArticleError>;
