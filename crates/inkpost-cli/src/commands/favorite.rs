//! Favorite command handlers

use anyhow::{Context, Result};

use inkpost_core::{ArticleStore, Articles};

use crate::output::Output;

/// Favorite an article as `user`
pub fn add(
    articles: &Articles<dyn ArticleStore>,
    slug: String,
    user: String,
    output: &Output,
) -> Result<()> {
    let article = articles
        .favorite_article(&slug, &user)
        .with_context(|| format!("Failed to favorite {}", slug))?;

    output.success(&format!("{} favorited {}", user, article.slug));
    output.print_article(&article);
    Ok(())
}

/// Remove `user`'s favorite from an article
pub fn remove(
    articles: &Articles<dyn ArticleStore>,
    slug: String,
    user: String,
    output: &Output,
) -> Result<()> {
    let article = articles
        .unfavorite_article(&slug, &user)
        .with_context(|| format!("Failed to unfavorite {}", slug))?;

    output.success(&format!("{} unfavorited {}", user, article.slug));
    output.print_article(&article);
    Ok(())
}
