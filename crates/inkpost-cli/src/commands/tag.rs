//! Tag command handlers

use anyhow::{Context, Result};

use inkpost_core::{ArticleStore, Articles};

use crate::output::Output;

/// List tags in use with article counts
pub fn list(articles: &Articles<dyn ArticleStore>, output: &Output) -> Result<()> {
    let tags = articles.tags().context("Failed to list tags")?;
    output.print_tags(&tags);
    Ok(())
}
