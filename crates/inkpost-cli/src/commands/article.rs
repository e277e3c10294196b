//! Article command handlers

use anyhow::{Context, Result};

use inkpost_core::{ArticlePatch, ArticleStore, Articles, ListRequest, NewArticle};

use crate::output::Output;
use crate::prompt::{confirm, parse_tags, with_default};

/// Fields given to `article edit`
pub struct EditFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub tags: Vec<String>,
    pub clear_tags: bool,
}

impl EditFields {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.body.is_none()
            && self.tags.is_empty()
            && !self.clear_tags
    }

    fn into_patch(self) -> ArticlePatch {
        let tags = if self.clear_tags {
            Some(Vec::new())
        } else if self.tags.is_empty() {
            None
        } else {
            Some(self.tags)
        };

        ArticlePatch {
            title: self.title,
            description: self.description,
            body: self.body,
            tags,
        }
    }
}

/// Create a new article
pub fn create(
    articles: &mut Articles<dyn ArticleStore>,
    title: String,
    author: String,
    description: String,
    body: String,
    tags: Vec<String>,
    output: &Output,
) -> Result<()> {
    let input = NewArticle::new(author, title)
        .with_description(description)
        .with_body(body)
        .with_tags(tags);

    let article = articles
        .create_article(input)
        .context("Failed to create article")?;

    output.success(&format!("Created article: {}", article.slug));
    output.print_article(&article);
    Ok(())
}

/// List articles with at most one filter
pub fn list(
    articles: &Articles<dyn ArticleStore>,
    offset: i64,
    limit: i64,
    author: Option<String>,
    tag: Option<String>,
    favorited: Option<String>,
    output: &Output,
) -> Result<()> {
    let request = ListRequest {
        offset,
        limit,
        author,
        tag,
        favorited,
    };

    let found = articles
        .list_articles(&request)
        .context("Failed to list articles")?;
    output.print_articles(&found);
    Ok(())
}

/// Show a single article
pub fn show(articles: &Articles<dyn ArticleStore>, slug: String, output: &Output) -> Result<()> {
    let article = articles
        .get_article_by_slug(&slug)
        .with_context(|| format!("Failed to load article {}", slug))?;

    output.print_article(&article);
    Ok(())
}

/// Edit an article, prompting for each field when none was given
pub fn edit(
    articles: &Articles<dyn ArticleStore>,
    slug: String,
    requester: String,
    fields: EditFields,
    output: &Output,
) -> Result<()> {
    let patch = if fields.is_empty() && output.should_prompt() {
        prompt_patch(articles, &slug)?
    } else {
        fields.into_patch()
    };

    let article = articles
        .update_article(&slug, patch, &requester)
        .with_context(|| format!("Failed to update article {}", slug))?;

    output.success("Article updated");
    output.print_article(&article);
    Ok(())
}

/// Delete an article
pub fn delete(
    articles: &Articles<dyn ArticleStore>,
    slug: String,
    requester: String,
    output: &Output,
) -> Result<()> {
    // Confirm deletion
    if output.should_prompt() {
        let article = articles
            .get_article_by_slug(&slug)
            .with_context(|| format!("Failed to load article {}", slug))?;
        println!("Delete article: {} - {}", article.slug, article.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    articles
        .delete_article(&slug, &requester)
        .with_context(|| format!("Failed to delete article {}", slug))?;

    output.success(&format!("Deleted article: {}", slug));
    Ok(())
}

fn prompt_patch(articles: &Articles<dyn ArticleStore>, slug: &str) -> Result<ArticlePatch> {
    let current = articles
        .get_article_by_slug(slug)
        .with_context(|| format!("Failed to load article {}", slug))?;

    println!("Editing article: {}", current.slug);
    println!("Press Enter to keep current value, or type new value.\n");

    let title = with_default("Title", &current.title)?;
    let description = with_default("Description", &current.description)?;
    let body = with_default("Body", &current.body)?;
    let tags = with_default("Tags (comma-separated)", &current.tags.join(", "))?
        .map(|input| parse_tags(&input));

    Ok(ArticlePatch {
        title,
        description,
        body,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> EditFields {
        EditFields {
            title: None,
            description: None,
            body: None,
            tags: Vec::new(),
            clear_tags: false,
        }
    }

    #[test]
    fn test_empty_fields_keep_everything() {
        let fields = fields();
        assert!(fields.is_empty());
        assert_eq!(fields.into_patch(), ArticlePatch::default());
    }

    #[test]
    fn test_tags_replace_list() {
        let patch = EditFields {
            tags: vec!["rust".to_string()],
            ..fields()
        }
        .into_patch();
        assert_eq!(patch.tags, Some(vec!["rust".to_string()]));
    }

    #[test]
    fn test_clear_tags_gives_empty_list() {
        let edit = EditFields {
            clear_tags: true,
            ..fields()
        };
        assert!(!edit.is_empty());
        assert_eq!(edit.into_patch().tags, Some(Vec::new()));
    }

    #[test]
    fn test_title_only() {
        let patch = EditFields {
            title: Some("New title".to_string()),
            ..fields()
        }
        .into_patch();
        assert_eq!(patch.title.as_deref(), Some("New title"));
        assert!(patch.tags.is_none());
    }
}
