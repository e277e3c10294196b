//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use inkpost_core::{Article, TagCounter};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single article in full
    pub fn print_article(&self, article: &Article) {
        match self.format {
            OutputFormat::Human => {
                println!("Slug:        {}", article.slug);
                println!("Title:       {}", article.title);
                if !article.description.is_empty() {
                    println!("Description: {}", article.description);
                }
                println!("Author:      {}", article.author);
                if !article.tags.is_empty() {
                    println!("Tags:        {}", article.tags.join(", "));
                }
                println!("Favorites:   {}", article.favorites_count);
                println!("Created:     {}", article.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:     {}", article.updated_at.format("%Y-%m-%d %H:%M"));

                if !article.body.is_empty() {
                    println!();
                    println!("{}", article.body);
                }
            }
            OutputFormat::Json => print_json(article),
            OutputFormat::Quiet => {
                println!("{}", article.slug);
            }
        }
    }

    /// Print a list of articles
    pub fn print_articles(&self, articles: &[Article]) {
        match self.format {
            OutputFormat::Human => {
                if articles.is_empty() {
                    println!("No articles found.");
                    return;
                }
                for article in articles {
                    println!(
                        "{} | {} | {} | ♥ {}",
                        article.created_at.format("%Y-%m-%d"),
                        truncate(&article.title, 35),
                        truncate(&article.author, 15),
                        article.favorites_count
                    );
                    println!("           {}", article.slug);
                }
                println!("\n{} article(s)", articles.len());
            }
            OutputFormat::Json => print_json(&articles),
            OutputFormat::Quiet => {
                for article in articles {
                    println!("{}", article.slug);
                }
            }
        }
    }

    /// Print a list of tags
    pub fn print_tags(&self, tags: &[TagCounter]) {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return;
                }
                for counter in tags {
                    println!("{} ({})", counter.tag, counter.count);
                }
                println!("\n{} tag(s)", tags.len());
            }
            OutputFormat::Json => {
                let json_tags: Vec<_> = tags
                    .iter()
                    .map(|c| serde_json::json!({"name": c.tag, "count": c.count}))
                    .collect();
                print_json(&json_tags);
            }
            OutputFormat::Quiet => {
                for counter in tags {
                    println!("{}", counter.tag);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
