//! inkpost CLI
//!
//! Command-line interface for inkpost - articles, tags and favorites.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use inkpost_core::{ArticleStore, Articles, Config, MemoryStore};

mod commands;
mod output;
mod prompt;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "inkpost")]
#[command(about = "inkpost - articles, tags and favorites")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a throwaway in-memory store instead of the database
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage articles
    Article {
        #[command(subcommand)]
        command: ArticleCommands,
    },
    /// Favorite or unfavorite articles
    Favorite {
        #[command(subcommand)]
        command: FavoriteCommands,
    },
    /// List tags in use
    Tags,
    /// Show configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ArticleCommands {
    /// Create a new article
    #[command(alias = "add")]
    Create {
        /// Article title
        title: String,
        /// Username of the author
        #[arg(short, long)]
        author: String,
        /// Short description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Article body
        #[arg(short, long, default_value = "")]
        body: String,
        /// Tags to add (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,
    },
    /// List articles, most recent first
    #[command(alias = "ls")]
    List {
        /// Articles to skip
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
        /// Articles to show
        #[arg(short, long, default_value_t = 20, allow_negative_numbers = true)]
        limit: i64,
        /// Only articles by this author
        #[arg(short, long)]
        author: Option<String>,
        /// Only articles with this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Only articles favorited by this user
        #[arg(short, long)]
        favorited: Option<String>,
    },
    /// Show an article
    Show {
        /// Article slug
        slug: String,
    },
    /// Edit an article (prompts when no field is given)
    Edit {
        /// Article slug
        slug: String,
        /// Username making the change
        #[arg(long = "as", value_name = "USER")]
        requester: String,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New body
        #[arg(short, long)]
        body: Option<String>,
        /// Replace tags (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,
        /// Remove all tags
        #[arg(long, conflicts_with = "tag")]
        clear_tags: bool,
    },
    /// Delete an article
    #[command(alias = "rm")]
    Delete {
        /// Article slug
        slug: String,
        /// Username making the change
        #[arg(long = "as", value_name = "USER")]
        requester: String,
    },
}

#[derive(Subcommand)]
enum FavoriteCommands {
    /// Favorite an article
    Add {
        /// Article slug
        slug: String,
        /// Username
        #[arg(short, long)]
        user: String,
    },
    /// Remove a favorite
    #[command(alias = "rm")]
    Remove {
        /// Article slug
        slug: String,
        /// Username
        #[arg(short, long)]
        user: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the config file path
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), &output);
    }

    let config = Config::load().context("Failed to load configuration")?;
    let mut articles = open_articles(&config, cli.memory)?;

    match cli.command {
        Commands::Article { command } => handle_article_command(command, &mut articles, &output),
        Commands::Favorite { command } => handle_favorite_command(command, &articles, &output),
        Commands::Tags => commands::tag::list(&articles, &output),
        Commands::Config { .. } => Ok(()), // Handled above
    }
}

/// Log to stderr, filtered by INKPOST_LOG (default: warnings only)
fn init_logging() {
    let env_filter =
        EnvFilter::try_from_env("INKPOST_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_articles(config: &Config, memory: bool) -> Result<Articles<dyn ArticleStore>> {
    if !memory {
        return Articles::open(config);
    }

    debug!("using in-memory store");
    let store: Arc<dyn ArticleStore> = Arc::new(MemoryStore::with_batch_size(config.batch_size));
    Ok(Articles::with_store(store, config.limits()))
}

fn handle_article_command(
    command: ArticleCommands,
    articles: &mut Articles<dyn ArticleStore>,
    output: &Output,
) -> Result<()> {
    match command {
        ArticleCommands::Create {
            title,
            author,
            description,
            body,
            tag,
        } => commands::article::create(articles, title, author, description, body, tag, output),
        ArticleCommands::List {
            offset,
            limit,
            author,
            tag,
            favorited,
        } => commands::article::list(articles, offset, limit, author, tag, favorited, output),
        ArticleCommands::Show { slug } => commands::article::show(articles, slug, output),
        ArticleCommands::Edit {
            slug,
            requester,
            title,
            description,
            body,
            tag,
            clear_tags,
        } => {
            let fields = commands::article::EditFields {
                title,
                description,
                body,
                tags: tag,
                clear_tags,
            };
            commands::article::edit(articles, slug, requester, fields, output)
        }
        ArticleCommands::Delete { slug, requester } => {
            commands::article::delete(articles, slug, requester, output)
        }
    }
}

fn handle_favorite_command(
    command: FavoriteCommands,
    articles: &Articles<dyn ArticleStore>,
    output: &Output,
) -> Result<()> {
    match command {
        FavoriteCommands::Add { slug, user } => commands::favorite::add(articles, slug, user, output),
        FavoriteCommands::Remove { slug, user } => {
            commands::favorite::remove(articles, slug, user, output)
        }
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Path) => commands::config::path(output),
    }
}
