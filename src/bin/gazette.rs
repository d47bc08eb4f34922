//! Gazette CLI — article tagging service over an embedded graph store.
//!
//! Usage:
//!   gazette search-tags [--filter galnet] [--db path]
//!   gazette search-articles [--tags thargoid] [--filter fleet]
//!   gazette edit-tags <article-id> --actions '[{"action":"add","value":"war"}]'

use clap::{Parser, Subcommand};
use gazette::{
    ActionRequest, ArticleId, GazetteApi, OpenGraph, ServiceConfig, ServiceResult, SqliteGraph,
    TagId,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "gazette",
    version,
    about = "Graph-backed article tagging and search"
)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tags, optionally filtered by name
    SearchTags {
        /// Comma-separated filter tokens
        #[arg(long)]
        filter: Option<String>,
    },
    /// Search articles by tag filter, text filter, or both
    SearchArticles {
        /// Comma-separated tag filter tokens
        #[arg(long)]
        tags: Option<String>,
        /// Comma-separated free-text filter tokens
        #[arg(long)]
        filter: Option<String>,
    },
    /// List the articles linked to one tag
    ArticlesForTag {
        /// Tag id
        tag: String,
    },
    /// List the tags on one article
    TagsForArticle {
        /// Article id
        article: String,
        /// Extra article ids to check for shared tags
        #[arg(long, value_delimiter = ',')]
        include: Vec<String>,
    },
    /// Create a tag, optionally linking it to articles
    CreateTag {
        /// Tag display name
        name: String,
        /// Article to link the tag to
        #[arg(long)]
        article: Option<String>,
        /// Also link every article whose text matches the name
        #[arg(long)]
        all: bool,
    },
    /// Apply a batch of tag actions to one article
    EditTags {
        /// Article id
        article: String,
        /// JSON list of `{action, value}` objects
        #[arg(long)]
        actions: String,
    },
    /// Set a user's color on an article-tag link
    SetColor {
        user: String,
        article: String,
        tag: String,
        r: i64,
        g: i64,
        b: i64,
    },
    /// Remove a user's color from an article-tag link
    RemoveColor {
        user: String,
        article: String,
        tag: String,
    },
    /// Add an article (merged by title and date)
    AddArticle {
        title: String,
        /// Article body
        text: String,
        /// Publication date, ISO format (e.g. 3304-06-01)
        date: String,
    },
    /// Record a subtag relationship between two existing tags
    LinkSubtag {
        /// Parent tag id
        parent: String,
        /// Child tag id
        child: String,
    },
    /// Re-run the bulk matcher for every tag against the corpus
    Retag,
}

/// Default database path (~/.local/share/gazette/gazette.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("gazette").join("gazette.db")
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to render output: {}", e),
    }
}

async fn run(api: &GazetteApi, command: Commands) -> ServiceResult<()> {
    match command {
        Commands::SearchTags { filter } => {
            print_json(&api.search_tags(filter.as_deref()).await?);
        }
        Commands::SearchArticles { tags, filter } => {
            print_json(
                &api.search_articles(tags.as_deref(), filter.as_deref())
                    .await?,
            );
        }
        Commands::ArticlesForTag { tag } => {
            print_json(&api.articles_for_tag(&TagId::from(tag)).await?);
        }
        Commands::TagsForArticle { article, include } => {
            let include: Vec<ArticleId> = include.into_iter().map(ArticleId::from).collect();
            print_json(
                &api.tags_for_article(&ArticleId::from(article), &include)
                    .await?,
            );
        }
        Commands::CreateTag { name, article, all } => {
            let article_id = article.map(ArticleId::from);
            print_json(&api.create_tag(&name, article_id.as_ref(), all).await?);
        }
        Commands::EditTags { article, actions } => {
            let actions: Vec<ActionRequest> = serde_json::from_str(&actions)
                .map_err(|e| gazette::ServiceError::Validation(format!("bad actions: {}", e)))?;
            print_json(
                &api.edit_article_tags(&ArticleId::from(article), &actions)
                    .await?,
            );
        }
        Commands::SetColor {
            user,
            article,
            tag,
            r,
            g,
            b,
        } => {
            print_json(
                &api.set_link_color(&user, &ArticleId::from(article), &TagId::from(tag), [r, g, b])
                    .await?,
            );
        }
        Commands::RemoveColor { user, article, tag } => {
            print_json(
                &api.remove_link_color(&user, &ArticleId::from(article), &TagId::from(tag))
                    .await?,
            );
        }
        Commands::AddArticle { title, text, date } => {
            let date = date
                .parse()
                .map_err(|_| gazette::ServiceError::Validation(format!("bad date `{}`", date)))?;
            print_json(&api.add_article(&title, &text, date).await?);
        }
        Commands::LinkSubtag { parent, child } => {
            api.link_subtag(&TagId::from(parent), &TagId::from(child))
                .await?;
            println!("linked");
        }
        Commands::Retag => {
            let linked = api.retag().await?;
            println!("{} new links", linked);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(default_db_path);

    let store = match SqliteGraph::open(&db_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("failed to open store at {}: {}", db_path.display(), e);
            std::process::exit(1);
        }
    };
    let api = GazetteApi::new(Arc::new(store), ServiceConfig::default());

    if let Err(e) = run(&api, cli.command).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
