use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use quill::date::format_date;
use quill::server::ApiServer;
use quill::{BlogConfig, DefaultPostService};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Browse, search, and serve a markdown blog")]
struct Cli {
    /// Path to the blog config.
    #[arg(long, default_value = "quill.toml")]
    config: PathBuf,

    /// Folder holding the posts. Overrides `posts_path` from the config.
    #[arg(long)]
    posts: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lists every post, newest first.
    List,

    /// Shows a single post rendered to HTML.
    Show { slug: String },

    /// Searches post titles and tags.
    Search {
        terms: Vec<String>,

        #[arg(long)]
        language: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long)]
        items_per_page: Option<usize>,
    },

    /// Serves the posts as a JSON API.
    Serve {
        #[arg(long)]
        address: Option<SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = BlogConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(posts) = cli.posts {
        config.posts_path = posts;
    }

    let service = DefaultPostService::from_config(&config);

    match cli.command {
        Command::List => {
            for metadata in service.get_all_post_metadata()? {
                let date = metadata
                    .article_date
                    .as_deref()
                    .and_then(|date| format_date(date, "%Y-%m-%d", config.timezone))
                    .unwrap_or_else(|| "----------".to_string());

                println!(
                    "{date}  {}  {}",
                    metadata.slug,
                    metadata.title.as_deref().unwrap_or("(untitled)")
                );
            }
        }
        Command::Show { slug } => {
            let Some(post) = service.get_single_post(&slug)? else {
                bail!("no post with slug '{slug}'");
            };

            let metadata = &post.metadata;
            let reading_time = metadata
                .article_reading_time
                .unwrap_or_else(|| post.reading_metrics().read_time.0 as f64);

            println!("{}", metadata.title.as_deref().unwrap_or("(untitled)"));
            if let Some(date) = metadata
                .article_date
                .as_deref()
                .and_then(|date| format_date(date, "%d/%m/%Y %H:%M", config.timezone))
            {
                println!("{date}");
            }
            if let Some(author) = &metadata.author {
                println!("{author}");
            }
            println!("{reading_time} min");
            if let Some(tags) = &metadata.tags {
                println!("{}", tags.join(", "));
            }
            println!();
            println!("{}", service.parse(&post.article_body));
        }
        Command::Search {
            terms,
            language,
            page,
            items_per_page,
        } => {
            let language = language.unwrap_or_else(|| config.default_language.clone());
            let items_per_page = items_per_page.unwrap_or(config.items_per_page);

            let results = service.search_posts(&terms.join(" "), &language, page, items_per_page)?;

            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Serve { address } => {
            let address = address.unwrap_or(config.server.address);

            ApiServer::new(service, &config).serve(address).await?;
        }
    }

    Ok(())
}
