use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use mangadex_adapter::config::{find_config_file, get_config, load_config, Config};
use mangadex_adapter::models::{
    ChapterContent, ChapterQuery, ChapterSet, SeriesQuery, SeriesSearchResult, SortOrder,
};
use mangadex_adapter::sources::SourceRegistry;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// MangaDex Adapter - Search series, list chapters and resolve pages
#[derive(Parser, Debug)]
#[command(name = "mangadex-adapter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search series, list chapters and resolve pages through a manga source", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Source to query
    #[arg(long, short, global = true, default_value = "mangadex")]
    source: String,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (plain if TTY, JSON otherwise)
    Auto,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

/// Sort order
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Order {
    /// Ascending chapter numbers
    Asc,
    /// Descending chapter numbers
    Desc,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for series by title
    #[command(alias = "s")]
    Search {
        /// Series title
        title: String,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Maximum number of results (at most 100)
        #[arg(long, short, default_value_t = 100)]
        limit: usize,
    },

    /// List chapters of a series
    #[command(alias = "c")]
    Chapters {
        /// Series identifier
        series_id: String,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Maximum number of chapters (at most 500)
        #[arg(long, short, default_value_t = 100)]
        limit: usize,

        /// Only chapters updated since this RFC 3339 timestamp
        #[arg(long, value_parser = parse_since)]
        since: Option<DateTime<Utc>>,

        /// Sort order by chapter number
        #[arg(long, value_enum, default_value_t = Order::Asc)]
        order: Order,
    },

    /// Resolve the page URLs of a chapter
    #[command(alias = "p")]
    Pages {
        /// Chapter identifier
        chapter_id: String,
    },
}

fn parse_since(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{}': {}", value, e))
}

fn load(cli: &Cli) -> Result<Config> {
    if let Some(path) = &cli.config {
        return load_config(path)
            .with_context(|| format!("Failed to load config file {}", path.display()));
    }

    if let Some(path) = find_config_file() {
        let config = load_config(&path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        return Ok(config);
    }

    get_config().context("Failed to read configuration from environment")
}

fn use_json(format: OutputFormat) -> bool {
    match format {
        OutputFormat::Json => true,
        OutputFormat::Plain => false,
        OutputFormat::Auto => !std::io::stdout().is_terminal(),
    }
}

fn print_series(result: &SeriesSearchResult) {
    for series in &result.results {
        println!("[{}] {} ({})", series.ranking, series.name, series.identifier);
        if let Some(cover) = &series.cover_url {
            println!("    cover: {}", cover);
        }
    }
}

fn print_chapters(set: &ChapterSet) {
    for chapter in &set.chapters {
        let group = chapter.group.as_deref().unwrap_or("-");
        println!(
            "{:>6}  {}  [{}]  ({})",
            chapter.number, chapter.title, group, chapter.identifier
        );
    }
}

fn print_pages(content: &ChapterContent) {
    for (i, page) in content.pages.iter().enumerate() {
        println!("{:>3}  {}", i + 1, page.high_url);
        if let Some(low) = &page.low_url {
            println!("     {}", low);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    let log_level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("mangadex_adapter={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let registry = SourceRegistry::from_config(&config)?;
    let source = registry.get_required(&cli.source)?;
    let json = use_json(cli.output);

    match cli.command {
        Commands::Search {
            title,
            offset,
            limit,
        } => {
            let query = SeriesQuery::new(title).offset(offset).limit(limit);
            let result = source.search_series(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_series(&result);
            }
        }
        Commands::Chapters {
            series_id,
            offset,
            limit,
            since,
            order,
        } => {
            let mut query = ChapterQuery::new(series_id)
                .offset(offset)
                .limit(limit)
                .order(match order {
                    Order::Asc => SortOrder::Ascending,
                    Order::Desc => SortOrder::Descending,
                });
            query.since = since;

            let set = source.list_chapters(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&set)?);
            } else {
                print_chapters(&set);
            }
        }
        Commands::Pages { chapter_id } => {
            let content = source.get_chapter(&chapter_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&content)?);
            } else {
                print_pages(&content);
            }
        }
    }

    Ok(())
}
