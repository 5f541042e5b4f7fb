use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use news_curator::config::CuratorConfig;
use news_curator::curation::{CurationOutcome, CurationPipeline, Curator};
use news_curator::db::Database;
use news_curator::llm::AnthropicModel;
use news_curator::mcp::{self, render_articles, render_history};
use news_curator::scheduler::{self, DailySchedule};
use news_curator::sources::{GNewsClient, SearchQuery};

#[derive(Parser)]
#[command(name = "news-curator")]
#[command(about = "Daily AI-curated foreign policy news that learns from your feedback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one curation now
    Run,
    /// Show articles curated today
    Today,
    /// Like or dislike a curated article
    Feedback {
        /// Article ID as shown by `today`
        article_id: Uuid,

        #[arg(long, conflicts_with = "disliked", required_unless_present = "disliked")]
        liked: bool,

        #[arg(long)]
        disliked: bool,

        #[arg(long)]
        notes: Option<String>,
    },
    /// Show preferences, or set one with --set KEY VALUE
    Preferences {
        #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"])]
        set: Option<Vec<String>>,
    },
    /// Show curation history
    History {
        #[arg(short, long, default_value = "7")]
        days: u32,
    },
    /// Run curation now and then daily at CURATION_HOUR:CURATION_MINUTE
    Schedule,
    /// Start MCP server via stdio
    Mcp,
}

/// Initialize tracing with output to stderr (for MCP mode) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "news_curator=info".into()),
    );

    if use_stderr {
        // stdout carries the MCP protocol
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn open_database(config: &CuratorConfig) -> anyhow::Result<Database> {
    let db = match &config.db_path {
        Some(path) => Database::open(path.clone())?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

fn build_curator(config: &CuratorConfig, db: Database) -> anyhow::Result<Curator> {
    let source = GNewsClient::new(config.gnews_api_key()?);
    let model = AnthropicModel::new(config.anthropic_api_key()?, config.model.clone())?;

    let pipeline = CurationPipeline::new(
        db.clone(),
        Arc::new(source),
        SearchQuery::defaults(config.fetch_max),
        Arc::new(model),
    );
    Ok(Curator::new(db, pipeline))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(matches!(cli.command, Commands::Mcp));

    let config = CuratorConfig::from_env()?;
    tracing::debug!("Loaded {:?}", config);
    let db = open_database(&config)?;

    match cli.command {
        Commands::Run => {
            let curator = build_curator(&config, db)?;
            match curator.run_daily_curation().await {
                CurationOutcome::Completed(report) => print!("{}", render_articles(&report.articles)),
                CurationOutcome::Failed(failure) => {
                    anyhow::bail!("Curation failed during {}: {}", failure.stage, failure.error)
                }
            }
        }
        Commands::Today => {
            let articles = Curator::read_only(db).todays_articles()?;
            if articles.is_empty() {
                println!("No articles curated today. Run `news-curator run` to curate.");
            } else {
                print!("{}", render_articles(&articles));
            }
        }
        Commands::Feedback {
            article_id,
            liked,
            disliked: _,
            notes,
        } => {
            Curator::read_only(db).provide_feedback(article_id, liked, notes)?;
            println!(
                "[{}] Feedback recorded for {}",
                if liked { "LIKED" } else { "DISLIKED" },
                article_id
            );
        }
        Commands::Preferences { set } => {
            if let Some([key, value]) = set.as_deref() {
                let parsed = serde_json::from_str::<Value>(value)
                    .unwrap_or_else(|_| Value::String(value.clone()));
                db.set_preference(key, &parsed)?;
                println!("Updated preference: {} = {}", key, parsed);
            } else {
                let prefs = db.get_all_preferences()?;
                println!("{}", serde_json::to_string_pretty(&prefs)?);
            }
        }
        Commands::History { days } => {
            let history = Curator::read_only(db).history(days)?;
            print!("{}", render_history(&history));
        }
        Commands::Schedule => {
            let curator = build_curator(&config, db)?;
            let schedule = DailySchedule::new(config.curation_hour, config.curation_minute);
            scheduler::run_daily(curator, schedule, true).await?;
        }
        Commands::Mcp => {
            let curator = match build_curator(&config, db.clone()) {
                Ok(curator) => curator,
                Err(e) => {
                    tracing::warn!("{}; serving stored articles only", e);
                    Curator::read_only(db)
                }
            };
            mcp::run_stdio_server(curator).await?;
        }
    }

    Ok(())
}
