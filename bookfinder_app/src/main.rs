use std::sync::Arc;

use clap::{Parser, Subcommand};

use bookfinder_app::app_config::AppConfig;
use bookfinder_app::image_resolver::HttpImageFetcher;
use bookfinder_app::notifications::ConsoleNotifier;
use bookfinder_app::persistence::{JsonFileKeyValueStore, PersistenceBridge};
use bookfinder_app::shell::{Services, Shell, Tab};
use bookfinder_recommendations::api::FilterField;
use bookfinder_recommendations::client::RecommendationsClient;
use bookfinder_recommendations::size_range::SizeRange;
use bookfinder_saved_books::client::SavedBooksClient;
use bookfinder_saved_books::saved_books_view::SortOrder;

#[derive(Parser)]
#[command(name = "bookfinder", about = "Book recommendations and your saved collection")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search recommendations, filters given here replace the stored ones
    Search {
        query: Vec<String>,
        /// 10-20, 20-30, 30-40, 40-50, 50+ or 100+
        #[arg(long)]
        range: Option<String>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        audience: Option<String>,
        #[arg(long = "type")]
        book_type: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        level: Option<String>,
        #[arg(long)]
        all_available: bool,
    },
    /// Show the results of the last search
    Results,
    /// Show the saved collection, optionally narrowed by a term
    Saved {
        term: Option<String>,
        /// newest, oldest, title or author
        #[arg(long, default_value = "newest")]
        sort: String,
    },
    /// Save the n-th visible recommendation
    Save { position: usize },
    /// Remove the n-th visible recommendation from the collection
    Unsave { position: usize },
    /// Show filter options and the active filters
    Filters {
        /// Clear the active filters
        #[arg(long)]
        clear: bool,
    },
    /// Forget the stored search, results and filter panel state
    Clear,
}

// Based on https://github.com/LukeMathWalker/tracing-actix-web/blob/main/examples/opentelemetry/src/main.rs#L15
fn init_telemetry() -> anyhow::Result<()> {
    use opentelemetry::global;
    use opentelemetry_sdk::propagation::TraceContextPropagator;
    use opentelemetry_sdk::runtime::TokioCurrentThread;
    use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::{EnvFilter, Registry};

    let app_name = "bookfinder";

    global::set_text_map_propagator(TraceContextPropagator::new());
    #[allow(deprecated)]
    let tracer = opentelemetry_jaeger::new_agent_pipeline()
        .with_service_name(app_name)
        .install_batch(TokioCurrentThread)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
    // Rendered output goes to stdout, structured logs to stderr
    let formatting_layer = BunyanFormattingLayer::new(app_name.into(), std::io::stderr);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(telemetry)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn services(config: &AppConfig) -> anyhow::Result<Services> {
    let persistence =
        PersistenceBridge::new(Arc::new(JsonFileKeyValueStore::open(&config.storage_path)));
    let token = config
        .auth_token
        .clone()
        .or_else(|| persistence.auth_token());

    Ok(Services {
        recommendations_api: Arc::new(
            RecommendationsClient::new(&config.api_base_url)?.with_bearer_token(token.clone()),
        ),
        saved_books_api: Arc::new(
            SavedBooksClient::new(&config.api_base_url)?.with_bearer_token(token),
        ),
        persistence,
        notifier: Arc::new(ConsoleNotifier),
        image_fetcher: Arc::new(HttpImageFetcher::new()?),
    })
}

/// Saves or removes the visible book at the position unless it already is in the wanted state
async fn change_membership(shell: &mut Shell, position: usize, save: bool) -> anyhow::Result<()> {
    let Some(book) = shell.visible_book(position) else {
        anyhow::bail!("No visible recommendation at position {}", position)
    };
    if shell.saved_books.is_saved(&book.title, &book.author) == save {
        let state = if save { "already" } else { "not" };
        println!("\"{}\" is {} in your collection", book.title, state);
        return Ok(());
    }
    // Failures are reported through the notifier
    let _ = shell.saved_books.toggle(&book).await;
    Ok(())
}

async fn run(command: Command, shell: &mut Shell) -> anyhow::Result<()> {
    match command {
        Command::Search {
            query,
            range,
            language,
            audience,
            book_type,
            content,
            level,
            all_available,
        } => {
            let session = &mut shell.search;
            session.set_query(&query.join(" "));
            if let Some(range) = range {
                session.set_range(SizeRange::from(range));
            }
            session.set_get_all_available(all_available);
            for (field, value) in [
                (FilterField::Language, language),
                (FilterField::TargetAudience, audience),
                (FilterField::BookType, book_type),
                (FilterField::ContentType, content),
                (FilterField::ReadingLevel, level),
            ] {
                if let Some(value) = value {
                    session.set_filter(field, Some(&value));
                }
            }
            // Failures are reported through the notifier
            if session.search().await.is_ok() {
                shell.refresh_covers().await;
            }
            print!("{}", shell.render_discover());
        }
        Command::Results => {
            shell.refresh_covers().await;
            print!("{}", shell.render_discover());
        }
        Command::Saved { term, sort } => {
            shell.select_tab(Tab::Saved);
            let sort_order = SortOrder::parse(&sort).unwrap_or_else(|| {
                tracing::warn!("Unknown sort order {}, using newest", sort);
                SortOrder::default()
            });
            println!("{}", shell.render_tabs());
            print!(
                "{}",
                shell.render_saved(term.as_deref().unwrap_or_default(), sort_order)
            );
        }
        Command::Save { position } => change_membership(shell, position, true).await?,
        Command::Unsave { position } => change_membership(shell, position, false).await?,
        Command::Filters { clear } => {
            if clear {
                shell.search.clear_filters();
            }
            print!("{}", shell.render_filters());
        }
        Command::Clear => {
            shell.search.clear_persisted();
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry()?;

    let config = AppConfig::load()?;
    tracing::info!("Using backend at {}", config.api_base_url);
    let mut shell = Shell::new(services(&config)?);
    shell.mount().await;

    let result = run(cli.command, &mut shell).await;

    shell.teardown();
    opentelemetry::global::shutdown_tracer_provider();
    result
}
