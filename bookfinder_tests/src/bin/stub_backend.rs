use std::sync::Arc;

use anyhow::Context;
use bookfinder_recommendations::api::BookResult;
use bookfinder_recommendations::books_catalog::{BooksCatalog, InMemoryBooksCatalog};
use bookfinder_saved_books::saved_books_repository::{
    InMemorySavedBooksRepository, SavedBooksRepository,
};

const DEFAULT_PORT: u16 = 8000;

// Based on https://github.com/LukeMathWalker/tracing-actix-web/blob/main/examples/opentelemetry/src/main.rs#L15
fn init_telemetry() -> anyhow::Result<()> {
    use opentelemetry::global;
    use opentelemetry_sdk::propagation::TraceContextPropagator;
    use opentelemetry_sdk::runtime::TokioCurrentThread;
    use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::{EnvFilter, Registry};

    let app_name = "bookfinder_stub_backend";

    global::set_text_map_propagator(TraceContextPropagator::new());
    #[allow(deprecated)]
    let tracer = opentelemetry_jaeger::new_agent_pipeline()
        .with_service_name(app_name)
        .install_batch(TokioCurrentThread)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
    let formatting_layer = BunyanFormattingLayer::new(app_name.into(), std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(telemetry)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn book(title: &str, author: &str, genre: &str, language: &str, level: &str) -> BookResult {
    BookResult {
        genre: Some(genre.to_string()),
        description: Some(format!("A {} classic by {}", genre.to_lowercase(), author)),
        language: Some(language.to_string()),
        target_audience: Some("adult".to_string()),
        book_type: Some("fiction".to_string()),
        content_type: Some("novel".to_string()),
        reading_level: Some(level.to_string()),
        ..BookResult::new(title, author)
    }
}

/// Small catalog so the stub answers something sensible to common queries
fn seed_catalog() -> Vec<BookResult> {
    vec![
        book("The Hound of the Baskervilles", "Arthur Conan Doyle", "Mystery", "English", "intermediate"),
        book("Murder on the Orient Express", "Agatha Christie", "Mystery", "English", "intermediate"),
        book("Le Comte de Monte-Cristo", "Alexandre Dumas", "Adventure", "French", "advanced"),
        book("Dune", "Frank Herbert", "Science Fiction", "English", "advanced"),
        book("Cien años de soledad", "Gabriel García Márquez", "Magical Realism", "Spanish", "advanced"),
        book("The Little Prince", "Antoine de Saint-Exupéry", "Fable", "English", "beginner"),
        book("Der Process", "Franz Kafka", "Literary Fiction", "German", "advanced"),
        book("Emma", "Jane Austen", "Romance", "English", "intermediate"),
    ]
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    use actix_web::web::Data;
    use actix_web::{App, HttpServer};
    use paperclip::actix::OpenApiExt;
    use tracing_actix_web::TracingLogger;

    init_telemetry()?;
    let port = match std::env::var("BOOKFINDER_STUB_PORT") {
        Ok(port) => port.parse().context("Invalid BOOKFINDER_STUB_PORT")?,
        Err(_) => DEFAULT_PORT,
    };

    let catalog: Arc<dyn BooksCatalog> = Arc::new(InMemoryBooksCatalog::with_books(seed_catalog()));
    let saved_books: Arc<dyn SavedBooksRepository> =
        Arc::new(InMemorySavedBooksRepository::default());

    tracing::info!("Starting stub backend at http://localhost:{}", port);
    HttpServer::new(move || {
        App::new()
            .wrap_api()
            .wrap(TracingLogger::default())
            .app_data(Data::new(catalog.clone()))
            .app_data(Data::new(saved_books.clone()))
            .configure(bookfinder_recommendations::app_config::config_app)
            .configure(bookfinder_saved_books::app_config::config_app)
            .with_json_spec_at("/apispec/v2")
            .build()
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    opentelemetry::global::shutdown_tracer_provider();
    Ok(())
}
