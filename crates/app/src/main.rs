use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use exam_core::model::Category;
use services::catalog::SAMPLE_CATEGORY;
use services::{
    CatalogLoader, CatalogProvider, ExamConfig, HttpCatalogProvider, InMemoryCatalogProvider,
    JsonFileCatalogProvider, SessionHandle, SessionRuntime,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod input;
mod render;

use input::{Intent, IntentError};
use render::TerminalResults;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDuration { raw: String },
    ConflictingSources,
    MissingCategory,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDuration { raw } => write!(f, "invalid --duration value: {raw}"),
            ArgsError::ConflictingSources => {
                write!(f, "--url, --file and --sample are mutually exclusive")
            }
            ArgsError::MissingCategory => {
                write!(f, "--category is required with --url or --file")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Sample,
    File(PathBuf),
    Url(String),
}

#[derive(Debug, Default)]
struct Args {
    category: Option<String>,
    source: Option<Source>,
    duration_secs: Option<u32>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--sample] [--duration <secs>]");
    eprintln!("  cargo run -p app -- --category <name> --url <base_url>  [--duration <secs>]");
    eprintln!("  cargo run -p app -- --category <name> --file <path.json> [--duration <secs>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  built-in sample questions, 10 minute countdown");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DURATION_SECS, EXAM_TICK_MS, EXAM_LOAD_ATTEMPTS, EXAM_RETRY_DELAY_MS,");
    eprintln!("  EXAM_SHUFFLE, EXAM_CATALOG_URL, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--category" => parsed.category = Some(require_value(args, "--category")?),
                "--url" => parsed.set_source(Source::Url(require_value(args, "--url")?))?,
                "--file" => {
                    let path = require_value(args, "--file")?;
                    parsed.set_source(Source::File(PathBuf::from(path)))?;
                }
                "--sample" => parsed.set_source(Source::Sample)?,
                "--duration" => {
                    let value = require_value(args, "--duration")?;
                    let secs: u32 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDuration { raw: value.clone() })?;
                    parsed.duration_secs = Some(secs);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn set_source(&mut self, source: Source) -> Result<(), ArgsError> {
        if self.source.is_some() {
            return Err(ArgsError::ConflictingSources);
        }
        self.source = Some(source);
        Ok(())
    }

    /// Flags win over `EXAM_CATALOG_URL`; with neither, the sample catalog.
    fn resolve(self, config: &ExamConfig) -> Result<(Source, Category), ArgsError> {
        let source = self
            .source
            .or_else(|| config.catalog_url.clone().map(Source::Url))
            .unwrap_or(Source::Sample);
        let category = match (&source, self.category) {
            (_, Some(name)) => Category::new(name),
            (Source::Sample, None) => Category::new(SAMPLE_CATEGORY),
            (_, None) => return Err(ArgsError::MissingCategory),
        };
        Ok((source, category))
    }
}

fn build_provider(source: &Source) -> Result<Arc<dyn CatalogProvider>, Box<dyn std::error::Error>> {
    Ok(match source {
        Source::Sample => Arc::new(InMemoryCatalogProvider::sample()),
        Source::File(path) => Arc::new(JsonFileCatalogProvider::new(path.clone())),
        Source::Url(url) => Arc::new(HttpCatalogProvider::new(url)?),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout belongs to the exam renderer.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut config = ExamConfig::from_env()?;
    if let Some(secs) = args.duration_secs {
        config.duration_secs = secs;
    }
    let (source, category) = args.resolve(&config)?;
    info!(?source, %category, duration_secs = config.duration_secs, "starting exam");

    let provider = build_provider(&source)?;
    let loader = CatalogLoader::from_config(provider, &config);
    let (handle, runtime) = SessionRuntime::spawn(loader, &config, Arc::new(TerminalResults));
    let renderer = tokio::spawn(render::follow(handle.subscribe()));

    handle.start(category.clone()).await?;
    drive(&handle, &category).await?;

    // Already closed is fine here.
    let _ = handle.shutdown();
    drop(handle);
    runtime.await?;
    renderer.await?;
    Ok(())
}

/// Forward stdin lines to the session until `quit` or end of input.
async fn drive(handle: &SessionHandle, category: &Category) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let intent = match input::parse(&line) {
            Ok(intent) => intent,
            Err(IntentError::Empty) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        match intent {
            Intent::Quit => break,
            Intent::Help => input::print_help(),
            Intent::Submit => handle.request_submit()?,
            Intent::Confirm => handle.confirm_submit()?,
            Intent::Cancel => handle.cancel_submit()?,
            Intent::Retry => handle.retry_load()?,
            Intent::Restart => {
                handle.start(category.clone()).await?;
            }
            Intent::Select { position, choice } => {
                let snapshot = handle.snapshot();
                let Some(view) = position
                    .checked_sub(1)
                    .and_then(|index| snapshot.questions.get(index))
                else {
                    println!("there is no question {position}");
                    continue;
                };
                match input::resolve_choice(view, &choice) {
                    Some(choice) => handle.select_answer(view.id.clone(), choice)?,
                    None => println!("question {position} has no option {choice:?}"),
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
