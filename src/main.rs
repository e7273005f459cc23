use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;

use mgl::app::App;
use mgl::config::Config;
use mgl::engine::HayroEngine;
use mgl::error::{AppError, AppResult};
use mgl::source::{Source, resolve_url_input};

#[derive(Parser)]
#[command(name = "mgl", version, about = "terminal pdf reader with shareable highlights")]
struct Cli {
    /// URL, DOI, or local file to open on startup.
    source: Option<String>,

    /// Configuration file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write debug logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Jump to this highlight id once the document is ready.
    #[arg(long)]
    highlight: Option<String>,

    /// Highlight store file (defaults to the platform data directory).
    #[arg(long)]
    store: Option<PathBuf>,

    /// Keep highlights in memory only.
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    if let Some(path) = &cli.store {
        config.store.path = path.to_string_lossy().into_owned();
    }
    if cli.ephemeral {
        config.store.ephemeral = true;
    }

    let engine = Arc::new(HayroEngine::new(config.engine_config())?);
    let mut app = App::new_with_config(engine, config);
    if let Some(path) = app.highlights.path() {
        log::info!("highlight store: {}", path.display());
    }

    if let Some(raw) = cli.source.as_deref() {
        open_initial_source(&mut app, raw)?;
    }
    if cli.highlight.is_some() {
        app.state.pending_target = cli.highlight;
    }

    app.run().await
}

fn init_logging(path: &Path) -> AppResult<()> {
    let file = fs::File::create(path).map_err(|source| {
        AppError::io_with_context(
            source,
            format!("failed to create log file: {}", path.display()),
        )
    })?;
    simplelog::WriteLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        file,
    )
    .map_err(|source| AppError::config(source, "initializing logger"))?;
    Ok(())
}

/// A startup argument can be a local file, a URL, or a DOI. Local files
/// are read eagerly so a bad path fails the process instead of the session.
fn open_initial_source(app: &mut App, raw: &str) -> AppResult<()> {
    let path = Path::new(raw);
    if path.is_file() {
        let bytes = fs::read(path).map_err(|source| {
            AppError::io_with_context(source, format!("failed to read {}", path.display()))
        })?;
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| raw.to_string());
        app.change_source(Some(Source::from_bytes(bytes)), Some(label));
        return Ok(());
    }

    let resolved = resolve_url_input(raw);
    if resolved.source.is_none() {
        return Err(AppError::invalid_argument(format!(
            "not a file, url, or doi: {raw}"
        )));
    }
    app.state.pending_target = resolved.highlight_target;
    app.change_source(resolved.source, None);
    Ok(())
}
