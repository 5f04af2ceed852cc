#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that opens a hex map with fog of war in a window.
//!
//! Besides the interactive window, the binary can print the saved map as a
//! share code and import a share code into the save file.

mod config;
mod session;
mod sinks;
mod state_transfer;

use std::{path::PathBuf, sync::mpsc};

use anyhow::{bail, Context, Result};
use clap::Parser;
use hexfog_core::Settings;
use hexfog_engine::Engine;
use hexfog_rendering::{Color, Presentation, RenderingBackend};
use hexfog_rendering_macroquad::MacroquadBackend;
use tracing_subscriber::EnvFilter;

use crate::{
    config::AppConfig,
    session::Session,
    sinks::{JsonFileStore, NoticeFeed},
};

/// Command-line arguments for the hex map.
#[derive(Debug, Parser)]
#[command(name = "hexfog", about = "Hex grid map with fog of war", version)]
struct CliArgs {
    /// File the map state is saved to and restored from.
    #[arg(long, value_name = "PATH", default_value = "hexfog-state.json")]
    state: PathBuf,
    /// Background map image.
    #[arg(long, value_name = "PATH")]
    map: Option<PathBuf>,
    /// Optional TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log filter, for example `debug` or `hexfog_engine=trace`. Overrides `RUST_LOG`.
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
    /// Disables vertical sync.
    #[arg(long)]
    no_vsync: bool,
    /// Logs frames per second once a second.
    #[arg(long)]
    show_fps: bool,
    /// Prints the saved map as a share code and exits.
    #[arg(long, conflicts_with = "import")]
    export: bool,
    /// Imports a share code into the save file and exits.
    #[arg(long, value_name = "CODE")]
    import: Option<String>,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_level.as_deref())?;

    let config = AppConfig::load(args.config.as_deref())?;
    let (defaults, warnings) = config.defaults.resolve();
    for warning in &warnings {
        tracing::warn!(%warning, "adjusted configured default");
    }

    let store = JsonFileStore::new(&args.state);
    if args.export {
        return export(&store, &defaults);
    }
    if let Some(code) = args.import.as_deref() {
        return import(&config, defaults, store, code);
    }

    let (sender, receiver) = mpsc::channel();
    let mut engine = Engine::new(
        config.engine_config(defaults),
        store,
        NoticeFeed::forwarding(sender),
    );
    engine.boot();
    let mut session = Session::new(engine, receiver, args.map);

    let presentation = Presentation::new(
        config.window.title.as_str(),
        Color::from_rgb_u8(0x1E, 0x1E, 0x24),
        config.window.width,
        config.window.height,
    );
    MacroquadBackend::new()
        .with_vsync(!args.no_vsync)
        .with_show_fps(args.show_fps)
        .run(presentation, move |input, layers| session.frame(input, layers))
}

fn init_tracing(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter `{directives}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!(error))
        .context("failed to install the log subscriber")
}

fn export(store: &JsonFileStore, defaults: &Settings) -> Result<()> {
    let Some(raw) = store.read()? else {
        bail!("no saved map at {}", store.path().display());
    };
    let loaded = raw.into_lenient(defaults);
    for warning in &loaded.warnings {
        tracing::warn!(%warning, "adjusted saved value");
    }
    println!("{}", state_transfer::encode(&loaded.state)?);
    Ok(())
}

fn import(config: &AppConfig, defaults: Settings, store: JsonFileStore, code: &str) -> Result<()> {
    let raw = state_transfer::decode(code).context("could not read share code")?;
    let path = store.path().to_owned();
    let mut engine = Engine::new(config.engine_config(defaults), store, NoticeFeed::log_only());
    engine.boot();
    engine
        .import_state(raw)
        .with_context(|| format!("share code was not imported into {}", path.display()))?;
    tracing::info!(path = %path.display(), "share code imported");
    Ok(())
}
