use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::sync::Arc;

use rhizome_canopy::config::{CanopyConfig, Config, ConfigOverrides};
use rhizome_canopy::events::EventChannel;
use rhizome_canopy::parser::ParserBridge;
use rhizome_canopy::serve::{AppState, run_server};
use rhizome_canopy::watch;

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Live syntax-tree viewer for external parsers")]
struct Cli {
    /// Port to host the viewer on; an OS-provided port if unspecified
    #[arg(short, long)]
    port: Option<u16>,

    /// Root directory of the language files to view
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Lua executable path
    #[arg(long)]
    lua: Option<PathBuf>,

    /// Main parser script
    #[arg(long)]
    main: Option<PathBuf>,

    /// Default entry rule
    #[arg(long)]
    entry: Option<String>,

    /// Directory to serve the viewer's static assets from
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Print parser diagnostics to the console
    #[arg(long)]
    log: bool,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Match the help-on-bare-invocation behavior of the original tooling.
    if std::env::args().nth(1).is_none() {
        let _ = Cli::command().print_help();
        return;
    }

    let cli = Cli::parse();
    let overrides = ConfigOverrides {
        port: cli.port,
        root: cli.root,
        lua: cli.lua,
        main: cli.main,
        entry: cli.entry,
        assets: cli.assets,
        log: cli.log,
    };

    let file = CanopyConfig::load(std::path::Path::new("."));
    let config = match Config::resolve(overrides, file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    let events = Arc::new(EventChannel::new());
    watch::spawn_watchers(&config, events.clone());

    let state = Arc::new(AppState {
        bridge: ParserBridge::new(&config),
        config,
        events,
    });

    if let Err(e) = run_server(state).await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
