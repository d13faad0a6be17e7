//! tvctl — command-line remote for Samsung Tizen televisions.
//!
//! ```text
//! tvctl KEY_VOLUP KEY_VOLUP      Press keys on the configured TV
//! tvctl --host 10.0.0.7 KEY_HOME Override the TV address
//! tvctl                          Pair only (stores the token)
//! tvctl --gen-config             Dump default config and exit
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tvctl::config::CliConfig;
use tvctl::session;
use tvctl_core::{RemoteController, WsTransportFactory};

/// How long Ctrl-C waits for the TV to close the socket.
const SHUTDOWN_WAIT: Duration = Duration::from_secs(2);

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tvctl", about = "Samsung TV remote control over WebSocket")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "tvctl.toml")]
    config: PathBuf,

    /// TV host name or IP address (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Do not write tokens handed out by the TV back to the config file.
    #[arg(long)]
    no_save: bool,

    /// Keys to press, in order. Example: KEY_VOLUP
    keys: Vec<String>,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&CliConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = CliConfig::load(&cli.config);
    if let Some(host) = cli.host {
        config.remote.host = host;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("tvctl v{}", env!("CARGO_PKG_VERSION"));
    info!("tv: {}:{}", config.remote.host, config.remote.port);

    let (remote, mut events) =
        RemoteController::spawn(config.remote.clone(), WsTransportFactory);

    let config_path = cli.config;
    let no_save = cli.no_save;
    let session_config = config.session.clone();
    let on_token = |token: &str| {
        if config.remote.token() == Some(token) {
            return;
        }
        config.remote.token = Some(token.to_owned());
        if no_save {
            info!("new token received; not saved (--no-save)");
            return;
        }
        match config.save(&config_path) {
            Ok(()) => info!("token saved to {}", config_path.display()),
            Err(e) => warn!("could not save token to {}: {e}", config_path.display()),
        }
    };

    let outcome = tokio::select! {
        result = session::run(&remote, &mut events, &cli.keys, &session_config, on_token) => {
            Some(result)
        }
        _ = tokio::signal::ctrl_c() => None,
    };

    match outcome {
        Some(Ok(report)) => {
            info!("done; {} key(s) sent", report.written.len());
            Ok(())
        }
        Some(Err(e)) => {
            error!("{e}");
            if let Err(e) = session::shutdown(&remote, &mut events, SHUTDOWN_WAIT).await {
                warn!("{e}");
            }
            Err(e.into())
        }
        None => {
            info!("Ctrl-C received — disconnecting");
            session::shutdown(&remote, &mut events, SHUTDOWN_WAIT).await?;
            Ok(())
        }
    }
}
