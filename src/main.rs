use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use padmacro::config::Profile;
use padmacro::daemon::Daemon;
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "padmacro",
    about = "Dispatches gamepad button edges to timed key macros",
    version
)]
struct Args {
    /// Profile to load (default: <config dir>/padmacro/profile.toml)
    #[arg(long)]
    profile: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup()?;

    let profile = load_profile(args.profile).await?;

    let daemon = Daemon::configure(&profile)
        .map_err(|e| eyre!("Failed to configure profile '{}': {}", profile.name, e))?
        .start();

    // Ctrl-C beendet die Schleife, laufende Macros werden noch zu Ende ausgeführt
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => signal_token.cancel(),
            Err(e) => warn!("Unable to listen for Ctrl-C: {}", e),
        }
    });

    info!("Reading button edges from stdin ('press A', 'release A', 'quit')");
    let stdin = BufReader::new(tokio::io::stdin());
    let stopped = daemon
        .run_until_shutdown(stdin, shutdown)
        .await
        .map_err(|e| eyre!("Daemon failed: {}", e))?;

    info!(
        "Daemon '{}' stopped after {} button events, {} key edges emitted",
        stopped.name(),
        stopped.handled_events(),
        stopped.emitted_edges()
    );
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

/// Profile from `--profile <path>`, otherwise the default location.
/// A missing default profile falls back to the built-in bindings.
async fn load_profile(explicit: Option<PathBuf>) -> Result<Profile> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let path = Profile::default_path();
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                warn!(
                    "No profile at {}, using built-in default bindings",
                    path.display()
                );
                return Ok(Profile::default());
            }
            path
        }
    };

    Profile::load(&path)
        .await
        .map_err(|e| eyre!("Failed to load profile {}: {}", path.display(), e))
}
