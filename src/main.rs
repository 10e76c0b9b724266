use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feature_shell::config::{HostConfig, APP_NAME};
use feature_shell::features;
use feature_shell::models::LaunchOutcome;
use feature_shell::App;

#[derive(Parser)]
#[command(name = "fshell")]
#[command(about = "Feature-based application shell")]
struct Cli {
    /// Base folder for settings and temporary files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Initial UI language, e.g. en-us
    #[arg(long, global = true)]
    language: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the application and run until Ctrl-C
    Run {
        /// Passed to every feature when the app starts running
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Print loaded features, published views and localization coverage as JSON
    Diagnostics,
}

/// Initialize tracing with output to stderr
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "feature_shell=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_config(cli: &Cli) -> anyhow::Result<HostConfig> {
    let config = match &cli.data_dir {
        Some(dir) => HostConfig::new(APP_NAME, dir),
        None => HostConfig::from_defaults()?,
    };

    Ok(match &cli.language {
        Some(language) => config.with_language(language),
        None => config,
    })
}

async fn run(mut app: App, args: Vec<String>) -> anyhow::Result<()> {
    app.load(features::builtin())?;

    if app.launch(&args).await? == LaunchOutcome::StartupCancelled {
        tracing::info!("Startup was cancelled; exiting");
        return Ok(());
    }

    let shell = app.host().create_view("IDE.Shell", None);
    match &shell {
        Some(view) => {
            view.attach();
        }
        None => tracing::warn!("Root view could not be created"),
    }

    app.run_until_exit(tokio::signal::ctrl_c).await?;

    drop(shell);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = build_config(&cli)?;
    tracing::debug!("Data directory: {}", config.data_dir().display());

    match cli.command {
        Some(Commands::Run { args }) => run(App::new(config), args).await?,
        Some(Commands::Diagnostics) => {
            let mut app = App::new(config);
            app.load(features::builtin())?;
            println!("{}", serde_json::to_string_pretty(&app.host().diagnostics())?);
        }
        None => run(App::new(config), Vec::new()).await?,
    }

    Ok(())
}
