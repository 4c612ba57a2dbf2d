use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use swarm::api::{FetchError, HttpApi, SessionApi};
use swarm::config::{ClientConfig, ConfigError};
use swarm::driver::DriverError;
use swarm::transport::TransportError;
use tracing_subscriber::EnvFilter;

mod simulate;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error(transparent)]
    Payload(#[from] wire::PayloadError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Parser, Debug)]
#[command(name = "swarm-cli", about = "Swarm session API helper and participant emulator")]
struct Cli {
    /// Overrides `SWARM_API_URL`.
    #[arg(long)]
    api_url: Option<String>,

    /// Overrides `SWARM_HTTP_TIMEOUT_SECS`.
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a participant and print the resulting identity.
    Join(JoinArgs),
    /// Print session info.
    Session { session_id: String },
    /// Print question details.
    Question { question_id: String },
    /// Run a host and simulated participants against an in-process broker.
    Simulate(simulate::SimulateArgs),
}

#[derive(Args, Debug)]
struct JoinArgs {
    #[arg(long, short, env = "SWARM_SESSION", default_value = "1")]
    session: String,

    #[arg(long, short, env = "SWARM_USER", default_value = "test.user1")]
    user: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "swarm-cli failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url.trim_end_matches('/').to_owned();
    }
    if let Some(secs) = cli.timeout_secs {
        config.http_timeout = Some(Duration::from_secs(secs));
    }

    match cli.command {
        Command::Join(args) => run_join(&config, args).await,
        Command::Session { session_id } => {
            let info = http(&config)?.fetch_session(&session_id).await?;
            print_json(&serde_json::to_value(info)?)
        }
        Command::Question { question_id } => {
            let api = http(&config)?;
            let record = api.fetch_question(&question_id).await?;
            let image = api.image_url(&record.id);
            let mut value = serde_json::to_value(record)?;
            value["image"] = Value::String(image);
            print_json(&value)
        }
        Command::Simulate(args) => {
            let report = simulate::run(&config, args).await?;
            print_json(&report)
        }
    }
}

fn http(config: &ClientConfig) -> Result<HttpApi, CliError> {
    Ok(HttpApi::new(&config.api_url, config.http_timeout)?)
}

async fn run_join(config: &ClientConfig, args: JoinArgs) -> Result<(), CliError> {
    let api = http(config)?;
    tracing::info!(session = %args.session, user = %args.user, "joining session");
    let participant = api.join_session(&args.session, &args.user).await?;
    let info = api.fetch_session(&args.session).await?;

    print_json(&json!({
        "session_id": args.session,
        "participant_id": participant.id,
        "username": participant.username,
        "question_id": info.question_id,
        "api_url": api.base_url(),
        "broker_url": config.broker_url,
    }))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
