use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wellspring_agents::{AssistantRuntime, ChatMessage, LlmGateway, TogetherProvider};
use wellspring_config::{AppConfig, ConfigLoader};
use wellspring_db::WellnessStore;
use wellspring_gateway::AppState;

#[derive(Parser)]
#[command(name = "wellspring", about = "LLM-backed wellness assistant service")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server.
    Serve {
        /// Bind address, overriding the configured host and port.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Create the database schema and seed the challenge catalog.
    InitDb,
    /// Send one small completion to verify the provider credential.
    CheckApi,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Serve { bind } => serve(config, bind).await,
        Command::InitDb => init_db(config),
        Command::CheckApi => check_api(config).await,
    }
}

async fn serve(config: AppConfig, bind: Option<SocketAddr>) -> anyhow::Result<()> {
    let addr = match bind {
        Some(addr) => addr,
        None => format!("{}:{}", config.gateway.host, config.gateway.port)
            .parse()
            .context("invalid gateway host/port in configuration")?,
    };

    let store = WellnessStore::open(&config.db_path()).context("opening wellness store")?;
    store
        .ensure_default_challenges()
        .context("seeding challenge catalog")?;
    let store = Arc::new(Mutex::new(store));

    let provider = TogetherProvider::new(
        config.llm.api_key.clone(),
        Some(config.llm.base_url.clone()),
    );
    let gateway = LlmGateway::new(Arc::new(provider), &config.llm.api_key);
    let runtime = AssistantRuntime::new(
        gateway,
        Arc::clone(&store),
        config.llm.text_model.clone(),
        config.llm.vision_model.clone(),
        config.llm.history_token_budget,
    );

    info!(
        text_model = %config.llm.text_model,
        vision_model = %config.llm.vision_model,
        "starting wellspring gateway"
    );

    let state = Arc::new(AppState {
        config,
        runtime,
        store,
    });
    wellspring_gateway::serve(state, addr).await?;
    Ok(())
}

fn init_db(config: AppConfig) -> anyhow::Result<()> {
    let db_path = config.db_path();
    let store = WellnessStore::open(&db_path).context("opening wellness store")?;
    store
        .ensure_default_challenges()
        .context("seeding challenge catalog")?;
    println!("database ready at {}", db_path.display());
    Ok(())
}

async fn check_api(config: AppConfig) -> anyhow::Result<()> {
    let provider = TogetherProvider::new(
        config.llm.api_key.clone(),
        Some(config.llm.base_url.clone()),
    );
    let gateway = LlmGateway::new(Arc::new(provider), &config.llm.api_key);

    let reply = gateway
        .complete_text(
            &config.llm.text_model,
            vec![ChatMessage::user("Say OK.")],
            0.0,
            8,
        )
        .await
        .context("completion request failed")?;

    println!("API check passed: {}", reply.trim());
    Ok(())
}
