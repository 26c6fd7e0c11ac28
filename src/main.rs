// LLM Gateway - multi-provider chat gateway
// Main entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use llm_gateway::config::load_config;
use llm_gateway::providers::{Message, ModelConfig, ProviderRouter};
use llm_gateway::server::GatewayServer;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "llm-gateway")]
#[command(about = "Multi-provider LLM gateway", version)]
struct Args {
    /// Run mode (defaults to `serve`)
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (default: ~/.llm-gateway/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP gateway
    Serve {
        /// Bind address (overrides config and LLM_GATEWAY_BIND)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Send a single prompt through the provider router
    Query {
        /// Model name; decides the provider
        #[arg(long, short)]
        model: String,

        /// Optional system prompt
        #[arg(long)]
        system: Option<String>,

        /// Print fragments as they arrive
        #[arg(long)]
        stream: bool,

        /// Prompt text
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a local .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            let mut config = config;
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            GatewayServer::from_config(config).serve().await
        }
        Command::Query {
            model,
            system,
            stream,
            prompt,
        } => {
            let router = ProviderRouter::from_config(config.providers);
            run_query(&router, model, system, stream, prompt).await
        }
    }
}

/// Initialize tracing with an env-filter (default: INFO, override with RUST_LOG)
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_query(
    router: &ProviderRouter,
    model: String,
    system: Option<String>,
    stream: bool,
    prompt: String,
) -> Result<()> {
    let provider = router.resolve(&model)?;
    let config = ModelConfig::new(model);

    let mut messages = Vec::new();
    if let Some(system) = system {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(prompt));

    if !stream {
        let response = provider.complete(&messages, &config).await?;
        println!("{}", response.content);
        tracing::info!(
            provider = %response.provider,
            model = %response.model,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Query complete"
        );
        return Ok(());
    }

    let mut fragments = provider.stream(&messages, &config).await?;
    let mut stdout = std::io::stdout();
    while let Some(fragment) = fragments.recv().await {
        let fragment = fragment?;
        stdout.write_all(fragment.as_bytes())?;
        stdout.flush().context("Failed to flush stdout")?;
    }
    println!();

    Ok(())
}
