use anyhow::Result;
use clap::{Parser, Subcommand};
use definitive_ai::{transport, Config};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "definitive")]
#[command(author, version, about = "Definitive AI - ask several LLMs, get one answer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Answer one prompt with a deployment and print the reply
    Ask {
        /// Deployment name (e.g. compare-llms, definitive, quick-answer)
        deployment: String,

        /// The prompt
        prompt: String,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// List configured deployments
    Deployments,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "definitive_ai=debug,definitive=debug,llm=debug"
    } else {
        "definitive_ai=info,definitive=info,llm=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            tracing::info!(
                "Starting HTTP server on {}:{}",
                config.server.host,
                config.server.port
            );
            transport::http::run_http_server(&config).await?;
        }
        Commands::Ask {
            deployment,
            prompt,
            json,
        } => {
            let ok = transport::cli::run_ask(&config, &deployment, &prompt, json).await?;
            if !ok {
                std::process::exit(1);
            }
        }
        Commands::Deployments => {
            transport::cli::run_deployments(&config)?;
        }
    }

    Ok(())
}
