use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parley::{config, gateway, prompt};

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "A multi-persona conversation relay for local LLM backends")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP relay
    Serve {
        /// Port to bind to (overrides config)
        #[arg(short, long, env = "PARLEY_PORT")]
        port: Option<u16>,

        /// Bind address (overrides config)
        #[arg(short, long, env = "PARLEY_BIND")]
        bind: Option<String>,
    },

    /// Print the built-in prompt template
    Template,

    /// Show version and effective configuration
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, bind } => {
            let mut config = config::load()?;
            if let Some(port) = port {
                config.gateway.port = port;
            }
            if let Some(bind) = bind {
                config.gateway.bind = bind;
            }
            gateway::run(config).await
        }
        Commands::Template => {
            println!("{}", prompt::DEFAULT_TEMPLATE);
            Ok(())
        }
        Commands::Status => {
            let config = config::load()?;
            println!("parley v{}", env!("CARGO_PKG_VERSION"));
            println!("listen: {}:{}", config.gateway.bind, config.gateway.port);
            println!("backend: {}", config.inference.base_url);
            println!("context window: {}", config.conversation.context_window);
            Ok(())
        }
    }
}
