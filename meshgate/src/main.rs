mod seed;
mod server;

use clap::{Parser, Subcommand};
use meshgate_core::conf::{self, GatewayConfig};
use meshgate_core::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "meshgate", version, about = "meshgate: service-mesh edge API gateway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a config file and exit
    Check {
        #[arg(long, default_value = "config/meshgate.yaml")]
        config: String,
    },

    /// Run the gateway (default)
    Run {
        /// Path to the gateway config file
        #[arg(long)]
        config: Option<String>,

        /// Optional registry seed file (services, instances, rules)
        #[arg(long)]
        seed: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Check { config }) => {
            conf::load(&config)?;
            println!("config ok: {config}");
            Ok(())
        }

        Some(Command::Run { config, seed }) => run(config, seed),

        None => run(None, None),
    }
}

fn run(config: Option<String>, seed: Option<String>) -> anyhow::Result<()> {
    let cfg = match &config {
        Some(path) => conf::load(path)?,
        None => GatewayConfig::default(),
    };

    init_logging(&cfg.log);
    tracing::info!(event = "gateway_starting", port = cfg.port, gray = cfg.gray);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::run(cfg, seed))
}
