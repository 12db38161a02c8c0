use clap::{Parser, Subcommand};
use smsgw::{telemetry, Config};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about = "a minimal SMS gateway", long_about = None)]
struct Cli {
    #[command(flatten)]
    args: smsgw::config::Args,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs the REST API server
    Api,
    /// Starts a worker node for sms request handling
    Worker,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.args)?;

    telemetry::init_telemetry()?;

    match cli.command {
        Command::Api => {
            smsgw::run_api(config, async {
                tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
            })
            .await
        }
        Command::Worker => {
            let shutdown = CancellationToken::new();
            let signal_token = shutdown.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
                signal_token.cancel();
            });
            smsgw::run_worker(config, shutdown).await
        }
    }
}
