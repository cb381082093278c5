use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use federation_broker::domain::federation_model::intercomponent::tcp_channel::serve;
use federation_broker::domain::federation_model::utils::statistics;
use federation_broker::{generate_broker, logger};

#[derive(Parser, Debug)]
#[command(name = "federation_broker", version, about = "Resource broker of one federation member")]
struct Cli {
    /// Path to the broker configuration (JSON).
    #[arg(short, long)]
    config: String,

    /// Overrides RUST_LOG, e.g. "debug".
    #[arg(long)]
    log_level: Option<String>,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Could not listen for Ctrl-C: {}", e);
    }
    log::info!("Shutdown requested.");
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger::init(cli.log_level.as_deref());
    log::info!("Logger initialized. Starting broker.");

    let (config, mut broker) = generate_broker(&cli.config)?;
    broker.start_processors()?;

    // Built by hand: blocking HTTP clients must not be created inside an async main.
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().thread_name("rpc-server").build().context("Could not start the async runtime")?;

    let listen_address = config.rpc.as_ref().and_then(|rpc| rpc.listen_address.clone());
    runtime.block_on(async {
        match listen_address {
            Some(address) => {
                let listener = TcpListener::bind(&address).await.with_context(|| format!("Could not listen on {}", address))?;
                log::info!("Member {} accepts peer requests on {}.", broker.local_member_id(), address);
                serve(listener, broker.remote_facade(), shutdown_signal()).await;
            }
            None => {
                log::info!("No RPC listen address configured, serving local requests only.");
                shutdown_signal().await;
            }
        }
        Ok::<(), anyhow::Error>(())
    })?;

    broker.stop_processors();
    statistics::flush_global();
    log::info!("Broker {} stopped.", broker.local_member_id());
    Ok(())
}
