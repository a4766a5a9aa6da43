use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::Server;
use shared::{DEFAULT_HANDSHAKE_REPEAT, DEFAULT_PORT, DEFAULT_STEP_SIZE, DEFAULT_TICK_MS};
use std::time::Duration;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// UDP port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Broadcast period in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_TICK_MS, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,

    /// Copies sent of each handshake reply
    #[arg(short = 'r', long, default_value_t = DEFAULT_HANDSHAKE_REPEAT, value_parser = clap::value_parser!(u32).range(1..))]
    handshake_repeat: u32,

    /// Vertical distance moved per MovePosition request
    #[arg(short, long, default_value_t = DEFAULT_STEP_SIZE)]
    step_size: f32,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            tick_duration: Duration::from_millis(args.tick_ms),
            handshake_repeat: args.handshake_repeat,
            step_size: args.step_size,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = ServerConfig::from(args);
    info!(
        "Tick {:?}, handshake repeat {}, step {}",
        config.tick_duration, config.handshake_repeat, config.step_size
    );

    let mut server = Server::new(config).await?;
    let handle = server.handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
        handle.shutdown();
    });

    server.run().await
}
