use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use labsrelay_common::models::Channel;
use labsrelay_core::platforms::streamlabs::StreamlabsSocket;
use labsrelay_core::{BusMessage, EventRelay, LocalObservers, MessageBus, RelayConfig};

#[derive(Parser, Debug, Clone)]
#[command(name = "labsrelay")]
#[command(author, version, about = "Relays the Streamlabs socket feed as normalized JSON lines")]
struct Args {
    /// Path to a JSON config file (defaults to ./labsrelay.json, then the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Streamlabs socket API token; overrides the config file
    #[arg(long, env = "STREAMLABS_SOCKET_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Only print bus messages for these channels (repeatable)
    #[arg(long = "channel", value_parser = parse_channel)]
    channels: Vec<Channel>,
}

fn parse_channel(s: &str) -> Result<Channel, String> {
    s.parse()
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("labsrelay=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).with_writer(std::io::stderr).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {e}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let config = match RelayConfig::resolve(args.config.as_deref(), args.token.clone()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("No usable socket_token in the config ({}). Exiting.", e);
            return Err(e.into());
        }
    };
    info!("labsrelay starting. url={}", config.socket.url);

    // 1) Sinks
    let bus = Arc::new(MessageBus::new());
    let observers = Arc::new(LocalObservers::new());
    observers.on_any(|channel, _payload| debug!("observer <- {}", channel));

    // 2) Stdout writer draining the bus
    let writer = tokio::spawn(write_lines(bus.subscribe(), args.channels.clone()));

    // 3) Socket runtime
    let relay = EventRelay::new(bus.clone(), observers.clone());
    let mut socket = StreamlabsSocket::new(&config, relay, bus.shutdown_rx.clone());

    let mut status_rx = socket.status();
    tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow_and_update().clone();
            info!("Streamlabs connection status: {:?}", status);
        }
    });

    let mut socket_task = tokio::spawn(async move { socket.start_loop().await });

    let outcome = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down.");
            bus.shutdown();
            socket_task.await
        }
        res = &mut socket_task => {
            bus.shutdown();
            res
        }
    };

    drop(bus);
    if let Err(e) = writer.await {
        warn!("stdout writer ended abnormally: {:?}", e);
    }

    match outcome {
        Ok(Ok(())) => {
            info!("labsrelay finished. Goodbye!");
            Ok(())
        }
        Ok(Err(e)) => {
            error!("Socket runtime error: {}", e);
            Err(e.into())
        }
        Err(join_err) => Err(join_err.into()),
    }
}

/// One JSON object per line per bus message, optionally filtered by channel.
async fn write_lines(mut rx: mpsc::UnboundedReceiver<BusMessage>, channels: Vec<Channel>) {
    let mut stdout = tokio::io::stdout();
    while let Some(msg) = rx.recv().await {
        if !channels.is_empty() && !channels.iter().any(|c| c.as_str() == msg.channel) {
            continue;
        }
        let mut line = match serde_json::to_string(&msg) {
            Ok(line) => line,
            Err(e) => {
                warn!("could not serialize bus message on '{}': {}", msg.channel, e);
                continue;
            }
        };
        line.push('\n');
        if let Err(e) = stdout.write_all(line.as_bytes()).await {
            error!("stdout closed: {}", e);
            break;
        }
        let _ = stdout.flush().await;
    }
}
