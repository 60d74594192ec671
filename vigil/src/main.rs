use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vigil_core::{ChannelTransport, Dispatcher, WatchConfig, WatcherRegistry, CHANNEL};

mod cli;
use cli::{Cli, Commands, ListArgs, WatchArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        2.. => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        Commands::List(args) => runtime.block_on(list(args)),
        Commands::Watch(args) => runtime.block_on(watch(args)),
    }
}

async fn list(args: ListArgs) -> Result<()> {
    let listing = vigil_core::list(&args.path).await?;
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

async fn watch(args: WatchArgs) -> Result<()> {
    let (transport, mut rx) = ChannelTransport::new();
    let dispatcher = Dispatcher::new(Arc::new(transport));
    let config = WatchConfig { debounce_ms: args.debounce_ms, ..WatchConfig::default() };
    let mut registry = WatcherRegistry::new(dispatcher, config);

    registry.start("cli", args.paths).await?;
    info!("watching; press Ctrl-C to stop");

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some((channel, payload)) if channel == CHANNEL => println!("{payload}"),
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("stopping watch sessions");
                registry.stop_all().await;
                break;
            }
        }
    }
    Ok(())
}
