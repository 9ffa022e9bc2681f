//! LLRP reader client: entry point.
//!
//! ```text
//! llrp-reader                    Connect using llrp-reader.toml
//! llrp-reader --config <path>    Load a custom config TOML
//! llrp-reader --host <h> --port <p>
//! llrp-reader --json             Print tags as JSON lines
//! llrp-reader --gen-config       Write default config to stdout
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use llrp_reader::config::ReaderConfig;
use llrp_reader::service::ReaderService;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "llrp-reader", about = "Print tag observations from an LLRP RFID reader")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "llrp-reader.toml")]
    config: PathBuf,

    /// Reader host, overriding the config file.
    #[arg(long)]
    host: Option<String>,

    /// Reader LLRP port, overriding the config file.
    #[arg(long)]
    port: Option<u16>,

    /// Print tags as JSON lines.
    #[arg(long)]
    json: bool,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&ReaderConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = ReaderConfig::load(&cli.config);
    if let Some(host) = cli.host {
        config.reader.host = host;
    }
    if let Some(port) = cli.port {
        config.reader.port = port;
    }
    config.output.json |= cli.json;

    // Init tracing. Logs go to stderr so stdout carries only tags.
    let filter = if config.logging.enabled {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    } else {
        EnvFilter::new("off")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("llrp-reader v{}", env!("CARGO_PKG_VERSION"));
    info!("reader: {}:{}", config.reader.host, config.reader.port);
    info!("reconnect delay: {:?}", config.reconnect_delay());

    let service = ReaderService::new(config);
    let stop = service.stop_handle();

    // Ctrl-C handler.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        stop.notify_one();
    });

    service.run().await;

    Ok(())
}
