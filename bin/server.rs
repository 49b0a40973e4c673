// Sales Dashboard - Web Server
// Loads the dataset once, then serves the dashboard page and chart API with Axum

use anyhow::{Context, Result};
use clap::Parser;
use sales_dashboard::{server, telemetry, AppContext, Config};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sales-server")]
#[command(about = "Web sales dashboard", long_about = None)]
struct Cli {
    /// Config file path (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Sales CSV to load
    #[arg(short, long, value_name = "CSV")]
    data: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:8050
    #[arg(short, long)]
    addr: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.debug);

    println!("🌐 Sales Dashboard - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::load(cli.config.as_deref())?.with_overrides(cli.data, cli.addr);

    let data_path = config.data_path.clone();
    let ctx = AppContext::load(config)
        .with_context(|| format!("Failed to load sales data from {}", data_path.display()))?;

    println!("✓ Loaded {} sales records", ctx.dataset().len());
    println!("\n🚀 Dashboard: http://{}", ctx.config.bind_addr);
    println!("   Press Ctrl+C to stop\n");

    server::serve(Arc::new(ctx)).await
}
