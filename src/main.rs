// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sales_dashboard::{render_chart, telemetry, AppContext, BarMode, ChartId, Config, ControlState};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sales-dashboard")]
#[command(about = "Sales analytics dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path (TOML)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Sales CSV to load
    #[arg(short, long, value_name = "CSV", global = true)]
    data: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Log file used while the terminal dashboard is open
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal dashboard (default)
    Tui,
    /// Print one chart's figure JSON
    Render {
        /// line-chart, bar-chart, pie-chart or scatter-chart
        chart: ChartId,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        bar_mode: Option<BarMode>,
    },
    /// Print dataset summary: records, years, countries
    Summary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal, so its logs go to a file
    if matches!(cli.command, None | Some(Commands::Tui)) {
        let log_path = cli.log_file.clone().unwrap_or_else(telemetry::default_log_path);
        telemetry::init_file_tracing(cli.debug, &log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
        println!("📝 Logging to {}", log_path.display());
    } else {
        telemetry::init_tracing(cli.debug);
    }

    let config = Config::load(cli.config.as_deref())?.with_overrides(cli.data, None);
    let data_path = config.data_path.clone();
    let ctx = Arc::new(
        AppContext::load(config)
            .with_context(|| format!("Failed to load sales data from {}", data_path.display()))?,
    );

    match cli.command {
        Some(Commands::Render {
            chart,
            year,
            country,
            bar_mode,
        }) => run_render(&ctx, chart, year, country, bar_mode)?,
        Some(Commands::Summary) => run_summary(&ctx),
        Some(Commands::Tui) | None => run_ui_mode(ctx)?,
    }

    Ok(())
}

fn run_render(
    ctx: &AppContext,
    chart: ChartId,
    year: Option<i32>,
    country: Option<String>,
    bar_mode: Option<BarMode>,
) -> Result<()> {
    let defaults = ctx.default_state();
    let state = ControlState {
        year: year.unwrap_or(defaults.year),
        country: country.unwrap_or(defaults.country),
        bar_mode: bar_mode.unwrap_or(defaults.bar_mode),
    };

    let figure = render_chart(ctx.dataset(), &state, chart);
    println!("{}", serde_json::to_string_pretty(&figure)?);

    Ok(())
}

fn run_summary(ctx: &AppContext) {
    let dataset = ctx.dataset();
    let years: Vec<String> = dataset.years().iter().map(|y| y.to_string()).collect();

    println!("📊 Sales dataset: {}", ctx.config.data_path.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Records:          {}", dataset.len());
    println!("✓ Years:            {}", years.join(", "));
    println!("✓ Countries:        {}", dataset.countries().join(", "));
    println!("✓ Undefined months: {}", dataset.undefined_month_count());
}

#[cfg(feature = "tui")]
fn run_ui_mode(ctx: Arc<AppContext>) -> Result<()> {
    println!("🖥️  Starting Sales Dashboard... (Press 'q' to quit)\n");

    let mut app = ui::App::new(sales_dashboard::Dashboard::new(ctx));
    ui::run_ui(&mut app)?;

    println!("\n✅ Dashboard closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_ctx: Arc<AppContext>) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web dashboard: cargo run --bin sales-server --features server");
    std::process::exit(1);
}
