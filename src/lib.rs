// Sales Dashboard - Core Library
// Exposes all modules for use in the terminal dashboard, web server, and tests

pub mod error;
pub mod dataset;     // Dataset Store - load once, read many
pub mod aggregate;   // Filter/Aggregate Functions
pub mod charts;      // Chart Renderers
pub mod bindings;    // Reactive Binding Layer
pub mod context;     // Application context (replaces global state)
pub mod config;
pub mod telemetry;

#[cfg(feature = "server")]
pub mod server;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use error::{LoadError, LoadResult};
pub use dataset::{Dataset, Encoding, Month, SalesRecord, REQUIRED_COLUMNS};
pub use aggregate::{
    BarMode, ControlState, Summary,
    MonthlySales, ProductLineSales, DealSizeShare, ScatterPoint,
    monthly_sales, sales_by_product_line, deal_size_share, price_vs_sales,
};
pub use charts::{
    Figure, Trace, Layout,
    line_chart, bar_chart, pie_chart, scatter_chart, placeholder,
};
pub use bindings::{
    ChartId, ControlId, ControlChange, ChartUpdate, Dashboard,
    BINDINGS, dependents, controls_for, render_chart, apply_change,
};
pub use context::{AppContext, DashboardOptions};
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
