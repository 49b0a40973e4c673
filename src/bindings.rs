// 🔗 Reactive Binding Layer
// Explicit control -> chart dependency table plus one dispatch routine.
// A control change re-renders exactly the charts bound to that control.

use crate::aggregate::{
    deal_size_share, monthly_sales, price_vs_sales, sales_by_product_line, BarMode, ControlState,
};
use crate::charts::{bar_chart, line_chart, pie_chart, scatter_chart, Figure};
use crate::context::AppContext;
use crate::dataset::Dataset;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// IDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlId {
    YearSelector,
    BarStyle,
    CountrySelector,
}

impl ControlId {
    pub const ALL: [ControlId; 3] = [
        ControlId::YearSelector,
        ControlId::BarStyle,
        ControlId::CountrySelector,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlId::YearSelector => "year-selector",
            ControlId::BarStyle => "bar-style",
            ControlId::CountrySelector => "country-selector",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChartId {
    #[serde(rename = "line-chart")]
    Line,
    #[serde(rename = "bar-chart")]
    Bar,
    #[serde(rename = "pie-chart")]
    Pie,
    #[serde(rename = "scatter-chart")]
    Scatter,
}

impl ChartId {
    /// Panel order: line, bar on the first row; pie, scatter on the second
    pub const ALL: [ChartId; 4] = [ChartId::Line, ChartId::Bar, ChartId::Pie, ChartId::Scatter];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartId::Line => "line-chart",
            ChartId::Bar => "bar-chart",
            ChartId::Pie => "pie-chart",
            ChartId::Scatter => "scatter-chart",
        }
    }

    fn index(&self) -> usize {
        match self {
            ChartId::Line => 0,
            ChartId::Bar => 1,
            ChartId::Pie => 2,
            ChartId::Scatter => 3,
        }
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartId::ALL
            .iter()
            .copied()
            .find(|chart| chart.as_str() == s || chart.as_str().trim_end_matches("-chart") == s)
            .ok_or_else(|| format!("unknown chart '{}'", s))
    }
}

// ============================================================================
// DEPENDENCY TABLE
// ============================================================================

/// Which charts depend on which control. No chart depends on anything else.
pub const BINDINGS: &[(ControlId, &[ChartId])] = &[
    (ControlId::YearSelector, &[ChartId::Line, ChartId::Bar, ChartId::Scatter]),
    (ControlId::BarStyle, &[ChartId::Bar]),
    (ControlId::CountrySelector, &[ChartId::Pie]),
];

pub fn dependents(control: ControlId) -> &'static [ChartId] {
    BINDINGS
        .iter()
        .find(|(id, _)| *id == control)
        .map(|(_, charts)| *charts)
        .unwrap_or(&[])
}

/// Inverse lookup: the controls a chart reads
pub fn controls_for(chart: ChartId) -> Vec<ControlId> {
    BINDINGS
        .iter()
        .filter(|(_, charts)| charts.contains(&chart))
        .map(|(control, _)| *control)
        .collect()
}

// ============================================================================
// CONTROL CHANGES
// ============================================================================

/// A new value for one control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "control", content = "value")]
pub enum ControlChange {
    #[serde(rename = "year-selector")]
    Year(i32),
    #[serde(rename = "bar-style")]
    BarMode(BarMode),
    #[serde(rename = "country-selector")]
    Country(String),
}

impl ControlChange {
    pub fn control(&self) -> ControlId {
        match self {
            ControlChange::Year(_) => ControlId::YearSelector,
            ControlChange::BarMode(_) => ControlId::BarStyle,
            ControlChange::Country(_) => ControlId::CountrySelector,
        }
    }

    fn apply(self, state: &mut ControlState) {
        match self {
            ControlChange::Year(year) => state.year = year,
            ControlChange::BarMode(mode) => state.bar_mode = mode,
            ControlChange::Country(country) => state.country = country,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartUpdate {
    pub chart: ChartId,
    pub figure: Figure,
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Run the filter/aggregate + renderer pair for one chart
pub fn render_chart(dataset: &Dataset, state: &ControlState, chart: ChartId) -> Figure {
    let figure = match chart {
        ChartId::Line => line_chart(&monthly_sales(dataset, state.year), state.year),
        ChartId::Bar => bar_chart(&sales_by_product_line(dataset, state.year), state.bar_mode),
        ChartId::Pie => pie_chart(&deal_size_share(dataset, &state.country), &state.country),
        ChartId::Scatter => scatter_chart(&price_vs_sales(dataset, state.year), state.year),
    };

    if figure.is_placeholder() {
        debug!(chart = %chart, title = figure.title(), "No rows matched, rendering placeholder");
    }

    figure
}

/// Stateless dispatch: apply `change` to `state` and render its dependents
pub fn apply_change(dataset: &Dataset, state: &mut ControlState, change: ControlChange) -> Vec<ChartUpdate> {
    let charts = dependents(change.control());
    debug!(control = change.control().as_str(), ?charts, "Dispatching control change");

    change.apply(state);

    charts
        .iter()
        .map(|&chart| ChartUpdate {
            chart,
            figure: render_chart(dataset, state, chart),
        })
        .collect()
}

// ============================================================================
// DASHBOARD SESSION
// ============================================================================

/// One viewer's dashboard: control state plus the figure shown in each panel
pub struct Dashboard {
    ctx: Arc<AppContext>,
    state: ControlState,
    figures: [Figure; 4],
}

impl Dashboard {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        let state = ctx.default_state();
        Self::with_state(ctx, state)
    }

    pub fn with_state(ctx: Arc<AppContext>, state: ControlState) -> Self {
        let figures = ChartId::ALL.map(|chart| render_chart(ctx.dataset(), &state, chart));
        Dashboard { ctx, state, figures }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn figure(&self, chart: ChartId) -> &Figure {
        &self.figures[chart.index()]
    }

    pub fn figures(&self) -> impl Iterator<Item = (ChartId, &Figure)> {
        ChartId::ALL.into_iter().map(move |chart| (chart, self.figure(chart)))
    }

    /// Apply a control change and replace the dependent charts' figures.
    /// Returns the charts that were refreshed.
    pub fn dispatch(&mut self, change: ControlChange) -> &'static [ChartId] {
        let control = change.control();
        for update in apply_change(self.ctx.dataset(), &mut self.state, change) {
            self.figures[update.chart.index()] = update.figure;
        }
        dependents(control)
    }
}

// ============================================================================
// TESTS
// ============================================================================
