// 📈 Chart Renderers
// Summary tables -> chart specifications (Plotly figure JSON shape)
//
// Renderers never fail: an Empty summary becomes a placeholder figure with a
// "no data" title, no traces, hidden axes and no legend.

use crate::aggregate::{BarMode, DealSizeShare, MonthlySales, ProductLineSales, ScatterPoint, Summary};
use indexmap::IndexMap;
use serde::Serialize;

/// Largest marker diameter (px) in the scatter chart
pub const MAX_MARKER_SIZE: f64 = 20.0;

// ============================================================================
// FIGURE SPEC
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    /// Placeholder figures carry a message but no data
    pub fn is_placeholder(&self) -> bool {
        self.data.is_empty()
    }

    pub fn title(&self) -> &str {
        &self.layout.title.text
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(XyTrace),
    Bar(XyTrace),
    Pie(PieTrace),
}

/// Axis values: category labels or numbers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Values {
    Labels(Vec<String>),
    Numbers(Vec<f64>),
}

impl Values {
    pub fn len(&self) -> usize {
        match self {
            Values::Labels(v) => v.len(),
            Values::Numbers(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XyTrace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: Values,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub size: Vec<u32>,
    pub sizemode: String,
    pub sizeref: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieTrace {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    fn new(text: impl Into<String>) -> Self {
        Title { text: text.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub axis_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rangeslider: Option<RangeSlider>,
}

impl Axis {
    fn titled(text: &str) -> Self {
        Axis {
            title: Some(Title::new(text)),
            ..Default::default()
        }
    }

    fn hidden() -> Self {
        Axis {
            visible: Some(false),
            ..Default::default()
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSlider {
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<BarMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
}

impl Layout {
    fn titled(text: impl Into<String>) -> Self {
        Layout {
            title: Title::new(text),
            xaxis: None,
            yaxis: None,
            barmode: None,
            legend: None,
            showlegend: None,
        }
    }
}

/// "No data" figure: message only, axes and legend suppressed
pub fn placeholder(message: impl Into<String>) -> Figure {
    Figure {
        data: Vec::new(),
        layout: Layout {
            xaxis: Some(Axis::hidden()),
            yaxis: Some(Axis::hidden()),
            showlegend: Some(false),
            ..Layout::titled(message)
        },
    }
}

// ============================================================================
// RENDERERS
// ============================================================================

/// Monthly sales line with a range slider on the month axis
pub fn line_chart(summary: &Summary<MonthlySales>, year: i32) -> Figure {
    let rows = match summary {
        Summary::Rows(rows) => rows,
        Summary::Empty => return placeholder(format!("No sales data for year {}", year)),
    };

    let trace = XyTrace {
        name: None,
        x: Values::Labels(rows.iter().map(|r| r.month.to_string()).collect()),
        y: rows.iter().map(|r| r.sales).collect(),
        mode: Some("lines".to_string()),
        marker: None,
    };

    Figure {
        data: vec![Trace::Scatter(trace)],
        layout: Layout {
            xaxis: Some(Axis {
                axis_type: Some("category".to_string()),
                rangeslider: Some(RangeSlider { visible: true }),
                ..Axis::titled("Month")
            }),
            yaxis: Some(Axis::titled("Sales")),
            ..Layout::titled(format!("Monthly sales in {}", year))
        },
    }
}

/// Sales per product line, one trace per deal size, grouped or stacked
pub fn bar_chart(summary: &Summary<ProductLineSales>, mode: BarMode) -> Figure {
    let rows = match summary {
        Summary::Rows(rows) => rows,
        Summary::Empty => return placeholder("No data for bar chart"),
    };

    // Trace order follows first appearance of each deal size
    let mut by_size: IndexMap<&str, (Vec<String>, Vec<f64>)> = IndexMap::new();
    for row in rows {
        let (x, y) = by_size.entry(row.deal_size.as_str()).or_default();
        x.push(row.product_line.clone());
        y.push(row.sales);
    }

    let data = by_size
        .into_iter()
        .map(|(size, (x, y))| {
            Trace::Bar(XyTrace {
                name: Some(size.to_string()),
                x: Values::Labels(x),
                y,
                mode: None,
                marker: None,
            })
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            xaxis: Some(Axis::titled("Product line")),
            yaxis: Some(Axis::titled("Sales")),
            barmode: Some(mode),
            legend: Some(Legend { title: Title::new("Deal size") }),
            ..Layout::titled("Sales by product line")
        },
    }
}

/// Share of sales per deal size
pub fn pie_chart(summary: &Summary<DealSizeShare>, country: &str) -> Figure {
    let rows = match summary {
        Summary::Rows(rows) => rows,
        Summary::Empty => return placeholder(format!("No sales for {}", country)),
    };

    let trace = PieTrace {
        labels: rows.iter().map(|r| r.deal_size.clone()).collect(),
        values: rows.iter().map(|r| r.sales).collect(),
    };

    Figure {
        data: vec![Trace::Pie(trace)],
        layout: Layout::titled(format!("Deal size share in {}", country)),
    }
}

/// Price vs sales, coloured by product line, sized by quantity ordered
pub fn scatter_chart(summary: &Summary<ScatterPoint>, year: i32) -> Figure {
    let points = match summary {
        Summary::Rows(points) => points,
        Summary::Empty => return placeholder(format!("No data for scatter chart ({})", year)),
    };

    // Marker area scales so the largest quantity gets MAX_MARKER_SIZE
    let max_quantity = points.iter().map(|p| p.quantity).max().unwrap_or(0);
    let sizeref = if max_quantity > 0 {
        f64::from(max_quantity) / (MAX_MARKER_SIZE * MAX_MARKER_SIZE)
    } else {
        1.0
    };

    let mut by_line: IndexMap<&str, Vec<&ScatterPoint>> = IndexMap::new();
    for point in points {
        by_line.entry(point.product_line.as_str()).or_default().push(point);
    }

    let data = by_line
        .into_iter()
        .map(|(line, points)| {
            Trace::Scatter(XyTrace {
                name: Some(line.to_string()),
                x: Values::Numbers(points.iter().map(|p| p.price_each).collect()),
                y: points.iter().map(|p| p.sales).collect(),
                mode: Some("markers".to_string()),
                marker: Some(Marker {
                    size: points.iter().map(|p| p.quantity).collect(),
                    sizemode: "area".to_string(),
                    sizeref,
                }),
            })
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            xaxis: Some(Axis::titled("Price each")),
            yaxis: Some(Axis::titled("Sales")),
            legend: Some(Legend { title: Title::new("Product line") }),
            ..Layout::titled(format!("Price vs sales in {}", year))
        },
    }
}

// ============================================================================
// TESTS
// ============================================================================
