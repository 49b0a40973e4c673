use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph,
        Row, Table, Wrap,
    },
    Frame, Terminal,
};
use sales_dashboard::charts::{Figure, Trace, Values, XyTrace};
use sales_dashboard::{BarMode, ChartId, ControlChange, Dashboard};
use std::io;

const PALETTE: [Color; 7] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
    Color::White,
];

pub struct App {
    pub dashboard: Dashboard,
    pub years: Vec<i32>,
    pub countries: Vec<String>,
    pub last_refreshed: &'static [ChartId],
}

impl App {
    pub fn new(dashboard: Dashboard) -> Self {
        let dataset = dashboard.context().dataset();
        let years = dataset.years();
        let countries = dataset.countries();

        Self {
            dashboard,
            years,
            countries,
            last_refreshed: &ChartId::ALL,
        }
    }

    pub fn next_year(&mut self) {
        self.step_year(true);
    }

    pub fn previous_year(&mut self) {
        self.step_year(false);
    }

    pub fn next_country(&mut self) {
        self.step_country(true);
    }

    pub fn previous_country(&mut self) {
        self.step_country(false);
    }

    pub fn toggle_bar_mode(&mut self) {
        let mode = self.dashboard.state().bar_mode.toggle();
        self.last_refreshed = self.dashboard.dispatch(ControlChange::BarMode(mode));
    }

    fn step_year(&mut self, forward: bool) {
        if let Some(year) = cycle(&self.years, &self.dashboard.state().year, forward) {
            self.last_refreshed = self.dashboard.dispatch(ControlChange::Year(year));
        }
    }

    fn step_country(&mut self, forward: bool) {
        if let Some(country) = cycle(&self.countries, &self.dashboard.state().country, forward) {
            self.last_refreshed = self.dashboard.dispatch(ControlChange::Country(country));
        }
    }

    /// Returns false when the key asks to quit
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('y') | KeyCode::Right => self.next_year(),
            KeyCode::Char('Y') | KeyCode::Left => self.previous_year(),
            KeyCode::Char('c') | KeyCode::Down => self.next_country(),
            KeyCode::Char('C') | KeyCode::Up => self.previous_country(),
            KeyCode::Char('b') => self.toggle_bar_mode(),
            _ => {}
        }
        true
    }
}

/// Neighbour of `current` in `options`, wrapping around.
/// A value missing from the options restarts at the first one.
fn cycle<T: PartialEq + Clone>(options: &[T], current: &T, forward: bool) -> Option<T> {
    if options.is_empty() {
        return None;
    }

    let len = options.len();
    let next = match options.iter().position(|o| o == current) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };

    Some(options[next].clone())
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && !app.handle_key(key.code) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Controls
            Constraint::Min(0),    // 2x2 chart grid
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    for (row, charts) in rows.iter().zip(ChartId::ALL.chunks(2)) {
        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(*row);

        for (area, chart) in panels.iter().zip(charts) {
            render_figure(f, *area, *chart, app.dashboard.figure(*chart));
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let state = app.dashboard.state();
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut spans = vec![
        Span::styled(" Year: ", label),
        Span::styled(state.year.to_string(), value),
        Span::raw("  │  "),
        Span::styled("Bars: ", label),
    ];

    for mode in BarMode::ALL {
        let marker = if mode == state.bar_mode { "(•) " } else { "( ) " };
        let style = if mode == state.bar_mode { value } else { label };
        spans.push(Span::styled(format!("{}{} ", marker, mode.label()), style));
    }

    spans.push(Span::raw(" │  "));
    spans.push(Span::styled("Country: ", label));
    spans.push(Span::styled(state.country.clone(), value));

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Sales Dashboard "),
    );

    f.render_widget(header, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let refreshed = app
        .last_refreshed
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let key = Style::default().fg(Color::Yellow);
    let status_spans = vec![
        Span::styled(format!(" Refreshed: {} ", refreshed), Style::default().fg(Color::Cyan)),
        Span::raw(" | "),
        Span::styled("y/Y", key),
        Span::raw(" Year | "),
        Span::styled("b", key),
        Span::raw(" Bar style | "),
        Span::styled("c/C", key),
        Span::raw(" Country | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", title))
}

fn render_figure(f: &mut Frame, area: Rect, chart: ChartId, figure: &Figure) {
    if figure.is_placeholder() {
        let message = Paragraph::new(figure.title())
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(panel(chart.as_str()));
        f.render_widget(message, area);
        return;
    }

    match chart {
        ChartId::Line => render_line(f, area, figure),
        ChartId::Bar => render_bar(f, area, figure),
        ChartId::Pie => render_pie(f, area, figure),
        ChartId::Scatter => render_scatter(f, area, figure),
    }
}

fn xy_traces(figure: &Figure) -> Vec<&XyTrace> {
    figure
        .data
        .iter()
        .filter_map(|trace| match trace {
            Trace::Scatter(t) | Trace::Bar(t) => Some(t),
            Trace::Pie(_) => None,
        })
        .collect()
}

fn label_values(values: &Values) -> Vec<String> {
    match values {
        Values::Labels(labels) => labels.clone(),
        Values::Numbers(numbers) => numbers.iter().map(|n| format!("{:.0}", n)).collect(),
    }
}

fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, f64::max)
}

fn render_line(f: &mut Frame, area: Rect, figure: &Figure) {
    let Some(trace) = xy_traces(figure).into_iter().next() else {
        return;
    };

    let months = label_values(&trace.x);
    let points: Vec<(f64, f64)> = trace
        .y
        .iter()
        .enumerate()
        .map(|(i, &y)| (i as f64, y))
        .collect();
    let max_y = max_of(trace.y.iter().copied());

    let datasets = vec![Dataset::default()
        .name("Sales")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points)];

    let x_labels = vec![
        Span::raw(months.first().cloned().unwrap_or_default()),
        Span::raw(months.last().cloned().unwrap_or_default()),
    ];

    let chart = Chart::new(datasets)
        .block(panel(figure.title()))
        .x_axis(
            Axis::default()
                .title("Month")
                .bounds([0.0, (points.len().saturating_sub(1)).max(1) as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("Sales")
                .bounds([0.0, max_y * 1.1])
                .labels(vec![Span::raw("0"), Span::raw(format!("{:.0}", max_y))]),
        );

    f.render_widget(chart, area);
}

fn render_bar(f: &mut Frame, area: Rect, figure: &Figure) {
    let traces = xy_traces(figure);
    let mode = figure.layout.barmode.unwrap_or_default();

    // Product lines in first-appearance order across deal size traces
    let mut lines: Vec<String> = Vec::new();
    for trace in &traces {
        for line in label_values(&trace.x) {
            if !lines.contains(&line) {
                lines.push(line);
            }
        }
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let mut chart = BarChart::default()
        .block(panel(figure.title()))
        .bar_width(3)
        .bar_gap(0)
        .group_gap(2);

    match mode {
        BarMode::Group => {
            for line in &lines {
                let bars: Vec<Bar> = traces
                    .iter()
                    .enumerate()
                    .map(|(i, trace)| {
                        Bar::default()
                            .value(value_of(trace, line).round() as u64)
                            .text_value(String::new())
                            .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                    })
                    .collect();
                chart = chart.data(BarGroup::default().label(Line::from(abbreviate(line))).bars(&bars));
            }
        }
        BarMode::Stack => {
            let bars: Vec<Bar> = lines
                .iter()
                .map(|line| {
                    let total: f64 = traces.iter().map(|trace| value_of(trace, line)).sum();
                    Bar::default()
                        .value(total.round() as u64)
                        .text_value(String::new())
                        .label(Line::from(abbreviate(line)))
                })
                .collect();
            chart = chart.bar_width(5).data(BarGroup::default().bars(&bars));
        }
    }

    f.render_widget(chart, chunks[0]);

    // Legend: deal size colours (stacked totals are drawn in one colour)
    let mut legend = vec![Span::raw(" ")];
    for (i, trace) in traces.iter().enumerate() {
        let colour = match mode {
            BarMode::Group => PALETTE[i % PALETTE.len()],
            BarMode::Stack => Color::White,
        };
        legend.push(Span::styled("■ ", Style::default().fg(colour)));
        legend.push(Span::raw(format!("{}  ", trace.name.as_deref().unwrap_or("?"))));
    }
    f.render_widget(Paragraph::new(Line::from(legend)), chunks[1]);
}

/// Sales for one product line within a deal size trace (0 when absent)
fn value_of(trace: &XyTrace, line: &str) -> f64 {
    label_values(&trace.x)
        .iter()
        .position(|l| l == line)
        .and_then(|i| trace.y.get(i).copied())
        .unwrap_or(0.0)
}

fn render_pie(f: &mut Frame, area: Rect, figure: &Figure) {
    let Some(Trace::Pie(pie)) = figure.data.first() else {
        return;
    };

    let total: f64 = pie.values.iter().sum();

    let header = Row::new(["Deal size", "Sales", "Share"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    }))
    .style(Style::default().bg(Color::DarkGray));

    let rows = pie.labels.iter().zip(&pie.values).enumerate().map(|(i, (label, value))| {
        let share = if total > 0.0 { value / total * 100.0 } else { 0.0 };
        Row::new(vec![
            Cell::from(format!("■ {}", label)).style(Style::default().fg(PALETTE[i % PALETTE.len()])),
            Cell::from(format!("{:.2}", value)),
            Cell::from(format!("{:>5.1}%", share)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(panel(figure.title()));

    f.render_widget(table, area);
}

fn render_scatter(f: &mut Frame, area: Rect, figure: &Figure) {
    let traces = xy_traces(figure);

    let series: Vec<Vec<(f64, f64)>> = traces
        .iter()
        .map(|trace| match &trace.x {
            Values::Numbers(x) => x.iter().copied().zip(trace.y.iter().copied()).collect(),
            Values::Labels(_) => Vec::new(),
        })
        .collect();

    let max_x = max_of(series.iter().flatten().map(|p| p.0));
    let max_y = max_of(series.iter().flatten().map(|p| p.1));

    let datasets = traces
        .iter()
        .zip(&series)
        .enumerate()
        .map(|(i, (trace, points))| {
            Dataset::default()
                .name(trace.name.clone().unwrap_or_default())
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .data(points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(panel(figure.title()))
        .x_axis(
            Axis::default()
                .title("Price each")
                .bounds([0.0, max_x * 1.05])
                .labels(vec![Span::raw("0"), Span::raw(format!("{:.0}", max_x))]),
        )
        .y_axis(
            Axis::default()
                .title("Sales")
                .bounds([0.0, max_y * 1.05])
                .labels(vec![Span::raw("0"), Span::raw(format!("{:.0}", max_y))]),
        );

    f.render_widget(chart, area);
}

fn abbreviate(s: &str) -> String {
    s.split_whitespace()
        .map(|w| w.chars().take(4).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}
