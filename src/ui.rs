use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use invoice_insight::{
    AnomalyFinding, CashFlowRisk, Dashboard, ForecastOutcome, Panel, PrioritizedView, Priority,
    RiskLevel, FORECAST_HORIZON_DAYS,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, TableState,
        Wrap,
    },
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Invoices,
    Priorities,
    Anomalies,
    CashFlow,
    Forecast,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Invoices,
        Page::Priorities,
        Page::Anomalies,
        Page::CashFlow,
        Page::Forecast,
    ];

    pub fn next(&self) -> Self {
        match self {
            Page::Invoices => Page::Priorities,
            Page::Priorities => Page::Anomalies,
            Page::Anomalies => Page::CashFlow,
            Page::CashFlow => Page::Forecast,
            Page::Forecast => Page::Invoices,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Invoices => Page::Forecast,
            Page::Priorities => Page::Invoices,
            Page::Anomalies => Page::Priorities,
            Page::CashFlow => Page::Anomalies,
            Page::Forecast => Page::CashFlow,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Invoices => "Invoices",
            Page::Priorities => "Payment Priorities",
            Page::Anomalies => "Anomalies",
            Page::CashFlow => "Cash Flow Risk",
            Page::Forecast => "Forecast",
        }
    }
}

pub struct App {
    pub dashboard: Dashboard,
    pub current_page: Page,
    pub priorities_state: TableState,
    pub forecast_state: TableState,
    pub busy: bool,
}

impl App {
    pub fn new(dashboard: Dashboard) -> Self {
        let mut priorities_state = TableState::default();
        if dashboard.priorities.value().is_some_and(|v| !v.is_empty()) {
            priorities_state.select(Some(0));
        }

        Self {
            dashboard,
            current_page: Page::Invoices,
            priorities_state,
            forecast_state: TableState::default(),
            busy: false,
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    /// Run the forecast and jump to its page
    pub fn run_forecast(&mut self) {
        let ready = self.dashboard.run_forecast().value().is_some();
        self.forecast_state.select(if ready { Some(0) } else { None });
        self.current_page = Page::Forecast;
    }

    /// Recompute the date-dependent panels against `today`
    pub fn refresh(&mut self, today: NaiveDate) {
        self.dashboard.refresh(today);
        let rows = self.dashboard.priorities.value().map_or(0, |v| v.len());
        let selected = self.priorities_state.selected().filter(|i| *i < rows);
        self.priorities_state
            .select(selected.or(if rows > 0 { Some(0) } else { None }));
    }

    /// Rows and selection for whichever page has a scrollable table
    fn active_table(&mut self) -> Option<(usize, &mut TableState)> {
        match self.current_page {
            Page::Priorities => {
                let len = self.dashboard.priorities.value().map_or(0, |v| v.len());
                Some((len, &mut self.priorities_state))
            }
            Page::Forecast => {
                let len = match &self.dashboard.forecast {
                    Some(Panel::Ready { value }) => value.series.future().len(),
                    _ => 0,
                };
                Some((len, &mut self.forecast_state))
            }
            _ => None,
        }
    }

    pub fn next(&mut self) {
        self.move_selection(1);
    }

    pub fn previous(&mut self) {
        self.move_selection(-1);
    }

    pub fn page_down(&mut self) {
        self.jump(20);
    }

    pub fn page_up(&mut self) {
        self.jump(-20);
    }

    pub fn first(&mut self) {
        if let Some((len, state)) = self.active_table() {
            if len > 0 {
                state.select(Some(0));
            }
        }
    }

    pub fn last(&mut self) {
        if let Some((len, state)) = self.active_table() {
            if len > 0 {
                state.select(Some(len - 1));
            }
        }
    }

    /// Step by one row, wrapping at both ends
    fn move_selection(&mut self, step: i64) {
        let Some((len, state)) = self.active_table() else {
            return;
        };
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) => (i as i64 + step).rem_euclid(len as i64) as usize,
            None => 0,
        };
        state.select(Some(i));
    }

    /// Jump by many rows, clamping at both ends
    fn jump(&mut self, step: i64) {
        let Some((len, state)) = self.active_table() else {
            return;
        };
        if len == 0 {
            return;
        }
        let current = state.selected().unwrap_or(0) as i64;
        let i = (current + step).clamp(0, len as i64 - 1) as usize;
        state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('f') => {
                    // Show the busy line before blocking on the fit
                    app.busy = true;
                    app.current_page = Page::Forecast;
                    terminal.draw(|f| ui(f, app))?;
                    app.run_forecast();
                    app.busy = false;
                }
                KeyCode::Char('r') => app.refresh(Local::now().date_naive()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.first(),
                KeyCode::End => app.last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Invoices => render_invoices(f, chunks[1], app),
        Page::Priorities => render_priorities(f, chunks[1], app),
        Page::Anomalies => render_anomalies(f, chunks[1], &app.dashboard.anomalies),
        Page::CashFlow => render_cash_flow(f, chunks[1], &app.dashboard.cash_flow),
        Page::Forecast => render_forecast(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Invoices: {}", app.dashboard.table().len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Today: {}", app.dashboard.today()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" AI-Powered Invoice Analysis "),
    );

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn render_invoices(f: &mut Frame, area: Rect, app: &App) {
    let rows = app.dashboard.preview().iter().map(|invoice| {
        Row::new(vec![
            Cell::from(invoice.invoice_id.clone()),
            Cell::from(truncate(&invoice.supplier_name, 28)),
            Cell::from(invoice.invoice_date.clone()),
            Cell::from(invoice.due_date.clone()),
            Cell::from(format!("{:.2}", invoice.amount)),
            Cell::from(invoice.status.to_string()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(30),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(12),
        ],
    )
    .header(header_row(&[
        "Invoice_ID",
        "Supplier_Name",
        "Invoice_Date",
        "Due_Date",
        "Amount",
        "Status",
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(
                " Invoice Data Preview ({} of {}) ",
                app.dashboard.preview().len(),
                app.dashboard.table().len()
            )),
    );

    f.render_widget(table, area);
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

fn render_priorities(f: &mut Frame, area: Rect, app: &mut App) {
    let view: &PrioritizedView = match &app.dashboard.priorities {
        Panel::Ready { value } => value,
        Panel::Failed { message } => {
            render_warning(f, area, " Payment Prioritization ", message);
            return;
        }
    };

    let rows = view.rows.iter().map(|row| {
        let color = priority_color(row.priority);
        Row::new(vec![
            Cell::from(row.invoice.invoice_id.clone()),
            Cell::from(truncate(&row.invoice.supplier_name, 28)),
            Cell::from(row.invoice.due_date.clone()),
            Cell::from(format!("{:.2}", row.invoice.amount)),
            Cell::from(format!("{}", row.due_in_days)),
            Cell::from(row.priority.as_str()).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(30),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(8),
            Constraint::Length(10),
        ],
    )
    .header(header_row(&[
        "Invoice_ID",
        "Supplier_Name",
        "Due_Date",
        "Amount",
        "Due In",
        "Priority",
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(
                " Payment Prioritization - {} high, {} medium, {} low ",
                view.count(Priority::High),
                view.count(Priority::Medium),
                view.count(Priority::Low)
            )),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.priorities_state);
}

fn render_anomalies(f: &mut Frame, area: Rect, findings: &[AnomalyFinding]) {
    let mut content = vec![Line::from("")];

    if findings.is_empty() {
        content.push(Line::from(Span::styled(
            "  ✓ No anomalies detected.",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
    }

    for finding in findings {
        content.push(Line::from(Span::styled(
            format!("  ⚠ {}", finding.title()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        content.push(Line::from(format!("    {}", finding)));
        content.push(Line::from(""));
    }

    let paragraph = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Anomaly Detection "),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, area);
}

fn render_cash_flow(f: &mut Frame, area: Rect, panel: &Panel<CashFlowRisk>) {
    let risk = match panel {
        Panel::Ready { value } => value,
        Panel::Failed { message } => {
            render_warning(f, area, " Cash Flow Risk Forecast ", message);
            return;
        }
    };

    let risk_color = match risk.risk_level {
        RiskLevel::High => Color::Red,
        RiskLevel::Low => Color::Green,
    };
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Total Pending Amount: ", label),
            Span::styled(
                format!("{:.2}", risk.total_pending),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Amount Due Soon (within 10 days): ", label),
            Span::styled(
                format!("{:.2}", risk.amount_due_soon),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Risk Level: ", label),
            Span::styled(
                risk.risk_level.as_str(),
                Style::default().fg(risk_color).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Cash Flow Risk Forecast "),
    );

    f.render_widget(paragraph, area);
}

fn render_forecast(f: &mut Frame, area: Rect, app: &mut App) {
    let title = " Future Payment Forecasting ";

    if app.busy {
        render_message(f, area, title, "  ⏳ Forecasting future payments...", Color::Yellow);
        return;
    }

    let outcome: &ForecastOutcome = match &app.dashboard.forecast {
        None => {
            render_message(f, area, title, "  Press f to run forecasting", Color::DarkGray);
            return;
        }
        Some(Panel::Failed { message }) => {
            render_warning(f, area, title, message);
            return;
        }
        Some(Panel::Ready { value }) => value,
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(58), Constraint::Min(0)])
        .split(area);

    let rows = outcome.series.future().iter().map(|point| {
        Row::new(vec![
            Cell::from(point.date.to_string()),
            Cell::from(format!("{:.2}", point.predicted)),
            Cell::from(format!("{:.2}", point.lower)),
            Cell::from(format!("{:.2}", point.upper)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(13),
            Constraint::Length(13),
            Constraint::Length(13),
        ],
    )
    .header(header_row(&["Date", "Predicted", "Lower", "Upper"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(
                " Next {} Days ({:.0}% interval) ",
                FORECAST_HORIZON_DAYS,
                app.dashboard.interval_width() * 100.0
            )),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    render_forecast_chart(f, chunks[1], outcome);
    f.render_stateful_widget(table, chunks[0], &mut app.forecast_state);
}

fn render_forecast_chart(f: &mut Frame, area: Rect, outcome: &ForecastOutcome) {
    let points = outcome.series.points();
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return;
    };
    let x = |date: NaiveDate| (date - first.date).num_days() as f64;

    let actual: Vec<(f64, f64)> = points
        .iter()
        .filter_map(|p| p.actual.map(|y| (x(p.date), y)))
        .collect();
    let predicted: Vec<(f64, f64)> = points.iter().map(|p| (x(p.date), p.predicted)).collect();
    let lower: Vec<(f64, f64)> = points.iter().map(|p| (x(p.date), p.lower)).collect();
    let upper: Vec<(f64, f64)> = points.iter().map(|p| (x(p.date), p.upper)).collect();

    let y_min = points
        .iter()
        .map(|p| p.lower.min(p.actual.unwrap_or(p.lower)))
        .fold(f64::INFINITY, f64::min);
    let y_max = points
        .iter()
        .map(|p| p.upper.max(p.actual.unwrap_or(p.upper)))
        .fold(f64::NEG_INFINITY, f64::max);
    let pad = ((y_max - y_min) * 0.05).max(1.0);
    let x_max = x(last.date).max(1.0);

    let datasets = vec![
        Dataset::default()
            .name("upper")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&upper),
        Dataset::default()
            .name("lower")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&lower),
        Dataset::default()
            .name("forecast")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&predicted),
        Dataset::default()
            .name("history")
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&actual),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Pending Amount: History vs Fit "),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(vec![
                    Span::raw(first.date.to_string()),
                    Span::raw(last.date.to_string()),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min - pad, y_max + pad])
                .labels(vec![
                    Span::raw(format!("{:.0}", y_min - pad)),
                    Span::raw(format!("{:.0}", y_max + pad)),
                ]),
        );

    f.render_widget(chart, area);
}

fn render_warning(f: &mut Frame, area: Rect, title: &str, message: &str) {
    render_message(f, area, title, &format!("  ⚠ {}", message), Color::Red);
}

fn render_message(f: &mut Frame, area: Rect, title: &str, message: &str, color: Color) {
    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(color))),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title.to_string()),
    )
    .wrap(Wrap { trim: false });

    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" {} ", app.current_page.title()),
        Style::default().fg(Color::Cyan),
    )];

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("f", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Run Forecasting | "));
    status_spans.push(Span::styled("r", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Refresh | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Fast | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoice_insight::{AdditiveForecaster, InvoiceRecord, InvoiceStatus, InvoiceTable};
    use std::sync::Arc;

    fn create_test_app(count: usize) -> App {
        let records = (0..count)
            .map(|i| InvoiceRecord {
                invoice_id: format!("INV-{}", i),
                supplier_name: "Supplier".to_string(),
                invoice_date: format!("2024-05-{:02}", i % 28 + 1),
                due_date: "2024-06-20".to_string(),
                amount: 100.0,
                status: InvoiceStatus::Pending,
            })
            .collect();
        let dashboard = Dashboard::from_table(
            Arc::new(InvoiceTable::new(records)),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            AdditiveForecaster::new(),
        );
        App::new(dashboard)
    }

    #[test]
    fn test_page_cycle() {
        let mut page = Page::Invoices;
        for _ in 0..Page::ALL.len() {
            page = page.next();
        }
        assert_eq!(page, Page::Invoices);
        assert_eq!(Page::Invoices.previous(), Page::Forecast);
    }

    #[test]
    fn test_priority_navigation_wraps() {
        let mut app = create_test_app(3);
        app.current_page = Page::Priorities;

        app.previous();
        assert_eq!(app.priorities_state.selected(), Some(2));
        app.next();
        assert_eq!(app.priorities_state.selected(), Some(0));
        app.page_down();
        assert_eq!(app.priorities_state.selected(), Some(2));
    }

    #[test]
    fn test_forecast_trigger_switches_page() {
        let mut app = create_test_app(5);
        assert!(app.dashboard.forecast.is_none());

        app.run_forecast();

        assert_eq!(app.current_page, Page::Forecast);
        assert_eq!(app.forecast_state.selected(), Some(0));
    }

    #[test]
    fn test_refresh_keeps_selection_in_range() {
        let mut app = create_test_app(3);
        app.current_page = Page::Priorities;
        app.last();

        app.refresh(NaiveDate::from_ymd_opt(2024, 6, 18).unwrap());

        assert_eq!(app.priorities_state.selected(), Some(2));
        assert_eq!(app.dashboard.today(), NaiveDate::from_ymd_opt(2024, 6, 18).unwrap());
        let view = app.dashboard.priorities.value().unwrap();
        assert_eq!(view.count(Priority::High), 3);
    }
}
