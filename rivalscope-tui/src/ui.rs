//! UI rendering for the TUI.

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Table, Wrap,
    },
    Frame,
};
use rivalscope_core::{Namespace, Severity};

use crate::app::{App, CompanyForm, InputMode, LoadState, Tab};

// ========== View Colors ==========

/// Accent for badges and bullets
const ACCENT: Color = Color::Rgb(0, 180, 180);
/// Border color for data panels
const BORDER_PANEL: Color = Color::Rgb(0, 150, 150);
/// Label color for metadata attributes
const LABEL_COLOR: Color = Color::Rgb(100, 180, 180);
/// Markdown header color
const MD_HEADER: Color = Color::Rgb(255, 180, 100);
/// Markdown code block color
const MD_CODE: Color = Color::Rgb(150, 150, 150);

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::vertical([
        Constraint::Length(2), // Tab bar
        Constraint::Min(5),    // Body
        Constraint::Length(1), // Footer
    ])
    .split(frame.area());

    render_tab_bar(frame, app, chunks[0]);

    match app.tab {
        Tab::Dashboard => render_dashboard(frame, app, chunks[1]),
        Tab::Watchlist => render_watchlist(frame, app, chunks[1]),
        Tab::TearSheets => render_tearsheets(frame, app, chunks[1]),
        Tab::Signals => render_signals(frame, app, chunks[1]),
        Tab::Sources => render_sources(frame, app, chunks[1]),
        Tab::Settings => render_settings(frame, app, chunks[1]),
        Tab::Reports => render_reports(frame, app, chunks[1]),
    }

    render_footer(frame, app, chunks[2]);

    // Modal overlays draw on top of whatever tab is active
    match app.input_mode {
        InputMode::CompanyForm => render_company_form(frame, app),
        InputMode::FollowUp => render_follow_up_prompt(frame, app),
        InputMode::Search => render_search_overlay(frame, app),
        InputMode::Normal => {}
    }
}

/// Render the tab bar with the app name on the left.
fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::horizontal([
        Constraint::Length(12), // App name
        Constraint::Min(1),     // Tabs
    ])
    .split(area);

    let app_name = Paragraph::new(" rivalscope").style(Style::default().fg(Color::Cyan).bold());
    frame.render_widget(app_name, chunks[0]);

    let active_style = Style::default()
        .fg(Color::Cyan)
        .bold()
        .add_modifier(Modifier::UNDERLINED);
    let inactive_style = Style::default().fg(Color::DarkGray);

    let mut spans = Vec::new();
    for (idx, tab) in Tab::all().into_iter().enumerate() {
        let style = if tab == app.tab {
            active_style
        } else {
            inactive_style
        };
        spans.push(Span::styled(format!(" {}:{} ", idx + 1, tab.title()), style));
    }

    let tabs = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(tabs, chunks[1]);
}

/// Render the footer: key hints, cache age on the signals tab, transient
/// status, and the backend health dot.
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = footer_hints(app);

    if app.tab == Tab::Signals {
        if let Some(last) = app.cache.last_fetch(Namespace::Signals) {
            let minutes = Utc::now().signed_duration_since(last).num_minutes().max(0);
            let ttl = app.cache.ttl_secs(Namespace::Signals);
            spans.push(Span::raw("│ "));
            spans.push(Span::styled(
                format!("cached {} min ago (TTL: {}s) ", minutes, ttl),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    if let Some(status) = app.status_line() {
        spans.push(Span::raw("│ "));
        spans.push(Span::styled(
            format!("{} ", status),
            Style::default().fg(Color::Magenta),
        ));
    }

    let (dot_color, dot_label) = match app.backend_healthy {
        Some(true) => (Color::Green, "backend up"),
        Some(false) => (Color::Red, "backend down"),
        None => (Color::DarkGray, "probing..."),
    };
    spans.push(Span::raw("│ "));
    spans.push(Span::styled("● ", Style::default().fg(dot_color)));
    spans.push(Span::styled(
        dot_label,
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Key hints for the active tab.
fn footer_hints(app: &App) -> Vec<Span<'static>> {
    let pairs: &[(&str, &str)] = match app.input_mode {
        InputMode::CompanyForm => &[
            ("Tab", "next field"),
            ("Enter", "submit"),
            ("Esc", "cancel"),
        ],
        InputMode::FollowUp => &[("Enter", "create"), ("Esc", "cancel")],
        InputMode::Search => &[
            ("type", "search"),
            ("Up/Down", "pick"),
            ("Enter", "add"),
            ("Esc", "close"),
        ],
        InputMode::Normal => match app.tab {
            Tab::Dashboard => &[("j/k", "rows"), ("r", "refresh"), ("q", "quit")],
            Tab::Watchlist => &[
                ("a", "add"),
                ("e", "edit"),
                ("/", "search"),
                ("r", "run all"),
                ("d", "run one"),
                ("Enter", "tear-sheet"),
                ("q", "quit"),
            ],
            Tab::TearSheets => &[
                ("j/k", "company"),
                ("d/u", "scroll"),
                ("r", "refetch"),
                ("q", "quit"),
            ],
            Tab::Signals => &[
                ("c/t/s", "filter"),
                ("r", "re-detect"),
                ("D", "live"),
                ("m", "mute"),
                ("f", "follow-up"),
                ("q", "quit"),
            ],
            Tab::Sources => &[
                ("j/k", "rows"),
                ("Space", "toggle"),
                ("h/l", "adjust"),
                ("s", "save"),
                ("q", "quit"),
            ],
            Tab::Settings => &[
                ("j/k", "rows"),
                ("Space", "toggle"),
                ("h/l", "adjust"),
                ("s", "save"),
                ("x", "clear cache"),
                ("q", "quit"),
            ],
            Tab::Reports => &[
                ("j/k", "select"),
                ("d/u", "scroll"),
                ("g", "generate"),
                ("r", "reload"),
                ("q", "quit"),
            ],
        },
    };

    let mut spans = Vec::new();
    for (key, label) in pairs {
        spans.push(Span::styled(
            format!(" {}", key),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::raw(format!(" {}  ", label)));
    }
    spans
}

// ========== Dashboard ==========

fn render_dashboard(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(5), // Stat cards
        Constraint::Min(8),    // Activity matrix
        Constraint::Length(9), // Recent signals
    ])
    .split(area);

    render_stat_cards(frame, app, chunks[0]);
    render_activity_matrix(frame, app, chunks[1]);
    render_recent_signals(frame, app, chunks[2]);
}

fn render_stat_cards(frame: &mut Frame, app: &App, area: Rect) {
    let cards = Layout::horizontal([
        Constraint::Ratio(1, 4),
        Constraint::Ratio(1, 4),
        Constraint::Ratio(1, 4),
        Constraint::Ratio(1, 4),
    ])
    .split(area);

    let last_update = app
        .last_update()
        .map(format_relative_time)
        .unwrap_or_else(|| "never".to_string());
    let values = [
        ("Companies", app.companies.len().to_string()),
        ("Signals", app.dashboard_signals.len().to_string()),
        ("Alerts (7d)", app.recent_signal_count().to_string()),
        ("Last Update", last_update),
    ];

    for (i, (title, value)) in values.into_iter().enumerate() {
        let card = Paragraph::new(vec![
            Line::raw(""),
            Line::from(Span::styled(
                value,
                Style::default().fg(Color::White).bold(),
            )),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_PANEL))
                .title(format!(" {} ", title)),
        );
        frame.render_widget(card, cards[i]);
    }
}

/// Activity matrix: metric columns per company, cells colored by count on
/// a 0-5 scale, with a totals row at the bottom.
fn render_activity_matrix(frame: &mut Frame, app: &mut App, area: Rect) {
    match &app.activity_state {
        LoadState::Idle | LoadState::Loading => {
            render_placeholder(frame, area, "Activity", "Loading activity...");
            return;
        }
        LoadState::Failed(err) => {
            render_error(frame, area, "Activity", err);
            return;
        }
        LoadState::Ready => {}
    }
    if app.activity.is_empty() {
        render_placeholder(frame, area, "Activity", "No activity recorded yet");
        return;
    }

    let header_cells = ["Company", "Product", "Pricing", "News", "Funding", "Score"]
        .into_iter()
        .map(|h| Cell::from(h).style(Style::default().fg(Color::Yellow).bold()));
    let header = Row::new(header_cells).height(1);

    let activity = &app.activity;
    let mut rows: Vec<Row> = activity
        .iter()
        .map(|row| {
            Row::new([
                Cell::from(row.company_name.as_str()),
                metric_cell(row.product_updates),
                metric_cell(row.pricing_changes),
                metric_cell(row.news_articles),
                metric_cell(row.funding_news),
                Cell::from(format!("{:.1}", row.total_score))
                    .style(Style::default().fg(score_color(row.total_score as i64))),
            ])
        })
        .collect();

    let totals = Row::new([
        Cell::from("Total").style(Style::default().fg(Color::White).bold()),
        Cell::from(
            activity
                .iter()
                .map(|r| r.product_updates)
                .sum::<i64>()
                .to_string(),
        )
        .style(Style::default().bold()),
        Cell::from(
            activity
                .iter()
                .map(|r| r.pricing_changes)
                .sum::<i64>()
                .to_string(),
        )
        .style(Style::default().bold()),
        Cell::from(
            activity
                .iter()
                .map(|r| r.news_articles)
                .sum::<i64>()
                .to_string(),
        )
        .style(Style::default().bold()),
        Cell::from(
            activity
                .iter()
                .map(|r| r.funding_news)
                .sum::<i64>()
                .to_string(),
        )
        .style(Style::default().bold()),
        Cell::from(format!(
            "{:.1}",
            activity.iter().map(|r| r.total_score).sum::<f64>()
        ))
        .style(Style::default().bold()),
    ]);
    rows.push(totals);

    let widths = [
        Constraint::Fill(1),    // Company
        Constraint::Length(9),  // Product
        Constraint::Length(9),  // Pricing
        Constraint::Length(9),  // News
        Constraint::Length(9),  // Funding
        Constraint::Length(7),  // Score
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_PANEL))
                .title(" Activity (last 30 days) "),
        )
        .row_highlight_style(
            Style::default()
                .add_modifier(Modifier::REVERSED)
                .fg(Color::Cyan),
        )
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.activity_table_state);
}

fn metric_cell(count: i64) -> Cell<'static> {
    Cell::from(count.to_string()).style(Style::default().fg(score_color(count)))
}

/// 0-5 intensity scale used by the activity matrix.
fn score_color(n: i64) -> Color {
    match n {
        i64::MIN..=0 => Color::Rgb(70, 70, 70),
        1 => Color::Rgb(0, 90, 90),
        2 => Color::Rgb(0, 120, 120),
        3 => Color::Rgb(0, 150, 150),
        4 => Color::Rgb(0, 180, 180),
        _ => Color::Rgb(0, 220, 220),
    }
}

fn render_recent_signals(frame: &mut Frame, app: &App, area: Rect) {
    match &app.dashboard_signals_state {
        LoadState::Idle | LoadState::Loading => {
            render_placeholder(frame, area, "Recent Signals", "Loading signals...");
            return;
        }
        LoadState::Failed(err) => {
            render_error(frame, area, "Recent Signals", err);
            return;
        }
        LoadState::Ready => {}
    }
    if app.dashboard_signals.is_empty() {
        render_placeholder(frame, area, "Recent Signals", "No signals stored yet");
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for signal in app.dashboard_signals.iter().take(6) {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", signal.severity.badge()),
                severity_style(signal.severity),
            ),
            Span::styled(
                format!("{:<9}", signal.signal_type.label()),
                Style::default().fg(LABEL_COLOR),
            ),
            Span::raw(truncate_string(&signal.title, 70)),
            Span::styled(
                format!("  {}", format_relative_time(signal.detected_at)),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_PANEL))
            .title(" Recent Signals "),
    );
    frame.render_widget(paragraph, area);
}

// ========== Watchlist ==========

fn render_watchlist(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Min(6),     // Company table
        Constraint::Length(10), // Run results
    ])
    .split(area);

    render_company_table(frame, app, chunks[0]);
    render_run_results(frame, app, chunks[1]);
}

fn render_company_table(frame: &mut Frame, app: &mut App, area: Rect) {
    match &app.companies_state {
        LoadState::Idle | LoadState::Loading => {
            render_placeholder(frame, area, "Watchlist", "Loading watchlist...");
            return;
        }
        LoadState::Failed(err) => {
            render_error(frame, area, "Watchlist", err);
            return;
        }
        LoadState::Ready => {}
    }
    if app.companies.is_empty() {
        render_placeholder(
            frame,
            area,
            "Watchlist",
            "No companies watched yet - press a to add one",
        );
        return;
    }

    let header_cells = ["Name", "Domains", "Paths", "Tags", "Added", "Last Run"]
        .into_iter()
        .map(|h| Cell::from(h).style(Style::default().fg(Color::Yellow).bold()));
    let header = Row::new(header_cells).height(1);

    let companies = &app.companies;
    let rows = companies.iter().map(|company| {
        let last_run = company
            .last_run_at
            .map(format_relative_time)
            .unwrap_or_else(|| "never".to_string());
        Row::new([
            Cell::from(company.name.as_str()).style(Style::default().fg(Color::White)),
            Cell::from(company.domains.join(", ")),
            Cell::from(company.include_paths.join(", "))
                .style(Style::default().fg(Color::DarkGray)),
            Cell::from(company.tags.join(", ")).style(Style::default().fg(LABEL_COLOR)),
            Cell::from(format_relative_time(company.created_at)),
            Cell::from(last_run).style(Style::default().fg(Color::DarkGray)),
        ])
    });

    let widths = [
        Constraint::Length(20), // Name
        Constraint::Fill(1),    // Domains
        Constraint::Fill(1),    // Paths
        Constraint::Length(16), // Tags
        Constraint::Length(10), // Added
        Constraint::Length(10), // Last Run
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_PANEL))
                .title(format!(" Watchlist ({}) ", companies.len())),
        )
        .row_highlight_style(
            Style::default()
                .add_modifier(Modifier::REVERSED)
                .fg(Color::Cyan),
        )
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.company_table_state);
}

fn render_run_results(frame: &mut Frame, app: &App, area: Rect) {
    match &app.runs_state {
        LoadState::Idle => {
            render_placeholder(
                frame,
                area,
                "Run Results",
                "No run yet - press r to run the watchlist",
            );
            return;
        }
        LoadState::Loading => {
            render_placeholder(frame, area, "Run Results", "Detection running...");
            return;
        }
        LoadState::Failed(err) => {
            render_error(frame, area, "Run Results", err);
            return;
        }
        LoadState::Ready => {}
    }
    if app.run_results.is_empty() {
        render_placeholder(frame, area, "Run Results", "Run finished with no results");
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for result in &app.run_results {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<20}", truncate_string(&result.company, 20)),
                Style::default().fg(Color::White),
            ),
            Span::styled("paths ", Style::default().fg(LABEL_COLOR)),
            Span::raw(format!("{:<4}", result.paths_checked)),
            Span::styled("urls ", Style::default().fg(LABEL_COLOR)),
            Span::raw(format!("{:<4}", result.urls_found)),
            Span::styled("signals ", Style::default().fg(LABEL_COLOR)),
            Span::styled(
                result.signals_created.to_string(),
                if result.signals_created > 0 {
                    Style::default().fg(Color::Green).bold()
                } else {
                    Style::default().fg(Color::DarkGray)
                },
            ),
        ]));
        if let Some(answer) = &result.answer_content {
            lines.push(Line::from(Span::styled(
                format!("  {}", truncate_string(answer, 100)),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_PANEL))
            .title(" Run Results "),
    );
    frame.render_widget(paragraph, area);
}

// ========== Tear-Sheets ==========

fn render_tearsheets(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::horizontal([
        Constraint::Length(26), // Company picker
        Constraint::Min(40),    // Detail
    ])
    .split(area);

    render_tearsheet_picker(frame, app, chunks[0]);
    render_tearsheet_detail(frame, app, chunks[1]);
}

fn render_tearsheet_picker(frame: &mut Frame, app: &mut App, area: Rect) {
    let companies = &app.companies;
    let rows = companies
        .iter()
        .map(|company| Row::new([Cell::from(company.name.as_str())]));

    let table = Table::new(rows, [Constraint::Fill(1)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_PANEL))
                .title(" Companies "),
        )
        .row_highlight_style(
            Style::default()
                .add_modifier(Modifier::REVERSED)
                .fg(Color::Cyan),
        )
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.tearsheet_company_state);
}

fn render_tearsheet_detail(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = app
        .tearsheet_company()
        .map(|c| format!(" Tear-Sheet: {} ", c.name))
        .unwrap_or_else(|| " Tear-Sheet ".to_string());

    match &app.tearsheet_state {
        LoadState::Idle => {
            render_placeholder(frame, area, &title, "Select a company");
            return;
        }
        LoadState::Loading => {
            render_placeholder(frame, area, &title, "Fetching tear-sheet...");
            return;
        }
        LoadState::Failed(err) => {
            render_error(frame, area, &title, err);
            return;
        }
        LoadState::Ready => {}
    }

    let Some(sheet) = &app.tearsheet else {
        render_placeholder(
            frame,
            area,
            &title,
            "No tear-sheet generated yet for this company",
        );
        return;
    };

    let mut lines: Vec<Line> = Vec::new();
    if !sheet.overview.is_empty() {
        lines.push(Line::from(Span::styled(
            "Overview",
            Style::default().fg(MD_HEADER).bold(),
        )));
        for text_line in sheet.overview.lines() {
            lines.push(Line::raw(text_line.to_string()));
        }
        lines.push(Line::raw(""));
    }
    json_section_lines("Funding", &sheet.funding, &mut lines);
    json_section_lines("Hiring Signals", &sheet.hiring_signals, &mut lines);
    json_section_lines("Product Updates", &sheet.product_updates, &mut lines);
    json_section_lines("Key Customers", &sheet.key_customers, &mut lines);
    if !sheet.citations.is_empty() {
        lines.push(Line::from(Span::styled(
            "Citations",
            Style::default().fg(MD_HEADER).bold(),
        )));
        for url in &sheet.citations {
            lines.push(Line::from(vec![
                Span::styled("• ", Style::default().fg(ACCENT)),
                Span::styled(url.clone(), Style::default().fg(Color::Blue)),
            ]));
        }
    }

    let total = lines.len();
    let max_scroll = total.saturating_sub(area.height.saturating_sub(2) as usize);
    if app.tearsheet_scroll > max_scroll {
        app.tearsheet_scroll = max_scroll;
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.tearsheet_scroll as u16, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_PANEL))
                .title(title),
        );
    frame.render_widget(paragraph, area);

    render_scrollbar(frame, area, total, app.tearsheet_scroll);
}

/// Render one backend-owned JSON section of a tear-sheet. The shape is not
/// constrained, so strings, arrays, and objects all get a rendering.
fn json_section_lines(title: &str, value: &serde_json::Value, lines: &mut Vec<Line<'static>>) {
    if value.is_null() {
        return;
    }
    lines.push(Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(MD_HEADER).bold(),
    )));
    match value {
        serde_json::Value::String(s) => {
            lines.push(Line::raw(s.clone()));
        }
        serde_json::Value::Array(items) => {
            for item in items {
                let text = match item {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                lines.push(Line::from(vec![
                    Span::styled("• ", Style::default().fg(ACCENT)),
                    Span::raw(text),
                ]));
            }
        }
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let text = match val {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("{}: ", key), Style::default().fg(LABEL_COLOR)),
                    Span::raw(text),
                ]));
            }
        }
        other => {
            lines.push(Line::raw(other.to_string()));
        }
    }
    lines.push(Line::raw(""));
}

// ========== Signals ==========

fn render_signals(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // Filter bar
        Constraint::Min(5),    // Table
        Constraint::Length(8), // Selected signal detail
    ])
    .split(area);

    render_filter_bar(frame, app, chunks[0]);
    render_signal_table(frame, app, chunks[1]);
    render_signal_detail(frame, app, chunks[2]);
}

fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let company_label = match &app.filter.company_id {
        Some(id) => app
            .companies
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.clone()),
        None => "all".to_string(),
    };
    let type_label = app
        .filter
        .signal_type
        .map(|t| t.as_str().to_string())
        .unwrap_or_else(|| "all".to_string());
    let severity_label = app
        .filter
        .severity
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|| "all".to_string());

    let bar = Line::from(vec![
        Span::styled(" company: ", Style::default().fg(LABEL_COLOR)),
        Span::styled(company_label, Style::default().fg(Color::White)),
        Span::styled("  type: ", Style::default().fg(LABEL_COLOR)),
        Span::styled(type_label, Style::default().fg(Color::White)),
        Span::styled("  severity: ", Style::default().fg(LABEL_COLOR)),
        Span::styled(severity_label, Style::default().fg(Color::White)),
    ]);
    frame.render_widget(Paragraph::new(bar), area);
}

fn render_signal_table(frame: &mut Frame, app: &mut App, area: Rect) {
    match &app.signals_state {
        LoadState::Idle => {
            render_placeholder(frame, area, "Signals", "Press r to run detection");
            return;
        }
        LoadState::Loading => {
            render_placeholder(frame, area, "Signals", "Running detection...");
            return;
        }
        LoadState::Failed(err) => {
            render_error(frame, area, "Signals", err);
            return;
        }
        LoadState::Ready => {}
    }
    if app.signals.is_empty() {
        render_placeholder(
            frame,
            area,
            "Signals",
            "No signals for this filter yet - press r to re-detect",
        );
        return;
    }

    let header_cells = ["Sev", "Type", "Company", "Title", "Detected"]
        .into_iter()
        .map(|h| Cell::from(h).style(Style::default().fg(Color::Yellow).bold()));
    let header = Row::new(header_cells).height(1);

    let signals = &app.signals;
    let companies = &app.companies;
    let rows = signals.iter().map(|signal| {
        let company = companies
            .iter()
            .find(|c| c.id == signal.company_id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| signal.company_id.clone());
        Row::new([
            Cell::from(signal.severity.badge()).style(severity_style(signal.severity)),
            Cell::from(signal.signal_type.label()).style(Style::default().fg(LABEL_COLOR)),
            Cell::from(company),
            Cell::from(signal.title.as_str()),
            Cell::from(format_relative_time(signal.detected_at))
                .style(Style::default().fg(Color::DarkGray)),
        ])
    });

    let widths = [
        Constraint::Length(4),  // Sev
        Constraint::Length(9),  // Type
        Constraint::Length(18), // Company
        Constraint::Fill(1),    // Title
        Constraint::Length(10), // Detected
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_PANEL))
                .title(format!(" Signals ({}) ", signals.len())),
        )
        .row_highlight_style(
            Style::default()
                .add_modifier(Modifier::REVERSED)
                .fg(Color::Cyan),
        )
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.signal_table_state);
}

fn render_signal_detail(frame: &mut Frame, app: &App, area: Rect) {
    let Some(signal) = app.selected_signal() else {
        render_placeholder(frame, area, "Detail", "No signal selected");
        return;
    };

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(vec![
        Span::styled(
            format!("{} ", signal.severity.badge()),
            severity_style(signal.severity),
        ),
        Span::styled(signal.title.clone(), Style::default().fg(Color::White).bold()),
        Span::styled(
            format!("  confidence {:.0}%", signal.confidence * 100.0),
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    if let Some(summary) = &signal.summary {
        lines.push(Line::raw(summary.clone()));
    }
    if let Some(rationale) = &signal.rationale {
        lines.push(Line::from(vec![
            Span::styled("why: ", Style::default().fg(LABEL_COLOR)),
            Span::raw(rationale.clone()),
        ]));
    }
    if let Some(evidence) = signal.evidence.first() {
        lines.push(Line::from(vec![
            Span::styled("evidence: ", Style::default().fg(LABEL_COLOR)),
            Span::styled(
                truncate_string(&evidence.snippet, 100),
                Style::default().fg(MD_CODE),
            ),
        ]));
    }
    if !signal.impacted_areas.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("impacted: ", Style::default().fg(LABEL_COLOR)),
            Span::raw(signal.impacted_areas.join(", ")),
        ]));
    }
    let url = signal
        .url
        .as_deref()
        .or_else(|| signal.urls.first().map(String::as_str))
        .or_else(|| signal.citations.first().map(String::as_str));
    if let Some(url) = url {
        lines.push(Line::from(Span::styled(
            url.to_string(),
            Style::default().fg(Color::Blue),
        )));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_PANEL))
            .title(" Detail "),
    );
    frame.render_widget(paragraph, area);
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::High => Style::default().fg(Color::Red).bold(),
        Severity::Medium => Style::default().fg(Color::Yellow),
        Severity::Low => Style::default().fg(Color::DarkGray),
    }
}

// ========== Sources ==========

fn render_sources(frame: &mut Frame, app: &App, area: Rect) {
    match &app.sources_state {
        LoadState::Idle | LoadState::Loading => {
            render_placeholder(frame, area, "Sources", "Loading sources configuration...");
            return;
        }
        LoadState::Failed(err) => {
            render_error(frame, area, "Sources", err);
            return;
        }
        LoadState::Ready => {}
    }
    let Some(sources) = &app.sources else {
        render_placeholder(frame, area, "Sources", "No sources configuration yet");
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(8), // Category toggles
        Constraint::Length(5), // Quality controls
        Constraint::Min(4),    // Read-only filters
    ])
    .split(area);

    let categories = [
        ("company sites", sources.categories.company),
        ("news", sources.categories.news),
        ("pdf documents", sources.categories.pdf),
        ("linkedin", sources.categories.linkedin),
        ("github", sources.categories.github),
        ("financial reports", sources.categories.financial_report),
    ];
    let lines: Vec<Line> = categories
        .into_iter()
        .enumerate()
        .map(|(idx, (label, on))| toggle_line(label, on, app.sources_cursor == idx))
        .collect();
    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_PANEL))
            .title(" Source Categories "),
    );
    frame.render_widget(panel, chunks[0]);

    let quality_lines = vec![
        value_line(
            "results limit",
            &sources.quality.results_limit.to_string(),
            app.sources_cursor == 6,
        ),
        value_line(
            "content",
            sources.quality.content_preference.as_str(),
            app.sources_cursor == 7,
        ),
        value_line(
            "livecrawl",
            sources.quality.livecrawl.as_str(),
            app.sources_cursor == 8,
        ),
    ];
    let quality = Paragraph::new(quality_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_PANEL))
            .title(" Quality Controls "),
    );
    frame.render_widget(quality, chunks[1]);

    let filter_lines = vec![
        Line::from(vec![
            Span::styled("allowed domains: ", Style::default().fg(LABEL_COLOR)),
            Span::styled(
                sources.allowed_domains.join(", "),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(vec![
            Span::styled("include terms: ", Style::default().fg(LABEL_COLOR)),
            Span::styled(
                sources.text_filters.include.clone(),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(vec![
            Span::styled("exclude terms: ", Style::default().fg(LABEL_COLOR)),
            Span::styled(
                sources.text_filters.exclude.clone(),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ];
    let filters = Paragraph::new(filter_lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_PANEL))
            .title(" Filters (edit via backend) "),
    );
    frame.render_widget(filters, chunks[2]);
}

// ========== Settings ==========

fn render_settings(frame: &mut Frame, app: &App, area: Rect) {
    match &app.settings_state {
        LoadState::Idle | LoadState::Loading => {
            render_placeholder(frame, area, "Settings", "Loading settings...");
            return;
        }
        LoadState::Failed(err) => {
            render_error(frame, area, "Settings", err);
            return;
        }
        LoadState::Ready => {}
    }
    let Some(draft) = &app.settings_draft else {
        render_placeholder(frame, area, "Settings", "No settings loaded yet");
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(8), // Editable rows
        Constraint::Min(5),    // API key presence
    ])
    .split(area);

    let schedule_label = format!(
        "{} ({} {})",
        draft.schedule.frequency.as_str(),
        draft.schedule.day,
        draft.schedule.time
    );
    let rows = vec![
        toggle_line(
            "scheduled runs",
            draft.schedule.enabled,
            app.settings_cursor == 0,
        ),
        value_line("frequency", &schedule_label, app.settings_cursor == 1),
        value_line(
            "signal retention",
            &format!("{} days", draft.retention.signals_days),
            app.settings_cursor == 2,
        ),
        value_line(
            "report retention",
            &format!("{} days", draft.retention.reports_days),
            app.settings_cursor == 3,
        ),
        value_line(
            "snapshot retention",
            &format!("{} days", draft.retention.snapshots_days),
            app.settings_cursor == 4,
        ),
        value_line(
            "signals cache TTL",
            &format!("{}s", draft.signals_cache_duration_seconds),
            app.settings_cursor == 5,
        ),
    ];
    let panel = Paragraph::new(rows).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_PANEL))
            .title(" Schedule & Retention "),
    );
    frame.render_widget(panel, chunks[0]);

    let keys = [
        ("exa api key", draft.api_keys.exa_api_key.is_some()),
        ("slack webhook", draft.api_keys.slack_webhook.is_some()),
        ("email smtp", draft.api_keys.email_smtp.is_some()),
    ];
    let key_lines: Vec<Line> = keys
        .into_iter()
        .map(|(label, present)| {
            let (text, style) = if present {
                ("configured", Style::default().fg(Color::Green))
            } else {
                ("not set", Style::default().fg(Color::DarkGray))
            };
            Line::from(vec![
                Span::styled(format!("{:<16}", label), Style::default().fg(LABEL_COLOR)),
                Span::styled(text, style),
            ])
        })
        .collect();
    let keys_panel = Paragraph::new(key_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_PANEL))
            .title(" API Keys (values stay server-side) "),
    );
    frame.render_widget(keys_panel, chunks[1]);
}

/// A toggle row: cursor marker, checkbox, label.
fn toggle_line(label: &str, on: bool, selected: bool) -> Line<'static> {
    let marker = if selected { "▶ " } else { "  " };
    let checkbox = if on { "[x] " } else { "[ ] " };
    let style = if selected {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default().fg(Color::White)
    };
    Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Cyan)),
        Span::styled(checkbox.to_string(), style),
        Span::styled(label.to_string(), style),
    ])
}

/// A label/value row with a cursor marker.
fn value_line(label: &str, value: &str, selected: bool) -> Line<'static> {
    let marker = if selected { "▶ " } else { "  " };
    let label_style = if selected {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default().fg(LABEL_COLOR)
    };
    Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Cyan)),
        Span::styled(format!("{:<20}", label), label_style),
        Span::styled(value.to_string(), Style::default().fg(Color::White)),
    ])
}

// ========== Reports ==========

fn render_reports(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::horizontal([
        Constraint::Length(34), // Report list
        Constraint::Min(40),    // Detail
    ])
    .split(area);

    render_report_list(frame, app, chunks[0]);
    render_report_detail(frame, app, chunks[1]);
}

fn render_report_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = if app.report_generating {
        " Reports (generating...) "
    } else {
        " Reports "
    };

    match &app.reports_state {
        LoadState::Idle | LoadState::Loading => {
            render_placeholder(frame, area, title, "Loading reports...");
            return;
        }
        LoadState::Failed(err) => {
            render_error(frame, area, title, err);
            return;
        }
        LoadState::Ready => {}
    }
    if app.reports.is_empty() {
        render_placeholder(frame, area, title, "No reports yet - press g to generate");
        return;
    }

    let reports = &app.reports;
    let rows = reports.iter().map(|report| {
        let period = format!(
            "{} to {}",
            report.period_start.format("%b %d"),
            report.period_end.format("%b %d")
        );
        Row::new([
            Cell::from(period),
            Cell::from(format_relative_time(report.created_at))
                .style(Style::default().fg(Color::DarkGray)),
        ])
    });

    let table = Table::new(rows, [Constraint::Fill(1), Constraint::Length(10)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_PANEL))
                .title(title),
        )
        .row_highlight_style(
            Style::default()
                .add_modifier(Modifier::REVERSED)
                .fg(Color::Cyan),
        )
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.report_table_state);
}

fn render_report_detail(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(report) = app.selected_report() else {
        render_placeholder(frame, area, "Report", "No report selected");
        return;
    };

    let mut lines = markdown_lines(&report.contents_md);
    if !report.url_list.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "Sources",
            Style::default().fg(MD_HEADER).bold(),
        )));
        for url in &report.url_list {
            lines.push(Line::from(vec![
                Span::styled("• ", Style::default().fg(ACCENT)),
                Span::styled(url.clone(), Style::default().fg(Color::Blue)),
            ]));
        }
    }

    let total = lines.len();
    let max_scroll = total.saturating_sub(area.height.saturating_sub(2) as usize);
    if app.report_scroll > max_scroll {
        app.report_scroll = max_scroll;
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.report_scroll as u16, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_PANEL))
                .title(" Report "),
        );
    frame.render_widget(paragraph, area);

    render_scrollbar(frame, area, total, app.report_scroll);
}

/// Markdown-aware line styling for report bodies.
fn markdown_lines(content: &str) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();
    let mut in_code_block = false;

    for line in content.lines() {
        let styled_line = if line.starts_with("```") {
            in_code_block = !in_code_block;
            Line::from(Span::styled(line.to_string(), Style::default().fg(MD_CODE)))
        } else if in_code_block {
            Line::from(Span::styled(line.to_string(), Style::default().fg(MD_CODE)))
        } else if line.starts_with("# ") || line.starts_with("## ") {
            Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(MD_HEADER).bold(),
            ))
        } else if line.starts_with("### ") {
            Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(MD_HEADER),
            ))
        } else if line.starts_with("**") && line.ends_with("**") {
            Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(Color::Yellow),
            ))
        } else if line.starts_with("- ") || line.starts_with("* ") {
            Line::from(vec![
                Span::styled("• ", Style::default().fg(ACCENT)),
                Span::raw(line[2..].to_string()),
            ])
        } else {
            Line::raw(line.to_string())
        };
        lines.push(styled_line);
    }

    lines
}

// ========== Overlays ==========

fn render_company_form(frame: &mut Frame, app: &App) {
    let area = centered_rect(56, 16, frame.area());
    frame.render_widget(Clear, area);

    let title = if app.company_form.editing_id.is_some() {
        " Edit Company "
    } else {
        " Add Company "
    };

    let mut lines: Vec<Line> = Vec::new();
    for idx in 0..CompanyForm::FIELDS {
        let selected = app.company_form.field == idx;
        let marker = if selected { "▶ " } else { "  " };
        let label_style = if selected {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(LABEL_COLOR)
        };
        let mut value = app.company_form.field_value(idx).to_string();
        if selected {
            value.push('▏');
        }
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Cyan)),
            Span::styled(format!("{:<16}", CompanyForm::field_label(idx)), label_style),
            Span::styled(value, Style::default().fg(Color::White)),
        ]));
        lines.push(Line::raw(""));
    }
    lines.push(Line::from(Span::styled(
        "comma-separated lists for domains, paths, tags",
        Style::default().fg(Color::DarkGray),
    )));

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );
    frame.render_widget(form, area);
}

fn render_follow_up_prompt(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 6, frame.area());
    frame.render_widget(Clear, area);

    let signal_title = app
        .selected_signal()
        .map(|s| truncate_string(&s.title, 48))
        .unwrap_or_else(|| "(no signal)".to_string());

    let lines = vec![
        Line::from(vec![
            Span::styled("for: ", Style::default().fg(LABEL_COLOR)),
            Span::raw(signal_title),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::styled("task: ", Style::default().fg(LABEL_COLOR)),
            Span::styled(
                format!("{}▏", app.follow_up_input),
                Style::default().fg(Color::White),
            ),
        ]),
    ];

    let prompt = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Follow-Up Task "),
    );
    frame.render_widget(prompt, area);
}

fn render_search_overlay(frame: &mut Frame, app: &mut App) {
    let area = centered_rect(64, 14, frame.area());
    frame.render_widget(Clear, area);

    let chunks = Layout::vertical([
        Constraint::Length(2), // Query line
        Constraint::Min(3),    // Results
    ])
    .split(area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    }));

    let outer = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Find Companies ");
    frame.render_widget(outer, area);

    let query = Paragraph::new(Line::from(vec![
        Span::styled("search: ", Style::default().fg(LABEL_COLOR)),
        Span::styled(
            format!("{}▏", app.search_query),
            Style::default().fg(Color::White),
        ),
    ]));
    frame.render_widget(query, chunks[0]);

    match &app.search_state {
        LoadState::Idle => {
            let hint = Paragraph::new("Start typing to search")
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(hint, chunks[1]);
        }
        LoadState::Loading => {
            let hint =
                Paragraph::new("Searching...").style(Style::default().fg(Color::DarkGray));
            frame.render_widget(hint, chunks[1]);
        }
        LoadState::Failed(err) => {
            let hint = Paragraph::new(format!("search failed: {}", truncate_string(err, 50)))
                .style(Style::default().fg(Color::Red));
            frame.render_widget(hint, chunks[1]);
        }
        LoadState::Ready => {
            if app.search_results.is_empty() {
                let hint =
                    Paragraph::new("No matches").style(Style::default().fg(Color::DarkGray));
                frame.render_widget(hint, chunks[1]);
                return;
            }
            let results = &app.search_results;
            let rows = results.iter().map(|hit| {
                Row::new([
                    Cell::from(hit.name.as_str()).style(Style::default().fg(Color::White)),
                    Cell::from(hit.domain.as_deref().unwrap_or("")),
                    Cell::from(hit.description.as_deref().unwrap_or(""))
                        .style(Style::default().fg(Color::DarkGray)),
                ])
            });
            let table = Table::new(
                rows,
                [
                    Constraint::Length(18),
                    Constraint::Length(16),
                    Constraint::Fill(1),
                ],
            )
            .row_highlight_style(
                Style::default()
                    .add_modifier(Modifier::REVERSED)
                    .fg(Color::Cyan),
            )
            .highlight_symbol("▶ ");
            frame.render_stateful_widget(table, chunks[1], &mut app.search_table_state);
        }
    }
}

// ========== Shared helpers ==========

/// Gray informational panel for loading and no-data-yet states.
fn render_placeholder(frame: &mut Frame, area: Rect, title: &str, text: &str) {
    let paragraph = Paragraph::new(text.to_string())
        .style(Style::default().fg(Color::DarkGray))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_PANEL))
                .title(format!(" {} ", title.trim())),
        );
    frame.render_widget(paragraph, area);
}

/// Red panel for a failed fetch. Visually distinct from empty data.
fn render_error(frame: &mut Frame, area: Rect, title: &str, error: &str) {
    let line = Line::from(vec![
        Span::styled("fetch failed: ", Style::default().fg(Color::Red).bold()),
        Span::styled(
            truncate_string(error, 90),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let paragraph = Paragraph::new(line).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Red))
            .title(format!(" {} ", title.trim())),
    );
    frame.render_widget(paragraph, area);
}

fn render_scrollbar(frame: &mut Frame, area: Rect, total: usize, position: usize) {
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"));
    let mut state = ScrollbarState::new(total).position(position);
    frame.render_stateful_widget(
        scrollbar,
        area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut state,
    );
}

/// Center a fixed-size rect inside `area`, clamped to fit.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        // Find a valid char boundary at or before max_len - 3 (for "...")
        let target = max_len.saturating_sub(3);
        let mut end = target;
        while !s.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

fn format_relative_time(ts: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}
