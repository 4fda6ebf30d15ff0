//! Ratatui-based terminal UI.
//!
//! The TUI lists sites in a sidebar and shows one tab per chart view, a
//! combined monthly tab and a file explorer with CSV preview and "save copy".

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, Tabs, Wrap},
};
use tracing::{info, warn};

use crate::app::pipeline::Session;
use crate::chart::{ChartOutcome, ChartSpec, CombinedCharts, SeriesStyle, build, combined_charts};
use crate::domain::{ChartView, DashboardConfig, DataFile, MetricCategory, SiteCatalog, month_name};
use crate::error::AppError;
use crate::io::{loader::preview_rows, save_copy};

mod plotters_chart;

use plotters_chart::PlottersChart;

/// Start the TUI.
pub fn run(config: DashboardConfig, initial_site: Option<&str>) -> Result<(), AppError> {
    // Scan before touching the terminal so root errors print normally.
    let mut app = App::new(Session::open(config)?, initial_site)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    View(ChartView),
    Combined,
    Explorer,
}

const TABS: [Tab; 7] = [
    Tab::View(ChartView::Monthly),
    Tab::View(ChartView::Daily),
    Tab::View(ChartView::Hourly),
    Tab::View(ChartView::Duration),
    Tab::View(ChartView::Distribution),
    Tab::Combined,
    Tab::Explorer,
];

impl Tab {
    fn title(self) -> &'static str {
        match self {
            Tab::View(view) => view.display_name(),
            Tab::Combined => "Combined",
            Tab::Explorer => "Explorer",
        }
    }
}

/// What the main pane currently shows.
enum Pane {
    Chart(ChartOutcome),
    Combined(ChartOutcome<CombinedCharts>),
    Explorer(Preview),
}

type Preview = Result<(Vec<String>, Vec<Vec<String>>), String>;

struct App {
    session: Session,
    site_idx: usize,
    tab_idx: usize,
    metric: MetricCategory,
    month: u32,
    file_idx: usize,
    pane: Option<Pane>,
    status: String,
}

impl App {
    fn new(session: Session, initial_site: Option<&str>) -> Result<Self, AppError> {
        let site_idx = match initial_site {
            Some(name) => {
                let site = crate::cli::picker::resolve_site(&session.portfolio, name)?;
                session
                    .portfolio
                    .sites
                    .iter()
                    .position(|s| s.site.folder_name == site.site.folder_name)
                    .unwrap_or(0)
            }
            None => 0,
        };
        let status = match session.portfolio.sites.len() {
            0 => format!("No sites under {}", session.portfolio.root.path().display()),
            n => format!("{n} site(s) loaded"),
        };
        let mut app = Self {
            session,
            site_idx,
            tab_idx: 0,
            metric: MetricCategory::Generation,
            month: 1,
            file_idx: 0,
            pane: None,
            status,
        };
        app.refresh_pane();
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn tab(&self) -> Tab {
        TABS[self.tab_idx]
    }

    fn site(&self) -> Option<&SiteCatalog> {
        self.session.portfolio.sites.get(self.site_idx)
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::Right => {
                self.tab_idx = (self.tab_idx + 1) % TABS.len();
                self.refresh_pane();
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.tab_idx = (self.tab_idx + TABS.len() - 1) % TABS.len();
                self.refresh_pane();
            }
            KeyCode::Up => {
                if self.site_idx > 0 {
                    self.site_idx -= 1;
                    self.file_idx = 0;
                    self.refresh_pane();
                }
            }
            KeyCode::Down => {
                if self.site_idx + 1 < self.session.portfolio.sites.len() {
                    self.site_idx += 1;
                    self.file_idx = 0;
                    self.refresh_pane();
                }
            }
            KeyCode::Char('m') => {
                self.metric = cycle_metric(self.metric, 1);
                self.status = format!("metric: {}", self.metric.display_name());
                self.refresh_pane();
            }
            KeyCode::Char('M') => {
                self.metric = cycle_metric(self.metric, -1);
                self.status = format!("metric: {}", self.metric.display_name());
                self.refresh_pane();
            }
            KeyCode::Char(']') => {
                self.month = self.month % 12 + 1;
                self.refresh_pane();
            }
            KeyCode::Char('[') => {
                self.month = (self.month + 10) % 12 + 1;
                self.refresh_pane();
            }
            KeyCode::Char('j') => {
                let count = self.explorer_files().len();
                if self.file_idx + 1 < count {
                    self.file_idx += 1;
                    self.refresh_pane();
                }
            }
            KeyCode::Char('k') => {
                if self.file_idx > 0 {
                    self.file_idx -= 1;
                    self.refresh_pane();
                }
            }
            KeyCode::Char('s') => self.save_selected(),
            KeyCode::Char('R') => self.rescan(),
            _ => {}
        }
        false
    }

    /// Files of the selected site across metric folders, in catalog order.
    fn explorer_files(&self) -> Vec<&DataFile> {
        self.site()
            .map(|site| site.metrics.values().flatten().collect())
            .unwrap_or_default()
    }

    fn save_selected(&mut self) {
        if self.tab() != Tab::Explorer {
            self.status = "Open the Explorer tab to save a file copy.".to_string();
            return;
        }
        let Some(file) = self.explorer_files().get(self.file_idx).map(|f| (*f).clone()) else {
            self.status = "No file selected.".to_string();
            return;
        };
        let root = self.session.portfolio.root.path();
        self.status = match save_copy(&file, &self.session.config.download_dir, root) {
            Ok(path) => {
                info!(file = %file.file_name, dest = %path.display(), "saved file copy");
                format!("Saved copy: {}", path.display())
            }
            Err(err) => {
                warn!(file = %file.file_name, error = %err, "save copy failed");
                format!("Save failed: {err}")
            }
        };
    }

    fn rescan(&mut self) {
        let selected = self.site().map(|s| s.site.folder_name.clone());
        match self.session.rescan() {
            Ok(count) => {
                self.site_idx = selected
                    .and_then(|name| {
                        self.session
                            .portfolio
                            .sites
                            .iter()
                            .position(|s| s.site.folder_name == name)
                    })
                    .unwrap_or(0);
                self.file_idx = 0;
                self.status = format!("Rescanned: {count} site(s)");
            }
            Err(err) => {
                warn!(error = %err, "rescan failed");
                self.status = format!("Rescan failed: {err}");
            }
        }
        self.refresh_pane();
    }

    /// Rebuild the main pane for the current site/tab/metric/month.
    fn refresh_pane(&mut self) {
        let Some(site) = self.session.portfolio.sites.get(self.site_idx) else {
            self.pane = None;
            return;
        };
        let loader = &mut self.session.loader;
        self.pane = Some(match TABS[self.tab_idx] {
            Tab::View(view) => Pane::Chart(build(loader, site, self.metric, view, self.month)),
            Tab::Combined => Pane::Combined(combined_charts(loader, site)),
            Tab::Explorer => {
                let files: Vec<&DataFile> = site.metrics.values().flatten().collect();
                Pane::Explorer(match files.get(self.file_idx) {
                    Some(file) => preview_rows(&file.path, self.session.config.preview_rows).map_err(|e| e.to_string()),
                    None => Err("No files for this site.".to_string()),
                })
            }
        });
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_tabs(frame, chunks[1]);
        self.draw_body(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("pdash", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" {}", self.session.portfolio.root.path().display())),
        ]));

        let site = self.site().map(|s| s.site.display_name.as_str()).unwrap_or("-");
        let cache = if self.session.config.use_cache {
            format!("on ({} tables)", self.session.loader.cached_tables())
        } else {
            "off".to_string()
        };
        lines.push(Line::from(Span::styled(
            format!(
                "site: {site} | metric: {} | month: {} | cache: {cache}",
                self.metric.display_name(),
                month_name(self.month).unwrap_or("-"),
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let tabs = Tabs::new(TABS.iter().map(|t| t.title()))
            .select(self.tab_idx)
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White));
        frame.render_widget(tabs, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Min(0)])
            .split(area);

        self.draw_sites(frame, chunks[0]);

        match &self.pane {
            None => draw_message(frame, chunks[1], "Sites", "No sites found. Press R to rescan."),
            Some(Pane::Chart(outcome)) => {
                draw_outcome(frame, chunks[1], self.tab().title(), outcome);
            }
            Some(Pane::Combined(outcome)) => match outcome {
                ChartOutcome::Ready(combined) => self.draw_combined(frame, chunks[1], combined),
                other => draw_message(frame, chunks[1], "Combined", &other.status_message().unwrap_or_default()),
            },
            Some(Pane::Explorer(preview)) => self.draw_explorer(frame, chunks[1], preview),
        }
    }

    fn draw_sites(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .session
            .portfolio
            .sites
            .iter()
            .map(|s| ListItem::new(format!("{} ({})", s.site.display_name, s.file_count())))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Sites").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        if !self.session.portfolio.sites.is_empty() {
            state.select(Some(self.site_idx));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_combined(&self, frame: &mut ratatui::Frame<'_>, area: Rect, combined: &CombinedCharts) {
        let block = Block::default().title(combined.title.as_str()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let n = combined.panels.len().max(1) as u32;
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints((0..n).map(|_| Constraint::Ratio(1, n)))
            .split(inner);

        for ((metric, outcome), rect) in combined.panels.iter().zip(rows.iter()) {
            draw_outcome(frame, *rect, metric.display_name(), outcome);
        }
    }

    fn draw_explorer(&self, frame: &mut ratatui::Frame<'_>, area: Rect, preview: &Preview) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Min(0)])
            .split(area);

        let files = self.explorer_files();
        let items: Vec<ListItem> = files
            .iter()
            .map(|f| {
                ListItem::new(format!(
                    "{}/{}  [{} {}]",
                    f.metric.folder_name(),
                    f.file_name,
                    f.resolution.label(),
                    f.kind.label()
                ))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().title("Files").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        if !files.is_empty() {
            state.select(Some(self.file_idx));
        }
        frame.render_stateful_widget(list, chunks[0], &mut state);

        match preview {
            Ok((headers, rows)) => {
                let widths = vec![Constraint::Min(8); headers.len().max(1)];
                let table = Table::new(rows.iter().map(|r| Row::new(r.clone())), widths)
                    .header(
                        Row::new(headers.clone()).style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan)),
                    )
                    .block(Block::default().title("Preview").borders(Borders::ALL));
                frame.render_widget(table, chunks[1]);
            }
            Err(message) => draw_message(frame, chunks[1], "Preview", message),
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ tab  ↑/↓ site  m metric  [/] month  j/k file  s save  R rescan  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn cycle_metric(cur: MetricCategory, delta: isize) -> MetricCategory {
    let all = MetricCategory::ALL;
    let idx = all.iter().position(|m| *m == cur).unwrap_or(0) as isize;
    let len = all.len() as isize;
    all[((idx + delta).rem_euclid(len)) as usize]
}

fn draw_message(frame: &mut ratatui::Frame<'_>, area: Rect, title: &str, message: &str) {
    let p = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::Yellow))
        .wrap(Wrap { trim: true })
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(p, area);
}

fn draw_outcome(frame: &mut ratatui::Frame<'_>, area: Rect, fallback_title: &str, outcome: &ChartOutcome) {
    match outcome {
        ChartOutcome::Ready(chart) => draw_chart(frame, area, chart),
        other => draw_message(frame, area, fallback_title, &other.status_message().unwrap_or_default()),
    }
}

fn draw_chart(frame: &mut ratatui::Frame<'_>, area: Rect, chart: &ChartSpec) {
    let block = Block::default().title(chart.title.as_str()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    let notes_height = chart.notes.len().min(4) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(notes_height),
        ])
        .split(inner);

    frame.render_widget(Paragraph::new(legend(chart)), chunks[0]);

    match PlottersChart::new(chart) {
        Some(widget) => frame.render_widget(widget, chunks[1]),
        None => frame.render_widget(
            Paragraph::new("No data available for this view").style(Style::default().fg(Color::Yellow)),
            chunks[1],
        ),
    }

    if notes_height > 0 {
        let notes = Paragraph::new(chart.notes.join("  ")).wrap(Wrap { trim: true });
        frame.render_widget(notes.style(Style::default().fg(Color::Gray)), chunks[2]);
    }
}

fn legend(chart: &ChartSpec) -> Line<'static> {
    let mut spans = Vec::new();
    for series in &chart.series {
        let (marker, color) = match series.style {
            SeriesStyle::Line => ("─", Color::Cyan),
            SeriesStyle::Dashed => ("╌", Color::Yellow),
            SeriesStyle::Points => ("•", Color::White),
        };
        spans.push(Span::styled(format!("{marker} {}  ", series.label), Style::default().fg(color)));
    }
    if let Some(band) = &chart.band {
        spans.push(Span::styled(format!("▒ {}", band.label), Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}
