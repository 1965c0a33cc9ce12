use crate::api::{ApiClient, ByteStream};
use crate::api::stream::StreamParser;
use crate::config::Config;
use crate::render;
use crate::state::{RunPhase, Session};
use crate::types::{ChartData, HistoryDetail, HistoryItem, StreamEvent};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task;

const TUI_TICK_INTERVAL: Duration = Duration::from_millis(120);

/// Updates flowing from background tasks into the single-writer update loop.
/// Stream and chart updates carry the generation of the run that spawned
/// them; the loop drops anything stale.
pub enum UiUpdate {
    Stream { generation: u64, event: StreamEvent },
    StreamClosed { generation: u64 },
    StreamFailed { generation: u64, message: String },
    Chart { generation: u64, data: ChartData },
    ChartUnavailable { generation: u64, message: String },
    History(Vec<HistoryItem>),
    HistoryUnavailable(String),
    HistoryDetail(Box<HistoryDetail>),
    HistoryDetailUnavailable(String),
}

pub struct App {
    config: Config,
    client: Arc<ApiClient>,
    session: Session,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
    update_rx: mpsc::UnboundedReceiver<UiUpdate>,
    terminal: Option<crate::terminal::TerminalType>,
    input: String,
    cursor_byte: usize,
    log_scroll: usize,
    chart: Option<ChartData>,
    chart_note: Option<String>,
    history: Vec<HistoryItem>,
    history_note: Option<String>,
    history_selected: usize,
    viewing_detail: Option<Box<HistoryDetail>>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let client = Arc::new(ApiClient::new(&config)?);
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            client,
            session: Session::new(),
            update_tx,
            update_rx,
            terminal: None,
            input: String::new(),
            cursor_byte: 0,
            log_scroll: 0,
            chart: None,
            chart_note: None,
            history: Vec::new(),
            history_note: None,
            history_selected: 0,
            viewing_detail: None,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.terminal = Some(crate::terminal::setup()?);
        spawn_history_task(
            Arc::clone(&self.client),
            self.config.history_limit,
            self.update_tx.clone(),
        );

        let mut tick = tokio::time::interval(TUI_TICK_INTERVAL);
        while !self.should_quit {
            self.draw_frame()?;
            self.process_key_events()?;

            tokio::select! {
                _ = tick.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
                update = self.update_rx.recv() => {
                    if let Some(update) = update {
                        self.handle_update(update);
                    }
                }
            }
        }

        crate::terminal::restore()?;
        Ok(())
    }

    /// One-shot mode for piped/scripted use: stream one run to stdout.
    pub async fn run_headless(&mut self, query: &str) -> Result<()> {
        let generation = match self.session.submit(query) {
            Some(generation) => generation,
            None => anyhow::bail!("a run is already in progress"),
        };

        // Chart fetch runs concurrently and never blocks the stream.
        let chart_client = Arc::clone(&self.client);
        let chart_query = query.to_string();
        let chart_handle =
            task::spawn(async move { chart_client.fetch_chart(&chart_query).await });

        match self.client.create_research_stream(query).await {
            Ok(stream) => self.consume_stream_headless(generation, stream).await,
            Err(e) => {
                self.session.fail(generation, e.to_string());
            }
        }

        match chart_handle.await {
            Ok(Ok(chart)) => {
                println!("chart: {} ({} points)", chart.symbol, chart.prices.len());
            }
            Ok(Err(e)) => eprintln!("warning: chart unavailable: {e}"),
            Err(e) => eprintln!("warning: chart task failed: {e}"),
        }

        let run = self.session.run();
        match run.phase() {
            RunPhase::Completed => {
                let result = run
                    .result()
                    .ok_or_else(|| anyhow::anyhow!("completed run without a result payload"))?;
                println!();
                println!(
                    "{}  [{}]",
                    render::company_name(&result.short_summary)
                        .unwrap_or_else(|| "Unknown".to_string()),
                    render::recommendation(&result.short_summary).label()
                );
                println!("{}", result.short_summary);
                println!();
                println!("{}", result.markdown_report);
                if result.verification.verified {
                    println!("Verification Passed");
                } else {
                    println!("Issues Found: {}", result.verification.issues);
                }
                self.export_report_if_configured();
                Ok(())
            }
            _ => anyhow::bail!(
                "research failed: {}",
                run.error().unwrap_or("stream ended unexpectedly")
            ),
        }
    }

    async fn consume_stream_headless(&mut self, generation: u64, mut stream: ByteStream) {
        let mut parser = StreamParser::new();
        while let Some(chunk_result) = stream.next().await {
            let chunk = match chunk_result {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.session.fail(generation, e.to_string());
                    return;
                }
            };
            let events = match parser.process(&chunk) {
                Ok(events) => events,
                Err(e) => {
                    self.session.fail(generation, e.to_string());
                    return;
                }
            };
            for event in events {
                print_headless_event(&event);
                self.session.dispatch(generation, event);
            }
        }
        if parser.has_partial_tail() {
            eprintln!("warning: discarding incomplete trailing frame");
            parser.discard_tail();
        }
        self.session.stream_closed(generation);
    }

    fn draw_frame(&mut self) -> Result<()> {
        let status_line = self.status_line_text();
        let Some(terminal) = self.terminal.as_mut() else {
            return Ok(());
        };

        let run = self.session.run();
        let input = &self.input;
        let cursor_byte = self.cursor_byte;
        let log_scroll = self.log_scroll;
        let chart = self.chart.as_ref();
        let chart_note = self.chart_note.as_deref();
        let history = &self.history;
        let history_note = self.history_note.as_deref();
        let history_selected = self.history_selected;
        let detail = self.viewing_detail.as_deref();

        terminal.draw(|frame| {
            let size = frame.area();
            let rows = ratatui::layout::Layout::default()
                .direction(ratatui::layout::Direction::Vertical)
                .constraints([
                    ratatui::layout::Constraint::Length(2),
                    ratatui::layout::Constraint::Min(8),
                    ratatui::layout::Constraint::Length(8),
                    ratatui::layout::Constraint::Length(1),
                    ratatui::layout::Constraint::Length(1),
                ])
                .split(size);

            let columns = ratatui::layout::Layout::default()
                .direction(ratatui::layout::Direction::Horizontal)
                .constraints([
                    ratatui::layout::Constraint::Min(40),
                    ratatui::layout::Constraint::Length(38),
                ])
                .split(rows[1]);

            let side = ratatui::layout::Layout::default()
                .direction(ratatui::layout::Direction::Vertical)
                .constraints([
                    ratatui::layout::Constraint::Length(7),
                    ratatui::layout::Constraint::Min(3),
                ])
                .split(columns[1]);

            crate::ui::render::render_stepper(frame, rows[0], run);
            crate::ui::render::render_report_pane(frame, columns[0], run, detail);
            crate::ui::render::render_chart(frame, side[0], chart, chart_note);
            crate::ui::render::render_history(
                frame,
                side[1],
                history,
                history_selected,
                history_note,
            );
            crate::ui::render::render_log(frame, rows[2], run, log_scroll);
            crate::ui::render::render_status_line(frame, rows[3], &status_line);
            crate::ui::render::render_input(frame, rows[4], input, cursor_byte, run);
        })?;

        Ok(())
    }

    fn status_line_text(&self) -> String {
        let run = self.session.run();
        let phase = match run.phase() {
            RunPhase::Idle => "idle",
            RunPhase::Running => "running",
            RunPhase::Completed => "completed",
            RunPhase::Failed => "failed",
        };
        let mut line = format!("{phase} | {}", self.config.base_url);
        if !run.query().is_empty() {
            line.push_str(" | ");
            line.push_str(run.query());
        }
        if run.is_running() {
            if let Some(elapsed) = run.elapsed() {
                line.push_str(&format!(" | {}s", elapsed.as_secs()));
            }
        }
        line.push_str(" | up/down history, ctrl-o open, pgup/pgdn log, ctrl-c quit");
        line
    }

    fn process_key_events(&mut self) -> Result<()> {
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Paste(text) => {
                    if !self.session.run().is_running() {
                        self.input.insert_str(self.cursor_byte, &text);
                        self.cursor_byte += text.len();
                    }
                }
                Event::Key(key)
                    if key.kind == KeyEventKind::Press || key.kind == KeyEventKind::Repeat =>
                {
                    self.handle_key_event(key);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => self.should_quit = true,
                KeyCode::Char('o') => self.open_selected_history(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::PageUp => {
                let len = self.session.run().log().len();
                self.log_scroll = if self.log_scroll == 0 {
                    len.saturating_sub(4)
                } else {
                    self.log_scroll.saturating_sub(3)
                }
                .max(1);
            }
            KeyCode::PageDown => {
                // Back at the tail, resume following it.
                self.log_scroll = self.log_scroll.saturating_add(3);
                if self.log_scroll >= self.session.run().log().len() {
                    self.log_scroll = 0;
                }
            }
            KeyCode::Up => {
                self.history_selected = self.history_selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if !self.history.is_empty() {
                    self.history_selected =
                        (self.history_selected + 1).min(self.history.len() - 1);
                }
            }
            KeyCode::Esc => {
                if self.viewing_detail.is_some() {
                    self.viewing_detail = None;
                } else {
                    self.input.clear();
                    self.cursor_byte = 0;
                }
            }
            KeyCode::Enter => {
                let query = self.input.trim().to_string();
                self.submit(&query);
            }
            KeyCode::Backspace => {
                if self.cursor_byte > 0 {
                    let previous = crate::ui::input_metrics::clamp_to_char_boundary_left(
                        &self.input,
                        self.cursor_byte - 1,
                    );
                    self.input.replace_range(previous..self.cursor_byte, "");
                    self.cursor_byte = previous;
                }
            }
            KeyCode::Left => {
                if self.cursor_byte > 0 {
                    self.cursor_byte = crate::ui::input_metrics::clamp_to_char_boundary_left(
                        &self.input,
                        self.cursor_byte - 1,
                    );
                }
            }
            KeyCode::Right => {
                if self.cursor_byte < self.input.len() {
                    let mut next = self.cursor_byte + 1;
                    while next < self.input.len() && !self.input.is_char_boundary(next) {
                        next += 1;
                    }
                    self.cursor_byte = next;
                }
            }
            KeyCode::Home => self.cursor_byte = 0,
            KeyCode::End => self.cursor_byte = self.input.len(),
            KeyCode::Char(ch) => {
                if !self.session.run().is_running() {
                    self.input.insert(self.cursor_byte, ch);
                    self.cursor_byte += ch.len_utf8();
                }
            }
            _ => {}
        }
    }

    /// Starts a new run. The previous stream's transport is not aborted; its
    /// remaining events carry a stale generation and die at the dispatcher.
    fn submit(&mut self, query: &str) {
        if query.is_empty() {
            return;
        }
        let Some(generation) = self.session.submit(query) else {
            return;
        };

        self.input.clear();
        self.cursor_byte = 0;
        self.log_scroll = 0;
        self.viewing_detail = None;
        self.chart = None;
        self.chart_note = Some(match render::ticker_for(query) {
            Some(ticker) => format!("Loading chart for {ticker}..."),
            None => "Loading chart...".to_string(),
        });

        spawn_stream_task(
            Arc::clone(&self.client),
            query.to_string(),
            generation,
            self.update_tx.clone(),
        );
        spawn_chart_task(
            Arc::clone(&self.client),
            query.to_string(),
            generation,
            self.update_tx.clone(),
        );
    }

    fn handle_update(&mut self, update: UiUpdate) {
        match update {
            UiUpdate::Stream { generation, event } => {
                // Late log appends to an already-terminal run are accepted
                // but must not re-trigger the completion effects.
                let was_terminal = self.session.run().is_terminal();
                if self.session.dispatch(generation, event) && !was_terminal {
                    self.on_phase_change();
                }
            }
            UiUpdate::StreamClosed { generation } => {
                if self.session.stream_closed(generation) {
                    self.on_phase_change();
                }
            }
            UiUpdate::StreamFailed {
                generation,
                message,
            } => {
                if self.session.fail(generation, message) {
                    self.on_phase_change();
                }
            }
            UiUpdate::Chart { generation, data } => {
                if generation == self.session.generation() {
                    self.chart = Some(data);
                    self.chart_note = None;
                }
            }
            UiUpdate::ChartUnavailable {
                generation,
                message,
            } => {
                if generation == self.session.generation() {
                    self.chart = None;
                    self.chart_note = Some(message);
                }
            }
            UiUpdate::History(items) => {
                self.history = items;
                self.history_note = None;
                if self.history_selected >= self.history.len() {
                    self.history_selected = self.history.len().saturating_sub(1);
                }
            }
            UiUpdate::HistoryUnavailable(message) => {
                self.history_note = Some(message);
            }
            UiUpdate::HistoryDetail(detail) => {
                self.viewing_detail = Some(detail);
            }
            UiUpdate::HistoryDetailUnavailable(message) => {
                self.history_note = Some(message);
            }
        }
    }

    fn on_phase_change(&mut self) {
        if !self.session.run().is_terminal() {
            return;
        }
        if self.session.run().is_completed() {
            self.export_report_if_configured();
            // The backend persists completed runs; pick up the new entry.
            spawn_history_task(
                Arc::clone(&self.client),
                self.config.history_limit,
                self.update_tx.clone(),
            );
        }
    }

    fn open_selected_history(&mut self) {
        let Some(item) = self.history.get(self.history_selected) else {
            return;
        };
        spawn_history_detail_task(Arc::clone(&self.client), item.id, self.update_tx.clone());
    }

    fn export_report_if_configured(&self) {
        let Some(path) = &self.config.export_path else {
            return;
        };
        let Some(result) = self.session.run().result() else {
            return;
        };
        let path = if path.is_absolute() {
            path.clone()
        } else {
            self.config.working_dir.join(path)
        };
        let html = render::report::render_report(result);
        if let Err(e) = std::fs::write(&path, html) {
            eprintln!("warning: failed to write report to {}: {e}", path.display());
        }
    }
}

fn print_headless_event(event: &StreamEvent) {
    match event {
        StreamEvent::Status {
            stage,
            message,
            done,
        } => {
            let label = stage.map(|s| s.label()).unwrap_or("start");
            let suffix = if *done { " (done)" } else { "" };
            match message {
                Some(message) => println!("* {label}: {message}{suffix}"),
                None => println!("* {label}{suffix}"),
            }
        }
        StreamEvent::AgentLog(entry) => match &entry.details {
            Some(details) => println!("  [{}] {}: {details}", entry.agent, entry.action),
            None => println!("  [{}] {}", entry.agent, entry.action),
        },
        StreamEvent::Complete(_) => println!("* complete"),
        StreamEvent::Error { message } => eprintln!("* error: {message}"),
        StreamEvent::Unknown => {}
    }
}

fn spawn_stream_task(
    client: Arc<ApiClient>,
    query: String,
    generation: u64,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
) {
    task::spawn(async move {
        let mut stream = match client.create_research_stream(&query).await {
            Ok(stream) => stream,
            Err(e) => {
                let _ = update_tx.send(UiUpdate::StreamFailed {
                    generation,
                    message: e.to_string(),
                });
                return;
            }
        };

        let mut parser = StreamParser::new();
        while let Some(chunk_result) = stream.next().await {
            let chunk = match chunk_result {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = update_tx.send(UiUpdate::StreamFailed {
                        generation,
                        message: e.to_string(),
                    });
                    return;
                }
            };
            match parser.process(&chunk) {
                Ok(events) => {
                    for event in events {
                        let _ = update_tx.send(UiUpdate::Stream { generation, event });
                    }
                }
                Err(e) => {
                    let _ = update_tx.send(UiUpdate::StreamFailed {
                        generation,
                        message: e.to_string(),
                    });
                    return;
                }
            }
        }

        if parser.has_partial_tail() {
            eprintln!("warning: discarding incomplete trailing frame");
            parser.discard_tail();
        }
        let _ = update_tx.send(UiUpdate::StreamClosed { generation });
    });
}

fn spawn_chart_task(
    client: Arc<ApiClient>,
    query: String,
    generation: u64,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
) {
    task::spawn(async move {
        let update = match client.fetch_chart(&query).await {
            Ok(data) => UiUpdate::Chart { generation, data },
            Err(e) => UiUpdate::ChartUnavailable {
                generation,
                message: e.to_string(),
            },
        };
        let _ = update_tx.send(update);
    });
}

fn spawn_history_task(
    client: Arc<ApiClient>,
    limit: usize,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
) {
    task::spawn(async move {
        let update = match client.fetch_history(limit).await {
            Ok(items) => UiUpdate::History(items),
            Err(e) => UiUpdate::HistoryUnavailable(e.to_string()),
        };
        let _ = update_tx.send(update);
    });
}

fn spawn_history_detail_task(
    client: Arc<ApiClient>,
    id: i64,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
) {
    task::spawn(async move {
        let update = match client.fetch_history_detail(id).await {
            Ok(detail) => UiUpdate::HistoryDetail(Box::new(detail)),
            Err(e) => UiUpdate::HistoryDetailUnavailable(e.to_string()),
        };
        let _ = update_tx.send(update);
    });
}
