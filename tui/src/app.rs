//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize, frame ticks)
//! - At most one stream (chat or upload) in flight
//! - DisplayState for rendering, ConversationStore for committed turns
//!
//! Keys: `Tab` switches between the Chat and Upload tabs, `Enter` submits,
//! `Esc` cancels the running stream, `Ctrl-C` quits. Input on both tabs is
//! locked while a stream is running.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Wrap};
use ratatui::{Frame, Terminal};
use tokio::time::MissedTickBehavior;

use ragchat_core::backend::load_files;
use ragchat_core::{
    prepare_query, ActiveChat, ActiveUpload, ChatBackend, ConversationStore, UploadBackend,
};

use crate::display::DisplayState;
use crate::theme::{line_style, ACCENT, DIM_GRAY, USER_GREEN};

/// Input box height (lines) including its top border
const INPUT_HEIGHT: u16 = 4;

/// Target ~20 FPS; streams are drained once per frame
const FRAME_DURATION: Duration = Duration::from_millis(50);

/// The two views
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    /// Ask questions
    Chat,
    /// Upload documents
    Upload,
}

impl Tab {
    fn index(self) -> usize {
        match self {
            Tab::Chat => 0,
            Tab::Upload => 1,
        }
    }

    fn toggle(self) -> Self {
        match self {
            Tab::Chat => Tab::Upload,
            Tab::Upload => Tab::Chat,
        }
    }

    fn prompt(self) -> &'static str {
        match self {
            Tab::Chat => "You: ",
            Tab::Upload => "Files: ",
        }
    }
}

/// Main application state
pub struct App {
    // === Core State ===
    /// Is the app still running?
    running: bool,
    /// Selected view
    tab: Tab,

    // === Backends ===
    chat: Arc<dyn ChatBackend>,
    upload: Arc<dyn UploadBackend>,
    /// Base URL for source links
    docs_base_url: String,

    // === Streams ===
    active_chat: Option<ActiveChat>,
    active_upload: Option<ActiveUpload>,

    // === Conversation ===
    store: ConversationStore,
    display: DisplayState,

    // === Input State ===
    /// Input buffer per tab
    chat_input: String,
    upload_input: String,
    /// Scroll offset (lines from bottom, 0 = latest)
    scroll_offset: usize,
    /// Total rendered lines (for scroll bounds)
    total_lines: usize,
    /// Height of the body area at the last draw
    body_height: u16,
}

impl App {
    /// Create a new App instance
    pub fn new(
        chat: Arc<dyn ChatBackend>,
        upload: Arc<dyn UploadBackend>,
        docs_base_url: impl Into<String>,
    ) -> Self {
        Self {
            running: true,
            tab: Tab::Chat,
            chat,
            upload,
            docs_base_url: docs_base_url.into(),
            active_chat: None,
            active_upload: None,
            store: ConversationStore::new(),
            display: DisplayState::new(),
            chat_input: String::new(),
            upload_input: String::new(),
            scroll_offset: 0,
            total_lines: 0,
            body_height: 0,
        }
    }

    /// Main event loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();
        let mut frames = tokio::time::interval(FRAME_DURATION);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        terminal.draw(|frame| self.draw(frame))?;

        while self.running {
            tokio::select! {
                biased;

                maybe_event = event_stream.next() => match maybe_event {
                    // Only handle Press events (not Release or Repeat)
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key).await;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Terminal event error");
                    }
                    None => self.running = false,
                },

                _ = frames.tick() => {}
            }

            self.poll_streams();
            terminal.draw(|frame| self.draw(frame))?;
        }

        self.cancel_all();
        Ok(())
    }

    /// Drain both streams and commit anything that finished
    pub fn poll_streams(&mut self) {
        if let Some(chat) = self.active_chat.as_mut() {
            for update in chat.poll() {
                self.display.apply_chat_update(&update);
            }
            if chat.is_finished() {
                self.finish_chat();
            }
        }

        if let Some(upload) = self.active_upload.as_mut() {
            for update in upload.poll() {
                self.display.apply_upload_update(&update);
            }
            if upload.is_finished() {
                let state = upload.progress().state();
                tracing::info!(state = state.description(), "Upload finished");
                self.active_upload = None;
            }
        }
    }

    fn finish_chat(&mut self) {
        let Some(chat) = self.active_chat.take() else {
            return;
        };
        if let Some(index) = chat.finish(&mut self.store) {
            match self.store.get_turn(index) {
                Ok(turn) => self.display.commit_turn(&turn),
                Err(e) => tracing::warn!(error = %e, "Committed turn missing"),
            }
        }
        self.scroll_offset = 0;
    }

    /// Handle keyboard input
    pub async fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }
            KeyCode::Esc => self.cancel_active(),
            KeyCode::Tab => {
                self.tab = self.tab.toggle();
                self.scroll_offset = 0;
            }
            KeyCode::Enter => self.submit().await,
            KeyCode::Char(c) => {
                if !self.is_busy() {
                    self.input_mut().push(c);
                }
            }
            KeyCode::Backspace => {
                if !self.is_busy() {
                    self.input_mut().pop();
                }
            }
            KeyCode::PageUp => {
                let page = usize::from(self.body_height / 2).max(1);
                let max_scroll = self.total_lines.saturating_sub(1);
                self.scroll_offset = (self.scroll_offset + page).min(max_scroll);
            }
            KeyCode::PageDown => {
                let page = usize::from(self.body_height / 2).max(1);
                self.scroll_offset = self.scroll_offset.saturating_sub(page);
            }
            _ => {}
        }
    }

    async fn submit(&mut self) {
        if self.is_busy() {
            return;
        }
        match self.tab {
            Tab::Chat => {
                let Some(query) = prepare_query(&self.chat_input) else {
                    return;
                };
                self.chat_input.clear();
                self.display.begin_turn(&query);
                self.active_chat = Some(ActiveChat::start(self.chat.as_ref(), &query).await);
                self.scroll_offset = 0;
            }
            Tab::Upload => {
                let paths: Vec<PathBuf> = self
                    .upload_input
                    .split_whitespace()
                    .map(PathBuf::from)
                    .collect();
                if paths.is_empty() {
                    return;
                }
                match load_files(&paths).await {
                    Ok(files) => {
                        self.upload_input.clear();
                        self.display
                            .begin_upload(files.iter().map(|f| f.name.clone()).collect());
                        self.active_upload =
                            Some(ActiveUpload::start(self.upload.as_ref(), files).await);
                        self.scroll_offset = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not read upload files");
                        self.display.notify(format!("{e:#}"));
                    }
                }
            }
        }
    }

    /// Cancel the running stream; nothing is committed
    fn cancel_active(&mut self) {
        if let Some(chat) = self.active_chat.take() {
            chat.cancel();
            self.display.cancel_turn();
        }
        if let Some(upload) = self.active_upload.take() {
            upload.cancel();
            self.display.cancel_upload();
        }
    }

    fn cancel_all(&mut self) {
        if let Some(chat) = self.active_chat.take() {
            chat.cancel();
        }
        if let Some(upload) = self.active_upload.take() {
            upload.cancel();
        }
    }

    fn input_mut(&mut self) -> &mut String {
        match self.tab {
            Tab::Chat => &mut self.chat_input,
            Tab::Upload => &mut self.upload_input,
        }
    }

    fn input(&self) -> &str {
        match self.tab {
            Tab::Chat => &self.chat_input,
            Tab::Upload => &self.upload_input,
        }
    }

    /// Whether a stream is in flight on either tab
    pub fn is_busy(&self) -> bool {
        self.active_chat.is_some() || self.active_upload.is_some()
    }

    /// Is the app still running?
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Selected view
    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Committed turns
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Display state
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Draw one frame
    pub fn draw(&mut self, frame: &mut Frame) {
        let [tabs_area, body_area, input_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let tabs = Tabs::new(vec![" Chat ", " Upload "])
            .select(self.tab.index())
            .style(Style::default().fg(DIM_GRAY))
            .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, tabs_area);

        self.draw_body(frame, body_area);

        let input_text = if self.is_busy() {
            "(streaming, Esc to cancel)".to_string()
        } else {
            format!("{}{}_", self.tab.prompt(), self.input())
        };
        let input = Paragraph::new(input_text)
            .style(Style::default().fg(USER_GREEN))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(DIM_GRAY)),
            );
        frame.render_widget(input, input_area);

        frame.render_widget(
            Paragraph::new(self.status_line()).style(Style::default().fg(DIM_GRAY)),
            status_area,
        );
    }

    fn draw_body(&mut self, frame: &mut Frame, area: Rect) {
        let width = usize::from(area.width.max(1));
        let height = usize::from(area.height);
        self.body_height = area.height;

        let lines = match self.tab {
            Tab::Chat => self.display.chat_lines(width, &self.docs_base_url),
            Tab::Upload => self.display.upload_lines(width),
        };
        self.total_lines = lines.len();

        // Clamp scroll offset
        let max_scroll = self.total_lines.saturating_sub(height);
        self.scroll_offset = self.scroll_offset.min(max_scroll);

        let visible_end = self.total_lines.saturating_sub(self.scroll_offset);
        let visible_start = visible_end.saturating_sub(height);

        let text: Vec<Line> = lines[visible_start..visible_end]
            .iter()
            .map(|line| Line::styled(line.text.clone(), line_style(line.kind)))
            .collect();
        frame.render_widget(Paragraph::new(text), area);
    }

    fn status_line(&self) -> String {
        let state = if self.active_chat.is_some() {
            "Answering"
        } else if self.active_upload.is_some() {
            "Uploading"
        } else {
            "Ready"
        };
        let scroll_info = if self.scroll_offset > 0 {
            format!(" [^{} lines]", self.scroll_offset)
        } else {
            String::new()
        };
        let notice = self
            .display
            .notification
            .as_ref()
            .map(|n| format!(" | {n}"))
            .unwrap_or_default();
        format!(
            " {state} | {} turns | Tab switch | Esc cancel | Ctrl-C quit{scroll_info}{notice}",
            self.store.turn_count()
        )
    }
}
