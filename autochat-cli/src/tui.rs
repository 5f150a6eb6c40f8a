//! Full-screen chat with a toggleable history sidebar

use crate::chat::{handle_send, parse_input, InputCommand, PendingImage, WELCOME_MESSAGE};
use anyhow::Result;
use autochat_core::{
    ChatTranscript, ChatView, HistoryView, Message, SelectOutcome, Sender, SessionStore,
    SidebarState,
};
use autochat_providers::ChatProvider;
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

const SIDEBAR_WIDTH: u16 = 40;
const PAGE_LINES: usize = 10;

/// Work the event loop has to await before reading the next key
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Send(String),
    LoadImage(PathBuf),
}

struct ChatApp {
    view: ChatView<ChatTranscript>,
    history: HistoryView,
    pending: PendingImage,
    input: String,
    selected: usize,
    notice: Option<String>,
    action: Option<Action>,
    should_quit: bool,
    model: String,
}

impl ChatApp {
    fn new(store: SessionStore, model: String) -> Self {
        Self {
            view: ChatView::new(store.clone(), ChatTranscript::new()),
            history: HistoryView::new(store),
            pending: PendingImage::default(),
            input: String::new(),
            selected: 0,
            notice: None,
            action: None,
            should_quit: false,
            model,
        }
    }

    fn busy(&self) -> bool {
        matches!(self.action, Some(Action::Send(_)))
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let sidebar_open = self.history.sidebar().is_expanded();
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => {
                if self.history.toggle_sidebar() == SidebarState::Expanded {
                    self.selected = 0;
                }
            }
            KeyCode::Up if sidebar_open => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down if sidebar_open => {
                let last = self.history.entries().len().saturating_sub(1);
                self.selected = (self.selected + 1).min(last);
            }
            KeyCode::Up => self.view.transcript_mut().scroll_up(1),
            KeyCode::Down => self.view.transcript_mut().scroll_down(1),
            KeyCode::PageUp => self.view.transcript_mut().scroll_up(PAGE_LINES),
            KeyCode::PageDown => self.view.transcript_mut().scroll_down(PAGE_LINES),
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(ch) => self.input.push(ch),
            _ => {}
        }
    }

    fn submit(&mut self) {
        let input = std::mem::take(&mut self.input);
        self.notice = None;

        match parse_input(&input) {
            InputCommand::Empty if self.history.sidebar().is_expanded() => {
                self.open_selected();
            }
            InputCommand::Empty => {
                if self.pending.is_loaded() {
                    self.action = Some(Action::Send(String::new()));
                }
            }
            InputCommand::Quit => self.should_quit = true,
            InputCommand::AttachImage(path) => self.action = Some(Action::LoadImage(path)),
            InputCommand::OpenSession(number) => self.open_session(number - 1),
            InputCommand::Send(text) => self.action = Some(Action::Send(text)),
            InputCommand::Invalid(usage) => self.notice = Some(usage),
        }
    }

    fn open_selected(&mut self) {
        match self
            .history
            .activate(self.selected, self.view.transcript_mut())
        {
            Some(outcome) => self.report(outcome),
            None => self.notice = Some("No saved sessions yet".to_string()),
        }
    }

    fn open_session(&mut self, index: usize) {
        let outcome = self
            .history
            .select_session(index, self.view.transcript_mut());
        self.report(outcome);
    }

    fn report(&mut self, outcome: SelectOutcome) {
        self.notice = Some(match outcome {
            SelectOutcome::Loaded { index, messages } => {
                format!("Showing session {} ({} messages)", index + 1, messages)
            }
            SelectOutcome::NotFound { index } => format!("Session {} not found", index + 1),
        });
    }
}

/// Run the interactive chat until the user quits
pub async fn run(
    store: SessionStore,
    provider: &dyn ChatProvider,
    fallback: &str,
) -> Result<()> {
    let session = store.initialize_session()?;
    info!(session, model = %provider.model(), "Chat started");

    let mut app = ChatApp::new(store, provider.model());
    app.view
        .append_to_transcript(WELCOME_MESSAGE, Sender::Bot, false, false)?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, provider, fallback).await;

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut ChatApp,
    provider: &dyn ChatProvider,
    fallback: &str,
) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Drawn once with the busy status before the await.
        if let Some(action) = app.action.take() {
            match action {
                Action::Send(text) => {
                    handle_send(&mut app.view, provider, &mut app.pending, &text, fallback).await;
                }
                Action::LoadImage(path) => match app.pending.load(&path).await {
                    Ok(()) => app.notice = Some(format!("Image loaded: {}", path.display())),
                    Err(e) => {
                        warn!("Image load failed: {}", e);
                        app.notice = Some(format!("Could not load image: {}", e));
                    }
                },
            }
            continue;
        }

        if event::poll(Duration::from_millis(60))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn draw(frame: &mut Frame, app: &mut ChatApp) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let status = if app.busy() { "thinking" } else { "idle" };
    let mut header = vec![Line::from(format!(
        "model: {} | status: {} | Tab history, /image <path>, /open <n>, /quit",
        app.model, status
    ))];
    if let Some(notice) = &app.notice {
        header.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow),
        )));
    }
    frame.render_widget(
        Paragraph::new(header).block(Block::default().borders(Borders::ALL).title("autochat")),
        rows[0],
    );

    let transcript_area = if app.history.sidebar().is_expanded() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
            .split(rows[1]);
        draw_sidebar(frame, app, columns[0]);
        columns[1]
    } else {
        rows[1]
    };
    draw_transcript(frame, app, transcript_area);

    let (text, style) = if app.input.is_empty() {
        (
            app.pending.placeholder().to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (app.input.clone(), Style::default())
    };
    frame.render_widget(
        Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::ALL).title("message")),
        rows[2],
    );
    let typed = u16::try_from(app.input.chars().count()).unwrap_or(u16::MAX);
    frame.set_cursor_position((
        rows[2].x.saturating_add(1).saturating_add(typed),
        rows[2].y + 1,
    ));
}

fn draw_sidebar(frame: &mut Frame, app: &ChatApp, area: Rect) {
    let items: Vec<ListItem> = app
        .history
        .entries()
        .iter()
        .map(|entry| ListItem::new(entry.label()))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("history"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_transcript(frame: &mut Frame, app: &mut ChatApp, area: Rect) {
    let lines: Vec<Line> = app
        .view
        .transcript()
        .messages()
        .iter()
        .flat_map(message_lines)
        .collect();
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });

    // Offsets are in wrapped rows, not logical lines.
    let rows = paragraph.line_count(area.width.saturating_sub(2));
    let visible = area.height.saturating_sub(2) as usize;
    let max_scroll = rows.saturating_sub(visible);

    let transcript = app.view.transcript_mut();
    transcript.clamp_scroll_back(max_scroll);
    let offset = max_scroll - transcript.scroll_back();

    frame.render_widget(
        paragraph
            .block(Block::default().borders(Borders::ALL).title("chat"))
            .scroll((u16::try_from(offset).unwrap_or(u16::MAX), 0)),
        area,
    );
}

fn message_lines(message: &Message) -> Vec<Line<'static>> {
    let (label, color) = match message.sender {
        Sender::User => ("you", Color::Cyan),
        Sender::Bot => ("bot", Color::Green),
    };
    let prefix = Span::styled(format!("[{}] ", label), Style::default().fg(color));

    if message.is_image {
        return vec![Line::from(vec![
            prefix,
            Span::styled("[image]", Style::default().fg(Color::Magenta)),
        ])];
    }

    let mut lines = Vec::new();
    for (i, text) in message.text.lines().enumerate() {
        let mut spans = if i == 0 {
            vec![prefix.clone()]
        } else {
            vec![Span::raw("      ")]
        };
        spans.extend(bold_spans(text));
        lines.push(Line::from(spans));
    }
    if lines.is_empty() {
        lines.push(Line::from(prefix));
    }
    lines.push(Line::default());
    lines
}

/// Render `**bold**` runs; everything else is plain
fn bold_spans(text: &str) -> Vec<Span<'static>> {
    text.split("**")
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| {
            if i % 2 == 1 {
                Span::styled(
                    part.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw(part.to_string())
            }
        })
        .collect()
}
