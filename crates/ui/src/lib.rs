//! ratatui-based reader.

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Context as _;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use folio_application::{ReadingSession, SessionState, Step};
use folio_core::Theme;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Gauge, Padding, Paragraph, Wrap};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TITLE_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiExit {
    Quit,
}

/// Window background, paper and ink colours of a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub window: Color,
    pub paper: Color,
    pub text: Color,
}

pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            window: Color::Rgb(243, 244, 246),
            paper: Color::Rgb(255, 255, 255),
            text: Color::Rgb(17, 24, 39),
        },
        Theme::Dark => Palette {
            window: Color::Rgb(17, 24, 39),
            paper: Color::Rgb(31, 41, 55),
            text: Color::Rgb(209, 213, 219),
        },
        Theme::Sepia => Palette {
            window: Color::Rgb(231, 229, 228),
            paper: Color::Rgb(244, 236, 216),
            text: Color::Rgb(17, 24, 39),
        },
    }
}

/// Keeps the first `max_width` terminal columns of `title` and marks a cut
/// with a trailing `...`.
pub fn truncate_title(title: &str, max_width: usize) -> String {
    if title.width() <= max_width {
        return title.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in title.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max_width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push_str("...");
    out
}

pub struct Ui {
    session: ReadingSession,
    scroll: u16,
    notice: Option<String>,
}

impl Ui {
    pub fn new(session: ReadingSession) -> Self {
        Self {
            session,
            scroll: 0,
            notice: None,
        }
    }

    pub fn session(&self) -> &ReadingSession {
        &self.session
    }

    pub fn into_session(self) -> ReadingSession {
        self.session
    }

    pub fn run(&mut self) -> anyhow::Result<UiExit> {
        let mut terminal = setup_terminal()?;
        terminal.clear().ok();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);

        match (result, restore_result) {
            (Ok(Ok(exit)), Ok(())) => Ok(exit),
            (Ok(Ok(_)), Err(err)) => Err(err),
            (Ok(Err(err)), _) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<UiExit> {
        let tick_rate = Duration::from_millis(250);
        let mut needs_redraw = true;

        loop {
            if needs_redraw {
                terminal.draw(|frame| self.draw(frame.area(), frame))?;
                needs_redraw = false;
            }

            if !event::poll(tick_rate)? {
                continue;
            }

            match event::read()? {
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    needs_redraw = true;
                    if let Some(exit) = self.handle_key(key) {
                        return Ok(exit);
                    }
                }
                _ => {}
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<UiExit> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Some(UiExit::Quit),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') | KeyCode::Char(' ') => {
                let step = self.session.next();
                self.after_step(step);
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => {
                let step = self.session.prev();
                self.after_step(step);
            }
            KeyCode::Char('g') => {
                let step = self.session.go_to(0);
                self.after_step(step);
            }
            KeyCode::Char('G') => {
                let step = self.session.go_to(usize::MAX);
                self.after_step(step);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll = self.scroll.saturating_add(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            KeyCode::Char('t') => {
                self.session.cycle_theme();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.session.font_larger();
            }
            KeyCode::Char('-') => {
                self.session.font_smaller();
            }
            _ => {}
        }
        None
    }

    fn after_step(&mut self, step: Step) {
        if step.moved {
            self.scroll = 0;
        }
        self.notice = match (step.warning, self.session.state()) {
            (Some(err), _) => Some(format!("progress not saved: {err}")),
            (None, SessionState::Finished) => Some("end of book".to_string()),
            (None, _) => None,
        };
    }

    pub fn draw(&self, area: Rect, frame: &mut ratatui::Frame) {
        let prefs = self.session.prefs();
        let colors = palette(prefs.theme);
        frame.render_widget(Block::default().style(Style::default().bg(colors.window)), area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(area);

        let paper = Style::default().bg(colors.paper).fg(colors.text);
        let title = self
            .session
            .book()
            .map(|book| truncate_title(&book.title, TITLE_WIDTH))
            .unwrap_or_else(|| "No book open".to_string());
        let page_line = format!(
            "Page {} of {} · {} · {}px",
            self.session.page_index() + 1,
            self.session.total_pages().max(1),
            prefs.theme,
            prefs.font_size.get()
        );
        let header = Paragraph::new(Text::from(vec![
            Line::from(Span::styled(
                title.to_uppercase(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(page_line, Style::default().add_modifier(Modifier::DIM))),
        ]))
        .alignment(Alignment::Center)
        .style(paper)
        .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(header, layout[0]);

        let ratio = self.session.progress().map_or(0.0, |p| p.ratio());
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Rgb(251, 146, 60)).bg(colors.paper))
            .ratio(ratio.clamp(0.0, 1.0))
            .label("");
        frame.render_widget(gauge, layout[1]);

        // Larger type gets wider margins, keeping the measure comfortable.
        let margin = (prefs.font_size.get() - folio_core::FontSize::MIN) / 2 + 2;
        let body = Paragraph::new(self.session.current_page().unwrap_or(""))
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .style(paper)
            .block(Block::default().padding(Padding::new(margin, margin, 1, 1)));
        frame.render_widget(body, layout[2]);

        let mut footer_spans = vec![
            Span::styled("←/→", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" page  "),
            Span::styled("↑/↓", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" scroll  "),
            Span::styled("g/G", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" first/last  "),
            Span::styled("t", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" theme  "),
            Span::styled("+/-", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" size  "),
            Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" quit"),
        ];
        if let Some(note) = &self.notice {
            footer_spans.push(Span::raw("  |  "));
            footer_spans.push(Span::styled(
                note.clone(),
                Style::default()
                    .fg(Color::Rgb(234, 88, 12))
                    .add_modifier(Modifier::BOLD),
            ));
        }
        let footer = Paragraph::new(Line::from(footer_spans))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(paper)
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, layout[3]);
    }
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen).context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("leave alt screen")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}
