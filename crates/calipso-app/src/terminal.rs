//! Terminal frontend: draws frames with half-block characters, two pixels per
//! character cell, and reads the keyboard through crossterm.

use calipso_core::{Error, Result, Rgb};
use calipso_render::Frame;
use calipso_runtime::{InputEvent, InputFrame, Key, KeyPress, Platform, StatusLine};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen, SetTitle,
    },
};
use std::io::{self, Stdout, Write};
use std::time::Duration;
use tracing::{debug, error};

const HALF_BLOCK: char = '▀';

pub struct TerminalPlatform {
    out: Stdout,
    title: String,
    /// Simulation text last written to the window title
    caption: Option<String>,
    active: bool,
    needs_clear: bool,
}

impl TerminalPlatform {
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            title: String::new(),
            caption: None,
            active: false,
            needs_clear: true,
        }
    }

    fn restore(&mut self) -> io::Result<()> {
        self.active = false;
        execute!(self.out, ResetColor, Show, LeaveAlternateScreen)?;
        disable_raw_mode()
    }

    fn draw_image(&mut self, frame: &Frame, cols: usize, rows: usize) -> io::Result<()> {
        if cols == 0 || rows == 0 || frame.width() == 0 || frame.height() == 0 {
            return Ok(());
        }

        let scale = (cols as f64 / frame.width() as f64)
            .min((rows * 2) as f64 / frame.height() as f64);
        let width = ((frame.width() as f64 * scale) as usize).clamp(1, cols);
        let height = ((frame.height() as f64 * scale) as usize).clamp(1, rows * 2);
        let image = frame.scaled(width, height);

        for row in 0..height.div_ceil(2) {
            queue!(self.out, MoveTo(0, row as u16))?;
            let mut last = None;
            for x in 0..width {
                let top = image.get(x, row * 2).unwrap_or(Rgb::BLACK);
                let bottom = image.get(x, row * 2 + 1).unwrap_or(Rgb::BLACK);
                if last != Some((top, bottom)) {
                    queue!(
                        self.out,
                        SetForegroundColor(color(top)),
                        SetBackgroundColor(color(bottom))
                    )?;
                    last = Some((top, bottom));
                }
                queue!(self.out, Print(HALF_BLOCK))?;
            }
        }
        Ok(())
    }
}

impl Default for TerminalPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalPlatform {
    fn drop(&mut self) {
        if self.active {
            if let Err(err) = self.restore() {
                error!(?err, "failed to restore terminal");
            }
        }
    }
}

impl Platform for TerminalPlatform {
    fn open(&mut self, title: &str, width: usize, height: usize) -> Result<()> {
        enable_raw_mode().map_err(backend("failed to enable raw mode"))?;
        self.active = true;
        execute!(
            self.out,
            EnterAlternateScreen,
            Hide,
            SetTitle(title),
            Clear(ClearType::All)
        )
        .map_err(backend("failed to enter alternate screen"))?;

        self.title = title.to_string();
        self.needs_clear = false;
        debug!(title, width, height, "Terminal opened");
        Ok(())
    }

    fn poll_input(&mut self) -> Result<InputFrame> {
        let mut input = InputFrame::empty();
        while event::poll(Duration::ZERO).map_err(backend("failed to poll input"))? {
            match event::read().map_err(backend("failed to read input"))? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if let Some(event) = translate(key, &mut input) {
                        input.events.push(event);
                    }
                }
                Event::Resize(..) => self.needs_clear = true,
                _ => {}
            }
        }
        Ok(input)
    }

    fn present(&mut self, frame: &Frame, status: &StatusLine) -> Result<()> {
        let (cols, rows) = terminal::size().map_err(backend("failed to read terminal size"))?;
        let (cols, rows) = (cols as usize, rows as usize);

        if self.needs_clear {
            queue!(self.out, ResetColor, Clear(ClearType::All))
                .map_err(backend("failed to clear terminal"))?;
            self.needs_clear = false;
        }

        if status.detail != self.caption {
            let title = match &status.detail {
                Some(detail) => format!("{} | {detail}", self.title),
                None => self.title.clone(),
            };
            queue!(self.out, SetTitle(title)).map_err(backend("failed to set title"))?;
            self.caption = status.detail.clone();
        }

        self.draw_image(frame, cols, rows.saturating_sub(1))
            .map_err(backend("failed to draw frame"))?;

        let mut line = format!("{} | {}", self.title, status);
        line.truncate(line.char_indices().nth(cols).map_or(line.len(), |(i, _)| i));
        queue!(
            self.out,
            ResetColor,
            MoveTo(0, rows.saturating_sub(1) as u16),
            Clear(ClearType::CurrentLine),
            Print(line)
        )
        .map_err(backend("failed to draw status line"))?;

        self.out.flush().map_err(backend("failed to flush terminal"))?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.active {
            self.restore().map_err(backend("failed to restore terminal"))?;
        }
        Ok(())
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.0,
        g: rgb.1,
        b: rgb.2,
    }
}

fn backend(context: &'static str) -> impl Fn(io::Error) -> Error {
    move |err| Error::Platform(format!("{context}: {err}"))
}

/// Map a key event onto the engine's bindings.
///
/// Terminals do not report key releases reliably, so shift+arrow repeats are
/// reported as held keys for this poll and plain arrows as single pan ticks.
fn translate(key: KeyEvent, input: &mut InputFrame) -> Option<InputEvent> {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let letter = |key: Key, c: char| {
        let shift = shift || c.is_ascii_uppercase();
        Some(InputEvent::Key(KeyPress { key, shift }))
    };

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(InputEvent::Quit),
        KeyCode::Esc => Some(InputEvent::Key(KeyPress::plain(Key::Escape))),
        KeyCode::Char(c @ ('z' | 'Z')) => letter(Key::Z, c),
        KeyCode::Char(c @ ('d' | 'D')) => letter(Key::D, c),
        KeyCode::Char(c @ ('r' | 'R')) => letter(Key::R, c),
        KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down if shift => {
            let held = &mut input.held;
            held.shift = true;
            match key.code {
                KeyCode::Left => held.left = true,
                KeyCode::Right => held.right = true,
                KeyCode::Up => held.up = true,
                _ => held.down = true,
            }
            None
        }
        KeyCode::Left => Some(InputEvent::Key(KeyPress::plain(Key::Left))),
        KeyCode::Right => Some(InputEvent::Key(KeyPress::plain(Key::Right))),
        KeyCode::Up => Some(InputEvent::Key(KeyPress::plain(Key::Up))),
        KeyCode::Down => Some(InputEvent::Key(KeyPress::plain(Key::Down))),
        _ => None,
    }
}
