//! Host window abstraction and a headless implementation.

use crate::input::InputFrame;
use calipso_core::{Error, Result};
use calipso_render::Frame;
use std::collections::VecDeque;
use std::fmt;

/// Text shown alongside every presented frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusLine {
    pub fps: f64,
    pub sps: f64,
    pub step: u64,
    pub render_every: u64,
    /// Live text from the simulation, such as population counts
    pub detail: Option<String>,
}

impl StatusLine {
    /// Throughput readout, e.g. `59.8 FPS, 1200 SPS`
    pub fn rates(&self) -> String {
        format!("{:.1} FPS, {:.0} SPS", self.fps, self.sps)
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | step {} | render every {}",
            self.rates(),
            self.step,
            self.render_every
        )?;
        if let Some(detail) = &self.detail {
            write!(f, " | {detail}")?;
        }
        Ok(())
    }
}

/// A window system the engine can draw to and read input from
pub trait Platform {
    /// Create the window or surface
    fn open(&mut self, title: &str, width: usize, height: usize) -> Result<()>;

    /// Drain pending input without blocking
    fn poll_input(&mut self) -> Result<InputFrame>;

    /// Show a finished frame
    fn present(&mut self, frame: &Frame, status: &StatusLine) -> Result<()>;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Platform without a display: input comes from a script and frames are kept.
///
/// Each poll consumes one scripted [`InputFrame`]. Once the script runs out,
/// polls return empty input, or a quit request if `quit_when_done` is set.
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    script: VecDeque<InputFrame>,
    quit_when_done: bool,
    keep_frames: bool,
    opened: Option<(String, usize, usize)>,
    closed: bool,
    polls: u64,
    presented: u64,
    frames: Vec<Frame>,
    last_frame: Option<Frame>,
    statuses: Vec<StatusLine>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(script: impl IntoIterator<Item = InputFrame>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Request quit once the script is exhausted
    pub fn quit_when_done(mut self) -> Self {
        self.quit_when_done = true;
        self
    }

    /// Keep a copy of every presented frame instead of only the last one
    pub fn keep_frames(mut self) -> Self {
        self.keep_frames = true;
        self
    }

    pub fn opened(&self) -> Option<(&str, usize, usize)> {
        self.opened
            .as_ref()
            .map(|(title, w, h)| (title.as_str(), *w, *h))
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    pub fn statuses(&self) -> &[StatusLine] {
        &self.statuses
    }
}

impl Platform for HeadlessPlatform {
    fn open(&mut self, title: &str, width: usize, height: usize) -> Result<()> {
        if self.opened.is_some() {
            return Err(Error::InvalidState("headless surface already open".into()));
        }
        self.opened = Some((title.to_string(), width, height));
        Ok(())
    }

    fn poll_input(&mut self) -> Result<InputFrame> {
        self.polls += 1;
        Ok(match self.script.pop_front() {
            Some(input) => input,
            None if self.quit_when_done => InputFrame::quit(),
            None => InputFrame::empty(),
        })
    }

    fn present(&mut self, frame: &Frame, status: &StatusLine) -> Result<()> {
        if self.opened.is_none() {
            return Err(Error::InvalidState("present before open".into()));
        }
        self.presented += 1;
        self.statuses.push(status.clone());
        if self.keep_frames {
            self.frames.push(frame.clone());
        }
        self.last_frame = Some(frame.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
