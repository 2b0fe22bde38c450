//! Keyboard input model and the key bindings of the main loop.

/// Keys the engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Z,
    D,
    R,
    Left,
    Right,
    Up,
    Down,
    Escape,
}

/// A key going down, with the shift modifier state at that moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }

    /// Edge-triggered binding for this key press
    pub fn command(&self) -> Command {
        match (self.key, self.shift) {
            (Key::Z, true) => Command::ZoomIn,
            (Key::Z, false) => Command::ZoomOut,
            (Key::D, false) => Command::ThrottleForward,
            (Key::D, true) => Command::ThrottleBack,
            (Key::R, false) => Command::ResetCamera,
            (Key::R, true) => Command::ResetSimulation,
            (Key::Left, _) => Command::Pan(-1, 0),
            (Key::Right, _) => Command::Pan(1, 0),
            (Key::Up, _) => Command::Pan(0, -1),
            (Key::Down, _) => Command::Pan(0, 1),
            (Key::Escape, _) => Command::Quit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Window closed
    Quit,
    Key(KeyPress),
}

/// Actions the main loop performs in response to input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ZoomIn,
    ZoomOut,
    ThrottleForward,
    ThrottleBack,
    ResetCamera,
    ResetSimulation,
    Pan(i32, i32),
    Quit,
}

impl InputEvent {
    pub fn command(&self) -> Command {
        match self {
            InputEvent::Quit => Command::Quit,
            InputEvent::Key(press) => press.command(),
        }
    }
}

/// Keys held down at poll time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys {
    pub shift: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl HeldKeys {
    /// Continuous pan in ticks per axis; only active while shift is held
    pub fn pan(&self) -> (i32, i32) {
        if !self.shift {
            return (0, 0);
        }
        (
            self.right as i32 - self.left as i32,
            self.down as i32 - self.up as i32,
        )
    }
}

/// Everything one poll of the platform produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub events: Vec<InputEvent>,
    pub held: HeldKeys,
}

impl InputFrame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit() -> Self {
        Self::from_events([InputEvent::Quit])
    }

    pub fn from_events(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            held: HeldKeys::default(),
        }
    }

    pub fn press(key: Key) -> Self {
        Self::from_events([InputEvent::Key(KeyPress::plain(key))])
    }

    pub fn press_shifted(key: Key) -> Self {
        Self::from_events([InputEvent::Key(KeyPress::shifted(key))])
    }

    pub fn with_held(mut self, held: HeldKeys) -> Self {
        self.held = held;
        self
    }
}
