use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Interpolation factor applied to the directional axes each tick.
const AXIS_SMOOTHING: f32 = 0.2;

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
}

impl KeyCode {
    /// Parses a key name as it appears in binding tables or in browser
    /// `KeyboardEvent.key` values (`"ArrowUp"`, `" "`, `"Shift"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(named) = parse_named_key(name) {
            return Some(named);
        }
        if name.len() == 1 {
            let ch = name.chars().next()?;
            if ch.is_ascii_alphabetic() {
                return Some(Self::Character(ch.to_ascii_uppercase()));
            }
            if ch.is_ascii_digit() {
                return Some(Self::Digit(ch as u8 - b'0'));
            }
        }
        None
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "Space" | " " => Space,
        "Shift" | "LeftShift" | "RightShift" => Shift,
        "Up" | "ArrowUp" => Up,
        "Down" | "ArrowDown" => Down,
        "Left" | "ArrowLeft" => Left,
        "Right" | "ArrowRight" => Right,
        "Escape" | "Esc" => Escape,
        "Enter" | "Return" => Enter,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

/// Friendly names for the keys the game binds by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Shift,
    Up,
    Down,
    Left,
    Right,
    Escape,
    Enter,
}

/// The fixed set of actions the player can perform. Raw key events are
/// resolved to commands through [`KeyBindings`] before they ever reach the
/// sampler, so nothing downstream deals with key identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Forward,
    Backward,
    Left,
    Right,
    Dash,
    Jump,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Self> {
        let command = match name {
            "forward" => Self::Forward,
            "backward" => Self::Backward,
            "left" => Self::Left,
            "right" => Self::Right,
            "dash" => Self::Dash,
            "jump" => Self::Jump,
            _ => return None,
        };
        Some(command)
    }
}

/// Key-to-command binding table.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<KeyCode, Command>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        use NamedKey::*;
        let mut map = HashMap::new();
        map.insert(KeyCode::Named(Up), Command::Forward);
        map.insert(KeyCode::Named(Down), Command::Backward);
        map.insert(KeyCode::Named(Left), Command::Left);
        map.insert(KeyCode::Named(Right), Command::Right);
        map.insert(KeyCode::Named(Shift), Command::Dash);
        map.insert(KeyCode::Named(Space), Command::Jump);
        Self { map }
    }
}

impl KeyBindings {
    /// Rebinds a key. A key maps to at most one command; binding the same
    /// key twice replaces the earlier entry.
    pub fn bind(&mut self, key: KeyCode, command: Command) {
        self.map.insert(key, command);
    }

    pub fn resolve(&self, key: KeyCode) -> Option<Command> {
        self.map.get(&key).copied()
    }
}

/// Thread-safe record of which commands are currently held, shared between
/// the host's event handler and the per-tick sampler.
#[derive(Debug)]
pub struct InputState {
    bindings: KeyBindings,
    held: RwLock<HashSet<Command>>,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(KeyBindings::default())
    }
}

impl InputState {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            held: RwLock::new(HashSet::new()),
        }
    }

    /// Feeds a key-down edge. Repeats while held are no-ops.
    pub fn set_key_down(&self, key: KeyCode) {
        if let Some(command) = self.bindings.resolve(key) {
            self.held.write().insert(command);
        }
    }

    pub fn set_key_up(&self, key: KeyCode) {
        if let Some(command) = self.bindings.resolve(key) {
            self.held.write().remove(&command);
        }
    }

    /// Marks a command held directly, bypassing the binding table.
    pub fn press(&self, command: Command) {
        self.held.write().insert(command);
    }

    pub fn release(&self, command: Command) {
        self.held.write().remove(&command);
    }

    /// Releases everything, used when a scene detaches input.
    pub fn clear(&self) {
        self.held.write().clear();
    }

    pub fn is_held(&self, command: Command) -> bool {
        self.held.read().contains(&command)
    }
}

/// Per-tick input snapshot with smoothed directional axes.
///
/// The discrete axes snap between -1, 0 and 1; the smoothed values ramp
/// toward them by [`AXIS_SMOOTHING`] per tick and snap to exactly zero the
/// tick after both keys of a pair are released.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampledInput {
    pub horizontal: f32,
    pub vertical: f32,
    pub horizontal_axis: i8,
    pub vertical_axis: i8,
    pub dash_requested: bool,
    pub jump_requested: bool,
    /// True only on the tick the jump key went from released to held.
    pub jump_pressed: bool,
}

impl SampledInput {
    /// Derives this tick's values from the held-command set. Forward and
    /// left take precedence when both keys of a pair are held.
    pub fn sample(&mut self, state: &InputState) {
        if state.is_held(Command::Forward) {
            self.vertical = lerp(self.vertical, 1.0);
            self.vertical_axis = 1;
        } else if state.is_held(Command::Backward) {
            self.vertical = lerp(self.vertical, -1.0);
            self.vertical_axis = -1;
        } else {
            self.vertical = 0.0;
            self.vertical_axis = 0;
        }

        if state.is_held(Command::Left) {
            self.horizontal = lerp(self.horizontal, -1.0);
            self.horizontal_axis = -1;
        } else if state.is_held(Command::Right) {
            self.horizontal = lerp(self.horizontal, 1.0);
            self.horizontal_axis = 1;
        } else {
            self.horizontal = 0.0;
            self.horizontal_axis = 0;
        }

        self.dash_requested = state.is_held(Command::Dash);
        let jump_now = state.is_held(Command::Jump);
        self.jump_pressed = jump_now && !self.jump_requested;
        self.jump_requested = jump_now;
    }
}

fn lerp(current: f32, target: f32) -> f32 {
    current + AXIS_SMOOTHING * (target - current)
}
