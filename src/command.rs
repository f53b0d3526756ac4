//! Commands and types used throughout scalegrid.
//!
//! This module defines the vocabulary that all components share:
//! [`WindowId`], [`Rect`] and [`WorkspaceCoord`] describe what the host
//! knows about windows, [`InputEvent`] carries raw key / pointer input, and
//! [`Command`] is the wire format accepted by the daemon.
//!
//! Keys and buttons are parsed leniently: names are case-insensitive
//! (`"Up"`, `"esc"`, `"Return"`), and raw Linux input-event codes are
//! accepted as numbers.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque handle of a window owned by the host.
///
/// The ordering of ids is the host's natural ordering and is what the grid
/// partitioner sorts by, so a re-layout of the same set is reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Axis-aligned rectangle in layout pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Centre point of the rectangle.
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Whether `p` lies inside the rectangle (right / bottom edges excluded).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    /// Whether `other` lies entirely within `self`, allowing for `eps` of
    /// floating point slack.
    pub fn contains_rect(&self, other: &Rect, eps: f64) -> bool {
        other.x >= self.x - eps
            && other.y >= self.y - eps
            && other.x + other.width <= self.x + self.width + eps
            && other.y + other.height <= self.y + self.height + eps
    }

    /// Whether the interiors of the two rectangles intersect.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// A point in layout pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Coordinate of a workspace in the host's workspace grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WorkspaceCoord {
    pub x: i32,
    pub y: i32,
}

impl WorkspaceCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for WorkspaceCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Which windows an overview session shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Windows whose centre lies on the current workspace.
    CurrentWorkspace,
    /// Every mapped top-level window on the output.
    AllWorkspaces,
}

/// Direction for grid navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Keys the navigation controller understands.  Anything else is carried
/// through as its raw input-event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Other(u32),
}

impl Key {
    /// Map a Linux input-event key code (`KEY_*`) to a [`Key`].
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Key::Escape,
            28 => Key::Enter,
            103 => Key::Up,
            105 => Key::Left,
            106 => Key::Right,
            108 => Key::Down,
            other => Key::Other(other),
        }
    }

    /// The grid direction this key moves focus in, if any.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Key::Up => Some(Direction::Up),
            Key::Down => Some(Direction::Down),
            Key::Left => Some(Direction::Left),
            Key::Right => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Strip whitespace / underscores / dashes and lowercase, so `"KEY_ESC"`,
/// `"Esc"` and `"esc"` all compare equal.
fn normalise_name(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn parse_key(s: &str) -> Option<Key> {
    let normalized = normalise_name(s);
    let name = normalized.strip_prefix("key").unwrap_or(&normalized);
    match name {
        "up" => Some(Key::Up),
        "down" => Some(Key::Down),
        "left" => Some(Key::Left),
        "right" => Some(Key::Right),
        "enter" | "return" => Some(Key::Enter),
        "esc" | "escape" => Some(Key::Escape),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = Key;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "key name or input-event code")
            }
            fn visit_u64<E>(self, n: u64) -> Result<Key, E>
            where
                E: DeError,
            {
                let code = u32::try_from(n).map_err(|_| DeError::custom("key code out of range"))?;
                Ok(Key::from_code(code))
            }
            fn visit_str<E>(self, s: &str) -> Result<Key, E>
            where
                E: DeError,
            {
                parse_key(s).ok_or_else(|| DeError::custom(format!("invalid key: {:?}", s)))
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// Pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u32),
}

impl MouseButton {
    /// Map a Linux input-event button code (`BTN_*`) to a [`MouseButton`].
    pub fn from_code(code: u32) -> Self {
        match code {
            0x110 => MouseButton::Left,
            0x111 => MouseButton::Right,
            0x112 => MouseButton::Middle,
            other => MouseButton::Other(other),
        }
    }
}

fn parse_button(s: &str) -> Option<MouseButton> {
    let normalized = normalise_name(s);
    let name = normalized.strip_prefix("btn").unwrap_or(&normalized);
    match name {
        "left" | "primary" => Some(MouseButton::Left),
        "right" => Some(MouseButton::Right),
        "middle" => Some(MouseButton::Middle),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for MouseButton {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = MouseButton;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "button name or input-event code")
            }
            fn visit_u64<E>(self, n: u64) -> Result<MouseButton, E>
            where
                E: DeError,
            {
                let code =
                    u32::try_from(n).map_err(|_| DeError::custom("button code out of range"))?;
                Ok(MouseButton::from_code(code))
            }
            fn visit_str<E>(self, s: &str) -> Result<MouseButton, E>
            where
                E: DeError,
            {
                parse_button(s).ok_or_else(|| DeError::custom(format!("invalid button: {:?}", s)))
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// Whether a key or button went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PressState {
    Pressed,
    Released,
}

/// Raw input delivered to the session while it holds the input grab (or,
/// for buttons, while it listens in passthrough mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key {
        key: Key,
        state: PressState,
        /// Whether any keyboard modifier was held.
        modifiers: bool,
    },
    Button {
        button: MouseButton,
        state: PressState,
    },
}

/// Every request the daemon accepts over its socket.
///
/// Commands are produced by [`CommandSource`](crate::traits::CommandSource)
/// implementations and consumed by the
/// [`Driver`](crate::headless::driver::Driver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Toggle the overview for the current workspace.
    Toggle,

    /// Toggle the overview for all workspaces.
    ToggleAll,

    /// Press and release a key.
    Key(Key),

    /// Press and release a pointer button at the current cursor position.
    Click(MouseButton),

    /// Move the pointer to an absolute output position.
    PointerMotion { x: f64, y: f64 },

    //  Scene changes (headless host only)

    /// Map a new window.  `parent` makes it a transient child.
    Open {
        geometry: Rect,
        #[serde(default)]
        parent: Option<WindowId>,
    },

    /// Destroy a window and its children.
    Close(WindowId),

    /// Minimize or restore a window.
    Minimize { window: WindowId, minimized: bool },

    /// Give a window new (absolute) geometry.
    Move { window: WindowId, geometry: Rect },

    /// Focus a window directly.
    Focus(WindowId),

    /// Switch the output to another workspace.
    SwitchWorkspace { x: i32, y: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_display() {
        assert_eq!(Direction::Left.to_string(), "left");
        assert_eq!(Direction::Right.to_string(), "right");
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!(Direction::Down.to_string(), "down");
    }

    #[test]
    fn key_names_are_case_insensitive() {
        let keys: Vec<Key> =
            serde_json::from_str(r#"["Up", "DOWN", "key_left", "Right", "Return", "esc", "KEY_ESC"]"#)
                .unwrap();
        assert_eq!(
            keys,
            vec![
                Key::Up,
                Key::Down,
                Key::Left,
                Key::Right,
                Key::Enter,
                Key::Escape,
                Key::Escape
            ]
        );
    }

    #[test]
    fn key_from_numeric_code() {
        let k: Key = serde_json::from_str("28").unwrap();
        assert_eq!(k, Key::Enter);
        let k: Key = serde_json::from_str("30").unwrap();
        assert_eq!(k, Key::Other(30));
    }

    #[test]
    fn invalid_key_name_rejected() {
        assert!(serde_json::from_str::<Key>(r#""sideways""#).is_err());
    }

    #[test]
    fn key_direction_mapping() {
        assert_eq!(Key::Up.direction(), Some(Direction::Up));
        assert_eq!(Key::Left.direction(), Some(Direction::Left));
        assert_eq!(Key::Enter.direction(), None);
    }

    #[test]
    fn button_names_and_codes() {
        let b: MouseButton = serde_json::from_str(r#""BTN_MIDDLE""#).unwrap();
        assert_eq!(b, MouseButton::Middle);
        let b: MouseButton = serde_json::from_str("272").unwrap();
        assert_eq!(b, MouseButton::Left);
        let b: MouseButton = serde_json::from_str("275").unwrap();
        assert_eq!(b, MouseButton::Other(275));
    }

    #[test]
    fn command_wire_format() {
        let cmds: Vec<Command> = serde_json::from_str(
            r#"[
                "Toggle",
                "ToggleAll",
                {"Key":"Down"},
                {"Click":"left"},
                {"PointerMotion":{"x":10.0,"y":20.5}},
                {"Open":{"geometry":{"x":0,"y":0,"width":640,"height":480}}},
                {"Open":{"geometry":{"x":0,"y":0,"width":200,"height":100},"parent":1}},
                {"Close":3},
                {"Minimize":{"window":2,"minimized":true}},
                {"SwitchWorkspace":{"x":1,"y":0}}
            ]"#,
        )
        .unwrap();
        assert_eq!(cmds[0], Command::Toggle);
        assert_eq!(cmds[1], Command::ToggleAll);
        assert_eq!(cmds[2], Command::Key(Key::Down));
        assert_eq!(cmds[3], Command::Click(MouseButton::Left));
        assert_eq!(cmds[4], Command::PointerMotion { x: 10.0, y: 20.5 });
        assert_eq!(
            cmds[5],
            Command::Open {
                geometry: Rect::new(0.0, 0.0, 640.0, 480.0),
                parent: None
            }
        );
        assert_eq!(
            cmds[6],
            Command::Open {
                geometry: Rect::new(0.0, 0.0, 200.0, 100.0),
                parent: Some(WindowId(1))
            }
        );
        assert_eq!(cmds[7], Command::Close(WindowId(3)));
        assert_eq!(
            cmds[8],
            Command::Minimize {
                window: WindowId(2),
                minimized: true
            }
        );
        assert_eq!(cmds[9], Command::SwitchWorkspace { x: 1, y: 0 });
    }

    #[test]
    fn rect_geometry_helpers() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.center(), Point { x: 60.0, y: 45.0 });
        assert!(r.contains(Point { x: 10.0, y: 20.0 }));
        assert!(!r.contains(Point { x: 110.0, y: 20.0 }));
        assert!(r.contains_rect(&Rect::new(20.0, 25.0, 10.0, 10.0), 0.0));
        assert!(!r.contains_rect(&Rect::new(0.0, 25.0, 10.0, 10.0), 0.0));
        assert!(r.overlaps(&Rect::new(100.0, 60.0, 10.0, 10.0)));
        assert!(!r.overlaps(&Rect::new(110.0, 20.0, 10.0, 10.0)));
    }
}
