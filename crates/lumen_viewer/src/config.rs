//! Viewer settings file.

use std::path::Path;

use lumen_renderer::{InputConfig, RenderConfig};
use minifb::{Key, Window};
use serde::{Deserialize, Serialize};

/// Settings loaded from the optional JSON config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub keys: KeyBindings,
    pub render: RenderConfig,
    pub input: InputConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 900,
            keys: KeyBindings::default(),
            render: RenderConfig::default(),
            input: InputConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Load settings from `path`. A missing file gives the defaults; so
    /// does an unreadable or invalid one, with a warning.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| Self::from_json(&text));
        match parsed {
            Ok(config) => {
                log::info!("Loaded config {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Invalid config {}: {}. Loading defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse and validate JSON settings.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(text).map_err(|e| e.to_string())?;
        if config.width == 0 || config.height == 0 {
            return Err(format!("invalid size {}x{}", config.width, config.height));
        }
        for (action, c) in config.keys.bindings() {
            if key_for_char(c).is_none() {
                return Err(format!("no key for '{}' bound to {}", c, action));
            }
        }
        Ok(config)
    }
}

/// Movement keys, one character each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: char,
    pub backward: char,
    pub left: char,
    pub right: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: 'w',
            backward: 's',
            left: 'a',
            right: 'd',
        }
    }
}

impl KeyBindings {
    fn bindings(&self) -> [(&'static str, char); 4] {
        [
            ("forward", self.forward),
            ("backward", self.backward),
            ("left", self.left),
            ("right", self.right),
        ]
    }

    /// Raw movement axes from the held keys: strafe, forward, and whether
    /// shift (slow) is held.
    pub fn movement(&self, window: &Window) -> (f64, f64, bool) {
        let held = |c: char| key_for_char(c).map_or(false, |key| window.is_key_down(key));
        let axis = |positive: char, negative: char| {
            (held(positive) as i32 - held(negative) as i32) as f64
        };

        let slow = window.is_key_down(Key::LeftShift) || window.is_key_down(Key::RightShift);
        (axis(self.right, self.left), axis(self.forward, self.backward), slow)
    }
}

const LETTERS: [Key; 26] = [
    Key::A,
    Key::B,
    Key::C,
    Key::D,
    Key::E,
    Key::F,
    Key::G,
    Key::H,
    Key::I,
    Key::J,
    Key::K,
    Key::L,
    Key::M,
    Key::N,
    Key::O,
    Key::P,
    Key::Q,
    Key::R,
    Key::S,
    Key::T,
    Key::U,
    Key::V,
    Key::W,
    Key::X,
    Key::Y,
    Key::Z,
];

const DIGITS: [Key; 10] = [
    Key::Key0,
    Key::Key1,
    Key::Key2,
    Key::Key3,
    Key::Key4,
    Key::Key5,
    Key::Key6,
    Key::Key7,
    Key::Key8,
    Key::Key9,
];

/// Keyboard key typing `c`, ignoring case. Letters and digits only.
pub fn key_for_char(c: char) -> Option<Key> {
    let c = c.to_ascii_lowercase();
    match c {
        'a'..='z' => Some(LETTERS[(c as u8 - b'a') as usize]),
        '0'..='9' => Some(DIGITS[(c as u8 - b'0') as usize]),
        _ => None,
    }
}
