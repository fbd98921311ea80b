use serde::Deserialize;

use crate::error::ConfigError;
use crate::event::Action;

pub const SHIFT: u64 = 0x0002_0000;
pub const CTRL: u64 = 0x0004_0000;
pub const ALT: u64 = 0x0008_0000;
pub const CMD: u64 = 0x0010_0000;
pub const FN: u64 = 0x0080_0000;

/// Modifier mask plus virtual key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub mask: u64,
    pub key_code: u16,
}

impl Hotkey {
    /// Any bound modifier held and the key code equal.
    pub fn matches(&self, flags: u64, key_code: u16) -> bool {
        self.mask & flags != 0 && self.key_code == key_code
    }
}

/// Parse `"<modifier>... <key>"`, e.g. `"cmd alt 15"` or `"cmd shift return"`.
/// `name` is the binding's action name and only used for error messages.
pub fn parse_hotkey(name: &str, value: &str) -> Result<Hotkey, ConfigError> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    let Some((key, modifiers)) = parts.split_last() else {
        return Err(malformed(name, value));
    };
    if modifiers.is_empty() {
        return Err(malformed(name, value));
    }

    let mut mask = 0;
    for modifier in modifiers {
        mask |= parse_modifier(modifier).ok_or_else(|| ConfigError::UnknownModifier {
            name: name.to_string(),
            modifier: modifier.to_string(),
        })?;
    }

    let key_code = match key.parse::<u16>() {
        Ok(code) => code,
        Err(_) => parse_key_code(key).ok_or_else(|| ConfigError::UnknownKey {
            name: name.to_string(),
            key: key.to_string(),
        })?,
    };

    Ok(Hotkey { mask, key_code })
}

fn malformed(name: &str, value: &str) -> ConfigError {
    ConfigError::MalformedHotkey {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn parse_modifier(modifier: &str) -> Option<u64> {
    match modifier.to_lowercase().as_str() {
        "shift" => Some(SHIFT),
        "ctrl" | "control" => Some(CTRL),
        "alt" | "opt" | "option" => Some(ALT),
        "cmd" | "command" | "super" => Some(CMD),
        "fn" => Some(FN),
        _ => None,
    }
}

pub fn format_hotkey(hotkey: &Hotkey) -> String {
    let mut parts = Vec::new();
    for (bit, name) in [
        (CMD, "cmd"),
        (ALT, "alt"),
        (CTRL, "ctrl"),
        (SHIFT, "shift"),
        (FN, "fn"),
    ] {
        if hotkey.mask & bit != 0 {
            parts.push(name.to_string());
        }
    }
    parts.push(match key_code_to_str(hotkey.key_code) {
        Some(key) => key.to_string(),
        None => hotkey.key_code.to_string(),
    });
    parts.join(" ")
}

/// Whether the first matching binding wins or every match fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    #[default]
    First,
    All,
}

impl MatchPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            MatchPolicy::First => "first",
            MatchPolicy::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub action: Action,
    pub hotkey: Hotkey,
}

/// Bindings in configuration-file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotkeyMap {
    bindings: Vec<Binding>,
    policy: MatchPolicy,
}

impl HotkeyMap {
    pub fn new(policy: MatchPolicy) -> Self {
        Self {
            bindings: Vec::new(),
            policy,
        }
    }

    pub fn bind(&mut self, action: Action, hotkey: Hotkey) {
        self.bindings.push(Binding { action, hotkey });
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Actions bound to a key-down event, in binding order.
    pub fn resolve(&self, flags: u64, key_code: u16) -> Vec<Action> {
        let mut matched = self
            .bindings
            .iter()
            .filter(|b| b.hotkey.matches(flags, key_code))
            .map(|b| b.action);
        match self.policy {
            MatchPolicy::First => matched.next().into_iter().collect(),
            MatchPolicy::All => matched.collect(),
        }
    }
}

fn parse_key_code(key: &str) -> Option<u16> {
    let code = match key.to_lowercase().as_str() {
        // Letters
        "a" => 0x00,
        "b" => 0x0B,
        "c" => 0x08,
        "d" => 0x02,
        "e" => 0x0E,
        "f" => 0x03,
        "g" => 0x05,
        "h" => 0x04,
        "i" => 0x22,
        "j" => 0x26,
        "k" => 0x28,
        "l" => 0x25,
        "m" => 0x2E,
        "n" => 0x2D,
        "o" => 0x1F,
        "p" => 0x23,
        "q" => 0x0C,
        "r" => 0x0F,
        "s" => 0x01,
        "t" => 0x11,
        "u" => 0x20,
        "v" => 0x09,
        "w" => 0x0D,
        "x" => 0x07,
        "y" => 0x10,
        "z" => 0x06,
        // Special keys
        "return" | "enter" => 0x24,
        "tab" => 0x30,
        "space" => 0x31,
        "delete" | "backspace" => 0x33,
        "escape" | "esc" => 0x35,
        "left" => 0x7B,
        "right" => 0x7C,
        "down" => 0x7D,
        "up" => 0x7E,
        "f1" => 0x7A,
        "f2" => 0x78,
        "f3" => 0x63,
        "f4" => 0x76,
        "f5" => 0x60,
        "f6" => 0x61,
        "f7" => 0x62,
        "f8" => 0x64,
        "f9" => 0x65,
        "f10" => 0x6D,
        "f11" => 0x67,
        "f12" => 0x6F,
        // Punctuation
        "minus" => 0x1B,
        "equal" => 0x18,
        "leftbracket" => 0x21,
        "rightbracket" => 0x1E,
        "backslash" => 0x2A,
        "semicolon" => 0x29,
        "quote" => 0x27,
        "comma" => 0x2B,
        "period" => 0x2F,
        "slash" => 0x2C,
        "grave" => 0x32,
        _ => return None,
    };
    Some(code)
}

fn key_code_to_str(code: u16) -> Option<&'static str> {
    let key = match code {
        0x00 => "a",
        0x0B => "b",
        0x08 => "c",
        0x02 => "d",
        0x0E => "e",
        0x03 => "f",
        0x05 => "g",
        0x04 => "h",
        0x22 => "i",
        0x26 => "j",
        0x28 => "k",
        0x25 => "l",
        0x2E => "m",
        0x2D => "n",
        0x1F => "o",
        0x23 => "p",
        0x0C => "q",
        0x0F => "r",
        0x01 => "s",
        0x11 => "t",
        0x20 => "u",
        0x09 => "v",
        0x0D => "w",
        0x07 => "x",
        0x10 => "y",
        0x06 => "z",
        0x24 => "return",
        0x30 => "tab",
        0x31 => "space",
        0x33 => "delete",
        0x35 => "escape",
        0x7B => "left",
        0x7C => "right",
        0x7D => "down",
        0x7E => "up",
        0x7A => "f1",
        0x78 => "f2",
        0x63 => "f3",
        0x76 => "f4",
        0x60 => "f5",
        0x61 => "f6",
        0x62 => "f7",
        0x64 => "f8",
        0x65 => "f9",
        0x6D => "f10",
        0x67 => "f11",
        0x6F => "f12",
        0x1B => "minus",
        0x18 => "equal",
        0x21 => "leftbracket",
        0x1E => "rightbracket",
        0x2A => "backslash",
        0x29 => "semicolon",
        0x27 => "quote",
        0x2B => "comma",
        0x2F => "period",
        0x2C => "slash",
        0x32 => "grave",
        _ => return None,
    };
    Some(key)
}
