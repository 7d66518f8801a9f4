//! Keyboard chords, key definitions and platform shortcuts.
//!
//! Keys are written the way the tests write them: a key name (`"Enter"`,
//! `"ArrowRight"`, `"a"`) optionally prefixed by `+`-joined modifiers
//! (`"Control+a"`, `"Shift+ArrowRight"`). [`KeyChord::parse`] validates the
//! string; [`KeyDefinition::lookup`] resolves the key code and the text the
//! key would insert, which is what a CDP key event needs.

use crate::driver::PageDriver;
use crate::result::{E2eError, E2eResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating system convention for editor shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// macOS: shortcuts use the Command (`Meta`) key
    MacOs,
    /// Everything else: shortcuts use `Control`
    Other,
}

impl Platform {
    /// Platform of the machine running the tests
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Other
        }
    }

    /// Modifier used for editor shortcuts
    #[must_use]
    pub const fn primary_modifier(self) -> Modifier {
        match self {
            Self::MacOs => Modifier::Meta,
            Self::Other => Modifier::Control,
        }
    }

    /// Shortcut chord for `key`, e.g. `Meta+a` on macOS
    #[must_use]
    pub fn chord(self, key: &str) -> String {
        format!("{}+{key}", self.primary_modifier())
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// Keyboard modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Alt / Option
    Alt,
    /// Control
    Control,
    /// Meta / Command
    Meta,
    /// Shift
    Shift,
}

impl Modifier {
    /// CDP `Input.dispatchKeyEvent` modifier bit
    #[must_use]
    pub const fn flag(self) -> i64 {
        match self {
            Self::Alt => 1,
            Self::Control => 2,
            Self::Meta => 4,
            Self::Shift => 8,
        }
    }

    /// Key name of the modifier itself
    #[must_use]
    pub const fn key_name(self) -> &'static str {
        match self {
            Self::Alt => "Alt",
            Self::Control => "Control",
            Self::Meta => "Meta",
            Self::Shift => "Shift",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "alt" | "option" => Some(Self::Alt),
            "control" | "ctrl" => Some(Self::Control),
            "meta" | "command" | "cmd" => Some(Self::Meta),
            "shift" => Some(Self::Shift),
            _ => None,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_name())
    }
}

/// A key plus the modifiers held while pressing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    /// Modifiers in press order
    pub modifiers: Vec<Modifier>,
    /// The key itself
    pub key: String,
}

impl KeyChord {
    /// Parse `"Control+a"`, `"Shift+ArrowRight"`, `"Enter"` or `"Control++"`
    pub fn parse(input: &str) -> E2eResult<Self> {
        let invalid = || E2eError::InvalidKey {
            key: input.to_string(),
        };

        let (prefix, key) = if input == "+" {
            ("", "+")
        } else if let Some(prefix) = input.strip_suffix("++") {
            (prefix, "+")
        } else {
            match input.rsplit_once('+') {
                Some((prefix, key)) => (prefix, key),
                None => ("", input),
            }
        };
        if key.is_empty() {
            return Err(invalid());
        }

        let mut modifiers = Vec::new();
        if !prefix.is_empty() {
            for name in prefix.split('+') {
                let modifier = Modifier::parse(name).ok_or_else(invalid)?;
                if !modifiers.contains(&modifier) {
                    modifiers.push(modifier);
                }
            }
        }

        Ok(Self {
            modifiers,
            key: key.to_string(),
        })
    }

    /// Combined CDP modifier bit flags
    #[must_use]
    pub fn modifier_flags(&self) -> i64 {
        self.modifiers.iter().fold(0, |flags, m| flags | m.flag())
    }

    /// Whether a held modifier turns the key into a shortcut (no text input)
    #[must_use]
    pub fn is_shortcut(&self) -> bool {
        self.modifiers
            .iter()
            .any(|m| matches!(m, Modifier::Alt | Modifier::Control | Modifier::Meta))
    }
}

/// What a CDP key event needs to know about a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDefinition {
    /// DOM `key` value
    pub key: String,
    /// DOM `code` value
    pub code: String,
    /// Windows virtual key code
    pub key_code: i64,
    /// Text inserted by the key, if any
    pub text: Option<String>,
}

impl KeyDefinition {
    /// Resolve a named key or a single character
    pub fn lookup(key: &str) -> E2eResult<Self> {
        let named = |code: &str, key_code: i64, text: Option<&str>| Self {
            key: key.to_string(),
            code: code.to_string(),
            key_code,
            text: text.map(str::to_string),
        };

        let definition = match key {
            "Enter" => named("Enter", 13, Some("\r")),
            "Tab" => named("Tab", 9, None),
            "Backspace" => named("Backspace", 8, None),
            "Delete" => named("Delete", 46, None),
            "Escape" => named("Escape", 27, None),
            "Home" => named("Home", 36, None),
            "End" => named("End", 35, None),
            "PageUp" => named("PageUp", 33, None),
            "PageDown" => named("PageDown", 34, None),
            "ArrowLeft" => named("ArrowLeft", 37, None),
            "ArrowUp" => named("ArrowUp", 38, None),
            "ArrowRight" => named("ArrowRight", 39, None),
            "ArrowDown" => named("ArrowDown", 40, None),
            "Shift" => named("ShiftLeft", 16, None),
            "Control" => named("ControlLeft", 17, None),
            "Alt" => named("AltLeft", 18, None),
            "Meta" => named("MetaLeft", 91, None),
            "Space" => Self {
                key: " ".to_string(),
                code: "Space".to_string(),
                key_code: 32,
                text: Some(" ".to_string()),
            },
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::for_char(c),
                    _ => {
                        return Err(E2eError::InvalidKey {
                            key: key.to_string(),
                        })
                    }
                }
            }
        };
        Ok(definition)
    }

    /// Definition for typing a single character
    #[must_use]
    pub fn for_char(c: char) -> Self {
        let (code, key_code) = if c.is_ascii_alphabetic() {
            let upper = c.to_ascii_uppercase();
            (format!("Key{upper}"), i64::from(upper as u8))
        } else if c.is_ascii_digit() {
            (format!("Digit{c}"), i64::from(c as u8))
        } else if c == ' ' {
            ("Space".to_string(), 32)
        } else {
            (String::new(), 0)
        };
        let text = if c == '\n' { "\r".to_string() } else { c.to_string() };
        Self {
            key: c.to_string(),
            code,
            key_code,
            text: Some(text),
        }
    }
}

/// Press the platform's shortcut chord for `shortcut` (`Meta+` on macOS, `Control+` elsewhere)
pub async fn press_shortcut<D: PageDriver + ?Sized>(page: &D, shortcut: &str) -> E2eResult<()> {
    page.press_key(&page.platform().chord(shortcut)).await
}
