//! Selectors and the well-known locators of the editor.
//!
//! Tests address elements with the same selector strings they would hand to a
//! Playwright-style engine: plain CSS, `text='Docs'`, or a CSS selector chained
//! with a text filter such as `#entry-box >> text=''`. [`Selector::parse`]
//! turns those strings into a [`Selector`], and [`Selector::to_query`] turns a
//! selector into a JavaScript expression that yields the element (or `null`).

use serde::Serialize;
use std::fmt;

/// Chain separator between a CSS selector and a text filter
const CHAIN: &str = " >> ";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., "#entry-box")
    Css(String),
    /// Smallest element whose trimmed text equals the string
    Text(String),
    /// Element matching the CSS whose own text (or input value) equals `text`
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Exact text to match; empty matches an empty element
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an exact text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a selector matching `css` only while its text is empty
    #[must_use]
    pub fn empty(css: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: String::new(),
        }
    }

    /// Parse an automation-style selector string.
    ///
    /// Understands `css`, `text='...'` (or double quotes) and
    /// `css >> text='...'`. Anything else is treated as CSS.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if let Some((css, filter)) = input.rsplit_once(CHAIN) {
            if let Some(text) = parse_text_engine(filter.trim()) {
                return Self::CssWithText {
                    css: css.trim().to_string(),
                    text,
                };
            }
        }
        match parse_text_engine(input) {
            Some(text) => Self::Text(text),
            None => Self::Css(input.to_string()),
        }
    }

    /// Convert to a JavaScript expression evaluating to the element or `null`
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(css) => format!("document.querySelector({})", js_literal(css)),
            Self::Text(text) => format!(
                "((t) => {{ \
                 const all = Array.from(document.querySelectorAll('body *')) \
                 .filter(el => el.textContent.trim() === t); \
                 return all.find(el => !all.some(o => o !== el && el.contains(o))) ?? null; \
                 }})({})",
                js_literal(text)
            ),
            Self::CssWithText { css, text } => format!(
                "((c, t) => Array.from(document.querySelectorAll(c)) \
                 .find(el => ((el instanceof HTMLInputElement || el instanceof HTMLTextAreaElement) \
                 ? el.value : el.textContent.trim()) === t) ?? null)\
                 ({}, {})",
                js_literal(css),
                js_literal(text)
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "{css}"),
            Self::Text(text) => write!(f, "text='{text}'"),
            Self::CssWithText { css, text } => write!(f, "{css}{CHAIN}text='{text}'"),
        }
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

fn parse_text_engine(input: &str) -> Option<String> {
    let quoted = input.strip_prefix("text=")?;
    ['\'', '"'].into_iter().find_map(|quote| {
        quoted
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
            .map(str::to_string)
    })
}

/// Encode a value as a JavaScript literal
pub(crate) fn js_literal<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

/// Well-known locators of the editor under test
#[derive(Debug, Clone, Copy)]
pub struct Locators;

impl Locators {
    /// The text input used to author expressions
    pub const ENTRY_BOX: &'static str = "#entry-box";
    /// Name of the highlighted autocomplete item
    pub const AC_HIGHLIGHTED_VALUE: &'static str = ".autocomplete-item.highlighted > .name";
    /// Highlighted autocomplete item of the fluid editor
    pub const FLUID_AC_HIGHLIGHTED_VALUE: &'static str = ".autocomplete-item.fluid-selected";
    /// Lock icon on a datastore's header
    pub const DB_LOCK: &'static str = ".db .spec-header.lock";
    /// The fluid (structured) code editor
    pub const ACTIVE_EDITOR: &'static str = "#active-editor";
    /// First token of the fluid editor
    pub const ACTIVE_EDITOR_SPAN: &'static str = "#active-editor > span";

    /// The "+" button next to a sidebar heading.
    ///
    /// The button is the next sibling of the element carrying the heading's title.
    #[must_use]
    pub fn sidebar_plus(title: &str) -> String {
        format!("[title='{title}'] + div")
    }
}
