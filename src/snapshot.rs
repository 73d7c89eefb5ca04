// Copied style snapshots
// Field names are camelCase so stored values keep the shape the browser
// extension used for the same storage keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Aggregate style of a classic-mode copy. Every value is a resolved
/// (computed) value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSnapshot {
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub background_color: String,
    #[serde(default)]
    pub font_family: String,
    #[serde(default)]
    pub font_size: String,
    #[serde(default)]
    pub font_weight: String,
    #[serde(default)]
    pub font_style: String,
    /// `none`, or a shorthand such as `underline solid rgb(0, 0, 0)`
    #[serde(default)]
    pub text_decoration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_decoration_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_bottom_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_bottom_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_bottom_color: Option<String>,
}

/// Partial style of one word-mode token, camelCase property name to value
pub type StyleMap = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Token {
    Word {
        style: StyleMap,
    },
    Space {
        text: String,
        style: StyleMap,
    },
}

impl Token {
    pub fn is_word(&self) -> bool {
        matches!(self, Token::Word { .. })
    }

    pub fn style(&self) -> &StyleMap {
        match self {
            Token::Word { style } | Token::Space { style, .. } => style,
        }
    }
}

/// Ordered word/space tokens of a word-mode copy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordStyleMap {
    pub tokens: Vec<Token>,
}

impl WordStyleMap {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn words(&self) -> impl Iterator<Item = &StyleMap> {
        self.tokens
            .iter()
            .filter(|t| t.is_word())
            .map(Token::style)
    }
}

/// Which snapshot kind an operation works with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Classic,
    Words,
}

impl Mode {
    /// The single store slot for this mode
    pub fn storage_key(self) -> &'static str {
        match self {
            Mode::Classic => "copiedGmailStyle",
            Mode::Words => "copiedWordStyleMap",
        }
    }

    pub const ALL: [Mode; 2] = [Mode::Classic, Mode::Words];
}
