// Style extraction
// Reads the resolved style of the current selection without touching the
// page. Classic mode produces one aggregate snapshot, word mode one token per
// word/space run.

use log::{debug, error, info, warn};

use crate::dom::{Dom, NodeId, Range};
use crate::editable::is_compose_area_marker;
use crate::error::{Error, Result};
use crate::page::Page;
use crate::segment::{RunKind, text_runs};
use crate::snapshot::{StyleMap, StyleSnapshot, Token, WordStyleMap};
use crate::style::color::is_transparent;
use crate::style::{ComputedStyle, computed_style, computed_style_in};

/// Ancestor levels inspected for emphasis the innermost element under-reports
const ANCESTOR_LEVELS: usize = 3;

/// Editor background, substituted for a transparent background
pub const EDITOR_BACKGROUND: &str = "rgb(255, 255, 255)";

/// Properties captured per word-mode token
pub const WORD_PROPERTIES: &[&str] = &[
    "color",
    "backgroundColor",
    "fontFamily",
    "fontSize",
    "fontWeight",
    "fontStyle",
    "textDecorationLine",
    "textDecorationColor",
    "textDecorationStyle",
    "verticalAlign",
    "lineHeight",
];

/// Classic mode: the aggregate style at the start of the selection
pub fn extract_style(page: &Page) -> Result<StyleSnapshot> {
    let Some(root) = page.focused_editable_root() else {
        warn!("get: not in a recognized compose area");
        return Err(Error::NoTarget);
    };
    let Some(range) = page.selection.range() else {
        warn!("get: no text selected");
        return Err(Error::NoSelection("no text selected"));
    };

    let dom = &page.dom;
    let element = style_anchor(dom, &range, root);
    debug!("get: initial element <{}>", dom.tag_name(element).unwrap_or("?"));

    let style = computed_style(dom, element);
    let mut emphasis = Emphasis::from(&style);
    emphasis.promote_from_ancestors(dom, element);

    let text_decoration = if emphasis
        .text_decoration
        .to_lowercase()
        .split(' ')
        .any(|part| part == "none")
    {
        debug!("get: simplified text decoration to none");
        "none".to_string()
    } else {
        emphasis.text_decoration
    };

    let background_color = if is_transparent(&style.background_color) {
        EDITOR_BACKGROUND.to_string()
    } else {
        style.background_color.clone()
    };

    let snapshot = StyleSnapshot {
        color: style.color.clone(),
        background_color,
        font_family: style.font_family.clone(),
        font_size: style.font_size.clone(),
        font_weight: emphasis.font_weight,
        font_style: emphasis.font_style,
        text_decoration,
        text_decoration_color: Some(emphasis.text_decoration_color),
        border_bottom_style: Some(style.border_bottom_style.clone()),
        border_bottom_width: Some(style.border_bottom_width.clone()),
        border_bottom_color: Some(style.border_bottom_color.clone()),
    };
    info!("get: extracted style {snapshot:?}");
    Ok(snapshot)
}

/// The element whose style stands for the selection: the start container
/// (or its parent), then the common ancestor, then the compose body
fn style_anchor(dom: &Dom, range: &Range, root: NodeId) -> NodeId {
    if let Some(element) = dom.element_or_parent(range.start.node) {
        return element;
    }
    if !range.is_collapsed()
        && let Some(element) = range.common_ancestor_element(dom)
    {
        return element;
    }
    error!("get: no element at the selection, falling back to the compose body");
    root
}

/// The emphasis properties subject to promotion from ancestors
struct Emphasis {
    font_weight: String,
    font_style: String,
    text_decoration: String,
    text_decoration_color: String,
}

impl From<&ComputedStyle> for Emphasis {
    fn from(style: &ComputedStyle) -> Self {
        Emphasis {
            font_weight: style.font_weight.clone(),
            font_style: style.font_style.clone(),
            text_decoration: style.text_decoration(),
            text_decoration_color: style.text_decoration_color.clone(),
        }
    }
}

impl Emphasis {
    /// Walk up while still inside the compose area, taking over weight, style
    /// and underline from an emphasizing ancestor when the current value
    /// looks like the default
    fn promote_from_ancestors(&mut self, dom: &Dom, element: NodeId) {
        let mut current = element;
        for _ in 0..ANCESTOR_LEVELS {
            let Some(parent) = dom.parent_element(current) else {
                break;
            };
            if dom.closest(parent, is_compose_area_marker).is_none() {
                break;
            }
            let tag = dom.tag_name(parent).unwrap_or_default();
            let parent_style = computed_style(dom, parent);

            let weight_is_default = matches!(self.font_weight.as_str(), "400" | "normal");
            let parent_is_bold =
                tag == "b" || matches!(parent_style.font_weight.as_str(), "700" | "bold");
            if weight_is_default
                && parent_is_bold
                && !matches!(parent_style.font_weight.as_str(), "400" | "normal")
            {
                self.font_weight = parent_style.font_weight.clone();
            }

            let style_is_default =
                matches!(self.font_style.as_str(), "normal" | "inherit" | "initial");
            let parent_is_italic =
                tag == "i" || tag == "em" || parent_style.font_style == "italic";
            if style_is_default && parent_is_italic && parent_style.font_style != "normal" {
                self.font_style = parent_style.font_style.clone();
            }

            let decoration = self.text_decoration.to_lowercase();
            let not_underlined = decoration.contains("none") || !decoration.contains("underline");
            let parent_decoration = parent_style.text_decoration();
            let parent_underlined =
                tag == "u" || parent_decoration.to_lowercase().contains("underline");
            if not_underlined && parent_underlined {
                debug!("get: taking text decoration from <{tag}>: {parent_decoration}");
                self.text_decoration = parent_decoration;
                self.text_decoration_color = parent_style.text_decoration_color.clone();
            }

            current = parent;
        }
    }
}

/// Word mode: one token per word/space run of the selection
pub fn extract_word_styles(page: &Page) -> Result<WordStyleMap> {
    if page.focused_editable_root().is_none() {
        warn!("get words: not in a recognized compose area");
        return Err(Error::NoTarget);
    }
    let Some(range) = page.selection.range() else {
        warn!("get words: no selection range");
        return Err(Error::NoSelection("no selection range"));
    };
    if range.is_collapsed() {
        warn!("get words: selection is collapsed");
        return Err(Error::NoSelection("selection is collapsed"));
    }

    // Cloning allocates nodes, so work on a scratch copy of the tree
    let mut scratch = page.dom.clone();
    let context = range.common_ancestor_element(&scratch);
    let fragment = range.clone_contents(&mut scratch);

    let mut tokens = Vec::new();
    for (node, run) in text_runs(&scratch, fragment) {
        let parent = scratch.parent(node).unwrap_or(fragment);
        let style = token_style(&scratch, parent, context);
        tokens.push(match run.kind {
            RunKind::Word => Token::Word { style },
            RunKind::Space => Token::Space {
                text: run.text,
                style,
            },
        });
    }

    if tokens.is_empty() {
        warn!("get words: selection has no words");
        return Err(Error::EmptyExtraction);
    }
    debug!("get words: {} tokens", tokens.len());
    Ok(WordStyleMap { tokens })
}

/// Resolved style of a run's parent, reconciled with emphasis tags
fn token_style(dom: &Dom, parent: NodeId, context: Option<NodeId>) -> StyleMap {
    let style = computed_style_in(dom, parent, context);
    let mut map: StyleMap = WORD_PROPERTIES
        .iter()
        .filter_map(|&name| {
            let value = style.get(name)?;
            let keep = !value.is_empty() && !matches!(value.as_str(), "inherit" | "initial" | "unset");
            keep.then(|| (name.to_string(), value))
        })
        .collect();

    // A run cloned straight into the fragment sits under the context element
    let tagged = if dom.is_element(parent) {
        Some(parent)
    } else {
        context
    };
    match tagged.and_then(|el| dom.tag_name(el)) {
        Some("b" | "strong") => {
            let bold = map
                .get("fontWeight")
                .and_then(|w| w.parse::<u32>().ok())
                .is_some_and(|w| w >= 600);
            if !bold {
                map.insert("fontWeight".to_string(), "bold".to_string());
            }
        }
        Some("i" | "em") => {
            map.insert("fontStyle".to_string(), "italic".to_string());
        }
        Some("u") => {
            let line = map.entry("textDecorationLine".to_string()).or_default();
            if !line.contains("underline") {
                *line = if line.is_empty() || line == "none" {
                    "underline".to_string()
                } else {
                    format!("{line} underline")
                };
            }
        }
        _ => {}
    }
    map
}
