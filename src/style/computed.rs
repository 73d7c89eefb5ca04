// Resolved (computed) style
// Cascades user-agent tag defaults, legacy presentational attributes and
// inline declarations, with inheritance from the parent element. Values
// are reported the way getComputedStyle reports them: colors as rgb(),
// sizes in px, weights as numbers. Keywords like `inherit` never survive.

use super::color::normalize_color;
use super::declarations::Declaration;
use crate::dom::{Dom, NodeId};

pub const DEFAULT_COLOR: &str = "rgb(0, 0, 0)";
pub const DEFAULT_FONT_FAMILY: &str = "Arial, Helvetica, sans-serif";
pub const DEFAULT_FONT_SIZE_PX: f32 = 16.0;
pub const TRANSPARENT: &str = "rgba(0, 0, 0, 0)";

const CURRENT_COLOR: &str = "currentcolor";

const LINE_KEYWORDS: &[&str] = &["none", "underline", "overline", "line-through", "blink"];
const DECORATION_STYLES: &[&str] = &["solid", "double", "dotted", "dashed", "wavy"];
const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset",
    "outset",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub color: String,
    pub background_color: String,
    pub font_family: String,
    pub font_size: String,
    pub font_weight: String,
    pub font_style: String,
    pub text_decoration_line: String,
    pub text_decoration_style: String,
    pub text_decoration_color: String,
    pub border_bottom_style: String,
    pub border_bottom_width: String,
    pub border_bottom_color: String,
    pub vertical_align: String,
    pub line_height: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        ComputedStyle {
            color: DEFAULT_COLOR.to_string(),
            background_color: TRANSPARENT.to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: format_px(DEFAULT_FONT_SIZE_PX),
            font_weight: "400".to_string(),
            font_style: "normal".to_string(),
            text_decoration_line: "none".to_string(),
            text_decoration_style: "solid".to_string(),
            text_decoration_color: DEFAULT_COLOR.to_string(),
            border_bottom_style: "none".to_string(),
            border_bottom_width: "0px".to_string(),
            border_bottom_color: DEFAULT_COLOR.to_string(),
            vertical_align: "baseline".to_string(),
            line_height: "normal".to_string(),
        }
    }
}

impl ComputedStyle {
    /// Inherited properties from `parent`, everything else at its initial value
    fn inherit_from(parent: &ComputedStyle) -> Self {
        ComputedStyle {
            color: parent.color.clone(),
            font_family: parent.font_family.clone(),
            font_size: parent.font_size.clone(),
            font_weight: parent.font_weight.clone(),
            font_style: parent.font_style.clone(),
            line_height: parent.line_height.clone(),
            text_decoration_color: CURRENT_COLOR.to_string(),
            border_bottom_color: CURRENT_COLOR.to_string(),
            border_bottom_width: "medium".to_string(),
            ..ComputedStyle::default()
        }
    }

    /// The `text-decoration` shorthand as reported by getComputedStyle,
    /// e.g. `underline solid rgb(0, 0, 0)`
    pub fn text_decoration(&self) -> String {
        format!(
            "{} {} {}",
            self.text_decoration_line, self.text_decoration_style, self.text_decoration_color
        )
    }

    /// Look up a property by its camelCase name
    pub fn get(&self, property: &str) -> Option<String> {
        let value = match property {
            "color" => &self.color,
            "backgroundColor" => &self.background_color,
            "fontFamily" => &self.font_family,
            "fontSize" => &self.font_size,
            "fontWeight" => &self.font_weight,
            "fontStyle" => &self.font_style,
            "textDecoration" => return Some(self.text_decoration()),
            "textDecorationLine" => &self.text_decoration_line,
            "textDecorationStyle" => &self.text_decoration_style,
            "textDecorationColor" => &self.text_decoration_color,
            "borderBottomStyle" => &self.border_bottom_style,
            "borderBottomWidth" => &self.border_bottom_width,
            "borderBottomColor" => &self.border_bottom_color,
            "verticalAlign" => &self.vertical_align,
            "lineHeight" => &self.line_height,
            _ => return None,
        };
        Some(value.clone())
    }

    fn font_size_px(&self) -> f32 {
        parse_px(&self.font_size).unwrap_or(DEFAULT_FONT_SIZE_PX)
    }

    fn font_weight_number(&self) -> u32 {
        self.font_weight.parse().unwrap_or(400)
    }
}

/// Resolved style of an element (or of a text node's parent element)
pub fn computed_style(dom: &Dom, node: NodeId) -> ComputedStyle {
    computed_style_in(dom, node, None)
}

/// Like `computed_style`, but a detached subtree is resolved as if its root
/// were a child of `context`. Used for content cloned out of the document.
pub fn computed_style_in(dom: &Dom, node: NodeId, context: Option<NodeId>) -> ComputedStyle {
    let mut chain = Vec::new();
    let mut context = context;
    let mut current = Some(node);
    while let Some(id) = current {
        if dom.is_element(id) {
            chain.push(id);
        }
        current = match dom.parent(id) {
            Some(parent) => Some(parent),
            None if dom.node(id).is_fragment() => context.take(),
            None => None,
        };
    }

    let mut style = ComputedStyle::default();
    for &element in chain.iter().rev() {
        style = cascade(dom, element, &style);
    }
    style
}

fn cascade(dom: &Dom, element: NodeId, parent: &ComputedStyle) -> ComputedStyle {
    let mut style = ComputedStyle::inherit_from(parent);
    let Some(el) = dom.element(element) else {
        return style;
    };

    match el.tag_name.as_str() {
        "b" | "strong" => style.font_weight = "700".to_string(),
        "i" | "em" | "cite" | "var" | "dfn" | "address" => style.font_style = "italic".to_string(),
        "u" | "ins" => style.text_decoration_line = "underline".to_string(),
        "s" | "strike" | "del" => style.text_decoration_line = "line-through".to_string(),
        "sub" => style.vertical_align = "sub".to_string(),
        "sup" => style.vertical_align = "super".to_string(),
        "code" | "tt" | "pre" | "kbd" | "samp" => style.font_family = "monospace".to_string(),
        "font" => {
            if let Some(color) = el.get_attribute("color").and_then(normalize_color) {
                style.color = color;
            }
            if let Some(face) = el.get_attribute("face") {
                style.font_family = face.trim().to_string();
            }
            if let Some(px) = el.get_attribute("size").and_then(legacy_font_size) {
                style.font_size = format_px(px);
            }
        }
        _ => {}
    }

    for important in [false, true] {
        for decl in el.style.iter().filter(|d| d.important == important) {
            apply_declaration(&mut style, parent, decl);
        }
    }

    if style.text_decoration_color == CURRENT_COLOR {
        style.text_decoration_color = style.color.clone();
    }
    if style.border_bottom_color == CURRENT_COLOR {
        style.border_bottom_color = style.color.clone();
    }
    style.border_bottom_width = if matches!(style.border_bottom_style.as_str(), "none" | "hidden")
    {
        "0px".to_string()
    } else {
        border_width_px(&style.border_bottom_width)
    };
    style
}

fn apply_declaration(style: &mut ComputedStyle, parent: &ComputedStyle, decl: &Declaration) {
    let value = decl.value.trim();
    let keyword = value.to_ascii_lowercase();
    let initial = ComputedStyle::default();

    // Global keywords resolve against the parent (inherit) or the initial value
    let inherited = matches!(
        decl.name.as_str(),
        "color" | "font-family" | "font-size" | "font-weight" | "font-style" | "line-height"
    );
    let source = match keyword.as_str() {
        "inherit" => Some(parent),
        "initial" => Some(&initial),
        "unset" if inherited => Some(parent),
        "unset" => Some(&initial),
        _ => None,
    };
    if let Some(source) = source {
        copy_property(style, source, &decl.name);
        return;
    }

    // Values that do not parse leave the property untouched
    match decl.name.as_str() {
        "color" => {
            if keyword == CURRENT_COLOR {
                style.color = parent.color.clone();
            } else if let Some(color) = normalize_color(value) {
                style.color = color;
            }
        }
        "background-color" => {
            if let Some(color) = normalize_color(value) {
                style.background_color = color;
            }
        }
        "background" => {
            if let Some(color) = split_css_words(value)
                .iter()
                .find_map(|part| normalize_color(part))
            {
                style.background_color = color;
            }
        }
        "font-family" => style.font_family = value.to_string(),
        "font-size" => {
            if let Some(px) = resolve_font_size(&keyword, parent.font_size_px()) {
                style.font_size = format_px(px);
            }
        }
        "font-weight" => {
            if let Some(weight) = resolve_font_weight(&keyword, parent.font_weight_number()) {
                style.font_weight = weight.to_string();
            }
        }
        "font-style" => {
            if matches!(keyword.as_str(), "normal" | "italic") || keyword.starts_with("oblique")
            {
                style.font_style = keyword;
            }
        }
        "text-decoration" => apply_text_decoration(style, &keyword),
        "text-decoration-line" => {
            if let Some(line) = decoration_line(&keyword) {
                style.text_decoration_line = line;
            }
        }
        "text-decoration-style" => {
            if DECORATION_STYLES.contains(&keyword.as_str()) {
                style.text_decoration_style = keyword;
            }
        }
        "text-decoration-color" => {
            if let Some(color) = color_or_current(value) {
                style.text_decoration_color = color;
            }
        }
        "border-bottom" | "border" => apply_border(style, &keyword),
        "border-bottom-style" => {
            if BORDER_STYLES.contains(&keyword.as_str()) {
                style.border_bottom_style = keyword;
            }
        }
        "border-bottom-width" => {
            if is_border_width(&keyword) {
                style.border_bottom_width = keyword;
            }
        }
        "border-bottom-color" => {
            if let Some(color) = color_or_current(value) {
                style.border_bottom_color = color;
            }
        }
        "vertical-align" => style.vertical_align = keyword,
        "line-height" => style.line_height = keyword,
        _ => {}
    }
}

fn copy_property(style: &mut ComputedStyle, source: &ComputedStyle, name: &str) {
    match name {
        "color" => style.color = source.color.clone(),
        "background-color" | "background" => {
            style.background_color = source.background_color.clone()
        }
        "font-family" => style.font_family = source.font_family.clone(),
        "font-size" => style.font_size = source.font_size.clone(),
        "font-weight" => style.font_weight = source.font_weight.clone(),
        "font-style" => style.font_style = source.font_style.clone(),
        "text-decoration" => {
            style.text_decoration_line = source.text_decoration_line.clone();
            style.text_decoration_style = source.text_decoration_style.clone();
            style.text_decoration_color = source.text_decoration_color.clone();
        }
        "text-decoration-line" => style.text_decoration_line = source.text_decoration_line.clone(),
        "text-decoration-style" => {
            style.text_decoration_style = source.text_decoration_style.clone()
        }
        "text-decoration-color" => {
            style.text_decoration_color = source.text_decoration_color.clone()
        }
        "border-bottom" | "border" => {
            style.border_bottom_style = source.border_bottom_style.clone();
            style.border_bottom_width = source.border_bottom_width.clone();
            style.border_bottom_color = source.border_bottom_color.clone();
        }
        "border-bottom-style" => style.border_bottom_style = source.border_bottom_style.clone(),
        "border-bottom-width" => style.border_bottom_width = source.border_bottom_width.clone(),
        "border-bottom-color" => style.border_bottom_color = source.border_bottom_color.clone(),
        "vertical-align" => style.vertical_align = source.vertical_align.clone(),
        "line-height" => style.line_height = source.line_height.clone(),
        _ => {}
    }
}

fn color_or_current(value: &str) -> Option<String> {
    if value.trim().eq_ignore_ascii_case(CURRENT_COLOR) {
        Some(CURRENT_COLOR.to_string())
    } else {
        normalize_color(value)
    }
}

// `none` alone, or one or more distinct line keywords
fn decoration_line(value: &str) -> Option<String> {
    let parts = split_css_words(value);
    if parts.len() == 1 && parts[0] == "none" {
        return Some("none".to_string());
    }
    let valid = !parts.is_empty()
        && parts.iter().enumerate().all(|(i, part)| {
            part != "none" && LINE_KEYWORDS.contains(&part.as_str()) && !parts[..i].contains(part)
        });
    valid.then(|| parts.join(" "))
}

fn is_border_width(value: &str) -> bool {
    matches!(value, "thin" | "medium" | "thick") || parse_length(value).is_some()
}

// `text-decoration: <line>+ || <style> || <thickness> || <color>`
fn apply_text_decoration(style: &mut ComputedStyle, value: &str) {
    let mut lines = Vec::new();
    let mut decoration_style = "solid".to_string();
    let mut color = CURRENT_COLOR.to_string();
    for part in split_css_words(value) {
        if LINE_KEYWORDS.contains(&part.as_str()) {
            if part != "none" {
                lines.push(part);
            }
        } else if DECORATION_STYLES.contains(&part.as_str()) {
            decoration_style = part;
        } else if part == "auto" || part == "from-font" || parse_length(&part).is_some() {
            // thickness is not tracked
        } else if let Some(parsed) = color_or_current(&part) {
            color = parsed;
        } else {
            return;
        }
    }
    style.text_decoration_line = if lines.is_empty() {
        "none".to_string()
    } else {
        lines.join(" ")
    };
    style.text_decoration_style = decoration_style;
    style.text_decoration_color = color;
}

// `border-bottom: <width> || <style> || <color>`
fn apply_border(style: &mut ComputedStyle, value: &str) {
    let mut border_style = "none".to_string();
    let mut width = "medium".to_string();
    let mut color = CURRENT_COLOR.to_string();
    for part in split_css_words(value) {
        if BORDER_STYLES.contains(&part.as_str()) {
            border_style = part;
        } else if is_border_width(&part) {
            width = part;
        } else if let Some(parsed) = color_or_current(&part) {
            color = parsed;
        } else {
            return;
        }
    }
    style.border_bottom_style = border_style;
    style.border_bottom_width = width;
    style.border_bottom_color = color;
}

/// Split on whitespace outside parentheses, so `rgb(1, 2, 3)` stays whole
fn split_css_words(value: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in value.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// A length in px; `em` and `%` are relative to `reference`
fn parse_length_relative(value: &str, reference: f32) -> Option<f32> {
    let value = value.trim();
    if let Some(n) = value.strip_suffix("px") {
        return n.trim().parse().ok();
    }
    if let Some(n) = value.strip_suffix("pt") {
        return n.trim().parse::<f32>().ok().map(|pt| pt * 4.0 / 3.0);
    }
    if let Some(n) = value.strip_suffix("rem") {
        return n
            .trim()
            .parse::<f32>()
            .ok()
            .map(|r| r * DEFAULT_FONT_SIZE_PX);
    }
    if let Some(n) = value.strip_suffix("em") {
        return n.trim().parse::<f32>().ok().map(|em| em * reference);
    }
    if let Some(n) = value.strip_suffix('%') {
        return n.trim().parse::<f32>().ok().map(|pct| pct / 100.0 * reference);
    }
    if value == "0" {
        return Some(0.0);
    }
    None
}

fn parse_length(value: &str) -> Option<f32> {
    parse_length_relative(value, DEFAULT_FONT_SIZE_PX)
}

fn parse_px(value: &str) -> Option<f32> {
    value.trim().strip_suffix("px")?.trim().parse().ok()
}

fn resolve_font_size(value: &str, parent_px: f32) -> Option<f32> {
    let px = match value {
        "xx-small" => 9.0,
        "x-small" => 10.0,
        "small" => 13.0,
        "medium" => 16.0,
        "large" => 18.0,
        "x-large" => 24.0,
        "xx-large" => 32.0,
        "xxx-large" => 48.0,
        "smaller" => parent_px / 1.2,
        "larger" => parent_px * 1.2,
        other => parse_length_relative(other, parent_px)?,
    };
    Some(px)
}

// `<font size="N">`
fn legacy_font_size(value: &str) -> Option<f32> {
    let value = value.trim();
    let size: i32 = if let Some(delta) = value.strip_prefix('+') {
        3 + delta.parse::<i32>().ok()?
    } else if let Some(delta) = value.strip_prefix('-') {
        3 - delta.parse::<i32>().ok()?
    } else {
        value.parse().ok()?
    };
    let px = match size.clamp(1, 7) {
        1 => 10.0,
        2 => 13.0,
        3 => 16.0,
        4 => 18.0,
        5 => 24.0,
        6 => 32.0,
        _ => 48.0,
    };
    Some(px)
}

fn resolve_font_weight(value: &str, parent: u32) -> Option<u32> {
    let weight = match value {
        "normal" => 400,
        "bold" => 700,
        "bolder" => match parent {
            0..400 => 400,
            400..600 => 700,
            _ => 900,
        },
        "lighter" => match parent {
            0..600 => 100,
            600..800 => 400,
            _ => 700,
        },
        other => other.parse::<u32>().ok().filter(|w| (1..=1000).contains(w))?,
    };
    Some(weight)
}

fn border_width_px(value: &str) -> String {
    let px = match value {
        "thin" => 1.0,
        "medium" => 3.0,
        "thick" => 5.0,
        other => parse_length(other).unwrap_or(3.0),
    };
    format_px(px)
}

/// `13.3333px` style formatting: at most four decimals, no trailing zeros
pub fn format_px(px: f32) -> String {
    let rounded = (px * 10000.0).round() / 10000.0;
    format!("{rounded}px")
}
