// Style application
// Classic mode wraps the selection in a marked container (or reuses the one
// it already sits in) and forces the snapshot onto it with `!important`.
// Word mode rebuilds the selection run by run, giving each target word the
// style of the matching source word.

use log::{debug, info, warn};

use crate::dom::{BoundaryPoint, Dom, ElementData, NodeId, Range};
use crate::editable::{SENTINEL_ATTRIBUTE, is_sentinel};
use crate::error::{Error, Result};
use crate::page::Page;
use crate::segment::text_runs;
use crate::snapshot::{StyleMap, StyleSnapshot, WordStyleMap};

/// Ancestor levels searched for a reusable container
const REUSE_LEVELS: usize = 3;

const IMPORTANT: bool = true;

/// Classic mode: restyle the selection with `snapshot`
pub fn apply_style(page: &mut Page, snapshot: Option<&StyleSnapshot>) -> Result<()> {
    let Some(snapshot) = snapshot else {
        warn!("apply: no style to apply");
        return Err(Error::StoreMiss);
    };
    debug!("apply: received style {snapshot:?}");
    let Some(root) = page.focused_editable_root() else {
        warn!("apply: not in a recognized compose area");
        return Err(Error::NoTarget);
    };
    let Some(mut range) = page.selection.range() else {
        warn!("apply: no selection range");
        return Err(Error::NoSelection("no selection range"));
    };
    if range.is_collapsed() {
        warn!("apply: selection is collapsed");
        return Err(Error::NoSelection("selection is collapsed"));
    }

    let dom = &mut page.dom;
    let reusable = find_reusable_container(dom, &range, root);
    let contents = range.extract_contents(dom);

    let container = match reusable {
        Some(container) => {
            dom.remove_children(container);
            container
        }
        None => {
            let span = dom.create_element("span");
            if let Some(el) = dom.element_mut(span) {
                el.set_attribute(SENTINEL_ATTRIBUTE.0, SENTINEL_ATTRIBUTE.1);
            }
            range.insert_node(dom, span);
            debug!("apply: created new formatting span at selection point");
            span
        }
    };
    dom.append_child(container, contents);

    apply_to_tree(dom, container, snapshot);

    page.selection.remove_all_ranges();
    page.selection
        .add_range(Range::select_node_contents(&page.dom, container));
    info!("apply: style application complete");
    Ok(())
}

/// A container from an earlier apply whose content is exactly the selection,
/// looked for in the first few ancestors of the selection
fn find_reusable_container(dom: &Dom, range: &Range, root: NodeId) -> Option<NodeId> {
    let mut current = range.common_ancestor_element(dom)?;
    for _ in 0..REUSE_LEVELS {
        if current == root {
            break;
        }
        if dom.element(current).is_some_and(is_sentinel) {
            let content = Range::select_node_contents(dom, current);
            let boundary_match = range.compare_start_to_start(dom, &content).is_eq()
                && range.compare_end_to_end(dom, &content).is_eq();
            if boundary_match {
                debug!("apply: reusing formatting span (boundary match)");
                return Some(current);
            }

            let selected = range.to_text(dom);
            let selected = selected.trim();
            let existing = dom.text_content(current);
            if !selected.is_empty()
                && selected == existing.trim()
                && dom.is_inclusive_ancestor(current, range.start.node)
                && dom.is_inclusive_ancestor(current, range.end.node)
            {
                debug!("apply: reusing formatting span (text content match)");
                return Some(current);
            }
            debug!("apply: span {selected:?} does not match selection {:?}", existing.trim());
        }
        current = dom.parent_element(current)?;
    }
    None
}

/// Apply `snapshot` to `container` and every element below it
pub fn apply_to_tree(dom: &mut Dom, container: NodeId, snapshot: &StyleSnapshot) {
    let targets: Vec<NodeId> = std::iter::once(container)
        .chain(dom.descendants(container))
        .filter(|&n| dom.is_element(n))
        .collect();
    for target in targets {
        if let Some(el) = dom.element_mut(target) {
            apply_to_element(el, snapshot);
        }
    }
}

fn is_unset(value: &str) -> bool {
    value.is_empty() || matches!(value, "inherit" | "initial" | "auto")
}

/// Force the snapshot's properties onto one element
pub fn apply_to_element(el: &mut ElementData, snapshot: &StyleSnapshot) {
    let properties = [
        ("color", snapshot.color.as_str()),
        ("font-family", snapshot.font_family.as_str()),
        ("font-size", snapshot.font_size.as_str()),
        ("font-weight", snapshot.font_weight.as_str()),
        ("font-style", snapshot.font_style.as_str()),
        ("background-color", snapshot.background_color.as_str()),
    ];
    for (name, value) in properties {
        if is_unset(value) {
            el.style.remove_property(name);
            match name {
                "font-weight" => el.style.set_property(name, "400", IMPORTANT),
                "font-style" => el.style.set_property(name, "normal", IMPORTANT),
                _ => {}
            }
        } else if name == "font-weight" && value == "normal" {
            el.style.set_property(name, "400", IMPORTANT);
        } else {
            el.style.set_property(name, value, IMPORTANT);
        }
    }

    apply_text_decoration(el, snapshot);

    match snapshot.border_bottom_style.as_deref() {
        None => el.style.set_property("border-bottom", "none", IMPORTANT),
        Some(style) if style.eq_ignore_ascii_case("none") => {
            el.style.set_property("border-bottom", "none", IMPORTANT)
        }
        Some(style) => {
            el.style.set_property("border-bottom-style", style, IMPORTANT);
            let width = snapshot.border_bottom_width.as_deref().unwrap_or_default();
            el.style.set_property("border-bottom-width", width, IMPORTANT);
            let color = snapshot.border_bottom_color.as_deref().unwrap_or_default();
            el.style.set_property("border-bottom-color", color, IMPORTANT);
        }
    }

    // an inline style must govern, not the legacy attribute
    if el.is("font") && !snapshot.color.is_empty() && el.has_attribute("color") {
        el.remove_attribute("color");
    }
}

fn apply_text_decoration(el: &mut ElementData, snapshot: &StyleSnapshot) {
    let decoration = snapshot.text_decoration.to_lowercase();
    if decoration == "none" {
        for name in [
            "text-decoration-line",
            "text-decoration-color",
            "text-decoration-style",
            "text-decoration-thickness",
        ] {
            el.style.remove_property(name);
        }
        el.style.set_property("text-decoration", "none", IMPORTANT);
    } else if decoration.contains("underline") {
        el.style.remove_property("text-decoration");
        el.style
            .set_property("text-decoration-line", "underline", IMPORTANT);
        el.style
            .set_property("text-decoration-color", &underline_color(snapshot), IMPORTANT);
        el.style
            .set_property("text-decoration-style", "solid", IMPORTANT);
        el.style
            .set_property("text-decoration-thickness", "auto", IMPORTANT);
    } else if !decoration.is_empty() {
        el.style
            .set_property("text-decoration", &snapshot.text_decoration, IMPORTANT);
    } else {
        el.style.set_property("text-decoration", "none", IMPORTANT);
    }
}

/// The snapshot's decoration color, unless it merely repeats the text color
/// or is transparent
fn underline_color(snapshot: &StyleSnapshot) -> String {
    match snapshot.text_decoration_color.as_deref() {
        Some(color)
            if !color.is_empty()
                && !color.eq_ignore_ascii_case(&snapshot.color)
                && !color.contains("rgba(0, 0, 0, 0)") =>
        {
            color.to_string()
        }
        _ if !snapshot.color.is_empty() => snapshot.color.clone(),
        _ => "initial".to_string(),
    }
}

/// Word mode: restyle each word of the selection after the words of `map`
pub fn apply_word_styles(page: &mut Page, map: Option<&WordStyleMap>) -> Result<()> {
    let Some(map) = map else {
        warn!("apply words: no word styles to apply");
        return Err(Error::StoreMiss);
    };
    if page.focused_editable_root().is_none() {
        warn!("apply words: not in a recognized compose area");
        return Err(Error::NoTarget);
    }
    let Some(mut range) = page.selection.range() else {
        warn!("apply words: no selection range");
        return Err(Error::NoSelection("no selection range"));
    };
    if range.is_collapsed() {
        warn!("apply words: selection is collapsed");
        return Err(Error::NoSelection("selection is collapsed"));
    }

    let dom = &mut page.dom;
    let contents = range.extract_contents(dom);
    let runs: Vec<_> = text_runs(dom, contents)
        .into_iter()
        .map(|(_, run)| run)
        .collect();

    if runs.is_empty() {
        warn!("apply words: selection has no words, restoring it");
        range.insert_node(dom, contents);
        page.selection.remove_all_ranges();
        page.selection.add_range(range);
        return Err(Error::EmptyExtraction);
    }

    let rebuilt = dom.create_fragment();
    let mut sources = map.words();
    let mut last_style: Option<&StyleMap> = None;
    for run in &runs {
        let text = dom.create_text(&run.text);
        if !run.is_word() {
            // whitespace stays unstyled
            dom.append_child(rebuilt, text);
            continue;
        }
        if let Some(style) = sources.next() {
            last_style = Some(style);
        }
        match last_style {
            Some(style) => {
                let span = dom.create_element("span");
                if let Some(el) = dom.element_mut(span) {
                    for (name, value) in style {
                        el.style.set_property(&css_property_name(name), value, false);
                    }
                }
                dom.append_child(span, text);
                dom.append_child(rebuilt, span);
            }
            None => dom.append_child(rebuilt, text),
        }
    }

    let start = range.start;
    range.insert_node(dom, rebuilt);
    page.selection.remove_all_ranges();
    page.selection.add_range(reselect(dom, start, range.end));
    info!("apply words: restyled {} runs", runs.len());
    Ok(())
}

/// The inserted runs, starting right after the split point
fn reselect(dom: &Dom, start: BoundaryPoint, end: BoundaryPoint) -> Range {
    if dom.is_text(start.node)
        && let Some(parent) = dom.parent(start.node)
    {
        let after = BoundaryPoint::new(parent, dom.index_of(start.node) + 1);
        return Range::new(after, end);
    }
    Range::new(start, end)
}

/// `textDecorationLine` -> `text-decoration-line`
pub fn css_property_name(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    for c in camel.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::markup::inner_markup;

    fn compose_page(body: &str, needle: &str) -> Page {
        let markup = format!(r#"<div contenteditable="true" class="Am">{body}</div>"#);
        let mut page = Page::from_markup(&markup).unwrap();
        page.select_text(needle, 1).unwrap();
        page
    }

    fn body(page: &Page) -> String {
        inner_markup(&page.dom, page.focused_editable_root().unwrap())
    }

    fn bold_red() -> StyleSnapshot {
        StyleSnapshot {
            color: "rgb(255, 0, 0)".into(),
            background_color: "rgb(255, 255, 255)".into(),
            font_family: "Arial".into(),
            font_size: "16px".into(),
            font_weight: "700".into(),
            font_style: "normal".into(),
            text_decoration: "none".into(),
            text_decoration_color: Some("rgb(255, 0, 0)".into()),
            border_bottom_style: Some("none".into()),
            border_bottom_width: Some("0px".into()),
            border_bottom_color: Some("rgb(255, 0, 0)".into()),
        }
    }

    #[test]
    fn test_wraps_selection_in_marked_span() {
        let mut page = compose_page("say hello there", "hello");
        apply_style(&mut page, Some(&bold_red())).unwrap();
        insta::assert_snapshot!(body(&page), @r#"say <span data-format-copier-applied="true" style="color: rgb(255, 0, 0) !important; font-family: Arial !important; font-size: 16px !important; font-weight: 700 !important; font-style: normal !important; background-color: rgb(255, 255, 255) !important; text-decoration: none !important; border-bottom: none !important;">hello</span> there"#);
        assert_eq!(page.selected_text(), "hello");
    }

    #[test]
    fn test_reuses_container_instead_of_nesting() {
        let mut page = compose_page("say hello there", "hello");
        apply_style(&mut page, Some(&bold_red())).unwrap();

        let italic = StyleSnapshot {
            font_weight: "normal".into(),
            font_style: "italic".into(),
            ..bold_red()
        };
        // the reselected container contents
        apply_style(&mut page, Some(&italic)).unwrap();
        // a fresh text selection of the same word
        page.select_text("hello", 1).unwrap();
        apply_style(&mut page, Some(&italic)).unwrap();

        let markup = body(&page);
        assert_eq!(markup.matches("data-format-copier-applied").count(), 1);
        assert!(markup.contains("font-weight: 400 !important; font-style: italic !important;"));
    }

    #[test]
    fn test_descendant_elements_are_styled() {
        let mut page = compose_page(
            r##"one <b>two</b> <font color="#00ff00">three</font>"##,
            "one two three",
        );
        apply_style(&mut page, Some(&bold_red())).unwrap();
        let container = page.selection.range().unwrap().start.node;
        let elements: Vec<NodeId> = std::iter::once(container)
            .chain(page.dom.descendants(container))
            .filter(|&n| page.dom.is_element(n))
            .collect();
        let tags: Vec<&str> = elements
            .iter()
            .filter_map(|&n| page.dom.tag_name(n))
            .collect();
        assert_eq!(tags, vec!["span", "b", "font"]);
        for el in elements {
            let data = page.dom.element(el).unwrap();
            assert!(data.style.is_important("color"));
            assert!(!data.has_attribute("color"));
        }
    }

    #[test]
    fn test_underline_uses_text_color_when_decoration_color_repeats_it() {
        let snapshot = StyleSnapshot {
            text_decoration: "underline solid rgb(255, 0, 0)".into(),
            ..bold_red()
        };
        let mut el = ElementData::new("span");
        apply_to_element(&mut el, &snapshot);
        assert_eq!(el.style.get_property_value("text-decoration"), None);
        assert_eq!(
            el.style.get_property_value("text-decoration-line"),
            Some("underline")
        );
        assert_eq!(
            el.style.get_property_value("text-decoration-style"),
            Some("solid")
        );
        assert_eq!(
            el.style.get_property_value("text-decoration-color"),
            Some("rgb(255, 0, 0)")
        );

        let snapshot = StyleSnapshot {
            text_decoration_color: Some("rgb(0, 0, 255)".into()),
            ..snapshot
        };
        apply_to_element(&mut el, &snapshot);
        assert_eq!(
            el.style.get_property_value("text-decoration-color"),
            Some("rgb(0, 0, 255)")
        );
    }

    #[test]
    fn test_none_decoration_clears_parts() {
        let mut el = ElementData::new("span");
        el.set_attribute(
            "style",
            "text-decoration-line: underline; text-decoration-color: red",
        );
        apply_to_element(&mut el, &bold_red());
        assert_eq!(el.style.get_property_value("text-decoration-line"), None);
        assert_eq!(el.style.get_property_value("text-decoration-color"), None);
        assert_eq!(el.style.get_property_value("text-decoration"), Some("none"));
    }

    #[test]
    fn test_unset_values_fall_back_to_defaults() {
        let snapshot = StyleSnapshot {
            font_weight: String::new(),
            font_style: "inherit".into(),
            font_size: "auto".into(),
            text_decoration: String::new(),
            border_bottom_style: None,
            ..bold_red()
        };
        let mut el = ElementData::new("span");
        el.set_attribute("style", "font-size: 40px");
        apply_to_element(&mut el, &snapshot);
        assert_eq!(el.style.get_property_value("font-weight"), Some("400"));
        assert_eq!(el.style.get_property_value("font-style"), Some("normal"));
        assert_eq!(el.style.get_property_value("font-size"), None);
        assert_eq!(el.style.get_property_value("text-decoration"), Some("none"));
        assert_eq!(el.style.get_property_value("border-bottom"), Some("none"));
    }

    #[test]
    fn test_border_bottom_parts() {
        let snapshot = StyleSnapshot {
            border_bottom_style: Some("dashed".into()),
            border_bottom_width: Some("1px".into()),
            border_bottom_color: Some("rgb(0, 0, 255)".into()),
            ..bold_red()
        };
        let mut el = ElementData::new("span");
        apply_to_element(&mut el, &snapshot);
        assert_eq!(
            el.style.get_property_value("border-bottom-style"),
            Some("dashed")
        );
        assert_eq!(el.style.get_property_value("border-bottom-width"), Some("1px"));
    }

    #[test]
    fn test_no_op_without_snapshot_target_or_range() {
        let mut page = compose_page("keep me", "keep");
        let before = page.to_markup();
        assert!(matches!(apply_style(&mut page, None), Err(Error::StoreMiss)));

        let mut range = page.selection.range().unwrap();
        range.collapse_to_end();
        page.selection.add_range(range);
        assert!(matches!(
            apply_style(&mut page, Some(&bold_red())),
            Err(Error::NoSelection(_))
        ));
        assert!(matches!(
            apply_word_styles(&mut page, Some(&WordStyleMap::default())),
            Err(Error::NoSelection(_))
        ));

        page.active_element = None;
        page.select_text("keep", 1).unwrap();
        assert!(matches!(
            apply_style(&mut page, Some(&bold_red())),
            Err(Error::NoTarget)
        ));
        assert_eq!(page.to_markup(), before);
    }

    #[test]
    fn test_word_styles_follow_source_words() {
        use crate::snapshot::Token;
        let style = |name: &str, value: &str| StyleMap::from([(name.to_string(), value.to_string())]);
        let map = WordStyleMap {
            tokens: vec![
                Token::Word {
                    style: style("fontWeight", "700"),
                },
                Token::Space {
                    text: " ".into(),
                    style: style("color", "rgb(0, 0, 255)"),
                },
                Token::Word {
                    style: style("fontStyle", "italic"),
                },
            ],
        };
        let mut page = compose_page("Foo Bar Baz", "Foo Bar Baz");
        apply_word_styles(&mut page, Some(&map)).unwrap();
        insta::assert_snapshot!(body(&page), @r#"<span style="font-weight: 700;">Foo</span> <span style="font-style: italic;">Bar</span> <span style="font-style: italic;">Baz</span>"#);
        assert_eq!(page.selected_text(), "Foo Bar Baz");
    }

    #[test]
    fn test_word_apply_restores_content_without_runs() {
        let mut page = compose_page("a<br/>b", "a");
        let root = page.focused_editable_root().unwrap();
        let br = page.dom.children(root)[1];
        let a = page.dom.children(root)[0];
        page.selection.add_range(Range::new(
            BoundaryPoint::new(root, 1),
            BoundaryPoint::new(root, 2),
        ));
        let before = page.to_markup();
        let map = WordStyleMap::default();
        assert!(matches!(
            apply_word_styles(&mut page, Some(&map)),
            Err(Error::EmptyExtraction)
        ));
        assert_eq!(page.to_markup(), before);
        assert_eq!(page.dom.children(root)[1], br);
        assert_eq!(page.dom.children(root)[0], a);
    }

    #[test]
    fn test_css_property_name() {
        assert_eq!(css_property_name("textDecorationLine"), "text-decoration-line");
        assert_eq!(css_property_name("color"), "color");
    }
}
