// A page context: one document, its focused element and the user's selection

use log::debug;

use crate::dom::markup::{inner_markup, parse_document};
use crate::dom::{BoundaryPoint, Dom, NodeId, Range};
use crate::editable::{DomElement, is_editable_root};
use crate::error::{Error, Result};

/// Single-range selection, like `window.getSelection()` in practice
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    range: Option<Range>,
}

impl Selection {
    pub fn range(&self) -> Option<Range> {
        self.range
    }

    pub fn remove_all_ranges(&mut self) {
        self.range = None;
    }

    pub fn add_range(&mut self, range: Range) {
        self.range = Some(range);
    }
}

#[derive(Debug, Clone)]
pub struct Page {
    pub dom: Dom,
    pub document: NodeId,
    pub active_element: Option<NodeId>,
    pub selection: Selection,
}

impl Page {
    pub fn new(dom: Dom, document: NodeId) -> Self {
        Page {
            dom,
            document,
            active_element: None,
            selection: Selection::default(),
        }
    }

    /// Load a page from markup. Focus goes to the element carrying
    /// `autofocus`, else to the first compose body.
    pub fn from_markup(markup: &str) -> Result<Self> {
        let (dom, document) = parse_document(markup)?;
        let mut page = Page::new(dom, document);
        let elements: Vec<NodeId> = page
            .dom
            .descendants(document)
            .into_iter()
            .filter(|&n| page.dom.is_element(n))
            .collect();
        page.active_element = elements
            .iter()
            .copied()
            .find(|&n| page.dom.get_attribute(n, "autofocus").is_some())
            .or_else(|| {
                elements
                    .iter()
                    .copied()
                    .find(|&n| is_editable_root(&DomElement::new(&page.dom, n)))
            });
        debug!("loaded page, focus on {:?}", page.active_element);
        Ok(page)
    }

    pub fn focus(&mut self, element: NodeId) {
        self.active_element = Some(element);
    }

    /// The focused element, if it is a recognized compose body
    pub fn focused_editable_root(&self) -> Option<NodeId> {
        self.active_element
            .filter(|&el| is_editable_root(&DomElement::new(&self.dom, el)))
    }

    /// Select the `occurrence`-th (1-based) match of `needle` in the flattened
    /// text of the focused element (or the whole document)
    pub fn select_text(&mut self, needle: &str, occurrence: usize) -> Result<Range> {
        let root = self.active_element.unwrap_or(self.document);
        let range = find_text(&self.dom, root, needle, occurrence)
            .ok_or(Error::NoSelection("text not found"))?;
        self.selection.remove_all_ranges();
        self.selection.add_range(range);
        Ok(range)
    }

    /// Text of the current selection, empty without one
    pub fn selected_text(&self) -> String {
        self.selection
            .range()
            .map(|r| r.to_text(&self.dom))
            .unwrap_or_default()
    }

    pub fn to_markup(&self) -> String {
        inner_markup(&self.dom, self.document)
    }
}

/// Range over the `occurrence`-th match of `needle` below `root`
pub fn find_text(dom: &Dom, root: NodeId, needle: &str, occurrence: usize) -> Option<Range> {
    if needle.is_empty() || occurrence == 0 {
        return None;
    }

    // (text node, char offset of its first char in the flattened text)
    let mut spans = Vec::new();
    let mut flat = String::new();
    let mut length = 0;
    for text in dom.text_nodes(root) {
        let data = dom.text(text).unwrap_or_default();
        spans.push((text, length));
        length += data.chars().count();
        flat.push_str(data);
    }

    let (byte_start, _) = flat.match_indices(needle).nth(occurrence - 1)?;
    let start = flat[..byte_start].chars().count();
    let end = start + needle.chars().count();

    // start lands in the node holding its first char, end in the node holding its last one
    let start_point = spans
        .iter()
        .find(|&&(node, offset)| start < offset + dom.node_length(node))
        .map(|&(node, offset)| BoundaryPoint::new(node, start - offset))?;
    let end_point = spans
        .iter()
        .find(|&&(node, offset)| end <= offset + dom.node_length(node) && end > offset)
        .map(|&(node, offset)| BoundaryPoint::new(node, end - offset))?;
    Some(Range::new(start_point, end_point))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPOSE: &str = r#"<div><input autofocus="" type="text"/><div contenteditable="true" class="Am" aria-label="Message Body">Hello <b>big</b> world</div></div>"#;

    #[test]
    fn test_focus_prefers_autofocus() {
        let page = Page::from_markup(COMPOSE).unwrap();
        let focused = page.active_element.unwrap();
        assert_eq!(page.dom.tag_name(focused), Some("input"));
        assert_eq!(page.focused_editable_root(), None);
    }

    #[test]
    fn test_focus_falls_back_to_compose_body() {
        let page =
            Page::from_markup(r#"<p>x</p><div contenteditable="" g_editable="true">y</div>"#)
                .unwrap();
        let root = page.focused_editable_root().unwrap();
        assert_eq!(page.dom.text_content(root), "y");
    }

    #[test]
    fn test_select_text_across_nodes() {
        let mut page = Page::from_markup(
            r#"<div contenteditable="true" class="Am">Hello <b>big</b> world</div>"#,
        )
        .unwrap();
        page.select_text("lo big w", 1).unwrap();
        assert_eq!(page.selected_text(), "lo big w");

        let range = page.selection.range().unwrap();
        assert_eq!(range.start.offset, 3);
        assert_eq!(range.end.offset, 2);
    }

    #[test]
    fn test_select_nth_occurrence() {
        let mut page =
            Page::from_markup(r#"<div contenteditable="true" class="Am">ab <i>ab</i> ab</div>"#)
                .unwrap();
        page.select_text("ab", 2).unwrap();
        let range = page.selection.range().unwrap();
        assert_eq!(page.dom.text(range.start.node), Some("ab"));
        assert!(page.select_text("ab", 4).is_err());
    }

    #[test]
    fn test_whole_word_selection_ends_in_its_own_node() {
        let mut page =
            Page::from_markup(r#"<div contenteditable="true" class="Am"><b>Hello</b> World</div>"#)
                .unwrap();
        page.select_text("Hello", 1).unwrap();
        let range = page.selection.range().unwrap();
        assert_eq!(range.start.node, range.end.node);
        assert_eq!((range.start.offset, range.end.offset), (0, 5));
    }
}
