// Helpers shared by the integration tests

#![allow(dead_code)]

use format_copier::dom::NodeId;
use format_copier::dom::markup::inner_markup;
use format_copier::page::Page;

/// A page whose focused compose body holds `body`
pub fn compose(body: &str) -> Page {
    let markup = format!(
        r#"<div class="aoD"><div contenteditable="true" role="textbox" aria-label="Message Body" class="Am aiL" g_editable="true">{body}</div></div>"#
    );
    Page::from_markup(&markup).expect("valid markup")
}

/// Same as `compose`, with `needle` selected
pub fn compose_selecting(body: &str, needle: &str) -> Page {
    let mut page = compose(body);
    page.select_text(needle, 1).expect("text present");
    page
}

pub fn root(page: &Page) -> NodeId {
    page.focused_editable_root().expect("compose body focused")
}

/// Markup of the compose body's content
pub fn body(page: &Page) -> String {
    inner_markup(&page.dom, root(page))
}

/// Elements carrying the container marker
pub fn containers(page: &Page) -> Vec<NodeId> {
    page.dom
        .descendants(page.document)
        .into_iter()
        .filter(|&n| page.dom.get_attribute(n, "data-format-copier-applied") == Some("true"))
        .collect()
}

/// Number of element ancestors between `node` and the compose body
pub fn depth(page: &Page, node: NodeId) -> usize {
    let root = root(page);
    let mut depth = 0;
    let mut current = node;
    while let Some(parent) = page.dom.parent(current) {
        if parent == root {
            break;
        }
        depth += 1;
        current = parent;
    }
    depth
}
