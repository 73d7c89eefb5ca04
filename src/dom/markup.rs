// Markup reading and writing
// Reads well-formed (XHTML style) fragments with quick-xml and writes
// subtrees back out. Void elements must be self-closed on input (`<br/>`).

use quick_xml::escape::{escape, partial_escape, resolve_predefined_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::node::{NodeData, NodeId};
use super::tree::Dom;
use crate::error::{Error, Result};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Parse `markup` and append the resulting nodes to `parent`
pub fn parse_into(dom: &mut Dom, parent: NodeId, markup: &str) -> Result<()> {
    let mut reader = Reader::from_reader(markup.as_bytes());
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut stack = vec![parent];

    loop {
        let current = *stack.last().unwrap_or(&parent);
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let element = create_element(dom, &reader, &e)?;
                dom.append_child(current, element);
                stack.push(element);
            }
            Ok(Event::Empty(e)) => {
                let element = create_element(dom, &reader, &e)?;
                dom.append_child(current, element);
            }
            Ok(Event::End(_)) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .decode()
                    .map_err(|err| Error::Markup(format!("text decode: {err:?}")))?;
                append_text(dom, current, &text);
            }
            Ok(Event::CData(e)) => {
                let text = reader
                    .decoder()
                    .decode(&e)
                    .map_err(|err| Error::Markup(format!("cdata decode: {err:?}")))?;
                append_text(dom, current, &text);
            }
            Ok(Event::GeneralRef(e)) => {
                let name = e
                    .decode()
                    .map_err(|err| Error::Markup(format!("entity decode: {err:?}")))?;
                let reference = format!("&{name};");
                let resolved = unescape_with(&reference, resolve_entity)
                    .map_err(|err| Error::Markup(format!("entity {reference}: {err}")))?;
                append_text(dom, current, &resolved);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(Error::Markup(format!(
                    "at byte {}: {err}",
                    reader.buffer_position()
                )));
            }
        }
        buf.clear();
    }

    Ok(())
}

/// Parse a markup string into a fresh document
pub fn parse_document(markup: &str) -> Result<(Dom, NodeId)> {
    let mut dom = Dom::new();
    let document = dom.create_document();
    parse_into(&mut dom, document, markup)?;
    Ok((dom, document))
}

fn create_element(dom: &mut Dom, reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Result<NodeId> {
    let qname = e.name();
    let name = reader
        .decoder()
        .decode(qname.as_ref())
        .map_err(|err| Error::Markup(format!("tag name decode: {err:?}")))?;
    let element = dom.create_element(&name);

    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::Markup(format!("attribute: {err}")))?;
        let key = reader
            .decoder()
            .decode(attr.key.as_ref())
            .map_err(|err| Error::Markup(format!("attribute decode: {err:?}")))?;
        let value = attr
            .decode_and_unescape_value_with(reader.decoder(), resolve_entity)
            .map_err(|err| Error::Markup(format!("attribute {key}: {err}")))?;
        if let Some(el) = dom.element_mut(element) {
            el.set_attribute(&key, &value);
        }
    }

    Ok(element)
}

// Adjacent text from entity references joins the previous text node
fn append_text(dom: &mut Dom, parent: NodeId, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(&last) = dom.children(parent).last()
        && dom.is_text(last)
    {
        let end = dom.node_length(last);
        dom.replace_data(last, end, 0, text);
        return;
    }
    let node = dom.create_text(text);
    dom.append_child(parent, node);
}

// XML's predefined entities plus the one compose bodies are full of
fn resolve_entity(name: &str) -> Option<&'static str> {
    match name {
        "nbsp" => Some("\u{a0}"),
        _ => resolve_predefined_entity(name),
    }
}

/// Markup of the children of `node`
pub fn inner_markup(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    for &child in dom.children(node) {
        write_node(dom, child, &mut out);
    }
    out
}

fn write_node(dom: &Dom, node: NodeId, out: &mut String) {
    match &dom.node(node).data {
        NodeData::Text(text) => out.push_str(&escape_text(text)),
        NodeData::Element(el) => {
            out.push('<');
            out.push_str(&el.tag_name);
            for attr in &el.attrs {
                out.push_str(&format!(" {}=\"{}\"", attr.name, escape(&attr.value)));
            }
            if !el.style.is_empty() {
                out.push_str(&format!(" style=\"{}\"", escape(&el.style.to_css_text())));
            }
            if VOID_ELEMENTS.contains(&el.tag_name.as_str()) {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for &child in dom.children(node) {
                write_node(dom, child, out);
            }
            out.push_str(&format!("</{}>", el.tag_name));
        }
        NodeData::Document | NodeData::Fragment => {
            for &child in dom.children(node) {
                write_node(dom, child, out);
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    partial_escape(text).replace('\u{a0}', "&nbsp;")
}
