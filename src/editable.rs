// Compose-area recognition
// The rich-text editor marks its message body with an accessible label, a
// class or a custom attribute. These values must match the editor verbatim.

use crate::dom::{Dom, ElementData, NodeId};

/// Accessible names of the message body, per UI language
pub const COMPOSE_LABELS: &[&str] = &["Текст письма", "Message Body"];
pub const COMPOSE_CLASS: &str = "Am";
pub const EDITABLE_ATTRIBUTE: (&str, &str) = ("g_editable", "true");

/// Marks containers created by the applicator
pub const SENTINEL_ATTRIBUTE: (&str, &str) = ("data-format-copier-applied", "true");

/// The capabilities `is_editable_root` needs from an element
pub trait ElementView {
    fn is_content_editable(&self) -> bool;
    fn attribute(&self, name: &str) -> Option<&str>;
    fn has_class(&self, class: &str) -> bool;
}

/// Whether `element` is the editor's message body
pub fn is_editable_root(element: &impl ElementView) -> bool {
    if !element.is_content_editable() {
        return false;
    }
    let labelled = element
        .attribute("aria-label")
        .is_some_and(|label| COMPOSE_LABELS.contains(&label));
    labelled
        || element.has_class(COMPOSE_CLASS)
        || element.attribute(EDITABLE_ATTRIBUTE.0) == Some(EDITABLE_ATTRIBUTE.1)
}

/// `[g_editable="true"], .editable, .Am`
pub fn is_compose_area_marker(element: &ElementData) -> bool {
    element.get_attribute(EDITABLE_ATTRIBUTE.0) == Some(EDITABLE_ATTRIBUTE.1)
        || element.has_class("editable")
        || element.has_class(COMPOSE_CLASS)
}

pub fn is_sentinel(element: &ElementData) -> bool {
    element.get_attribute(SENTINEL_ATTRIBUTE.0) == Some(SENTINEL_ATTRIBUTE.1)
}

/// An element of a `Dom`, viewed through `ElementView`
pub struct DomElement<'a> {
    pub dom: &'a Dom,
    pub id: NodeId,
}

impl<'a> DomElement<'a> {
    pub fn new(dom: &'a Dom, id: NodeId) -> Self {
        DomElement { dom, id }
    }
}

impl ElementView for DomElement<'_> {
    fn is_content_editable(&self) -> bool {
        self.dom.is_element(self.id) && self.dom.is_content_editable(self.id)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.dom.get_attribute(self.id, name)
    }

    fn has_class(&self, class: &str) -> bool {
        self.dom.element(self.id).is_some_and(|el| el.has_class(class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeElement {
        editable: bool,
        label: Option<&'static str>,
        classes: Vec<&'static str>,
        g_editable: Option<&'static str>,
    }

    impl FakeElement {
        fn editable() -> Self {
            FakeElement {
                editable: true,
                label: None,
                classes: Vec::new(),
                g_editable: None,
            }
        }
    }

    impl ElementView for FakeElement {
        fn is_content_editable(&self) -> bool {
            self.editable
        }

        fn attribute(&self, name: &str) -> Option<&str> {
            match name {
                "aria-label" => self.label,
                "g_editable" => self.g_editable,
                _ => None,
            }
        }

        fn has_class(&self, class: &str) -> bool {
            self.classes.contains(&class)
        }
    }

    #[test]
    fn test_recognized_by_label() {
        for label in COMPOSE_LABELS {
            let el = FakeElement {
                label: Some(*label),
                ..FakeElement::editable()
            };
            assert!(is_editable_root(&el));
        }
        let el = FakeElement {
            label: Some("Subject"),
            ..FakeElement::editable()
        };
        assert!(!is_editable_root(&el));
    }

    #[test]
    fn test_recognized_by_class_or_attribute() {
        let by_class = FakeElement {
            classes: vec!["Am", "aiL"],
            ..FakeElement::editable()
        };
        let by_attr = FakeElement {
            g_editable: Some("true"),
            ..FakeElement::editable()
        };
        let wrong_attr = FakeElement {
            g_editable: Some("false"),
            ..FakeElement::editable()
        };
        assert!(is_editable_root(&by_class));
        assert!(is_editable_root(&by_attr));
        assert!(!is_editable_root(&wrong_attr));
    }

    #[test]
    fn test_requires_content_editable() {
        let el = FakeElement {
            editable: false,
            classes: vec!["Am"],
            ..FakeElement::editable()
        };
        assert!(!is_editable_root(&el));
    }

    #[test]
    fn test_dom_element_view() {
        let (dom, document) = crate::dom::markup::parse_document(
            r#"<div contenteditable="true" aria-label="Message Body">x</div><div class="Am">y</div>"#,
        )
        .unwrap();
        let children = dom.children(document);
        assert!(is_editable_root(&DomElement::new(&dom, children[0])));
        assert!(!is_editable_root(&DomElement::new(&dom, children[1])));
    }
}
