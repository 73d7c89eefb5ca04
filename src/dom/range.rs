// Ranges over the DOM
// Boundary-point comparison, clone/extract of contents and node insertion
// follow the DOM Standard range algorithms.

use std::cmp::Ordering;

use super::node::NodeId;
use super::tree::Dom;

/// A position in the tree: a char offset inside a text node, or a
/// child index inside any other node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        BoundaryPoint { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentsMode {
    Clone,
    Extract,
}

/// Order of two boundary points in tree order
pub fn compare_points(dom: &Dom, a: BoundaryPoint, b: BoundaryPoint) -> Ordering {
    if a.node == b.node {
        return a.offset.cmp(&b.offset);
    }
    let mut key_a = dom.path_from_root(a.node);
    key_a.push(a.offset);
    let mut key_b = dom.path_from_root(b.node);
    key_b.push(b.offset);
    key_a.cmp(&key_b)
}

impl Range {
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Range { start, end }
    }

    pub fn collapsed_at(point: BoundaryPoint) -> Self {
        Range::new(point, point)
    }

    /// A range spanning all children (or all text) of `node`
    pub fn select_node_contents(dom: &Dom, node: NodeId) -> Self {
        Range::new(
            BoundaryPoint::new(node, 0),
            BoundaryPoint::new(node, dom.node_length(node)),
        )
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn collapse_to_end(&mut self) {
        self.start = self.end;
    }

    /// START_TO_START comparison against `other`
    pub fn compare_start_to_start(&self, dom: &Dom, other: &Range) -> Ordering {
        compare_points(dom, self.start, other.start)
    }

    /// END_TO_END comparison against `other`
    pub fn compare_end_to_end(&self, dom: &Dom, other: &Range) -> Ordering {
        compare_points(dom, self.end, other.end)
    }

    /// Deepest node that contains both boundary points
    pub fn common_ancestor(&self, dom: &Dom) -> NodeId {
        let mut candidate = self.start.node;
        while !dom.is_inclusive_ancestor(candidate, self.end.node) {
            match dom.parent(candidate) {
                Some(parent) => candidate = parent,
                None => break,
            }
        }
        candidate
    }

    /// The common ancestor if it is an element, else its parent element
    pub fn common_ancestor_element(&self, dom: &Dom) -> Option<NodeId> {
        dom.element_or_parent(self.common_ancestor(dom))
    }

    /// Whether `node` lies entirely inside the range
    pub fn contains_node(&self, dom: &Dom, node: NodeId) -> bool {
        if dom.root_of(node) != dom.root_of(self.start.node) {
            return false;
        }
        compare_points(dom, BoundaryPoint::new(node, 0), self.start) == Ordering::Greater
            && compare_points(dom, BoundaryPoint::new(node, dom.node_length(node)), self.end)
                == Ordering::Less
    }

    /// The selected text, as `Range.toString()` would report it
    pub fn to_text(&self, dom: &Dom) -> String {
        let (start, end) = (self.start, self.end);
        if start.node == end.node && dom.is_text(start.node) {
            return dom.substring_data(start.node, start.offset, end.offset);
        }
        let mut out = String::new();
        for text in dom.text_nodes(self.common_ancestor(dom)) {
            if text == start.node {
                out.push_str(&dom.substring_data(text, start.offset, dom.node_length(text)));
            } else if text == end.node {
                out.push_str(&dom.substring_data(text, 0, end.offset));
            } else if self.contains_node(dom, text) {
                out.push_str(dom.text(text).unwrap_or_default());
            }
        }
        out
    }

    /// Copy the selected content into a new detached fragment
    pub fn clone_contents(&self, dom: &mut Dom) -> NodeId {
        let mut copy = *self;
        copy.process_contents(dom, ContentsMode::Clone)
    }

    /// Move the selected content into a new detached fragment and collapse
    /// the range where the content used to be
    pub fn extract_contents(&mut self, dom: &mut Dom) -> NodeId {
        self.process_contents(dom, ContentsMode::Extract)
    }

    fn process_contents(&mut self, dom: &mut Dom, mode: ContentsMode) -> NodeId {
        let fragment = dom.create_fragment();
        if self.is_collapsed() {
            return fragment;
        }

        let BoundaryPoint {
            node: start_node,
            offset: start_offset,
        } = self.start;
        let BoundaryPoint {
            node: end_node,
            offset: end_offset,
        } = self.end;

        if start_node == end_node && dom.is_text(start_node) {
            let data = dom.substring_data(start_node, start_offset, end_offset);
            let clone = dom.create_text(&data);
            dom.append_child(fragment, clone);
            if mode == ContentsMode::Extract {
                dom.replace_data(start_node, start_offset, end_offset - start_offset, "");
                self.end = self.start;
            }
            return fragment;
        }

        let common = self.common_ancestor(dom);
        let child_of_common_containing = |dom: &Dom, node: NodeId| {
            let mut current = node;
            while let Some(parent) = dom.parent(current) {
                if parent == common {
                    break;
                }
                current = parent;
            }
            current
        };

        let first_partial = (!dom.is_inclusive_ancestor(start_node, end_node))
            .then(|| child_of_common_containing(&*dom, start_node));
        let last_partial = (!dom.is_inclusive_ancestor(end_node, start_node))
            .then(|| child_of_common_containing(&*dom, end_node));
        let contained: Vec<NodeId> = dom
            .children(common)
            .iter()
            .copied()
            .filter(|&child| self.contains_node(&*dom, child))
            .collect();

        let new_point = if dom.is_inclusive_ancestor(start_node, end_node) {
            self.start
        } else {
            let mut reference = start_node;
            while let Some(parent) = dom.parent(reference) {
                if dom.is_inclusive_ancestor(parent, end_node) {
                    break;
                }
                reference = parent;
            }
            let parent = dom.parent(reference).unwrap_or(common);
            BoundaryPoint::new(parent, dom.index_of(reference) + 1)
        };

        if let Some(first) = first_partial {
            if dom.is_text(first) {
                let length = dom.node_length(first);
                let data = dom.substring_data(first, start_offset, length);
                let clone = dom.create_text(&data);
                dom.append_child(fragment, clone);
                if mode == ContentsMode::Extract {
                    dom.replace_data(first, start_offset, length - start_offset, "");
                }
            } else {
                let clone = dom.clone_node(first, false);
                dom.append_child(fragment, clone);
                let mut sub = Range::new(
                    self.start,
                    BoundaryPoint::new(first, dom.node_length(first)),
                );
                let sub_fragment = sub.process_contents(dom, mode);
                dom.append_child(clone, sub_fragment);
            }
        }

        for child in contained {
            match mode {
                ContentsMode::Extract => dom.append_child(fragment, child),
                ContentsMode::Clone => {
                    let clone = dom.clone_node(child, true);
                    dom.append_child(fragment, clone);
                }
            }
        }

        if let Some(last) = last_partial {
            if dom.is_text(last) {
                let data = dom.substring_data(last, 0, end_offset);
                let clone = dom.create_text(&data);
                dom.append_child(fragment, clone);
                if mode == ContentsMode::Extract {
                    dom.replace_data(last, 0, end_offset, "");
                }
            } else {
                let clone = dom.clone_node(last, false);
                dom.append_child(fragment, clone);
                let mut sub = Range::new(BoundaryPoint::new(last, 0), self.end);
                let sub_fragment = sub.process_contents(dom, mode);
                dom.append_child(clone, sub_fragment);
            }
        }

        if mode == ContentsMode::Extract {
            self.start = new_point;
            self.end = new_point;
        }
        fragment
    }

    /// Insert `node` (or a fragment's children) at the range start. A
    /// collapsed range grows to span the inserted nodes.
    pub fn insert_node(&mut self, dom: &mut Dom, node: NodeId) {
        let BoundaryPoint {
            node: start_node,
            offset: start_offset,
        } = self.start;

        let (parent, reference) = if dom.is_text(start_node) {
            let Some(parent) = dom.parent(start_node) else {
                return;
            };
            let tail = dom.split_text(start_node, start_offset);
            (parent, Some(tail))
        } else {
            (start_node, dom.child_at(start_node, start_offset))
        };

        if dom.parent(node) == Some(parent) {
            dom.detach(node);
        }
        let insert_index = match reference {
            Some(r) => dom.index_of(r),
            None => dom.node_length(parent),
        };
        let count = if dom.node(node).is_fragment() {
            dom.children(node).len()
        } else {
            1
        };

        let was_collapsed = self.is_collapsed();
        dom.insert_before(parent, node, reference);

        if was_collapsed {
            self.end = BoundaryPoint::new(parent, insert_index + count);
        } else if self.end.node == parent && self.end.offset > insert_index {
            self.end.offset += count;
        }
    }
}
