// DOM tree
// Owns every node of a page (attached or detached) and keeps parent/child links consistent.
// Text offsets are counted in chars.

use super::node::{ElementData, Node, NodeData, NodeId};

#[derive(Debug, Clone, Default)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Dom {
    pub fn new() -> Self {
        Dom { nodes: Vec::new() }
    }

    fn allocate(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node::new(data));
        NodeId(self.nodes.len() - 1)
    }

    pub fn create_document(&mut self) -> NodeId {
        self.allocate(NodeData::Document)
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.allocate(NodeData::Fragment)
    }

    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.allocate(NodeData::Element(ElementData::new(tag_name)))
    }

    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.allocate(NodeData::Text(data.to_string()))
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.node(id).is_element()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.node(id).is_text()
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.node(id).as_element()
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.node_mut(id).as_element_mut()
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag_name.as_str())
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).as_text()
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.get_attribute(name))
    }

    /// The parent, if it is an element
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    /// `id` itself when it is an element, else its parent element
    pub fn element_or_parent(&self, id: NodeId) -> Option<NodeId> {
        if self.is_element(id) {
            Some(id)
        } else {
            self.parent_element(id)
        }
    }

    // Tree mutation

    /// Append `child` as the last child of `parent`. A fragment child is
    /// replaced by its children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` before `reference` (or at the end when `None`).
    /// A fragment child is replaced by its children.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if self.node(child).is_fragment() {
            let moved: Vec<NodeId> = self.node(child).children.clone();
            for node in moved {
                self.insert_before(parent, node, reference);
            }
            return;
        }

        self.detach(child);
        let index = reference
            .and_then(|r| self.children(parent).iter().position(|&c| c == r))
            .unwrap_or(self.children(parent).len());
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Remove `id` from its parent; it becomes a detached root
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
            self.node_mut(id).parent = None;
        }
    }

    pub fn remove_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
    }

    // Queries

    /// Index of `id` among its siblings (0 for a detached node)
    pub fn index_of(&self, id: NodeId) -> usize {
        self.parent(id)
            .and_then(|p| self.children(p).iter().position(|&c| c == id))
            .unwrap_or(0)
    }

    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children(parent).get(index).copied()
    }

    /// Char count for text nodes, child count otherwise
    pub fn node_length(&self, id: NodeId) -> usize {
        match &self.node(id).data {
            NodeData::Text(data) => data.chars().count(),
            _ => self.children(id).len(),
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.node(id).data {
            NodeData::Text(data) => out.push_str(data),
            _ => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// All descendants in tree order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    /// Descendant text nodes in tree order
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.is_text(n))
            .collect()
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Child indices leading from the tree root down to `id`
    pub fn path_from_root(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(self.index_of(current));
            current = parent;
        }
        path.reverse();
        path
    }

    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Nearest inclusive ancestor element matching `predicate`
    pub fn closest<F>(&self, id: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&ElementData) -> bool,
    {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(el) = self.element(node)
                && predicate(el)
            {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Whether the element is editable through `contenteditable`, either
    /// directly or inherited from the nearest ancestor that sets it
    pub fn is_content_editable(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(value) = self.get_attribute(node, "contenteditable") {
                return matches!(
                    value.to_ascii_lowercase().as_str(),
                    "" | "true" | "plaintext-only"
                );
            }
            current = self.parent(node);
        }
        false
    }

    // Cloning

    /// Copy a node; children are copied too when `deep`. The copy is detached.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> NodeId {
        let data = self.node(id).data.clone();
        let copy = self.allocate(data);
        if deep {
            let children: Vec<NodeId> = self.children(id).to_vec();
            for child in children {
                let child_copy = self.clone_node(child, true);
                self.append_child(copy, child_copy);
            }
        }
        copy
    }

    // Character data

    /// Text of a text node between char offsets `[start, end)`
    pub fn substring_data(&self, id: NodeId, start: usize, end: usize) -> String {
        self.text(id)
            .map(|data| {
                data.chars()
                    .skip(start)
                    .take(end.saturating_sub(start))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace `count` chars at `offset` with `data`
    pub fn replace_data(&mut self, id: NodeId, offset: usize, count: usize, data: &str) {
        if let NodeData::Text(text) = &mut self.node_mut(id).data {
            let start = char_to_byte(text, offset);
            let end = char_to_byte(text, offset + count);
            text.replace_range(start..end, data);
        }
    }

    /// Split a text node at `offset`; the tail becomes a new next sibling
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> NodeId {
        let length = self.node_length(id);
        let offset = offset.min(length);
        let tail = self.substring_data(id, offset, length);
        let new_node = self.create_text(&tail);
        if let Some(parent) = self.parent(id) {
            let next = self.child_at(parent, self.index_of(id) + 1);
            self.insert_before(parent, new_node, next);
        }
        self.replace_data(id, offset, length - offset, "");
        new_node
    }
}

fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}
