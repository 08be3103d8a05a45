//! Arena-backed node tree.
//!
//! Nodes live in one vector and link to their parent and siblings by index.
//! Nothing is ever freed; detached nodes simply become unreachable.

use html5ever::{LocalName, QualName};

/// Index of a node in its [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct ElementData {
    pub name: QualName,
    pub attrs: Vec<(QualName, String)>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    /// Comments, doctypes and processing instructions.
    Other,
}

#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

/// A parsed document.
#[derive(Debug)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Dom {
    pub fn new() -> Self {
        let mut dom = Self { nodes: Vec::new() };
        dom.create(NodeKind::Document);
        dom
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document node is the only node.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Allocate a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        });
        id
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<(QualName, String)>) -> NodeId {
        self.create(NodeKind::Element(ElementData { name, attrs }))
    }

    /// Make `child` the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let last = self.node(parent).last_child;

        let node = self.node_mut(child);
        node.parent = Some(parent);
        node.prev_sibling = last;

        match last {
            Some(last) => self.node_mut(last).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(parent).last_child = Some(child);
    }

    /// Put `new` immediately before `sibling`, under the same parent.
    pub fn insert_before(&mut self, sibling: NodeId, new: NodeId) {
        self.detach(new);
        let Some(parent) = self.node(sibling).parent else {
            return;
        };
        let prev = self.node(sibling).prev_sibling;

        let node = self.node_mut(new);
        node.parent = Some(parent);
        node.prev_sibling = prev;
        node.next_sibling = Some(sibling);

        self.node_mut(sibling).prev_sibling = Some(new);
        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = Some(new),
            None => self.node_mut(parent).first_child = Some(new),
        }
    }

    /// Unlink `id` from its parent. Its own children stay attached to it.
    pub fn detach(&mut self, id: NodeId) {
        let Node {
            parent,
            prev_sibling: prev,
            next_sibling: next,
            ..
        } = *self.node(id);
        let Some(parent) = parent else {
            return;
        };

        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        let node = self.node_mut(id);
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Append text under `parent`, merging with a trailing text node.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(last) = self.node(parent).last_child
            && let NodeKind::Text(existing) = &mut self.node_mut(last).kind
        {
            existing.push_str(text);
            return;
        }
        let id = self.create(NodeKind::Text(text.to_string()));
        self.append(parent, id);
    }

    /// Insert text before `sibling`, merging with a preceding text node.
    pub fn insert_text_before(&mut self, sibling: NodeId, text: &str) {
        if let Some(prev) = self.node(sibling).prev_sibling
            && let NodeKind::Text(existing) = &mut self.node_mut(prev).kind
        {
            existing.push_str(text);
            return;
        }
        let id = self.create(NodeKind::Text(text.to_string()));
        self.insert_before(sibling, id);
    }

    pub fn children(&self, parent: NodeId) -> Children<'_> {
        Children {
            dom: self,
            next: self.node(parent).first_child,
        }
    }

    /// Every node below `root` in document order, excluding `root`.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            dom: self,
            root,
            next: self.node(root).first_child,
        }
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id).kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Local tag name of an element.
    pub fn element_name(&self, id: NodeId) -> Option<&LocalName> {
        self.element(id).map(|e| &e.name.local)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Whether `id` is an element with local name `tag`.
    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.element_name(id).is_some_and(|n| n.as_ref() == tag)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|(n, _)| n.local.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Content of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(s) => Some(s),
            _ => None,
        }
    }

    /// First element named `tag` in document order.
    pub fn find_element(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root()).find(|&id| self.is_tag(id, tag))
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Children<'a> {
    dom: &'a Dom,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.dom.node(id).next_sibling;
        Some(id)
    }
}

/// Pre-order walk that follows sibling and parent links, so it needs no stack.
pub struct Descendants<'a> {
    dom: &'a Dom,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        let node = self.dom.node(id);

        self.next = node.first_child.or_else(|| {
            let mut current = id;
            loop {
                if current == self.root {
                    return None;
                }
                let n = self.dom.node(current);
                if let Some(sibling) = n.next_sibling {
                    return Some(sibling);
                }
                current = n.parent?;
            }
        });
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use html5ever::ns;

    use super::*;

    fn qname(local: &str) -> QualName {
        QualName::new(None, ns!(html), LocalName::from(local))
    }

    fn element(dom: &mut Dom, tag: &str) -> NodeId {
        dom.create_element(qname(tag), vec![])
    }

    #[test]
    fn test_attributes() {
        let mut dom = Dom::new();
        let img = dom.create_element(qname("img"), vec![(qname("src"), "a.png".to_string())]);
        dom.append(dom.root(), img);

        assert!(dom.is_tag(img, "img"));
        assert_eq!(dom.attr(img, "src"), Some("a.png"));
        assert_eq!(dom.attr(img, "alt"), None);
        assert_eq!(dom.attr(dom.root(), "src"), None);
    }

    #[test]
    fn test_append_detach_insert() {
        let mut dom = Dom::new();
        let parent = element(&mut dom, "div");
        let a = element(&mut dom, "p");
        let b = element(&mut dom, "p");
        let c = element(&mut dom, "p");
        dom.append(dom.root(), parent);
        dom.append(parent, a);
        dom.append(parent, b);
        dom.append(parent, c);

        dom.detach(b);
        assert_eq!(dom.children(parent).collect::<Vec<_>>(), [a, c]);
        assert_eq!(dom.node(b).parent, None);

        dom.insert_before(a, b);
        assert_eq!(dom.children(parent).collect::<Vec<_>>(), [b, a, c]);

        // Appending an attached node moves it.
        dom.append(parent, b);
        assert_eq!(dom.children(parent).collect::<Vec<_>>(), [a, c, b]);
    }

    #[test]
    fn test_text_merging() {
        let mut dom = Dom::new();
        let p = element(&mut dom, "p");
        let br = element(&mut dom, "br");
        dom.append(dom.root(), p);

        dom.append_text(p, "Hello, ");
        dom.append_text(p, "World");
        dom.append(p, br);
        dom.insert_text_before(br, "!");

        let children: Vec<_> = dom.children(p).collect();
        assert_eq!(children.len(), 2);
        assert_eq!(dom.text(children[0]), Some("Hello, World!"));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let mut dom = Dom::new();
        let div = element(&mut dom, "div");
        let p = element(&mut dom, "p");
        let img = element(&mut dom, "img");
        let span = element(&mut dom, "span");
        let after = element(&mut dom, "footer");
        dom.append(dom.root(), div);
        dom.append(div, p);
        dom.append(p, img);
        dom.append(div, span);
        dom.append(dom.root(), after);

        assert_eq!(dom.descendants(dom.root()).collect::<Vec<_>>(), [div, p, img, span, after]);
        // The walk stays inside the subtree.
        assert_eq!(dom.descendants(div).collect::<Vec<_>>(), [p, img, span]);
        assert_eq!(dom.descendants(img).count(), 0);
        assert_eq!(dom.find_element("img"), Some(img));
    }
}
