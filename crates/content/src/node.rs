use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use scraper::{ElementRef, Node};

/// Owned DOM subtree. Built once from a `scraper::Html` via a single
/// recursive walk, so later stages (heading renumbering, empty-container
/// pruning, sibling dedup) can mutate structure that `scraper`'s own parse
/// tree does not expose as mutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentNode {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<ContentNode>,
    },
    Text(String),
}

pub const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

pub const SEMANTIC_CONTAINER_TAGS: &[&str] =
    &["main", "article", "header", "footer", "nav", "aside"];

pub const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

impl ContentNode {
    pub fn from_element(el: ElementRef) -> Self {
        let tag = el.value().name().to_string();
        let attrs = el
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let children = el
            .children()
            .filter_map(|child| match child.value() {
                Node::Element(_) => {
                    ElementRef::wrap(child).map(ContentNode::from_element)
                }
                Node::Text(text) => Some(ContentNode::Text(text.to_string())),
                _ => None,
            })
            .collect();
        ContentNode::Element {
            tag,
            attrs,
            children,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            ContentNode::Element { tag, .. } => Some(tag),
            ContentNode::Text(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            ContentNode::Element { attrs, .. } => {
                attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
            }
            ContentNode::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[ContentNode] {
        match self {
            ContentNode::Element { children, .. } => children,
            ContentNode::Text(_) => &[],
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self.tag(), Some(t) if VOID_TAGS.contains(&t))
    }

    pub fn is_semantic_container(&self) -> bool {
        matches!(self.tag(), Some(t) if SEMANTIC_CONTAINER_TAGS.contains(&t))
    }

    pub fn is_heading(&self) -> bool {
        matches!(self.tag(), Some(t) if HEADING_TAGS.contains(&t))
    }

    /// Concatenated text content of the whole subtree.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            ContentNode::Text(t) => out.push_str(t),
            ContentNode::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    pub fn non_whitespace_char_count(&self) -> usize {
        self.text().chars().filter(|c| !c.is_whitespace()).count()
    }

    /// A stable structural hash over tag, attributes, and recursive content
    /// — used to detect duplicate sibling subtrees. Deterministic within a
    /// process and across runs of the same build (`DefaultHasher::new()`
    /// uses fixed keys).
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash_into(&mut hasher);
        hasher.finish()
    }

    fn hash_into(&self, hasher: &mut DefaultHasher) {
        match self {
            ContentNode::Text(t) => {
                0u8.hash(hasher);
                t.hash(hasher);
            }
            ContentNode::Element {
                tag,
                attrs,
                children,
            } => {
                1u8.hash(hasher);
                tag.hash(hasher);
                for (k, v) in attrs {
                    k.hash(hasher);
                    v.hash(hasher);
                }
                for child in children {
                    child.hash_into(hasher);
                }
            }
        }
    }

    pub fn count_matching<F: Fn(&ContentNode) -> bool + Copy>(&self, pred: F) -> usize {
        let mut count = if pred(self) { 1 } else { 0 };
        for child in self.children() {
            count += child.count_matching(pred);
        }
        count
    }
}
