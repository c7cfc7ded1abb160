use crate::error::{SanitizeError, UnrepairabilityReason};
use crate::node::ContentNode;

pub struct SanitizedDoc {
    pub root: ContentNode,
    pub hrefs: Vec<String>,
}

fn is_http_like(href: &str) -> bool {
    if href.is_empty() || href.starts_with('#') {
        return false;
    }
    if let Some(idx) = href.find("://") {
        return href[..idx].eq_ignore_ascii_case("http") || href[..idx].eq_ignore_ascii_case("https");
    }
    // No scheme separator at all: relative path, allowed.
    !href.starts_with("javascript:") && !href.starts_with("mailto:")
}

fn renumber_headings(node: &mut ContentNode, prev_level: &mut u8) {
    match node {
        ContentNode::Text(_) => {}
        ContentNode::Element { tag, children, .. } => {
            if let Some(level) = heading_level(tag) {
                let desired = level;
                let effective = if desired > *prev_level + 1 {
                    *prev_level + 1
                } else {
                    desired
                };
                let effective = effective.clamp(1, 6);
                *tag = format!("h{effective}");
                *prev_level = effective;
            }
            for child in children.iter_mut() {
                renumber_headings(child, prev_level);
            }
        }
    }
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Removes empty non-void, non-structural, non-heading containers,
/// bottom-up. Returns `None` when the node itself should be dropped.
fn prune_empty(node: ContentNode) -> Option<ContentNode> {
    match node {
        ContentNode::Text(t) => {
            if t.trim().is_empty() {
                None
            } else {
                Some(ContentNode::Text(t))
            }
        }
        ContentNode::Element {
            tag,
            attrs,
            children,
        } => {
            let pruned_children: Vec<ContentNode> =
                children.into_iter().filter_map(prune_empty).collect();

            let is_void = crate::node::VOID_TAGS.contains(&tag.as_str());
            let is_structural = crate::node::SEMANTIC_CONTAINER_TAGS.contains(&tag.as_str())
                || crate::node::HEADING_TAGS.contains(&tag.as_str())
                || tag == "html"
                || tag == "body"
                || tag == "head";

            if pruned_children.is_empty() && !is_void && !is_structural {
                return None;
            }
            Some(ContentNode::Element {
                tag,
                attrs,
                children: pruned_children,
            })
        }
    }
}

/// Deduplicates structurally identical sibling subtrees (same tag, attrs,
/// and recursive content), excluding headings and semantic containers.
fn dedup_siblings(node: ContentNode) -> ContentNode {
    match node {
        ContentNode::Text(t) => ContentNode::Text(t),
        ContentNode::Element {
            tag,
            attrs,
            children,
        } => {
            let children: Vec<ContentNode> = children.into_iter().map(dedup_siblings).collect();
            let mut seen_hashes = std::collections::HashSet::new();
            let mut deduped = Vec::with_capacity(children.len());
            for child in children {
                let never_dedup = child.is_heading() || child.is_semantic_container();
                if never_dedup {
                    deduped.push(child);
                    continue;
                }
                let hash = child.structural_hash();
                if seen_hashes.insert(hash) {
                    deduped.push(child);
                }
            }
            ContentNode::Element {
                tag,
                attrs,
                children: deduped,
            }
        }
    }
}

fn count_top_level_h1(node: &ContentNode) -> usize {
    node.children()
        .iter()
        .filter(|c| c.tag() == Some("h1"))
        .count()
}

fn collect_hrefs(node: &ContentNode, out: &mut Vec<String>, seen: &mut std::collections::HashSet<String>) {
    if node.tag() == Some("a") {
        if let Some(href) = node.attr("href") {
            if is_http_like(href) && seen.insert(href.to_string()) {
                out.push(href.to_string());
            }
        }
    }
    for child in node.children() {
        collect_hrefs(child, out, seen);
    }
}

/// Rejects structurally irrepairable documents, then renumbers headings,
/// prunes empty containers, dedups identical sibling subtrees, and extracts
/// anchor hrefs in DOM order. Deterministic: identical input yields
/// byte-identical structure and an identical href list.
pub fn sanitize(content: ContentNode) -> Result<SanitizedDoc, SanitizeError> {
    if content.children().is_empty() && content.text().trim().is_empty() {
        return Err(SanitizeError(UnrepairabilityReason::NoStructuralAnchor));
    }

    let total_h1 = content.count_matching(|n| n.tag() == Some("h1"));
    let top_level_h1 = count_top_level_h1(&content);
    if total_h1 > 1 && top_level_h1 != 1 {
        return Err(SanitizeError(UnrepairabilityReason::MultipleH1WithoutPrimary));
    }

    let mut node = content;
    let mut prev_level = 0u8;
    renumber_headings(&mut node, &mut prev_level);

    let node = prune_empty(node).unwrap_or(ContentNode::Element {
        tag: "div".to_string(),
        attrs: Vec::new(),
        children: Vec::new(),
    });
    let node = dedup_siblings(node);

    let mut hrefs = Vec::new();
    let mut seen = std::collections::HashSet::new();
    collect_hrefs(&node, &mut hrefs, &mut seen);

    Ok(SanitizedDoc { root: node, hrefs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{extract, ExtractionThresholds};

    fn content_of(html: &str) -> ContentNode {
        extract(html.as_bytes(), &[], &ExtractionThresholds::default())
            .unwrap()
            .content
    }

    #[test]
    fn renumbers_forward_skips_but_allows_backward_jumps() {
        let html = "<body><h1>A</h1><h3>B</h3><h2>C</h2></body>";
        let doc = sanitize(content_of(html)).unwrap();
        let tags: Vec<_> = doc
            .root
            .children()
            .iter()
            .filter_map(|c| c.tag().map(str::to_string))
            .collect();
        assert_eq!(tags, vec!["h1", "h2", "h2"]);
    }

    #[test]
    fn prunes_empty_non_structural_containers() {
        let html = "<body><div></div><p>kept</p></body>";
        let doc = sanitize(content_of(html)).unwrap();
        assert_eq!(doc.root.children().len(), 1);
        assert_eq!(doc.root.children()[0].tag(), Some("p"));
    }

    #[test]
    fn dedups_identical_sibling_subtrees() {
        let html = "<body><p>same</p><p>same</p><p>different</p></body>";
        let doc = sanitize(content_of(html)).unwrap();
        assert_eq!(doc.root.children().len(), 2);
    }

    #[test]
    fn never_dedups_semantic_containers_even_if_identical() {
        let html = "<body><nav>x</nav><nav>x</nav></body>";
        let doc = sanitize(content_of(html)).unwrap();
        assert_eq!(doc.root.children().len(), 2);
    }

    #[test]
    fn collects_http_hrefs_and_skips_fragments_and_scripts() {
        let html = r#"<body><a href="https://a.example/x">x</a><a href="#top">top</a><a href="javascript:void(0)">js</a><a href="/rel/path">rel</a></body>"#;
        let doc = sanitize(content_of(html)).unwrap();
        assert_eq!(
            doc.hrefs,
            vec!["https://a.example/x".to_string(), "/rel/path".to_string()]
        );
    }

    #[test]
    fn dedups_hrefs_by_raw_string() {
        let html = r#"<body><a href="/x">one</a><a href="/x">two</a></body>"#;
        let doc = sanitize(content_of(html)).unwrap();
        assert_eq!(doc.hrefs, vec!["/x".to_string()]);
    }

    #[test]
    fn empty_document_has_no_structural_anchor() {
        let html = "<body></body>";
        let result = sanitize(content_of(html));
        assert!(matches!(
            result,
            Err(SanitizeError(UnrepairabilityReason::NoStructuralAnchor))
        ));
    }
}
