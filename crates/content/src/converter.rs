use pageloom_core::{ConversionResult, LinkKind, LinkRef};

use crate::error::ConvertError;
use crate::node::ContentNode;

struct Renderer {
    out: String,
    link_refs: Vec<LinkRef>,
}

impl Renderer {
    fn new() -> Self {
        Self {
            out: String::new(),
            link_refs: Vec::new(),
        }
    }

    fn push_block_sep(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            if !self.out.ends_with('\n') {
                self.out.push('\n');
            }
            self.out.push('\n');
        }
    }

    fn render(&mut self, node: &ContentNode, heading_prefix_depth: usize) {
        match node {
            ContentNode::Text(t) => {
                self.out.push_str(t);
            }
            ContentNode::Element {
                tag,
                attrs,
                children,
            } => self.render_element(tag, attrs, children, heading_prefix_depth),
        }
    }

    fn render_children(&mut self, children: &[ContentNode], depth: usize) {
        for child in children {
            self.render(child, depth);
        }
    }

    fn text_of(children: &[ContentNode]) -> String {
        let mut s = String::new();
        for c in children {
            match c {
                ContentNode::Text(t) => s.push_str(t),
                ContentNode::Element { children, .. } => s.push_str(&Self::text_of(children)),
            }
        }
        s
    }

    fn render_element(
        &mut self,
        tag: &str,
        attrs: &[(String, String)],
        children: &[ContentNode],
        depth: usize,
    ) {
        let attr = |name: &str| attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str());

        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level: usize = tag[1..].parse().unwrap_or(1);
                self.push_block_sep();
                self.out.push_str(&"#".repeat(level));
                self.out.push(' ');
                self.out.push_str(Self::text_of(children).trim());
                self.out.push_str("\n\n");
            }
            "p" => {
                self.push_block_sep();
                self.render_children(children, depth);
                self.out.push_str("\n\n");
            }
            "pre" => {
                self.push_block_sep();
                let lang = children
                    .iter()
                    .find_map(|c| match c {
                        ContentNode::Element { tag, attrs, .. } if tag == "code" => attrs
                            .iter()
                            .find(|(k, _)| k == "class")
                            .and_then(|(_, v)| v.strip_prefix("language-"))
                            .map(str::to_string),
                        _ => None,
                    })
                    .unwrap_or_default();
                self.out.push_str("```");
                self.out.push_str(&lang);
                self.out.push('\n');
                self.out.push_str(Self::text_of(children).trim_end_matches('\n'));
                self.out.push_str("\n```\n\n");
            }
            "code" => {
                self.out.push('`');
                self.out.push_str(&Self::text_of(children));
                self.out.push('`');
            }
            "strong" | "b" => {
                self.out.push_str("**");
                self.render_children(children, depth);
                self.out.push_str("**");
            }
            "em" | "i" => {
                self.out.push('*');
                self.render_children(children, depth);
                self.out.push('*');
            }
            "a" => {
                let href = attr("href").unwrap_or("").to_string();
                let text = Self::text_of(children);
                self.out.push('[');
                self.out.push_str(&text);
                self.out.push_str("](");
                self.out.push_str(&href);
                self.out.push(')');
                let kind = if href.starts_with('#') {
                    LinkKind::Anchor
                } else {
                    LinkKind::Navigation
                };
                self.link_refs.push(LinkRef { raw: href, kind });
            }
            "img" => {
                let src = attr("src").unwrap_or("").to_string();
                let alt = attr("alt").unwrap_or("");
                self.out.push_str("![");
                self.out.push_str(alt);
                self.out.push_str("](");
                self.out.push_str(&src);
                self.out.push(')');
                self.link_refs.push(LinkRef {
                    raw: src,
                    kind: LinkKind::Image,
                });
            }
            "ul" => {
                self.push_block_sep();
                for child in children {
                    if child.tag() == Some("li") {
                        self.out.push_str("- ");
                        self.render_children(child.children(), depth);
                        if !self.out.ends_with('\n') {
                            self.out.push('\n');
                        }
                    }
                }
                self.out.push('\n');
            }
            "ol" => {
                self.push_block_sep();
                for (i, child) in children.iter().enumerate() {
                    if child.tag() == Some("li") {
                        self.out.push_str(&format!("{}. ", i + 1));
                        self.render_children(child.children(), depth);
                        if !self.out.ends_with('\n') {
                            self.out.push('\n');
                        }
                    }
                }
                self.out.push('\n');
            }
            "table" => {
                self.push_block_sep();
                self.render_table(children);
                self.out.push('\n');
            }
            "br" => {
                self.out.push_str("  \n");
            }
            _ => {
                self.render_children(children, depth);
            }
        }
    }

    fn render_table(&mut self, children: &[ContentNode]) {
        let rows = Self::table_rows(children);
        let Some(header) = rows.first() else {
            return;
        };
        self.out.push('|');
        for cell in header {
            self.out.push(' ');
            self.out.push_str(cell.trim());
            self.out.push_str(" |");
        }
        self.out.push('\n');
        self.out.push('|');
        for _ in header {
            self.out.push_str(" --- |");
        }
        self.out.push('\n');
        for row in rows.iter().skip(1) {
            self.out.push('|');
            for cell in row {
                self.out.push(' ');
                self.out.push_str(cell.trim());
                self.out.push_str(" |");
            }
            self.out.push('\n');
        }
    }

    fn table_rows(children: &[ContentNode]) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        Self::collect_rows(children, &mut rows);
        rows
    }

    fn collect_rows(children: &[ContentNode], rows: &mut Vec<Vec<String>>) {
        for child in children {
            match child.tag() {
                Some("tr") => {
                    let cells = child
                        .children()
                        .iter()
                        .filter(|c| matches!(c.tag(), Some("td") | Some("th")))
                        .map(|c| Self::text_of(c.children()))
                        .collect();
                    rows.push(cells);
                }
                Some("thead") | Some("tbody") | Some("tfoot") => {
                    Self::collect_rows(child.children(), rows);
                }
                _ => {}
            }
        }
    }
}

/// Maps `h1..h6` to `#..######`, preserves code blocks verbatim, renders
/// tables in GFM, preserves link/image targets as authored, and extracts
/// link references in DOM order. Deterministic for identical input.
pub fn convert(root: &ContentNode) -> Result<ConversionResult, ConvertError> {
    if root.children().is_empty() && root.text().trim().is_empty() {
        return Err(ConvertError::Empty);
    }
    let mut renderer = Renderer::new();
    renderer.render(root, 0);
    let markdown = renderer.out.trim().to_string();
    Ok(ConversionResult {
        markdown: markdown.into_bytes(),
        link_refs: renderer.link_refs,
    })
}
