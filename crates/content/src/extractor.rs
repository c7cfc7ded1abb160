use scraper::{Html, Selector};

use crate::error::ExtractError;
use crate::node::ContentNode;

#[derive(Debug, Clone)]
pub struct ExtractionThresholds {
    pub min_non_whitespace_chars: usize,
    pub min_paragraphs: usize,
    pub min_code_blocks: usize,
    pub max_link_density: f64,
}

impl Default for ExtractionThresholds {
    fn default() -> Self {
        Self {
            min_non_whitespace_chars: 200,
            min_paragraphs: 3,
            min_code_blocks: 1,
            max_link_density: 0.5,
        }
    }
}

/// Selectors for common documentation-framework content containers, tried
/// after the generic semantic-container pass and before the heuristic
/// fallback.
fn default_framework_selectors() -> Vec<String> {
    vec![
        ".theme-doc-markdown".to_string(),  // Docusaurus
        ".md-content__inner".to_string(),   // mkdocs-material
        ".document".to_string(),            // Sphinx
        ".markdown-body".to_string(),        // GitHub-rendered docs
        "#content".to_string(),
    ]
}

pub struct ExtractionResult {
    pub root: ContentNode,
    pub content: ContentNode,
}

fn link_density(node: &ContentNode) -> f64 {
    let total = node.non_whitespace_char_count();
    if total == 0 {
        return 0.0;
    }
    let link_chars: usize = node
        .children()
        .iter()
        .map(|c| link_text_chars(c))
        .sum::<usize>()
        + if node.tag() == Some("a") {
            node.non_whitespace_char_count()
        } else {
            0
        };
    link_chars as f64 / total as f64
}

fn link_text_chars(node: &ContentNode) -> usize {
    if node.tag() == Some("a") {
        return node.non_whitespace_char_count();
    }
    node.children().iter().map(link_text_chars).sum()
}

fn is_meaningful(node: &ContentNode, thresholds: &ExtractionThresholds) -> bool {
    let chars = node.non_whitespace_char_count();
    let paragraphs = node.count_matching(|n| n.tag() == Some("p"));
    let code_blocks = node.count_matching(|n| n.tag() == Some("pre") || n.tag() == Some("code"));

    let has_enough_content = chars >= thresholds.min_non_whitespace_chars
        || paragraphs >= thresholds.min_paragraphs
        || code_blocks >= thresholds.min_code_blocks;

    has_enough_content && link_density(node) <= thresholds.max_link_density
}

/// Chooses the document's content node by priority: semantic containers,
/// then documentation-framework selectors (built-ins plus caller-supplied
/// additions, deduplicated), then the `<body>` heuristic fallback.
pub fn extract(
    html_bytes: &[u8],
    extra_selectors: &[String],
    thresholds: &ExtractionThresholds,
) -> Result<ExtractionResult, ExtractError> {
    let html_str = std::str::from_utf8(html_bytes).map_err(|_| ExtractError::NotHtml)?;
    let document = Html::parse_document(html_str);

    let html_el = document
        .select(&Selector::parse("html").unwrap())
        .next()
        .ok_or(ExtractError::NotHtml)?;
    let root = ContentNode::from_element(html_el);

    let mut selectors = vec![
        "main".to_string(),
        "article".to_string(),
        "[role=\"main\"]".to_string(),
    ];
    for extra in default_framework_selectors().into_iter().chain(extra_selectors.iter().cloned()) {
        if !selectors.contains(&extra) {
            selectors.push(extra);
        }
    }

    for selector_str in &selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(el) = document.select(&selector).next() {
            let candidate = ContentNode::from_element(el);
            if is_meaningful(&candidate, thresholds) {
                return Ok(ExtractionResult {
                    root,
                    content: candidate,
                });
            }
        }
    }

    // Heuristic fallback: body, regardless of meeting thresholds, so long
    // as it exists at all.
    if let Some(body_el) = document
        .select(&Selector::parse("body").unwrap())
        .next()
    {
        return Ok(ExtractionResult {
            root,
            content: ContentNode::from_element(body_el),
        });
    }

    Err(ExtractError::NoContent)
}
