/// Tests whether `path` is matched by a robots.txt path rule, honoring `*`
/// (match-anything) and a trailing `$` (end anchor). A rule with neither is
/// a plain prefix test.
pub fn path_matches(path: &str, pattern: &str) -> bool {
    let (body, anchored) = match pattern.strip_suffix('$') {
        Some(stripped) => (stripped, true),
        None => (pattern, false),
    };

    let parts: Vec<&str> = body.split('*').collect();
    if !path.starts_with(parts[0]) {
        return false;
    }
    let mut cursor = parts[0].len();
    let last_idx = parts.len() - 1;

    for (i, part) in parts.iter().enumerate().skip(1) {
        if part.is_empty() {
            continue;
        }
        if i == last_idx && anchored {
            if path.len() < cursor + part.len() {
                return false;
            }
            let match_start = path.len() - part.len();
            if match_start < cursor || !path[match_start..].ends_with(part) {
                return false;
            }
            cursor = path.len();
        } else if let Some(found) = path[cursor..].find(part) {
            cursor += found + part.len();
        } else {
            return false;
        }
    }

    if anchored { cursor == path.len() } else { true }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_rule_is_a_prefix_test() {
        assert!(path_matches("/private/secrets", "/private"));
        assert!(!path_matches("/public", "/private"));
    }

    #[test]
    fn end_anchor_requires_exact_suffix() {
        assert!(path_matches("/fish", "/fish$"));
        assert!(!path_matches("/fish.html", "/fish$"));
    }

    #[test]
    fn wildcard_matches_any_segment() {
        assert!(path_matches("/fish/x/bike.php", "/fish/*.php"));
        assert!(!path_matches("/fish/x/bike.htm", "/fish/*.php"));
    }

    #[test]
    fn wildcard_with_end_anchor() {
        assert!(path_matches("/downloads/report.pdf", "/*.pdf$"));
        assert!(!path_matches("/downloads/report.pdf.html", "/*.pdf$"));
    }

    #[test]
    fn root_pattern_matches_everything() {
        assert!(path_matches("/anything/at/all", "/"));
    }
}
