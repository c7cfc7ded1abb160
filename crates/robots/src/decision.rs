use std::time::Duration;

use pageloom_core::{Decision, DecisionReason, RuleSet};
use url::Url;

use crate::groups::select_group;
use crate::matcher::path_matches;
use crate::parser::ParsedRobots;

fn normalize_prefix(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with('/') {
        Some(raw.to_string())
    } else {
        Some(format!("/{raw}"))
    }
}

/// Builds the `RuleSet` for `target_agent` from a parsed robots.txt.
pub fn build_rule_set(
    parsed: &ParsedRobots,
    host: &str,
    target_agent: &str,
    source_url: &str,
) -> RuleSet {
    let has_groups = !parsed.groups.is_empty();
    let selected = select_group(parsed, target_agent);
    let matched_group = selected.is_some();

    let (allow_prefixes, disallow_prefixes, crawl_delay) = match selected {
        Some(group) => (
            group.allow.iter().filter_map(|p| normalize_prefix(p)).collect(),
            group
                .disallow
                .iter()
                .filter_map(|p| normalize_prefix(p))
                .collect(),
            group.crawl_delay.map(Duration::from_secs_f64),
        ),
        None => (Vec::new(), Vec::new(), None),
    };

    RuleSet {
        host: host.to_string(),
        user_agent: target_agent.to_string(),
        allow_prefixes,
        disallow_prefixes,
        crawl_delay,
        fetched_at: chrono::Utc::now(),
        source_url: source_url.to_string(),
        matched_group,
        has_groups,
    }
}

/// Decides whether `url` may be fetched under `rule_set`, per the
/// longest-prefix-wins (ties favor allow) matching rule.
pub fn decide(url: &Url, rule_set: &RuleSet) -> Decision {
    if !rule_set.has_groups {
        return Decision {
            url: url.clone(),
            allowed: true,
            reason: DecisionReason::EmptyRuleSet,
            crawl_delay: None,
        };
    }
    if !rule_set.matched_group {
        return Decision {
            url: url.clone(),
            allowed: true,
            reason: DecisionReason::UserAgentNotMatched,
            crawl_delay: None,
        };
    }

    let path = url.path();
    let best_allow = rule_set
        .allow_prefixes
        .iter()
        .filter(|p| path_matches(path, p))
        .map(|p| p.len())
        .max();
    let best_disallow = rule_set
        .disallow_prefixes
        .iter()
        .filter(|p| path_matches(path, p))
        .map(|p| p.len())
        .max();

    match (best_allow, best_disallow) {
        (None, None) => Decision {
            url: url.clone(),
            allowed: true,
            reason: DecisionReason::NoMatchingRules,
            crawl_delay: rule_set.crawl_delay,
        },
        (Some(_), None) => Decision {
            url: url.clone(),
            allowed: true,
            reason: DecisionReason::AllowedByRobots,
            crawl_delay: rule_set.crawl_delay,
        },
        (None, Some(_)) => Decision {
            url: url.clone(),
            allowed: false,
            reason: DecisionReason::DisallowedByRobots,
            crawl_delay: None,
        },
        (Some(a), Some(d)) => {
            if d > a {
                Decision {
                    url: url.clone(),
                    allowed: false,
                    reason: DecisionReason::DisallowedByRobots,
                    crawl_delay: None,
                }
            } else {
                Decision {
                    url: url.clone(),
                    allowed: true,
                    reason: DecisionReason::AllowedByRobots,
                    crawl_delay: rule_set.crawl_delay,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://a.example{path}")).unwrap()
    }

    #[test]
    fn empty_ruleset_is_allowed() {
        let parsed = parse("");
        let rs = build_rule_set(&parsed, "a.example", "pageloom", "https://a.example/robots.txt");
        let decision = decide(&url("/anything"), &rs);
        assert!(decision.allowed);
        assert_eq!(decision.reason, DecisionReason::EmptyRuleSet);
    }

    #[test]
    fn unmatched_agent_is_allowed() {
        let parsed = parse("User-agent: other\nDisallow: /private\n");
        let rs = build_rule_set(&parsed, "a.example", "pageloom", "https://a.example/robots.txt");
        let decision = decide(&url("/private"), &rs);
        assert!(decision.allowed);
        assert_eq!(decision.reason, DecisionReason::UserAgentNotMatched);
    }

    #[test]
    fn matched_group_no_rule_hit_is_allowed() {
        let parsed = parse("User-agent: *\nDisallow: /private\n");
        let rs = build_rule_set(&parsed, "a.example", "pageloom", "https://a.example/robots.txt");
        let decision = decide(&url("/public"), &rs);
        assert!(decision.allowed);
        assert_eq!(decision.reason, DecisionReason::NoMatchingRules);
    }

    #[test]
    fn disallow_wins_when_strictly_longer() {
        let parsed = parse("User-agent: *\nAllow: /\nDisallow: /private\n");
        let rs = build_rule_set(&parsed, "a.example", "pageloom", "https://a.example/robots.txt");
        let decision = decide(&url("/private/doc"), &rs);
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::DisallowedByRobots);
    }

    #[test]
    fn allow_wins_on_tie() {
        let parsed = parse("User-agent: *\nAllow: /x\nDisallow: /x\n");
        let rs = build_rule_set(&parsed, "a.example", "pageloom", "https://a.example/robots.txt");
        let decision = decide(&url("/x"), &rs);
        assert!(decision.allowed);
        assert_eq!(decision.reason, DecisionReason::AllowedByRobots);
    }

    #[test]
    fn crawl_delay_carried_through_on_allow() {
        let parsed = parse("User-agent: *\nCrawl-delay: 3\nAllow: /ok\n");
        let rs = build_rule_set(&parsed, "a.example", "pageloom", "https://a.example/robots.txt");
        let decision = decide(&url("/ok"), &rs);
        assert_eq!(decision.crawl_delay, Some(Duration::from_secs_f64(3.0)));
    }

    #[test]
    fn wildcard_and_end_anchor_rules_in_decision() {
        let parsed = parse("User-agent: *\nDisallow: /*.pdf$\n");
        let rs = build_rule_set(&parsed, "a.example", "pageloom", "https://a.example/robots.txt");
        assert!(!decide(&url("/files/report.pdf"), &rs).allowed);
        assert!(decide(&url("/files/report.pdf.html"), &rs).allowed);
    }
}
