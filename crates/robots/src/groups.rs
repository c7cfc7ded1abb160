use crate::parser::{ParsedGroup, ParsedRobots};

/// Selects the best-matching group for `target_agent`: exact match first,
/// then longest prefix match of a declared agent against the target, then
/// the wildcard `*` group, else none.
pub fn select_group<'a>(parsed: &'a ParsedRobots, target_agent: &str) -> Option<&'a ParsedGroup> {
    let target_lower = target_agent.to_ascii_lowercase();

    for group in &parsed.groups {
        if group
            .user_agents
            .iter()
            .any(|ua| ua.eq_ignore_ascii_case(&target_lower))
        {
            return Some(group);
        }
    }

    let mut best: Option<(&ParsedGroup, usize)> = None;
    for group in &parsed.groups {
        for ua in &group.user_agents {
            let ua_lower = ua.to_ascii_lowercase();
            if ua_lower != "*" && target_lower.starts_with(&ua_lower) {
                let len = ua_lower.len();
                if best.map(|(_, best_len)| len > best_len).unwrap_or(true) {
                    best = Some((group, len));
                }
            }
        }
    }
    if let Some((group, _)) = best {
        return Some(group);
    }

    parsed
        .groups
        .iter()
        .find(|g| g.user_agents.iter().any(|ua| ua == "*"))
}
