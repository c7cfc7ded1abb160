#[derive(Debug, Clone, Default)]
pub struct ParsedGroup {
    pub user_agents: Vec<String>,
    pub allow: Vec<String>,
    pub disallow: Vec<String>,
    pub crawl_delay: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    pub groups: Vec<ParsedGroup>,
    pub sitemaps: Vec<String>,
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Splits `key: value` on the first colon, trimming both sides. Returns
/// `None` for lines with no colon at all.
fn split_directive(line: &str) -> Option<(String, String)> {
    let idx = line.find(':')?;
    let key = line[..idx].trim().to_ascii_lowercase();
    let value = line[idx + 1..].trim().to_string();
    Some((key, value))
}

/// Parses a robots.txt body per the group-accumulation rules: consecutive
/// `user-agent` lines with no intervening rule share a group; a rule closes
/// the header and starts accumulating into that group; the next
/// `user-agent` after any rule starts a new group. Rules before any
/// `user-agent` form an implicit `*` group at the head of the list.
pub fn parse(body: &str) -> ParsedRobots {
    let mut groups: Vec<ParsedGroup> = Vec::new();
    let mut current: Option<ParsedGroup> = None;
    let mut current_has_rule = false;
    let mut implicit_global: Option<ParsedGroup> = None;
    let mut sitemaps = Vec::new();

    for raw_line in body.lines() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = split_directive(line) else {
            continue;
        };

        match key.as_str() {
            "user-agent" => {
                if value.is_empty() {
                    continue;
                }
                if current.is_some() && !current_has_rule {
                    current.as_mut().unwrap().user_agents.push(value);
                } else {
                    if let Some(g) = current.take() {
                        groups.push(g);
                    }
                    current = Some(ParsedGroup {
                        user_agents: vec![value],
                        ..ParsedGroup::default()
                    });
                    current_has_rule = false;
                }
            }
            "allow" | "disallow" => {
                let target = match &mut current {
                    Some(g) => {
                        current_has_rule = true;
                        g
                    }
                    None => implicit_global.get_or_insert_with(|| ParsedGroup {
                        user_agents: vec!["*".to_string()],
                        ..ParsedGroup::default()
                    }),
                };
                if key == "allow" {
                    target.allow.push(value);
                } else {
                    target.disallow.push(value);
                }
            }
            "crawl-delay" => {
                if let Ok(seconds) = value.parse::<f64>() {
                    if seconds.is_finite() && seconds >= 0.0 {
                        let target = match &mut current {
                            Some(g) => {
                                current_has_rule = true;
                                g
                            }
                            None => implicit_global.get_or_insert_with(|| ParsedGroup {
                                user_agents: vec!["*".to_string()],
                                ..ParsedGroup::default()
                            }),
                        };
                        target.crawl_delay = Some(seconds);
                    }
                }
            }
            "sitemap" => {
                if !value.is_empty() {
                    sitemaps.push(value);
                }
            }
            _ => {}
        }
    }

    if let Some(g) = current.take() {
        groups.push(g);
    }

    let mut final_groups = Vec::with_capacity(groups.len() + 1);
    if let Some(g) = implicit_global {
        final_groups.push(g);
    }
    final_groups.extend(groups);

    ParsedRobots {
        groups: final_groups,
        sitemaps,
    }
}
