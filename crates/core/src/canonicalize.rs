use url::Url;

/// Normalizes a URL into a deduplication key. Pure, idempotent, no I/O.
///
/// Rules, applied in order:
/// 1. scheme lowercased
/// 2. host lowercased
/// 3. default port stripped (`:80` for http, `:443` for https)
/// 4. trailing slashes on path collapsed (root `/` preserved)
/// 5. fragment cleared
/// 6. query string (and force-query marker) cleared
pub fn canonicalize(url: &Url) -> Url {
    let mut out = url.clone();

    let scheme_lower = out.scheme().to_ascii_lowercase();
    if scheme_lower != out.scheme() {
        let _ = out.set_scheme(&scheme_lower);
    }

    if let Some(host) = out.host_str() {
        let lower = host.to_ascii_lowercase();
        if lower != host {
            let _ = out.set_host(Some(&lower));
        }
    }

    let is_default_port = match (out.scheme(), out.port()) {
        ("http", Some(80)) => true,
        ("https", Some(443)) => true,
        _ => false,
    };
    if is_default_port {
        let _ = out.set_port(None);
    }

    let path = out.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
        out.set_path(trimmed);
    }

    out.set_fragment(None);
    out.set_query(None);

    out
}

/// Convenience form for callers holding only a string.
pub fn canonicalize_str(raw: &str) -> Result<Url, url::ParseError> {
    let parsed = Url::parse(raw)?;
    Ok(canonicalize(&parsed))
}
