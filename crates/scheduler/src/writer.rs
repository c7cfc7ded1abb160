use std::path::{Path, PathBuf};

use url::Url;

/// Derives the on-disk Markdown path for a page URL: `pages/<host>/<path
/// segments>.md`, with empty/trailing-slash paths mapped to `index.md`.
pub fn derive_page_path(url: &Url) -> PathBuf {
    let host = url.host_str().unwrap_or("unknown-host");
    let mut path = PathBuf::from("pages").join(host);

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segs| segs.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if segments.is_empty() {
        path.push("index.md");
        return path;
    }

    for seg in &segments[..segments.len() - 1] {
        path.push(seg);
    }
    let last = segments[segments.len() - 1];
    let file_name = match last.rsplit_once('.') {
        Some((stem, _ext)) => format!("{stem}.md"),
        None => format!("{last}.md"),
    };
    path.push(file_name);
    path
}

pub fn write_page(output_dir: &Path, relative_path: &Path, content: &[u8]) -> std::io::Result<PathBuf> {
    let full_path = output_dir.join(relative_path);
    if let Some(parent) = full_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&full_path, content)?;
    Ok(full_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_is_index() {
        let url = Url::parse("https://docs.example.com/").unwrap();
        assert_eq!(derive_page_path(&url), PathBuf::from("pages/docs.example.com/index.md"));
    }

    #[test]
    fn nested_path_preserves_directories() {
        let url = Url::parse("https://docs.example.com/guide/intro.html").unwrap();
        assert_eq!(
            derive_page_path(&url),
            PathBuf::from("pages/docs.example.com/guide/intro.md")
        );
    }

    #[test]
    fn extensionless_path_gets_md_suffix() {
        let url = Url::parse("https://docs.example.com/guide/intro").unwrap();
        assert_eq!(
            derive_page_path(&url),
            PathBuf::from("pages/docs.example.com/guide/intro.md")
        );
    }

    #[test]
    fn write_page_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let rel = PathBuf::from("pages/example.com/a/b.md");
        let written = write_page(tmp.path(), &rel, b"# hi").unwrap();
        assert_eq!(std::fs::read(&written).unwrap(), b"# hi");
    }
}
