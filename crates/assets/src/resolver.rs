use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use pageloom_core::{AssetfulMarkdownDoc, ClassifiedError, ConversionResult, LinkKind, RetryParam};
use pageloom_retry::{run_with_retry, CancelToken};
use pageloom_sink::{ArtifactEvent, ArtifactKind, AssetFetchEvent, ErrorEvent, MetadataSink};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use url::Url;

use crate::error::{AssetError, AssetFetchError};

pub struct ResolveParams<'a> {
    pub output_dir: &'a Path,
    pub max_asset_bytes: usize,
}

/// Per-run asset resolver state: original URL → content hash, and content
/// hash → the local path written for the first URL that produced it.
#[derive(Default)]
pub struct AssetResolver {
    written_assets: Mutex<HashMap<String, String>>,
    hash_to_path: Mutex<HashMap<String, String>>,
}

fn derive_local_path(url: &Url, hash_hex: &str) -> String {
    let last_segment = url
        .path_segments()
        .and_then(|mut segs| segs.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or("asset");

    let (stem, ext) = match last_segment.rsplit_once('.') {
        Some((s, e)) if !s.is_empty() => (s, e),
        _ => (last_segment, "bin"),
    };
    let safe_stem = sanitize_filename::sanitize(stem);
    let safe_stem = if safe_stem.is_empty() {
        "asset".to_string()
    } else {
        safe_stem
    };
    let short_hash = &hash_hex[..hash_hex.len().min(7)];
    format!("assets/images/{safe_stem}-{short_hash}.{ext}")
}

async fn fetch_asset_bytes(
    client: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<(Vec<u8>, u16), AssetFetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AssetFetchError::NetworkFailure(e.to_string()))?;
    let status = response.status();
    if status.as_u16() == 429 || status.is_server_error() {
        return Err(AssetFetchError::ServerError(status.as_u16()));
    }
    if status.is_client_error() {
        return Err(AssetFetchError::ClientError(status.as_u16()));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| AssetFetchError::NetworkFailure(e.to_string()))?;
    if bytes.len() > max_bytes {
        return Err(AssetFetchError::TooLarge);
    }
    Ok((bytes.to_vec(), status.as_u16()))
}

impl AssetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves, fetches, and rewrites image references in `conversion`'s
    /// Markdown. Non-image link kinds and already-resolved URLs (across the
    /// whole run) pass through unchanged or are skipped respectively.
    #[allow(clippy::too_many_arguments)]
    pub async fn resolve(
        &self,
        client: &reqwest::Client,
        cancel: &CancelToken,
        sink: &dyn MetadataSink,
        page_url: &Url,
        conversion: &ConversionResult,
        params: &ResolveParams<'_>,
        retry_param: &RetryParam,
    ) -> Result<AssetfulMarkdownDoc, AssetError> {
        let mut seen_absolute = std::collections::HashSet::new();
        let mut unique_refs: Vec<(String, Url)> = Vec::new();
        for link in conversion
            .link_refs
            .iter()
            .filter(|l| l.kind == LinkKind::Image)
        {
            let Ok(absolute) = page_url.join(&link.raw) else {
                continue;
            };
            let key = absolute.to_string();
            if seen_absolute.insert(key) {
                unique_refs.push((link.raw.clone(), absolute));
            }
        }

        let images_dir = params.output_dir.join("assets").join("images");
        if let Err(e) = std::fs::create_dir_all(&images_dir) {
            sink.record_error(ErrorEvent {
                observed_at: chrono::Utc::now(),
                package_name: "pageloom-assets".to_string(),
                action: "Resolver.Resolve".to_string(),
                cause: pageloom_core::ErrorCause::StorageFailure,
                details: e.to_string(),
                attrs: vec![
                    ("write_path".to_string(), images_dir.display().to_string()),
                    ("url".to_string(), page_url.to_string()),
                ],
            });
            return Err(AssetError::OutputDirUnavailable(e.to_string()));
        }

        let mut replacements: HashMap<String, String> = HashMap::new();

        for (raw, absolute_url) in &unique_refs {
            let url_key = absolute_url.to_string();

            let already_written = self.written_assets.lock().await.get(&url_key).cloned();
            if let Some(hash) = already_written {
                if let Some(path) = self.hash_to_path.lock().await.get(&hash).cloned() {
                    tracing::debug!(url = %url_key, %hash, "asset already fetched this run, reusing");
                    replacements.insert(raw.clone(), path);
                }
                continue;
            }

            let started = Instant::now();
            let result = run_with_retry(retry_param, cancel, |_attempt| {
                fetch_asset_bytes(client, &url_key, params.max_asset_bytes)
            })
            .await;
            let duration = started.elapsed();

            match result.outcome {
                Ok((bytes, status)) => {
                    sink.record_asset_fetch(AssetFetchEvent {
                        url: url_key.clone(),
                        status,
                        duration,
                        retry_count: result.attempts,
                    });

                    let mut hasher = Sha256::new();
                    hasher.update(&bytes);
                    let hash_hex = hex::encode(hasher.finalize());

                    let mut hash_to_path = self.hash_to_path.lock().await;
                    let path = if let Some(existing) = hash_to_path.get(&hash_hex) {
                        tracing::debug!(url = %url_key, hash = %hash_hex, "content hash already written under a different url, deduping");
                        existing.clone()
                    } else {
                        let local_path = derive_local_path(absolute_url, &hash_hex);
                        let full_path = params.output_dir.join(&local_path);
                        if let Some(parent) = full_path.parent() {
                            let _ = std::fs::create_dir_all(parent);
                        }
                        if std::fs::write(&full_path, &bytes).is_ok() {
                            hash_to_path.insert(hash_hex.clone(), local_path.clone());
                            sink.record_artifact(ArtifactEvent {
                                kind: ArtifactKind::Asset,
                                path: local_path.clone(),
                                attrs: vec![("url".to_string(), page_url.to_string())],
                            });
                        }
                        local_path
                    };
                    drop(hash_to_path);

                    self.written_assets
                        .lock()
                        .await
                        .insert(url_key.clone(), hash_hex);
                    replacements.insert(raw.clone(), path);
                }
                Err(err) => {
                    sink.record_asset_fetch(AssetFetchEvent {
                        url: url_key.clone(),
                        status: 0,
                        duration,
                        retry_count: result.attempts,
                    });
                    sink.record_error(ErrorEvent {
                        observed_at: chrono::Utc::now(),
                        package_name: "pageloom-assets".to_string(),
                        action: "Resolver.Resolve".to_string(),
                        cause: pageloom_core::ErrorCause::NetworkFailure,
                        details: format!("missing asset: {url_key}: {err}"),
                        attrs: vec![
                            ("url".to_string(), url_key.clone()),
                            ("page_url".to_string(), page_url.to_string()),
                        ],
                    });
                    // Left out of `replacements`: the raw reference in the
                    // Markdown stays exactly as authored.
                }
            }
        }

        let mut markdown = String::from_utf8_lossy(&conversion.markdown).into_owned();
        for (raw, path) in &replacements {
            markdown = markdown.replace(&format!("]({raw})"), &format!("]({path})"));
        }

        Ok(AssetfulMarkdownDoc {
            content: markdown.into_bytes(),
        })
    }
}
