pub mod error;
pub mod resolver;

pub use error::{AssetError, AssetFetchError};
pub use resolver::{AssetResolver, ResolveParams};

#[cfg(test)]
mod tests {
    use super::*;
    use pageloom_core::{BackoffParam, ConversionResult, LinkKind, LinkRef, RetryParam};
    use pageloom_retry::never_cancelled;
    use pageloom_sink::RecordingSink;
    use std::time::Duration;
    use url::Url;

    fn fast_retry() -> RetryParam {
        RetryParam {
            base_delay: Duration::from_millis(1),
            jitter: Duration::ZERO,
            random_seed: 0,
            max_attempts: 2,
            backoff: BackoffParam {
                initial: Duration::from_millis(1),
                multiplier: 1.0,
                max: Duration::from_millis(5),
            },
        }
    }

    #[tokio::test]
    async fn content_hash_dedup_across_different_urls() {
        let mut server = mockito::Server::new_async().await;
        let body = b"same-bytes";
        let mock_a = server
            .mock("GET", "/a.png")
            .with_status(200)
            .with_body(body.as_slice())
            .create_async()
            .await;
        let mock_b = server
            .mock("GET", "/b.jpg")
            .with_status(200)
            .with_body(body.as_slice())
            .create_async()
            .await;

        let page_url = Url::parse(&format!("{}/page.html", server.url())).unwrap();
        let conversion = ConversionResult {
            markdown: format!("![a]({0}/a.png) ![b]({0}/b.jpg)", server.url()).into_bytes(),
            link_refs: vec![
                LinkRef {
                    raw: format!("{}/a.png", server.url()),
                    kind: LinkKind::Image,
                },
                LinkRef {
                    raw: format!("{}/b.jpg", server.url()),
                    kind: LinkKind::Image,
                },
            ],
        };

        let tmp = tempfile::tempdir().unwrap();
        let resolver = AssetResolver::new();
        let client = reqwest::Client::new();
        let sink = RecordingSink::new();
        let params = ResolveParams {
            output_dir: tmp.path(),
            max_asset_bytes: 1024,
        };

        let doc = resolver
            .resolve(
                &client,
                &never_cancelled(),
                &sink,
                &page_url,
                &conversion,
                &params,
                &fast_retry(),
            )
            .await
            .unwrap();

        mock_a.assert_async().await;
        mock_b.assert_async().await;

        assert_eq!(sink.asset_fetches().len(), 2);
        assert_eq!(sink.artifacts().len(), 1);

        let markdown = String::from_utf8(doc.content).unwrap();
        let artifact_path = &sink.artifacts()[0].path;
        assert!(artifact_path.contains("a-"));
        assert!(markdown.matches(artifact_path.as_str()).count() == 2);
    }

    #[tokio::test]
    async fn cross_call_dedup_skips_fetch_and_artifact() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/shared.png")
            .with_status(200)
            .with_body("bytes")
            .expect(1)
            .create_async()
            .await;

        let page_url = Url::parse(&format!("{}/page1.html", server.url())).unwrap();
        let image_url = format!("{}/shared.png", server.url());
        let conversion = ConversionResult {
            markdown: format!("![x]({image_url})").into_bytes(),
            link_refs: vec![LinkRef {
                raw: image_url.clone(),
                kind: LinkKind::Image,
            }],
        };

        let tmp = tempfile::tempdir().unwrap();
        let resolver = AssetResolver::new();
        let client = reqwest::Client::new();
        let sink = RecordingSink::new();
        let params = ResolveParams {
            output_dir: tmp.path(),
            max_asset_bytes: 1024,
        };

        resolver
            .resolve(
                &client,
                &never_cancelled(),
                &sink,
                &page_url,
                &conversion,
                &params,
                &fast_retry(),
            )
            .await
            .unwrap();
        assert_eq!(sink.asset_fetches().len(), 1);
        assert_eq!(sink.artifacts().len(), 1);

        let page2_url = Url::parse(&format!("{}/page2.html", server.url())).unwrap();
        resolver
            .resolve(
                &client,
                &never_cancelled(),
                &sink,
                &page2_url,
                &conversion,
                &params,
                &fast_retry(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        // No new fetch or artifact on the second call for the same URL.
        assert_eq!(sink.asset_fetches().len(), 1);
        assert_eq!(sink.artifacts().len(), 1);
    }

    #[tokio::test]
    async fn partial_failure_preserves_failed_url_in_markdown() {
        let mut server = mockito::Server::new_async().await;
        let ok_mock = server
            .mock("GET", "/ok.png")
            .with_status(200)
            .with_body("bytes")
            .create_async()
            .await;
        let fail_mock = server
            .mock("GET", "/missing.png")
            .with_status(404)
            .create_async()
            .await;

        let page_url = Url::parse(&format!("{}/page.html", server.url())).unwrap();
        let ok_url = format!("{}/ok.png", server.url());
        let missing_url = format!("{}/missing.png", server.url());
        let conversion = ConversionResult {
            markdown: format!("![a]({ok_url}) ![b]({missing_url})").into_bytes(),
            link_refs: vec![
                LinkRef {
                    raw: ok_url.clone(),
                    kind: LinkKind::Image,
                },
                LinkRef {
                    raw: missing_url.clone(),
                    kind: LinkKind::Image,
                },
            ],
        };

        let tmp = tempfile::tempdir().unwrap();
        let resolver = AssetResolver::new();
        let client = reqwest::Client::new();
        let sink = RecordingSink::new();
        let params = ResolveParams {
            output_dir: tmp.path(),
            max_asset_bytes: 1024,
        };

        let doc = resolver
            .resolve(
                &client,
                &never_cancelled(),
                &sink,
                &page_url,
                &conversion,
                &params,
                &fast_retry(),
            )
            .await
            .unwrap();

        ok_mock.assert_async().await;
        fail_mock.assert_async().await;

        let markdown = String::from_utf8(doc.content).unwrap();
        assert!(markdown.contains(&missing_url));
        assert!(!markdown.contains(&ok_url));
        assert_eq!(sink.errors().len(), 1);
    }
}
