use async_trait::async_trait;
use reqwest::{Client, header};
use tracing::{debug, info};

use super::models::PostResponse;
use super::{FetchContext, RetrievalOutcome, Retrieved, Source, SourceTag, ensure_ok, send};
use crate::config::FetchConfig;
use crate::error::SourceError;

/// Authenticated post-details API. Needs a bearer token; may hand back a
/// watermarked URL, in which case the asset is flagged for processing.
pub struct OfficialApi {
    client: Client,
    config: FetchConfig,
    origin: Option<String>,
}

impl OfficialApi {
    pub fn new(client: Client, config: &FetchConfig) -> Self {
        Self {
            client,
            config: config.clone(),
            origin: config.page_origin(),
        }
    }

    /// The lookup and its JSON body share one `http_timeout` budget.
    async fn fetch_post(
        &self,
        ctx: &FetchContext,
        url: &str,
        token: &str,
    ) -> Result<PostResponse, SourceError> {
        debug!(url = %url, "requesting post details");
        let budget = self.config.http_timeout;

        let mut request = self
            .client
            .get(url)
            .timeout(budget)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .header(header::REFERER, ctx.id.canonical_page(&self.config.page_base));
        if let Some(origin) = &self.origin {
            request = request.header(header::ORIGIN, origin);
        }
        if let Some(cookies) = ctx.cookies.as_deref().filter(|c| !c.is_empty()) {
            request = request.header(header::COOKIE, cookies);
        }

        let response = send(request, url, budget).await?;
        ensure_ok(&response, url)?;
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::transport(e, url, budget))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Source for OfficialApi {
    fn tag(&self) -> SourceTag {
        SourceTag::OfficialApi
    }

    async fn retrieve(&self, ctx: &FetchContext) -> RetrievalOutcome {
        let Some(token) = ctx.bearer_token.as_deref().filter(|t| !t.is_empty()) else {
            return Err(SourceError::MissingToken);
        };
        let Some(url) = self.config.api_url(&ctx.id) else {
            return Err(SourceError::NotConfigured {
                source_tag: self.tag(),
            });
        };

        let post = self.fetch_post(ctx, &url, token).await?;
        let playable = post
            .first_attachment()
            .and_then(|attachment| attachment.playable_url())
            .ok_or(SourceError::NoPlayableUrl)?;
        info!(
            id = %ctx.id,
            needs_processing = playable.needs_processing,
            "api returned a playable url"
        );

        let response = send(
            self.client.get(&playable.url),
            &playable.url,
            self.config.http_timeout,
        )
        .await?;
        ensure_ok(&response, &playable.url)?;
        Ok(Retrieved::from_response(response, playable.needs_processing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::test_support::{Stall, client_for, context, drain, http_client, stalling_server};
    use mockito::Matcher;
    use std::time::Duration;

    fn api(server: &mockito::Server) -> OfficialApi {
        let config = FetchConfig {
            api_endpoint: format!("{}/post/{{id}}", server.url()),
            page_base: format!("{}/p/", server.url()),
            ..Default::default()
        };
        OfficialApi::new(http_client(), &config)
    }

    fn authed(id: &str) -> FetchContext {
        let mut ctx = context(id);
        ctx.bearer_token = Some("secret".into());
        ctx.cookies = Some("session=abc".into());
        ctx
    }

    #[tokio::test]
    async fn test_without_token_no_request_is_made() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = api(&server)
            .retrieve(&context("s_abcdefgh"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingToken));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_prefers_no_watermark_url() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "post": {"attachments": [{
                "download_urls": {
                    "no_watermark": format!("{}/files/clean.mp4", server.url()),
                    "watermark": format!("{}/files/wm.mp4", server.url()),
                }
            }]}
        });
        let post = server
            .mock("GET", "/post/s_abcdefgh")
            .match_header("authorization", "Bearer secret")
            .match_header("cookie", "session=abc")
            .match_header("referer", format!("{}/p/s_abcdefgh", server.url()).as_str())
            .match_header("origin", server.url().as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;
        let _mock = server
            .mock("GET", "/files/clean.mp4")
            .with_status(200)
            .with_body("clean")
            .create_async()
            .await;

        let retrieved = api(&server).retrieve(&authed("s_abcdefgh")).await.unwrap();
        assert!(!retrieved.needs_processing);
        assert_eq!(drain(retrieved).await, b"clean");
        post.assert_async().await;
    }

    #[tokio::test]
    async fn test_watermarked_url_needs_processing() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "post": {"attachments": [{
                "download_urls": {"watermark": format!("{}/files/wm.mp4", server.url())}
            }]}
        });
        let _mock = server
            .mock("GET", "/post/s_abcdefgh")
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;
        let _mock = server
            .mock("GET", "/files/wm.mp4")
            .with_status(200)
            .with_body("marked")
            .create_async()
            .await;

        let retrieved = api(&server).retrieve(&authed("s_abcdefgh")).await.unwrap();
        assert!(retrieved.needs_processing);
        assert_eq!(drain(retrieved).await, b"marked");
    }

    #[tokio::test]
    async fn test_no_attachments_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/post/s_abcdefgh")
            .with_status(200)
            .with_body(r#"{"post": {"attachments": []}}"#)
            .create_async()
            .await;

        let err = api(&server)
            .retrieve(&authed("s_abcdefgh"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NoPlayableUrl));
    }

    #[tokio::test]
    async fn test_rejected_token_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/post/s_abcdefgh")
            .with_status(401)
            .create_async()
            .await;

        let err = api(&server)
            .retrieve(&authed("s_abcdefgh"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::HttpStatus { .. }));
    }

    #[tokio::test]
    async fn test_asset_download_failure_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "attachments": [{"downloadable_url": format!("{}/files/gone.mp4", server.url())}]
        });
        let _mock = server
            .mock("GET", "/post/s_abcdefgh")
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;
        let _mock = server
            .mock("GET", "/files/gone.mp4")
            .with_status(403)
            .create_async()
            .await;

        assert!(api(&server).retrieve(&authed("s_abcdefgh")).await.is_err());
    }

    #[tokio::test]
    async fn test_stalled_post_body_times_out() {
        let config = FetchConfig {
            api_endpoint: format!("{}post/{{id}}", stalling_server(Stall::Body).await),
            http_timeout: Duration::from_millis(300),
            ..Default::default()
        };
        let source = OfficialApi::new(client_for(&config), &config);

        let err = tokio::time::timeout(Duration::from_secs(5), source.retrieve(&authed("s_abcdefgh")))
            .await
            .expect("post lookup should give up")
            .unwrap_err();
        assert!(matches!(err, SourceError::Timeout { .. }));
    }
}
