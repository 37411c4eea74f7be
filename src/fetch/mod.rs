pub mod meta;
pub mod oembed;
pub mod structured;

use log::debug;
use reqwest::header::USER_AGENT;
use reqwest::Client;

/// The client identity presented to a remote server.
///
/// Several platforms serve different markup to different clients: a regular
/// browser gets a hydrated app shell, while link-preview bots get plain
/// Open-Graph tags. Extractors pick the identity that yields the most
/// scrapable markup for their platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientIdentity {
    /// Desktop Chrome
    Browser,
    /// Mobile Safari (some platforms gate embed JSON on mobile clients)
    MobileBrowser,
    /// Link-preview crawler identity, served OG-tag-rich static markup
    LinkPreview,
}

impl ClientIdentity {
    pub fn user_agent(&self) -> &'static str {
        match self {
            ClientIdentity::Browser => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            }
            ClientIdentity::MobileBrowser => {
                "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                 AppleWebKit/605.1.15 (Version/17.0 Mobile/15E148 Safari/604.1)"
            }
            ClientIdentity::LinkPreview => "facebookexternalhit/1.1 (+http://www.facebook.com/externalhit_uatext.php)",
        }
    }
}

/// Fetch a page body as text with the given client identity.
///
/// Returns `None` on any network failure or non-2xx status — never an error.
/// Retry policy, if any, belongs to the calling extractor.
pub async fn fetch_html(client: &Client, url: &str, identity: ClientIdentity) -> Option<String> {
    let response = match client
        .get(url)
        .header(USER_AGENT, identity.user_agent())
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            debug!("fetch {url} failed: {e}");
            return None;
        }
    };

    if !response.status().is_success() {
        debug!("fetch {url} returned {}", response.status());
        return None;
    }

    match response.text().await {
        Ok(body) => Some(body),
        Err(e) => {
            debug!("fetch {url} body read failed: {e}");
            None
        }
    }
}

/// Fetch a URL and parse the body as JSON, defensively.
///
/// Same contract as [`fetch_html`]: `None` on any failure.
pub async fn fetch_json(
    client: &Client,
    url: &str,
    identity: ClientIdentity,
) -> Option<serde_json::Value> {
    let body = fetch_html(client, url, identity).await?;
    match serde_json::from_str(&body) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("fetch {url} returned unparseable JSON: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_html_ok() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .match_header("user-agent", mockito::Matcher::Regex("Chrome".to_string()))
            .with_status(200)
            .with_body("<html>hi</html>")
            .create_async()
            .await;

        let client = Client::new();
        let url = format!("{}/page", server.url());
        let body = fetch_html(&client, &url, ClientIdentity::Browser).await;
        assert_eq!(body.as_deref(), Some("<html>hi</html>"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_html_sends_mobile_identity() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/embed")
            .match_header("user-agent", mockito::Matcher::Regex("iPhone".to_string()))
            .with_status(200)
            .with_body("<html>embed</html>")
            .create_async()
            .await;

        let client = Client::new();
        let url = format!("{}/embed", server.url());
        let body = fetch_html(&client, &url, ClientIdentity::MobileBrowser).await;
        assert_eq!(body.as_deref(), Some("<html>embed</html>"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_html_non_2xx_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let client = Client::new();
        let url = format!("{}/missing", server.url());
        assert!(fetch_html(&client, &url, ClientIdentity::Browser).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_html_network_failure_is_none() {
        let client = Client::new();
        // Nothing listens here.
        let body = fetch_html(&client, "http://127.0.0.1:1/x", ClientIdentity::Browser).await;
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_fetch_json_bad_body_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/j")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = Client::new();
        let url = format!("{}/j", server.url());
        assert!(fetch_json(&client, &url, ClientIdentity::Browser).await.is_none());
    }
}
