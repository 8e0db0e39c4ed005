use crate::anchor::Anchor;
use crate::error::{Result, ScanError};
use crate::source::PageSource;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Fetches pages over HTTP and parses their anchors.
pub struct WikiClient {
    client: Client,
    timeout_secs: u64,
}

impl WikiClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("wikiwalk/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            // Special:Random answers with a redirect to the chosen article
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Fetch the raw document at `locator`. Any non-2xx status is an error.
    pub async fn fetch_document(&self, locator: &str) -> Result<String> {
        let url = Url::parse(locator)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", locator, e)))?;

        debug!("Fetching {}", url);
        let start = Instant::now();
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Status {
                url: locator.to_string(),
                status: status.as_u16(),
            });
        }

        let is_html = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);

        let body = response.text().await?;
        debug!(
            "Fetched {} ({} bytes) in {:?}",
            locator,
            body.len(),
            start.elapsed()
        );

        // Only HTML carries links worth following
        if !is_html {
            debug!("{} is not HTML, treating as linkless", locator);
            return Ok(String::new());
        }

        Ok(body)
    }
}

/// Every `<a href>` in the document, in document order, with its visible text.
pub fn parse_anchors(html: &str) -> Result<Vec<Anchor>> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a[href]")
        .map_err(|e| ScanError::Other(format!("invalid anchor selector: {}", e)))?;

    let anchors = document
        .select(&link_selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            Some(Anchor::new(href, element.text().collect::<String>()))
        })
        .collect();

    Ok(anchors)
}

impl PageSource for WikiClient {
    async fn fetch_anchors(&self, locator: &str) -> Result<Vec<Anchor>> {
        let body = self.fetch_document(locator).await?;
        let anchors = parse_anchors(&body)?;
        debug!("Found {} anchors on {}", anchors.len(), locator);
        Ok(anchors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn html_page(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/html; charset=UTF-8")
            .set_body_bytes(format!("<html><body>{}</body></html>", body).into_bytes())
    }

    #[test]
    fn test_parse_anchors_keeps_document_order_and_text() {
        let html = r#"<html><body>
            <p>See <a href="/wiki/Dog">the <b>Dog</b></a> and
            <a href="/wiki/Wolf">Wolf</a>.</p>
            <a name="no-href">ignored</a>
        </body></html>"#;

        let anchors = parse_anchors(html).unwrap();

        assert_eq!(
            anchors,
            vec![
                Anchor::new("/wiki/Dog", "the Dog"),
                Anchor::new("/wiki/Wolf", "Wolf"),
            ]
        );
    }

    #[test]
    fn test_parse_anchors_empty_document() {
        assert!(parse_anchors("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_anchors_from_server() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wiki/Cat"))
            .respond_with(html_page(
                r#"<a href="/wiki/Dog">dog</a><a href="https://example.org/x">elsewhere</a>"#,
            ))
            .mount(&mock_server)
            .await;

        let client = WikiClient::new().unwrap();
        let anchors = client
            .fetch_anchors(&format!("{}/wiki/Cat", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0], Anchor::new("/wiki/Dog", "dog"));
        assert_eq!(anchors[1].href, "https://example.org/x");
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wiki/Missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = WikiClient::new().unwrap();
        let err = client
            .fetch_anchors(&format!("{}/wiki/Missing", mock_server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_non_html_has_no_anchors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wiki/data.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_bytes(br#"{"href": "<a href='/wiki/Dog'>dog</a>"}"#.to_vec()),
            )
            .mount(&mock_server)
            .await;

        let client = WikiClient::new().unwrap();
        let anchors = client
            .fetch_anchors(&format!("{}/wiki/data.json", mock_server.uri()))
            .await
            .unwrap();

        assert!(anchors.is_empty());
    }

    #[tokio::test]
    async fn test_follows_redirects() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wiki/Special:Random"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/wiki/Otter", mock_server.uri())),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/wiki/Otter"))
            .respond_with(html_page(r#"<a href="/wiki/Weasel">weasel</a>"#))
            .mount(&mock_server)
            .await;

        let client = WikiClient::new().unwrap();
        let anchors = client
            .fetch_anchors(&format!("{}/wiki/Special:Random", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(anchors, vec![Anchor::new("/wiki/Weasel", "weasel")]);
    }

    #[tokio::test]
    async fn test_invalid_locator() {
        let client = WikiClient::new().unwrap();
        let err = client.fetch_document("not a url").await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidUrl(_)));
    }
}
