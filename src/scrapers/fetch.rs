use crate::scrapers::error::{Result, ScrapeError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Full browser-engine page load. Blocking; callers run it off the async runtime.
pub trait Renderer: Send + Sync {
    fn render(&self, url: &str) -> Result<String>;
}

/// Markup returned by [`PageFetcher::fetch_page`].
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub markup: String,
    /// Whether the markup came from the browser rather than a plain request
    pub rendered: bool,
}

/// Source of page markup for the pagination driver.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Plain HTTP retrieval
    async fn fetch(&self, url: &str) -> Result<String>;

    /// Enhanced (browser) retrieval
    async fn render(&self, url: &str) -> Result<String>;

    /// Plain retrieval, escalating to the browser on failure when allowed.
    async fn fetch_page(&self, url: &str, use_enhanced_rendering: bool) -> Result<FetchedPage> {
        match self.fetch(url).await {
            Ok(markup) => Ok(FetchedPage {
                markup,
                rendered: false,
            }),
            Err(e) if use_enhanced_rendering => {
                warn!("Plain fetch of {} failed ({}), trying browser rendering", url, e);
                let markup = self.render(url).await?;
                Ok(FetchedPage {
                    markup,
                    rendered: true,
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// reqwest-backed fetcher with an optional browser fallback
pub struct HttpFetcher {
    client: Client,
    renderer: Option<Arc<dyn Renderer>>,
}

impl HttpFetcher {
    /// Create a fetcher that presents itself as a desktop browser coming from `referer`.
    pub fn new(referer: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_str(referer)?);

        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            renderer: None,
        })
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn can_render(&self) -> bool {
        self.renderer.is_some()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching URL: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("{} returned status: {}", url, status);
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        debug!("Downloaded {} bytes of HTML", html.len());
        Ok(html)
    }

    async fn render(&self, url: &str) -> Result<String> {
        let Some(renderer) = self.renderer.clone() else {
            return Err(ScrapeError::CapabilityUnavailable(
                "no headless browser is configured".into(),
            ));
        };

        let url = url.to_string();
        tokio::task::spawn_blocking(move || renderer.render(&url))
            .await
            .map_err(|e| ScrapeError::Render(format!("render task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedRenderer(&'static str);

    impl Renderer for CannedRenderer {
        fn render(&self, _url: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    // Nothing listens on the discard port, so the plain fetch fails fast.
    const DEAD_URL: &str = "http://127.0.0.1:9/search";

    #[tokio::test]
    async fn render_without_browser_is_capability_unavailable() {
        let fetcher = HttpFetcher::new("https://www.immoweb.be/").unwrap();
        assert!(!fetcher.can_render());
        let err = fetcher.render(DEAD_URL).await.unwrap_err();
        assert!(matches!(err, ScrapeError::CapabilityUnavailable(_)));
    }

    #[tokio::test]
    async fn fetch_page_escalates_to_renderer() {
        let fetcher = HttpFetcher::new("https://www.immoweb.be/")
            .unwrap()
            .with_renderer(Arc::new(CannedRenderer("<html>rendered</html>")));

        let page = fetcher.fetch_page(DEAD_URL, true).await.unwrap();
        assert!(page.rendered);
        assert_eq!(page.markup, "<html>rendered</html>");
    }

    #[tokio::test]
    async fn fetch_page_without_permission_reports_failure() {
        let fetcher = HttpFetcher::new("https://www.immoweb.be/")
            .unwrap()
            .with_renderer(Arc::new(CannedRenderer("<html>rendered</html>")));

        assert!(fetcher.fetch_page(DEAD_URL, false).await.is_err());
    }
}
