use crate::scrapers::error::{Result, ScrapeError};
use crate::scrapers::fetch::{Renderer, USER_AGENT};
use anyhow::Context;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Clicks the first button labelled like a consent "accept"/"agree".
const DISMISS_CONSENT: &str = r#"
(() => {
    const button = Array.from(document.querySelectorAll('button'))
        .find(b => /accept|agree/i.test(b.textContent || ''));
    if (button) { button.click(); return true; }
    return false;
})()
"#;

/// Headless Chrome page renderer
pub struct ChromeRenderer {
    browser: Browser,
    settle: Duration,
}

impl ChromeRenderer {
    /// Launch a headless Chrome. Fails when no Chrome binary can be found.
    pub fn new() -> Result<Self> {
        info!("Launching headless Chrome...");
        Self::launch().map_err(|e| ScrapeError::CapabilityUnavailable(format!("{e:#}")))
    }

    fn launch() -> anyhow::Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .idle_browser_timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        Ok(Self {
            browser,
            settle: Duration::from_secs(2),
        })
    }

    /// Time to let asynchronous content settle after load and after the consent click
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    fn render_page(&self, url: &str) -> anyhow::Result<String> {
        let tab = self.browser.new_tab().context("Failed to open tab")?;
        let html = self.capture(&tab, url);

        if let Err(e) = tab.close(true) {
            debug!("Failed to close tab for {}: {}", url, e);
        }

        let html = html?;
        if html.is_empty() {
            anyhow::bail!("Rendered page at {url} is empty");
        }
        debug!("Rendered {} bytes of HTML from {}", html.len(), url);
        Ok(html)
    }

    /// Load `url` in `tab` and return its HTML. The caller owns closing the tab.
    fn capture(&self, tab: &Tab, url: &str) -> anyhow::Result<String> {
        tab.set_default_timeout(NAVIGATION_TIMEOUT);
        tab.set_user_agent(USER_AGENT, None, None)
            .context("Failed to set user agent")?;

        tab.navigate_to(url)
            .with_context(|| format!("Failed to navigate to {url}"))?;
        tab.wait_until_navigated()
            .with_context(|| format!("Timed out loading {url}"))?;

        // Consent overlays are best-effort; a failed click changes nothing.
        let dismissed = tab
            .evaluate(DISMISS_CONSENT, false)
            .ok()
            .and_then(|r| r.value)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        debug!("Consent overlay dismissed: {}", dismissed);

        thread::sleep(self.settle);

        let html = tab
            .evaluate("document.documentElement.outerHTML", false)
            .context("Failed to capture page HTML")?
            .value
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Ok(html)
    }
}

impl Renderer for ChromeRenderer {
    fn render(&self, url: &str) -> Result<String> {
        self.render_page(url)
            .map_err(|e| ScrapeError::Render(format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_tabs(renderer: &ChromeRenderer) -> usize {
        renderer.browser.get_tabs().lock().map(|t| t.len()).unwrap_or(0)
    }

    #[test]
    #[ignore = "needs a local Chrome"]
    fn failed_render_closes_its_tab() {
        let renderer = ChromeRenderer::new().unwrap().with_settle(Duration::ZERO);
        let before = open_tabs(&renderer);

        for _ in 0..3 {
            assert!(renderer.render("http://127.0.0.1:9/").is_err());
        }

        // Tabs leave the list once Chrome reports them destroyed.
        let mut after = open_tabs(&renderer);
        for _ in 0..50 {
            if after <= before {
                break;
            }
            thread::sleep(Duration::from_millis(100));
            after = open_tabs(&renderer);
        }
        assert_eq!(after, before);
    }
}
