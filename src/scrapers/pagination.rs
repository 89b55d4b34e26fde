//! Multi-page scrape driver.

use crate::models::{ListingRecord, RawRecord, Source};
use crate::scrapers::dedup::dedupe;
use crate::scrapers::error::Result;
use crate::scrapers::fetch::PageFetcher;
use crate::scrapers::traits::SiteScraper;
use crate::scrapers::types::{ExtractionOutcome, SearchParams};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use url::Url;

const PAGE_PARAM: &str = "page";

/// Why a scrape stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// Every requested page was visited
    Completed,
    /// A later page had no listings: natural end of the result set
    Exhausted { page: u32 },
    /// A page could not be fetched, even through the browser when allowed
    FetchFailed { page: u32 },
    /// The first page had no recognizable listings
    NoListings { page: u32 },
    /// The search URL could not be parsed
    InvalidUrl,
}

impl StopReason {
    /// Whether the scrape ended early for a reason other than running out of results.
    pub fn is_abort(&self) -> bool {
        matches!(
            self,
            StopReason::FetchFailed { .. } | StopReason::NoListings { .. } | StopReason::InvalidUrl
        )
    }
}

/// Outcome of one multi-page scrape.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub source: Source,
    /// Deduplicated listings in first-seen order
    pub records: Vec<ListingRecord>,
    pub pages_scraped: u32,
    pub stop: StopReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Per-call state of the driver
struct ScrapeSession {
    page: u32,
    records: Vec<ListingRecord>,
}

/// Build the URL of result page `page` by rewriting or appending the `page`
/// query parameter. The rest of the query is kept as written.
pub fn page_url(base: &str, page: u32) -> Result<String> {
    let mut url = Url::parse(base)?;
    let pair = format!("{PAGE_PARAM}={page}");
    let query = url.query().unwrap_or_default().to_string();

    let mut parts: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
    let mut rewritten = false;
    for part in parts.iter_mut() {
        if part.split('=').next() == Some(PAGE_PARAM) {
            *part = pair.as_str();
            rewritten = true;
        }
    }
    if !rewritten {
        parts.push(pair.as_str());
    }

    url.set_query(Some(&parts.join("&")));
    Ok(url.into())
}

/// Run the site's strategies in order and return the rows of the first one that finds its container.
fn extract_rows(site: &dyn SiteScraper, markup: &str, page: u32) -> Option<Vec<RawRecord>> {
    let source = site.source();
    for strategy in site.strategies() {
        match strategy.extract(markup) {
            Ok(ExtractionOutcome::Found(rows)) => {
                info!(%source, page, strategy = strategy.name(), "Found {} raw listings", rows.len());
                return Some(rows);
            }
            Ok(ExtractionOutcome::NotFound) => {
                debug!(%source, page, strategy = strategy.name(), "Strategy found nothing");
            }
            Err(e) => {
                warn!(%source, page, strategy = strategy.name(), "Strategy failed: {}", e);
            }
        }
    }
    None
}

/// Scrape up to `params.pages` result pages of `site`.
///
/// Never fails: fetch failures, a first page without listings or an
/// unparsable URL end the scrape early and the records gathered so far are
/// returned with the reason in [`ScrapeReport::stop`].
pub async fn scrape(
    site: &dyn SiteScraper,
    fetcher: &dyn PageFetcher,
    params: &SearchParams,
) -> ScrapeReport {
    let source = site.source();
    let started_at = Utc::now();
    let pause = params.pause();
    let mut session = ScrapeSession {
        page: 1,
        records: Vec::new(),
    };
    let mut pages_scraped = 0;
    let mut stop = StopReason::Completed;

    info!(%source, pages = params.pages, "Starting scrape of {}", params.url);

    while session.page <= params.pages {
        let page = session.page;

        let url = match page_url(&params.url, page) {
            Ok(url) => url,
            Err(e) => {
                error!(%source, "Cannot build page URL from {}: {}", params.url, e);
                stop = StopReason::InvalidUrl;
                break;
            }
        };

        let fetched = match fetcher.fetch_page(&url, params.allow_render).await {
            Ok(fetched) => fetched,
            Err(e) => {
                error!(%source, page, "Fetch failed, stopping: {}", e);
                stop = StopReason::FetchFailed { page };
                break;
            }
        };

        let mut rows = extract_rows(site, &fetched.markup, page);

        if rows.is_none() && params.allow_render && !fetched.rendered {
            info!(%source, page, "No listings in plain HTML, retrying with browser rendering");
            match fetcher.render(&url).await {
                Ok(markup) => rows = extract_rows(site, &markup, page),
                Err(e) => warn!(%source, page, "Browser rendering failed: {}", e),
            }
        }

        let rows = match rows {
            Some(rows) if !rows.is_empty() => rows,
            _ if page == 1 => {
                warn!(%source, page, "No listings on the first page; page structure changed or access was blocked");
                stop = StopReason::NoListings { page };
                break;
            }
            _ => {
                info!(%source, page, "No more results");
                stop = StopReason::Exhausted { page };
                break;
            }
        };

        let before = session.records.len();
        session
            .records
            .extend(rows.iter().filter_map(|raw| site.normalize(raw)));
        pages_scraped += 1;
        info!(
            %source,
            page,
            "Kept {} of {} listings",
            session.records.len() - before,
            rows.len()
        );

        if page < params.pages {
            tokio::time::sleep(pause).await;
        }
        session.page += 1;
    }

    let records = dedupe(session.records);
    info!(%source, pages_scraped, "Scrape finished with {} unique listings", records.len());

    ScrapeReport {
        source,
        records,
        pages_scraped,
        stop,
        started_at,
        finished_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::error::ScrapeError;
    use crate::scrapers::immoweb::ImmowebScraper;
    use crate::scrapers::types::MIN_PAUSE;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const SEARCH: &str = "https://www.immoweb.be/en/search/house/for-sale?countries=BE&page=1";

    fn classifieds(ids: &[u32]) -> String {
        let items: Vec<String> = ids
            .iter()
            .map(|id| format!(r#"{{"id":{id},"price":{{"mainValue":{}}}}}"#, 100_000 + id))
            .collect();
        format!("<script>window.classifieds = [{}];</script>", items.join(","))
    }

    #[derive(Default)]
    struct FakeFetcher {
        plain: HashMap<u32, String>,
        rendered: HashMap<u32, String>,
        calls: Mutex<Vec<(u32, &'static str)>>,
    }

    impl FakeFetcher {
        fn page_of(url: &str) -> u32 {
            Url::parse(url)
                .unwrap()
                .query_pairs()
                .find(|(k, _)| k == "page")
                .and_then(|(_, v)| v.parse().ok())
                .unwrap()
        }

        fn calls(&self) -> Vec<(u32, &'static str)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            let page = Self::page_of(url);
            self.calls.lock().unwrap().push((page, "fetch"));
            self.plain.get(&page).cloned().ok_or(ScrapeError::Status {
                url: url.to_string(),
                status: 403,
            })
        }

        async fn render(&self, url: &str) -> Result<String> {
            let page = Self::page_of(url);
            self.calls.lock().unwrap().push((page, "render"));
            self.rendered
                .get(&page)
                .cloned()
                .ok_or_else(|| ScrapeError::CapabilityUnavailable("test".into()))
        }
    }

    fn params(pages: u32, allow_render: bool) -> SearchParams {
        SearchParams {
            url: SEARCH.to_string(),
            pages,
            pause_secs: 0.0,
            allow_render,
        }
    }

    #[test]
    fn page_url_rewrites_or_appends() {
        assert_eq!(
            page_url("https://www.immoweb.be/en/search?countries=BE&page=1&orderBy=newest", 3).unwrap(),
            "https://www.immoweb.be/en/search?countries=BE&page=3&orderBy=newest"
        );
        assert_eq!(
            page_url("https://www.zimmo.be/nl/zoeken/?search=abc", 2).unwrap(),
            "https://www.zimmo.be/nl/zoeken/?search=abc&page=2"
        );
        assert_eq!(
            page_url("https://www.zimmo.be/nl/zoeken/", 1).unwrap(),
            "https://www.zimmo.be/nl/zoeken/?page=1"
        );
        assert!(page_url("not a url", 1).is_err());
    }

    #[test]
    fn page_url_keeps_other_parameters_verbatim() {
        assert_eq!(
            page_url("https://www.immoweb.be/en/search/house/for-sale?countries=BE&postalCodes=BE-5100,BE-5000&page=1", 2)
                .unwrap(),
            "https://www.immoweb.be/en/search/house/for-sale?countries=BE&postalCodes=BE-5100,BE-5000&page=2"
        );
        assert_eq!(
            page_url("https://www.zimmo.be/nl/zoeken/?q=gent%20centrum&pages=9", 4).unwrap(),
            "https://www.zimmo.be/nl/zoeken/?q=gent%20centrum&pages=9&page=4"
        );
    }

    #[tokio::test]
    async fn first_page_without_listings_aborts() {
        let fetcher = FakeFetcher {
            plain: HashMap::from([(1, "<html><body>Consent wall</body></html>".to_string())]),
            ..Default::default()
        };

        let report = scrape(&ImmowebScraper::new(), &fetcher, &params(5, false)).await;

        assert!(report.records.is_empty());
        assert_eq!(report.stop, StopReason::NoListings { page: 1 });
        assert_eq!(fetcher.calls(), vec![(1, "fetch")]);
    }

    #[tokio::test]
    async fn later_empty_page_is_natural_end() {
        let fetcher = FakeFetcher {
            plain: HashMap::from([
                (1, classifieds(&[1, 2])),
                (2, "<html><body>No results</body></html>".to_string()),
                (3, classifieds(&[3])),
            ]),
            ..Default::default()
        };

        let report = scrape(&ImmowebScraper::new(), &fetcher, &params(3, false)).await;

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.pages_scraped, 1);
        assert_eq!(report.stop, StopReason::Exhausted { page: 2 });
        assert!(!report.stop.is_abort());
        assert_eq!(fetcher.calls(), vec![(1, "fetch"), (2, "fetch")]);
    }

    #[tokio::test]
    async fn fetch_failure_stops_remaining_pages() {
        let fetcher = FakeFetcher {
            plain: HashMap::from([(1, classifieds(&[1])), (3, classifieds(&[3]))]),
            ..Default::default()
        };

        let report = scrape(&ImmowebScraper::new(), &fetcher, &params(3, false)).await;

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.stop, StopReason::FetchFailed { page: 2 });
        assert!(report.stop.is_abort());
        assert_eq!(fetcher.calls(), vec![(1, "fetch"), (2, "fetch")]);
    }

    #[tokio::test]
    async fn fetch_failure_retries_once_through_browser() {
        let fetcher = FakeFetcher {
            plain: HashMap::from([(1, classifieds(&[1]))]),
            rendered: HashMap::from([(2, classifieds(&[2]))]),
            ..Default::default()
        };

        let report = scrape(&ImmowebScraper::new(), &fetcher, &params(2, true)).await;

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.stop, StopReason::Completed);
        assert_eq!(
            fetcher.calls(),
            vec![(1, "fetch"), (2, "fetch"), (2, "render")]
        );
    }

    #[tokio::test]
    async fn unparsable_page_is_retried_with_rendering() {
        let fetcher = FakeFetcher {
            plain: HashMap::from([(1, "<html><div id=\"app\"></div></html>".to_string())]),
            rendered: HashMap::from([(1, classifieds(&[7, 8]))]),
            ..Default::default()
        };

        let report = scrape(&ImmowebScraper::new(), &fetcher, &params(1, true)).await;

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.pages_scraped, 1);
        assert_eq!(fetcher.calls(), vec![(1, "fetch"), (1, "render")]);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_floor_applies_between_pages_only() {
        let fetcher = FakeFetcher {
            plain: HashMap::from([(1, classifieds(&[1])), (2, classifieds(&[2]))]),
            ..Default::default()
        };

        let started = tokio::time::Instant::now();
        let report = scrape(&ImmowebScraper::new(), &fetcher, &params(2, false)).await;
        let elapsed = started.elapsed();

        assert_eq!(report.stop, StopReason::Completed);
        assert!(elapsed >= MIN_PAUSE, "slept {elapsed:?}");
        assert!(elapsed < MIN_PAUSE * 2, "slept {elapsed:?}");
    }

    #[tokio::test]
    async fn duplicates_across_pages_are_removed() {
        let fetcher = FakeFetcher {
            plain: HashMap::from([(1, classifieds(&[1, 2])), (2, classifieds(&[2, 3]))]),
            ..Default::default()
        };

        let report = scrape(&ImmowebScraper::new(), &fetcher, &params(2, false)).await;

        let urls: Vec<_> = report.records.iter().filter_map(|r| r.url.as_deref()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.immoweb.be/en/classified/1",
                "https://www.immoweb.be/en/classified/2",
                "https://www.immoweb.be/en/classified/3",
            ]
        );
        assert_eq!(report.stop, StopReason::Completed);
    }
}
