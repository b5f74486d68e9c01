//! Rendered-page acquisition
//!
//! [`PageSource`] is the seam between browser I/O and structural extraction.
//! Extractors describe what they need as a [`PageTarget`]; the orchestrator
//! depends only on the trait, so tests substitute a simulated source.
//!
//! [`BrowserPageSource`] is the real implementation. Each fetch launches its
//! own session, navigates, scrolls to trigger lazy content, waits for a
//! content-readiness marker within a bounded budget (with exactly one reload
//! fallback), and returns the rendered HTML. The session is closed on every
//! path out.

use crate::config::{BrowserConfig, ExtractionConfig};
use crate::scraping::session::{BrowserSession, SessionStats};
use crate::scraping::ScrapeError;
use async_trait::async_trait;
use chromiumoxide::Page;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How to scroll the page to trigger lazy-loaded content.
#[derive(Debug, Clone, Copy)]
pub struct ScrollPlan {
    /// Number of viewport-height steps down the page
    pub passes: u32,
    /// Settle delay after each step
    pub settle: Duration,
}

/// One navigation the extraction pipeline needs rendered.
#[derive(Debug, Clone)]
pub struct PageTarget {
    pub url: String,
    pub viewport: (u32, u32),
    /// Selectors that signal the content has rendered; any one suffices.
    pub ready_selectors: Vec<String>,
    /// Total budget for the readiness wait (before the reload fallback).
    pub ready_timeout: Duration,
    pub scroll: ScrollPlan,
    /// Selector to soft-wait on for late-hydrating images; absence is not
    /// an error.
    pub image_selector: Option<String>,
}

/// Produces the rendered HTML for a [`PageTarget`].
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, target: &PageTarget) -> Result<String, ScrapeError>;
}

/// The real, chromiumoxide-backed page source.
pub struct BrowserPageSource {
    browser: BrowserConfig,
    extraction: ExtractionConfig,
    stats: Arc<SessionStats>,
}

impl BrowserPageSource {
    pub fn new(browser: BrowserConfig, extraction: ExtractionConfig) -> Self {
        Self {
            browser,
            extraction,
            stats: Arc::new(SessionStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<SessionStats> {
        Arc::clone(&self.stats)
    }

    async fn navigate(&self, page: &Page, url: &str) -> Result<(), ScrapeError> {
        let deadline = self.extraction.navigation_timeout();
        let result = tokio::time::timeout(deadline, async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await;
        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ScrapeError::Navigation(format!("{url}: {e}"))),
            Err(_) => Err(ScrapeError::Navigation(format!(
                "{url}: navigation did not complete within {deadline:?}"
            ))),
        }
    }

    /// Step through the page height to trigger lazy loading, then return to
    /// the top so above-the-fold content is in its final state.
    async fn auto_scroll(&self, page: &Page, plan: ScrollPlan) {
        for _ in 0..plan.passes {
            if let Err(e) = page
                .evaluate("window.scrollBy(0, window.innerHeight)")
                .await
            {
                debug!("scroll step failed (ignored): {e}");
                return;
            }
            tokio::time::sleep(plan.settle).await;
        }
        if let Err(e) = page.evaluate("window.scrollTo(0, 0)").await {
            debug!("scroll reset failed (ignored): {e}");
        }
    }

    /// Poll for any of the readiness selectors until one matches or the
    /// budget runs out.
    async fn wait_for_marker(
        &self,
        page: &Page,
        selectors: &[String],
        budget: Duration,
    ) -> bool {
        let start = Instant::now();
        loop {
            for selector in selectors {
                if page.find_element(selector.as_str()).await.is_ok() {
                    debug!(selector, "content marker present");
                    return true;
                }
            }
            if start.elapsed() >= budget {
                return false;
            }
            let remaining = budget.saturating_sub(start.elapsed());
            tokio::time::sleep(self.extraction.marker_poll().min(remaining)).await;
        }
    }

    /// Click away consent banners and modal overlays. Entirely best-effort.
    async fn dismiss_overlays(&self, page: &Page) {
        const CLOSE_SELECTORS: &[&str] = &[
            "button[aria-label='Dismiss sign-in info.']",
            "button[aria-label='Close']",
            "button[aria-label='close']",
        ];
        for selector in CLOSE_SELECTORS {
            if let Ok(element) = page.find_element(*selector).await {
                if element.click().await.is_ok() {
                    debug!(selector, "dismissed overlay");
                    tokio::time::sleep(Duration::from_millis(300)).await;
                }
            }
        }
    }

    async fn fetch_inner(&self, page: &Page, target: &PageTarget) -> Result<String, ScrapeError> {
        self.navigate(page, &target.url).await?;
        self.auto_scroll(page, target.scroll).await;

        if !target.ready_selectors.is_empty() {
            let ready = self
                .wait_for_marker(page, &target.ready_selectors, target.ready_timeout)
                .await;
            if !ready {
                // Exactly one reload, then a shortened re-wait.
                warn!(url = %target.url, "content marker absent, reloading once");
                page.reload()
                    .await
                    .map_err(|e| ScrapeError::Navigation(format!("reload failed: {e}")))?;
                self.auto_scroll(page, target.scroll).await;
                let ready = self
                    .wait_for_marker(
                        page,
                        &target.ready_selectors,
                        self.extraction.reload_wait(),
                    )
                    .await;
                if !ready {
                    return Err(ScrapeError::Timeout(
                        target.ready_timeout + self.extraction.reload_wait(),
                    ));
                }
            }
        }

        if let Some(selector) = &target.image_selector {
            // Soft wait: images that never hydrate fall through to the
            // extractor's placeholder chain.
            if !self
                .wait_for_marker(
                    page,
                    std::slice::from_ref(selector),
                    self.extraction.image_wait(),
                )
                .await
            {
                debug!(selector, "images did not hydrate within soft wait");
            }
        }

        self.dismiss_overlays(page).await;

        page.content()
            .await
            .map_err(|e| ScrapeError::Session(format!("failed to read page content: {e}")))
    }
}

#[async_trait]
impl PageSource for BrowserPageSource {
    async fn fetch(&self, target: &PageTarget) -> Result<String, ScrapeError> {
        info!(url = %target.url, "fetching rendered page");
        let session = BrowserSession::launch(&self.browser, target.viewport).await?;
        self.stats.record_launch();

        let result = match session.new_page().await {
            Ok(page) => self.fetch_inner(&page, target).await,
            Err(e) => Err(e),
        };

        // Session release happens on every path, success or failure.
        session.close().await;
        self.stats.record_close();

        match &result {
            Ok(html) => debug!(url = %target.url, bytes = html.len(), "page fetched"),
            Err(e) => warn!(url = %target.url, "page fetch failed: {e}"),
        }
        result
    }
}
