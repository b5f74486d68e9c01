//! Anti-detection browser session factory
//!
//! Every extraction attempt runs in its own short-lived Chrome instance with a
//! unique temporary profile directory and a randomly drawn user agent.
//! Sessions are never pooled or reused; the release invariant is that every
//! launched session is closed on every exit path, which [`SessionStats`]
//! makes observable.

use crate::config::BrowserConfig;
use crate::scraping::ScrapeError;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Counters for session lifecycle accounting. Launched and closed must agree
/// once all pipelines have settled.
#[derive(Debug, Default)]
pub struct SessionStats {
    launched: AtomicU64,
    closed: AtomicU64,
}

impl SessionStats {
    pub fn record_launch(&self) {
        self.launched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_close(&self) {
        self.closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn launched(&self) -> u64 {
        self.launched.load(Ordering::Relaxed)
    }

    pub fn closed(&self) -> u64 {
        self.closed.load(Ordering::Relaxed)
    }
}

/// One live headless Chrome instance plus its CDP event pump.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    // Held so the profile directory outlives the browser process.
    _profile_dir: TempDir,
}

impl BrowserSession {
    /// Launch a fresh session with stealth flags, a unique temp profile and a
    /// user agent drawn at random from the configured pool.
    pub async fn launch(
        config: &BrowserConfig,
        viewport: (u32, u32),
    ) -> Result<Self, ScrapeError> {
        let profile_dir = tempfile::Builder::new()
            .prefix("tripscout-profile-")
            .tempdir()
            .map_err(|e| ScrapeError::Session(format!("failed to create profile dir: {e}")))?;

        let user_agent = config
            .user_agents
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| ScrapeError::Session("user agent pool is empty".to_string()))?;

        let mut builder = ChromeConfig::builder()
            .user_data_dir(profile_dir.path())
            .window_size(viewport.0, viewport.1)
            .args([
                "--no-sandbox",
                "--disable-setuid-sandbox",
                "--disable-dev-shm-usage",
                "--disable-web-security",
                "--disable-features=IsolateOrigins,site-per-process",
                "--disable-blink-features=AutomationControlled",
                "--exclude-switches=enable-automation",
                "--no-first-run",
                "--disable-default-apps",
            ])
            .arg(format!("--user-agent={user_agent}"));
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let chrome_config = builder
            .build()
            .map_err(|e| ScrapeError::Session(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) =
            tokio::time::timeout(config.launch_timeout(), Browser::launch(chrome_config))
                .await
                .map_err(|_| {
                    ScrapeError::Session(format!(
                        "browser did not launch within {:?}",
                        config.launch_timeout()
                    ))
                })?
                .map_err(|e| ScrapeError::Session(format!("browser launch failed: {e}")))?;

        // Pump CDP events for the lifetime of the session. Unrecognized
        // messages are common with newer Chrome versions and are ignored;
        // only connection-level failures stop the pump.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    let msg = e.to_string();
                    if msg.contains("connection closed")
                        || msg.contains("io error")
                        || msg.contains("websocket closed")
                    {
                        warn!("browser connection lost: {e}");
                        break;
                    }
                    debug!("CDP message error (ignored): {e}");
                }
            }
        });

        debug!(viewport = ?viewport, "browser session launched");
        Ok(Self {
            browser,
            handler: handler_task,
            _profile_dir: profile_dir,
        })
    }

    pub async fn new_page(&self) -> Result<Page, ScrapeError> {
        self.browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::Session(format!("failed to open page: {e}")))
    }

    /// Shut the browser down and stop the event pump. Close errors are
    /// logged, not surfaced: the session is gone either way.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("browser close error (ignored): {e}");
        }
        self.handler.abort();
        debug!("browser session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_track_launch_and_close() {
        let stats = SessionStats::default();
        stats.record_launch();
        stats.record_launch();
        stats.record_close();
        assert_eq!(stats.launched(), 2);
        assert_eq!(stats.closed(), 1);
        stats.record_close();
        assert_eq!(stats.launched(), stats.closed());
    }
}
