use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig, HeadlessMode};
use chromiumoxide::page::Page;
use futures::StreamExt;
use pricewatch_core::{ScrapeError, ScrapeErrorKind};
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::shared::{to_scrape_error, LaunchOptions};

/// A launched Chromium plus the task driving its CDP connection.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
}

impl BrowserSession {
    pub async fn launch(options: &LaunchOptions) -> Result<Self, ScrapeError> {
        // Fresh profile per instance so parallel runs never fight over SingletonLock
        let profile_dir = std::env::temp_dir().join(format!("pricewatch-chromium-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&profile_dir)
            .map_err(|e| ScrapeError::unknown(format!("Failed to create profile dir: {}", e)))?;

        let chrome_cfg = ChromeConfig::builder()
            .headless_mode(if options.headless { HeadlessMode::New } else { HeadlessMode::False })
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .window_size(options.window_width, options.window_height)
            .user_data_dir(&profile_dir)
            .build()
            .map_err(|e| ScrapeError::unknown(format!("Browser config failed: {}", e)))?;

        let (browser, mut handler) = Browser::launch(chrome_cfg)
            .await
            .map_err(|e| ScrapeError::unknown(format!("Browser launch failed: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("chromium handler event error: {}", e);
                }
            }
        });

        debug!(profile = %profile_dir.display(), "browser launched");
        Ok(Self { browser, handler, profile_dir })
    }

    pub async fn new_page(&self) -> Result<Page, ScrapeError> {
        self.browser
            .new_page("about:blank")
            .await
            .map_err(|e| to_scrape_error(e, "NewPage", ScrapeErrorKind::Unknown))
    }

    /// Closes the browser, waits for the process and drops the profile dir.
    /// Failures are logged only.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("browser close failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("waiting for browser exit failed: {}", e);
        }
        self.handler.abort();
        if let Err(e) = tokio::fs::remove_dir_all(&self.profile_dir).await {
            debug!(profile = %self.profile_dir.display(), "profile cleanup failed: {}", e);
        }
        debug!("browser closed");
    }
}
