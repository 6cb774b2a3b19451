use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::page::Page;
use pricewatch_core::{
    ClientIdentity, Identifier, Product, ProductScraper, ScrapeError, ScrapeErrorKind, TargetSite,
};
use pricewatch_parser::Extractor;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::session::BrowserSession;
use super::wait::WaitStrategy;
use crate::shared::{to_scrape_error, BrowserMode, LaunchOptions, TimeoutConfig};

/// `Network.setUserAgentOverride` carrying both the UA string and the
/// `Accept-Language` value.
fn user_agent_override(identity: &ClientIdentity) -> Result<SetUserAgentOverrideParams, ScrapeError> {
    SetUserAgentOverrideParams::builder()
        .user_agent(identity.user_agent.clone())
        .accept_language(identity.accept_language.clone())
        .build()
        .map_err(ScrapeError::unknown)
}

/// Drives headless Chromium through one product page per call.
///
/// In [`BrowserMode::Shared`] the browser is launched on first use and kept
/// until [`ProductScraper::shutdown`]; every identifier still gets a fresh
/// page. In [`BrowserMode::PerItem`] each call launches and tears down its
/// own browser.
pub struct ChromiumScraper {
    session: Mutex<Option<BrowserSession>>,
    launch: LaunchOptions,
    timeout_config: TimeoutConfig,
    identity: ClientIdentity,
    site: TargetSite,
    extractor: Extractor,
}

impl ChromiumScraper {
    pub fn new(site: TargetSite, identity: ClientIdentity, extractor: Extractor) -> Self {
        Self::with_config(site, identity, extractor, LaunchOptions::default(), TimeoutConfig::default())
    }

    pub fn with_config(
        site: TargetSite,
        identity: ClientIdentity,
        extractor: Extractor,
        launch: LaunchOptions,
        timeout_config: TimeoutConfig,
    ) -> Self {
        Self {
            session: Mutex::new(None),
            launch,
            timeout_config,
            identity,
            site,
            extractor,
        }
    }

    async fn shared_page(&self) -> Result<Page, ScrapeError> {
        let mut guard = self.session.lock().await;
        if guard.is_none() {
            info!("launching shared browser");
            *guard = Some(BrowserSession::launch(&self.launch).await?);
        }
        match guard.as_ref() {
            Some(session) => session.new_page().await,
            None => Err(ScrapeError::unknown("browser session unavailable")),
        }
    }

    async fn prepare(&self, page: &Page) -> Result<(), ScrapeError> {
        page.set_user_agent(user_agent_override(&self.identity)?)
            .await
            .map_err(|e| to_scrape_error(e, "SetUserAgent", ScrapeErrorKind::Unknown))?;
        Ok(())
    }

    async fn navigate(&self, page: &Page, url: &str) -> Result<(), ScrapeError> {
        let budget = self.timeout_config.navigation;
        let start = Instant::now();

        match tokio::time::timeout(budget, page.goto(url.to_string())).await {
            Err(_) => {
                return Err(ScrapeError::navigation_timeout(format!(
                    "Navigation timeout of {} ms exceeded",
                    budget.as_millis()
                )));
            }
            Ok(Err(e)) => return Err(to_scrape_error(e, "Navigation", ScrapeErrorKind::NavigationTimeout)),
            Ok(Ok(_)) => {}
        }

        let remaining = budget.saturating_sub(start.elapsed());
        WaitStrategy::new(self.timeout_config.clone())
            .wait_for_stable(page, remaining)
            .await
    }

    /// Everything between a blank page and extracted fields.
    async fn visit(&self, page: &Page, identifier: &Identifier) -> Result<Product, ScrapeError> {
        self.prepare(page).await?;

        let url = self.site.product_url(identifier);
        debug!(%identifier, %url, "navigating");
        self.navigate(page, &url).await?;

        WaitStrategy::new(self.timeout_config.clone())
            .wait_for_element(page, self.extractor.title_selector(), self.timeout_config.element_wait)
            .await?;

        let html = page
            .content()
            .await
            .map_err(|e| ScrapeError::extraction_failed(format!("Reading page content failed: {}", e)))?;

        Ok(self.extractor.extract(&html).into_product())
    }

    async fn scrape_on(&self, page: Page, identifier: &Identifier) -> Result<Product, ScrapeError> {
        let outcome = self.visit(&page, identifier).await;
        if let Err(e) = page.close().await {
            warn!(%identifier, "page close failed: {}", e);
        }
        outcome
    }
}

#[async_trait]
impl ProductScraper for ChromiumScraper {
    async fn scrape(&self, identifier: &Identifier) -> Result<Product, ScrapeError> {
        match self.launch.mode {
            BrowserMode::Shared => {
                let page = self.shared_page().await?;
                self.scrape_on(page, identifier).await
            }
            BrowserMode::PerItem => {
                let session = BrowserSession::launch(&self.launch).await?;
                let outcome = match session.new_page().await {
                    Ok(page) => self.scrape_on(page, identifier).await,
                    Err(e) => Err(e),
                };
                session.close().await;
                outcome
            }
        }
    }

    async fn shutdown(&self) {
        if let Some(session) = self.session.lock().await.take() {
            info!("closing shared browser");
            session.close().await;
        }
    }
}
