use async_trait::async_trait;
use pricewatch_core::{ClientIdentity, Identifier, Product, ProductScraper, ScrapeError, TargetSite};
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, info};

pub mod extract;

pub use extract::{
    join_price_blocks, normalize_price, Extractor, PriceSelector, ProductPage, SelectorError, SelectorSet,
    DEFAULT_CURRENCY, TITLE_SELECTOR,
};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Debug, thiserror::Error)]
pub enum HttpScraperError {
    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Plain HTTP fetch plus static HTML extraction. No JavaScript runs, so this
/// only sees what the server renders up front.
pub struct HttpScraper {
    client: Client,
    site: TargetSite,
    extractor: Extractor,
    timeout: Duration,
}

impl HttpScraper {
    pub fn new(
        site: TargetSite,
        identity: &ClientIdentity,
        extractor: Extractor,
        timeout: Duration,
    ) -> Result<Self, HttpScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(&identity.accept_language)?);

        let client = Client::builder()
            .user_agent(identity.user_agent.clone())
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, site, extractor, timeout })
    }

    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.client.get(url).send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::unknown(format!("{url} answered {status}")));
        }

        response.text().await.map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, e: reqwest::Error) -> ScrapeError {
        if e.is_timeout() {
            ScrapeError::navigation_timeout(format!(
                "Navigation timeout of {} ms exceeded",
                self.timeout.as_millis()
            ))
        } else {
            ScrapeError::unknown(e.to_string())
        }
    }
}

#[async_trait]
impl ProductScraper for HttpScraper {
    async fn scrape(&self, identifier: &Identifier) -> Result<Product, ScrapeError> {
        let url = self.site.product_url(identifier);
        debug!(%identifier, %url, "fetching product page");

        let html = self.fetch(&url).await?;
        let page = self.extractor.extract(&html);

        if !page.title_element {
            return Err(ScrapeError::extraction_failed(format!(
                "No element matches `{}` in the served page",
                self.extractor.title_selector()
            )));
        }

        info!(%identifier, bytes = html.len(), "product page parsed");
        Ok(page.into_product())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(&SelectorSet::default(), DEFAULT_CURRENCY).unwrap()
    }

    #[test]
    fn rejects_unsendable_header_values() {
        let identity = ClientIdentity {
            accept_language: "en-GB\n".to_string(),
            ..ClientIdentity::default()
        };
        let built = HttpScraper::new(TargetSite::default(), &identity, extractor(), Duration::from_secs(1));
        assert!(matches!(built, Err(HttpScraperError::Header(_))));
    }

    #[test]
    fn keeps_configured_timeout() {
        let scraper = HttpScraper::new(
            TargetSite::default(),
            &ClientIdentity::default(),
            extractor(),
            Duration::from_millis(30000),
        )
        .unwrap();
        assert_eq!(scraper.timeout, Duration::from_secs(30));
    }
}
