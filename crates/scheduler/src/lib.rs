use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pricewatch_core::product::truncate_chars;
use pricewatch_core::{IdentifierSource, ProductScraper, ScrapeResult};
use pricewatch_storage::ResultSink;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Randomised gap between consecutive page loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    /// Bounds are swapped if given the wrong way round.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max { Self { min, max } } else { Self { min: max, max: min } }
    }

    pub fn fixed(delay: Duration) -> Self {
        Self::new(delay, delay)
    }

    pub fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn bounds(&self) -> (Duration, Duration) {
        (self.min, self.max)
    }

    pub fn next_delay(&self) -> Duration {
        self.delay_with(&mut rand::thread_rng())
    }

    pub fn delay_with(&self, rng: &mut impl Rng) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if min == max {
            return self.min;
        }
        Duration::from_millis(rng.gen_range(min..=max))
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000), Duration::from_millis(5000))
    }
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub results: Vec<ScrapeResult>,
}

impl RunSummary {
    pub fn ok_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.ok_count()
    }
}

/// Resolve, scrape one identifier at a time, then hand everything to the sinks.
pub struct Runner {
    source: Arc<dyn IdentifierSource>,
    scraper: Arc<dyn ProductScraper>,
    sinks: Vec<Arc<dyn ResultSink>>,
    pacing: Pacing,
}

impl Runner {
    pub fn new(
        source: Arc<dyn IdentifierSource>,
        scraper: Arc<dyn ProductScraper>,
        sinks: Vec<Arc<dyn ResultSink>>,
        pacing: Pacing,
    ) -> Self {
        Self { source, scraper, sinks, pacing }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        info!("Starting price scrape at {}", started_at.to_rfc3339());

        let identifiers = self
            .source
            .resolve()
            .await
            .with_context(|| format!("resolving identifiers from {}", self.source.describe()))?;

        if identifiers.is_empty() {
            warn!(source = %self.source.describe(), "no identifiers to scrape, nothing written");
            return Ok(RunSummary { started_at, results: Vec::new() });
        }
        info!(count = identifiers.len(), source = %self.source.describe(), "identifiers resolved");

        let mut results = Vec::with_capacity(identifiers.len());
        for (idx, identifier) in identifiers.iter().enumerate() {
            info!("Scraping {} ({}/{})...", identifier, idx + 1, identifiers.len());

            let result = ScrapeResult::new(identifier.clone(), self.scraper.scrape(identifier).await);
            match &result.outcome {
                Ok(product) => info!(
                    "  {}... - {}",
                    truncate_chars(&product.title, 50),
                    product.price
                ),
                Err(e) => error!(kind = ?e.kind, "  {} failed: {}", identifier, e),
            }
            results.push(result);

            if idx + 1 < identifiers.len() {
                sleep(self.pacing.next_delay()).await;
            }
        }

        self.scraper.shutdown().await;

        for sink in &self.sinks {
            sink.save_results(&results)
                .await
                .with_context(|| format!("saving results to {}", sink.describe()))?;
            info!(sink = %sink.describe(), rows = results.len(), "results saved");
        }

        let summary = RunSummary { started_at, results };
        info!(ok = summary.ok_count(), failed = summary.failed_count(), "Done!");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn delays_stay_within_bounds() {
        let pacing = Pacing::new(Duration::from_millis(2000), Duration::from_millis(4000));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let d = pacing.delay_with(&mut rng);
            assert!(d >= Duration::from_millis(2000) && d <= Duration::from_millis(4000));
        }
    }

    #[test]
    fn fixed_pacing_is_constant() {
        let pacing = Pacing::fixed(Duration::from_secs(2));
        assert_eq!(pacing.next_delay(), Duration::from_secs(2));
        assert_eq!(Pacing::none().next_delay(), Duration::ZERO);
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let pacing = Pacing::new(Duration::from_secs(5), Duration::from_secs(2));
        assert_eq!(pacing.bounds(), (Duration::from_secs(2), Duration::from_secs(5)));
    }
}
