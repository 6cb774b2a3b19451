use chromiumoxide::page::Page;
use pricewatch_core::{ScrapeError, ScrapeErrorKind};
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;

use crate::shared::{js, to_scrape_error, TimeoutConfig};

pub struct WaitStrategy {
    config: TimeoutConfig,
}

fn is_context_loss(e: &impl std::fmt::Display) -> bool {
    let err_str = e.to_string();
    err_str.contains("Cannot find context") || err_str.contains("Execution context was destroyed")
}

impl WaitStrategy {
    pub fn new(config: TimeoutConfig) -> Self {
        Self { config }
    }

    /// Polls until `selector` matches something. Presence is enough, the
    /// element does not have to be visible.
    pub async fn wait_for_element(
        &self,
        page: &Page,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), ScrapeError> {
        let start = Instant::now();
        let selector_json = json!(selector);

        loop {
            let js = js::build_js_call(js::element::ELEMENT_EXISTS, &[selector_json.clone()]);

            match page.evaluate(js).await {
                Ok(result) => {
                    if result.value().and_then(|v| v.as_bool()).unwrap_or(false) {
                        debug!(selector, waited_ms = start.elapsed().as_millis() as u64, "element present");
                        return Ok(());
                    }
                }
                // Page is still swapping documents
                Err(e) if is_context_loss(&e) => {}
                Err(e) => return Err(to_scrape_error(e, "WaitForSelector", ScrapeErrorKind::SelectorTimeout)),
            }

            if start.elapsed() >= timeout {
                return Err(ScrapeError::selector_timeout(format!(
                    "Waiting for selector `{}` failed: {} ms exceeded",
                    selector,
                    timeout.as_millis()
                )));
            }

            sleep(self.config.check_interval).await;
        }
    }

    /// Waits for `readyState == complete` and a resource count that stops
    /// growing. Running out of `budget` is not an error.
    pub async fn wait_for_stable(&self, page: &Page, budget: Duration) -> Result<(), ScrapeError> {
        let start = Instant::now();
        let mut stable_checks = 0;
        let required_stable_checks = 4;
        let mut last_count = None;

        loop {
            let js = js::build_js_call(js::wait::CHECK_LOADING, &[]);

            let state = match page.evaluate(js).await {
                Ok(r) => r.value().cloned(),
                Err(e) if is_context_loss(&e) => {
                    stable_checks = 0;
                    None
                }
                Err(e) => return Err(to_scrape_error(e, "WaitForStable", ScrapeErrorKind::NavigationTimeout)),
            };

            if let Some(obj) = state.as_ref().and_then(|v| v.as_object()) {
                let ready = obj.get("readyState").and_then(|v| v.as_str()) == Some("complete");
                let count = obj.get("resourceCount").and_then(|v| v.as_u64()).unwrap_or(0);

                if ready && last_count == Some(count) {
                    stable_checks += 1;
                    if stable_checks >= required_stable_checks {
                        debug!(waited_ms = start.elapsed().as_millis() as u64, resources = count, "page settled");
                        sleep(self.config.settle_delay).await;
                        return Ok(());
                    }
                } else {
                    stable_checks = 0;
                }
                last_count = Some(count);
            }

            if start.elapsed() >= budget {
                debug!(budget_ms = budget.as_millis() as u64, "page never settled, continuing");
                return Ok(());
            }

            sleep(self.config.check_interval).await;
        }
    }
}
