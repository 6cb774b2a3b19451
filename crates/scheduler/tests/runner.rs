use async_trait::async_trait;
use pricewatch_core::{
    Identifier, IdentifierSource, Product, ProductScraper, ScrapeError, ScrapeErrorKind,
    ScrapeResult, SourceError, StaticSource, ERROR_SENTINEL, PRICE_NOT_FOUND,
};
use pricewatch_scheduler::{Pacing, Runner};
use pricewatch_storage::ResultSink;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Log = Arc<Mutex<Vec<String>>>;

struct FakeScraper {
    log: Log,
    failing: Vec<&'static str>,
}

#[async_trait]
impl ProductScraper for FakeScraper {
    async fn scrape(&self, identifier: &Identifier) -> Result<Product, ScrapeError> {
        self.log.lock().unwrap().push(format!("scrape {identifier}"));
        if self.failing.contains(&identifier.as_str()) {
            return Err(ScrapeError::navigation_timeout("Navigation timeout of 30000 ms exceeded"));
        }
        if identifier.as_str() == "NOPRICE" {
            return Ok(Product::from_parts(Some("Bare listing".into()), None));
        }
        Ok(Product {
            title: format!("Product {identifier}"),
            price: "£10.00".into(),
        })
    }

    async fn shutdown(&self) {
        self.log.lock().unwrap().push("shutdown".into());
    }
}

struct RecordingSink {
    log: Log,
    saved: Mutex<Vec<Vec<ScrapeResult>>>,
    fail: bool,
}

impl RecordingSink {
    fn new(log: Log) -> Self {
        Self { log, saved: Mutex::new(Vec::new()), fail: false }
    }
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn save_results(&self, results: &[ScrapeResult]) -> anyhow::Result<()> {
        self.log.lock().unwrap().push("save".into());
        if self.fail {
            anyhow::bail!("The caller does not have permission");
        }
        self.saved.lock().unwrap().push(results.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "recording".into()
    }
}

struct BrokenSource;

#[async_trait]
impl IdentifierSource for BrokenSource {
    async fn resolve(&self) -> Result<Vec<Identifier>, SourceError> {
        Err(SourceError::Read {
            source_name: "spreadsheet column Sheet1!A2:A".into(),
            message: "sheets API answered 404 Not Found".into(),
        })
    }

    fn describe(&self) -> String {
        "broken".into()
    }
}

fn runner(
    ids: &[&'static str],
    failing: Vec<&'static str>,
    sink: Arc<RecordingSink>,
    log: Log,
    pacing: Pacing,
) -> Runner {
    Runner::new(
        Arc::new(StaticSource::new(ids.iter().copied())),
        Arc::new(FakeScraper { log, failing }),
        vec![sink as Arc<dyn ResultSink>],
        pacing,
    )
}

#[tokio::test]
async fn two_ok_rows_in_input_order() {
    let log = Log::default();
    let sink = Arc::new(RecordingSink::new(log.clone()));
    let summary = runner(&["B0DT6LG363", "B09FKZR5FW"], vec![], sink.clone(), log.clone(), Pacing::none())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.ok_count(), 2);
    let saved = sink.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    let ids: Vec<&str> = saved[0].iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, ["B0DT6LG363", "B09FKZR5FW"]);
    assert!(saved[0].iter().all(|r| r.status() == "OK" && r.timestamp >= summary.started_at));
    assert!(saved[0][0].timestamp <= saved[0][1].timestamp);
}

#[tokio::test]
async fn one_failure_does_not_stop_the_batch() {
    let log = Log::default();
    let sink = Arc::new(RecordingSink::new(log.clone()));
    let summary = runner(&["A", "B", "C"], vec!["B"], sink.clone(), log.clone(), Pacing::none())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.results.len(), 3);
    assert_eq!(summary.failed_count(), 1);

    let failed = &summary.results[1];
    assert_eq!(failed.identifier.as_str(), "B");
    assert_eq!(failed.title(), ERROR_SENTINEL);
    assert_eq!(failed.price(), ERROR_SENTINEL);
    assert_eq!(failed.status(), "Navigation timeout of 30000 ms exceeded");
    assert_eq!(failed.outcome.as_ref().unwrap_err().kind, ScrapeErrorKind::NavigationTimeout);

    assert_eq!(summary.results[2].status(), "OK");
}

#[tokio::test]
async fn missing_price_is_still_ok() {
    let log = Log::default();
    let sink = Arc::new(RecordingSink::new(log.clone()));
    let summary = runner(&["NOPRICE"], vec![], sink, log, Pacing::none()).run().await.unwrap();

    let row = summary.results[0].to_row();
    assert_eq!(row.price, PRICE_NOT_FOUND);
    assert_eq!(row.status, "OK");
    assert_eq!(row.title, "Bare listing");
}

#[tokio::test]
async fn browser_is_released_before_results_are_saved() {
    let log = Log::default();
    let sink = Arc::new(RecordingSink::new(log.clone()));
    runner(&["A", "B"], vec!["A"], sink, log.clone(), Pacing::none()).run().await.unwrap();

    assert_eq!(
        log.lock().unwrap().as_slice(),
        ["scrape A", "scrape B", "shutdown", "save"]
    );
}

#[tokio::test]
async fn empty_identifier_list_skips_scraping_and_writing() {
    let log = Log::default();
    let sink = Arc::new(RecordingSink::new(log.clone()));
    let summary = runner(&[], vec![], sink.clone(), log.clone(), Pacing::none()).run().await.unwrap();

    assert!(summary.results.is_empty());
    assert!(log.lock().unwrap().is_empty());
    assert!(sink.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn source_failure_aborts_before_any_scrape() {
    let log = Log::default();
    let sink = Arc::new(RecordingSink::new(log.clone()));
    let runner = Runner::new(
        Arc::new(BrokenSource),
        Arc::new(FakeScraper { log: log.clone(), failing: vec![] }),
        vec![sink as Arc<dyn ResultSink>],
        Pacing::none(),
    );

    let err = runner.run().await.unwrap_err();
    assert!(format!("{err:#}").contains("404"));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sink_failure_fails_the_run() {
    let log = Log::default();
    let sink = Arc::new(RecordingSink { fail: true, ..RecordingSink::new(log.clone()) });
    let err = runner(&["A"], vec![], sink, log, Pacing::none()).run().await.unwrap_err();
    assert!(format!("{err:#}").contains("permission"));
}

#[tokio::test(start_paused = true)]
async fn pacing_delay_only_between_items() {
    let log = Log::default();
    let sink = Arc::new(RecordingSink::new(log.clone()));
    let start = tokio::time::Instant::now();

    runner(&["A", "B", "C"], vec![], sink, log, Pacing::fixed(Duration::from_secs(3)))
        .run()
        .await
        .unwrap();

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(9), "{elapsed:?}");
}
