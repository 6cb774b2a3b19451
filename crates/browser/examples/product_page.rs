use pricewatch_browser::{BrowserMode, ChromiumScraper, LaunchOptions, TimeoutConfig};
use pricewatch_core::{ClientIdentity, Identifier, ProductScraper, TargetSite};
use pricewatch_parser::{Extractor, SelectorSet, DEFAULT_CURRENCY};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let asin = std::env::args().nth(1).unwrap_or_else(|| "B0DT6LG363".to_string());

    let extractor = Extractor::new(&SelectorSet::default(), DEFAULT_CURRENCY)?;
    let scraper = ChromiumScraper::with_config(
        TargetSite::default(),
        ClientIdentity::default(),
        extractor,
        LaunchOptions {
            headless: false,
            mode: BrowserMode::PerItem,
            ..LaunchOptions::default()
        },
        TimeoutConfig::default(),
    );

    match scraper.scrape(&Identifier::from(asin.as_str())).await {
        Ok(product) => println!("{asin}: {} - {}", product.title, product.price),
        Err(e) => println!("{asin}: [{:?}] {}", e.kind, e),
    }

    scraper.shutdown().await;
    Ok(())
}
