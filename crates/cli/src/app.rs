use anyhow::{Context, Result};
use pricewatch_browser::ChromiumScraper;
use pricewatch_core::{EnvListSource, IdentifierSource, ProductScraper, StaticSource};
use pricewatch_parser::{Extractor, HttpScraper, SelectorSet};
use pricewatch_scheduler::{Runner, RunSummary};
use pricewatch_storage::{
    Authenticator, ConsoleSink, JsonFileStorage, ResultSink, SheetColumnSource, SheetSink,
    SheetsClient, SpreadsheetApi,
};
use std::sync::Arc;
use tracing::info;

use crate::settings::{Engine, IdentifierSourceKind, Settings};

fn spreadsheet_api(settings: &Settings) -> Result<Option<Arc<dyn SpreadsheetApi>>> {
    if settings.destination.is_none() {
        return Ok(None);
    }
    let http = reqwest::Client::builder()
        .build()
        .context("building HTTP client for the Sheets API")?;
    let auth = Authenticator::new(http.clone(), settings.credentials.clone());
    let client: Arc<dyn SpreadsheetApi> = Arc::new(SheetsClient::new(http, auth)?);
    Ok(Some(client))
}

fn identifier_source(
    settings: &Settings,
    api: Option<&Arc<dyn SpreadsheetApi>>,
) -> Result<Arc<dyn IdentifierSource>> {
    let source: Arc<dyn IdentifierSource> = match &settings.identifiers {
        IdentifierSourceKind::Builtin => Arc::new(StaticSource::default()),
        IdentifierSourceKind::EnvList(raw) => Arc::new(EnvListSource::new("ASINS", raw.clone())),
        IdentifierSourceKind::SheetColumn => {
            let (Some(api), Some(target)) = (api, settings.destination.as_ref()) else {
                anyhow::bail!("reading identifiers from the sheet needs a destination spreadsheet");
            };
            Arc::new(SheetColumnSource::new(Arc::clone(api), target.clone()))
        }
    };
    Ok(source)
}

fn scraper(settings: &Settings) -> Result<Arc<dyn ProductScraper>> {
    let extractor = Extractor::new(&SelectorSet::default(), settings.currency.clone())?;
    let scraper: Arc<dyn ProductScraper> = match settings.engine {
        Engine::Chromium => Arc::new(ChromiumScraper::with_config(
            settings.site.clone(),
            settings.identity.clone(),
            extractor,
            settings.launch.clone(),
            settings.timeouts.clone(),
        )),
        Engine::Http => Arc::new(HttpScraper::new(
            settings.site.clone(),
            &settings.identity,
            extractor,
            settings.timeouts.navigation,
        )?),
    };
    Ok(scraper)
}

fn sinks(settings: &Settings, api: Option<&Arc<dyn SpreadsheetApi>>) -> Vec<Arc<dyn ResultSink>> {
    let mut sinks: Vec<Arc<dyn ResultSink>> = Vec::new();
    match (api, settings.destination.as_ref()) {
        (Some(api), Some(target)) => sinks.push(Arc::new(SheetSink::new(Arc::clone(api), target.clone()))),
        _ => {
            info!("SPREADSHEET_ID not set, results go to stdout");
            sinks.push(Arc::new(ConsoleSink));
        }
    }
    if let Some(dir) = &settings.output_dir {
        sinks.push(Arc::new(JsonFileStorage::new(dir)));
    }
    sinks
}

pub async fn run(settings: Settings) -> Result<RunSummary> {
    let api = spreadsheet_api(&settings)?;
    let source = identifier_source(&settings, api.as_ref())?;
    let scraper = scraper(&settings)?;
    let sinks = sinks(&settings, api.as_ref());

    info!(
        engine = ?settings.engine,
        domain = %settings.site.domain,
        source = %source.describe(),
        "run configured"
    );

    Runner::new(source, scraper, sinks, settings.pacing).run().await
}
