use clap::{Parser, ValueEnum};
use pricewatch_browser::{BrowserMode, LaunchOptions, TimeoutConfig};
use pricewatch_core::{ClientIdentity, TargetSite, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_DOMAIN, DEFAULT_USER_AGENT};
use pricewatch_parser::DEFAULT_CURRENCY;
use pricewatch_scheduler::Pacing;
use pricewatch_storage::{CredentialStrategy, SheetTarget, DEFAULT_SHEET_NAME};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AsinSource {
    /// `--asins` / `ASINS`, or the built-in list
    List,
    /// Column A of the destination sheet
    Sheet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Engine {
    Chromium,
    Http,
}

/// Scrape product titles and prices into a Google Sheet.
#[derive(Debug, Parser)]
#[command(name = "pricewatch", version, about)]
pub struct Cli {
    /// Destination spreadsheet; without it results are printed to stdout
    #[arg(long, env = "SPREADSHEET_ID")]
    pub spreadsheet_id: Option<String>,

    #[arg(long, env = "SHEET_NAME", default_value = DEFAULT_SHEET_NAME)]
    pub sheet_name: String,

    /// Comma-separated product codes
    #[arg(long, env = "ASINS")]
    pub asins: Option<String>,

    #[arg(long, env = "ASIN_SOURCE", value_enum, default_value_t = AsinSource::List)]
    pub asin_source: AsinSource,

    /// Credential JSON (service account or authorized user); ambient discovery when absent
    #[arg(long, env = "GOOGLE_CREDENTIALS", hide_env_values = true)]
    pub credentials: Option<String>,

    #[arg(long, env = "AMAZON_DOMAIN", default_value = DEFAULT_DOMAIN)]
    pub domain: String,

    #[arg(long, env = "PRICE_CURRENCY", default_value = DEFAULT_CURRENCY)]
    pub currency: String,

    #[arg(long, env = "ENGINE", value_enum, default_value_t = Engine::Chromium)]
    pub engine: Engine,

    /// `shared` or `per-item`
    #[arg(long, env = "BROWSER_MODE", default_value = "shared")]
    pub browser_mode: BrowserMode,

    #[arg(long, env = "HEADFUL")]
    pub headful: bool,

    #[arg(long, env = "NAVIGATION_TIMEOUT_MS", default_value_t = 30_000)]
    pub navigation_timeout_ms: u64,

    #[arg(long, env = "SELECTOR_TIMEOUT_MS", default_value_t = 10_000)]
    pub selector_timeout_ms: u64,

    #[arg(long, env = "PACING_MIN_MS", default_value_t = 2_000)]
    pub pacing_min_ms: u64,

    #[arg(long, env = "PACING_MAX_MS", default_value_t = 5_000)]
    pub pacing_max_ms: u64,

    #[arg(long, env = "USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    #[arg(long, env = "ACCEPT_LANGUAGE", default_value = DEFAULT_ACCEPT_LANGUAGE)]
    pub accept_language: String,

    /// Also write each run's results as JSON into this directory
    #[arg(long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("ASIN_SOURCE=sheet needs SPREADSHEET_ID to read identifiers from")]
    SheetSourceWithoutSpreadsheet,
    #[error("SHEET_NAME must not be empty")]
    EmptySheetName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierSourceKind {
    Builtin,
    EnvList(String),
    SheetColumn,
}

/// Everything a run needs, validated.
#[derive(Debug, Clone)]
pub struct Settings {
    pub destination: Option<SheetTarget>,
    pub identifiers: IdentifierSourceKind,
    pub credentials: CredentialStrategy,
    pub site: TargetSite,
    pub identity: ClientIdentity,
    pub currency: String,
    pub engine: Engine,
    pub launch: LaunchOptions,
    pub timeouts: TimeoutConfig,
    pub pacing: Pacing,
    pub output_dir: Option<PathBuf>,
}

impl TryFrom<Cli> for Settings {
    type Error = SettingsError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.sheet_name.trim().is_empty() {
            return Err(SettingsError::EmptySheetName);
        }

        let destination = cli
            .spreadsheet_id
            .filter(|id| !id.trim().is_empty())
            .map(|id| SheetTarget::new(id.trim(), cli.sheet_name.trim()));

        let identifiers = match (cli.asin_source, cli.asins) {
            (AsinSource::Sheet, _) if destination.is_none() => {
                return Err(SettingsError::SheetSourceWithoutSpreadsheet);
            }
            (AsinSource::Sheet, _) => IdentifierSourceKind::SheetColumn,
            (AsinSource::List, Some(raw)) => IdentifierSourceKind::EnvList(raw),
            (AsinSource::List, None) => IdentifierSourceKind::Builtin,
        };

        let credentials = match cli.credentials.filter(|c| !c.trim().is_empty()) {
            Some(json) => CredentialStrategy::Inline(json),
            None => CredentialStrategy::Ambient,
        };

        Ok(Self {
            destination,
            identifiers,
            credentials,
            site: TargetSite::new(cli.domain),
            identity: ClientIdentity {
                user_agent: cli.user_agent,
                accept_language: cli.accept_language,
            },
            currency: cli.currency,
            engine: cli.engine,
            launch: LaunchOptions {
                headless: !cli.headful,
                mode: cli.browser_mode,
                ..LaunchOptions::default()
            },
            timeouts: TimeoutConfig::default()
                .with_navigation(cli.navigation_timeout_ms)
                .with_element_wait(cli.selector_timeout_ms),
            pacing: Pacing::new(
                Duration::from_millis(cli.pacing_min_ms),
                Duration::from_millis(cli.pacing_max_ms),
            ),
            output_dir: cli.output_dir,
        })
    }
}
