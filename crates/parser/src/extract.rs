use pricewatch_core::Product;
use scraper::{ElementRef, Html, Selector};

pub const DEFAULT_CURRENCY: &str = "£";
pub const TITLE_SELECTOR: &str = "#productTitle";

/// One way of locating a price on the page, tried in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceSelector {
    /// Whole-number block with an optional fraction block appended
    WholeWithFraction { whole: String, fraction: String },
    /// A single element whose text is the full price
    Text(String),
}

impl PriceSelector {
    pub fn text(selector: impl Into<String>) -> Self {
        Self::Text(selector.into())
    }
}

#[derive(Debug, Clone)]
pub struct SelectorSet {
    pub title: String,
    pub price: Vec<PriceSelector>,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            title: TITLE_SELECTOR.to_string(),
            price: vec![
                PriceSelector::WholeWithFraction {
                    whole: ".a-price-whole".to_string(),
                    fraction: ".a-price-fraction".to_string(),
                },
                PriceSelector::text("#priceblock_ourprice"),
                PriceSelector::text("#priceblock_dealprice"),
                PriceSelector::text(".a-offscreen"),
            ],
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid selector `{selector}`: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

fn compile(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|e| SelectorError {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

enum CompiledPrice {
    WholeWithFraction { whole: Selector, fraction: Selector },
    Text(Selector),
}

/// What a product page yielded before sentinels are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPage {
    pub title_element: bool,
    pub title: Option<String>,
    pub price: Option<String>,
}

impl ProductPage {
    pub fn into_product(self) -> Product {
        Product::from_parts(self.title, self.price)
    }
}

/// Pre-compiled selectors plus the currency symbol prices are normalised to.
pub struct Extractor {
    title_source: String,
    title: Selector,
    price: Vec<CompiledPrice>,
    currency: String,
}

impl Extractor {
    pub fn new(selectors: &SelectorSet, currency: impl Into<String>) -> Result<Self, SelectorError> {
        let price = selectors
            .price
            .iter()
            .map(|candidate| match candidate {
                PriceSelector::WholeWithFraction { whole, fraction } => {
                    Ok(CompiledPrice::WholeWithFraction {
                        whole: compile(whole)?,
                        fraction: compile(fraction)?,
                    })
                }
                PriceSelector::Text(sel) => Ok(CompiledPrice::Text(compile(sel)?)),
            })
            .collect::<Result<Vec<_>, SelectorError>>()?;

        Ok(Self {
            title_source: selectors.title.clone(),
            title: compile(&selectors.title)?,
            price,
            currency: currency.into(),
        })
    }

    pub fn title_selector(&self) -> &str {
        &self.title_source
    }

    pub fn extract(&self, html: &str) -> ProductPage {
        let document = Html::parse_document(html);

        let title_el = document.select(&self.title).next();
        let title = title_el
            .map(element_text)
            .filter(|t| !t.is_empty());

        ProductPage {
            title_element: title_el.is_some(),
            title,
            price: self.extract_price(&document),
        }
    }

    fn extract_price(&self, document: &Html) -> Option<String> {
        for candidate in &self.price {
            let found = match candidate {
                CompiledPrice::WholeWithFraction { whole, fraction } => {
                    let whole = document
                        .select(whole)
                        .next()
                        .map(element_text)
                        .filter(|t| has_digit(t));
                    whole.map(|whole| {
                        let fraction = document.select(fraction).next().map(element_text);
                        join_price_blocks(&whole, fraction.as_deref())
                    })
                }
                CompiledPrice::Text(sel) => document
                    .select(sel)
                    .next()
                    .map(element_text)
                    .filter(|t| has_digit(t)),
            };

            if let Some(raw) = found {
                return Some(normalize_price(&raw, &self.currency));
            }
        }
        None
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

/// Joins the whole-number block and the fraction block.
///
/// The whole block usually ends with the site's decimal separator (`1,249.`
/// on UK pages, `1.249,` on continental ones); that separator joins the
/// fraction and every other separator is grouping and gets dropped. Without
/// a trailing separator the decimal is whichever of `.`/`,` the block does
/// not group with.
pub fn join_price_blocks(whole: &str, fraction: Option<&str>) -> String {
    let whole = whole.trim();
    let (block, decimal) = match whole.chars().last() {
        Some(sep @ ('.' | ',')) => (&whole[..whole.len() - 1], sep),
        _ if whole.contains('.') && !whole.contains(',') => (whole, ','),
        _ => (whole, '.'),
    };
    let digits: String = block.chars().filter(|c| c.is_ascii_digit()).collect();

    match fraction.map(str::trim).filter(|f| !f.is_empty()) {
        Some(frac) => format!("{digits}{decimal}{frac}"),
        None => digits,
    }
}

/// Puts `currency` in front exactly once, removing any copies found before
/// or after the amount.
pub fn normalize_price(raw: &str, currency: &str) -> String {
    let mut rest = raw.trim();
    if !currency.is_empty() {
        loop {
            let before = rest;
            if let Some(stripped) = rest.strip_prefix(currency) {
                rest = stripped.trim_start();
            }
            if let Some(stripped) = rest.strip_suffix(currency) {
                rest = stripped.trim_end();
            }
            if rest == before {
                break;
            }
        }
    }
    format!("{currency}{rest}")
}
