pub mod shared;
pub mod worker;

pub use shared::{BrowserMode, LaunchOptions, TimeoutConfig};
pub use worker::chromium::ChromiumScraper;
