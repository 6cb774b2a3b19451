pub mod js;
pub mod errors;
pub mod config;

pub use config::{BrowserMode, LaunchOptions, TimeoutConfig};
pub use errors::to_scrape_error;
