mod session;
mod wait;
mod worker;

pub use session::BrowserSession;
pub use wait::WaitStrategy;
pub use worker::ChromiumScraper;
