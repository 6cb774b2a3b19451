use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Upper bound for load plus network settle
    pub navigation: Duration,
    /// Upper bound for the title marker to show up
    pub element_wait: Duration,
    pub check_interval: Duration,
    pub settle_delay: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            navigation: Duration::from_millis(30000),
            element_wait: Duration::from_millis(10000),
            check_interval: Duration::from_millis(250),
            settle_delay: Duration::from_millis(500),
        }
    }
}

impl TimeoutConfig {
    pub fn with_element_wait(mut self, ms: u64) -> Self {
        self.element_wait = Duration::from_millis(ms);
        self
    }

    pub fn with_navigation(mut self, ms: u64) -> Self {
        self.navigation = Duration::from_millis(ms);
        self
    }
}

/// Whether identifiers share one browser process or each get their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserMode {
    #[default]
    Shared,
    PerItem,
}

impl FromStr for BrowserMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shared" => Ok(Self::Shared),
            "per-item" | "per_item" | "peritem" => Ok(Self::PerItem),
            other => Err(format!("unknown browser mode '{other}' (expected shared or per-item)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub mode: BrowserMode,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1366,
            window_height: 768,
            mode: BrowserMode::Shared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_page_budget() {
        let cfg = TimeoutConfig::default();
        assert_eq!(cfg.navigation, Duration::from_secs(30));
        assert_eq!(cfg.element_wait, Duration::from_secs(10));

        let cfg = cfg.with_navigation(5000).with_element_wait(2000);
        assert_eq!(cfg.navigation, Duration::from_secs(5));
        assert_eq!(cfg.element_wait, Duration::from_secs(2));
    }

    #[test]
    fn browser_mode_parses() {
        assert_eq!("shared".parse::<BrowserMode>(), Ok(BrowserMode::Shared));
        assert_eq!("Per-Item".parse::<BrowserMode>(), Ok(BrowserMode::PerItem));
        assert!("pool".parse::<BrowserMode>().is_err());
    }
}
