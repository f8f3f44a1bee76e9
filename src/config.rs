use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::filter::ALL_SOURCES;
use crate::parser::ItemLimits;

pub const DEFAULT_RELAY_URL: &str = "https://api.allorigins.win/raw";
/// One week, in minutes
pub const MAX_REFRESH_INTERVAL: u64 = 7 * 24 * 60;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Refresh interval in minutes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    /// Maximum number of items taken from a single feed document
    #[serde(default = "default_items_per_feed")]
    pub items_per_feed: usize,
    /// Maximum description length in characters before an ellipsis is appended
    #[serde(default = "default_description_limit")]
    pub description_limit: usize,
    /// How long the new-article notification stays visible, in seconds
    #[serde(default = "default_notification_secs")]
    pub notification_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Relay endpoint that proxies feed requests; the feed URL is passed as `?url=`
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    pub feeds: Vec<FeedDescriptor>,
}

fn default_refresh_interval() -> u64 {
    5
}

fn default_items_per_feed() -> usize {
    20
}

fn default_description_limit() -> usize {
    200
}

fn default_notification_secs() -> u64 {
    3
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_relay_url() -> String {
    DEFAULT_RELAY_URL.to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

/// A news source: display name, feed URL and the color used for its badge.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FeedDescriptor {
    pub name: String,
    pub url: String,
    pub color: String,
}

impl FeedDescriptor {
    pub fn new(name: &str, url: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            color: color.to_string(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The built-in crypto news registry with default tunables.
    pub fn builtin() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            items_per_feed: default_items_per_feed(),
            description_limit: default_description_limit(),
            notification_secs: default_notification_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            relay_url: default_relay_url(),
            listen_addr: default_listen_addr(),
            feeds: builtin_feeds(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.items_per_feed == 0 {
            anyhow::bail!("items_per_feed must be positive");
        }
        if self.refresh_interval == 0 {
            anyhow::bail!("refresh_interval must be at least one minute");
        }
        if self.refresh_interval > MAX_REFRESH_INTERVAL {
            anyhow::bail!(
                "refresh_interval must be at most {} minutes",
                MAX_REFRESH_INTERVAL
            );
        }
        url::Url::parse(&self.relay_url)
            .map_err(|e| anyhow::anyhow!("invalid relay_url '{}': {}", self.relay_url, e))?;

        let mut seen = HashSet::new();
        for feed in &self.feeds {
            let name = feed.name.as_str();
            if name.trim().is_empty() {
                anyhow::bail!("feed with url '{}' has an empty name", feed.url);
            }
            if name.trim() != name {
                anyhow::bail!("feed name '{}' has surrounding whitespace", name);
            }
            if name == ALL_SOURCES {
                anyhow::bail!("feed name '{}' is reserved", ALL_SOURCES);
            }
            if !seen.insert(name) {
                anyhow::bail!("duplicate feed name '{}'", name);
            }
        }
        Ok(())
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.saturating_mul(60))
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_secs(self.notification_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn item_limits(&self) -> ItemLimits {
        ItemLimits {
            max_items: self.items_per_feed,
            description_limit: self.description_limit,
        }
    }
}

fn builtin_feeds() -> Vec<FeedDescriptor> {
    vec![
        FeedDescriptor::new(
            "CoinDesk",
            "https://www.coindesk.com/arc/outboundfeeds/rss/",
            "#F7931A",
        ),
        FeedDescriptor::new("Cointelegraph", "https://cointelegraph.com/rss", "#00D4AA"),
        FeedDescriptor::new("CryptoSlate", "https://cryptoslate.com/feed/", "#6B46C1"),
        FeedDescriptor::new("Bitcoin.com", "https://news.bitcoin.com/feed/", "#4CAF50"),
        FeedDescriptor::new("NewsBTC", "https://www.newsbtc.com/feed/", "#FF9800"),
        FeedDescriptor::new("CryptoPotato", "https://cryptopotato.com/feed/", "#E91E63"),
        FeedDescriptor::new("U.Today", "https://u.today/rss", "#2196F3"),
    ]
}
