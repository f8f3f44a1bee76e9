use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::config::{Config, FeedDescriptor};
use crate::parser::{parse_articles, ItemLimits};
use crate::store::Article;

/// Why a single feed contributed nothing this cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("relay answered with status {0}")]
    Status(StatusCode),
    #[error("feed document could not be parsed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

/// Outcome of fetching one registry entry.
#[derive(Debug)]
pub struct FeedResult {
    pub feed: String,
    pub outcome: Result<Vec<Article>, FetchError>,
}

pub struct Fetcher {
    client: Client,
    relay_url: Url,
    limits: ItemLimits,
}

impl Fetcher {
    pub fn new(relay_url: &str, limits: ItemLimits, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("CryptoNewsfeed/1.0 (RSS Aggregator)")
            .build()?;

        Ok(Self {
            client,
            relay_url: Url::parse(relay_url)?,
            limits,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            &config.relay_url,
            config.item_limits(),
            config.fetch_timeout(),
        )
    }

    /// Route `feed_url` through the relay as its `url` query parameter.
    pub fn relay_url_for(&self, feed_url: &str) -> Url {
        let mut url = self.relay_url.clone();
        url.query_pairs_mut().append_pair("url", feed_url);
        url
    }

    pub async fn fetch_feed(&self, feed: &FeedDescriptor) -> Result<Vec<Article>, FetchError> {
        let url = self.relay_url_for(&feed.url);
        info!("Fetching feed: {} ({})", feed.name, feed.url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let bytes = response.bytes().await?;

        let document = feed_rs::parser::parse(&bytes[..])?;
        let articles = parse_articles(&document, feed, &self.limits, Utc::now());

        info!("Parsed {} articles from '{}'", articles.len(), feed.name);
        Ok(articles)
    }

    /// Fetch every feed concurrently; one feed failing never affects the others.
    pub async fn fetch_all(&self, feeds: &[FeedDescriptor]) -> Vec<FeedResult> {
        join_all(feeds.iter().map(|feed| async move {
            let outcome = self.fetch_feed(feed).await;
            if let Err(e) = &outcome {
                warn!(feed = %feed.name, error = %e, "Failed to fetch feed");
            }
            FeedResult {
                feed: feed.name.clone(),
                outcome,
            }
        }))
        .await
    }
}
