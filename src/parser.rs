use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Feed};

use crate::config::FeedDescriptor;
use crate::store::Article;
use crate::text::{article_id, clean_html_text, truncate_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemLimits {
    /// Entries past this position in the document are ignored
    pub max_items: usize,
    pub description_limit: usize,
}

impl Default for ItemLimits {
    fn default() -> Self {
        Self {
            max_items: 20,
            description_limit: 200,
        }
    }
}

/// Turn a parsed feed document into articles for `feed`.
///
/// Only the first `max_items` entries are considered. Entries without a title
/// or link are skipped; a missing date falls back to `fetched_at`.
pub fn parse_articles(
    document: &Feed,
    feed: &FeedDescriptor,
    limits: &ItemLimits,
    fetched_at: DateTime<Utc>,
) -> Vec<Article> {
    document
        .entries
        .iter()
        .take(limits.max_items)
        .filter_map(|entry| parse_entry(entry, feed, limits, fetched_at))
        .collect()
}

fn parse_entry(
    entry: &Entry,
    feed: &FeedDescriptor,
    limits: &ItemLimits,
    fetched_at: DateTime<Utc>,
) -> Option<Article> {
    let raw_title = entry
        .title
        .as_ref()
        .map(|t| t.content.trim())
        .filter(|t| !t.is_empty())?;

    let link = entry
        .links
        .first()
        .map(|l| l.href.trim())
        .filter(|l| !l.is_empty())?;

    let description = entry
        .summary
        .as_ref()
        .map(|s| clean_html_text(&s.content))
        .unwrap_or_default();

    let published_at = entry
        .published
        .or(entry.updated)
        .unwrap_or(fetched_at);

    Some(Article {
        id: article_id(raw_title, link),
        title: clean_html_text(raw_title),
        link: link.to_string(),
        description: truncate_text(&description, limits.description_limit),
        published_at,
        source_name: feed.name.clone(),
        source_color: feed.color.clone(),
    })
}
