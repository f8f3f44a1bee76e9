//! Presenter backing the web view.
//!
//! The snapshot records only counts and display states. Article lists are
//! re-filtered from the shared store on every request, so `render_list`
//! keeps the size of the pushed list and drops the articles themselves.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::scheduler::{EmptyKind, Presenter};
use crate::store::Article;

/// What the page should currently show, as last signalled by the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub loading: bool,
    pub notification: Option<usize>,
    pub empty: Option<EmptyKind>,
    /// Size of the last rendered list
    pub visible: usize,
    pub total: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Presenter backing the web view. Requests read a snapshot of it.
#[derive(Debug, Default)]
pub struct ViewState {
    snapshot: RwLock<ViewSnapshot>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        self.snapshot.read().await.clone()
    }
}

#[async_trait]
impl Presenter for ViewState {
    async fn show_loading(&self) {
        debug!("view: loading");
        self.snapshot.write().await.loading = true;
    }

    async fn hide_loading(&self) {
        debug!("view: loading done");
        self.snapshot.write().await.loading = false;
    }

    async fn render_list(&self, articles: Vec<Article>) {
        debug!("view: rendering {} articles", articles.len());
        let mut snapshot = self.snapshot.write().await;
        snapshot.visible = articles.len();
        snapshot.empty = None;
    }

    async fn show_notification(&self, count: usize) {
        debug!("view: {} new articles", count);
        self.snapshot.write().await.notification = Some(count);
    }

    async fn hide_notification(&self) {
        self.snapshot.write().await.notification = None;
    }

    async fn show_empty_or_error(&self, kind: EmptyKind) {
        debug!("view: empty ({:?})", kind);
        let mut snapshot = self.snapshot.write().await;
        snapshot.visible = 0;
        snapshot.empty = Some(kind);
    }

    async fn update_stats(&self, total: usize, last_updated: DateTime<Utc>) {
        let mut snapshot = self.snapshot.write().await;
        snapshot.total = total;
        snapshot.last_updated = Some(last_updated);
    }
}

pub fn notification_text(count: usize) -> String {
    format!(
        "{} new article{} loaded!",
        count,
        if count == 1 { "" } else { "s" }
    )
}

pub fn empty_message(kind: EmptyKind) -> &'static str {
    match kind {
        EmptyKind::Unavailable => {
            "Unable to load news feeds. Please check your internet connection and try again."
        }
        EmptyKind::NoArticles => "No articles available.",
        EmptyKind::NoMatches => "No articles found matching your search.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_text_pluralizes() {
        assert_eq!(notification_text(1), "1 new article loaded!");
        assert_eq!(notification_text(12), "12 new articles loaded!");
    }

    #[test]
    fn test_empty_messages_are_distinct() {
        assert_ne!(
            empty_message(EmptyKind::Unavailable),
            empty_message(EmptyKind::NoArticles)
        );
        assert_ne!(
            empty_message(EmptyKind::NoArticles),
            empty_message(EmptyKind::NoMatches)
        );
    }

    #[tokio::test]
    async fn test_signals_update_snapshot() {
        let view = ViewState::new();

        view.show_loading().await;
        assert!(view.snapshot().await.loading);

        view.show_empty_or_error(EmptyKind::Unavailable).await;
        view.hide_loading().await;
        let snapshot = view.snapshot().await;
        assert!(!snapshot.loading);
        assert_eq!(snapshot.empty, Some(EmptyKind::Unavailable));

        view.render_list(Vec::new()).await;
        view.update_stats(42, Utc::now()).await;
        let snapshot = view.snapshot().await;
        assert_eq!(snapshot.empty, None);
        assert_eq!(snapshot.total, 42);
        assert!(snapshot.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_notification_round_trip() {
        let view = ViewState::new();
        view.show_notification(3).await;
        assert_eq!(view.snapshot().await.notification, Some(3));
        view.hide_notification().await;
        assert_eq!(view.snapshot().await.notification, None);
    }
}
