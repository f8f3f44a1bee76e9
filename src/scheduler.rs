//! Refresh cycles: fetch every feed, merge into the store, tell the presenter.
//!
//! The scheduler owns a [`FeedContext`] holding the article store, the active
//! filter and the loading flag. At most one cycle runs at a time; a cycle
//! requested while another is in flight is skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{oneshot, RwLock, RwLockReadGuard};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::config::{Config, FeedDescriptor};
use crate::fetcher::Fetcher;
use crate::filter::{filter_articles, FilterState};
use crate::store::{Article, ArticleStore};

/// Why the presenter has nothing to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyKind {
    /// Nothing stored and every feed failed
    Unavailable,
    NoArticles,
    /// The search term matched nothing
    NoMatches,
}

/// Display collaborator driven by the scheduler.
#[async_trait]
pub trait Presenter: Send + Sync {
    async fn show_loading(&self);
    async fn hide_loading(&self);
    async fn render_list(&self, articles: Vec<Article>);
    async fn show_notification(&self, count: usize);
    async fn hide_notification(&self);
    async fn show_empty_or_error(&self, kind: EmptyKind);
    async fn update_stats(&self, total: usize, last_updated: DateTime<Utc>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    /// First load at startup
    Initial,
    Background,
    Manual,
}

impl CycleKind {
    fn notifies(self) -> bool {
        matches!(self, CycleKind::Background | CycleKind::Manual)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub kind: CycleKind,
    pub added: usize,
    pub failed_feeds: usize,
    pub feed_count: usize,
    /// Store size after the merge
    pub total: usize,
}

impl CycleReport {
    pub fn total_failure(&self) -> bool {
        self.feed_count > 0 && self.failed_feeds == self.feed_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was already in flight
    Skipped,
    Completed(CycleReport),
}

#[derive(Debug, Default)]
pub struct FeedContext {
    store: RwLock<ArticleStore>,
    filter: RwLock<FilterState>,
    loading: AtomicBool,
}

impl FeedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn store(&self) -> RwLockReadGuard<'_, ArticleStore> {
        self.store.read().await
    }

    pub async fn filter_state(&self) -> FilterState {
        self.filter.read().await.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Merge candidates into the store, returning (added, new total).
    pub async fn merge(&self, candidates: Vec<Article>) -> (usize, usize) {
        let mut store = self.store.write().await;
        let added = store.merge(candidates);
        (added, store.len())
    }

    fn begin_cycle(&self) -> Option<CycleGuard<'_>> {
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard {
                loading: &self.loading,
            })
    }
}

/// Clears the loading flag however the cycle ends.
struct CycleGuard<'a> {
    loading: &'a AtomicBool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.loading.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub refresh_period: Duration,
    pub notification_duration: Duration,
}

impl SchedulerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            refresh_period: config.refresh_period(),
            notification_duration: config.notification_duration(),
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            refresh_period: Duration::from_secs(300),
            notification_duration: Duration::from_secs(3),
        }
    }
}

pub struct RefreshScheduler {
    fetcher: Fetcher,
    feeds: Vec<FeedDescriptor>,
    context: Arc<FeedContext>,
    presenter: Arc<dyn Presenter>,
    settings: SchedulerSettings,
}

impl RefreshScheduler {
    pub fn new(
        fetcher: Fetcher,
        feeds: Vec<FeedDescriptor>,
        presenter: Arc<dyn Presenter>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            fetcher,
            feeds,
            context: Arc::new(FeedContext::new()),
            presenter,
            settings,
        }
    }

    pub fn context(&self) -> &Arc<FeedContext> {
        &self.context
    }

    pub fn feeds(&self) -> &[FeedDescriptor] {
        &self.feeds
    }

    pub fn is_refreshing(&self) -> bool {
        self.context.is_loading()
    }

    pub async fn run_cycle(&self, kind: CycleKind) -> CycleOutcome {
        let Some(_cycle) = self.context.begin_cycle() else {
            info!("Refresh already in progress, skipping");
            return CycleOutcome::Skipped;
        };

        let was_empty = self.context.store().await.is_empty();
        if was_empty {
            self.presenter.show_loading().await;
        }

        info!("Refreshing {} feeds ({:?})", self.feeds.len(), kind);
        let results = self.fetcher.fetch_all(&self.feeds).await;

        let mut failed_feeds = 0;
        let mut candidates = Vec::new();
        for result in results {
            match result.outcome {
                Ok(articles) => candidates.extend(articles),
                Err(_) => failed_feeds += 1,
            }
        }

        let (added, total) = self.context.merge(candidates).await;
        let report = CycleReport {
            kind,
            added,
            failed_feeds,
            feed_count: self.feeds.len(),
            total,
        };

        if kind.notifies() && added > 0 {
            self.notify(added).await;
        }

        if total == 0 && report.total_failure() {
            error!("Every feed failed and no articles are stored");
            self.presenter
                .show_empty_or_error(EmptyKind::Unavailable)
                .await;
        } else {
            self.refresh_view().await;
        }

        self.presenter.hide_loading().await;

        info!(
            "Feed refresh complete: {} new, {} total, {}/{} feeds failed",
            report.added, report.total, report.failed_feeds, report.feed_count
        );
        CycleOutcome::Completed(report)
    }

    /// Replace the active filter and re-render the visible subset.
    pub async fn apply_filter(&self, state: FilterState) {
        *self.context.filter.write().await = state;
        self.refresh_view().await;
    }

    async fn refresh_view(&self) {
        let filter = self.context.filter_state().await;
        let (visible, total) = {
            let store = self.context.store().await;
            let visible: Vec<Article> = filter_articles(store.articles(), &filter)
                .into_iter()
                .cloned()
                .collect();
            (visible, store.len())
        };

        if visible.is_empty() {
            let kind = if filter.has_search() {
                EmptyKind::NoMatches
            } else {
                EmptyKind::NoArticles
            };
            self.presenter.show_empty_or_error(kind).await;
            return;
        }

        self.presenter.render_list(visible).await;
        self.presenter.update_stats(total, Utc::now()).await;
    }

    async fn notify(&self, count: usize) {
        self.presenter.show_notification(count).await;

        let presenter = Arc::clone(&self.presenter);
        let duration = self.settings.notification_duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            presenter.hide_notification().await;
        });
    }

    /// Run the initial cycle now, then one every refresh period until shut down.
    pub fn spawn(self: Arc<Self>) -> RefreshHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let period = self.settings.refresh_period;

        let task = tokio::spawn(async move {
            info!("Starting initial feed fetch");
            self.run_cycle(CycleKind::Initial).await;

            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        info!("Background refresh stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        info!("Starting scheduled feed refresh");
                        self.run_cycle(CycleKind::Background).await;
                    }
                }
            }
        });

        RefreshHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to the repeating refresh task. Dropping it also stops the task.
pub struct RefreshHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            error!("Background refresh task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SourceFilter;
    use crate::parser::ItemLimits;
    use crate::text::article_id;
    use crate::view::ViewState;

    fn article(title: &str, source: &str, minutes_ago: i64) -> Article {
        let link = format!("https://{}.example.com/{}", source.to_lowercase(), title.len());
        Article {
            id: article_id(title, &link),
            title: title.to_string(),
            link,
            description: String::new(),
            published_at: Utc::now() - chrono::Duration::minutes(minutes_ago),
            source_name: source.to_string(),
            source_color: "#123456".to_string(),
        }
    }

    fn scheduler(view: Arc<ViewState>) -> RefreshScheduler {
        let fetcher = Fetcher::new(
            "http://127.0.0.1:9/raw",
            ItemLimits::default(),
            Duration::from_secs(1),
        )
        .unwrap();
        RefreshScheduler::new(fetcher, Vec::new(), view, SchedulerSettings::default())
    }

    mod cycle_guard_tests {
        use super::*;

        #[test]
        fn test_second_claim_refused_until_release() {
            let context = FeedContext::new();

            let guard = context.begin_cycle();
            assert!(guard.is_some());
            assert!(context.is_loading());
            assert!(context.begin_cycle().is_none());

            drop(guard);
            assert!(!context.is_loading());
            assert!(context.begin_cycle().is_some());
        }
    }

    mod report_tests {
        use super::*;

        fn report(failed_feeds: usize, feed_count: usize) -> CycleReport {
            CycleReport {
                kind: CycleKind::Initial,
                added: 0,
                failed_feeds,
                feed_count,
                total: 0,
            }
        }

        #[test]
        fn test_total_failure_requires_every_feed_failing() {
            assert!(report(7, 7).total_failure());
            assert!(!report(6, 7).total_failure());
        }

        #[test]
        fn test_empty_registry_is_not_total_failure() {
            assert!(!report(0, 0).total_failure());
        }

        #[test]
        fn test_only_refreshes_after_startup_notify() {
            assert!(!CycleKind::Initial.notifies());
            assert!(CycleKind::Background.notifies());
            assert!(CycleKind::Manual.notifies());
        }
    }

    mod filter_tests {
        use super::*;

        #[tokio::test]
        async fn test_apply_filter_renders_matching_subset() {
            let view = Arc::new(ViewState::new());
            let scheduler = scheduler(view.clone());
            scheduler
                .context()
                .merge(vec![
                    article("Bitcoin miners sell", "CoinDesk", 1),
                    article("Ether staking grows", "NewsBTC", 2),
                ])
                .await;

            scheduler
                .apply_filter(FilterState::new(SourceFilter::parse("NewsBTC"), ""))
                .await;

            let snapshot = view.snapshot().await;
            assert_eq!(snapshot.visible, 1);
            assert_eq!(snapshot.total, 2);
            assert_eq!(snapshot.empty, None);
            assert_eq!(
                scheduler.context().filter_state().await.active_source,
                SourceFilter::Source("NewsBTC".to_string())
            );
        }

        #[tokio::test]
        async fn test_apply_filter_without_matches_signals_no_matches() {
            let view = Arc::new(ViewState::new());
            let scheduler = scheduler(view.clone());
            scheduler
                .context()
                .merge(vec![article("Bitcoin miners sell", "CoinDesk", 1)])
                .await;

            scheduler
                .apply_filter(FilterState::new(SourceFilter::All, "dogecoin"))
                .await;

            assert_eq!(view.snapshot().await.empty, Some(EmptyKind::NoMatches));
        }

        #[tokio::test]
        async fn test_empty_registry_cycle_reports_no_articles() {
            let view = Arc::new(ViewState::new());
            let scheduler = scheduler(view.clone());

            let outcome = scheduler.run_cycle(CycleKind::Initial).await;

            match outcome {
                CycleOutcome::Completed(report) => {
                    assert_eq!(report.added, 0);
                    assert!(!report.total_failure());
                }
                CycleOutcome::Skipped => panic!("cycle should run"),
            }
            let snapshot = view.snapshot().await;
            assert_eq!(snapshot.empty, Some(EmptyKind::NoArticles));
            assert!(!snapshot.loading);
            assert!(!scheduler.is_refreshing());
        }
    }
}
