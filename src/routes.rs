use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use url::form_urlencoded;

use crate::filter::{filter_articles, FilterState, SourceFilter, ALL_SOURCES};
use crate::scheduler::{CycleKind, EmptyKind, RefreshScheduler};
use crate::store::Article;
use crate::text::format_relative_time;
use crate::view::{empty_message, notification_text, ViewState};

pub struct AppState {
    pub scheduler: Arc<RefreshScheduler>,
    pub view: Arc<ViewState>,
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub sources: Vec<SourceButton>,
    pub active_source: String,
    pub search_term: String,
    pub articles: Vec<ArticleCard>,
    pub total: usize,
    pub last_updated: String,
    pub loading: bool,
    pub notification: Option<String>,
    pub empty_message: Option<&'static str>,
    pub refreshing: bool,
}

pub struct SourceButton {
    pub label: String,
    pub color: String,
    pub href: String,
    pub active: bool,
}

pub struct ArticleCard {
    pub title: String,
    pub link: String,
    pub description: String,
    pub source_name: String,
    pub source_color: String,
    pub relative_time: String,
}

impl ArticleCard {
    fn new(article: &Article, now: chrono::DateTime<Utc>) -> Self {
        Self {
            title: article.title.clone(),
            link: article.link.clone(),
            description: article.description.clone(),
            source_name: article.source_name.clone(),
            source_color: article.source_color.clone(),
            relative_time: format_relative_time(article.published_at, now),
        }
    }
}

#[derive(Template)]
#[template(path = "refresh_button.html")]
pub struct RefreshButtonTemplate {
    pub refreshing: bool,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

#[derive(Deserialize, Default)]
pub struct FeedQuery {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub q: String,
}

impl FeedQuery {
    pub fn filter_state(&self) -> FilterState {
        let source = self
            .source
            .as_deref()
            .map(SourceFilter::parse)
            .unwrap_or_default();
        FilterState::new(source, &self.q)
    }
}

fn filter_href(source: &str, search_term: &str) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("source", source);
    if !search_term.is_empty() {
        query.append_pair("q", search_term);
    }
    format!("/?{}", query.finish())
}

// Route handlers
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> impl IntoResponse {
    let filter = query.filter_state();
    let snapshot = state.view.snapshot().await;
    let now = Utc::now();

    let (articles, total) = {
        let store = state.scheduler.context().store().await;
        let articles: Vec<ArticleCard> = filter_articles(store.articles(), &filter)
            .into_iter()
            .map(|a| ArticleCard::new(a, now))
            .collect();
        (articles, store.len())
    };

    let loading = snapshot.loading && total == 0;
    let empty_message = if articles.is_empty() && !loading {
        let kind = if total == 0 && snapshot.empty == Some(EmptyKind::Unavailable) {
            EmptyKind::Unavailable
        } else if filter.has_search() {
            EmptyKind::NoMatches
        } else {
            EmptyKind::NoArticles
        };
        Some(empty_message(kind))
    } else {
        None
    };

    let mut sources = vec![SourceButton {
        label: "All".to_string(),
        color: "#888888".to_string(),
        href: filter_href(ALL_SOURCES, &filter.search_term),
        active: filter.active_source == SourceFilter::All,
    }];
    sources.extend(state.scheduler.feeds().iter().map(|feed| SourceButton {
        label: feed.name.clone(),
        color: feed.color.clone(),
        href: filter_href(&feed.name, &filter.search_term),
        active: filter.active_source.matches(&feed.name)
            && filter.active_source != SourceFilter::All,
    }));

    HtmlTemplate(IndexTemplate {
        sources,
        active_source: filter.active_source.as_str().to_string(),
        search_term: filter.search_term.clone(),
        articles,
        total,
        last_updated: snapshot
            .last_updated
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string()),
        loading,
        notification: snapshot.notification.map(notification_text),
        empty_message,
        refreshing: state.scheduler.is_refreshing(),
    })
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Spawn the refresh task
    let scheduler = state.scheduler.clone();
    tokio::spawn(async move {
        scheduler.run_cycle(CycleKind::Manual).await;
    });

    // Return refreshing state immediately
    HtmlTemplate(RefreshButtonTemplate { refreshing: true })
}

pub async fn refresh_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let refreshing = state.scheduler.is_refreshing();
    HtmlTemplate(RefreshButtonTemplate { refreshing })
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
