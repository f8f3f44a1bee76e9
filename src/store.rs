use chrono::{DateTime, Utc};

/// A normalized news item. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub title: String,
    /// Canonical identity key alongside `id`
    pub link: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub source_name: String,
    pub source_color: String,
}

/// Accumulating article timeline, newest first.
///
/// The store only grows: an incoming article whose `id` or `link` is already
/// present is discarded and the stored copy is kept untouched.
#[derive(Debug, Default, Clone)]
pub struct ArticleStore {
    articles: Vec<Article>,
}

impl ArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of candidates and return how many were appended.
    pub fn merge<I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = Article>,
    {
        let mut added = 0;
        for candidate in candidates {
            if self.contains(&candidate) {
                continue;
            }
            self.articles.push(candidate);
            added += 1;
        }

        // Stable: equal timestamps keep insertion order
        self.articles
            .sort_by(|a, b| b.published_at.cmp(&a.published_at));

        added
    }

    fn contains(&self, candidate: &Article) -> bool {
        self.articles
            .iter()
            .any(|existing| existing.id == candidate.id || existing.link == candidate.link)
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}
