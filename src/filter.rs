use crate::store::Article;

/// Filter keyword that selects every source.
pub const ALL_SOURCES: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SourceFilter {
    #[default]
    All,
    Source(String),
}

impl SourceFilter {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_SOURCES {
            SourceFilter::All
        } else {
            SourceFilter::Source(value.to_string())
        }
    }

    pub fn matches(&self, source_name: &str) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Source(name) => name == source_name,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SourceFilter::All => ALL_SOURCES,
            SourceFilter::Source(name) => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub active_source: SourceFilter,
    pub search_term: String,
}

impl FilterState {
    pub fn new(active_source: SourceFilter, search_term: &str) -> Self {
        Self {
            active_source,
            search_term: search_term.trim().to_string(),
        }
    }

    pub fn has_search(&self) -> bool {
        !self.search_term.is_empty()
    }

    pub fn matches(&self, article: &Article) -> bool {
        if !self.active_source.matches(&article.source_name) {
            return false;
        }
        if !self.has_search() {
            return true;
        }
        let term = self.search_term.to_lowercase();
        article.title.to_lowercase().contains(&term)
            || article.description.to_lowercase().contains(&term)
    }
}

/// Visible subset of `articles`, in the same order.
pub fn filter_articles<'a>(articles: &'a [Article], state: &FilterState) -> Vec<&'a Article> {
    articles.iter().filter(|a| state.matches(a)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn article(title: &str, description: &str, source: &str, hours_ago: i64) -> Article {
        Article {
            id: format!("{}-{}", source, title),
            title: title.to_string(),
            link: format!("https://{}.example.com/{}", source, title.len()),
            description: description.to_string(),
            published_at: Utc::now() - Duration::hours(hours_ago),
            source_name: source.to_string(),
            source_color: "#000000".to_string(),
        }
    }

    fn sample() -> Vec<Article> {
        vec![
            article("BTC breaks resistance", "Bulls are back", "CoinDesk", 1),
            article("Ethereum gas fees fall", "Cheaper BTC bridges too", "NewsBTC", 2),
            article("Solana outage", "Validators restart", "NewsBTC", 3),
            article("Market wrap", "btc and eth steady", "CoinDesk", 4),
        ]
    }

    #[test]
    fn test_all_with_empty_search_returns_everything_in_order() {
        let articles = sample();
        let result = filter_articles(&articles, &FilterState::default());

        assert_eq!(result.len(), articles.len());
        for (got, want) in result.iter().zip(articles.iter()) {
            assert_eq!(*got, want);
        }
    }

    #[test]
    fn test_source_and_search_are_anded() {
        let articles = sample();
        let state = FilterState::new(SourceFilter::parse("CoinDesk"), "btc");
        let result = filter_articles(&articles, &state);

        let titles: Vec<_> = result.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["BTC breaks resistance", "Market wrap"]);
    }

    #[test]
    fn test_search_matches_description_case_insensitively() {
        let articles = sample();
        let state = FilterState::new(SourceFilter::All, "CHEAPER");
        let result = filter_articles(&articles, &state);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Ethereum gas fees fall");
    }

    #[test]
    fn test_source_only() {
        let articles = sample();
        let state = FilterState::new(SourceFilter::Source("NewsBTC".to_string()), "");
        let result = filter_articles(&articles, &state);

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|a| a.source_name == "NewsBTC"));
    }

    #[test]
    fn test_source_match_is_exact() {
        let articles = sample();
        let state = FilterState::new(SourceFilter::parse("coindesk"), "");
        assert!(filter_articles(&articles, &state).is_empty());
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let articles = sample();
        let state = FilterState::new(SourceFilter::All, "dogecoin");
        assert!(filter_articles(&articles, &state).is_empty());
    }

    #[test]
    fn test_search_term_is_trimmed() {
        let state = FilterState::new(SourceFilter::All, "   ");
        assert!(!state.has_search());
    }

    mod source_filter_tests {
        use super::*;

        #[test]
        fn test_parse_all_and_blank() {
            assert_eq!(SourceFilter::parse("all"), SourceFilter::All);
            assert_eq!(SourceFilter::parse(""), SourceFilter::All);
        }

        #[test]
        fn test_parse_named_source() {
            let filter = SourceFilter::parse("U.Today");
            assert_eq!(filter, SourceFilter::Source("U.Today".to_string()));
            assert_eq!(filter.as_str(), "U.Today");
        }
    }
}
