//! Plain-text helpers shared by the item parser and the web view.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use url::form_urlencoded;

pub const ELLIPSIS: &str = "...";
pub const ID_LEN: usize = 20;

// A tag opens only when `<` is followed by a letter, `/`, `!` or `?`; a bare `<` is text.
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[A-Za-z/!?][^>]*>").expect("tag regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Strip markup and decode entities, leaving collapsed plain text.
pub fn clean_html_text(html: &str) -> String {
    let stripped = TAG_RE.replace_all(html, "");
    let decoded = html_escape::decode_html_entities(&stripped);
    WS_RE.replace_all(&decoded, " ").trim().to_string()
}

/// Cut `text` to `max_chars` characters, appending an ellipsis when anything was removed.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Best-effort fingerprint of an article; identical title and link always give the same id.
pub fn article_id(title: &str, link: &str) -> String {
    let joined = format!("{}{}", title, link);
    let encoded: String = form_urlencoded::byte_serialize(joined.as_bytes()).collect();
    STANDARD
        .encode(encoded)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(ID_LEN)
        .collect()
}

pub fn format_relative_time(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(date);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{} minute{} ago", minutes, plural(minutes))
    } else if hours < 24 {
        format!("{} hour{} ago", hours, plural(hours))
    } else {
        format!("{} day{} ago", days, plural(days))
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
