//! Pagination walker.
//!
//! Collections are paged with a `Link` header whose `rel="next"` entry holds
//! the URL of the following page. That URL, resolved against the page that
//! returned it, is the cursor: it is absolute and valid for exactly one
//! subsequent request.

use crate::error::{ClientError, ClientResult};
use crate::executor::{Executor, RawResponse};
use crate::rate_limit::send_guarded;
use crate::request::RequestDescriptor;
use reqwest::header::LINK;
use reqwest::Url;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One `<url>; rel="..."` entry of a `Link` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// Target URL
    pub url: String,
    /// Relation types, lowercased
    pub rels: Vec<String>,
}

/// Parse a `Link` header into its entries.
///
/// Entries without a URL in angle brackets or without a `rel` parameter are
/// skipped.
pub fn parse_link_header(header: &str) -> Vec<LinkEntry> {
    let mut entries = Vec::new();
    let mut rest = header;

    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>').map(|i| open + i) else {
            break;
        };
        let url = rest[open + 1..close].trim().to_string();
        let params_end = rest[close..].find('<').map_or(rest.len(), |i| close + i);
        let params = &rest[close + 1..params_end];

        let rels = params
            .split(';')
            .filter_map(|param| {
                let (key, value) = param.split_once('=')?;
                if key.trim().eq_ignore_ascii_case("rel") {
                    Some(value.trim().trim_matches(|c| c == '"' || c == ',').trim().to_string())
                } else {
                    None
                }
            })
            .flat_map(|value| {
                value
                    .split_whitespace()
                    .map(|r| r.to_ascii_lowercase())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        if !url.is_empty() && !rels.is_empty() {
            entries.push(LinkEntry { url, rels });
        }
        rest = &rest[params_end..];
    }

    entries
}

/// Cursor for the next page, from a `Link` header value.
pub fn next_cursor(link_header: &str) -> Option<String> {
    parse_link_header(link_header)
        .into_iter()
        .find(|entry| entry.rels.iter().any(|r| r == "next"))
        .map(|entry| entry.url)
}

/// Parse a total-count header value. Anything but a non-negative integer is `None`.
pub fn parse_total_count(value: Option<&str>) -> Option<u64> {
    value.and_then(|v| v.trim().parse::<u64>().ok())
}

/// Items of a walk before sanitization.
#[derive(Debug)]
pub(crate) struct Walk {
    pub(crate) items: Vec<Value>,
    pub(crate) last: RawResponse,
    pub(crate) next_cursor: Option<String>,
    pub(crate) pages: usize,
}

/// Fetch one page, or every page when `fetch_all` is set.
///
/// Pages are requested strictly in the order the server links them and their
/// items are concatenated in that order. Any failure aborts the whole walk.
pub(crate) async fn walk(
    executor: &Executor,
    request: &RequestDescriptor,
    fetch_all: bool,
    cancel: &CancellationToken,
) -> ClientResult<Walk> {
    let mut items = Vec::new();
    let mut current = request.clone();
    let mut pages = 0;

    loop {
        let mut response = send_guarded(executor, &current, cancel).await?;
        pages += 1;

        let page = match response.body.take() {
            Some(Value::Array(page)) => page,
            Some(other) => {
                return Err(ClientError::Shape(format!(
                    "expected array, got {}",
                    json_kind(&other)
                )))
            }
            None => return Err(ClientError::Shape("expected array, got empty body".to_string())),
        };
        let cursor = match response.header(LINK.as_str()).as_deref().and_then(next_cursor) {
            Some(link) => Some(resolve_cursor(&executor.url(&current)?, &link)?),
            None => None,
        };

        debug!(
            page = pages,
            items = page.len(),
            has_next = cursor.is_some(),
            "Fetched page"
        );
        items.extend(page);

        match cursor {
            Some(cursor) if fetch_all => {
                current = request.follow(&cursor);
            }
            cursor => {
                return Ok(Walk {
                    items,
                    last: response,
                    next_cursor: if fetch_all { None } else { cursor },
                    pages,
                });
            }
        }
    }
}

/// Resolve a `next` link against the URL of the page that returned it.
fn resolve_cursor(page_url: &Url, link: &str) -> ClientResult<String> {
    page_url
        .join(link)
        .map(String::from)
        .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", link, e)))
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_cursor_single_entry() {
        let header = r#"<https://api.example.com/projects?offset=30&per_page=30>; rel="next""#;
        assert_eq!(
            next_cursor(header),
            Some("https://api.example.com/projects?offset=30&per_page=30".to_string())
        );
    }

    #[test]
    fn test_next_cursor_among_relations() {
        let header = concat!(
            r#"<https://api.example.com/e?page=1>; rel="prev", "#,
            r#"<https://api.example.com/e?page=3>; rel="NEXT", "#,
            r#"<https://api.example.com/e?page=9>; rel="last""#
        );
        assert_eq!(
            next_cursor(header),
            Some("https://api.example.com/e?page=3".to_string())
        );
    }

    #[test]
    fn test_relation_list_and_unquoted() {
        let header = "</errors?offset=10>; title=\"more\"; rel=next";
        assert_eq!(next_cursor(header), Some("/errors?offset=10".to_string()));

        let entries = parse_link_header(r#"</e?p=2>; rel="next last""#);
        assert_eq!(entries[0].rels, vec!["next".to_string(), "last".to_string()]);
    }

    #[test]
    fn test_no_next_relation() {
        assert_eq!(next_cursor(r#"<https://a.test/e?page=1>; rel="prev""#), None);
        assert_eq!(next_cursor(""), None);
        assert_eq!(next_cursor("garbage; rel=\"next\""), None);
        assert_eq!(next_cursor("<unterminated; rel=\"next\""), None);
    }

    #[test]
    fn test_cursor_resolves_against_page_url() {
        let page = Url::parse("https://api.example.com/v2/errors?offset=0").unwrap();
        assert_eq!(
            resolve_cursor(&page, "/v2/errors?offset=2").unwrap(),
            "https://api.example.com/v2/errors?offset=2"
        );
        assert_eq!(
            resolve_cursor(&page, "errors?offset=4").unwrap(),
            "https://api.example.com/v2/errors?offset=4"
        );
        assert_eq!(
            resolve_cursor(&page, "https://other.example.com/p?x=1").unwrap(),
            "https://other.example.com/p?x=1"
        );
    }

    #[test]
    fn test_parse_total_count() {
        assert_eq!(parse_total_count(Some("42")), Some(42));
        assert_eq!(parse_total_count(Some(" 7 ")), Some(7));
        assert_eq!(parse_total_count(Some("lots")), None);
        assert_eq!(parse_total_count(Some("-1")), None);
        assert_eq!(parse_total_count(None), None);
    }
}
