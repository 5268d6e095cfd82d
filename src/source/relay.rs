use chrono::{DateTime, Utc};
use log::debug;
use reqwest::{Client, Url, header::CONTENT_TYPE};
use serde_json::Value;

use crate::{
    config::RelayConfig,
    error::SourceError,
    schema::{Cursor, Engagement, Item, Page},
    util,
};

use super::adapter::PageSource;

/// HTTP page source talking to the listing relay.
///
/// The relay is a thin edge proxy in front of the public listing API.
/// It takes `unique_id`, `count` and an optional `cursor` as query
/// parameters and returns the upstream JSON unchanged:
///
/// ```json
/// { "code": 0, "msg": "success",
///   "data": { "videos": [ ... ], "cursor": "1700000000000", "hasMore": true } }
/// ```
///
/// DESIGN:
/// - Pure protocol translation
/// - No retry, no dedup, no pacing (the collector owns those)
pub struct RelaySource {
    client: Client,
    url: Url,
}

impl RelaySource {
    pub fn new(cfg: &RelayConfig) -> Result<Self, SourceError> {
        let url = Url::parse(&cfg.url)
            .map_err(|e| SourceError::InvalidUrl(format!("{}: {}", cfg.url, e)))?;

        let client = Client::builder().timeout(cfg.timeout()).build()?;

        Ok(Self { client, url })
    }

    /// Builds the request URL for one page.
    ///
    /// The `cursor` parameter is left out on the first request.
    pub fn request_url(&self, subject: &str, cursor: &Cursor, page_size: usize) -> Url {
        let mut url = self.url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("unique_id", subject);
            query.append_pair("count", &page_size.to_string());
            if let Some(token) = cursor.token() {
                query.append_pair("cursor", token);
            }
        }
        url
    }
}

#[async_trait::async_trait]
impl PageSource for RelaySource {

    fn name(&self) -> &str {
        "relay"
    }

    async fn fetch_page(
        &self,
        subject: &str,
        cursor: &Cursor,
        page_size: usize,
    ) -> Result<Page, SourceError> {
        let url = self.request_url(subject, cursor, page_size);
        debug!("GET {}", url);

        let res = self.client.get(url).send().await?;
        let status = res.status();
        let is_json = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        let body = res.text().await?;

        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: util::snippet(&body),
            });
        }

        // The upstream answers with an HTML error page when it blocks us
        if !is_json {
            return Err(SourceError::NotJson {
                body: util::snippet(&body),
            });
        }

        parse_page(&body)
    }
}

// ------------------------------------------------------------
// Response decoding
// ------------------------------------------------------------

/// Decodes a relay response body into a `Page`.
///
/// - `code != 0` is reported as `SourceError::Api`
/// - a missing `data.videos` array yields `items: None`
/// - the next cursor is `sec_cursor`, falling back to `cursor`;
///   falsy values (`0`, `""`, `null`, `false`) and `hasMore: false`
///   mean the listing is exhausted
pub fn parse_page(body: &str) -> Result<Page, SourceError> {
    let v: Value = serde_json::from_str(body)?;

    if let Some(code) = v.get("code").and_then(Value::as_i64) {
        if code != 0 {
            return Err(SourceError::Api {
                code,
                message: v
                    .get("msg")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }
    }

    let data = v.get("data");

    let items = data
        .and_then(|d| d.get("videos"))
        .and_then(Value::as_array)
        .map(|videos| videos.iter().map(parse_video).collect::<Vec<_>>());

    let has_more = data
        .and_then(|d| d.get("hasMore"))
        .and_then(Value::as_bool)
        .unwrap_or(true);

    let next_cursor = if has_more {
        data.and_then(|d| {
            cursor_token(d.get("sec_cursor")).or_else(|| cursor_token(d.get("cursor")))
        })
    } else {
        None
    };

    Ok(Page { items, next_cursor })
}

/// Maps one upstream video. Never fails: odd field types fall back to
/// defaults so a single bad entry cannot abort a collection.
fn parse_video(v: &Value) -> Item {
    let id = match v.get("video_id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let created_at = util::from_unix_seconds(lenient_int(v.get("create_time")))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    Item {
        id,
        created_at,
        caption: v
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        engagement: Engagement {
            views: lenient_count(v.get("play_count")),
            likes: lenient_count(v.get("digg_count")),
            comments: lenient_count(v.get("comment_count")),
            shares: lenient_count(v.get("share_count")),
        },
    }
}

/// Integer from a JSON number or numeric string; anything else is 0.
/// Fractions are truncated.
fn lenient_int(v: Option<&Value>) -> i64 {
    match v {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Engagement counter; negative values count as 0.
fn lenient_count(v: Option<&Value>) -> u64 {
    match v {
        Some(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap_or(0),
        _ => lenient_int(v).max(0) as u64,
    }
}

/// Cursors come back as strings or numbers depending on the endpoint.
fn cursor_token(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}
