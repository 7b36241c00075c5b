//! Related-post lookup against the Stack Exchange search API.
//!
//! One diagnostic message produces one `GET /search/advanced` request. There is
//! no retry and no caching: every call is independent, and every failure goes
//! back to the caller.

use crate::config::SearchConfig;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A post returned for a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedPost {
    pub title: String,
    pub link: String,
}

impl RelatedPost {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// Errors from a related-post search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The configured endpoint is not a valid URL
    #[error("Invalid search endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    /// Could not reach the API or read its response
    #[error("Search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The API answered with an error object
    #[error("Search API error {error_id} ({error_name}): {message}")]
    Api {
        error_id: i64,
        error_name: String,
        message: String,
    },
    /// Non-success status without an API error object
    #[error("Search API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The response body was not the expected JSON
    #[error("Could not decode search response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can find posts related to a keyword.
pub trait PostSearch {
    fn search(
        &self,
        keyword: &str,
    ) -> impl Future<Output = Result<Vec<RelatedPost>, SearchError>> + Send;
}

/// Response wrapper shared by all Stack Exchange API methods.
///
/// Every field is optional: the schema is owned by the API, and items without
/// a title or link are dropped rather than failing the whole search.
#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    error_id: Option<i64>,
    error_name: Option<String>,
    error_message: Option<String>,
    quota_remaining: Option<u64>,
    backoff: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: Option<String>,
    link: Option<String>,
}

/// HTTP client for the Stack Exchange advanced search.
#[derive(Debug, Clone)]
pub struct StackExchangeClient {
    client: reqwest::Client,
    config: SearchConfig,
    endpoint: Url,
}

impl StackExchangeClient {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let endpoint =
            Url::parse(&config.endpoint).map_err(|source| SearchError::InvalidEndpoint {
                endpoint: config.endpoint.clone(),
                source,
            })?;

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    /// The full request URL for `keyword`.
    pub fn request_url(&self, keyword: &str) -> Url {
        let config = &self.config;
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("site", &config.site)
                .append_pair("sort", &config.sort)
                .append_pair("order", "desc")
                .append_pair("pagesize", &config.effective_page_size().to_string())
                .append_pair("q", &format!("{} {}", config.language, keyword));
            if config.accepted_only {
                query.append_pair("accepted", "true");
            }
            if let Some(key) = &config.api_key {
                query.append_pair("key", key);
            }
        }
        url
    }
}

impl PostSearch for StackExchangeClient {
    async fn search(&self, keyword: &str) -> Result<Vec<RelatedPost>, SearchError> {
        let url = self.request_url(keyword);
        tracing::debug!("Searching related posts: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        parse_response(status, &body)
    }
}

fn parse_response(status: reqwest::StatusCode, body: &str) -> Result<Vec<RelatedPost>, SearchError> {
    let response: SearchResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(_) if !status.is_success() => {
            return Err(SearchError::Status {
                status,
                body: body.to_string(),
            });
        }
        Err(e) => return Err(SearchError::Decode(e)),
    };

    if let Some(error_id) = response.error_id {
        return Err(SearchError::Api {
            error_id,
            error_name: response.error_name.unwrap_or_default(),
            message: response.error_message.unwrap_or_default(),
        });
    }
    if !status.is_success() {
        return Err(SearchError::Status {
            status,
            body: body.to_string(),
        });
    }

    if let Some(quota) = response.quota_remaining {
        tracing::debug!("Search quota remaining: {}", quota);
    }
    if let Some(backoff) = response.backoff {
        tracing::warn!("Search API asked to back off for {}s", backoff);
    }

    let posts = response
        .items
        .into_iter()
        .filter_map(|item| match (item.title, item.link) {
            (Some(title), Some(link)) => Some(RelatedPost {
                title: decode_entities(&title),
                link,
            }),
            (title, link) => {
                tracing::warn!(
                    "Skipping search item without title or link: title={:?} link={:?}",
                    title,
                    link
                );
                None
            }
        })
        .collect();

    Ok(posts)
}

/// Decode the HTML entities the API uses in titles (`&quot;`, `&#39;`, ...).
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').and_then(|semi| {
            let ch = match &rest[1..semi] {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                entity => {
                    let code = if let Some(hex) = entity.strip_prefix("#x") {
                        u32::from_str_radix(hex, 16).ok()
                    } else if let Some(dec) = entity.strip_prefix('#') {
                        dec.parse().ok()
                    } else {
                        None
                    };
                    code.and_then(char::from_u32)
                }
            };
            ch.map(|ch| (ch, semi))
        });

        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
