//! The outbound search request, checked against a loopback HTTP server.

use assert_matches::assert_matches;
use overflow_panel::{PostSearch, RelatedPost, SearchConfig, SearchError, StackExchangeClient};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

/// Serves `body` with `status` to every request and records request targets.
struct StubServer {
    endpoint: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    async fn start(status: &'static str, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };

                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }

                let request = String::from_utf8_lossy(&buf);
                let target = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or_default()
                    .to_string();
                recorded.lock().unwrap().push(target);

                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
        });

        Self {
            endpoint: format!("http://{addr}/2.2/search/advanced"),
            requests,
        }
    }

    fn client(&self) -> StackExchangeClient {
        StackExchangeClient::new(SearchConfig::default().with_endpoint(&self.endpoint)).unwrap()
    }

    fn queries(&self) -> Vec<HashMap<String, String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|target| {
                let url = Url::parse(&format!("http://localhost{target}")).unwrap();
                assert_eq!(url.path(), "/2.2/search/advanced");
                url.query_pairs().into_owned().collect()
            })
            .collect()
    }
}

const TWO_ITEMS: &str = r#"{
    "items": [
        {"title": "Why doesn&#39;t TypeScript infer this?", "link": "https://stackoverflow.com/q/10", "score": 40, "is_answered": true},
        {"title": "Cannot find name &quot;foo&quot;", "link": "https://stackoverflow.com/q/11", "score": 7, "is_answered": true}
    ],
    "has_more": false,
    "quota_max": 300,
    "quota_remaining": 299
}"#;

#[tokio::test(flavor = "current_thread")]
async fn test_one_request_per_search_with_fixed_parameters() {
    let server = StubServer::start("200 OK", TWO_ITEMS).await;
    let client = server.client();

    let empty = client.search("").await.unwrap();
    let foo = client.search("foo").await.unwrap();
    assert_eq!(empty, foo);

    let queries = server.queries();
    assert_eq!(queries.len(), 2);
    for (query, keyword) in queries.iter().zip(["", "foo"]) {
        assert_eq!(query["site"], "stackoverflow");
        assert_eq!(query["sort"], "votes");
        assert_eq!(query["order"], "desc");
        assert_eq!(query["accepted"], "true");
        assert_eq!(query["pagesize"], "10");
        assert_eq!(query["q"], format!("typescript {keyword}"));
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_items_become_related_posts() {
    let server = StubServer::start("200 OK", TWO_ITEMS).await;

    let posts = server.client().search("Cannot find name 'foo'.").await.unwrap();

    assert_eq!(
        posts,
        vec![
            RelatedPost::new(
                "Why doesn't TypeScript infer this?",
                "https://stackoverflow.com/q/10"
            ),
            RelatedPost::new("Cannot find name \"foo\"", "https://stackoverflow.com/q/11"),
        ]
    );
}

#[tokio::test(flavor = "current_thread")]
async fn test_api_error_is_reported() {
    let server = StubServer::start(
        "400 Bad Request",
        r#"{"error_id": 400, "error_name": "bad_parameter", "error_message": "pagesize"}"#,
    )
    .await;

    let err = server.client().search("foo").await.unwrap_err();
    assert_matches!(err, SearchError::Api { error_id: 400, .. });
    assert_eq!(
        err.to_string(),
        "Search API error 400 (bad_parameter): pagesize"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn test_unreachable_endpoint_is_transport_error() {
    // Bind and drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = SearchConfig::default().with_endpoint(format!("http://{addr}/search"));
    let err = StackExchangeClient::new(config)
        .unwrap()
        .search("foo")
        .await
        .unwrap_err();
    assert_matches!(err, SearchError::Transport(_));
}
