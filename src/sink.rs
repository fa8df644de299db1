use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use crate::pipeline::Recommendation;
use crate::TARGET_WEB_REQUEST;

/// Remote table receiving one batch insert per run.
pub const RECOMMENDATIONS_TABLE: &str = "recommendations";

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("remote rejected the batch insert ({status}): {payload}")]
    Rejected { status: StatusCode, payload: Value },

    #[error("transport failure during publish: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Client for the remote recommendations table.
pub struct Sink {
    client: Client,
    base_url: String,
    api_key: String,
}

impl Sink {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Submit every record in a single batch insert.
    ///
    /// The outcome is decided by the transport result and the HTTP status,
    /// not by inspecting the response payload: non-success statuses surface
    /// as [`PublishError::Rejected`] carrying the remote error payload, and
    /// connection-level faults as [`PublishError::Transport`].
    pub async fn publish(&self, records: &[Recommendation]) -> Result<usize, PublishError> {
        let endpoint = format!("{}/rest/v1/{}", self.base_url, RECOMMENDATIONS_TABLE);
        info!(
            target: TARGET_WEB_REQUEST,
            "Publishing {} recommendation records to {}",
            records.len(),
            endpoint
        );

        let response = self
            .client
            .post(&endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .timeout(PUBLISH_TIMEOUT)
            .json(records)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(
                target: TARGET_WEB_REQUEST,
                "Batch insert accepted with status {}", status
            );
            return Ok(records.len());
        }

        let body = response.text().await.unwrap_or_default();
        let payload = serde_json::from_str(&body).unwrap_or(Value::String(body));
        error!(
            target: TARGET_WEB_REQUEST,
            "Batch insert rejected with status {}: {}", status, payload
        );
        Err(PublishError::Rejected { status, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Article;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn sample_records(count: usize) -> Vec<Recommendation> {
        let article = Article {
            id: 0,
            title: "Rocket launch".to_string(),
            description: "Liftoff".to_string(),
            content: "The rocket launched at dawn".to_string(),
            url: "https://example.com/rocket".to_string(),
            image_url: String::new(),
            published_at: "2024-01-01T00:00:00Z".to_string(),
            author: "Ann".to_string(),
            combined_text: String::new(),
        };
        (0..count)
            .map(|_| Recommendation::from_article("Science", &article, 0.9))
            .collect()
    }

    // Minimal single-request HTTP server: reads one request, sends the
    // canned response, closes the connection.
    async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buffer = vec![0u8; 65536];
            let mut read = 0;
            loop {
                let n = stream.read(&mut buffer[read..]).await.unwrap();
                if n == 0 {
                    break;
                }
                read += n;
                let head = String::from_utf8_lossy(&buffer[..read]);
                if let Some(header_end) = head.find("\r\n\r\n") {
                    let content_length = head
                        .lines()
                        .find_map(|line| {
                            line.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if read >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_records_serialize_with_the_remote_schema() {
        let records = sample_records(1);
        let json = serde_json::to_value(&records).unwrap();
        let row = &json[0];
        for key in [
            "category",
            "title",
            "url",
            "description",
            "content",
            "image_url",
            "published_at",
            "author",
            "similarity_score",
        ] {
            assert!(row.get(key).is_some(), "missing key '{}'", key);
        }
        assert_eq!(row["category"], "Science");
        assert!((row["similarity_score"].as_f64().unwrap() - 0.9).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_publish_reports_success_on_2xx() {
        let base_url = serve_once(
            "HTTP/1.1 201 Created\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
        )
        .await;
        let sink = Sink::new(&base_url, "test-key");
        let count = sink.publish(&sample_records(80)).await.unwrap();
        assert_eq!(count, 80);
    }

    #[tokio::test]
    async fn test_publish_surfaces_the_rejection_payload() {
        let body = r#"{"error":"duplicate key value"}"#;
        let response = format!(
            "HTTP/1.1 409 Conflict\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let base_url = serve_once(response).await;
        let sink = Sink::new(&base_url, "test-key");

        let err = sink.publish(&sample_records(1)).await.unwrap_err();
        match err {
            PublishError::Rejected { status, payload } => {
                assert_eq!(status, StatusCode::CONFLICT);
                assert_eq!(payload["error"], "duplicate key value");
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_classifies_connection_faults_as_transport() {
        // Bind and immediately drop the listener so the port refuses.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sink = Sink::new(&format!("http://{}", addr), "test-key");
        let err = sink.publish(&sample_records(1)).await.unwrap_err();
        assert!(matches!(err, PublishError::Transport(_)));
    }
}
