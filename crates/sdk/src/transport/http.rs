//! HTTP transport layer for the Glider SDK.

use crate::error::{McpError, McpResult};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::transport::sse::{is_event_stream, SseResponseReader};
use futures_util::StreamExt;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const HEALTH_PATH: &str = "/health";
pub const MCP_PATH: &str = "/mcp";

const TOOL_CALL_ACCEPT: &str = "application/json, text/event-stream";

/// HTTP transport for health checks and JSON-RPC calls.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> McpResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// Join `base_url` and `path` verbatim.
    pub fn endpoint(base_url: &str, path: &str) -> McpResult<Url> {
        Ok(Url::parse(&format!("{}{}", base_url, path))?)
    }

    /// `GET` a JSON body, decoding it as `T` on 2xx.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url, timeout: Duration) -> McpResult<T> {
        debug!(url = %url, "GET request");

        with_timeout(timeout, async {
            let response = self
                .client
                .get(url)
                .header(header::ACCEPT, "application/json")
                .send()
                .await?;
            let response = ensure_success(response).await?;
            Ok::<_, McpError>(response.json::<T>().await?)
        })
        .await
    }

    /// POST a JSON-RPC request and return the adopted response.
    ///
    /// Event-stream bodies are read chunk by chunk; the last frame carrying a
    /// `result` or `error` is the response.
    pub async fn post_rpc(
        &self,
        url: Url,
        request: &JsonRpcRequest,
        timeout: Duration,
    ) -> McpResult<JsonRpcResponse> {
        debug!(url = %url, method = %request.method, id = %request.id, "POST request");

        with_timeout(timeout, async {
            let response = self
                .client
                .post(url)
                .header(header::ACCEPT, TOOL_CALL_ACCEPT)
                .json(request)
                .send()
                .await?;
            let response = ensure_success(response).await?;

            let content_type = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();

            if is_event_stream(&content_type) {
                read_event_stream(response).await
            } else {
                let body = response.text().await?;
                Ok(serde_json::from_str(&body)?)
            }
        })
        .await
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    fut: impl Future<Output = McpResult<T>>,
) -> McpResult<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| McpError::Timeout(timeout.as_millis() as u64))?
}

async fn ensure_success(response: Response) -> McpResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(McpError::from_response(status, &body))
}

async fn read_event_stream(response: Response) -> McpResult<JsonRpcResponse> {
    let mut stream = response.bytes_stream();
    let mut reader = SseResponseReader::new();

    while let Some(chunk) = stream.next().await {
        reader.push(&chunk?);
    }

    reader.finish().ok_or_else(|| {
        McpError::Stream("No valid JSON response found in SSE stream".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::HealthResponse;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_endpoint_is_verbatim_prefix() {
        let url = HttpTransport::endpoint("http://localhost:5001", HEALTH_PATH).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/health");

        let url = HttpTransport::endpoint("http://localhost:5001/glider", MCP_PATH).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/glider/mcp");
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        assert!(matches!(
            HttpTransport::endpoint("not a url", HEALTH_PATH),
            Err(McpError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_get_json_sends_accept_header() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let url = HttpTransport::endpoint(&server.uri(), HEALTH_PATH).unwrap();

        let health: HealthResponse = transport
            .get_json(url, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(health.is_ok());
    }

    #[tokio::test]
    async fn test_post_rpc_sends_json_rpc_headers() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/mcp"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": "1",
                "result": {"content": []}
            })))
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let url = HttpTransport::endpoint(&server.uri(), MCP_PATH).unwrap();
        let request = JsonRpcRequest::call_tool("server_status", Default::default());

        let response = transport
            .post_rpc(url, &request, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(response.result.is_some());

        let requests = server.received_requests().await.unwrap();
        let accept = requests[0].headers.get("accept").unwrap().to_str().unwrap();
        assert_eq!(accept, TOOL_CALL_ACCEPT);
    }

    #[tokio::test]
    async fn test_error_on_non_success_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad gateway"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let url = HttpTransport::endpoint(&server.uri(), MCP_PATH).unwrap();
        let request = JsonRpcRequest::call_tool("server_status", Default::default());

        match transport.post_rpc(url, &request, Duration::from_secs(5)).await {
            Err(McpError::Api { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad gateway");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "ok"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let url = HttpTransport::endpoint(&server.uri(), HEALTH_PATH).unwrap();

        let result = transport
            .get_json::<serde_json::Value>(url, Duration::from_millis(50))
            .await;
        assert!(matches!(result, Err(McpError::Timeout(50))));
    }
}
