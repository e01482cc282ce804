//! HTTP client for the video-analysis backend
//!
//! Features:
//! - Multipart video upload with byte-level progress
//! - JSON REST calls (files, chat, models, alerts)
//! - Streamed SSE summaries decoded incrementally

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::sse::{SseDecoder, SseFrame};
use super::types::{
    Alert, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ErrorBody, FileInfo, Model,
    SummarizeParams,
};
use super::{ApiError, Result};

/// Backend base URL used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Upload chunk size (progress granularity)
const UPLOAD_CHUNK: usize = 256 * 1024;

const NO_RESPONSE: &str = "No response from AI";

/// `/models` answers either a bare list or an OpenAI-style `{ "data": [...] }`
#[derive(Deserialize)]
#[serde(untagged)]
enum ModelList {
    List(Vec<Model>),
    Wrapped { data: Vec<Model> },
}

/// Client for the analysis backend's REST/SSE API
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
    /// Applied to every call except uploads and streamed summaries
    timeout: Duration,
}

impl BackendClient {
    /// Create a client for `base_url` with a 30 s request timeout
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        // Url::join replaces the last segment unless the base ends with '/'
        let mut normalized = base_url.trim_end_matches('/').to_string();
        normalized.push('/');
        let base_url = Url::parse(&normalized)?;

        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .zstd(true)
            .deflate(true)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Send a request, turning connection failures and error statuses into
    /// [`ApiError`]s
    async fn send(&self, request: RequestBuilder, op: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                ApiError::Connect {
                    url: self.base_url.to_string(),
                    source: e,
                }
            } else {
                ApiError::Http(e)
            }
        })?;

        let status = response.status();
        debug!("{op}: {status}");
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message())
            .unwrap_or_else(|| format!("{op} failed with status {}", status.as_u16()));
        warn!("{op} failed: {message}");
        Err(ApiError::Status(message))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, op: &str) -> Result<T> {
        let request = self.client.get(self.endpoint(path)?).timeout(self.timeout);
        let response = self.send(request, op).await?;
        Ok(response.json().await?)
    }

    // ─── Files ───────────────────────────────────────────────────────────────

    /// Upload a video as multipart form data, reporting progress in percent
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn upload_file<F>(&self, path: impl AsRef<Path>, on_progress: F) -> Result<FileInfo>
    where
        F: FnMut(f64) + Send + Sync + 'static,
    {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();
        let name = path
            .file_name()
            .map_or_else(|| "video".to_string(), |n| n.to_string_lossy().into_owned());
        info!("Uploading {name} ({total} bytes)");

        let body = Body::wrap_stream(progress_stream(file, total, on_progress));
        let part = Part::stream_with_length(body, total)
            .file_name(name)
            .mime_str(video_mime(path))?;
        let form = Form::new()
            .part("file", part)
            .text("purpose", "vision")
            .text("media_type", "video");

        let request = self.client.post(self.endpoint("files")?).multipart(form);
        let response = self.send(request, "Upload").await?;

        let text = response.text().await?;
        let info: FileInfo = serde_json::from_str(&text)
            .map_err(|_| ApiError::InvalidResponse(text.chars().take(200).collect()))?;
        info!("Upload successful: {}", info.id);
        Ok(info)
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        let url = self.endpoint(&format!("files/{file_id}"))?;
        let request = self.client.delete(url).timeout(self.timeout);
        self.send(request, "Delete").await?;
        Ok(())
    }

    pub async fn list_files(&self) -> Result<Vec<FileInfo>> {
        self.get_json("files", "List files").await
    }

    // ─── Chat & summaries ────────────────────────────────────────────────────

    /// Non-streamed chat completion; returns the first choice's text
    pub async fn chat(&self, messages: &[ChatMessage], file_id: Option<&str>) -> Result<String> {
        let body = ChatCompletionRequest {
            messages,
            stream: false,
            id: file_id,
        };
        let request = self
            .client
            .post(self.endpoint("chat/completions")?)
            .timeout(self.timeout)
            .json(&body);
        let response: ChatCompletionResponse = self.send(request, "Chat").await?.json().await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| NO_RESPONSE.to_string()))
    }

    /// Stream a summary, handing each text fragment to `on_chunk`; returns the
    /// concatenated summary
    #[instrument(skip_all, fields(file_id = %params.id))]
    pub async fn summarize<F>(&self, params: &SummarizeParams, mut on_chunk: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let mut body = params.clone();
        body.stream = true;
        info!("Starting summarization with model {}", body.model);

        let request = self.client.post(self.endpoint("summarize")?).json(&body);
        let response = self.send(request, "Summarize").await?;

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut summary = String::new();
        let mut done = false;

        'read: while let Some(chunk) = stream.next().await {
            let chunk: Bytes = chunk?;
            for frame in decoder.push(&chunk) {
                match frame {
                    SseFrame::Chunk(text) => {
                        on_chunk(&text);
                        summary.push_str(&text);
                    }
                    SseFrame::Done => {
                        done = true;
                        break 'read;
                    }
                }
            }
        }
        // Anything buffered after [DONE] is not part of the summary
        if !done {
            if let Some(SseFrame::Chunk(text)) = decoder.finish() {
                on_chunk(&text);
                summary.push_str(&text);
            }
        }

        info!("Summary complete ({} chars)", summary.len());
        Ok(summary)
    }

    // ─── Models, alerts, health ──────────────────────────────────────────────

    pub async fn models(&self) -> Result<Vec<Model>> {
        let list: ModelList = self.get_json("models", "Get models").await?;
        Ok(match list {
            ModelList::List(models) | ModelList::Wrapped { data: models } => models,
        })
    }

    pub async fn recent_alerts(&self) -> Result<Vec<Alert>> {
        self.get_json("alerts/recent", "Get alerts").await
    }

    /// Connectivity check: the backend is healthy if it can list models
    pub async fn health(&self) -> Result<usize> {
        let models = self.models().await?;
        info!("Backend is healthy ({} models)", models.len());
        Ok(models.len())
    }
}

/// File contents as a byte stream that reports cumulative progress. An empty
/// file reports 100% once it is exhausted.
#[allow(clippy::cast_precision_loss)]
fn progress_stream<F>(
    file: tokio::fs::File,
    total: u64,
    on_progress: F,
) -> impl futures::Stream<Item = std::io::Result<Bytes>> + Send + Sync + 'static
where
    F: FnMut(f64) + Send + Sync + 'static,
{
    futures::stream::try_unfold(
        (file, 0u64, on_progress),
        move |(mut file, sent, mut on_progress)| async move {
            let mut buf = vec![0u8; UPLOAD_CHUNK];
            let n = file.read(&mut buf).await?;
            if n == 0 {
                if total == 0 {
                    on_progress(100.0);
                }
                return Ok(None);
            }
            buf.truncate(n);
            let sent = sent + n as u64;
            if total > 0 {
                on_progress(sent as f64 / total as f64 * 100.0);
            }
            Ok::<_, std::io::Error>(Some((Bytes::from(buf), (file, sent, on_progress))))
        },
    )
}

fn video_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => "video/mp4",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request head
    async fn serve_once(
        status: &str,
        content_type: &str,
        body: &str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            // Read until the end of the request head
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                received.extend_from_slice(&buf[..n]);
                if n == 0 || received.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&received).into_owned()
        });

        (format!("http://{addr}/api"), handle)
    }

    #[test]
    fn base_url_keeps_api_prefix() {
        let client = BackendClient::new("http://localhost:8000/api").unwrap();
        assert_eq!(
            client.endpoint("files").unwrap().as_str(),
            "http://localhost:8000/api/files"
        );

        let client = BackendClient::new("http://localhost:8000/api///").unwrap();
        assert_eq!(
            client.endpoint("alerts/recent").unwrap().as_str(),
            "http://localhost:8000/api/alerts/recent"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(BackendClient::new("not a url"), Err(ApiError::Url(_))));
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(video_mime(Path::new("a.WEBM")), "video/webm");
        assert_eq!(video_mime(Path::new("a.mp4")), "video/mp4");
        assert_eq!(video_mime(Path::new("noext")), "video/mp4");
    }

    #[tokio::test]
    async fn chat_returns_first_choice() {
        let body = r#"{"id":"c1","choices":[{"index":0,"message":{"role":"assistant","content":"Two people enter."},"finish_reason":"stop"}]}"#;
        let (base, server) = serve_once("200 OK", "application/json", body).await;

        let client = BackendClient::new(&base).unwrap();
        let answer = client
            .chat(&[ChatMessage::user("What happens?")], Some("f1"))
            .await
            .unwrap();
        assert_eq!(answer, "Two people enter.");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/chat/completions"));
    }

    #[tokio::test]
    async fn chat_without_choices_falls_back() {
        let (base, _server) = serve_once("200 OK", "application/json", r#"{"choices":[]}"#).await;
        let client = BackendClient::new(&base).unwrap();
        let answer = client.chat(&[ChatMessage::user("hi")], None).await.unwrap();
        assert_eq!(answer, NO_RESPONSE);
    }

    #[tokio::test]
    async fn error_status_uses_detail_message() {
        let (base, _server) = serve_once(
            "413 Payload Too Large",
            "application/json",
            r#"{"detail":"File exceeds limit"}"#,
        )
        .await;
        let client = BackendClient::new(&base).unwrap();
        let err = client.list_files().await.unwrap_err();
        assert_eq!(err.to_string(), "File exceeds limit");
    }

    #[tokio::test]
    async fn error_status_without_body() {
        let (base, _server) = serve_once("500 Internal Server Error", "text/plain", "boom").await;
        let client = BackendClient::new(&base).unwrap();
        let err = client.recent_alerts().await.unwrap_err();
        assert_eq!(err.to_string(), "Get alerts failed with status 500");
    }

    #[tokio::test]
    async fn models_accepts_wrapped_list() {
        let body = r#"{"data":[{"id":"vila-1.5","name":"VILA"}]}"#;
        let (base, _server) = serve_once("200 OK", "application/json", body).await;
        let client = BackendClient::new(&base).unwrap();
        assert_eq!(client.health().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn summarize_streams_chunks() {
        let body = "data: {\"content\":\"Forklift \"}\n\ndata: {\"chunk\":\"reverses.\"}\n\ndata: bad\n\ndata: [DONE]\n\n";
        let (base, _server) = serve_once("200 OK", "text/event-stream", body).await;

        let client = BackendClient::new(&base).unwrap();
        let mut seen = Vec::new();
        let summary = client
            .summarize(&SummarizeParams::new("f1"), |c| seen.push(c.to_string()))
            .await
            .unwrap();

        assert_eq!(summary, "Forklift reverses.");
        assert_eq!(seen, vec!["Forklift ", "reverses."]);
    }

    #[tokio::test]
    async fn summarize_ignores_bytes_after_done() {
        let body = "data: {\"content\":\"Kept.\"}\n\ndata: [DONE]\n\ndata: {\"content\":\"late\"}";
        let (base, _server) = serve_once("200 OK", "text/event-stream", body).await;

        let client = BackendClient::new(&base).unwrap();
        let mut seen = Vec::new();
        let summary = client
            .summarize(&SummarizeParams::new("f1"), |c| seen.push(c.to_string()))
            .await
            .unwrap();

        assert_eq!(summary, "Kept.");
        assert_eq!(seen, vec!["Kept."]);
    }

    /// Accept one multipart upload and answer with a file record
    async fn serve_upload() -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 8192];
            // Multipart body ends with the closing boundary "--\r\n"
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                received.extend_from_slice(&buf[..n]);
                if n == 0 || received.ends_with(b"--\r\n") {
                    break;
                }
            }
            let body = r#"{"id":"file-42","name":"clip.mp4","size":600000,"upload_time":"now"}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&received).into_owned()
        });
        (format!("http://{addr}/api"), server)
    }

    #[tokio::test]
    async fn upload_reports_progress_and_parses_file_info() {
        let (base, server) = serve_upload().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, vec![7u8; 600_000]).unwrap();

        let progress = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&progress);
        let client = BackendClient::new(&base).unwrap();
        let info = client
            .upload_file(&path, move |p| sink.lock().unwrap().push(p))
            .await
            .unwrap();

        assert_eq!(info.id, "file-42");
        let progress = progress.lock().unwrap().clone();
        assert!(progress.len() >= 3);
        assert!(progress.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(progress.last().copied(), Some(100.0));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/files"));
        assert!(request.contains("name=\"purpose\""));
        assert!(request.contains("filename=\"clip.mp4\""));
    }

    #[tokio::test]
    async fn empty_upload_reports_completion() {
        let (base, _server) = serve_upload().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.webm");
        std::fs::write(&path, b"").unwrap();

        let progress = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&progress);
        let client = BackendClient::new(&base).unwrap();
        client
            .upload_file(&path, move |p| sink.lock().unwrap().push(p))
            .await
            .unwrap();

        assert_eq!(*progress.lock().unwrap(), vec![100.0]);
    }
}
