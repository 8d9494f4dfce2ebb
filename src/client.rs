use bytes::Bytes;
use futures::Stream;
use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use std::env;
use std::pin::Pin;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{ChatCompletionChunk, ChatCompletionParams};

const DEFAULT_API_URL: &str = "https://open.bigmodel.cn/api/paas/v4/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable consulted when no API key is passed explicitly.
pub const API_KEY_ENV: &str = "ZHIPU_API_KEY";

/// Client for the ZhipuAI chat-completion API.
#[derive(Debug, Clone)]
pub struct Zhipu {
    api_key: String,
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
}

impl Zhipu {
    /// Create a new Zhipu client.
    ///
    /// The API key can be provided directly or read from the ZHIPU_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV).map_err(|_| {
                Error::authentication(format!(
                    "API key not provided and {API_KEY_ENV} environment variable not set"
                ))
            })?,
        };

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout,
        })
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let bearer = format!("Bearer {}", self.api_key);
        let mut auth = HeaderValue::from_str(&bearer).map_err(|_| {
            Error::authentication("API key contains characters invalid in a header")
        })?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        // Get headers we might need for error processing
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        // Try to parse error response body
        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            code: Option<String>,
            message: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        // Try to parse as JSON first
        let parsed_error = serde_json::from_str::<ErrorResponse>(&error_body).ok();
        let error_code = parsed_error
            .as_ref()
            .and_then(|e| e.error.as_ref())
            .and_then(|e| e.code.clone());
        let error_message = parsed_error
            .as_ref()
            .and_then(|e| e.error.as_ref())
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| error_body.clone());

        // Map HTTP status code to appropriate error type
        match status_code {
            400 => Error::bad_request(error_message, None),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message),
            408 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message, request_id),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_code, error_message, request_id),
        }
    }

    /// Request a chat completion and get a streaming response.
    ///
    /// Returns a stream of ChatCompletionChunk objects that can be consumed
    /// incrementally. The stream terminates when the server sends its
    /// `[DONE]` marker; transport and decoding failures surface as `Err`
    /// items. Dropping the stream releases the connection.
    pub async fn stream(
        &self,
        mut params: ChatCompletionParams,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>> {
        params.stream = true;

        let url = format!("{}chat/completions", self.base_url);

        let mut headers = self.default_headers()?;
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        // Get the byte stream from the response
        let stream = response.bytes_stream();

        // Create an SSE processor
        let chunk_stream = process_sse(stream);

        Ok(Box::pin(chunk_stream))
    }
}

/// One decoded server-sent-event frame.
enum SseFrame {
    /// A data frame carrying a chunk, or a decode failure for that frame.
    Chunk(Result<ChatCompletionChunk>),
    /// The `[DONE]` end-of-stream marker.
    Done,
    /// A frame without a data field (comments, keep-alives).
    Empty,
}

/// Process a stream of bytes into a stream of chat-completion chunks
fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result.map_err(|e| {
            Error::streaming(format!("Error in HTTP stream: {}", e), Some(Box::new(e)))
        })
    });

    // Use a state machine to process the SSE stream. `pending` holds the
    // bytes of a UTF-8 character split across network reads.
    let buffer = String::new();
    let pending: Vec<u8> = Vec::new();

    stream::unfold(
        (stream, buffer, pending),
        move |(mut stream, mut buffer, mut pending)| async move {
            loop {
                // First check if we have a complete frame in the buffer
                if let Some((frame, remaining)) = extract_frame(&buffer) {
                    buffer = remaining;
                    match frame {
                        SseFrame::Done => return None,
                        SseFrame::Empty => continue,
                        SseFrame::Chunk(item) => return Some((item, (stream, buffer, pending))),
                    }
                }

                // Read more data
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        pending.extend_from_slice(&bytes);
                        match decode_pending(&mut pending) {
                            Ok(text) => buffer.push_str(&text),
                            Err(e) => {
                                return Some((Err(e), (stream, buffer, pending)));
                            }
                        }
                    }
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, buffer, pending)));
                    }
                    None => {
                        if !pending.is_empty() {
                            pending.clear();
                            return Some((
                                Err(Error::encoding(
                                    "Truncated UTF-8 character at end of stream",
                                    None,
                                )),
                                (stream, buffer, pending),
                            ));
                        }
                        // End of stream; a trailing frame may lack the
                        // blank-line terminator.
                        if !buffer.trim().is_empty() {
                            let frame = parse_frame(&buffer);
                            buffer.clear();
                            if let SseFrame::Chunk(item) = frame {
                                return Some((item, (stream, buffer, pending)));
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

/// Decodes the complete UTF-8 prefix of `pending`, leaving the bytes of a
/// trailing split character behind for the next read.
///
/// Bytes that can never form a valid character are an error; a sequence
/// that is merely incomplete is not.
fn decode_pending(pending: &mut Vec<u8>) -> Result<String> {
    match String::from_utf8(std::mem::take(pending)) {
        Ok(text) => Ok(text),
        Err(err) => {
            let utf8_err = err.utf8_error();
            if utf8_err.error_len().is_some() {
                return Err(Error::encoding(
                    format!("Invalid UTF-8 in stream: {}", utf8_err),
                    Some(Box::new(utf8_err)),
                ));
            }
            let mut bytes = err.into_bytes();
            *pending = bytes.split_off(utf8_err.valid_up_to());
            // Everything before valid_up_to decodes losslessly.
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

/// Extract a complete SSE frame from a buffer string
fn extract_frame(buffer: &str) -> Option<(SseFrame, String)> {
    // Simple SSE parsing - each frame is delimited by double newlines
    let parts: Vec<&str> = buffer.splitn(2, "\n\n").collect();
    if parts.len() != 2 {
        return None;
    }

    let frame = parse_frame(parts[0]);
    let rest = parts[1].to_string();
    Some((frame, rest))
}

/// Parse the text of one SSE frame
fn parse_frame(frame_text: &str) -> SseFrame {
    let mut data = None;
    for line in frame_text.lines() {
        if let Some(value) = line.strip_prefix("data:") {
            data = Some(value.trim_start());
        }
    }

    match data {
        Some("[DONE]") => SseFrame::Done,
        Some(json_str) => match serde_json::from_str::<ChatCompletionChunk>(json_str) {
            Ok(chunk) => SseFrame::Chunk(Ok(chunk)),
            Err(e) => SseFrame::Chunk(Err(Error::serialization(
                format!("Failed to parse chunk JSON: {}", e),
                Some(Box::new(e)),
            ))),
        },
        None => SseFrame::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(body: &'static [u8]) -> Vec<Result<ChatCompletionChunk>> {
        let bytes: Vec<std::result::Result<Bytes, reqwest::Error>> =
            vec![Ok(Bytes::from_static(body))];
        let byte_stream = stream::iter(bytes);
        futures::executor::block_on_stream(Box::pin(process_sse(byte_stream))).collect()
    }

    #[test]
    fn client_creation() {
        let client = Zhipu::new(Some("test-key".to_string())).unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, DEFAULT_API_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);

        let client = Zhipu::with_options(
            Some("test-key".to_string()),
            Some("https://custom-api.example.com/".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://custom-api.example.com/");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn decodes_data_frames_until_done() {
        let items = collect(
            b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hel\"}}]}\n\n\
              data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo\"}}]}\n\n\
              data: [DONE]\n\n",
        );
        let texts: Vec<String> = items
            .into_iter()
            .map(|item| item.unwrap().delta_text().to_string())
            .collect();
        assert_eq!(texts, vec!["Hel", "lo"]);
    }

    #[test]
    fn nothing_after_done_is_decoded() {
        let items = collect(
            b"data: [DONE]\n\n\
              data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"late\"}}]}\n\n",
        );
        assert!(items.is_empty());
    }

    #[test]
    fn frames_without_data_are_skipped() {
        let items = collect(
            b": keep-alive\n\n\
              data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"x\"}}]}\n\n\
              data: [DONE]\n\n",
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().delta_text(), "x");
    }

    #[test]
    fn malformed_json_is_an_err_item() {
        let items = collect(
            b"data: {not json}\n\n\
              data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"ok\"}}]}\n\n\
              data: [DONE]\n\n",
        );
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Err(Error::Serialization { .. })));
        assert_eq!(items[1].as_ref().unwrap().delta_text(), "ok");
    }

    #[test]
    fn frame_split_across_reads() {
        let bytes: Vec<std::result::Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::from_static(b"data: {\"choices\":[{\"index\":0,")),
            Ok(Bytes::from_static(
                b"\"delta\":{\"content\":\"joined\"}}]}\n\ndata: [DONE]\n\n",
            )),
        ];
        let items: Vec<_> =
            futures::executor::block_on_stream(Box::pin(process_sse(stream::iter(bytes))))
                .collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().delta_text(), "joined");
    }

    #[test]
    fn character_split_across_reads() {
        // "你" is E4 BD A0; the read boundary falls inside it.
        let bytes: Vec<std::result::Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::from_static(
                b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"\xe4\xbd",
            )),
            Ok(Bytes::from_static(b"\xa0\xe5\xa5\xbd\"}}]}\n\ndata: [DONE]\n\n")),
        ];
        let items: Vec<_> =
            futures::executor::block_on_stream(Box::pin(process_sse(stream::iter(bytes))))
                .collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().delta_text(), "你好");
    }

    #[test]
    fn invalid_bytes_are_an_err_item() {
        let items = collect(b"\xff\xfe");
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(Error::Encoding { .. })));
    }

    #[test]
    fn truncated_character_at_end_of_stream() {
        // A lone UTF-8 lead byte with nothing to complete it; the decoded
        // prefix still goes through trailing-frame parsing afterwards.
        let items = collect(b"data: ignored\xe4");
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Err(Error::Encoding { .. })));
        assert!(matches!(items[1], Err(Error::Serialization { .. })));
    }

    #[test]
    fn decode_pending_keeps_split_tail() {
        let mut pending = b"ab\xe4\xbd".to_vec();
        let text = decode_pending(&mut pending).unwrap();
        assert_eq!(text, "ab");
        assert_eq!(pending, b"\xe4\xbd");

        pending.push(0xa0);
        let text = decode_pending(&mut pending).unwrap();
        assert_eq!(text, "你");
        assert!(pending.is_empty());
    }

    #[test]
    fn trailing_frame_without_terminator() {
        let items =
            collect(b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"tail\"}}]}");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().delta_text(), "tail");
    }
}
