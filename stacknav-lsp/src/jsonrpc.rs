//! JSON-RPC 2.0 wire types and `Content-Length` framing.
//!
//! Language servers exchange JSON-RPC messages wrapped in an HTTP-like header
//! block: `Content-Length: N\r\n\r\n` followed by exactly `N` bytes of UTF-8
//! JSON. Other headers (`Content-Type`) are accepted and ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::LspError;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request (or notification when `id` is `None`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

/// A raw incoming message that can be classified as a response, a
/// notification, or a request from the server.
///
/// Servers may use string ids for their own requests, so `id` stays a raw
/// JSON value here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl IncomingMessage {
    /// A response has no `method`.
    pub fn is_response(&self) -> bool {
        self.method.is_none() && self.id.is_some()
    }

    /// A notification has a `method` but no `id`.
    pub fn is_notification(&self) -> bool {
        self.method.is_some() && self.id.is_none()
    }

    /// A request from the server has both `method` and `id`.
    pub fn is_server_request(&self) -> bool {
        self.method.is_some() && self.id.is_some()
    }

    /// Convert into a [`Response`] (only meaningful when [`Self::is_response`]).
    pub fn into_response(self) -> Response {
        Response {
            jsonrpc: self.jsonrpc,
            result: self.result,
            error: self.error,
            id: self.id.unwrap_or(Value::Null),
        }
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

/// Serialize `message` and write it with a `Content-Length` header.
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<(), LspError>
where
    W: AsyncWrite + Unpin + ?Sized,
    T: Serialize,
{
    let body = serde_json::to_vec(message)?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message body. Returns `Ok(None)` on a clean EOF before
/// any header byte.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<String>, LspError>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut content_length: Option<usize> = None;
    let mut line = String::new();
    let mut saw_header = false;

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            if saw_header {
                return Err(LspError::Framing("EOF inside header block".to_string()));
            }
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            if saw_header {
                break;
            }
            // Stray blank line between messages.
            continue;
        }
        saw_header = true;
        if let Some((name, value)) = trimmed.split_once(':')
            && name.trim().eq_ignore_ascii_case("content-length")
        {
            let parsed = value.trim().parse::<usize>().map_err(|_| {
                LspError::Framing(format!("invalid Content-Length: {}", value.trim()))
            })?;
            content_length = Some(parsed);
        }
    }

    let length = content_length
        .ok_or_else(|| LspError::Framing("missing Content-Length header".to_string()))?;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    String::from_utf8(body)
        .map(Some)
        .map_err(|e| LspError::Framing(format!("body is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_message_classification() {
        let msg: IncomingMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":null}"#).unwrap();
        assert!(msg.is_response());
        assert!(!msg.is_notification());

        let msg: IncomingMessage = serde_json::from_str(
            r#"{"jsonrpc":"2.0","method":"window/logMessage","params":{"type":3,"message":"hi"}}"#,
        )
        .unwrap();
        assert!(msg.is_notification());
        assert!(!msg.is_server_request());

        let msg: IncomingMessage = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":"abc","method":"workspace/configuration","params":{"items":[]}}"#,
        )
        .unwrap();
        assert!(msg.is_server_request());
        assert!(!msg.is_response());
    }

    #[test]
    fn test_notification_has_no_id() {
        let req = Request {
            jsonrpc: "2.0".to_string(),
            method: "initialized".to_string(),
            params: Some(serde_json::json!({})),
            id: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("\"id\""));
    }

    #[test]
    fn test_rpc_error_display() {
        let err = RpcError {
            code: -32601,
            message: "Unhandled method".to_string(),
            data: None,
        };
        assert_eq!(format!("{err}"), "RPC error -32601: Unhandled method");
    }

    #[tokio::test]
    async fn test_write_then_read_framed_message() {
        let req = Request {
            jsonrpc: "2.0".to_string(),
            method: "workspace/symbol".to_string(),
            params: Some(serde_json::json!({"query": "MyClass"})),
            id: Some(7),
        };
        let mut buf: Vec<u8> = Vec::new();
        write_message(&mut buf, &req).await.unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("Content-Length: "));

        let mut reader = &buf[..];
        let body = read_message(&mut reader).await.unwrap().unwrap();
        let parsed: Request = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.method, "workspace/symbol");
        assert_eq!(parsed.id, Some(7));
        assert!(read_message(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_ignores_extra_headers() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":[]}"#;
        let raw = format!(
            "Content-Type: application/vscode-jsonrpc; charset=utf-8\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let mut reader = raw.as_bytes();
        let read = read_message(&mut reader).await.unwrap();
        assert_eq!(read.as_deref(), Some(body));
    }

    #[tokio::test]
    async fn test_missing_content_length_is_framing_error() {
        let mut reader = "Content-Type: x\r\n\r\n{}".as_bytes();
        let err = read_message(&mut reader).await.unwrap_err();
        assert!(matches!(err, LspError::Framing(_)));
    }
}
