//! JSON-RPC protocol types and wire framing for the knowledge-graph service.
//!
//! Requests are `{jsonrpc, id, method, params}`; the service replies
//! `{id, result}` or `{id, error}`. Frames are `Content-Length`-prefixed
//! JSON payloads in both directions.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct GraphRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    pub params: serde_json::Value,
}

impl GraphRequest {
    pub fn new(id: u64, method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct GraphResponse {
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Write one Content-Length framed payload.
pub async fn write_frame<W>(writer: &mut W, payload: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(payload.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one Content-Length framed payload.
///
/// Returns `Ok(None)` on a clean end of stream before the next header.
pub async fn read_frame<R>(reader: &mut BufReader<R>) -> std::io::Result<Option<String>>
where
    R: AsyncReadExt + Unpin,
{
    let mut line = String::new();

    // Content-Length header, skipping any other header lines
    let content_length: usize = loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(len_str) = trimmed.strip_prefix("Content-Length:")
            && let Ok(len) = len_str.trim().parse::<usize>()
        {
            break len;
        }
    };

    // Blank line terminating the headers
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stream closed inside frame headers",
            ));
        }
        if line.trim().is_empty() {
            break;
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;

    Ok(Some(String::from_utf8_lossy(&body).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frame_round_trip() {
        let mut wire = Vec::new();
        write_frame(&mut wire, r#"{"id":1}"#).await.unwrap();
        write_frame(&mut wire, r#"{"id":2,"result":{}}"#).await.unwrap();

        let mut reader = BufReader::new(wire.as_slice());
        assert_eq!(
            read_frame(&mut reader).await.unwrap().as_deref(),
            Some(r#"{"id":1}"#)
        );
        assert_eq!(
            read_frame(&mut reader).await.unwrap().as_deref(),
            Some(r#"{"id":2,"result":{}}"#)
        );
        assert_eq!(read_frame(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn frame_handles_multibyte_payload() {
        let payload = r#"{"note":"日本語"}"#;
        let mut wire = Vec::new();
        write_frame(&mut wire, payload).await.unwrap();

        let mut reader = BufReader::new(wire.as_slice());
        assert_eq!(read_frame(&mut reader).await.unwrap().as_deref(), Some(payload));
    }

    #[test]
    fn request_serializes_jsonrpc_envelope() {
        let request = GraphRequest::new(7, "ping", serde_json::json!({}));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 7);
        assert_eq!(json["method"], "ping");
    }

    #[test]
    fn response_with_error_body_deserializes() {
        let response: GraphResponse = serde_json::from_str(
            r#"{"id": 3, "error": {"code": -32000, "message": "node not found"}}"#,
        )
        .unwrap();
        assert_eq!(response.id, Some(3));
        assert!(response.result.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.code, Some(-32000));
        assert_eq!(error.message, "node not found");
    }

    #[test]
    fn response_without_id_deserializes() {
        let response: GraphResponse =
            serde_json::from_str(r#"{"result": {"status": "ok"}}"#).unwrap();
        assert_eq!(response.id, None);
    }
}
