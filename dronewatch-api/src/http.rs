//! ## dronewatch-api::http
//! **Minimal HTTP/1.1 framing**
//!
//! One request per connection: start line, headers, an optional
//! `Content-Length` body, then `Connection: close`. Chunked transfer
//! encoding and keep-alive are not supported.

use std::collections::HashMap;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::HttpError;
use crate::schema::ErrorBody;

/// Upper bound on the start line plus all header lines.
pub const MAX_HEAD_BYTES: usize = 16 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Upper case, as sent.
    pub method: String,
    /// Decoded path without the query string.
    pub path: String,
    pub query: HashMap<String, String>,
    /// Header names are lower case.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: &str, target: &str) -> Self {
        let (path, query) = split_target(target);
        Self {
            method: method.to_ascii_uppercase(),
            path,
            query,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Serialises `value`; a serialisation failure becomes a 500.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::empty(status)
                .with_header("Content-Type", "application/json")
                .with_body(body),
            Err(e) => {
                tracing::error!("Failed to serialise response body: {}", e);
                Self::error(500, "Internal Server Error")
            }
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let body = serde_json::to_vec(&ErrorBody::new(message)).unwrap_or_default();
        Self::empty(status)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Reads one request. `Ok(None)` means the peer closed before sending
/// anything.
pub async fn read_request<R>(reader: &mut R, max_body: usize) -> Result<Option<Request>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let Some((start, headers)) = read_head(reader).await? else {
        return Ok(None);
    };

    let mut parts = start.split_whitespace();
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(HttpError::BadStartLine(start));
    };
    if !version.starts_with("HTTP/1.") {
        return Err(HttpError::BadStartLine(start));
    }

    let mut request = Request::new(method, target);
    let length = content_length(&headers)?.unwrap_or(0);
    request.body = read_body(reader, length, max_body).await?;
    request.headers = headers;
    Ok(Some(request))
}

pub async fn write_response<W>(writer: &mut W, response: &Response) -> Result<(), HttpError>
where
    W: AsyncWrite + Unpin,
{
    let mut head = format!(
        "HTTP/1.1 {} {}\r\n",
        response.status,
        reason_phrase(response.status)
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
    head.push_str("Connection: close\r\n\r\n");

    writer.write_all(head.as_bytes()).await?;
    writer.write_all(&response.body).await?;
    writer.flush().await?;
    Ok(())
}

/// Writes a request for `target` (path plus optional query string).
pub async fn write_request<W>(
    writer: &mut W,
    method: &str,
    host: &str,
    target: &str,
    body: &[u8],
) -> Result<(), HttpError>
where
    W: AsyncWrite + Unpin,
{
    let mut head = format!("{} {} HTTP/1.1\r\n", method, target);
    head.push_str(&format!("Host: {}\r\n", host));
    head.push_str("Accept: application/json\r\n");
    if !body.is_empty() {
        head.push_str("Content-Type: application/json\r\n");
    }
    head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    head.push_str("Connection: close\r\n\r\n");

    writer.write_all(head.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads a response. Without `Content-Length` the body runs to end of stream.
pub async fn read_response<R>(reader: &mut R, max_body: usize) -> Result<Response, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let (start, headers) = read_head(reader).await?.ok_or(HttpError::UnexpectedEof)?;

    let mut parts = start.splitn(3, ' ');
    let status = match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/1.") => code
            .parse::<u16>()
            .map_err(|_| HttpError::BadStartLine(start.clone()))?,
        _ => return Err(HttpError::BadStartLine(start)),
    };

    let body = match content_length(&headers)? {
        Some(length) => read_body(reader, length, max_body).await?,
        None => {
            let mut body = Vec::new();
            reader
                .take(max_body as u64 + 1)
                .read_to_end(&mut body)
                .await?;
            if body.len() > max_body {
                return Err(HttpError::BodyTooLarge(max_body));
            }
            body
        }
    };

    Ok(Response {
        status,
        headers: headers.into_iter().collect(),
        body,
    })
}

async fn read_head<R>(
    reader: &mut R,
) -> Result<Option<(String, HashMap<String, String>)>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut consumed = 0usize;
    let mut line = String::new();

    // Tolerate stray CRLF before the start line.
    let start = loop {
        line.clear();
        let read = read_head_line(reader, &mut line, &mut consumed).await?;
        if read == 0 {
            return if consumed == 0 {
                Ok(None)
            } else {
                Err(HttpError::UnexpectedEof)
            };
        }
        let trimmed = line.trim_end_matches(&['\r', '\n'][..]);
        if !trimmed.is_empty() {
            break trimmed.to_string();
        }
    };

    let mut headers = HashMap::new();
    loop {
        line.clear();
        let read = read_head_line(reader, &mut line, &mut consumed).await?;
        if read == 0 {
            return Err(HttpError::UnexpectedEof);
        }
        let trimmed = line.trim_end_matches(&['\r', '\n'][..]);
        if trimmed.is_empty() {
            break;
        }
        let (name, value) = trimmed
            .split_once(':')
            .ok_or_else(|| HttpError::BadHeader(trimmed.to_string()))?;
        headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    Ok(Some((start, headers)))
}

/// Reads one line without ever pulling more than one byte past the head
/// budget out of `reader`.
async fn read_head_line<R>(
    reader: &mut R,
    line: &mut String,
    consumed: &mut usize,
) -> Result<usize, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let budget = MAX_HEAD_BYTES.saturating_sub(*consumed) as u64 + 1;
    let read = (&mut *reader).take(budget).read_line(line).await?;
    *consumed += read;
    if *consumed > MAX_HEAD_BYTES {
        return Err(HttpError::HeadersTooLarge(MAX_HEAD_BYTES));
    }
    Ok(read)
}

fn content_length(headers: &HashMap<String, String>) -> Result<Option<usize>, HttpError> {
    headers
        .get("content-length")
        .map(|v| v.parse::<usize>().map_err(|_| HttpError::BadContentLength))
        .transpose()
}

async fn read_body<R>(reader: &mut R, length: usize, max_body: usize) -> Result<Vec<u8>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    if length > max_body {
        return Err(HttpError::BodyTooLarge(max_body));
    }
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            HttpError::UnexpectedEof
        } else {
            HttpError::Io(e)
        }
    })?;
    Ok(body)
}

fn split_target(target: &str) -> (String, HashMap<String, String>) {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let query = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(k), percent_decode(v))
        })
        .collect();
    (percent_decode(path), query)
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                {
                    Some(byte) => {
                        out.push(byte);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn parses_request_with_query_and_body() {
        let raw = b"POST /api/v1/detections?page=2&limit=5 HTTP/1.1\r\n\
                    Host: localhost\r\n\
                    Content-Type: application/json\r\n\
                    Content-Length: 4\r\n\
                    \r\n\
                    {}\r\n";
        let mut reader = BufReader::new(&raw[..]);
        let request = read_request(&mut reader, 1024).await.unwrap().unwrap();

        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/api/v1/detections");
        assert_eq!(request.query.get("page").map(String::as_str), Some("2"));
        assert_eq!(request.query.get("limit").map(String::as_str), Some("5"));
        assert_eq!(
            request.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(request.body, b"{}\r\n");
    }

    #[tokio::test]
    async fn closed_connection_yields_none() {
        let mut reader = BufReader::new(&b""[..]);
        assert!(read_request(&mut reader, 1024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_oversized_body() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 2048\r\n\r\n";
        let mut reader = BufReader::new(&raw[..]);
        let err = read_request(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, HttpError::BodyTooLarge(1024)));
    }

    #[tokio::test]
    async fn endless_start_line_stops_at_head_limit() {
        const SENT: u64 = 64 * 1024 * 1024;
        let mut reader = BufReader::new(tokio::io::repeat(b'a').take(SENT));

        let err = read_request(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, HttpError::HeadersTooLarge(MAX_HEAD_BYTES)));

        // At most the head budget plus one buffer refill left the source.
        let pulled = SENT - reader.get_ref().limit();
        assert!(pulled <= (MAX_HEAD_BYTES + 1 + 8 * 1024) as u64, "pulled {pulled} bytes");
    }

    #[tokio::test]
    async fn endless_header_line_stops_at_head_limit() {
        let head = tokio::io::AsyncReadExt::chain(
            &b"GET / HTTP/1.1\r\nX-Filler: "[..],
            tokio::io::repeat(b'b').take(1024 * 1024),
        );
        let mut reader = BufReader::new(head);
        let err = read_request(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, HttpError::HeadersTooLarge(MAX_HEAD_BYTES)));
    }

    #[tokio::test]
    async fn truncated_body_is_unexpected_eof() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc";
        let mut reader = BufReader::new(&raw[..]);
        let err = read_request(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, HttpError::UnexpectedEof));
    }

    #[tokio::test]
    async fn rejects_garbage_start_line() {
        let raw = b"hello\r\n\r\n";
        let mut reader = BufReader::new(&raw[..]);
        let err = read_request(&mut reader, 1024).await.unwrap_err();
        assert!(matches!(err, HttpError::BadStartLine(_)));
    }

    #[tokio::test]
    async fn response_survives_the_wire() {
        let response = Response::error(404, "Detection not found")
            .with_header("Access-Control-Allow-Origin", "*");

        let mut wire = Vec::new();
        write_response(&mut wire, &response).await.unwrap();
        let text = String::from_utf8(wire.clone()).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Connection: close\r\n"));

        let mut reader = BufReader::new(&wire[..]);
        let parsed = read_response(&mut reader, 1024).await.unwrap();
        assert_eq!(parsed.status, 404);
        assert_eq!(parsed.header("access-control-allow-origin"), Some("*"));
        assert_eq!(parsed.body, br#"{"error":"Detection not found"}"#);
    }

    #[tokio::test]
    async fn request_survives_the_wire() {
        let mut wire = Vec::new();
        write_request(
            &mut wire,
            "POST",
            "127.0.0.1:8080",
            "/api/v1/detections?page=1",
            b"{\"a\":1}",
        )
        .await
        .unwrap();

        let mut reader = BufReader::new(&wire[..]);
        let parsed = read_request(&mut reader, 1024).await.unwrap().unwrap();
        assert_eq!(parsed.method, "POST");
        assert_eq!(parsed.path, "/api/v1/detections");
        assert_eq!(parsed.query["page"], "1");
        assert_eq!(parsed.body, b"{\"a\":1}");
        assert_eq!(
            parsed.headers.get("host").map(String::as_str),
            Some("127.0.0.1:8080")
        );
    }

    #[test]
    fn decodes_percent_escapes() {
        let (path, query) = split_target("/a%20b?name=Hangar+2&x=%2F&broken=%zz");
        assert_eq!(path, "/a b");
        assert_eq!(query["name"], "Hangar 2");
        assert_eq!(query["x"], "/");
        assert_eq!(query["broken"], "%zz");
    }
}
