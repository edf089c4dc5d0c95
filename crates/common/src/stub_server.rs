//! Scripted HTTP/1.1 server the store adapters are tested against.
//!
//! Each accepted connection reads one request, answers with the next canned
//! response and closes. Requests beyond the script get a 501.

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const REQUEST_ID: &str = "8a1f3c2e-0d4b-4c5e-9f6a-7b8c9d0e1f2a";
const RESPONSE_DATE: &str = "Mon, 01 Jan 2024 00:00:00 GMT";

#[derive(Debug, Clone)]
pub struct CannedResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl CannedResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\nDate: {}\r\nx-ms-request-id: {}\r\nx-ms-version: 2023-11-03\r\n",
            self.status,
            reason(self.status),
            self.body.len(),
            RESPONSE_DATE,
            REQUEST_ID
        );
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str("\r\n");
        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(self.body.as_bytes());
        bytes
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        404 => "Not Found",
        409 => "Conflict",
        _ => "Status",
    }
}

pub struct StubServer {
    endpoint: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    /// Bind an ephemeral port and serve `responses` in order
    pub async fn start(responses: Vec<CannedResponse>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let endpoint = format!("http://{}", listener.local_addr()?);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = requests.clone();
        tokio::spawn(async move {
            let mut script = responses.into_iter();
            while let Ok((mut socket, _)) = listener.accept().await {
                let request_line = match read_request(&mut socket).await {
                    Ok(line) => line,
                    Err(_) => continue,
                };
                if let Ok(mut log) = log.lock() {
                    log.push(request_line);
                }
                let response = script
                    .next()
                    .unwrap_or_else(|| CannedResponse::new(501, "unscripted request"));
                let _ = socket.write_all(&response.to_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Ok(Self { endpoint, requests })
    }

    /// `http://127.0.0.1:<port>`
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `METHOD target` of every request received so far
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

/// Read head and body, return the request line without the protocol version
async fn read_request(socket: &mut TcpStream) -> std::io::Result<String> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let read = socket.read(&mut chunk).await?;
        if read == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(position) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body_read = buffer.len() - head_end;
    while body_read < content_length {
        let read = socket.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        body_read += read;
    }

    let request_line = head.lines().next().unwrap_or_default();
    Ok(request_line
        .rsplit_once(' ')
        .map(|(line, _)| line)
        .unwrap_or(request_line)
        .to_string())
}
