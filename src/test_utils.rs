use std::io::{self, Write};
use std::net::TcpListener as StdTcpListener;
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing_subscriber::fmt::MakeWriter;

/// Small registry in the IEEE column layout, with one duplicated prefix.
pub const REGISTRY_CSV: &str = "Registry,Assignment,Organization Name,Organization Address\n\
MA-L,286FB9,Juniper Networks,\"1133 Innovation Way Sunnyvale CA US 94089\"\n\
MA-L,AABBCC,Acme,\"1 Acme Way\"\n\
MA-L,AABBCC,Acme2,\"2 Acme Way\"\n";

/// One-shot HTTP responder on a loopback port.
pub struct TestServer {
    pub url: String,
    request: oneshot::Receiver<String>,
}

impl TestServer {
    /// The raw request head the server received.
    pub async fn request(self) -> String {
        self.request.await.expect("server task dropped the request")
    }
}

/// Answer exactly one request with the given status and body.
pub async fn serve_once(status: u16, body: &'static str) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to get local address");
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("Failed to accept");

        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.expect("Failed to read request");
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {} Test\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("Failed to write response");
        let _ = socket.shutdown().await;
        let _ = tx.send(String::from_utf8_lossy(&head).into_owned());
    });

    TestServer {
        url: format!("http://{}/oui.csv", addr),
        request: rx,
    }
}

/// A loopback URL with nothing listening behind it.
pub fn unreachable_url() -> String {
    let listener = StdTcpListener::bind("127.0.0.1:0").expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to get local address");
    drop(listener);
    format!("http://{}/oui.csv", addr)
}

/// Write CSV content to a temporary file.
pub fn write_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// Shared in-memory sink for formatted log lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("log buffer poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a debug-level subscriber installed on this thread and
/// return its result together with everything it logged.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock().expect("log buffer poisoned")).into_owned();
    (result, logs)
}
