use std::{
    io::{self, Read, Write},
    net::{TcpListener, TcpStream},
    thread::{self, JoinHandle},
};

/// Single-request HTTP server answering with a canned response.
pub struct CannedServer {
    /// Base URL to configure the adapters with.
    pub base_url: String,
    handle: JoinHandle<io::Result<String>>,
}

impl CannedServer {
    /// Serve one request on a loopback port with `status` and a JSON `body`.
    pub fn respond(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .unwrap_or_else(|err| panic!("failed to bind loopback listener: {err}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|err| panic!("failed to read listener address: {err}"));
        let response = format!(
            "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept()?;
            let request = read_request(&mut stream)?;
            stream.write_all(response.as_bytes())?;
            stream.flush()?;
            Ok(request)
        });
        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    /// Wait for the request and return it as lossy text.
    pub fn request(self) -> String {
        self.handle
            .join()
            .unwrap_or_else(|_| panic!("canned server thread panicked"))
            .unwrap_or_else(|err| panic!("canned server failed: {err}"))
    }
}

/// Base URL of a loopback port nothing listens on.
pub fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .unwrap_or_else(|err| panic!("failed to bind loopback listener: {err}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|err| panic!("failed to read listener address: {err}"));
    drop(listener);
    format!("http://{addr}")
}

fn read_request(stream: &mut TcpStream) -> io::Result<String> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let read = stream.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
        if request_complete(&buffer) {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn request_complete(buffer: &[u8]) -> bool {
    let Some(head_end) = buffer.windows(4).position(|window| window == b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&buffer[..head_end]).to_ascii_lowercase();
    let body_len = buffer.len() - head_end - 4;
    let content_length = head.lines().find_map(|line| {
        line.strip_prefix("content-length:")
            .and_then(|value| value.trim().parse::<usize>().ok())
    });
    match content_length {
        Some(expected) => body_len >= expected,
        None if head.contains("transfer-encoding: chunked") => buffer.ends_with(b"0\r\n\r\n"),
        None => true,
    }
}
