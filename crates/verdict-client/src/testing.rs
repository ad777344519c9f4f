use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// HTTP server announcing a longer body than it sends, then closing the connection.
pub struct TruncatedBodyServer {
    address: SocketAddr,
}

impl TruncatedBodyServer {
    const HEAD: &'static [u8] =
        b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\nconnection: close\r\n\r\n";
    const BODY: &'static [u8] = b"{\"data\":";

    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(Self::respond(socket));
            }
        });

        Self { address }
    }

    pub fn url(&self) -> String {
        format!("http://{}/graphql", self.address)
    }

    async fn respond(mut socket: TcpStream) {
        Self::read_request(&mut socket).await;

        let _ = socket.write_all(Self::HEAD).await;
        let _ = socket.write_all(Self::BODY).await;
        let _ = socket.flush().await;
        let _ = socket.shutdown().await;
    }

    /// Reads the head and the `content-length` bytes of body, so closing does not reset the connection.
    async fn read_request(socket: &mut TcpStream) {
        let mut request = Vec::new();
        let mut buffer = [0u8; 4096];

        loop {
            let Ok(read) = socket.read(&mut buffer).await else { return };
            if read == 0 {
                return;
            }
            request.extend_from_slice(&buffer[..read]);

            let Some(head_end) = request.windows(4).position(|window| window == b"\r\n\r\n") else { continue };
            let head = String::from_utf8_lossy(&request[..head_end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);

            if request.len() >= head_end + 4 + length {
                return;
            }
        }
    }
}
