use super::{io_error, DnsTransport, TransportResponse};
use async_trait::async_trait;
use ferrous_dsync_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// DNS over TCP with the two-byte length prefix of RFC 1035 4.2.2.
pub struct TcpTransport {
    server_addr: SocketAddr,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    async fn send_once(&self, message_bytes: &[u8]) -> Result<TransportResponse, DomainError> {
        let length = u16::try_from(message_bytes.len()).map_err(|_| {
            DomainError::InvalidRecord(format!(
                "message of {} bytes does not fit a TCP frame",
                message_bytes.len()
            ))
        })?;

        let mut stream = TcpStream::connect(self.server_addr)
            .await
            .map_err(|e| io_error(self.server_addr, "connect TCP to", e))?;

        let mut frame = Vec::with_capacity(message_bytes.len() + 2);
        frame.extend_from_slice(&length.to_be_bytes());
        frame.extend_from_slice(message_bytes);
        stream
            .write_all(&frame)
            .await
            .map_err(|e| io_error(self.server_addr, "send TCP message to", e))?;
        debug!(server = %self.server_addr, bytes_sent = frame.len(), "TCP message sent");

        let mut len_buf = [0u8; 2];
        stream
            .read_exact(&mut len_buf)
            .await
            .map_err(|e| io_error(self.server_addr, "read TCP length from", e))?;
        let mut response = vec![0u8; u16::from_be_bytes(len_buf) as usize];
        stream
            .read_exact(&mut response)
            .await
            .map_err(|e| io_error(self.server_addr, "read TCP response from", e))?;
        debug!(server = %self.server_addr, bytes_received = response.len(), "TCP response received");

        Ok(TransportResponse {
            bytes: response,
            protocol_used: "TCP",
        })
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        tokio::time::timeout(timeout, self.send_once(message_bytes))
            .await
            .map_err(|_| DomainError::TransportTimeout(self.server_addr.to_string()))?
    }
}
