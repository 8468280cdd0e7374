pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use ferrous_dsync_domain::DomainError;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::debug;

/// Result of a raw DNS transport operation
#[derive(Debug)]
pub struct TransportResponse {
    /// Raw DNS response bytes (wire format)
    pub bytes: Vec<u8>,
    /// Which protocol was used
    pub protocol_used: &'static str,
}

/// Trait for sending raw DNS messages over the wire
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError>;
}

/// UDP first; a truncated answer is fetched again over TCP.
pub async fn exchange(
    server: SocketAddr,
    message_bytes: &[u8],
    timeout: Duration,
) -> Result<TransportResponse, DomainError> {
    let response = udp::UdpTransport::new(server)
        .send(message_bytes, timeout)
        .await?;
    if is_truncated(&response.bytes) {
        debug!(server = %server, "Truncated UDP response, retrying over TCP");
        return tcp::TcpTransport::new(server)
            .send(message_bytes, timeout)
            .await;
    }
    Ok(response)
}

fn is_truncated(bytes: &[u8]) -> bool {
    bytes.get(2).map(|flags| flags & 0x02 != 0).unwrap_or(false)
}

pub(crate) fn io_error(server: SocketAddr, action: &str, e: io::Error) -> DomainError {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => DomainError::TransportConnectionRefused(server.to_string()),
        io::ErrorKind::TimedOut => DomainError::TransportTimeout(server.to_string()),
        _ => DomainError::IoError(format!("{} {}: {}", action, server, e)),
    }
}
