use super::{io_error, DnsTransport, TransportResponse};
use async_trait::async_trait;
use ferrous_dsync_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

/// Large enough for any answer to an EDNS(0) query
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// DNS over UDP, one connected socket per exchange.
pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    async fn send_once(&self, message_bytes: &[u8]) -> Result<TransportResponse, DomainError> {
        let bind_addr: SocketAddr = if self.server_addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| io_error(self.server_addr, "bind UDP socket for", e))?;
        // Connected sockets only accept datagrams from the server and
        // surface ICMP port-unreachable as ConnectionRefused
        socket
            .connect(self.server_addr)
            .await
            .map_err(|e| io_error(self.server_addr, "connect UDP socket to", e))?;

        let bytes_sent = socket
            .send(message_bytes)
            .await
            .map_err(|e| io_error(self.server_addr, "send UDP message to", e))?;
        debug!(server = %self.server_addr, bytes_sent, "UDP message sent");

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let bytes_received = socket
            .recv(&mut recv_buf)
            .await
            .map_err(|e| io_error(self.server_addr, "receive UDP response from", e))?;
        recv_buf.truncate(bytes_received);
        debug!(server = %self.server_addr, bytes_received, "UDP response received");

        Ok(TransportResponse {
            bytes: recv_buf,
            protocol_used: "UDP",
        })
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
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
