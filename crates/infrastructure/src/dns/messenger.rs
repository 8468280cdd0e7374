use super::response_parser::{DnsResponse, ResponseParser};
use super::transport;
use super::MessageBuilder;
use crate::crypto::{sign_message, unix_now};
use async_trait::async_trait;
use ferrous_dsync_application::ports::{DnsMessenger, QueryResponse};
use ferrous_dsync_domain::{
    DomainError, RecordType, Sig0ActiveKeys, TargetStatus, UpdateMessage, UpdateResult,
};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// [`DnsMessenger`] over UDP/TCP with `hickory-proto` encoding.
pub struct HickoryDnsMessenger {
    timeout: Duration,
    sig0_validity: u32,
}

impl HickoryDnsMessenger {
    pub fn new(timeout: Duration, sig0_validity: u32) -> Self {
        Self {
            timeout,
            sig0_validity,
        }
    }

    async fn exchange(&self, server: &str, bytes: &[u8], id: u16) -> Result<DnsResponse, DomainError> {
        let addr: SocketAddr = server.parse().map_err(|e| {
            DomainError::Configuration(format!("'{}' is not an ip:port address: {}", server, e))
        })?;
        let response = transport::exchange(addr, bytes, self.timeout).await?;
        let parsed = ResponseParser::parse(&response.bytes)?;
        if parsed.id != id {
            return Err(DomainError::InvalidDnsResponse(format!(
                "response id {} from {} does not match {}",
                parsed.id, server, id
            )));
        }
        debug!(server, protocol = response.protocol_used, rcode = %parsed.rcode, "DNS exchange complete");
        Ok(parsed)
    }

    /// Tries each target in order and stops at the first NOERROR.
    async fn fan_out(
        &self,
        zone: &str,
        kind: &'static str,
        bytes: &[u8],
        id: u16,
        targets: &[String],
    ) -> Result<UpdateResult, DomainError> {
        let mut result = UpdateResult::default();
        for target in targets {
            match self.exchange(target, bytes, id).await {
                Ok(response) => {
                    let accepted = response.rcode.is_success();
                    let status = TargetStatus {
                        rcode: Some(response.rcode),
                        error: !accepted,
                        error_msg: (!accepted)
                            .then(|| format!("{} answered {}", kind, response.rcode)),
                        ..Default::default()
                    }
                    .with_ede(response.ede, target);
                    result.rcode = Some(response.rcode);
                    result.record(target, status);
                    if accepted {
                        info!(zone, target = %target, "{} accepted", kind);
                        return Ok(result);
                    }
                    warn!(zone, target = %target, rcode = %response.rcode, "{} rejected", kind);
                }
                Err(e) => {
                    warn!(zone, target = %target, error = %e, "{} not delivered", kind);
                    result.record(
                        target,
                        TargetStatus {
                            error: true,
                            error_msg: Some(e.to_string()),
                            ..Default::default()
                        },
                    );
                }
            }
        }
        Err(DomainError::AllTargetsFailed {
            zone: zone.to_string(),
            result,
        })
    }
}

#[async_trait]
impl DnsMessenger for HickoryDnsMessenger {
    #[instrument(skip(self))]
    async fn query(
        &self,
        server: &str,
        qname: &str,
        qtype: RecordType,
    ) -> Result<QueryResponse, DomainError> {
        let (id, bytes) = MessageBuilder::build_query(qname, qtype)?;
        let response = self.exchange(server, &bytes, id).await?;
        Ok(response.into_query_response(server))
    }

    #[instrument(skip(self, msg, keys), fields(zone = %msg.zone, actions = msg.actions.len(), keys = keys.keys.len()))]
    async fn send_update(
        &self,
        msg: &UpdateMessage,
        keys: &Sig0ActiveKeys,
        targets: &[String],
    ) -> Result<UpdateResult, DomainError> {
        let (id, mut bytes) = MessageBuilder::build_update(msg)?;
        if !keys.is_empty() {
            bytes = sign_message(&bytes, keys, self.sig0_validity, unix_now())?;
        }
        self.fan_out(&msg.zone, "UPDATE", &bytes, id, targets).await
    }

    #[instrument(skip(self))]
    async fn send_notify(
        &self,
        zone: &str,
        rrtype: RecordType,
        targets: &[String],
    ) -> Result<UpdateResult, DomainError> {
        let (id, bytes) = MessageBuilder::build_notify(zone, rrtype)?;
        self.fan_out(zone, "NOTIFY", &bytes, id, targets).await
    }

    #[instrument(skip(self))]
    async fn resolve_host(&self, host: &str, port: u16) -> Result<Vec<String>, DomainError> {
        let host = host.trim_end_matches('.');
        let addrs = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| DomainError::IoError(format!("cannot resolve {}: {}", host, e)))?;
        let mut out: Vec<String> = Vec::new();
        for addr in addrs {
            let addr = addr.to_string();
            if !out.contains(&addr) {
                out.push(addr);
            }
        }
        Ok(out)
    }
}
