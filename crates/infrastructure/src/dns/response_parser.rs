//! Parses raw DNS responses into the domain record model.

use super::codec::from_hickory;
use ferrous_dsync_application::ports::QueryResponse;
use ferrous_dsync_domain::{DomainError, ExtendedError, Rcode, ResourceRecord};
use hickory_proto::op::Message;
use hickory_proto::rr::rdata::opt::{EdnsCode, EdnsOption};
use hickory_proto::rr::Record;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DnsResponse {
    pub id: u16,
    pub rcode: Rcode,
    pub truncated: bool,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
    pub ede: Option<ExtendedError>,
}

impl DnsResponse {
    pub fn into_query_response(self, server: &str) -> QueryResponse {
        QueryResponse {
            server: server.to_string(),
            rcode: self.rcode,
            answers: self.answers,
            authority: self.authority,
            additional: self.additional,
            ede: self.ede,
        }
    }
}

pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(bytes: &[u8]) -> Result<DnsResponse, DomainError> {
        let message = Message::from_vec(bytes).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("Failed to parse DNS response: {}", e))
        })?;

        let ede = message
            .extensions()
            .as_ref()
            .and_then(|edns| edns.option(EdnsCode::from(ExtendedError::OPTION_CODE)))
            .and_then(|option| match option {
                EdnsOption::Unknown(_, data) => ExtendedError::from_option_data(data),
                _ => None,
            });

        Ok(DnsResponse {
            id: message.id(),
            rcode: Rcode(u16::from(message.response_code())),
            truncated: message.truncated(),
            answers: Self::convert(message.answers()),
            authority: Self::convert(message.name_servers()),
            additional: Self::convert(message.additionals()),
            ede,
        })
    }

    /// Records the domain model cannot represent are skipped.
    fn convert(records: &[Record]) -> Vec<ResourceRecord> {
        records
            .iter()
            .filter_map(|record| match from_hickory(record) {
                Ok(rr) => Some(rr),
                Err(e) => {
                    debug!(error = %e, "Skipping undecodable record");
                    None
                }
            })
            .collect()
    }
}
