//! DNS message construction in wire format using `hickory-proto`.

use super::codec::to_hickory;
use ferrous_dsync_domain::{DomainError, RecordType, UpdateMessage};
use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType as HickoryRecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};

/// Advertised EDNS(0) UDP payload size (DNS flag day 2020).
pub const EDNS_PAYLOAD: u16 = 1232;

/// Builds DNS messages in wire format. Every builder returns the message
/// id together with the bytes for response matching.
pub struct MessageBuilder;

impl MessageBuilder {
    /// Recursive query with a single question.
    pub fn build_query(qname: &str, qtype: RecordType) -> Result<(u16, Vec<u8>), DomainError> {
        let id = fastrand::u16(..);
        let mut message = Message::new();
        message
            .set_id(id)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true)
            .add_query(Self::question(qname, qtype)?)
            .set_edns(Self::edns());

        Ok((id, Self::serialize_message(&message)?))
    }

    /// RFC 2136 UPDATE: zone section holds `zone SOA`, the update section
    /// holds the actions in order. Prerequisites are not used.
    pub fn build_update(update: &UpdateMessage) -> Result<(u16, Vec<u8>), DomainError> {
        let id = fastrand::u16(..);
        let mut message = Message::new();
        message
            .set_id(id)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Update)
            .add_query(Self::question(&update.zone, RecordType::SOA)?);
        for action in &update.actions {
            message.add_name_server(to_hickory(action)?);
        }
        message.set_edns(Self::edns());

        Ok((id, Self::serialize_message(&message)?))
    }

    /// RFC 1996 NOTIFY carrying `rrtype` in the question.
    pub fn build_notify(zone: &str, rrtype: RecordType) -> Result<(u16, Vec<u8>), DomainError> {
        let id = fastrand::u16(..);
        let mut message = Message::new();
        message
            .set_id(id)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Notify)
            .set_authoritative(true)
            .add_query(Self::question(zone, rrtype)?)
            .set_edns(Self::edns());

        Ok((id, Self::serialize_message(&message)?))
    }

    fn question(qname: &str, qtype: RecordType) -> Result<Query, DomainError> {
        let name = Name::from_ascii(qname).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", qname, e))
        })?;
        let mut query = Query::query(name, HickoryRecordType::from(qtype.code()));
        query.set_query_class(DNSClass::IN);
        Ok(query)
    }

    fn edns() -> Edns {
        let mut edns = Edns::new();
        edns.set_max_payload(EDNS_PAYLOAD);
        edns.set_version(0);
        edns
    }

    fn serialize_message(message: &Message) -> Result<Vec<u8>, DomainError> {
        let mut buffer = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buffer);
        message.emit(&mut encoder).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("Failed to serialize DNS message: {}", e))
        })?;
        Ok(buffer)
    }
}
