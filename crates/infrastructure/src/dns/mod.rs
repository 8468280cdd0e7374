pub mod codec;
pub mod message_builder;
pub mod messenger;
pub mod response_parser;
pub mod transport;

pub use message_builder::MessageBuilder;
pub use messenger::HickoryDnsMessenger;
pub use response_parser::{DnsResponse, ResponseParser};
