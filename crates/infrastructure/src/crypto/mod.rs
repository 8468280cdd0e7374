//! Key generation, signing and verification on top of `ring`.
//!
//! Private keys are kept as base64 PKCS#8 documents; public keys use the
//! DNSKEY/KEY rdata layout (raw Ed25519 point, ECDSA `X || Y`).

mod keygen;
mod rrsig;
mod sig0;
mod signer;
mod verify;

pub use keygen::{generate_keypair, key_record, GeneratedKeypair};
pub use rrsig::{verify_rrsig, RingZoneSigner};
pub use sig0::{sign_message, unix_now, verify_message, SIG0_CLOCK_SKEW};
pub use signer::RingSigner;
pub use verify::verify_signature;

/// RFC 1982 "a <= b" for 32-bit signature timestamps.
pub(crate) fn serial_le(a: u32, b: u32) -> bool {
    a == b || (b.wrapping_sub(a) as i32) > 0
}
