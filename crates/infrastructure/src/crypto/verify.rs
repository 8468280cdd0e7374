use ferrous_dsync_domain::{Algorithm, DomainError};
use ring::signature::{self, UnparsedPublicKey};

/// Checks `sig` over `data` with a public key in DNSKEY/KEY rdata layout.
///
/// `Ok(false)` means the signature is wrong; `Err` means the check could
/// not be performed (unsupported algorithm, malformed key).
pub fn verify_signature(
    algorithm: Algorithm,
    public_key: &[u8],
    data: &[u8],
    sig: &[u8],
) -> Result<bool, DomainError> {
    let outcome = match algorithm {
        Algorithm::ED25519 => {
            UnparsedPublicKey::new(&signature::ED25519, public_key).verify(data, sig)
        }
        Algorithm::ECDSAP256SHA256 | Algorithm::ECDSAP384SHA384 => {
            let (alg, expected): (&signature::EcdsaVerificationAlgorithm, usize) =
                if algorithm == Algorithm::ECDSAP256SHA256 {
                    (&signature::ECDSA_P256_SHA256_FIXED, 64)
                } else {
                    (&signature::ECDSA_P384_SHA384_FIXED, 96)
                };
            if public_key.len() != expected {
                return Err(DomainError::InvalidRecord(format!(
                    "{} public key must be {} bytes, got {}",
                    algorithm,
                    expected,
                    public_key.len()
                )));
            }
            let mut point = Vec::with_capacity(expected + 1);
            point.push(0x04);
            point.extend_from_slice(public_key);
            UnparsedPublicKey::new(alg, point).verify(data, sig)
        }
        Algorithm::RSASHA256 | Algorithm::RSASHA512 => {
            let (exponent, modulus) = split_rsa_key(public_key)?;
            let params = if algorithm == Algorithm::RSASHA256 {
                &signature::RSA_PKCS1_2048_8192_SHA256
            } else {
                &signature::RSA_PKCS1_2048_8192_SHA512
            };
            signature::RsaPublicKeyComponents {
                n: modulus,
                e: exponent,
            }
            .verify(params, data, sig)
        }
        Algorithm::Unknown(code) => {
            return Err(DomainError::UnsupportedAlgorithm(code.to_string()));
        }
    };
    Ok(outcome.is_ok())
}

/// RFC 3110: exponent length (1 byte, or 0 followed by 2 bytes), exponent,
/// modulus.
fn split_rsa_key(key: &[u8]) -> Result<(&[u8], &[u8]), DomainError> {
    let too_short = || DomainError::InvalidRecord("RSA public key too short".to_string());
    let (exp_len, offset) = match key.first() {
        Some(0) => {
            let hi = *key.get(1).ok_or_else(too_short)? as usize;
            let lo = *key.get(2).ok_or_else(too_short)? as usize;
            ((hi << 8) | lo, 3)
        }
        Some(len) => (*len as usize, 1),
        None => return Err(too_short()),
    };
    if key.len() <= offset + exp_len {
        return Err(too_short());
    }
    Ok((&key[offset..offset + exp_len], &key[offset + exp_len..]))
}
