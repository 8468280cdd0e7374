use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ferrous_dsync_domain::{Algorithm, DomainError, SigningKey};
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, EcdsaSigningAlgorithm, Ed25519KeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING,
    ECDSA_P384_SHA384_FIXED_SIGNING,
};

enum Keypair {
    Ed25519(Ed25519KeyPair),
    Ecdsa(EcdsaKeyPair),
}

/// A private key loaded from its PKCS#8 document.
pub struct RingSigner {
    algorithm: Algorithm,
    keypair: Keypair,
    rng: SystemRandom,
}

pub(crate) fn ecdsa_signing_algorithm(
    algorithm: Algorithm,
) -> Option<&'static EcdsaSigningAlgorithm> {
    match algorithm {
        Algorithm::ECDSAP256SHA256 => Some(&ECDSA_P256_SHA256_FIXED_SIGNING),
        Algorithm::ECDSAP384SHA384 => Some(&ECDSA_P384_SHA384_FIXED_SIGNING),
        _ => None,
    }
}

impl RingSigner {
    pub fn from_pkcs8(algorithm: Algorithm, pkcs8: &[u8]) -> Result<Self, DomainError> {
        let rng = SystemRandom::new();
        let keypair = match algorithm {
            Algorithm::ED25519 => Ed25519KeyPair::from_pkcs8_maybe_unchecked(pkcs8)
                .map(Keypair::Ed25519)
                .map_err(|e| DomainError::InvalidPrivateKey(format!("ED25519: {}", e)))?,
            other => {
                let alg = ecdsa_signing_algorithm(other)
                    .ok_or_else(|| DomainError::UnsupportedAlgorithm(other.to_string()))?;
                EcdsaKeyPair::from_pkcs8(alg, pkcs8, &rng)
                    .map(Keypair::Ecdsa)
                    .map_err(|e| DomainError::InvalidPrivateKey(format!("{}: {}", other, e)))?
            }
        };
        Ok(Self {
            algorithm,
            keypair,
            rng,
        })
    }

    /// Loads the base64 PKCS#8 form stored in the key tables.
    pub fn from_base64(algorithm: Algorithm, encoded: &str) -> Result<Self, DomainError> {
        let pkcs8 = BASE64
            .decode(encoded.trim())
            .map_err(|e| DomainError::InvalidPrivateKey(format!("not base64: {}", e)))?;
        Self::from_pkcs8(algorithm, &pkcs8)
    }

    /// Public half in KEY/DNSKEY rdata layout.
    pub fn public_key(&self) -> Vec<u8> {
        match &self.keypair {
            Keypair::Ed25519(kp) => kp.public_key().as_ref().to_vec(),
            // ring hands out the uncompressed SEC1 point; DNS drops the 0x04 prefix
            Keypair::Ecdsa(kp) => kp.public_key().as_ref()[1..].to_vec(),
        }
    }
}

impl SigningKey for RingSigner {
    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, DomainError> {
        match &self.keypair {
            Keypair::Ed25519(kp) => Ok(kp.sign(data).as_ref().to_vec()),
            Keypair::Ecdsa(kp) => kp
                .sign(&self.rng, data)
                .map(|sig| sig.as_ref().to_vec())
                .map_err(|_| DomainError::SignatureError(format!("{} signing failed", self.algorithm))),
        }
    }
}
