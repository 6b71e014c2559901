use crate::config::SignatureAlgorithm;
use crate::domain::ports::SignatureValidator;
use ring::hmac;

/// Verifies hex-encoded HMAC signatures of the raw notification body.
///
/// The comparison is constant-time (`ring::hmac::verify`). Hex case does not
/// matter; anything that is not valid hex fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSignatureValidator {
    algorithm: SignatureAlgorithm,
}

impl HmacSignatureValidator {
    pub fn new(algorithm: SignatureAlgorithm) -> Self {
        Self { algorithm }
    }
}

fn key(algorithm: SignatureAlgorithm, secret: &str) -> hmac::Key {
    let algorithm = match algorithm {
        SignatureAlgorithm::Sha1 => hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
        SignatureAlgorithm::Sha256 => hmac::HMAC_SHA256,
    };
    hmac::Key::new(algorithm, secret.as_bytes())
}

/// Lowercase hex signature of `body`, as the gateway computes it.
pub fn sign(algorithm: SignatureAlgorithm, secret: &str, body: &[u8]) -> String {
    hex::encode(hmac::sign(&key(algorithm, secret), body).as_ref())
}

impl SignatureValidator for HmacSignatureValidator {
    fn validate(&self, body: &[u8], secret: &str, signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature.trim()) else {
            return false;
        };
        hmac::verify(&key(self.algorithm, secret), body, &expected).is_ok()
    }
}
