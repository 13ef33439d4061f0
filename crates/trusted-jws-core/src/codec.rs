//! Signature codec: envelope decoding plus cryptographic verification.
//!
//! [`SignatureCodec`] is the seam the verification pipeline uses for
//! everything CPU-bound. [`JwsCodec`] is the default implementation, backed by
//! the `jsonwebtoken` crypto primitives.
//!
//! # Example
//!
//! ```rust
//! use jsonwebtoken::Algorithm;
//! use trusted_jws_core::{JwsCodec, SignatureCodec};
//!
//! let codec = JwsCodec::new().with_algorithms([Algorithm::RS256, Algorithm::ES256]);
//! assert!(codec.accepts(Algorithm::ES256));
//! assert!(!codec.accepts(Algorithm::HS256));
//!
//! let envelope = codec.decode("eyJhbGciOiJSUzI1NiJ9.aGk.")?;
//! assert_eq!(envelope.payload(), b"hi");
//! # Ok::<(), trusted_jws_core::DecodeError>(())
//! ```

use std::str::FromStr;

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk};
use jsonwebtoken::{Algorithm, DecodingKey};

use crate::envelope::DecodedEnvelope;
use crate::error::{DecodeError, SignatureError};
use crate::key::KeyMaterial;

/// Decodes signature envelopes and checks signatures against key material.
pub trait SignatureCodec: Send + Sync + std::fmt::Debug {
    /// Structurally decodes an envelope.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the envelope cannot be parsed.
    fn decode(&self, envelope: &str) -> Result<DecodedEnvelope, DecodeError>;

    /// Checks the envelope's signature with `key`.
    ///
    /// `Ok(false)` means the signature does not verify.
    ///
    /// # Errors
    ///
    /// Returns a [`SignatureError`] if the algorithm or key is unusable.
    fn verify(&self, envelope: &DecodedEnvelope, key: &KeyMaterial)
        -> Result<bool, SignatureError>;
}

/// Compact JWS codec with an algorithm allow-list.
///
/// Only asymmetric algorithms can be allowed: keys come from public JWK sets,
/// so HMAC algorithms are refused even when requested.
#[derive(Debug, Clone)]
pub struct JwsCodec {
    algorithms: Vec<Algorithm>,
}

impl Default for JwsCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl JwsCodec {
    /// Creates a codec that accepts `RS256` only.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithms: vec![Algorithm::RS256],
        }
    }

    /// Replaces the accepted algorithms. HMAC algorithms are dropped.
    #[must_use]
    pub fn with_algorithms(mut self, algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
        self.algorithms = algorithms
            .into_iter()
            .filter(|alg| !is_hmac(*alg))
            .collect();
        self
    }

    /// Returns true if signatures using `alg` are accepted.
    #[must_use]
    pub fn accepts(&self, alg: Algorithm) -> bool {
        self.algorithms.contains(&alg)
    }

    fn algorithm_for(&self, name: &str) -> Result<Algorithm, SignatureError> {
        let unsupported = || SignatureError::UnsupportedAlgorithm {
            alg: name.to_string(),
        };
        let alg = Algorithm::from_str(name).map_err(|_| unsupported())?;
        if self.accepts(alg) {
            Ok(alg)
        } else {
            Err(unsupported())
        }
    }
}

impl SignatureCodec for JwsCodec {
    fn decode(&self, envelope: &str) -> Result<DecodedEnvelope, DecodeError> {
        DecodedEnvelope::parse(envelope)
    }

    fn verify(
        &self,
        envelope: &DecodedEnvelope,
        key: &KeyMaterial,
    ) -> Result<bool, SignatureError> {
        let name = envelope.header().alg.as_str();
        let alg = self.algorithm_for(name)?;
        check_key_compatible(alg, name, key.jwk())?;

        let decoding_key = DecodingKey::from_jwk(key.jwk())
            .map_err(|source| SignatureError::InvalidKey { source })?;

        let valid = jsonwebtoken::crypto::verify(
            envelope.encoded_signature(),
            envelope.signing_input(),
            &decoding_key,
            alg,
        )
        .map_err(|source| SignatureError::Crypto { source })?;

        tracing::debug!(
            alg = name,
            kid = ?key.kid(),
            source = %key.source(),
            valid,
            "Checked signature"
        );
        Ok(valid)
    }
}

const fn is_hmac(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

fn check_key_compatible(alg: Algorithm, name: &str, jwk: &Jwk) -> Result<(), SignatureError> {
    let family_matches = match alg {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => matches!(jwk.algorithm, AlgorithmParameters::RSA(_)),
        Algorithm::ES256 | Algorithm::ES384 => {
            matches!(jwk.algorithm, AlgorithmParameters::EllipticCurve(_))
        }
        Algorithm::EdDSA => matches!(jwk.algorithm, AlgorithmParameters::OctetKeyPair(_)),
        _ => false,
    };
    if !family_matches {
        return Err(SignatureError::KeyMismatch {
            alg: name.to_string(),
            reason: "key type cannot produce this algorithm".to_string(),
        });
    }

    if let Some(key_alg) = &jwk.common.key_algorithm {
        let declared = serde_json::to_value(key_alg)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned));
        if declared.as_deref() != Some(name) {
            return Err(SignatureError::KeyMismatch {
                alg: name.to_string(),
                reason: format!("key is restricted to {}", declared.unwrap_or_default()),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeySource;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

    fn rsa_jwk(alg: Option<&str>) -> Jwk {
        let mut value = serde_json::json!({
            "kty": "RSA",
            "kid": "k1",
            "n": "sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1WlUzewbgBHod5pcM9H95GQRV3JDXboIRROSBigeC5yjU1hGzHHyXss8UDprecbAYxknTcQkhslANGRUZmdTOQ5qTRsLAt6BTYuyvVRdhS8exSZEy_c4gs_7svlJJQ4H9_NxsiIoLwAEk7-Q3UXERGYw_75IDrGA84-lA_-Ct4eTlXHBIY2EaV7t7LjJaynVJCpkv4LKjTTAumiGUIuQhrNhZLuF_RJLqHpM2kgWFLU7-VTdL1VbC2tejvcI2BlMkEpk1BzBZI0KQB0GaDWFLN-aEAw3vRw",
            "e": "AQAB",
        });
        if let Some(alg) = alg {
            value["alg"] = serde_json::Value::from(alg);
        }
        serde_json::from_value(value).unwrap()
    }

    fn envelope_with_alg(alg: &str) -> DecodedEnvelope {
        let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"{alg}","kid":"k1"}}"#));
        let payload = URL_SAFE_NO_PAD.encode("DEAD BEEF");
        let signature = URL_SAFE_NO_PAD.encode([0u8; 256]);
        DecodedEnvelope::parse(&format!("{header}.{payload}.{signature}")).unwrap()
    }

    #[test]
    fn test_default_accepts_rs256_only() {
        let codec = JwsCodec::default();
        assert!(codec.accepts(Algorithm::RS256));
        assert!(!codec.accepts(Algorithm::ES256));
        assert!(!codec.accepts(Algorithm::HS256));
    }

    #[test]
    fn test_with_algorithms_drops_hmac() {
        let codec = JwsCodec::new().with_algorithms([Algorithm::HS256, Algorithm::PS256]);
        assert!(!codec.accepts(Algorithm::HS256));
        assert!(codec.accepts(Algorithm::PS256));
    }

    #[test]
    fn test_verify_rejects_hmac_header() {
        let codec = JwsCodec::new();
        let key = KeyMaterial::new(rsa_jwk(None), KeySource::Embedded);
        let err = codec.verify(&envelope_with_alg("HS256"), &key).unwrap_err();
        assert!(matches!(err, SignatureError::UnsupportedAlgorithm { alg } if alg == "HS256"));
    }

    #[test]
    fn test_verify_rejects_none_and_unknown_algorithms() {
        let codec = JwsCodec::new();
        let key = KeyMaterial::new(rsa_jwk(None), KeySource::Embedded);
        for alg in ["none", "XX999"] {
            let err = codec.verify(&envelope_with_alg(alg), &key).unwrap_err();
            assert!(matches!(err, SignatureError::UnsupportedAlgorithm { .. }));
        }
    }

    #[test]
    fn test_verify_rejects_key_restricted_to_other_algorithm() {
        let codec = JwsCodec::new().with_algorithms([Algorithm::RS256, Algorithm::RS512]);
        let key = KeyMaterial::new(rsa_jwk(Some("RS512")), KeySource::Pinned);
        let err = codec.verify(&envelope_with_alg("RS256"), &key).unwrap_err();
        assert!(matches!(err, SignatureError::KeyMismatch { .. }));
    }

    #[test]
    fn test_verify_rejects_wrong_key_family() {
        let codec = JwsCodec::new().with_algorithms([Algorithm::ES256]);
        let key = KeyMaterial::new(rsa_jwk(None), KeySource::Pinned);
        let err = codec.verify(&envelope_with_alg("ES256"), &key).unwrap_err();
        assert!(matches!(err, SignatureError::KeyMismatch { .. }));
    }

    #[test]
    fn test_verify_returns_false_for_forged_signature() {
        let codec = JwsCodec::new();
        let key = KeyMaterial::new(rsa_jwk(Some("RS256")), KeySource::Embedded);
        let result = codec.verify(&envelope_with_alg("RS256"), &key);
        assert!(!matches!(result, Ok(true)));
    }
}
