//! Compact JWS envelope parsing.
//!
//! An envelope is `b64url(header) "." b64url(payload) "." b64url(signature)`
//! with unpadded base64url segments. Decoding is purely structural; it says
//! nothing about whether the signature is valid.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::error::{DecodeError, Segment};
use crate::header::JoseHeader;

/// A structurally decoded signature envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEnvelope {
    header: JoseHeader,
    payload: Vec<u8>,
    signature: Vec<u8>,
    signing_input: String,
    encoded_signature: String,
}

impl DecodedEnvelope {
    /// Decodes a compact JWS.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingHeader`] when the input has no header
    /// segment at all, and another [`DecodeError`] when the envelope is
    /// present but structurally invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use trusted_jws_core::DecodedEnvelope;
    ///
    /// // {"alg":"RS256"} . "hi" . <empty signature>
    /// let envelope = DecodedEnvelope::parse("eyJhbGciOiJSUzI1NiJ9.aGk.")?;
    /// assert_eq!(envelope.header().alg, "RS256");
    /// assert_eq!(envelope.payload(), b"hi");
    /// # Ok::<(), trusted_jws_core::DecodeError>(())
    /// ```
    pub fn parse(envelope: &str) -> Result<Self, DecodeError> {
        let envelope = envelope.trim();
        if envelope.is_empty() || !envelope.contains('.') {
            return Err(DecodeError::MissingHeader);
        }

        let parts: Vec<&str> = envelope.split('.').collect();
        if parts.len() != 3 {
            return Err(DecodeError::Malformed {
                reason: format!("expected 3 segments, found {}", parts.len()),
            });
        }
        if parts[0].is_empty() {
            return Err(DecodeError::MissingHeader);
        }

        let header_bytes = decode_segment(parts[0], Segment::Header)?;
        let header: JoseHeader = serde_json::from_slice(&header_bytes)
            .map_err(|source| DecodeError::HeaderJson { source })?;
        let payload = decode_segment(parts[1], Segment::Payload)?;
        let signature = decode_segment(parts[2], Segment::Signature)?;

        Ok(Self {
            header,
            payload,
            signature,
            signing_input: format!("{}.{}", parts[0], parts[1]),
            encoded_signature: parts[2].to_string(),
        })
    }

    /// Returns the protected header.
    #[must_use]
    pub const fn header(&self) -> &JoseHeader {
        &self.header
    }

    /// Returns the decoded payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consumes the envelope and returns the payload bytes.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Returns the decoded signature bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Returns the bytes covered by the signature (`header.payload`).
    #[must_use]
    pub fn signing_input(&self) -> &[u8] {
        self.signing_input.as_bytes()
    }

    /// Returns the signature segment as it appeared on the wire.
    #[must_use]
    pub fn encoded_signature(&self) -> &str {
        &self.encoded_signature
    }
}

fn decode_segment(segment: &str, which: Segment) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|source| DecodeError::Base64 {
            segment: which,
            source,
        })
}
