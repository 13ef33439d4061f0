//! Property-based tests for envelope decoding.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use proptest::prelude::*;

use crate::{DecodeError, DecodedEnvelope, JoseHeader};

/// Strategy for generating key-set URLs.
fn jku_strategy() -> impl Strategy<Value = String> {
    "https://[a-z]{3,12}\\.example\\.(org|com)/(trusted|keys|jwks)(/[a-z0-9]{1,8})?"
}

/// Strategy for generating key identifiers.
fn kid_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,24}"
}

fn encode_envelope(header: &JoseHeader, payload: &[u8], signature: &[u8]) -> String {
    let header = serde_json::to_vec(header).unwrap();
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(payload),
        URL_SAFE_NO_PAD.encode(signature)
    )
}

proptest! {
    /// Decoding arbitrary text never panics.
    #[test]
    fn parse_never_panics(input in ".{0,256}") {
        let _ = DecodedEnvelope::parse(&input);
    }

    /// Input without any dot is always reported as header-less.
    #[test]
    fn dotless_input_is_missing_header(input in "[^.]{0,128}") {
        let err = DecodedEnvelope::parse(&input).unwrap_err();
        prop_assert!(matches!(err, DecodeError::MissingHeader));
    }

    /// Well-formed envelopes decode to exactly what was encoded.
    #[test]
    fn well_formed_envelopes_decode(
        jku in prop::option::of(jku_strategy()),
        kid in prop::option::of(kid_strategy()),
        payload in prop::collection::vec(any::<u8>(), 0..256),
        signature in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let mut header = JoseHeader::new("RS256");
        header.jku = jku;
        header.kid = kid;

        let raw = encode_envelope(&header, &payload, &signature);
        let decoded = DecodedEnvelope::parse(&raw).unwrap();

        prop_assert_eq!(decoded.header(), &header);
        prop_assert_eq!(decoded.payload(), payload.as_slice());
        prop_assert_eq!(decoded.signature(), signature.as_slice());
    }
}
