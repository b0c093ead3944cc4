//! Stamp text encoding.
//!
//! A stamp is `b64url(header) "." b64url(claims) "." b64url(salt) b64url(nonce)`.
//! The nonce rides directly on the salt segment with no separator, so a
//! decoded stamp has exactly three segments and the proof is only ever
//! consumed by re-hashing the whole string.
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, VerifyError};

pub const TYPE: &str = "JWP";
pub const ALGORITHM: &str = "SHA256";

/// Insertion-ordered JSON claims.
pub type Claims = Map<String, Value>;

/// Stamp header. Field order is part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub typ: String,
    pub alg: String,
    /// Issuer's difficulty. Informational; verifiers apply their own.
    pub dif: u32,
}

impl Header {
    pub fn new(difficulty: u32) -> Self {
        Self {
            typ: TYPE.to_owned(),
            alg: ALGORITHM.to_owned(),
            dif: difficulty,
        }
    }
}

/// A stamp split into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedStamp {
    pub header: Header,
    pub claims: Claims,
    /// Encoded salt immediately followed by the encoded nonce.
    pub proof_segment: String,
}

pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `b64url(header) "." b64url(claims) "." b64url(salt)`.
pub fn encode_challenge(header: &Header, claims: &Claims, salt: &[u8]) -> Result<String, Error> {
    let header_json =
        serde_json::to_vec(header).map_err(|e| Error::InvalidClaims(e.to_string()))?;
    let claims_json =
        serde_json::to_vec(claims).map_err(|e| Error::InvalidClaims(e.to_string()))?;
    Ok(format!(
        "{}.{}.{}",
        encode_segment(&header_json),
        encode_segment(&claims_json),
        encode_segment(salt)
    ))
}

/// Append the encoded nonce to a challenge, without a separator.
pub fn append_proof(challenge: &str, nonce: &[u8]) -> String {
    let mut stamp = String::with_capacity(challenge.len() + nonce.len() * 4 / 3 + 4);
    stamp.push_str(challenge);
    stamp.push_str(&encode_segment(nonce));
    stamp
}

fn is_b64url_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn decode_json_segment<T: DeserializeOwned>(
    segment: &str,
    what: &str,
) -> Result<T, VerifyError> {
    let raw = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| VerifyError::InvalidFormat(format!("{what} is not base64url: {e}")))?;
    serde_json::from_slice(&raw)
        .map_err(|e| VerifyError::InvalidFormat(format!("{what} is not valid JSON: {e}")))
}

/// Split and parse a stamp. Does not check the proof or expiration.
pub fn decode(stamp: &str) -> Result<DecodedStamp, VerifyError> {
    let segments: Vec<&str> = stamp.split('.').collect();
    let &[header_seg, claims_seg, proof_seg] = segments.as_slice() else {
        return Err(VerifyError::InvalidFormat(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    if proof_seg.is_empty() || !proof_seg.chars().all(is_b64url_char) {
        return Err(VerifyError::InvalidFormat(
            "proof segment is not base64url".into(),
        ));
    }

    let header: Header = decode_json_segment(header_seg, "header")?;
    if header.typ != TYPE || header.alg != ALGORITHM {
        return Err(VerifyError::InvalidFormat(format!(
            "unsupported header typ={} alg={}",
            header.typ, header.alg
        )));
    }

    let claims = match decode_json_segment::<Value>(claims_seg, "claims")? {
        Value::Object(map) => map,
        other => {
            return Err(VerifyError::InvalidFormat(format!(
                "claims must be a JSON object, found {other}"
            )))
        }
    };

    Ok(DecodedStamp {
        header,
        claims,
        proof_segment: proof_seg.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> Claims {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn header_serializes_in_wire_order() {
        let encoded = encode_segment(&serde_json::to_vec(&Header::new(20)).unwrap());
        assert_eq!(encoded, "eyJ0eXAiOiJKV1AiLCJhbGciOiJTSEEyNTYiLCJkaWYiOjIwfQ");
    }

    #[test]
    fn claims_keep_insertion_order() {
        let c = claims(json!({"hello": "world", "exp": 5}));
        let challenge = encode_challenge(&Header::new(1), &c, &[]).unwrap();
        let claims_seg = challenge.split('.').nth(1).unwrap();
        let raw = URL_SAFE_NO_PAD.decode(claims_seg).unwrap();
        assert_eq!(raw, br#"{"hello":"world","exp":5}"#);
    }

    #[test]
    fn proof_is_appended_without_separator() {
        let challenge = encode_challenge(&Header::new(1), &Claims::new(), &[0xAB; 3]).unwrap();
        let stamp = append_proof(&challenge, &[0x01]);
        assert_eq!(stamp.matches('.').count(), 2);
        assert!(stamp.ends_with("q6urAQ"));
    }

    #[test]
    fn decode_returns_parts() {
        let c = claims(json!({"hello": "world"}));
        let challenge = encode_challenge(&Header::new(7), &c, &[1, 2, 3, 4]).unwrap();
        let stamp = append_proof(&challenge, &[0x00]);
        let decoded = decode(&stamp).unwrap();
        assert_eq!(decoded.header, Header::new(7));
        assert_eq!(decoded.claims, c);
        assert_eq!(decoded.proof_segment, "AQIDBAAA");
    }

    #[test]
    fn decode_rejects_wrong_segment_count() {
        let stamp = "eyJ0eXAiOiJKV1AiLCJhbGciOiJTSEEyNTYiLCJkaWYiOjIwfQ.eyJoZWxsbyI6IndvcmxkIn0";
        assert!(matches!(decode(stamp), Err(VerifyError::InvalidFormat(_))));
        let four = format!("{stamp}.AAAA.AAAA");
        assert!(matches!(decode(&four), Err(VerifyError::InvalidFormat(_))));
    }

    #[test]
    fn decode_rejects_non_b64url() {
        let bad_header = "ey!!.eyJoZWxsbyI6IndvcmxkIn0.AAAA";
        assert!(matches!(decode(bad_header), Err(VerifyError::InvalidFormat(_))));
        let bad_proof =
            "eyJ0eXAiOiJKV1AiLCJhbGciOiJTSEEyNTYiLCJkaWYiOjIwfQ.eyJoZWxsbyI6IndvcmxkIn0.AA+/";
        assert!(matches!(decode(bad_proof), Err(VerifyError::InvalidFormat(_))));
        let empty_proof = "eyJ0eXAiOiJKV1AiLCJhbGciOiJTSEEyNTYiLCJkaWYiOjIwfQ.eyJoZWxsbyI6IndvcmxkIn0.";
        assert!(matches!(decode(empty_proof), Err(VerifyError::InvalidFormat(_))));
    }

    #[test]
    fn decode_rejects_non_object_claims_and_foreign_header() {
        let array_claims = format!(
            "{}.{}.AAAA",
            encode_segment(&serde_json::to_vec(&Header::new(1)).unwrap()),
            encode_segment(b"[1,2]")
        );
        assert!(matches!(decode(&array_claims), Err(VerifyError::InvalidFormat(_))));

        let foreign = format!(
            "{}.{}.AAAA",
            encode_segment(br#"{"typ":"JWT","alg":"HS256","dif":0}"#),
            encode_segment(b"{}")
        );
        assert!(matches!(decode(&foreign), Err(VerifyError::InvalidFormat(_))));
    }
}
