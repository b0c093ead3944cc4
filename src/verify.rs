use crate::bits::{leading_zero_bits_total, satisfies};
use crate::codec::{decode, Claims};
use crate::error::VerifyError;
use crate::window::ExpirationWindow;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Claim holding the expiration time in Unix seconds.
pub const EXP_CLAIM: &str = "exp";

/// SHA-256 of the whole stamp string.
pub fn stamp_digest(stamp: &str) -> [u8; 32] {
    Sha256::digest(stamp.as_bytes()).into()
}

/// Read `exp` as Unix seconds. Accepts integers, floats (truncated) and
/// numeric strings. A missing claim reads as 0.
pub fn expiration(claims: &Claims) -> Result<i64, VerifyError> {
    let Some(value) = claims.get(EXP_CLAIM) else {
        return Ok(0);
    };
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    };
    parsed.ok_or_else(|| VerifyError::InvalidFormat(format!("exp is not a timestamp: {value}")))
}

/// Verify a stamp against the verifier's own `difficulty` and `window`.
///
/// The header's declared difficulty is never consulted.
pub fn verify(
    stamp: &str,
    difficulty: u32,
    window: &ExpirationWindow,
) -> Result<Claims, VerifyError> {
    let decoded = decode(stamp).inspect_err(|err| {
        tracing::debug!(error = %err, "rejecting malformed stamp");
    })?;

    let digest = stamp_digest(stamp);
    if !satisfies(&digest, difficulty) {
        tracing::debug!(
            required = difficulty,
            found = leading_zero_bits_total(&digest),
            digest = %hex::encode(digest),
            "rejecting under-worked stamp"
        );
        return Err(VerifyError::InvalidProof {
            required: difficulty,
        });
    }

    let exp = expiration(&decoded.claims)?;
    if !window.contains(exp) {
        tracing::debug!(exp, start = ?window.start, end = ?window.end, "rejecting expired stamp");
        return Err(VerifyError::Expired { exp });
    }

    Ok(decoded.claims)
}

/// Verify and deserialize the claims into `T`.
pub fn verify_as<T: DeserializeOwned>(
    stamp: &str,
    difficulty: u32,
    window: &ExpirationWindow,
) -> Result<T, VerifyError> {
    let claims = verify(stamp, difficulty, window)?;
    serde_json::from_value(Value::Object(claims))
        .map_err(|e| VerifyError::InvalidFormat(format!("claims do not match: {e}")))
}

/// Return the claims without checking proof or expiration.
pub fn decode_unverified(stamp: &str) -> Result<Claims, VerifyError> {
    decode(stamp).map(|decoded| decoded.claims)
}
