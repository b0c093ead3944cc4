use std::sync::Arc;
use std::time::Duration;

use derive_builder::Builder;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cancel::CancelFlag;
use crate::codec::{append_proof, encode_challenge, Claims, Header};
use crate::engine::{SearchEngine, MAX_DIFFICULTY};
use crate::error::{Error, VerifyError};
use crate::time::{Clock, SystemClock};
use crate::verify::{self, EXP_CLAIM};
use crate::window::ExpirationWindow;

pub const DEFAULT_DIFFICULTY: u32 = 20;
pub const DEFAULT_SALT_LENGTH: usize = 16;
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(5 * 60);

/// Issues and verifies stamps under one configuration.
///
/// The service holds no per-stamp state; a single instance can be shared
/// across threads.
#[derive(Builder, Debug, Clone)]
#[builder(pattern = "owned")]
pub struct TokenService {
    /// Leading zero bits required when issuing and when verifying.
    #[builder(default = "DEFAULT_DIFFICULTY")]
    pub difficulty: u32,
    /// Random bytes mixed into each challenge. Zero disables salting, which
    /// lets identical claims share precomputed proofs.
    #[builder(default = "DEFAULT_SALT_LENGTH")]
    pub salt_length: usize,
    /// Offset from now injected as `exp` when the claims carry none.
    #[builder(default = "Some(DEFAULT_EXPIRATION)")]
    pub expiration: Option<Duration>,
    /// Search workers used by `issue`.
    #[builder(default = "1")]
    pub threads: usize,
    #[builder(default = "Arc::new(SystemClock)")]
    pub clock: Arc<dyn Clock>,
}

fn validate_config(
    difficulty: u32,
    expiration: Option<Duration>,
    threads: usize,
) -> Result<(), Error> {
    if difficulty > MAX_DIFFICULTY {
        return Err(Error::InvalidConfig(format!(
            "difficulty must be <= {MAX_DIFFICULTY}"
        )));
    }
    if let Some(expiration) = expiration {
        // Require integral seconds to avoid silent truncation.
        if expiration.subsec_nanos() != 0 {
            return Err(Error::InvalidConfig(
                "expiration must be a whole number of seconds".into(),
            ));
        }
    }
    if threads == 0 {
        return Err(Error::InvalidConfig("threads must be >= 1".into()));
    }
    Ok(())
}

impl TokenServiceBuilder {
    pub fn build_validated(self) -> Result<TokenService, Error> {
        let service = self
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        service.validate()?;
        Ok(service)
    }
}

impl TokenService {
    fn validate(&self) -> Result<(), Error> {
        validate_config(self.difficulty, self.expiration, self.threads)
    }

    /// Mine a stamp for `claims`. Blocks until a proof is found.
    pub fn issue(&self, claims: Claims) -> Result<String, Error> {
        self.issue_with_cancel(claims, &CancelFlag::new())
    }

    /// Like [`issue`](Self::issue), but gives up with [`Error::Cancelled`]
    /// once `cancel` is set.
    pub fn issue_with_cancel(&self, claims: Claims, cancel: &CancelFlag) -> Result<String, Error> {
        let salt = generate_salt(self.salt_length);
        self.issue_with_salt(claims, &salt, cancel)
    }

    /// Mine a stamp over a caller-provided salt.
    ///
    /// The salt must be unpredictable in production use; otherwise proofs can
    /// be precomputed. Fixed salts make stamps reproducible for testing.
    pub fn issue_with_salt(
        &self,
        mut claims: Claims,
        salt: &[u8],
        cancel: &CancelFlag,
    ) -> Result<String, Error> {
        self.validate()?;
        let header = Header::new(self.difficulty);

        if let Some(offset) = self.expiration {
            if !claims.contains_key(EXP_CLAIM) {
                let offset = i64::try_from(offset.as_secs()).unwrap_or(i64::MAX);
                let exp = self.clock.now_seconds().saturating_add(offset);
                claims.insert(EXP_CLAIM.to_owned(), Value::from(exp));
            }
        }

        let challenge = encode_challenge(&header, &claims, salt)?;
        let engine = SearchEngine {
            difficulty: self.difficulty,
            threads: self.threads,
        };
        let solution = engine.solve(challenge.as_bytes(), cancel)?;
        Ok(append_proof(&challenge, solution.nonce.as_bytes()))
    }

    /// Issue a stamp from any value that serializes to a JSON object.
    pub fn issue_serialized<T: Serialize>(&self, claims: &T) -> Result<String, Error> {
        match serde_json::to_value(claims).map_err(|e| Error::InvalidClaims(e.to_string()))? {
            Value::Object(map) => self.issue(map),
            other => Err(Error::InvalidClaims(format!(
                "claims must serialize to a JSON object, found {other}"
            ))),
        }
    }

    /// Verify at the configured difficulty within `window`.
    pub fn verify(&self, stamp: &str, window: &ExpirationWindow) -> Result<Claims, VerifyError> {
        verify::verify(stamp, self.difficulty, window)
    }

    /// Verify at the configured difficulty, rejecting stamps whose `exp`
    /// is already in the past.
    pub fn verify_now(&self, stamp: &str) -> Result<Claims, VerifyError> {
        self.verify(stamp, &ExpirationWindow::starting_at(self.clock.as_ref()))
    }

    pub fn verify_as<T: DeserializeOwned>(
        &self,
        stamp: &str,
        window: &ExpirationWindow,
    ) -> Result<T, VerifyError> {
        verify::verify_as(stamp, self.difficulty, window)
    }

    /// Claims of a stamp, skipping proof and expiration checks.
    pub fn decode_unverified(&self, stamp: &str) -> Result<Claims, VerifyError> {
        verify::decode_unverified(stamp)
    }
}

fn generate_salt(len: usize) -> Vec<u8> {
    let mut salt = vec![0u8; len];
    OsRng.fill_bytes(&mut salt);
    salt
}
