//! JSON Web Proofs: self-contained bearer stamps authenticated by proof of work.
//!
//! A stamp looks like a JWT, `header.claims.salt+proof`, except that the
//! trailing part is a nonce rather than a signature. The stamp is valid when
//! `SHA256(stamp)` starts with at least `difficulty` zero bits, so anyone can
//! verify it without a key, and minting one costs about `2^difficulty` hashes.
//!
//! ```no_run
//! use jwp::{ExpirationWindow, TokenServiceBuilder};
//! use serde_json::json;
//!
//! let service = TokenServiceBuilder::default()
//!     .difficulty(16)
//!     .build_validated()?;
//! let claims = json!({"hello": "world"}).as_object().cloned().unwrap_or_default();
//! let stamp = service.issue(claims)?;
//! let claims = service.verify(&stamp, &ExpirationWindow::starting_now())?;
//! assert_eq!(claims["hello"], "world");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod bits;
pub mod cancel;
pub mod codec;
pub mod counter;
pub mod engine;
pub mod error;
pub mod service;
pub mod time;
pub mod verify;
pub mod window;

pub use bits::{leading_zero_bits, leading_zero_bits_total, satisfies};
pub use cancel::CancelFlag;
pub use codec::{append_proof, decode, encode_challenge, Claims, DecodedStamp, Header};
pub use counter::BigCounter;
pub use engine::{
    pow_hash, search, search_cancellable, SearchEngine, SearchEngineBuilder, Solution,
    MAX_DIFFICULTY,
};
pub use error::{Error, VerifyError};
pub use service::{TokenService, TokenServiceBuilder};
pub use time::{Clock, FixedClock, SystemClock};
pub use verify::{decode_unverified, expiration, stamp_digest, verify, verify_as};
pub use window::ExpirationWindow;
