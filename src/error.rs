/// Reasons a stamp is rejected by the verifier.
///
/// Every variant is terminal: a stamp that fails once will fail again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("invalid stamp format: {0}")]
    InvalidFormat(String),
    #[error("proof does not meet difficulty of {required} bits")]
    InvalidProof { required: u32 },
    #[error("stamp expired (exp = {exp})")]
    Expired { exp: i64 },
}

/// Errors raised while configuring a service or issuing a stamp.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid claims: {0}")]
    InvalidClaims(String),
    #[error("search cancelled")]
    Cancelled,
    #[error("search workers exited without a result")]
    ChannelClosed,
}
