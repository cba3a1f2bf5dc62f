use std::fmt;

use thiserror::Error;

pub type Result<T, E = RecoverError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RecoverError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("tokens don't have the same algorithm: {found} != {expected}")]
    AlgorithmMismatch { expected: String, found: String },

    #[error("cannot recover a public key for {alg}: {reason}")]
    UnsupportedAlgorithm {
        alg: String,
        reason: UnsupportedReason,
    },

    #[error("recovery impossible: {0}")]
    RecoveryImpossible(String),

    #[error("{needed} tokens are needed for {alg}, got {found}")]
    InsufficientTokens {
        alg: String,
        needed: usize,
        found: usize,
    },

    #[error("encoding recovered key: {0}")]
    Encoding(String),
}

/// Why an `alg` value cannot lead to a recovered public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnsupportedReason {
    /// RSASSA-PSS salts every signature.
    NonDeterministicPadding,
    /// HMAC uses a shared secret.
    Symmetric,
    Unrecognized,
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonDeterministicPadding => {
                f.write_str("the algorithm uses a non-deterministic padding")
            }
            Self::Symmetric => {
                f.write_str("the algorithm is based on HMAC, which doesn't use a public key")
            }
            Self::Unrecognized => f.write_str("the algorithm is not supported"),
        }
    }
}

impl RecoverError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedToken(msg.into())
    }

    pub fn impossible(msg: impl Into<String>) -> Self {
        Self::RecoveryImpossible(msg.into())
    }

    pub fn unsupported(alg: impl Into<String>, reason: UnsupportedReason) -> Self {
        Self::UnsupportedAlgorithm {
            alg: alg.into(),
            reason,
        }
    }
}

impl From<der::Error> for RecoverError {
    fn from(err: der::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<rsa::Error> for RecoverError {
    fn from(err: rsa::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<spki::Error> for RecoverError {
    fn from(err: spki::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}
