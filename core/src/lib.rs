//! Public key recovery from JWT signatures.
//!
//! RS256/RS384/RS512 moduli are recovered from two or more tokens with a gcd
//! over `s^e − EM`. ES256/ES384/ES512 keys are recovered from a single token as
//! two candidate points.

pub mod algorithm;
pub mod digest;
pub mod dispatch;
pub mod ecdsa_recovery;
pub mod error;
pub mod numeric;
pub mod pkcs1v15;
pub mod pubkeys;
pub mod rsa_recovery;
pub mod token;

pub use algorithm::{Algorithm, NamedCurve};
pub use dispatch::{recover, Recovery, RecoveryOptions};
pub use ecdsa_recovery::{recover_ecdsa_key, EcCandidates};
pub use error::{RecoverError, Result, UnsupportedReason};
pub use pubkeys::{RecoveredEcKey, RecoveredRsaKey};
pub use rsa_recovery::{recover_rsa_key, RsaOptions};
pub use token::Token;
