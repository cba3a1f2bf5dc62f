use rand::RngCore;
use tracing::info;

use crate::{
    algorithm::Algorithm,
    ecdsa_recovery::{recover_ecdsa_key, EcCandidates},
    error::{RecoverError, Result, UnsupportedReason},
    pubkeys::RecoveredRsaKey,
    rsa_recovery::{recover_rsa_key, RsaOptions},
    token::Token,
};

/// Settings threaded through a recovery run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecoveryOptions {
    pub rsa: RsaOptions,
    /// Export ECDSA candidates with compressed points.
    pub compressed: bool,
}

#[derive(Clone, Debug)]
pub enum Recovery {
    Rsa {
        alg: Algorithm,
        key: RecoveredRsaKey,
    },
    Ecdsa {
        alg: Algorithm,
        candidates: EcCandidates,
    },
}

/// Decodes `raw_tokens` and recovers the key of the first token's algorithm.
pub fn recover(
    raw_tokens: &[impl AsRef<str>],
    options: &RecoveryOptions,
    rng: &mut impl RngCore,
) -> Result<Recovery> {
    let tokens = raw_tokens
        .iter()
        .map(|raw| Token::decode(raw.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let first = tokens
        .first()
        .ok_or_else(|| RecoverError::malformed("no token given"))?;

    let alg = first.algorithm();
    info!(%alg, tokens = tokens.len(), "dispatching");

    match alg {
        Algorithm::RsaPkcs1v15(_) => {
            let key = recover_rsa_key(&tokens, &options.rsa, rng)?;
            Ok(Recovery::Rsa { alg, key })
        }
        Algorithm::Ecdsa(_) => {
            let candidates = recover_ecdsa_key(first)?;
            Ok(Recovery::Ecdsa { alg, candidates })
        }
        Algorithm::RsaPss(name) => Err(RecoverError::unsupported(
            name,
            UnsupportedReason::NonDeterministicPadding,
        )),
        Algorithm::Hmac(name) => Err(RecoverError::unsupported(
            name,
            UnsupportedReason::Symmetric,
        )),
        Algorithm::Unknown(name) => Err(RecoverError::unsupported(
            name,
            UnsupportedReason::Unrecognized,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use serde_json::json;

    fn raw(alg: &str) -> String {
        Token::encode(&json!({ "alg": alg, "typ": "JWT" }), b"{}", &[1, 2, 3])
    }

    #[test]
    fn test_no_tokens() {
        let tokens: [&str; 0] = [];
        let result = recover(&tokens, &RecoveryOptions::default(), &mut OsRng);
        assert!(matches!(result, Err(RecoverError::MalformedToken(_))));
    }

    #[test]
    fn test_unsupported_families() {
        let cases = [
            ("PS256", UnsupportedReason::NonDeterministicPadding),
            ("PS512", UnsupportedReason::NonDeterministicPadding),
            ("HS256", UnsupportedReason::Symmetric),
            ("EdDSA", UnsupportedReason::Unrecognized),
            ("none", UnsupportedReason::Unrecognized),
        ];
        for (alg, expected) in cases {
            match recover(&[raw(alg)], &RecoveryOptions::default(), &mut OsRng) {
                Err(RecoverError::UnsupportedAlgorithm { alg: name, reason }) => {
                    assert_eq!(name, alg);
                    assert_eq!(reason, expected);
                }
                other => panic!("unexpected result for {alg}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_any_malformed_token_fails_the_run() {
        let tokens = [raw("RS256"), "not-a-token".to_owned()];
        let result = recover(&tokens, &RecoveryOptions::default(), &mut OsRng);
        assert!(matches!(result, Err(RecoverError::MalformedToken(_))));
    }
}
