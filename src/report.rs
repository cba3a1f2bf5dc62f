use std::fmt::Write;

use color_eyre::eyre::{Context, Result};
use jwt_recover_core::{
    EcCandidates, RecoverError, RecoveredEcKey, RecoveredRsaKey, Recovery, UnsupportedReason,
};
use serde::Serialize;

/// Human readable report of a recovery run.
pub fn render_text(outcome: &Result<Recovery, RecoverError>, compressed: bool) -> Result<String> {
    let mut out = String::new();
    match outcome {
        Ok(Recovery::Rsa { alg, key }) => {
            writeln!(out, "Recovering public key for algorithm {alg}...")?;
            writeln!(out, "Found public RSA key !")?;
            writeln!(out, "n={}", key.modulus)?;
            writeln!(out, "e={}", key.exponent)?;
            out.push_str(&key.to_pem().wrap_err("exporting RSA key")?);
        }
        Ok(Recovery::Ecdsa { alg, candidates }) => {
            writeln!(out, "Recovering public key for algorithm {alg}...")?;
            writeln!(
                out,
                "There are 2 public keys that can produce this signature."
            )?;
            writeln!(
                out,
                "As it's not possible to know which one was used, both are displayed below."
            )?;
            for candidate in &candidates.candidates {
                writeln!(out)?;
                writeln!(out, "x={}", candidate.x)?;
                writeln!(out, "y={}", candidate.y)?;
                out.push_str(
                    &candidate
                        .to_pem(compressed)
                        .wrap_err("exporting ECDSA key")?,
                );
            }
        }
        Err(RecoverError::UnsupportedAlgorithm { alg, reason }) => match reason {
            UnsupportedReason::NonDeterministicPadding => writeln!(
                out,
                "Sadly it's not possible to recover the public key for {alg}, \
                 as it uses a non-deterministic padding."
            )?,
            UnsupportedReason::Symmetric => writeln!(
                out,
                "{alg} is based on HMAC, which doesn't use a public key."
            )?,
            UnsupportedReason::Unrecognized => {
                writeln!(out, "Algorithm {alg} is not supported.")?
            }
        },
        Err(RecoverError::RecoveryImpossible(reason)) => {
            writeln!(out, "Failed to recover the public key !")?;
            writeln!(out, "{reason}")?;
        }
        Err(err) => writeln!(out, "Error: {err}")?,
    }
    Ok(out)
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JsonReport<'a> {
    Rsa {
        alg: String,
        #[serde(flatten)]
        key: &'a RecoveredRsaKey,
        bits: usize,
        pem: String,
    },
    Ecdsa {
        alg: String,
        curve: jwt_recover_core::NamedCurve,
        candidates: Vec<JsonEcCandidate<'a>>,
    },
    Error {
        error: String,
    },
}

#[derive(Serialize)]
struct JsonEcCandidate<'a> {
    #[serde(flatten)]
    key: &'a RecoveredEcKey,
    pem: String,
}

fn ec_candidates(candidates: &EcCandidates, compressed: bool) -> Result<Vec<JsonEcCandidate<'_>>> {
    candidates
        .candidates
        .iter()
        .map(|key| {
            Ok(JsonEcCandidate {
                key,
                pem: key.to_pem(compressed).wrap_err("exporting ECDSA key")?,
            })
        })
        .collect()
}

/// Machine readable report of a recovery run.
pub fn render_json(outcome: &Result<Recovery, RecoverError>, compressed: bool) -> Result<String> {
    let report = match outcome {
        Ok(Recovery::Rsa { alg, key }) => JsonReport::Rsa {
            alg: alg.to_string(),
            key,
            bits: key.bits(),
            pem: key.to_pem().wrap_err("exporting RSA key")?,
        },
        Ok(Recovery::Ecdsa { alg, candidates }) => JsonReport::Ecdsa {
            alg: alg.to_string(),
            curve: candidates.curve,
            candidates: ec_candidates(candidates, compressed)?,
        },
        Err(err) => JsonReport::Error {
            error: err.to_string(),
        },
    };
    serde_json::to_string_pretty(&report).wrap_err("serializing report to json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use jwt_recover_core::{Algorithm, NamedCurve};
    use rsa::BigUint;
    use serde_json::Value;

    fn rsa_recovery() -> Recovery {
        // (2^89 − 1)(2^127 − 1)
        let one = BigUint::from(1u32);
        let p = (BigUint::from(1u32) << 89usize) - &one;
        let q = (BigUint::from(1u32) << 127usize) - &one;
        Recovery::Rsa {
            alg: Algorithm::parse("RS256"),
            key: RecoveredRsaKey {
                modulus: p * q,
                exponent: BigUint::from(65537u32),
            },
        }
    }

    #[test]
    fn test_rsa_text_report() {
        let text = render_text(&Ok(rsa_recovery()), false).unwrap();
        assert!(text.starts_with("Recovering public key for algorithm RS256...\n"));
        assert!(text.contains("Found public RSA key !\n"));
        assert!(text.contains("e=65537\n"));
        assert!(text.contains("-----BEGIN PUBLIC KEY-----"));
    }

    #[test]
    fn test_rsa_json_report() {
        let json = render_json(&Ok(rsa_recovery()), false).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "rsa");
        assert_eq!(value["alg"], "RS256");
        assert_eq!(value["exponent"], "65537");
        assert_eq!(value["bits"], 216);
        assert!(value["pem"].as_str().unwrap().contains("PUBLIC KEY"));
    }

    #[test]
    fn test_unsupported_messages() {
        let pss = Err(RecoverError::unsupported(
            "PS256",
            UnsupportedReason::NonDeterministicPadding,
        ));
        assert!(render_text(&pss, false)
            .unwrap()
            .contains("non-deterministic padding"));

        let hmac = Err(RecoverError::unsupported("HS256", UnsupportedReason::Symmetric));
        assert_eq!(
            render_text(&hmac, false).unwrap(),
            "HS256 is based on HMAC, which doesn't use a public key.\n"
        );
    }

    #[test]
    fn test_failure_suggests_the_exponent() {
        let outcome = Err(RecoverError::impossible(
            "no common modulus found, maybe e != 3?",
        ));
        let text = render_text(&outcome, false).unwrap();
        assert!(text.starts_with("Failed to recover the public key !\n"));
        assert!(text.contains("maybe e != 3?"));
    }

    #[test]
    fn test_error_json_report() {
        let outcome = Err(RecoverError::malformed("expected 3 dot-separated segments, found 1"));
        let value: Value = serde_json::from_str(&render_json(&outcome, false).unwrap()).unwrap();
        assert_eq!(value["kind"], "error");
        assert!(value["error"].as_str().unwrap().starts_with("malformed token"));
    }

    #[test]
    fn test_curve_name_in_json() {
        assert_eq!(serde_json::to_value(NamedCurve::P384).unwrap(), "P-384");
    }
}
