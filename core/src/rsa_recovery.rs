use rand::RngCore;
use rug::{ops::Pow, Integer};
use tracing::{debug, warn};

use crate::{
    algorithm::Algorithm,
    digest::Sha2,
    error::{RecoverError, Result, UnsupportedReason},
    numeric::{estimate_key_size, from_bytes_be, remove_small_primes, to_biguint, ProbeKey},
    pkcs1v15,
    pubkeys::RecoveredRsaKey,
    token::Token,
};

pub const DEFAULT_EXPONENT: u32 = 65537;
pub const DEFAULT_SMALL_PRIME_BOUND: u32 = 2000;
/// Keeps `s^e` for an 8192-bit signature around a gigabit.
pub const MAX_EXPONENT: u32 = 1 << 17;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RsaOptions {
    /// Guessed public exponent of the signing key.
    pub exponent: u32,
    /// Prime factors below this bound are stripped from the gcd.
    pub small_prime_bound: u32,
}

impl Default for RsaOptions {
    fn default() -> Self {
        Self {
            exponent: DEFAULT_EXPONENT,
            small_prime_bound: DEFAULT_SMALL_PRIME_BOUND,
        }
    }
}

/// Recovers the modulus shared by RS256/RS384/RS512 signed tokens.
///
/// For every token `s^e ≡ EM (mod n)`, where `EM` is the PKCS#1 v1.5 encoded
/// hash of its signing input. Each `s^e − EM` is therefore a multiple of `n`,
/// and their gcd is `n` times a few small primes.
pub fn recover_rsa_key(
    tokens: &[Token],
    options: &RsaOptions,
    rng: &mut impl RngCore,
) -> Result<RecoveredRsaKey> {
    let hash = check_tokens(tokens)?;
    check_exponent(options.exponent)?;

    let signatures: Vec<Integer> = tokens
        .iter()
        .map(|t| from_bytes_be(t.signature()))
        .collect();
    if signatures.iter().all(|s| *s == signatures[0]) {
        return Err(RecoverError::impossible(
            "the tokens carry the same signature; distinct messages are needed",
        ));
    }

    let bits = estimate_key_size(&signatures[0]);
    pkcs1v15::check_fits(hash, (bits / 8) as usize)?;
    debug!(bits, "estimated modulus size");

    let probe = ProbeKey::generate(bits, options.exponent, rng);
    debug!(probe_bits = probe.bits(), "generated probe key");

    let mut n = Integer::new();
    for (token, s) in tokens.iter().zip(signatures) {
        let padded = padded_hash(&probe, hash, &token.signed_message())?;
        let multiple = s.pow(options.exponent) - padded;
        n.gcd_mut(&multiple);
    }
    debug!(gcd_bits = n.significant_bits(), "gcd of signature residues");

    let n = remove_small_primes(n, options.small_prime_bound);
    if n <= 1 {
        return Err(RecoverError::impossible(format!(
            "no common modulus found, maybe e != {}?",
            options.exponent
        )));
    }
    if n.significant_bits() != bits {
        warn!(
            expected = bits,
            found = n.significant_bits(),
            "recovered modulus size differs from the estimate; it may still hold extra factors"
        );
    }

    Ok(RecoveredRsaKey {
        modulus: to_biguint(&n),
        exponent: options.exponent.into(),
    })
}

/// Validates the token set before any numeric work and returns its hash.
fn check_tokens(tokens: &[Token]) -> Result<Sha2> {
    let first = tokens.first().ok_or(RecoverError::InsufficientTokens {
        alg: "RSA".into(),
        needed: 2,
        found: 0,
    })?;

    let hash = match first.algorithm() {
        Algorithm::RsaPkcs1v15(hash) => hash,
        Algorithm::RsaPss(alg) => {
            return Err(RecoverError::unsupported(
                alg,
                UnsupportedReason::NonDeterministicPadding,
            ))
        }
        Algorithm::Hmac(alg) => {
            return Err(RecoverError::unsupported(alg, UnsupportedReason::Symmetric))
        }
        other => {
            return Err(RecoverError::unsupported(
                other.to_string(),
                UnsupportedReason::Unrecognized,
            ))
        }
    };

    if tokens.len() < 2 {
        return Err(RecoverError::InsufficientTokens {
            alg: first.alg().to_owned(),
            needed: 2,
            found: tokens.len(),
        });
    }

    if let Some(other) = tokens.iter().find(|t| t.alg() != first.alg()) {
        return Err(RecoverError::AlgorithmMismatch {
            expected: first.alg().to_owned(),
            found: other.alg().to_owned(),
        });
    }

    Ok(hash)
}

/// An RSA exponent is odd, so that it is invertible modulo `(p - 1)(q - 1)`,
/// and at least 3.
fn check_exponent(e: u32) -> Result<()> {
    if e < 3 || e % 2 == 0 {
        return Err(RecoverError::impossible(format!(
            "e = {e} is not a valid RSA public exponent"
        )));
    }
    if e > MAX_EXPONENT {
        return Err(RecoverError::impossible(format!(
            "e = {e} is too large, s^e would not fit in memory (max {MAX_EXPONENT})"
        )));
    }
    Ok(())
}

/// Signs and verifies the encoded message with the probe key, which yields
/// the same value for any key of that size.
fn padded_hash(probe: &ProbeKey, hash: Sha2, message: &[u8]) -> Result<Integer> {
    let em = pkcs1v15::encode(hash, message, (probe.bits() / 8) as usize)?;
    let signature = probe.sign_raw(&from_bytes_be(&em));
    Ok(probe.verify_raw(&signature))
}
