//! Big-integer helpers for the RSA engine.

use rand::RngCore;
use rug::{integer::Order, Integer};
use tracing::debug;

/// Primes strictly below `limit`, by sieve of Eratosthenes.
pub fn small_primes(limit: u32) -> Vec<u32> {
    let limit = limit as usize;
    if limit < 3 {
        return Vec::new();
    }
    let mut composite = vec![false; limit];
    let mut primes = Vec::new();
    for i in 2..limit {
        if composite[i] {
            continue;
        }
        primes.push(i as u32);
        for j in (i * i..limit).step_by(i) {
            composite[j] = true;
        }
    }
    primes
}

/// Divides out every prime factor below `bound`, as many times as it occurs.
pub fn remove_small_primes(mut n: Integer, bound: u32) -> Integer {
    if n == 0 {
        return n;
    }
    for p in small_primes(bound) {
        let mut exp = 0;
        while n.is_divisible_u(p) {
            n.div_exact_u_mut(p);
            exp += 1;
        }
        if exp > 0 {
            debug!(p, exp, "stripped small factor");
        }
    }
    n
}

/// Guesses the modulus size from a signature: the next power of two at or
/// above its bit length. Exact for the usual 1024/2048/4096-bit keys.
pub fn estimate_key_size(signature: &Integer) -> u32 {
    signature.significant_bits().next_power_of_two()
}

pub fn from_bytes_be(bytes: &[u8]) -> Integer {
    Integer::from_digits(bytes, Order::Msf)
}

pub fn to_biguint(n: &Integer) -> rsa::BigUint {
    rsa::BigUint::from_bytes_be(&n.to_digits::<u8>(Order::Msf))
}

/// A random prime of exactly `bits` bits with its two top bits set, so the
/// product of two of them has exactly `2 * bits` bits. `bits` below 2 is
/// raised to 2.
pub fn random_prime(bits: u32, rng: &mut impl RngCore) -> Integer {
    let bits = bits.max(2);
    let mut bytes = vec![0u8; bits.div_ceil(8) as usize];
    loop {
        rng.fill_bytes(&mut bytes);
        let mut candidate = from_bytes_be(&bytes);
        candidate.keep_bits_mut(bits);
        candidate.set_bit(bits - 1, true);
        candidate.set_bit(bits - 2, true);
        let prime = (candidate - 1u32).next_prime();
        if prime.significant_bits() == bits {
            return prime;
        }
    }
}

/// Throwaway RSA key, only ever used to produce padded hashes for a given
/// modulus size.
#[derive(Clone, Debug)]
pub struct ProbeKey {
    pub n: Integer,
    pub e: Integer,
    pub d: Integer,
    pub p: Integer,
    pub q: Integer,
}

impl ProbeKey {
    /// Samples primes until `e` is invertible modulo `(p - 1)(q - 1)`.
    ///
    /// Only terminates for an odd `e >= 3` and a `bits` large enough for two
    /// distinct primes; callers check both first.
    pub fn generate(bits: u32, e: u32, rng: &mut impl RngCore) -> Self {
        let e = Integer::from(e);
        loop {
            let p = random_prime(bits / 2, rng);
            let q = random_prime(bits - bits / 2, rng);
            if p == q {
                continue;
            }
            let phi = Integer::from(&p - 1u32) * Integer::from(&q - 1u32);
            if let Ok(d) = e.clone().invert(&phi) {
                let n = Integer::from(&p * &q);
                return Self { n, e, d, p, q };
            }
        }
    }

    pub fn bits(&self) -> u32 {
        self.n.significant_bits()
    }

    /// `m^d mod n`
    pub fn sign_raw(&self, m: &Integer) -> Integer {
        Integer::from(m.secure_pow_mod_ref(&self.d, &self.n))
    }

    /// `s^e mod n`
    pub fn verify_raw(&self, s: &Integer) -> Integer {
        Integer::from(s.secure_pow_mod_ref(&self.e, &self.n))
    }
}
