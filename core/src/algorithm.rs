use std::fmt;

use serde::Serialize;

use crate::digest::Sha2;

/// Named curves behind the ES* algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NamedCurve {
    #[serde(rename = "P-256")]
    P256,
    #[serde(rename = "P-384")]
    P384,
    #[serde(rename = "P-521")]
    P521,
}

impl NamedCurve {
    pub fn hash(&self) -> Sha2 {
        match self {
            NamedCurve::P256 => Sha2::Sha256,
            NamedCurve::P384 => Sha2::Sha384,
            NamedCurve::P521 => Sha2::Sha512,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NamedCurve::P256 => "P-256",
            NamedCurve::P384 => "P-384",
            NamedCurve::P521 => "P-521",
        }
    }
}

impl fmt::Display for NamedCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The `alg` header value, classified once into the family that decides how
/// (and whether) a key can be recovered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Algorithm {
    /// RS256, RS384, RS512
    RsaPkcs1v15(Sha2),
    /// ES256, ES384, ES512
    Ecdsa(NamedCurve),
    /// Any PS* value.
    RsaPss(String),
    /// Any HS* value.
    Hmac(String),
    Unknown(String),
}

impl Algorithm {
    pub fn parse(alg: &str) -> Self {
        let bits = alg.get(2..).unwrap_or_default();
        match alg.get(..2).unwrap_or_default() {
            "RS" => match Sha2::from_bits(bits) {
                Some(h) => Algorithm::RsaPkcs1v15(h),
                None => Algorithm::Unknown(alg.to_owned()),
            },
            "ES" => match bits {
                "256" => Algorithm::Ecdsa(NamedCurve::P256),
                "384" => Algorithm::Ecdsa(NamedCurve::P384),
                "512" => Algorithm::Ecdsa(NamedCurve::P521),
                _ => Algorithm::Unknown(alg.to_owned()),
            },
            "PS" => Algorithm::RsaPss(alg.to_owned()),
            "HS" => Algorithm::Hmac(alg.to_owned()),
            _ => Algorithm::Unknown(alg.to_owned()),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::RsaPkcs1v15(h) => write!(f, "RS{}", h.output_size() * 8),
            Algorithm::Ecdsa(c) => write!(f, "ES{}", c.hash().output_size() * 8),
            Algorithm::RsaPss(alg) | Algorithm::Hmac(alg) | Algorithm::Unknown(alg) => {
                f.write_str(alg)
            }
        }
    }
}
