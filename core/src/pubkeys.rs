use const_oid::{
    db::rfc5912::{ID_EC_PUBLIC_KEY, SECP_256_R_1, SECP_384_R_1, SECP_521_R_1},
    ObjectIdentifier,
};
use der::{asn1::BitString, Any, Encode};
use elliptic_curve::{
    sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint},
    CurveArithmetic, PublicKey,
};
use pem::{EncodeConfig, LineEnding, Pem};
use rsa::{pkcs8::EncodePublicKey, BigUint, RsaPublicKey};
use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::{
    algorithm::NamedCurve,
    error::{RecoverError, Result},
};

/// Largest modulus accepted when exporting a recovered RSA key.
const MAX_MODULUS_BITS: usize = 16384;

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecoveredRsaKey {
    #[serde_as(as = "DisplayFromStr")]
    pub modulus: BigUint,
    #[serde_as(as = "DisplayFromStr")]
    pub exponent: BigUint,
}

impl RecoveredRsaKey {
    pub fn bits(&self) -> usize {
        self.modulus.bits()
    }

    /// SubjectPublicKeyInfo DER.
    pub fn to_public_key_der(&self) -> Result<Vec<u8>> {
        let key = RsaPublicKey::new_with_max_size(
            self.modulus.clone(),
            self.exponent.clone(),
            MAX_MODULUS_BITS,
        )?;
        Ok(key.to_public_key_der()?.into_vec())
    }

    pub fn to_pem(&self) -> Result<String> {
        Ok(public_key_pem(self.to_public_key_der()?))
    }
}

impl NamedCurve {
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            NamedCurve::P256 => SECP_256_R_1,
            NamedCurve::P384 => SECP_384_R_1,
            NamedCurve::P521 => SECP_521_R_1,
        }
    }
}

/// One candidate public key produced by ECDSA recovery.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecoveredEcKey {
    pub curve: NamedCurve,
    #[serde_as(as = "DisplayFromStr")]
    pub x: BigUint,
    #[serde_as(as = "DisplayFromStr")]
    pub y: BigUint,
    #[serde(skip)]
    uncompressed: Vec<u8>,
    #[serde(skip)]
    compressed: Vec<u8>,
}

impl RecoveredEcKey {
    pub fn from_public_key<C>(curve: NamedCurve, pubkey: &PublicKey<C>) -> Result<Self>
    where
        C: CurveArithmetic,
        C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
        C::FieldBytesSize: ModulusSize,
    {
        let point = pubkey.to_encoded_point(false);
        let missing =
            || RecoverError::Encoding("recovered point has no affine coordinates".into());

        let x = BigUint::from_bytes_be(point.x().ok_or_else(missing)?);
        let y = BigUint::from_bytes_be(point.y().ok_or_else(missing)?);

        Ok(Self {
            curve,
            x,
            y,
            uncompressed: point.as_bytes().to_vec(),
            compressed: pubkey.to_encoded_point(true).as_bytes().to_vec(),
        })
    }

    /// SEC1 encoded point.
    pub fn sec1_bytes(&self, compressed: bool) -> &[u8] {
        if compressed {
            &self.compressed
        } else {
            &self.uncompressed
        }
    }

    /// SubjectPublicKeyInfo DER with the namedCurve parameter.
    pub fn to_public_key_der(&self, compressed: bool) -> Result<Vec<u8>> {
        let spki = SubjectPublicKeyInfoOwned {
            algorithm: AlgorithmIdentifierOwned {
                oid: ID_EC_PUBLIC_KEY,
                parameters: Some(Any::from(self.curve.oid())),
            },
            subject_public_key: BitString::from_bytes(self.sec1_bytes(compressed))?,
        };
        Ok(spki.to_der()?)
    }

    pub fn to_pem(&self, compressed: bool) -> Result<String> {
        Ok(public_key_pem(self.to_public_key_der(compressed)?))
    }
}

fn public_key_pem(der: Vec<u8>) -> String {
    pem::encode_config(
        &Pem::new("PUBLIC KEY", der),
        EncodeConfig::new().set_line_ending(LineEnding::LF),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::Decode;
    use elliptic_curve::sec1::EncodedPoint;
    use rsa::{pkcs8::DecodePublicKey, traits::PublicKeyParts};

    fn mersenne(p: usize) -> BigUint {
        (BigUint::from(1u32) << p) - BigUint::from(1u32)
    }

    #[test]
    fn test_rsa_pem_round_trip() {
        let key = RecoveredRsaKey {
            modulus: mersenne(127) * mersenne(89),
            exponent: BigUint::from(65537u32),
        };
        assert_eq!(key.bits(), 216);

        let pem = key.to_pem().unwrap();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----\n"));

        let parsed = RsaPublicKey::from_public_key_pem(&pem).unwrap();
        assert_eq!(parsed.n(), &key.modulus);
        assert_eq!(parsed.e(), &key.exponent);
    }

    #[test]
    fn test_ec_pem_round_trip() {
        let pubkey = p256::SecretKey::random(&mut rand::rngs::OsRng).public_key();
        let key = RecoveredEcKey::from_public_key(NamedCurve::P256, &pubkey).unwrap();

        assert_eq!(key.sec1_bytes(false).len(), 65);
        assert_eq!(key.sec1_bytes(true).len(), 33);

        let pem = key.to_pem(false).unwrap();
        let parsed = p256::PublicKey::from_public_key_pem(&pem).unwrap();
        assert_eq!(parsed, pubkey);

        let compressed_der = key.to_public_key_der(true).unwrap();
        let spki = SubjectPublicKeyInfoOwned::from_der(&compressed_der).unwrap();
        assert_eq!(spki.algorithm.oid, ID_EC_PUBLIC_KEY);
        let point =
            EncodedPoint::<p256::NistP256>::from_bytes(spki.subject_public_key.raw_bytes())
                .unwrap();
        assert!(point.is_compressed());
        assert_eq!(p256::PublicKey::from_encoded_point(&point).unwrap(), pubkey);
    }
}
