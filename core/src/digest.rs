use const_oid::{
    db::rfc5912::{ID_SHA_256, ID_SHA_384, ID_SHA_512},
    AssociatedOid, ObjectIdentifier,
};
use digest::Digest;
use smallvec::SmallVec;

/// Hash functions used by the JWS RS*/ES* algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sha2 {
    Sha256,
    Sha384,
    Sha512,
}

impl Sha2 {
    pub fn digest(&self, payload: impl AsRef<[u8]>) -> SmallVec<[u8; 64]> {
        match &self {
            Sha2::Sha256 => {
                let result = sha2::Sha256::digest(payload);
                SmallVec::from_slice(&result[..])
            }
            Sha2::Sha384 => {
                let result = sha2::Sha384::digest(payload);
                SmallVec::from_slice(&result[..])
            }
            Sha2::Sha512 => {
                let result = sha2::Sha512::digest(payload);
                SmallVec::from_slice(&result[..])
            }
        }
    }

    pub fn from_bits(bits: &str) -> Option<Self> {
        match bits {
            "256" => Some(Self::Sha256),
            "384" => Some(Self::Sha384),
            "512" => Some(Self::Sha512),
            _ => None,
        }
    }

    pub fn output_size(&self) -> usize {
        match self {
            Sha2::Sha256 => 32,
            Sha2::Sha384 => 48,
            Sha2::Sha512 => 64,
        }
    }

    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            Sha2::Sha256 => ID_SHA_256,
            Sha2::Sha384 => ID_SHA_384,
            Sha2::Sha512 => ID_SHA_512,
        }
    }

    /// DER encoded `DigestInfo` up to, but excluding, the digest bytes.
    pub fn digest_info_prefix(&self) -> Vec<u8> {
        match self {
            Sha2::Sha256 => digest_info_prefix::<sha2::Sha256>(),
            Sha2::Sha384 => digest_info_prefix::<sha2::Sha384>(),
            Sha2::Sha512 => digest_info_prefix::<sha2::Sha512>(),
        }
    }
}

/// prefix = 0x30 <oid_len + 8 + digest_len> 0x30 <oid_len + 4> 0x06 <oid_len> oid 0x05 0x00 0x04 <digest_len>
fn digest_info_prefix<D>() -> Vec<u8>
where
    D: Digest + AssociatedOid,
{
    let oid = D::OID.as_bytes();
    let oid_len = oid.len() as u8;
    let digest_len = <D as Digest>::output_size() as u8;
    let mut v = vec![
        0x30,
        oid_len + 8 + digest_len,
        0x30,
        oid_len + 4,
        0x06,
        oid_len,
    ];
    v.extend_from_slice(oid);
    v.extend_from_slice(&[0x05, 0x00, 0x04, digest_len]);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_sizes_match_digests() {
        for h in [Sha2::Sha256, Sha2::Sha384, Sha2::Sha512] {
            assert_eq!(h.digest(b"abc").len(), h.output_size());
        }
    }

    #[test]
    fn test_sha256_digest_info_prefix() {
        // RFC 8017 § 9.2, note 1
        let expected = hex::decode("3031300d060960864801650304020105000420").unwrap();
        assert_eq!(Sha2::Sha256.digest_info_prefix(), expected);
    }

    #[test]
    fn test_prefix_carries_oid() {
        for h in [Sha2::Sha256, Sha2::Sha384, Sha2::Sha512] {
            let prefix = h.digest_info_prefix();
            let oid = h.oid();
            assert!(prefix
                .windows(oid.as_bytes().len())
                .any(|w| w == oid.as_bytes()));
            assert_eq!(*prefix.last().unwrap() as usize, h.output_size());
        }
    }
}
