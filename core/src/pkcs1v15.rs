use crate::{
    digest::Sha2,
    error::{RecoverError, Result},
};

/// Smallest encoded message overhead: 0x00 0x01, eight 0xFF, 0x00.
const MIN_PADDING: usize = 11;

/// Checks that a `key_size_bytes` modulus can carry a `digest_variant` DigestInfo.
pub fn check_fits(digest_variant: Sha2, key_size_bytes: usize) -> Result<()> {
    let t_len = digest_variant.digest_info_prefix().len() + digest_variant.output_size();
    if key_size_bytes < t_len + MIN_PADDING {
        return Err(RecoverError::impossible(format!(
            "a {}-bit key is too small for {:?} PKCS#1 v1.5 padding",
            key_size_bytes * 8,
            digest_variant
        )));
    }
    Ok(())
}

/// Creates the PKCS#1 v1.5 encoded message `EM` signed for `message`.
///
/// EM = 0x00 || 0x01 || PS || 0x00 || DigestInfo, with PS made of 0xFF bytes so
/// that EM is exactly `key_size_bytes` long. The result only depends on the
/// hash algorithm, the key length and the message, never on the key itself.
pub fn encode(digest_variant: Sha2, message: &[u8], key_size_bytes: usize) -> Result<Vec<u8>> {
    check_fits(digest_variant, key_size_bytes)?;

    let digest = digest_variant.digest(message);
    let prefix = digest_variant.digest_info_prefix();
    let t_len = prefix.len() + digest.len();

    let mut em = Vec::with_capacity(key_size_bytes);
    em.push(0x00);
    em.push(0x01);
    em.resize(key_size_bytes - t_len - 1, 0xFF);
    em.push(0x00);
    em.extend_from_slice(&prefix);
    em.extend_from_slice(&digest);

    debug_assert_eq!(em.len(), key_size_bytes);
    Ok(em)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkcs1v15_message_sizes() {
        let msg_1024_sha256 = encode(Sha2::Sha256, b"a.b", 128).unwrap();
        assert_eq!(msg_1024_sha256.len(), 128);

        let msg_2048_sha384 = encode(Sha2::Sha384, b"a.b", 256).unwrap();
        assert_eq!(msg_2048_sha384.len(), 256);

        let msg_4096_sha512 = encode(Sha2::Sha512, b"a.b", 512).unwrap();
        assert_eq!(msg_4096_sha512.len(), 512);
    }

    #[test]
    fn test_block_layout() {
        let message = b"eyJhbGciOiJSUzI1NiJ9.e30";
        let em = encode(Sha2::Sha256, message, 256).unwrap();
        let digest = Sha2::Sha256.digest(message);
        let prefix = Sha2::Sha256.digest_info_prefix();

        assert_eq!(&em[..2], &[0x00, 0x01]);
        assert_eq!(&em[em.len() - digest.len()..], &digest[..]);

        let t_len = prefix.len() + digest.len();
        let separator = em.len() - t_len - 1;
        assert_eq!(em[separator], 0x00);
        assert!(em[2..separator].iter().all(|&b| b == 0xFF));
        assert_eq!(&em[separator + 1..separator + 1 + prefix.len()], &prefix[..]);
    }

    #[test]
    fn test_too_small_key_is_rejected() {
        // 51 bytes of DigestInfo for SHA-256 plus 11 bytes of overhead
        assert!(check_fits(Sha2::Sha256, 62).is_ok());
        assert!(matches!(
            check_fits(Sha2::Sha256, 61),
            Err(RecoverError::RecoveryImpossible(_))
        ));
        assert!(encode(Sha2::Sha512, b"", 64).is_err());
    }
}
