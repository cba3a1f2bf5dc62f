use elliptic_curve::{
    ff::{Field, PrimeField},
    generic_array::typenum::Unsigned,
    group::Group,
    ops::Reduce,
    point::DecompressPoint,
    sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint},
    subtle::Choice,
    CurveArithmetic, FieldBytes, PrimeCurve, PublicKey,
};
use serde::Serialize;
use tracing::debug;

use crate::{
    algorithm::{Algorithm, NamedCurve},
    digest::Sha2,
    error::{RecoverError, Result, UnsupportedReason},
    pubkeys::RecoveredEcKey,
    token::Token,
};

/// The two public keys consistent with one ECDSA signature.
///
/// Exactly one of them signed the token. Telling which one requires an
/// external oracle, e.g. a second token verified against both.
#[derive(Clone, Debug, Serialize)]
pub struct EcCandidates {
    pub curve: NamedCurve,
    pub candidates: [RecoveredEcKey; 2],
}

pub fn recover_ecdsa_key(token: &Token) -> Result<EcCandidates> {
    let curve = match token.algorithm() {
        Algorithm::Ecdsa(curve) => curve,
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

    let (r, s) = token.ecdsa_signature()?;
    let message = token.signed_message();
    debug!(%curve, r_len = r.len(), "recovering ECDSA key");

    let candidates = match curve {
        NamedCurve::P256 => recover_on::<p256::NistP256>(curve, &message, r, s)?,
        NamedCurve::P384 => recover_on::<p384::NistP384>(curve, &message, r, s)?,
        NamedCurve::P521 => recover_on::<p521::NistP521>(curve, &message, r, s)?,
    };

    Ok(EcCandidates { curve, candidates })
}

fn recover_on<C>(
    curve: NamedCurve,
    message: &[u8],
    r: &[u8],
    s: &[u8],
) -> Result<[RecoveredEcKey; 2]>
where
    C: PrimeCurve + CurveArithmetic,
    C::AffinePoint: DecompressPoint<C> + FromEncodedPoint<C> + ToEncodedPoint<C>,
    C::FieldBytesSize: ModulusSize,
{
    let [even, odd] = recover_candidates::<C>(message, r, s, curve.hash())?;
    Ok([
        RecoveredEcKey::from_public_key(curve, &even)?,
        RecoveredEcKey::from_public_key(curve, &odd)?,
    ])
}

/// Computes `K = r⁻¹·(s·R − h·G)` for both points `R` whose x-coordinate is `r`.
///
/// The first key comes from the `R` with an even y-coordinate, the second from
/// its negation.
pub fn recover_candidates<C>(
    message: &[u8],
    r: &[u8],
    s: &[u8],
    hash: Sha2,
) -> Result<[PublicKey<C>; 2]>
where
    C: PrimeCurve + CurveArithmetic,
    C::AffinePoint: DecompressPoint<C>,
{
    let r_bytes = field_bytes::<C>(r)
        .ok_or_else(|| RecoverError::impossible("r is wider than the curve field"))?;
    let s_bytes = field_bytes::<C>(s)
        .ok_or_else(|| RecoverError::impossible("s is wider than the curve field"))?;

    let r_scalar: C::Scalar = Option::from(C::Scalar::from_repr(r_bytes.clone()))
        .ok_or_else(|| RecoverError::impossible("r is not below the curve order"))?;
    let s_scalar: C::Scalar = Option::from(C::Scalar::from_repr(s_bytes))
        .ok_or_else(|| RecoverError::impossible("s is not below the curve order"))?;
    let r_inv: C::Scalar = Option::from(Field::invert(&r_scalar))
        .ok_or_else(|| RecoverError::impossible("r is zero"))?;

    let z = bits_to_field::<C>(&hash.digest(message));
    let h = <C::Scalar as Reduce<C::Uint>>::reduce_bytes(&z);
    let g = C::ProjectivePoint::generator();

    let recover = |y_is_odd: u8| -> Result<PublicKey<C>> {
        let big_r: C::AffinePoint =
            Option::from(C::AffinePoint::decompress(&r_bytes, Choice::from(y_is_odd)))
                .ok_or_else(|| {
                    RecoverError::impossible("r is not the x-coordinate of a curve point")
                })?;
        let k = (C::ProjectivePoint::from(big_r) * s_scalar - g * h) * r_inv;
        PublicKey::from_affine(k.into())
            .map_err(|_| RecoverError::impossible("recovered key is the point at infinity"))
    };

    Ok([recover(0)?, recover(1)?])
}

/// Left-pads a big-endian integer to the curve's field width.
fn field_bytes<C: CurveArithmetic>(bytes: &[u8]) -> Option<FieldBytes<C>> {
    let size = C::FieldBytesSize::USIZE;
    if bytes.len() > size {
        return None;
    }
    let mut out = FieldBytes::<C>::default();
    out[size - bytes.len()..].copy_from_slice(bytes);
    Some(out)
}

/// Keeps the leftmost field-width bytes of a digest, left-padding shorter
/// ones (SHA-512 on P-521).
fn bits_to_field<C: CurveArithmetic>(digest: &[u8]) -> FieldBytes<C> {
    let size = C::FieldBytesSize::USIZE;
    field_bytes::<C>(digest).unwrap_or_else(|| {
        let mut field = FieldBytes::<C>::default();
        field.copy_from_slice(&digest[..size]);
        field
    })
}
