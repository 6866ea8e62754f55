//! KEM: ephemeral key generation + ECDH on NIST P-256 / P-384 / P-521.
//!
//! Private key  = scalar in [1, n-1], fixed-width big-endian (fieldLen bytes)
//! Shared secret = x-coordinate of (peer_public * own_private), fixed width
//!
//! Scalars and shared secrets live in `Zeroizing` buffers and are wiped when
//! they go out of scope.

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use core::fmt;

use elliptic_curve::group::{Curve as _, Group as _};
use elliptic_curve::point::AffineCoordinates;
use elliptic_curve::sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint};
use elliptic_curve::{AffinePoint, CurveArithmetic, FieldBytes, FieldBytesSize, SecretKey};
use p256::NistP256;
use p384::NistP384;
use p521::NistP521;
use rand_core::{CryptoRng, OsRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

use crate::curve::{self, CurveType, EcPoint};
use crate::error::{EciesError, Result};

/// Rejection-sampling bound. With the leading byte masked, a candidate is
/// out of range with probability well under 2^-32 on every supported curve.
const MAX_KEYGEN_ATTEMPTS: usize = 64;

// ---------------------------------------------------------------------------
// Private key
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct EcPrivateKey {
    curve: CurveType,
    scalar: Zeroizing<Vec<u8>>,
}

impl EcPrivateKey {
    pub fn generate(curve: CurveType) -> Result<Self> {
        Self::generate_with_rng(curve, &mut OsRng)
    }

    /// Draw a scalar uniformly from [1, n-1].
    pub fn generate_with_rng<R>(curve: CurveType, rng: &mut R) -> Result<Self>
    where
        R: CryptoRng + RngCore,
    {
        let mut candidate = Zeroizing::new(vec![0u8; curve.field_size_in_bytes()]);

        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            rng.try_fill_bytes(&mut candidate[..])
                .map_err(|_| EciesError::KeyGenerationFailure)?;
            candidate[0] &= curve.leading_byte_mask();

            if scalar_in_range(curve, &candidate) {
                return Ok(Self {
                    curve,
                    scalar: candidate,
                });
            }
        }

        Err(EciesError::KeyGenerationFailure)
    }

    /// Load a big-endian scalar. Shorter inputs are left-padded.
    pub fn from_bytes(curve: CurveType, bytes: &[u8]) -> Result<Self> {
        let scalar = Zeroizing::new(
            curve::fixed_width(bytes, curve.field_size_in_bytes())
                .map_err(|_| EciesError::InvalidPrivateKey)?,
        );
        if !scalar_in_range(curve, &scalar) {
            return Err(EciesError::InvalidPrivateKey);
        }
        Ok(Self { curve, scalar })
    }

    pub fn curve(&self) -> CurveType {
        self.curve
    }

    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        self.scalar.clone()
    }

    pub fn public_key(&self) -> Result<EcPoint> {
        match self.curve {
            CurveType::NistP256 => public_point::<NistP256>(self.curve, &self.scalar),
            CurveType::NistP384 => public_point::<NistP384>(self.curve, &self.scalar),
            CurveType::NistP521 => public_point::<NistP521>(self.curve, &self.scalar),
        }
    }
}

impl fmt::Debug for EcPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcPrivateKey")
            .field("curve", &self.curve)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Key pair
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct KeyPair {
    private: EcPrivateKey,
    public: EcPoint,
}

impl KeyPair {
    pub fn generate(curve: CurveType) -> Result<Self> {
        Self::generate_with_rng(curve, &mut OsRng)
    }

    pub fn generate_with_rng<R>(curve: CurveType, rng: &mut R) -> Result<Self>
    where
        R: CryptoRng + RngCore,
    {
        Self::from_private_key(EcPrivateKey::generate_with_rng(curve, rng)?)
    }

    pub fn from_private_key(private: EcPrivateKey) -> Result<Self> {
        let public = private.public_key()?;
        Ok(Self { private, public })
    }

    pub fn private_key(&self) -> &EcPrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &EcPoint {
        &self.public
    }
}

/// Fresh single-use key pair on `curve` drawn from the OS RNG.
pub fn generate_ephemeral_key_pair(curve: CurveType) -> Result<KeyPair> {
    KeyPair::generate(curve)
}

pub fn generate_ephemeral_key_pair_with_rng<R: CryptoRng + RngCore>(
    curve: CurveType,
    rng: &mut R,
) -> Result<KeyPair> {
    KeyPair::generate_with_rng(curve, rng)
}

// ---------------------------------------------------------------------------
// ECDH
// ---------------------------------------------------------------------------

/// x-coordinate of `peer_public * own_private`, fixed-width big-endian.
pub fn shared_secret(
    own_private: &EcPrivateKey,
    peer_public: &EcPoint,
) -> Result<Zeroizing<Vec<u8>>> {
    if own_private.curve != peer_public.curve() {
        return Err(EciesError::InvalidPublicKey);
    }

    match own_private.curve {
        CurveType::NistP256 => diffie_hellman::<NistP256>(&own_private.scalar, peer_public),
        CurveType::NistP384 => diffie_hellman::<NistP384>(&own_private.scalar, peer_public),
        CurveType::NistP521 => diffie_hellman::<NistP521>(&own_private.scalar, peer_public),
    }
}

fn diffie_hellman<C>(scalar: &[u8], peer: &EcPoint) -> Result<Zeroizing<Vec<u8>>>
where
    C: CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    let secret = secret_key::<C>(scalar)?;
    let public = curve::public_key::<C>(peer.x(), peer.y())
        .map_err(|_| EciesError::InvalidPublicKey)?;

    let product = public.to_projective() * *secret.to_nonzero_scalar();
    if bool::from(product.is_identity()) {
        return Err(EciesError::PointAtInfinity);
    }

    let mut shared_point = product.to_affine();
    let mut x = shared_point.x();
    let out = Zeroizing::new(x.to_vec());

    x.as_mut_slice().zeroize();
    shared_point.zeroize();
    Ok(out)
}

fn public_point<C>(curve: CurveType, scalar: &[u8]) -> Result<EcPoint>
where
    C: CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    let secret = secret_key::<C>(scalar)?;
    EcPoint::from_public_key(curve, &secret.public_key())
}

fn secret_key<C: CurveArithmetic>(scalar: &[u8]) -> Result<SecretKey<C>> {
    if scalar.len() != FieldBytes::<C>::default().len() {
        return Err(EciesError::InvalidPrivateKey);
    }
    SecretKey::<C>::from_bytes(FieldBytes::<C>::from_slice(scalar))
        .map_err(|_| EciesError::InvalidPrivateKey)
}

fn scalar_in_range(curve: CurveType, scalar: &[u8]) -> bool {
    match curve {
        CurveType::NistP256 => secret_key::<NistP256>(scalar).is_ok(),
        CurveType::NistP384 => secret_key::<NistP384>(scalar).is_ok(),
        CurveType::NistP521 => secret_key::<NistP521>(scalar).is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{decode_point, PointFormat};
    use core::num::NonZeroU32;

    const RECIPIENT_PRIVATE: &str =
        "c9afa9d845ba75166b5c215767b1d6934e50c3db36e89b127b8a622b120f6721";
    const RECIPIENT_PUBLIC: &str = concat!(
        "0460fed4ba255a9d31c961eb74c6356d68c049b8923b61fa6ce669622e60f29f",
        "b67903fe1008b8bc99a41ae9e95628bc64f2f1b20c2d7e9f5177a3c294d44622",
        "99",
    );
    const EPHEMERAL_PRIVATE: &str =
        "7c1d5d93d3b4f4f0ad2c3f0b2c1d8e9a1f4f2b63a89d6e0f3e5a2b1c9d8e7f60";
    const EPHEMERAL_PUBLIC: &str = concat!(
        "0440b9954ab5b91a905066073e74fa54fa0b6b1c1a797c1362196c8cc91ef8db",
        "0173757a7c4479266c12bab7b7d5d6ce62c314511bbe3866abc106ba70e4751b",
        "27",
    );
    const SHARED_SECRET: &str =
        "c9d0308c4b03437f3f58b85197fc42144049391d7f36f607e3a234bb7b2cced1";

    struct FailingRng;

    impl RngCore for FailingRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> RngResult {
            Err(rand_core::Error::from(NonZeroU32::new(rand_core::Error::CUSTOM_START).unwrap()))
        }
    }

    impl CryptoRng for FailingRng {}

    type RngResult = core::result::Result<(), rand_core::Error>;

    /// Always yields 0xFF bytes: above the P-256 order, never accepted.
    struct SaturatedRng;

    impl RngCore for SaturatedRng {
        fn next_u32(&mut self) -> u32 {
            u32::MAX
        }
        fn next_u64(&mut self) -> u64 {
            u64::MAX
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0xFF);
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> RngResult {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for SaturatedRng {}

    fn point(hex_point: &str) -> EcPoint {
        let bytes = hex::decode(hex_point).unwrap();
        decode_point(&bytes, CurveType::NistP256, PointFormat::Uncompressed).unwrap()
    }

    fn p256_key(hex_scalar: &str) -> EcPrivateKey {
        EcPrivateKey::from_bytes(CurveType::NistP256, &hex::decode(hex_scalar).unwrap()).unwrap()
    }

    #[test]
    fn known_answer_shared_secret() {
        let recipient = p256_key(RECIPIENT_PRIVATE);
        let ephemeral = p256_key(EPHEMERAL_PRIVATE);

        assert_eq!(recipient.public_key().unwrap(), point(RECIPIENT_PUBLIC));
        assert_eq!(ephemeral.public_key().unwrap(), point(EPHEMERAL_PUBLIC));

        let sender_side = shared_secret(&ephemeral, &point(RECIPIENT_PUBLIC)).unwrap();
        let recipient_side = shared_secret(&recipient, &point(EPHEMERAL_PUBLIC)).unwrap();
        assert_eq!(hex::encode(&*sender_side), SHARED_SECRET);
        assert_eq!(*sender_side, *recipient_side);
    }

    #[test]
    fn both_parties_agree_on_every_curve() {
        for curve in CurveType::ALL {
            let alice = KeyPair::generate(curve).unwrap();
            let bob = generate_ephemeral_key_pair(curve).unwrap();

            let ab = shared_secret(alice.private_key(), bob.public_key()).unwrap();
            let ba = shared_secret(bob.private_key(), alice.public_key()).unwrap();
            assert_eq!(ab.len(), curve.field_size_in_bytes());
            assert_eq!(*ab, *ba);
        }
    }

    #[test]
    fn ephemeral_keys_are_fresh() {
        let a = generate_ephemeral_key_pair(CurveType::NistP384).unwrap();
        let b = generate_ephemeral_key_pair(CurveType::NistP384).unwrap();
        assert_ne!(a.public_key(), b.public_key());
        assert_ne!(*a.private_key().to_bytes(), *b.private_key().to_bytes());
    }

    #[test]
    fn private_key_roundtrip() {
        for curve in CurveType::ALL {
            let key = EcPrivateKey::generate(curve).unwrap();
            let bytes = key.to_bytes();
            assert_eq!(bytes.len(), curve.field_size_in_bytes());
            let again = EcPrivateKey::from_bytes(curve, &bytes).unwrap();
            assert_eq!(again.public_key().unwrap(), key.public_key().unwrap());
        }
    }

    #[test]
    fn rejects_out_of_range_scalars() {
        assert_eq!(
            EcPrivateKey::from_bytes(CurveType::NistP256, &[0u8; 32]).unwrap_err(),
            EciesError::InvalidPrivateKey
        );
        assert_eq!(
            EcPrivateKey::from_bytes(CurveType::NistP256, &[0xFFu8; 32]).unwrap_err(),
            EciesError::InvalidPrivateKey
        );
        assert_eq!(
            EcPrivateKey::from_bytes(CurveType::NistP256, &[0x01u8; 33]).unwrap_err(),
            EciesError::InvalidPrivateKey
        );
    }

    #[test]
    fn rejects_peer_on_other_curve() {
        let own = EcPrivateKey::generate(CurveType::NistP256).unwrap();
        let peer = KeyPair::generate(CurveType::NistP384).unwrap();
        assert_eq!(
            shared_secret(&own, peer.public_key()).unwrap_err(),
            EciesError::InvalidPublicKey
        );
    }

    #[test]
    fn broken_rng_fails_key_generation() {
        let curve = CurveType::NistP256;
        assert_eq!(
            generate_ephemeral_key_pair_with_rng(curve, &mut FailingRng).unwrap_err(),
            EciesError::KeyGenerationFailure
        );
        assert_eq!(
            generate_ephemeral_key_pair_with_rng(curve, &mut SaturatedRng).unwrap_err(),
            EciesError::KeyGenerationFailure
        );
    }

    #[test]
    fn debug_redacts_private_key() {
        let key = p256_key(RECIPIENT_PRIVATE);
        let rendered = format!("{:?}", key);
        assert!(rendered.contains("NistP256"));
        assert!(!rendered.contains("c9af"));
        assert!(!rendered.to_lowercase().contains("scalar"));
    }
}
