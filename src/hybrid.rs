//! Hybrid encrypt / decrypt: KEM -> HKDF -> DEM.
//!
//! Encrypt:
//!   eph            = fresh key pair on the recipient's curve
//!   shared_secret  = ECDH(eph.private, recipient_public).x
//!   kem_bytes      = encode(eph.public, point_format)
//!   key            = HKDF(hash, kem_bytes || shared_secret, salt, info, dem.key_size)
//!   output         = kem_bytes || DEM.seal(key, pt, aad)
//!
//! `info` defaults to the UNCOMPRESSED encoding of the recipient public key.
//! Decrypt mirrors this with the recipient private key, hashing the
//! ephemeral key bytes exactly as received. Every bit of the ephemeral key
//! encoding therefore reaches the KDF, including the compressed sign bit
//! that ECDH alone ignores.

extern crate alloc;
use alloc::vec::Vec;

use rand_core::{CryptoRng, OsRng, RngCore};
use zeroize::Zeroizing;

use crate::curve::{decode_point, encode_point, CurveType, EcPoint, PointFormat};
use crate::dem::{DemCipher, DemHelper};
use crate::error::{EciesError, Result};
use crate::kdf::{self, HashType, HkdfParams};
use crate::kem::{self, EcPrivateKey};
use crate::wire;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Construction input for [`HybridEncrypt`] and [`HybridDecrypt`].
///
/// Every field is optional at build time; the constructors report the first
/// missing one as `InvalidArgument("<field>")`.
#[derive(Debug)]
pub struct EciesConfig<D> {
    recipient_public_key: Option<EcPoint>,
    recipient_private_key: Option<EcPrivateKey>,
    hkdf_hash: Option<HashType>,
    point_format: Option<PointFormat>,
    dem_helper: Option<D>,
    salt: Vec<u8>,
    context_info: Option<Vec<u8>>,
}

impl<D> Default for EciesConfig<D> {
    fn default() -> Self {
        Self {
            recipient_public_key: None,
            recipient_private_key: None,
            hkdf_hash: None,
            point_format: None,
            dem_helper: None,
            salt: Vec::new(),
            context_info: None,
        }
    }
}

impl<D: DemHelper> EciesConfig<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recipient_public_key(mut self, key: EcPoint) -> Self {
        self.recipient_public_key = Some(key);
        self
    }

    pub fn recipient_private_key(mut self, key: EcPrivateKey) -> Self {
        self.recipient_private_key = Some(key);
        self
    }

    pub fn hkdf_hash(mut self, hash: HashType) -> Self {
        self.hkdf_hash = Some(hash);
        self
    }

    pub fn point_format(mut self, format: PointFormat) -> Self {
        self.point_format = Some(format);
        self
    }

    pub fn dem_helper(mut self, dem: D) -> Self {
        self.dem_helper = Some(dem);
        self
    }

    pub fn salt(mut self, salt: &[u8]) -> Self {
        self.salt = salt.to_vec();
        self
    }

    /// Replaces the default HKDF info (the recipient public key).
    pub fn context_info(mut self, info: &[u8]) -> Self {
        self.context_info = Some(info.to_vec());
        self
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or(EciesError::InvalidArgument(field))
}

/// DEM key from the KEM output: HKDF over `kem_bytes || shared_secret`.
fn derive_dem_key(
    hkdf: &HkdfParams,
    kem_bytes: &[u8],
    shared_secret: &[u8],
    key_size: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut ikm = Zeroizing::new(Vec::with_capacity(kem_bytes.len() + shared_secret.len()));
    ikm.extend_from_slice(kem_bytes);
    ikm.extend_from_slice(shared_secret);
    kdf::derive(&ikm, hkdf, key_size)
}

fn hkdf_info(recipient_public: &EcPoint, context_info: Option<Vec<u8>>) -> Result<Vec<u8>> {
    match context_info {
        Some(info) => Ok(info),
        None => encode_point(recipient_public, PointFormat::Uncompressed),
    }
}

// ---------------------------------------------------------------------------
// Encrypt
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct HybridEncrypt<D: DemHelper> {
    recipient_public_key: EcPoint,
    point_format: PointFormat,
    dem_helper: D,
    hkdf: HkdfParams,
}

impl<D: DemHelper> HybridEncrypt<D> {
    pub fn new(config: EciesConfig<D>) -> Result<Self> {
        let recipient_public_key = required(config.recipient_public_key, "recipient_public_key")?;
        let hash = required(config.hkdf_hash, "hkdf_hash")?;
        let point_format = required(config.point_format, "point_format")?;
        let dem_helper = required(config.dem_helper, "dem_helper")?;

        // Legacy encoding is accepted from old producers, never emitted.
        if point_format == PointFormat::LegacyUncompressed {
            return Err(EciesError::InvalidArgument("point_format"));
        }

        let info = hkdf_info(&recipient_public_key, config.context_info)?;
        let hkdf = HkdfParams::new(hash, &config.salt, &info);

        tracing::debug!(
            curve = %recipient_public_key.curve(),
            hash = %hash,
            point_format = %point_format,
            dem_key_size = dem_helper.symmetric_key_size(),
            "ecies encryptor ready"
        );

        Ok(Self {
            recipient_public_key,
            point_format,
            dem_helper,
            hkdf,
        })
    }

    pub fn curve(&self) -> CurveType {
        self.recipient_public_key.curve()
    }

    pub fn point_format(&self) -> PointFormat {
        self.point_format
    }

    /// Ciphertext length for a plaintext of `plaintext_len` bytes.
    pub fn ciphertext_len(&self, plaintext_len: usize) -> usize {
        wire::min_ciphertext_len(self.curve(), self.point_format, &self.dem_helper) + plaintext_len
    }

    pub fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        self.encrypt_with_rng(plaintext, associated_data, &mut OsRng)
    }

    /// As [`encrypt`](Self::encrypt), drawing the ephemeral scalar from `rng`.
    pub fn encrypt_with_rng<R: CryptoRng + RngCore>(
        &self,
        plaintext: &[u8],
        associated_data: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        let ephemeral = kem::generate_ephemeral_key_pair_with_rng(self.curve(), rng)?;
        let ephemeral_public_key = encode_point(ephemeral.public_key(), self.point_format)?;
        let shared_secret =
            kem::shared_secret(ephemeral.private_key(), &self.recipient_public_key)?;
        let key = derive_dem_key(
            &self.hkdf,
            &ephemeral_public_key,
            &shared_secret,
            self.dem_helper.symmetric_key_size(),
        )?;

        let dem_ciphertext = self
            .dem_helper
            .wrap_cipher(&key)?
            .seal(plaintext, associated_data)?;

        Ok(wire::encode_wire(&ephemeral_public_key, &dem_ciphertext))
    }
}

// ---------------------------------------------------------------------------
// Decrypt
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct HybridDecrypt<D: DemHelper> {
    recipient_private_key: EcPrivateKey,
    point_format: PointFormat,
    dem_helper: D,
    hkdf: HkdfParams,
}

impl<D: DemHelper> HybridDecrypt<D> {
    pub fn new(config: EciesConfig<D>) -> Result<Self> {
        let recipient_private_key =
            required(config.recipient_private_key, "recipient_private_key")?;
        let hash = required(config.hkdf_hash, "hkdf_hash")?;
        let point_format = required(config.point_format, "point_format")?;
        let dem_helper = required(config.dem_helper, "dem_helper")?;

        let recipient_public_key = recipient_private_key.public_key()?;
        let info = hkdf_info(&recipient_public_key, config.context_info)?;
        let hkdf = HkdfParams::new(hash, &config.salt, &info);

        tracing::debug!(
            curve = %recipient_private_key.curve(),
            hash = %hash,
            point_format = %point_format,
            dem_key_size = dem_helper.symmetric_key_size(),
            "ecies decryptor ready"
        );

        Ok(Self {
            recipient_private_key,
            point_format,
            dem_helper,
            hkdf,
        })
    }

    pub fn curve(&self) -> CurveType {
        self.recipient_private_key.curve()
    }

    pub fn point_format(&self) -> PointFormat {
        self.point_format
    }

    /// No partial plaintext is ever returned.
    pub fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        self.decrypt_inner(ciphertext, associated_data).map_err(|e| {
            tracing::debug!(error = %e, "ecies decrypt rejected");
            e
        })
    }

    fn decrypt_inner(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        let parts = wire::decode_wire(ciphertext, self.curve(), self.point_format)?;
        let ephemeral_public_key =
            decode_point(parts.ephemeral_public_key, self.curve(), self.point_format)?;

        let shared_secret = kem::shared_secret(&self.recipient_private_key, &ephemeral_public_key)?;
        let key = derive_dem_key(
            &self.hkdf,
            parts.ephemeral_public_key,
            &shared_secret,
            self.dem_helper.symmetric_key_size(),
        )?;

        self.dem_helper
            .wrap_cipher(&key)?
            .open(parts.dem_ciphertext, associated_data)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

pub fn new_encryptor<D: DemHelper>(config: EciesConfig<D>) -> Result<HybridEncrypt<D>> {
    HybridEncrypt::new(config)
}

pub fn new_decryptor<D: DemHelper>(config: EciesConfig<D>) -> Result<HybridDecrypt<D>> {
    HybridDecrypt::new(config)
}
