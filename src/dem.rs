//! DEM: the symmetric half of the hybrid scheme.
//!
//! The hybrid layer only sees `DemHelper` (key size + cipher factory) and
//! `DemCipher` (seal/open). Two implementations ship with the crate:
//!
//!   AES-GCM           nonce[12] || ct || tag[16]
//!   AES-CTR-HMAC      iv[16] || ct || tag[tag_size]
//!                     key = aes_key || hmac_key
//!                     tag = HMAC(hmac_key, aad || iv || ct || bitlen(aad) as u64 BE)
//!
//! Each derived key is used for exactly one message.

extern crate alloc;
use alloc::vec::Vec;

use aes::{Aes128, Aes256};
use aes_gcm::aead::{self, Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use ctr::cipher::{KeyIvInit, StreamCipher};
use getrandom::getrandom;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{EciesError, Result};
use crate::kdf::HashType;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

pub const GCM_NONCE_BYTES: usize = 12;
pub const GCM_TAG_BYTES: usize = 16;
pub const CTR_IV_BYTES: usize = 16;

const MIN_HMAC_KEY_BYTES: usize = 16;
const MIN_TAG_BYTES: usize = 10;

/// AES key length accepted by both DEMs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AesKeySize {
    Aes128,
    Aes256,
}

impl AesKeySize {
    pub const fn bytes(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes256 => 32,
        }
    }

    /// `None` for any length other than 16 or 32.
    pub const fn from_key_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(Self::Aes128),
            32 => Some(Self::Aes256),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// AEAD object bound to one derived key.
pub trait DemCipher {
    fn seal(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>>;
    fn open(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>>;
}

/// Factory the hybrid layer asks for key size and for a keyed cipher.
pub trait DemHelper {
    type Cipher: DemCipher;

    /// Bytes of HKDF output the cipher consumes.
    fn symmetric_key_size(&self) -> usize;

    /// Fixed ciphertext expansion (nonce/IV plus tag).
    fn ciphertext_overhead(&self) -> usize;

    fn wrap_cipher(&self, derived_key: &[u8]) -> Result<Self::Cipher>;
}

// ---------------------------------------------------------------------------
// AES-GCM
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AesGcmDem {
    key_size: AesKeySize,
}

impl AesGcmDem {
    pub fn new(key_size: usize) -> Result<Self> {
        let key_size = AesKeySize::from_key_len(key_size)
            .ok_or(EciesError::InvalidArgument("aes_gcm_key_size"))?;
        Ok(Self { key_size })
    }

    pub fn aes128() -> Self {
        Self {
            key_size: AesKeySize::Aes128,
        }
    }

    pub fn aes256() -> Self {
        Self {
            key_size: AesKeySize::Aes256,
        }
    }

    pub fn key_size(&self) -> AesKeySize {
        self.key_size
    }
}

impl DemHelper for AesGcmDem {
    type Cipher = AesGcmCipher;

    fn symmetric_key_size(&self) -> usize {
        self.key_size.bytes()
    }

    fn ciphertext_overhead(&self) -> usize {
        GCM_NONCE_BYTES + GCM_TAG_BYTES
    }

    fn wrap_cipher(&self, derived_key: &[u8]) -> Result<AesGcmCipher> {
        if derived_key.len() != self.key_size.bytes() {
            return Err(EciesError::InvalidArgument("dem_key"));
        }
        Ok(AesGcmCipher {
            key: Zeroizing::new(derived_key.to_vec()),
            key_size: self.key_size,
        })
    }
}

pub struct AesGcmCipher {
    key: Zeroizing<Vec<u8>>,
    key_size: AesKeySize,
}

impl DemCipher for AesGcmCipher {
    fn seal(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        let nonce = random_bytes::<GCM_NONCE_BYTES>()?;
        let (key, aad) = (self.key.as_slice(), associated_data);
        let sealed = match self.key_size {
            AesKeySize::Aes128 => gcm_seal::<Aes128Gcm>(key, &nonce, plaintext, aad)?,
            AesKeySize::Aes256 => gcm_seal::<Aes256Gcm>(key, &nonce, plaintext, aad)?,
        };

        let mut out = Vec::with_capacity(GCM_NONCE_BYTES + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn open(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        // Reported like a forged tag.
        if ciphertext.len() < GCM_NONCE_BYTES + GCM_TAG_BYTES {
            return Err(EciesError::AuthenticationFailure);
        }
        let (nonce, sealed) = ciphertext.split_at(GCM_NONCE_BYTES);
        match self.key_size {
            AesKeySize::Aes128 => gcm_open::<Aes128Gcm>(&self.key, nonce, sealed, associated_data),
            AesKeySize::Aes256 => gcm_open::<Aes256Gcm>(&self.key, nonce, sealed, associated_data),
        }
    }
}

fn gcm_seal<A: Aead + KeyInit>(
    key: &[u8],
    nonce: &[u8],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = A::new_from_slice(key).map_err(|_| EciesError::InvalidArgument("dem_key"))?;
    let payload = Payload { msg: plaintext, aad };
    cipher
        .encrypt(aead::Nonce::<A>::from_slice(nonce), payload)
        .map_err(|_| EciesError::EncryptionFailure)
}

fn gcm_open<A: Aead + KeyInit>(
    key: &[u8],
    nonce: &[u8],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = A::new_from_slice(key).map_err(|_| EciesError::AuthenticationFailure)?;
    let payload = Payload { msg: ciphertext, aad };
    cipher
        .decrypt(aead::Nonce::<A>::from_slice(nonce), payload)
        .map_err(|_| EciesError::AuthenticationFailure)
}

// ---------------------------------------------------------------------------
// AES-CTR + HMAC (encrypt-then-MAC)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AesCtrHmacDem {
    aes_key_size: AesKeySize,
    hmac_hash: HashType,
    hmac_key_size: usize,
    tag_size: usize,
}

impl AesCtrHmacDem {
    pub fn new(
        aes_key_size: usize,
        hmac_hash: HashType,
        hmac_key_size: usize,
        tag_size: usize,
    ) -> Result<Self> {
        let aes_key_size = AesKeySize::from_key_len(aes_key_size)
            .ok_or(EciesError::InvalidArgument("aes_ctr_key_size"))?;
        if hmac_key_size < MIN_HMAC_KEY_BYTES {
            return Err(EciesError::InvalidArgument("hmac_key_size"));
        }
        if tag_size < MIN_TAG_BYTES || tag_size > hmac_hash.output_size() {
            return Err(EciesError::InvalidArgument("hmac_tag_size"));
        }
        Ok(Self {
            aes_key_size,
            hmac_hash,
            hmac_key_size,
            tag_size,
        })
    }

    /// AES-128-CTR, 16-byte IV, HMAC-SHA256 with a 32-byte key and 16-byte tag.
    pub fn aes128_ctr_hmac_sha256() -> Self {
        Self {
            aes_key_size: AesKeySize::Aes128,
            hmac_hash: HashType::Sha256,
            hmac_key_size: 32,
            tag_size: 16,
        }
    }

    /// AES-256-CTR, 16-byte IV, HMAC-SHA256 with a 32-byte key and 32-byte tag.
    pub fn aes256_ctr_hmac_sha256() -> Self {
        Self {
            aes_key_size: AesKeySize::Aes256,
            hmac_hash: HashType::Sha256,
            hmac_key_size: 32,
            tag_size: 32,
        }
    }

    pub fn aes_key_size(&self) -> AesKeySize {
        self.aes_key_size
    }
}

impl DemHelper for AesCtrHmacDem {
    type Cipher = AesCtrHmacCipher;

    fn symmetric_key_size(&self) -> usize {
        self.aes_key_size.bytes() + self.hmac_key_size
    }

    fn ciphertext_overhead(&self) -> usize {
        CTR_IV_BYTES + self.tag_size
    }

    fn wrap_cipher(&self, derived_key: &[u8]) -> Result<AesCtrHmacCipher> {
        if derived_key.len() != self.symmetric_key_size() {
            return Err(EciesError::InvalidArgument("dem_key"));
        }
        let (aes_key, hmac_key) = derived_key.split_at(self.aes_key_size.bytes());
        Ok(AesCtrHmacCipher {
            aes_key: Zeroizing::new(aes_key.to_vec()),
            aes_key_size: self.aes_key_size,
            hmac_key: Zeroizing::new(hmac_key.to_vec()),
            hmac_hash: self.hmac_hash,
            tag_size: self.tag_size,
        })
    }
}

pub struct AesCtrHmacCipher {
    aes_key: Zeroizing<Vec<u8>>,
    aes_key_size: AesKeySize,
    hmac_key: Zeroizing<Vec<u8>>,
    hmac_hash: HashType,
    tag_size: usize,
}

impl AesCtrHmacCipher {
    fn apply_keystream(&self, iv: &[u8], buf: &mut [u8]) -> Result<()> {
        let key = self.aes_key.as_slice();
        let applied = match self.aes_key_size {
            AesKeySize::Aes128 => {
                Aes128Ctr::new_from_slices(key, iv).map(|mut c| c.apply_keystream(buf))
            }
            AesKeySize::Aes256 => {
                Aes256Ctr::new_from_slices(key, iv).map(|mut c| c.apply_keystream(buf))
            }
        };
        applied.map_err(|_| EciesError::InvalidArgument("dem_key"))
    }

    /// HMAC over `aad || iv_and_ct || bitlen(aad)`, truncated to the tag size.
    fn tag(&self, associated_data: &[u8], iv_and_ct: &[u8]) -> Result<Vec<u8>> {
        let aad_bits = (associated_data.len() as u64).wrapping_mul(8).to_be_bytes();
        let parts = [associated_data, iv_and_ct, &aad_bits[..]];

        let mut full = match self.hmac_hash {
            HashType::Sha1 => hmac_parts::<Hmac<Sha1>>(&self.hmac_key, &parts)?,
            HashType::Sha256 => hmac_parts::<Hmac<Sha256>>(&self.hmac_key, &parts)?,
            HashType::Sha384 => hmac_parts::<Hmac<Sha384>>(&self.hmac_key, &parts)?,
            HashType::Sha512 => hmac_parts::<Hmac<Sha512>>(&self.hmac_key, &parts)?,
        };
        full.truncate(self.tag_size);
        Ok(full)
    }
}

impl DemCipher for AesCtrHmacCipher {
    fn seal(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        let iv = random_bytes::<CTR_IV_BYTES>()?;

        let mut out = Vec::with_capacity(CTR_IV_BYTES + plaintext.len() + self.tag_size);
        out.extend_from_slice(&iv);
        out.extend_from_slice(plaintext);
        self.apply_keystream(&iv, &mut out[CTR_IV_BYTES..])?;

        let tag = self.tag(associated_data, &out)?;
        out.extend_from_slice(&tag);
        Ok(out)
    }

    fn open(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < CTR_IV_BYTES + self.tag_size {
            return Err(EciesError::AuthenticationFailure);
        }
        let (iv_and_ct, received_tag) = ciphertext.split_at(ciphertext.len() - self.tag_size);

        let expected_tag = self.tag(associated_data, iv_and_ct)?;
        if !bool::from(expected_tag.as_slice().ct_eq(received_tag)) {
            return Err(EciesError::AuthenticationFailure);
        }

        let (iv, ct) = iv_and_ct.split_at(CTR_IV_BYTES);
        let mut plaintext = ct.to_vec();
        self.apply_keystream(iv, &mut plaintext)?;
        Ok(plaintext)
    }
}

fn hmac_parts<M: Mac + KeyInit>(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>> {
    let mut mac =
        <M as KeyInit>::new_from_slice(key).map_err(|_| EciesError::InvalidArgument("hmac_key"))?;
    for part in parts {
        Mac::update(&mut mac, part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Random nonce/IV. Used during encryption only.
fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut out = [0u8; N];
    getrandom(&mut out).map_err(|_| EciesError::EncryptionFailure)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<D: DemHelper>(dem: &D) {
        let key: Vec<u8> = (0..dem.symmetric_key_size()).map(|i| i as u8).collect();
        let cipher = dem.wrap_cipher(&key).unwrap();

        for plaintext in [&b""[..], &b"x"[..], &b"a somewhat longer message spanning blocks"[..]] {
            let ct = cipher.seal(plaintext, b"aad").unwrap();
            assert_eq!(ct.len(), plaintext.len() + dem.ciphertext_overhead());
            assert_eq!(cipher.open(&ct, b"aad").unwrap(), plaintext);
        }
    }

    #[test]
    fn gcm_roundtrip() {
        roundtrip(&AesGcmDem::aes128());
        roundtrip(&AesGcmDem::aes256());
    }

    #[test]
    fn ctr_hmac_roundtrip() {
        roundtrip(&AesCtrHmacDem::aes128_ctr_hmac_sha256());
        roundtrip(&AesCtrHmacDem::aes256_ctr_hmac_sha256());
        roundtrip(&AesCtrHmacDem::new(16, HashType::Sha1, 20, 10).unwrap());
        roundtrip(&AesCtrHmacDem::new(32, HashType::Sha512, 64, 64).unwrap());
    }

    #[test]
    fn key_sizes() {
        assert_eq!(AesGcmDem::aes128().symmetric_key_size(), 16);
        assert_eq!(AesGcmDem::aes256().symmetric_key_size(), 32);
        assert_eq!(AesCtrHmacDem::aes128_ctr_hmac_sha256().symmetric_key_size(), 48);
        assert_eq!(AesCtrHmacDem::aes128_ctr_hmac_sha256().ciphertext_overhead(), 32);
        assert_eq!(AesCtrHmacDem::aes256_ctr_hmac_sha256().symmetric_key_size(), 64);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(AesGcmDem::new(24), Err(EciesError::InvalidArgument("aes_gcm_key_size")));
        assert_eq!(
            AesCtrHmacDem::new(16, HashType::Sha256, 32, 33),
            Err(EciesError::InvalidArgument("hmac_tag_size"))
        );
        assert_eq!(
            AesCtrHmacDem::new(16, HashType::Sha256, 8, 16),
            Err(EciesError::InvalidArgument("hmac_key_size"))
        );
        assert!(AesGcmDem::aes128().wrap_cipher(&[0u8; 32]).is_err());
    }

    #[test]
    fn tampering_is_detected() {
        let gcm = AesGcmDem::aes128().wrap_cipher(&[7u8; 16]).unwrap();
        let ctr = AesCtrHmacDem::aes128_ctr_hmac_sha256().wrap_cipher(&[7u8; 48]).unwrap();

        let ct = gcm.seal(b"payload", b"aad").unwrap();
        for i in 0..ct.len() {
            let mut bad = ct.clone();
            bad[i] ^= 0x01;
            assert_eq!(gcm.open(&bad, b"aad"), Err(EciesError::AuthenticationFailure));
        }
        assert_eq!(gcm.open(&ct, b"aae"), Err(EciesError::AuthenticationFailure));

        let ct = ctr.seal(b"payload", b"aad").unwrap();
        for i in 0..ct.len() {
            let mut bad = ct.clone();
            bad[i] ^= 0x80;
            assert_eq!(ctr.open(&bad, b"aad"), Err(EciesError::AuthenticationFailure));
        }
        assert_eq!(ctr.open(&ct, b""), Err(EciesError::AuthenticationFailure));
    }

    #[test]
    fn short_input_is_authentication_failure() {
        let gcm = AesGcmDem::aes256().wrap_cipher(&[1u8; 32]).unwrap();
        for len in [0, 1, 12, 27] {
            assert_eq!(gcm.open(&vec![0u8; len], b""), Err(EciesError::AuthenticationFailure));
        }

        let ctr = AesCtrHmacDem::aes128_ctr_hmac_sha256().wrap_cipher(&[1u8; 48]).unwrap();
        for len in [0, 15, 16, 31] {
            assert_eq!(ctr.open(&vec![0u8; len], b""), Err(EciesError::AuthenticationFailure));
        }
    }

    #[test]
    fn aes_key_size_is_closed() {
        assert_eq!(AesKeySize::from_key_len(16), Some(AesKeySize::Aes128));
        assert_eq!(AesKeySize::from_key_len(32), Some(AesKeySize::Aes256));
        for len in [0, 15, 17, 24, 31, 33, 64] {
            assert_eq!(AesKeySize::from_key_len(len), None);
        }
        assert_eq!(AesGcmDem::new(24), Err(EciesError::InvalidArgument("aes_gcm_key_size")));
        assert_eq!(
            AesCtrHmacDem::new(24, HashType::Sha256, 32, 16),
            Err(EciesError::InvalidArgument("aes_ctr_key_size"))
        );
        assert_eq!(AesGcmDem::new(16).unwrap().key_size(), AesKeySize::Aes128);
        assert_eq!(
            AesCtrHmacDem::aes256_ctr_hmac_sha256().aes_key_size(),
            AesKeySize::Aes256
        );
    }

    #[test]
    fn gcm_key_size_selects_the_cipher() {
        // Output must open under the matching aes-gcm type and no other.
        let key = [9u8; 32];
        let ct = AesGcmDem::aes128().wrap_cipher(&key[..16]).unwrap().seal(b"m", b"a").unwrap();
        let (nonce, sealed) = ct.split_at(GCM_NONCE_BYTES);
        assert_eq!(gcm_open::<Aes128Gcm>(&key[..16], nonce, sealed, b"a").unwrap(), b"m");

        let ct = AesGcmDem::aes256().wrap_cipher(&key).unwrap().seal(b"m", b"a").unwrap();
        let (nonce, sealed) = ct.split_at(GCM_NONCE_BYTES);
        assert_eq!(gcm_open::<Aes256Gcm>(&key, nonce, sealed, b"a").unwrap(), b"m");
    }
}
