//! KDF: HKDF-Extract-and-Expand over a selectable hash.
//!
//! okm = HKDF-<hash>(ikm, salt, info, len)
//!
//! An empty salt is treated as absent (HashLen zero bytes), which is the
//! same PRK either way.

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use core::fmt;
use core::str::FromStr;

use hkdf::Hkdf;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::error::{EciesError, Result};

/// HKDF output is limited to 255 blocks of the hash output.
const MAX_OUTPUT_BLOCKS: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HashType {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashType {
    pub const fn output_size(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    pub const fn max_output_len(self) -> usize {
        MAX_OUTPUT_BLOCKS * self.output_size()
    }

    pub const fn identifier(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
        }
    }
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for HashType {
    type Err = EciesError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SHA1" | "SHA-1" => Ok(Self::Sha1),
            "SHA256" | "SHA-256" => Ok(Self::Sha256),
            "SHA384" | "SHA-384" => Ok(Self::Sha384),
            "SHA512" | "SHA-512" => Ok(Self::Sha512),
            _ => Err(EciesError::UnsupportedHash),
        }
    }
}

/// Everything besides the input keying material that determines the HKDF output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HkdfParams {
    hash: HashType,
    salt: Vec<u8>,
    info: Vec<u8>,
}

impl HkdfParams {
    pub fn new(hash: HashType, salt: &[u8], info: &[u8]) -> Self {
        Self {
            hash,
            salt: salt.to_vec(),
            info: info.to_vec(),
        }
    }

    pub fn hash(&self) -> HashType {
        self.hash
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn info(&self) -> &[u8] {
        &self.info
    }
}

/// HKDF-Extract then Expand over `ikm`. The hybrid layer passes the
/// ephemeral key encoding followed by the ECDH shared secret.
pub fn derive(ikm: &[u8], params: &HkdfParams, output_len: usize) -> Result<Zeroizing<Vec<u8>>> {
    if output_len > params.hash.max_output_len() {
        return Err(EciesError::OutputTooLarge);
    }

    let salt = if params.salt.is_empty() {
        None
    } else {
        Some(params.salt.as_slice())
    };
    let info = params.info.as_slice();
    let mut okm = Zeroizing::new(vec![0u8; output_len]);

    let expanded = match params.hash {
        HashType::Sha1 => Hkdf::<Sha1>::new(salt, ikm).expand(info, &mut okm),
        HashType::Sha256 => Hkdf::<Sha256>::new(salt, ikm).expand(info, &mut okm),
        HashType::Sha384 => Hkdf::<Sha384>::new(salt, ikm).expand(info, &mut okm),
        HashType::Sha512 => Hkdf::<Sha512>::new(salt, ikm).expand(info, &mut okm),
    };
    expanded.map_err(|_| EciesError::OutputTooLarge)?;

    Ok(okm)
}
