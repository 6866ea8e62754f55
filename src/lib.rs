//! # ECIES-AEAD-HKDF
//!
//! Hybrid public-key encryption on the NIST prime curves: ephemeral ECDH,
//! HKDF key derivation, and a pluggable AEAD for the payload.
//!
//! ## Quick Start
//!
//! ```rust
//! use ecies_aead_hkdf::{
//!     new_decryptor, new_encryptor, AesGcmDem, CurveType, EciesConfig, HashType, KeyPair,
//!     PointFormat,
//! };
//!
//! let recipient = KeyPair::generate(CurveType::NistP256).unwrap();
//!
//! let encryptor = new_encryptor(
//!     EciesConfig::new()
//!         .recipient_public_key(recipient.public_key().clone())
//!         .hkdf_hash(HashType::Sha256)
//!         .point_format(PointFormat::Uncompressed)
//!         .dem_helper(AesGcmDem::aes128()),
//! )
//! .unwrap();
//! let ciphertext = encryptor.encrypt(b"secret", b"header").unwrap();
//!
//! let decryptor = new_decryptor(
//!     EciesConfig::new()
//!         .recipient_private_key(recipient.private_key().clone())
//!         .hkdf_hash(HashType::Sha256)
//!         .point_format(PointFormat::Uncompressed)
//!         .dem_helper(AesGcmDem::aes128()),
//! )
//! .unwrap();
//! assert_eq!(decryptor.decrypt(&ciphertext, b"header").unwrap(), b"secret");
//! ```
//!
//! ## Wire Format
//!
//! `ciphertext = ephemeral_public_key || dem_ciphertext`, where the ephemeral
//! key length is fixed by the curve and point format (see [`encoding_size`]).
//!
//! ## Security Properties
//!
//! - **Fresh ephemeral key** per message, never persisted
//! - **Point validation**: every decoded point is checked to be on the curve
//! - **Recipient binding**: HKDF info defaults to the recipient public key
//! - **Header binding**: the ephemeral key bytes as sent are hashed into the key
//! - **Key hygiene**: scalars, shared secrets and derived keys are zeroized
//!
//! ## What's NOT Provided
//!
//! - Key storage or rotation
//! - Streaming encryption
//! - Constant-time guarantees beyond those of the underlying curve crates

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

mod error;

pub mod curve;
pub mod dem;
pub mod hybrid;
pub mod kdf;
pub mod kem;
pub mod wire;

pub use curve::{decode_point, encode_point, encoding_size, CurveType, EcPoint, PointFormat};
pub use dem::{AesCtrHmacDem, AesGcmDem, AesKeySize, DemCipher, DemHelper};
pub use error::{EciesError, Result};
pub use hybrid::{new_decryptor, new_encryptor, EciesConfig, HybridDecrypt, HybridEncrypt};
pub use kdf::{HashType, HkdfParams};
pub use kem::{generate_ephemeral_key_pair, shared_secret, EcPrivateKey, KeyPair};
pub use wire::{inspect, CiphertextInfo};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
