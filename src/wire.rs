//! Wire format
//!
//!   ciphertext = ephemeral_public_key || dem_ciphertext
//!
//! The ephemeral key length is fixed by (curve, point format), so there is
//! no length prefix:
//!   UNCOMPRESSED         1 + 2*fieldLen
//!   COMPRESSED           1 + fieldLen
//!   LEGACY_UNCOMPRESSED  2*(fieldLen + 1)

extern crate alloc;
use alloc::vec::Vec;

use core::fmt;

use crate::curve::{encoding_size, CurveType, PointFormat};
use crate::dem::DemHelper;
use crate::error::{EciesError, Result};

/// Borrowed view of a split ciphertext.
#[derive(Debug, Clone, Copy)]
pub struct WireComponents<'a> {
    pub ephemeral_public_key: &'a [u8],
    pub dem_ciphertext: &'a [u8],
}

/// Splits off the ephemeral key. Fails only when the header itself is cut
/// short; a truncated DEM part is left for the DEM to reject.
pub fn decode_wire(
    data: &[u8],
    curve: CurveType,
    format: PointFormat,
) -> Result<WireComponents<'_>> {
    let header = encoding_size(curve, format);
    if data.len() < header {
        return Err(EciesError::CiphertextTooShort);
    }

    let (ephemeral_public_key, dem_ciphertext) = data.split_at(header);
    Ok(WireComponents {
        ephemeral_public_key,
        dem_ciphertext,
    })
}

pub fn encode_wire(ephemeral_public_key: &[u8], dem_ciphertext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ephemeral_public_key.len() + dem_ciphertext.len());
    out.extend_from_slice(ephemeral_public_key);
    out.extend_from_slice(dem_ciphertext);
    out
}

/// Smallest valid ciphertext for this configuration (empty plaintext).
pub fn min_ciphertext_len<D: DemHelper>(curve: CurveType, format: PointFormat, dem: &D) -> usize {
    encoding_size(curve, format) + dem.ciphertext_overhead()
}

// ---------------------------------------------------------------------------
// Inspection (for ops/debugging)
// ---------------------------------------------------------------------------

/// Ciphertext metadata (extracted without decrypting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiphertextInfo {
    pub curve: CurveType,
    pub point_format: PointFormat,
    /// Ephemeral public key length
    pub ephemeral_key_bytes: usize,
    /// DEM part (nonce/IV + ciphertext + tag)
    pub dem_bytes: usize,
    pub total_bytes: usize,
    /// Plaintext length (total - overhead)
    pub plaintext_bytes: usize,
}

impl fmt::Display for CiphertextInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ECIES {} {} | {} bytes ({} key + {} dem, {} plaintext)",
            self.curve,
            self.point_format,
            self.total_bytes,
            self.ephemeral_key_bytes,
            self.dem_bytes,
            self.plaintext_bytes
        )
    }
}

/// Checks framing only. Does not validate the point or touch any key.
pub fn inspect<D: DemHelper>(
    ciphertext: &[u8],
    curve: CurveType,
    format: PointFormat,
    dem: &D,
) -> Result<CiphertextInfo> {
    let parts = decode_wire(ciphertext, curve, format)?;
    if parts.dem_ciphertext.len() < dem.ciphertext_overhead() {
        return Err(EciesError::CiphertextTooShort);
    }

    let prefix = parts.ephemeral_public_key[0];
    let prefix_ok = match format {
        PointFormat::Uncompressed => prefix == 0x04,
        PointFormat::Compressed => prefix == 0x02 || prefix == 0x03,
        PointFormat::LegacyUncompressed => prefix == 0x00,
    };
    if !prefix_ok {
        return Err(EciesError::InvalidEncoding);
    }

    Ok(CiphertextInfo {
        curve,
        point_format: format,
        ephemeral_key_bytes: parts.ephemeral_public_key.len(),
        dem_bytes: parts.dem_ciphertext.len(),
        total_bytes: ciphertext.len(),
        plaintext_bytes: parts.dem_ciphertext.len() - dem.ciphertext_overhead(),
    })
}
