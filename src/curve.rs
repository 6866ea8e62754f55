//! Curve codec: curve identifiers, point encodings, on-curve validation.
//!
//! Encodings (fieldLen = 32 / 48 / 66 for P-256 / P-384 / P-521):
//!   UNCOMPRESSED         0x04 || X || Y             1 + 2*fieldLen
//!   COMPRESSED           (0x02 | 0x03) || X         1 + fieldLen
//!   LEGACY_UNCOMPRESSED  0x00 || X || 0x00 || Y     2*(fieldLen + 1)   (decode only)
//!
//! Coordinates are fixed-width big-endian. An `EcPoint` only exists after
//! the coordinates have been checked against the curve equation.

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use core::fmt;
use core::str::FromStr;

use elliptic_curve::sec1::{EncodedPoint, FromEncodedPoint, ModulusSize, ToEncodedPoint};
use elliptic_curve::{AffinePoint, CurveArithmetic, FieldBytes, FieldBytesSize, PublicKey};
use p256::NistP256;
use p384::NistP384;
use p521::NistP521;

use crate::error::{EciesError, Result};

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

pub const P256_FIELD_BYTES: usize = 32;
pub const P384_FIELD_BYTES: usize = 48;
pub const P521_FIELD_BYTES: usize = 66;

const TAG_UNCOMPRESSED: u8 = 0x04;
const TAG_COMPRESSED_EVEN: u8 = 0x02;
const TAG_COMPRESSED_ODD: u8 = 0x03;

// ---------------------------------------------------------------------------
// Curve identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CurveType {
    NistP256,
    NistP384,
    NistP521,
}

impl CurveType {
    pub const ALL: [CurveType; 3] = [Self::NistP256, Self::NistP384, Self::NistP521];

    /// Width of one serialized coordinate (and of a private scalar).
    pub const fn field_size_in_bytes(self) -> usize {
        match self {
            Self::NistP256 => P256_FIELD_BYTES,
            Self::NistP384 => P384_FIELD_BYTES,
            Self::NistP521 => P521_FIELD_BYTES,
        }
    }

    pub const fn identifier(self) -> &'static str {
        match self {
            Self::NistP256 => "P-256",
            Self::NistP384 => "P-384",
            Self::NistP521 => "P-521",
        }
    }

    /// Mask for the most significant scalar byte so that random candidates
    /// have the bit length of the group order.
    pub(crate) const fn leading_byte_mask(self) -> u8 {
        match self {
            Self::NistP256 | Self::NistP384 => 0xFF,
            Self::NistP521 => 0x01,
        }
    }
}

impl fmt::Display for CurveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for CurveType {
    type Err = EciesError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "P-256" | "NIST_P256" | "secp256r1" | "prime256v1" => Ok(Self::NistP256),
            "P-384" | "NIST_P384" | "secp384r1" => Ok(Self::NistP384),
            "P-521" | "NIST_P521" | "secp521r1" => Ok(Self::NistP521),
            _ => Err(EciesError::UnknownCurve),
        }
    }
}

// ---------------------------------------------------------------------------
// Point formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PointFormat {
    Uncompressed,
    Compressed,
    /// `X || Y` with one zero byte in front of each coordinate. Produced by an
    /// old encoder; accepted on decode only.
    LegacyUncompressed,
}

impl PointFormat {
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::Uncompressed => "UNCOMPRESSED",
            Self::Compressed => "COMPRESSED",
            Self::LegacyUncompressed => "LEGACY_UNCOMPRESSED",
        }
    }
}

impl fmt::Display for PointFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for PointFormat {
    type Err = EciesError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "UNCOMPRESSED" => Ok(Self::Uncompressed),
            "COMPRESSED" => Ok(Self::Compressed),
            "LEGACY_UNCOMPRESSED" | "DO_NOT_USE_CRUNCHY_UNCOMPRESSED" => {
                Ok(Self::LegacyUncompressed)
            }
            _ => Err(EciesError::UnknownPointFormat),
        }
    }
}

/// Exact byte length of a point encoding for `(curve, format)`.
pub const fn encoding_size(curve: CurveType, format: PointFormat) -> usize {
    let field = curve.field_size_in_bytes();
    match format {
        PointFormat::Uncompressed => 1 + 2 * field,
        PointFormat::Compressed => 1 + field,
        PointFormat::LegacyUncompressed => 2 * (field + 1),
    }
}

// ---------------------------------------------------------------------------
// Validated point
// ---------------------------------------------------------------------------

/// Affine point on a NIST curve with fixed-width big-endian coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EcPoint {
    curve: CurveType,
    x: Vec<u8>,
    y: Vec<u8>,
}

impl EcPoint {
    /// Build a point from big-endian coordinates. Leading zero bytes are
    /// stripped and short values are left-padded to the field width.
    pub fn from_affine_coordinates(curve: CurveType, x: &[u8], y: &[u8]) -> Result<Self> {
        let width = curve.field_size_in_bytes();
        let x = fixed_width(x, width)?;
        let y = fixed_width(y, width)?;

        match curve {
            CurveType::NistP256 => public_key::<NistP256>(&x, &y).map(drop)?,
            CurveType::NistP384 => public_key::<NistP384>(&x, &y).map(drop)?,
            CurveType::NistP521 => public_key::<NistP521>(&x, &y).map(drop)?,
        }

        Ok(Self { curve, x, y })
    }

    pub fn curve(&self) -> CurveType {
        self.curve
    }

    pub fn x(&self) -> &[u8] {
        &self.x
    }

    pub fn y(&self) -> &[u8] {
        &self.y
    }

    pub fn encode(&self, format: PointFormat) -> Result<Vec<u8>> {
        encode_point(self, format)
    }

    pub(crate) fn from_public_key<C>(curve: CurveType, public: &PublicKey<C>) -> Result<Self>
    where
        C: CurveArithmetic,
        AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
        FieldBytesSize<C>: ModulusSize,
    {
        let encoded = public.to_encoded_point(false);
        match (encoded.x(), encoded.y()) {
            (Some(x), Some(y)) => Ok(Self {
                curve,
                x: x.to_vec(),
                y: y.to_vec(),
            }),
            _ => Err(EciesError::InvalidEncoding),
        }
    }
}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

pub fn encode_point(point: &EcPoint, format: PointFormat) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(encoding_size(point.curve, format));
    match format {
        PointFormat::Uncompressed => {
            out.push(TAG_UNCOMPRESSED);
            out.extend_from_slice(&point.x);
            out.extend_from_slice(&point.y);
        }
        PointFormat::Compressed => {
            let y_is_odd = point.y.last().map_or(0, |b| b & 1);
            out.push(TAG_COMPRESSED_EVEN | y_is_odd);
            out.extend_from_slice(&point.x);
        }
        PointFormat::LegacyUncompressed => return Err(EciesError::InvalidArgument("point_format")),
    }
    Ok(out)
}

pub fn decode_point(bytes: &[u8], curve: CurveType, format: PointFormat) -> Result<EcPoint> {
    if bytes.len() != encoding_size(curve, format) {
        return Err(EciesError::InvalidEncoding);
    }
    let field = curve.field_size_in_bytes();

    match format {
        PointFormat::Uncompressed => {
            if bytes[0] != TAG_UNCOMPRESSED {
                return Err(EciesError::InvalidEncoding);
            }
            let (x, y) = bytes[1..].split_at(field);
            EcPoint::from_affine_coordinates(curve, x, y)
        }
        PointFormat::Compressed => {
            if bytes[0] != TAG_COMPRESSED_EVEN && bytes[0] != TAG_COMPRESSED_ODD {
                return Err(EciesError::InvalidEncoding);
            }
            match curve {
                CurveType::NistP256 => decompress::<NistP256>(curve, bytes),
                CurveType::NistP384 => decompress::<NistP384>(curve, bytes),
                CurveType::NistP521 => decompress::<NistP521>(curve, bytes),
            }
        }
        PointFormat::LegacyUncompressed => {
            let (x, y) = bytes.split_at(field + 1);
            if x[0] != 0 || y[0] != 0 {
                return Err(EciesError::InvalidEncoding);
            }
            EcPoint::from_affine_coordinates(curve, &x[1..], &y[1..])
        }
    }
}

// ---------------------------------------------------------------------------
// Curve-generic helpers
// ---------------------------------------------------------------------------

/// Checks `(x, y)` against the curve equation and rejects the identity.
pub(crate) fn public_key<C>(x: &[u8], y: &[u8]) -> Result<PublicKey<C>>
where
    C: CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    let width = FieldBytes::<C>::default().len();
    if x.len() != width || y.len() != width {
        return Err(EciesError::InvalidEncoding);
    }

    let encoded = EncodedPoint::<C>::from_affine_coordinates(
        FieldBytes::<C>::from_slice(x),
        FieldBytes::<C>::from_slice(y),
        false,
    );
    Option::<PublicKey<C>>::from(PublicKey::<C>::from_encoded_point(&encoded))
        .ok_or(EciesError::PointNotOnCurve)
}

fn decompress<C>(curve: CurveType, bytes: &[u8]) -> Result<EcPoint>
where
    C: CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    let encoded = EncodedPoint::<C>::from_bytes(bytes).map_err(|_| EciesError::InvalidEncoding)?;
    let public = Option::<PublicKey<C>>::from(PublicKey::<C>::from_encoded_point(&encoded))
        .ok_or(EciesError::PointNotOnCurve)?;
    EcPoint::from_public_key(curve, &public)
}

/// Normalize a big-endian integer to exactly `width` bytes.
pub(crate) fn fixed_width(value: &[u8], width: usize) -> Result<Vec<u8>> {
    let first = value.iter().position(|b| *b != 0).unwrap_or(value.len());
    let significant = &value[first..];
    if significant.len() > width {
        return Err(EciesError::InvalidEncoding);
    }
    let mut out = vec![0u8; width];
    out[width - significant.len()..].copy_from_slice(significant);
    Ok(out)
}
