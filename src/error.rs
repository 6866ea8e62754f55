//! Unified error type for ECIES-AEAD-HKDF.
//!
//! Variants never carry key material, shared secrets or input bytes.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EciesError {
    /// A construction input was missing or malformed. Names the field.
    InvalidArgument(&'static str),
    UnknownCurve,
    UnknownPointFormat,
    UnsupportedHash,
    /// Point bytes have the wrong length or prefix for the curve/format.
    InvalidEncoding,
    PointNotOnCurve,
    /// Cofactor check failed. The NIST prime-order curves never raise this.
    InvalidSubgroup,
    InvalidPublicKey,
    InvalidPrivateKey,
    PointAtInfinity,
    CiphertextTooShort,
    KeyGenerationFailure,
    /// Requested HKDF output exceeds 255 * hash length.
    OutputTooLarge,
    EncryptionFailure,
    AuthenticationFailure,
}

impl fmt::Display for EciesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(field) => write!(f, "invalid argument: {}", field),
            Self::UnknownCurve => write!(f, "unknown curve"),
            Self::UnknownPointFormat => write!(f, "unknown point format"),
            Self::UnsupportedHash => write!(f, "unsupported hash"),
            Self::InvalidEncoding => write!(f, "invalid point encoding"),
            Self::PointNotOnCurve => write!(f, "point not on curve"),
            Self::InvalidSubgroup => write!(f, "point not in prime-order subgroup"),
            Self::InvalidPublicKey => write!(f, "invalid public key"),
            Self::InvalidPrivateKey => write!(f, "invalid private key"),
            Self::PointAtInfinity => write!(f, "shared point is the point at infinity"),
            Self::CiphertextTooShort => write!(f, "ciphertext too short"),
            Self::KeyGenerationFailure => write!(f, "key generation failed"),
            Self::OutputTooLarge => write!(f, "requested key derivation output too large"),
            Self::EncryptionFailure => write!(f, "encryption failed"),
            Self::AuthenticationFailure => write!(f, "decryption failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EciesError {}

pub type Result<T> = core::result::Result<T, EciesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_names_the_field() {
        let err = EciesError::InvalidArgument("dem_helper");
        assert_eq!(format!("{}", err), "invalid argument: dem_helper");
    }

    #[test]
    fn authentication_failure_is_opaque() {
        assert_eq!(format!("{}", EciesError::AuthenticationFailure), "decryption failed");
    }
}
