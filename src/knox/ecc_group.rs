use core::{fmt, ops};
use sha2::Digest;

use blsful::inner_types::Scalar;
use zeroize::Zeroize;

/// Adds `from_bytes_wide` for Generic Scalars
pub trait ScalarOps {
    /// The scalar value to be returned
    type Scalar: Copy
        + Default
        + From<u64>
        + ops::Neg<Output = Self::Scalar>
        + ops::Add<Output = Self::Scalar>
        + ops::Sub<Output = Self::Scalar>
        + ops::Mul<Output = Self::Scalar>
        + Zeroize
        + fmt::Debug;

    /// Convert 64 bytes into a scalar element
    fn from_bytes_wide(input: &[u8; 64]) -> Self::Scalar;

    /// Perform a cryptographic hashing operation to produce a scalar element
    fn from_hash(input: &[u8]) -> Self::Scalar {
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(&sha2::Sha512::digest(input));
        Self::from_bytes_wide(&bytes)
    }
}

impl ScalarOps for Scalar {
    type Scalar = Scalar;

    fn from_bytes_wide(input: &[u8; 64]) -> Self::Scalar {
        Scalar::from_bytes_wide(input)
    }
}
