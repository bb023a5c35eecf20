/// Accumulator methods
pub mod accumulator;
/// ECC group operations
pub mod ecc_group;
/// Pointcheval Sanders signatures
pub mod ps;
/// Operations for short group signatures
pub mod short_group_sig_core;

use blsful::inner_types::{G1Projective, Scalar};
use elliptic_curve::hash2curve::ExpandMsgXof;
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake256,
};

/// General purpose crypto operations
pub struct Knox {}

impl Knox {
    /// Compute a variable length hash
    pub fn xof_digest<X: Default + ExtendableOutput + Update>(input: &[u8], output: &mut [u8]) {
        let mut r = X::default().chain(input).finalize_xof();
        r.read(output);
    }

    /// Hash arbitrary bytes to a scalar using SHAKE-256 wide reduction
    pub fn hash_to_scalar(dst: &[u8], input: &[u8]) -> Scalar {
        let mut okm = [0u8; 64];
        let mut reader = Shake256::default().chain(dst).chain(input).finalize_xof();
        reader.read(&mut okm);
        Scalar::from_bytes_wide(&okm)
    }

    /// Hash arbitrary bytes to a point in G1
    pub fn hash_to_g1(dst: &[u8], input: &[u8]) -> G1Projective {
        G1Projective::hash::<ExpandMsgXof<Shake256>>(input, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_to_scalar_is_domain_separated() {
        let a = Knox::hash_to_scalar(b"dst-a", b"value");
        let b = Knox::hash_to_scalar(b"dst-b", b"value");
        assert_ne!(a, b);
        assert_eq!(a, Knox::hash_to_scalar(b"dst-a", b"value"));
    }

    #[test]
    fn xof_digest_fills_output() {
        let mut out = [0u8; 48];
        Knox::xof_digest::<Shake256>(b"input", &mut out);
        assert_ne!(out, [0u8; 48]);
    }
}
