use super::{BlindSignature, BlindSignatureContext, PublicKey, SecretKey, Signature};
use crate::error::Error;
use crate::CredxResult;
use blsful::inner_types::Scalar;
use rand_core::{CryptoRng, RngCore};

/// The signer side of the PS scheme.
///
/// Signs either with every message known, or blindly where the
/// holder commits to some messages and proves knowledge of them
/// in a [`BlindSignatureContext`].
pub struct Issuer;

impl Issuer {
    /// Create a keypair capable of signing up to `count` messages
    pub fn new_keys(
        count: usize,
        rng: impl RngCore + CryptoRng,
    ) -> CredxResult<(PublicKey, SecretKey)> {
        SecretKey::random(count, rng)
            .map(|sk| {
                let pk = PublicKey::from(&sk);
                (pk, sk)
            })
            .ok_or(Error::InvalidSigningOperation)
    }

    /// Create a signature with no hidden messages
    pub fn sign<M>(sk: &SecretKey, msgs: M) -> CredxResult<Signature>
    where
        M: AsRef<[Scalar]>,
    {
        Signature::new(sk, msgs)
    }

    /// Verify a proof of committed messages and generate a blind signature
    pub fn blind_sign(
        ctx: &BlindSignatureContext,
        sk: &SecretKey,
        msgs: &[(usize, Scalar)],
        nonce: Scalar,
        rng: impl RngCore + CryptoRng,
    ) -> CredxResult<BlindSignature> {
        let known = msgs.iter().map(|(i, _)| *i).collect::<Vec<usize>>();
        if ctx.verify(known.as_ref(), sk, nonce)? {
            BlindSignature::new(ctx.commitment, sk, msgs, rng)
        } else {
            Err(Error::InvalidSignatureProofData)
        }
    }
}
