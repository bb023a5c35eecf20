use super::{SecretKey, Signature};
use crate::error::Error;
use crate::CredxResult;
use blsful::inner_types::{G1Projective, Scalar};
use elliptic_curve::Field;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// A PS blind signature
/// structurally identical to `Signature` but is used to
/// help with misuse and confusion.
///
/// 1 or more messages have been hidden by the signature recipient
/// so the signer only knows a subset of the messages to be signed
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct BlindSignature(pub(crate) Signature);

impl BlindSignature {
    /// The size of the signature in bytes
    pub const BYTES: usize = 128;

    /// Generate a new signature where only `msgs` are known to the signer
    /// and the rest are hidden inside `commitment`
    pub fn new(
        commitment: G1Projective,
        sk: &SecretKey,
        msgs: &[(usize, Scalar)],
        mut rng: impl RngCore + CryptoRng,
    ) -> CredxResult<Self> {
        if sk.y.len() < msgs.len() {
            return Err(Error::InvalidSigningOperation);
        }
        if sk.is_invalid() {
            return Err(Error::InvalidSigningOperation);
        }
        if msgs.iter().any(|(i, _)| *i >= sk.y.len()) {
            return Err(Error::InvalidSigningOperation);
        }

        let t_msgs = msgs.iter().map(|(_, m)| *m).collect::<Vec<Scalar>>();
        let m_tick = Signature::compute_m_tick(t_msgs.as_slice());

        let u = Scalar::random(&mut rng);
        let sigma_1 = G1Projective::GENERATOR * u;

        let mut exp = sk.x + m_tick * sk.w;
        for (i, msg) in msgs {
            exp += sk.y[*i] * msg;
        }
        let mut sigma_2 = (G1Projective::GENERATOR * exp) + commitment;
        sigma_2 *= u;
        Ok(Self(Signature {
            sigma_1,
            sigma_2,
            m_tick,
        }))
    }

    /// Once signature on committed attributes (blind signature) is received, the signature needs to be unblinded.
    /// Takes the blinding factor used in the commitment.
    pub fn to_unblinded(self, blinding: Scalar) -> Signature {
        Signature {
            sigma_1: self.0.sigma_1,
            sigma_2: self.0.sigma_2 - (self.0.sigma_1 * blinding),
            m_tick: self.0.m_tick,
        }
    }

    /// Get the byte representation of this signature
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        self.0.to_bytes()
    }
}
