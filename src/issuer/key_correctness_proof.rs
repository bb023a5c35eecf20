use super::{CredentialDefinition, CredentialDefinitionPrivate};
use crate::error::Error;
use crate::CredxResult;
use blsful::inner_types::{G1Projective, G2Projective, Scalar};
use elliptic_curve::{group::Curve, Field};
use log::warn;
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Proves knowledge of every exponent in a credential definition key and
/// that each blinding generator in G1 shares its exponent with the
/// matching verification generator in G2.
///
/// The holder checks this before committing its link secret to the key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCorrectnessProof {
    /// The Fiat-Shamir challenge
    pub challenge: Scalar,
    /// The response for `w`
    pub w: Scalar,
    /// The response for `x`
    pub x: Scalar,
    /// The responses for each `y`
    pub y: Vec<Scalar>,
}

impl KeyCorrectnessProof {
    const TRANSCRIPT_LABEL: &'static [u8] = b"anoncreds-ps key correctness";

    /// Create the proof for a credential definition
    pub fn new(
        cred_def: &CredentialDefinition,
        cred_def_private: &CredentialDefinitionPrivate,
        mut rng: impl RngCore + CryptoRng,
    ) -> CredxResult<Self> {
        let sk = &cred_def_private.secret_key;
        let pk = &cred_def.public_key;
        if sk.y.len() != pk.y.len() || pk.y.len() != pk.y_blinds.len() {
            return Err(Error::InvalidSigningOperation);
        }

        let r_w = Scalar::random(&mut rng);
        let r_x = Scalar::random(&mut rng);
        let r_y = (0..sk.y.len())
            .map(|_| Scalar::random(&mut rng))
            .collect::<Vec<_>>();

        let t_w = G2Projective::GENERATOR * r_w;
        let t_x = G2Projective::GENERATOR * r_x;
        let t_y = r_y
            .iter()
            .map(|r| (G2Projective::GENERATOR * r, G1Projective::GENERATOR * r))
            .collect::<Vec<_>>();

        let challenge = Self::compute_challenge(cred_def, t_w, t_x, &t_y);
        Ok(Self {
            challenge,
            w: r_w + challenge * sk.w,
            x: r_x + challenge * sk.x,
            y: r_y
                .iter()
                .zip(sk.y.iter())
                .map(|(r, s)| *r + challenge * s)
                .collect(),
        })
    }

    /// Check the proof against the public key of `cred_def`
    pub fn verify(&self, cred_def: &CredentialDefinition) -> CredxResult<()> {
        let pk = &cred_def.public_key;
        if self.y.len() != pk.y.len() || pk.y.len() != pk.y_blinds.len() {
            warn!("Key correctness proof for {} has the wrong shape", cred_def.id);
            return Err(Error::KeyCorrectnessProofInvalid);
        }
        let c = -self.challenge;
        let t_w = G2Projective::sum_of_products(&[G2Projective::GENERATOR, pk.w], &[self.w, c]);
        let t_x = G2Projective::sum_of_products(&[G2Projective::GENERATOR, pk.x], &[self.x, c]);
        let t_y = self
            .y
            .iter()
            .zip(pk.y.iter().zip(pk.y_blinds.iter()))
            .map(|(z, (y, y_blind))| {
                (
                    G2Projective::sum_of_products(&[G2Projective::GENERATOR, *y], &[*z, c]),
                    G1Projective::sum_of_products(&[G1Projective::GENERATOR, *y_blind], &[*z, c]),
                )
            })
            .collect::<Vec<_>>();

        let challenge = Self::compute_challenge(cred_def, t_w, t_x, &t_y);
        if challenge.ct_eq(&self.challenge).unwrap_u8() == 1 {
            Ok(())
        } else {
            warn!("Key correctness proof for {} does not verify", cred_def.id);
            Err(Error::KeyCorrectnessProofInvalid)
        }
    }

    fn compute_challenge(
        cred_def: &CredentialDefinition,
        t_w: G2Projective,
        t_x: G2Projective,
        t_y: &[(G2Projective, G1Projective)],
    ) -> Scalar {
        let mut transcript = Transcript::new(Self::TRANSCRIPT_LABEL);
        transcript.append_message(b"credential definition id", cred_def.id.as_bytes());
        transcript.append_message(b"public key", &cred_def.public_key.to_bytes());
        transcript.append_message(b"commitment w", &t_w.to_affine().to_compressed());
        transcript.append_message(b"commitment x", &t_x.to_affine().to_compressed());
        transcript.append_u64(b"commitment y length", t_y.len() as u64);
        for (t2, t1) in t_y {
            transcript.append_message(b"commitment y", &t2.to_affine().to_compressed());
            transcript.append_message(b"commitment y blind", &t1.to_affine().to_compressed());
        }
        let mut okm = [0u8; 64];
        transcript.challenge_bytes(b"key correctness challenge", &mut okm);
        Scalar::from_bytes_wide(&okm)
    }
}
