use super::{BlindSignatureContext, PublicKey};
use crate::error::Error;
use crate::knox::short_group_sig_core::*;
use crate::CredxResult;
use blsful::inner_types::{G1Projective, Scalar};
use elliptic_curve::Field;
use rand_core::{CryptoRng, RngCore};

/// The holder side of blind issuance: commits to the messages the
/// issuer must not learn and proves the commitment is well formed.
pub struct Prover;

impl Prover {
    /// Create the structures need to send to an issuer to complete a blinded signature
    /// `messages` is an index to message map where the index corresponds to the index in `generators`
    pub fn new_blind_signature_context(
        messages: &[(usize, Scalar)],
        public_key: &PublicKey,
        nonce: Scalar,
        mut rng: impl RngCore + CryptoRng,
    ) -> CredxResult<(BlindSignatureContext, Scalar)> {
        let mut points = Vec::with_capacity(messages.len() + 1);
        let mut secrets = Vec::with_capacity(messages.len() + 1);
        let mut committing =
            ProofCommittedBuilder::<G1Projective>::new(G1Projective::sum_of_products);

        for (i, m) in messages {
            let point = *public_key
                .y_blinds
                .get(*i)
                .ok_or(Error::InvalidSigningOperation)?;
            secrets.push(*m);
            points.push(point);
            committing.commit_random(point, &mut rng);
        }

        let blinding = Scalar::random(&mut rng);
        secrets.push(blinding);
        points.push(G1Projective::GENERATOR);
        committing.commit_random(G1Projective::GENERATOR, &mut rng);

        let commitment = G1Projective::sum_of_products(points.as_ref(), secrets.as_ref());
        let challenge =
            BlindSignatureContext::compute_challenge(committing.commitment(), commitment, nonce);
        let proofs = committing.generate_proof(challenge, secrets.as_slice())?;
        Ok((
            BlindSignatureContext {
                commitment,
                challenge,
                proofs,
            },
            blinding,
        ))
    }
}
