use crate::error::Error;
use crate::CredxResult;
use blsful::inner_types::Scalar;
use elliptic_curve::{
    group::{Curve, GroupEncoding},
    Field,
};
use merlin::Transcript;
use rand_core::RngCore;

/// A builder struct for creating a proof of knowledge
/// of messages in a vector commitment
/// each message has a blinding factor
pub struct ProofCommittedBuilder<B>
where
    B: Copy + Curve,
    B::AffineRepr: GroupEncoding,
{
    points: Vec<B>,
    scalars: Vec<Scalar>,
    sum_of_products: fn(&[B], &[Scalar]) -> B,
}

impl<B> ProofCommittedBuilder<B>
where
    B: Copy + Curve,
    B::AffineRepr: GroupEncoding,
{
    /// Create a new builder
    pub fn new(sum_of_products: fn(&[B], &[Scalar]) -> B) -> Self {
        Self {
            points: Vec::new(),
            scalars: Vec::new(),
            sum_of_products,
        }
    }

    /// Add a specified point and generate a random blinding factor
    pub fn commit_random(&mut self, point: B, rng: impl RngCore) {
        self.points.push(point);
        self.scalars.push(Scalar::random(rng));
    }

    /// Commit a specified point with the specified scalar
    pub fn commit(&mut self, point: B, scalar: Scalar) {
        self.points.push(point);
        self.scalars.push(scalar);
    }

    /// The number of committed points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if nothing has been committed
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The commitment to the random blinding factors
    pub fn commitment(&self) -> B {
        (self.sum_of_products)(self.points.as_ref(), self.scalars.as_ref())
    }

    /// Convert the committed values to bytes for the fiat-shamir challenge
    pub fn add_challenge_contribution(&self, label: &'static [u8], transcript: &mut Transcript) {
        let commitment = self.commitment();
        transcript.append_message(label, commitment.to_affine().to_bytes().as_ref());
    }

    /// Generate the Schnorr challenges given the specified secrets
    /// by computing p = r + c * s
    pub fn generate_proof(&self, challenge: Scalar, secrets: &[Scalar]) -> CredxResult<Vec<Scalar>> {
        if secrets.len() != self.scalars.len() {
            return Err(Error::InvalidProofData);
        }
        Ok(self
            .scalars
            .iter()
            .zip(secrets.iter())
            .map(|(r, s)| *r + *s * challenge)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blsful::inner_types::G1Projective;

    #[test]
    fn responses_reconstruct_commitment() {
        let mut rng = rand_core::OsRng;
        let mut pb = ProofCommittedBuilder::<G1Projective>::new(G1Projective::sum_of_products);
        let base = G1Projective::GENERATOR * Scalar::from(7u64);
        pb.commit_random(G1Projective::GENERATOR, &mut rng);
        pb.commit_random(base, &mut rng);
        assert_eq!(pb.len(), 2);

        let secrets = [Scalar::from(11u64), Scalar::from(1337u64)];
        let public = G1Projective::sum_of_products(
            &[G1Projective::GENERATOR, base],
            &secrets,
        );
        let challenge = Scalar::from(3u64);
        let proof = pb.generate_proof(challenge, &secrets).unwrap();

        let recomputed = G1Projective::sum_of_products(
            &[G1Projective::GENERATOR, base, public],
            &[proof[0], proof[1], -challenge],
        );
        assert_eq!(recomputed, pb.commitment());
    }

    #[test]
    fn secret_count_must_match() {
        let mut pb = ProofCommittedBuilder::<G1Projective>::new(G1Projective::sum_of_products);
        pb.commit(G1Projective::GENERATOR, Scalar::ONE);
        assert!(pb.generate_proof(Scalar::ONE, &[]).is_err());
    }
}
