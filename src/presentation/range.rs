use super::{CommitmentBuilder, PresentationBuilder};
use crate::error::Error;
use crate::utils::{get_num_scalar, zero_center};
use crate::CredxResult;
use blsful::inner_types::{G1Projective, Scalar};
use bulletproofs::{BulletproofGens, PedersenGens, RangeProof as RangeProofBulletproof};
use elliptic_curve::group::Curve;
use merlin::Transcript;
use serde::{Deserialize, Serialize};

pub(crate) const RANGE_PROOF_BITS: usize = 64;

/// The one-sided bound a predicate reduces to
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum RangeBound {
    /// The value is at least this
    Lower(i64),
    /// The value is at most this
    Upper(i64),
}

impl RangeBound {
    pub fn from_bounds(bounds: (Option<i64>, Option<i64>)) -> CredxResult<Self> {
        match bounds {
            (Some(lower), None) => Ok(Self::Lower(lower)),
            (None, Some(upper)) => Ok(Self::Upper(upper)),
            _ => Err(Error::InvalidPresentationData(
                "a predicate must have exactly one bound".to_string(),
            )),
        }
    }

    fn version(&self) -> u8 {
        match self {
            Self::Lower(_) => 1,
            Self::Upper(_) => 2,
        }
    }

    /// Shift a commitment to `m` into a commitment to a value in `[0, 2^64)`
    /// when the bound holds
    pub fn adjust_commitment(&self, commitment: G1Projective, g: G1Projective) -> G1Projective {
        match *self {
            Self::Lower(lower) => commitment - g * get_num_scalar(lower),
            Self::Upper(upper) => commitment + g * Scalar::from(u64::MAX - zero_center(upper)),
        }
    }

    /// The shifted value for the prover, `None` if the bound does not hold
    fn adjust_value(&self, value: i64) -> Option<u64> {
        match *self {
            Self::Lower(lower) => zero_center(value).checked_sub(zero_center(lower)),
            Self::Upper(upper) => {
                zero_center(value).checked_add(u64::MAX - zero_center(upper))
            }
        }
    }

    pub fn add_challenge_contribution(
        &self,
        referent: &str,
        commitment: G1Projective,
        g: G1Projective,
        transcript: &mut Transcript,
    ) {
        transcript.append_message(b"", referent.as_bytes());
        transcript.append_message(b"used commitment", &commitment.to_affine().to_compressed());
        transcript.append_u64(b"range proof bits", RANGE_PROOF_BITS as u64);
        transcript.append_message(b"range proof version", &[self.version()]);
        transcript.append_message(
            b"adjusted commitment",
            &self
                .adjust_commitment(commitment, g)
                .to_affine()
                .to_compressed(),
        );
    }
}

pub(crate) fn range_transcript(referent: &str, challenge: Scalar) -> Transcript {
    let mut transcript = Transcript::new(b"anoncreds-ps range proof");
    transcript.append_message(b"referent", referent.as_bytes());
    transcript.append_message(b"challenge", &challenge.to_be_bytes());
    transcript
}

pub(crate) struct RangeBuilder {
    referent: String,
    message_generator: G1Projective,
    blinder_generator: G1Projective,
    blinder: Scalar,
    adjusted: u64,
}

impl PresentationBuilder for RangeBuilder {
    type Proof = RangeProof;

    fn gen_proof(self, challenge: Scalar) -> CredxResult<RangeProof> {
        let pedersen_gen = PedersenGens {
            B: self.message_generator,
            B_blinding: self.blinder_generator,
        };
        let bulletproof_gens = BulletproofGens::new(RANGE_PROOF_BITS, 1);
        let mut transcript = range_transcript(&self.referent, challenge);
        let (proof, _) = RangeProofBulletproof::prove_single(
            &bulletproof_gens,
            &pedersen_gen,
            &mut transcript,
            self.adjusted,
            &self.blinder,
            RANGE_PROOF_BITS,
        )
        .map_err(|_| Error::InvalidProofData)?;
        Ok(RangeProof { proof })
    }
}

impl RangeBuilder {
    /// Prepare a range proof that the committed `value` meets `bound`
    pub fn commit(
        bound: RangeBound,
        commitment_builder: &CommitmentBuilder,
        value: i64,
        transcript: &mut Transcript,
    ) -> CredxResult<Self> {
        let adjusted = bound.adjust_value(value).ok_or_else(|| {
            Error::InvalidInput(format!(
                "predicate '{}' does not hold for the credential value",
                commitment_builder.referent()
            ))
        })?;
        bound.add_challenge_contribution(
            commitment_builder.referent(),
            commitment_builder.commitment,
            commitment_builder.message_generator,
            transcript,
        );
        Ok(Self {
            referent: commitment_builder.referent().to_string(),
            message_generator: commitment_builder.message_generator,
            blinder_generator: commitment_builder.blinder_generator,
            blinder: commitment_builder.b,
            adjusted,
        })
    }
}

/// A bulletproof that a shifted attribute commitment is in `[0, 2^64)`
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RangeProof {
    /// The range proof
    pub proof: RangeProofBulletproof,
}

impl RangeProof {
    pub(crate) fn verify(
        &self,
        referent: &str,
        bound: RangeBound,
        commitment: G1Projective,
        challenge: Scalar,
    ) -> CredxResult<()> {
        let (g, h) = super::commitment_generators();
        let pedersen_gen = PedersenGens {
            B: g,
            B_blinding: h,
        };
        let bulletproof_gens = BulletproofGens::new(RANGE_PROOF_BITS, 1);
        let mut transcript = range_transcript(referent, challenge);
        self.proof
            .verify_single(
                &bulletproof_gens,
                &pedersen_gen,
                &mut transcript,
                &bound.adjust_commitment(commitment, g),
                RANGE_PROOF_BITS,
            )
            .map_err(|_| Error::InvalidProofData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjusted_values() {
        assert_eq!(RangeBound::Lower(18).adjust_value(30), Some(12));
        assert_eq!(RangeBound::Lower(18).adjust_value(18), Some(0));
        assert_eq!(RangeBound::Lower(18).adjust_value(17), None);
        assert_eq!(RangeBound::Lower(-5).adjust_value(-3), Some(2));
        assert_eq!(RangeBound::Upper(18).adjust_value(18), Some(u64::MAX));
        assert_eq!(RangeBound::Upper(18).adjust_value(19), None);
        assert_eq!(RangeBound::Upper(0).adjust_value(-1), Some(u64::MAX - 1));
    }

    #[test]
    fn bounds_need_one_side() {
        assert_eq!(
            RangeBound::from_bounds((Some(1), None)).unwrap(),
            RangeBound::Lower(1)
        );
        assert!(RangeBound::from_bounds((None, None)).is_err());
        assert!(RangeBound::from_bounds((Some(1), Some(2))).is_err());
    }

    #[test]
    fn adjusted_commitment_matches_adjusted_value() {
        let (g, h) = super::super::commitment_generators();
        let b = Scalar::from(7u64);
        let commitment = g * get_num_scalar(30) + h * b;
        for bound in [RangeBound::Lower(18), RangeBound::Upper(40)] {
            let adjusted = bound.adjust_value(30).unwrap();
            assert_eq!(
                bound.adjust_commitment(commitment, g),
                g * Scalar::from(adjusted) + h * b
            );
        }
    }
}
