mod predicate;
mod revocation;
mod signature;
mod verify;

pub(crate) use predicate::*;
pub(crate) use revocation::*;
pub(crate) use signature::*;
pub use verify::*;

use crate::CredxResult;
use blsful::inner_types::Scalar;
use merlin::Transcript;

/// A trait for indication of proof verifier logic
pub(crate) trait ProofVerifier {
    /// Recompute the challenge contribution
    fn add_challenge_contribution(
        &self,
        challenge: Scalar,
        transcript: &mut Transcript,
    ) -> CredxResult<()>;
    /// Verify any additional proof material
    fn verify(&self, challenge: Scalar) -> CredxResult<()>;
}

pub(crate) enum ProofVerifiers<'a> {
    Signature(SignatureVerifier<'a>),
    Predicate(PredicateVerifier<'a>),
    Revocation(RevocationVerifier<'a>),
}

impl ProofVerifiers<'_> {
    /// Verify any additional proof material
    pub fn verify(&self, challenge: Scalar) -> CredxResult<()> {
        match self {
            Self::Signature(s) => s.verify(challenge),
            Self::Predicate(p) => p.verify(challenge),
            Self::Revocation(r) => r.verify(challenge),
        }
    }
}

impl<'a> From<SignatureVerifier<'a>> for ProofVerifiers<'a> {
    fn from(v: SignatureVerifier<'a>) -> Self {
        Self::Signature(v)
    }
}

impl<'a> From<PredicateVerifier<'a>> for ProofVerifiers<'a> {
    fn from(v: PredicateVerifier<'a>) -> Self {
        Self::Predicate(v)
    }
}

impl<'a> From<RevocationVerifier<'a>> for ProofVerifiers<'a> {
    fn from(v: RevocationVerifier<'a>) -> Self {
        Self::Revocation(v)
    }
}
