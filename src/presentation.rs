//! Presentations: selective disclosure, predicates and non-revocation
//! proofs over one or more credentials, bound together by a single
//! Fiat-Shamir challenge.

mod commitment;
mod create;
mod present_credentials;
mod proof;
mod range;
mod request;
mod revocation;
mod signature;

pub(crate) use commitment::*;
pub use create::*;
pub use present_credentials::*;
pub use proof::*;
pub(crate) use range::*;
pub use request::*;
pub(crate) use revocation::*;
pub(crate) use signature::*;

pub use commitment::CommitmentProof;
pub use range::RangeProof;
pub use revocation::RevocationProof;
pub use signature::SignatureProof;

use crate::CredxResult;
use blsful::inner_types::Scalar;
use merlin::Transcript;

/// Implementers can build proofs for presentations
pub(crate) trait PresentationBuilder {
    /// The finished proof
    type Proof;
    /// Finalize proofs
    fn gen_proof(self, challenge: Scalar) -> CredxResult<Self::Proof>;
}

pub(crate) const PRESENTATION_LABEL: &[u8] = b"anoncreds-ps presentation";

/// Derive the presentation challenge from the transcript
pub(crate) fn challenge_from_transcript(transcript: &mut Transcript) -> Scalar {
    let mut okm = [0u8; 64];
    transcript.challenge_bytes(b"challenge bytes", &mut okm);
    Scalar::from_bytes_wide(&okm)
}
